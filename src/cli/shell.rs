//! Read-eval loop shared by the interactive shell and script mode.
//!
//! Both modes feed lines through [`run_loop`]; they differ only in where the
//! lines come from. Store notices are reported after every command, and
//! script mode prefixes errors with the line that caused them.

use std::{
    collections::HashMap,
    io::{self, Lines, StdinLock},
    path::PathBuf,
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    history::DefaultHistory,
    Cmd, Context as ReadlineContext, Editor, Helper, Highlighter, Hinter, KeyEvent, Validator,
};
use tracing::{debug, warn};

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext, SCRIPT_ENV};
use crate::cli::output::info as output_info;

/// File under the data root that keeps interactive history between sessions.
const HISTORY_FILE: &str = "history.txt";

/// Runs the shell, reading commands from stdin when `ORFI_CLI_SCRIPT` is set.
pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    debug!(?mode, root = %context.data_root.display(), "shell started");

    match mode {
        CliMode::Interactive => {
            let mut source = InteractiveSource::open(&context)?;
            run_loop(&mut context, &mut source)
        }
        CliMode::Script => run_loop(&mut context, &mut ScriptSource::stdin()),
    }
}

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

/// Where the loop gets its next command line.
trait LineSource {
    fn read(&mut self, context: &ShellContext) -> Result<Input, CliError>;

    /// Called for every non-blank line that is about to run.
    fn record(&mut self, _line: &str) {}

    fn finish(&mut self) {}

    /// Line number to attach to errors, when the source has one.
    fn position(&self) -> Option<usize> {
        None
    }
}

fn run_loop(context: &mut ShellContext, source: &mut dyn LineSource) -> Result<(), CliError> {
    while context.running {
        let line = match source.read(context)? {
            Input::Line(line) => line,
            Input::Interrupted => {
                if context.confirm_exit()? {
                    break;
                }
                continue;
            }
            Input::Closed => {
                if context.mode == CliMode::Interactive {
                    output_info("Bye.");
                }
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        source.record(line);

        let outcome = handle_line(context, line);
        context.report_notice();
        match outcome {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err, source.position()),
        }
    }

    source.finish();
    Ok(())
}

pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = parse_command_line(line)
        .map_err(|err| CommandError::Message(format!("Could not read `{line}`: {err}")))?;
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };

    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    let control = context.dispatch(&command, raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, shell_words::ParseError> {
    shell_words::split(input)
}

/// Stdin, one command per line.
struct ScriptSource<R> {
    lines: R,
    number: usize,
}

impl ScriptSource<Lines<StdinLock<'static>>> {
    fn stdin() -> Self {
        Self {
            lines: io::stdin().lines(),
            number: 0,
        }
    }
}

impl<R> LineSource for ScriptSource<R>
where
    R: Iterator<Item = io::Result<String>>,
{
    fn read(&mut self, _context: &ShellContext) -> Result<Input, CliError> {
        match self.lines.next() {
            Some(line) => {
                self.number += 1;
                Ok(Input::Line(line?))
            }
            None => Ok(Input::Closed),
        }
    }

    fn position(&self) -> Option<usize> {
        Some(self.number)
    }
}

/// Line editor with completion and history kept under the data root.
struct InteractiveSource {
    editor: Editor<CommandHelper, DefaultHistory>,
    history: PathBuf,
}

impl InteractiveSource {
    fn open(context: &ShellContext) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
        let usages = context.registry.list().map(|entry| (entry.name, entry.usage));
        editor.set_helper(Some(CommandHelper::from_usages(usages)));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

        let history = context.data_root.join(HISTORY_FILE);
        if let Err(err) = editor.load_history(&history) {
            debug!(path = %history.display(), error = %err, "no shell history loaded");
        }
        Ok(Self { editor, history })
    }
}

impl LineSource for InteractiveSource {
    fn read(&mut self, context: &ShellContext) -> Result<Input, CliError> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.entry_ids = context
                .store
                .peek(context.current_month)
                .map(|month| month.ids().map(|id| id.to_string()).collect())
                .unwrap_or_default();
        }

        match self.editor.readline(&context.prompt()) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Closed),
            Err(err) => Err(err.into()),
        }
    }

    fn record(&mut self, line: &str) {
        self.editor.add_history_entry(line).ok();
    }

    fn finish(&mut self) {
        if let Err(err) = self.editor.save_history(&self.history) {
            warn!(path = %self.history.display(), error = %err, "could not save shell history");
        }
    }
}

/// What the first argument of a command names, read from its usage line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArgKind {
    EntryId,
    Month,
    Command,
    Choices(Vec<String>),
}

impl ArgKind {
    fn from_usage(usage: &str) -> Option<Self> {
        let placeholder = usage.split_whitespace().nth(1)?;
        let inner = placeholder
            .strip_prefix(['<', '['])?
            .strip_suffix(['>', ']'])?;
        match inner {
            "id" => Some(ArgKind::EntryId),
            "MM" => Some(ArgKind::Month),
            "command" => Some(ArgKind::Command),
            _ if inner.contains('|') => Some(ArgKind::Choices(
                inner.split('|').map(str::to_string).collect(),
            )),
            _ => None,
        }
    }
}

#[derive(Helper, Hinter, Highlighter, Validator)]
struct CommandHelper {
    commands: Vec<String>,
    arguments: HashMap<String, ArgKind>,
    /// Identifiers of the current month, refreshed before every prompt.
    entry_ids: Vec<String>,
}

impl CommandHelper {
    fn from_usages<'a>(usages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut commands = Vec::new();
        let mut arguments = HashMap::new();
        for (name, usage) in usages {
            let name = name.to_ascii_lowercase();
            if let Some(kind) = ArgKind::from_usage(usage) {
                arguments.insert(name.clone(), kind);
            }
            commands.push(name);
        }
        commands.sort();
        commands.dedup();
        Self {
            commands,
            arguments,
            entry_ids: Vec::new(),
        }
    }

    fn argument_candidates(&self, command: &str) -> Vec<String> {
        match self.arguments.get(command) {
            Some(ArgKind::EntryId) => self.entry_ids.clone(),
            Some(ArgKind::Month) => (1..=12).map(|number| format!("{number:02}")).collect(),
            Some(ArgKind::Command) => self.commands.clone(),
            Some(ArgKind::Choices(choices)) => choices.clone(),
            None => Vec::new(),
        }
    }
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let words: Vec<&str> = prefix[..start].split_whitespace().collect();

        let candidates = match words.as_slice() {
            [] => self.commands.clone(),
            [command] => self.argument_candidates(&command.to_ascii_lowercase()),
            _ => Vec::new(),
        };

        let needle = prefix[start..].to_ascii_lowercase();
        let pairs = candidates
            .into_iter()
            .filter(|candidate| candidate.to_ascii_lowercase().starts_with(&needle))
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}
