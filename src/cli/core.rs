//! Shell context, dispatch and error reporting.

use std::{env, io, path::PathBuf};

use dialoguer::theme::ColorfulTheme;
use orfi_config::{Config, ConfigError, ConfigManager, LockMode, DATA_ROOT_ENV};
use orfi_core::{
    Clock, CoreError, LedgerStore, LockPolicy, RecalcPolicy, StoreOptions, SystemClock,
};
use orfi_domain::{LedgerMonth, MonthKey};
use orfi_storage_json::{JsonLedgerStorage, StoragePaths};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::currency::{LocaleConfig, MoneyFormatter};
use crate::errors::AppError;

use super::commands;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};

/// Environment variable that switches the shell to script mode.
pub const SCRIPT_ENV: &str = "ORFI_CLI_SCRIPT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub store: LedgerStore,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub formatter: MoneyFormatter,
    /// Month every entry command applies to.
    pub current_month: MonthKey,
    pub data_root: PathBuf,
    pub running: bool,
}

impl ShellContext {
    /// Opens the data directory named by `ORFI_HOME`, or the default one.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let env_root = env::var_os(DATA_ROOT_ENV)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty());
        let base = Config::default().resolve_data_root_with(env_root.clone());
        Self::open(mode, base, env_root)
    }

    pub fn with_data_root(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        Self::open(mode, base.clone(), Some(base))
    }

    fn open(mode: CliMode, base: PathBuf, env_root: Option<PathBuf>) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(base).map_err(AppError::from)?;
        let config = config_manager.load().map_err(AppError::from)?;
        let data_root = config.resolve_data_root_with(env_root);

        let storage = JsonLedgerStorage::with_retention(
            StoragePaths::under(data_root.clone()),
            config.backup_retention,
        )
        .map_err(AppError::from)?;
        let store = LedgerStore::open(Box::new(storage), store_options(&config));
        let current_month = config
            .last_month
            .unwrap_or_else(|| SystemClock.current_month());

        let mut context = ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            store,
            formatter: formatter_for(&config),
            config_manager,
            config,
            current_month,
            data_root,
            running: true,
        };
        context.apply_output_preferences();
        context.report_notice();
        Ok(context)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        let key = self.current_month;
        let lock = if self.store.is_closed(key) { " closed" } else { "" };
        format!("orfi [{} {}{}]> ", key, key.name(), lock)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let outcome = crate::cli::shell::handle_line(self, line);
        self.report_notice();
        outcome
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", true)?)
    }

    /// Prints `err`, prefixed with the script line it came from when known.
    pub(crate) fn report_error(&self, err: CommandError, line: Option<usize>) {
        let at = line.map(|number| format!("line {number}: ")).unwrap_or_default();
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(format!("{at}{message}"));
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(CoreError::MonthClosed(key)) => {
                cli_io::print_error(format!("{at}Month {key} is closed."));
                cli_io::print_hint(format!("Use `reopen {}` to edit it again.", key));
            }
            other => cli_io::print_error(format!("{at}{other}")),
        }
    }

    /// Yes/no question; script mode always answers yes.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        confirm_with(self.mode, &self.theme, prompt)
    }

    /// Returns `args[index]`, prompting for it interactively when missing.
    pub(crate) fn arg_or_prompt(
        &self,
        args: &[&str],
        index: usize,
        label: &str,
        usage: &str,
    ) -> Result<String, CommandError> {
        if let Some(value) = args.get(index) {
            return Ok((*value).to_string());
        }
        if self.mode == CliMode::Interactive {
            return cli_io::prompt_text(&self.theme, label);
        }
        Err(CommandError::InvalidArguments(format!("usage: {}", usage)))
    }

    pub(crate) fn parse_amount(&self, text: &str) -> Result<f64, CommandError> {
        Ok(self.formatter.parse(text)?)
    }

    pub(crate) fn money(&self, amount: f64) -> String {
        self.formatter.format(amount)
    }

    /// Current month, materialized and recalculated.
    pub(crate) fn view_month(&mut self) -> LedgerMonth {
        self.store.month(self.current_month).clone()
    }

    pub(crate) fn set_current_month(&mut self, key: MonthKey) -> CommandResult {
        self.current_month = key;
        self.config.last_month = Some(key);
        self.persist_config()
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    /// Pushes config values into the store, formatter and output.
    pub(crate) fn apply_config(&mut self) {
        let options = store_options(&self.config);
        self.store.set_lock_policy(options.lock_policy);
        self.store.set_recalc_policy(options.recalc);
        self.formatter = formatter_for(&self.config);
        if let Some(key) = self.config.last_month {
            self.current_month = key;
        }
        self.apply_output_preferences();
    }

    fn apply_output_preferences(&self) {
        output::set_preferences(OutputPreferences {
            color_enabled: self.config.ui_color_enabled && self.mode == CliMode::Interactive,
        });
    }

    pub(crate) fn report_notice(&mut self) {
        if let Some(notice) = self.store.take_notice() {
            cli_io::print_warning(notice);
        }
    }
}

pub(crate) fn confirm_with(
    mode: CliMode,
    theme: &ColorfulTheme,
    prompt: &str,
) -> Result<bool, CommandError> {
    match mode {
        CliMode::Script => {
            cli_io::print_info(format!("{} yes", prompt));
            Ok(true)
        }
        CliMode::Interactive => cli_io::confirm_action(theme, prompt, false),
    }
}

pub(crate) fn store_options(config: &Config) -> StoreOptions {
    StoreOptions {
        lock_policy: match config.lock_policy {
            LockMode::Enforced => LockPolicy::Enforced,
            LockMode::Advisory => LockPolicy::Advisory,
        },
        recalc: RecalcPolicy::with_threshold(config.installment_hysteresis),
        seed_sample_data: config.seed_sample_data,
    }
}

fn formatter_for(config: &Config) -> MoneyFormatter {
    MoneyFormatter::new(config.currency.clone(), LocaleConfig::for_tag(&config.locale))
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Core(err) => CommandError::Core(err),
            AppError::Config(err) => CommandError::Config(err),
            AppError::Io(err) => CommandError::Io(err),
            invalid @ AppError::InvalidAmount(_) => {
                CommandError::InvalidArguments(invalid.to_string())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("Input error: {0}")]
    Input(String),
    #[error("{0}")]
    Command(String),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::App(AppError::Io(err))
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(
    root: &std::path::Path,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_data_root(CliMode::Script, root.to_path_buf())?;
    for line in lines {
        match app.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orfi_core::EntryService;
    use orfi_domain::{EntryId, LedgerEntry};
    use tempfile::tempdir;

    fn march() -> MonthKey {
        MonthKey::new(3).unwrap()
    }

    /// Data root whose config disables the sample month.
    fn empty_root() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = Config {
            seed_sample_data: false,
            ..Config::default()
        };
        manager.save(&config).unwrap();
        dir
    }

    #[test]
    fn parse_line_handles_quotes() {
        let tokens =
            crate::cli::shell::parse_command_line("add-fixed \"Plan celular\" 65000").unwrap();
        assert_eq!(tokens, vec!["add-fixed", "Plan celular", "65000"]);
    }

    #[test]
    fn script_runner_adds_entries_to_the_current_month() {
        let dir = empty_root();
        let mut context = process_script(
            dir.path(),
            &[
                "month 03",
                "add-income Salario 3.500.000 Trabajo 1",
                "add-fixed Arriendo 1.200.000 Vivienda 5",
                "add-loan Carro 25.000.000 60 1,2",
                "exit",
            ],
        )
        .unwrap();

        assert_eq!(context.current_month, march());
        assert_eq!(context.config.last_month, Some(march()));
        let month = context.view_month();
        assert_eq!(month.incomes[0].amount, 3_500_000.0);
        assert_eq!(month.fixed_expenses[0].day_of_month, 5);
        assert!(month.installment_loans[0].computed_installment.is_some());
    }

    #[test]
    fn next_materializes_with_reset_flags() {
        let dir = empty_root();
        let mut context = process_script(
            dir.path(),
            &[
                "month 12",
                "add-fixed Internet 90000 Servicios 15",
            ],
        )
        .unwrap();
        let id = context.view_month().fixed_expenses[0].id;
        context.process_line(&format!("paid {}", id)).unwrap();
        assert!(context.view_month().fixed_expenses[0].paid);

        context.process_line("next").unwrap();
        assert_eq!(context.current_month, MonthKey::JANUARY);
        let january = context.view_month();
        assert!(!january.fixed_expenses[0].paid);
        assert_eq!(january.fixed_expenses[0].day_of_month, 1);
        assert_ne!(january.fixed_expenses[0].id, id);
    }

    #[test]
    fn closed_month_rejects_edits() {
        let dir = empty_root();
        let mut context =
            process_script(dir.path(), &["month 03", "close"]).unwrap();

        let err = context
            .process_line("add-purchase Mercado 200000")
            .unwrap_err();
        assert!(matches!(err, CommandError::Core(CoreError::MonthClosed(_))));

        context.process_line("reopen").unwrap();
        context.process_line("add-purchase Mercado 200000").unwrap();
        assert_eq!(context.view_month().purchases.len(), 1);
    }

    #[test]
    fn unknown_commands_do_not_fail() {
        let dir = tempdir().unwrap();
        let mut context = ShellContext::with_data_root(CliMode::Script, dir.path().into()).unwrap();
        assert_eq!(context.process_line("sumary").unwrap(), LoopControl::Continue);
        assert_eq!(context.process_line("exit").unwrap(), LoopControl::Exit);
    }

    #[test]
    fn state_survives_a_new_session() {
        let dir = tempdir().unwrap();
        {
            let mut context = ShellContext::with_data_root(CliMode::Script, dir.path().into())
                .unwrap();
            EntryService::add(
                &mut context.store,
                march(),
                LedgerEntry::Income(orfi_domain::IncomeEntry::new("Bono", 500_000.0, "", 20)),
            )
            .unwrap();
            context.set_current_month(march()).unwrap();
        }

        let mut context = ShellContext::with_data_root(CliMode::Script, dir.path().into()).unwrap();
        assert_eq!(context.current_month, march());
        let month = context.view_month();
        assert!(month.incomes.iter().any(|income| income.name == "Bono"));
        assert!(month.incomes.iter().all(|income| income.id != EntryId(0)));
    }
}
