use orfi_core::{DuplicateOutcome, TemplateService};
use orfi_domain::MonthKey;

use crate::cli::commands::parse_month;
use crate::cli::core::{confirm_with, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "month",
            "Show or switch the current month",
            "month [MM]",
            cmd_month,
        ),
        CommandEntry::new("next", "Move to the following month", "next", cmd_next),
        CommandEntry::new("prev", "Move to the previous month", "prev", cmd_prev),
        CommandEntry::new(
            "duplicate",
            "Copy the current month onto another month",
            "duplicate [MM]",
            cmd_duplicate,
        ),
        CommandEntry::new("close", "Close a month to edits", "close [MM]", cmd_close),
        CommandEntry::new("reopen", "Reopen a closed month", "reopen [MM]", cmd_reopen),
        CommandEntry::new(
            "template-save",
            "Save this month's fixed expenses as the template",
            "template-save",
            cmd_template_save,
        ),
        CommandEntry::new(
            "template-apply",
            "Append the fixed-expense template to this month",
            "template-apply",
            cmd_template_apply,
        ),
        CommandEntry::new(
            "reset",
            "Delete every month and every lock",
            "reset",
            cmd_reset,
        ),
    ]
}

fn cmd_month(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        Some(raw) => switch_to(context, parse_month(raw)?),
        None => {
            let key = context.current_month;
            let entries = context.view_month().entry_count();
            let state = if context.store.is_closed(key) {
                "closed"
            } else {
                "open"
            };
            io::print_info(format!(
                "Current month: {} {} ({}, {} entries)",
                key,
                key.name(),
                state,
                entries
            ));
            Ok(())
        }
    }
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let key = context.current_month.successor();
    switch_to(context, key)
}

fn cmd_prev(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let key = context.current_month.predecessor();
    switch_to(context, key)
}

fn switch_to(context: &mut ShellContext, key: MonthKey) -> CommandResult {
    let existed = context.store.is_materialized(key);
    context.set_current_month(key)?;
    let month = context.view_month();
    if !existed {
        io::print_info(format!(
            "Month {} opened with {} entries carried over.",
            key,
            month.entry_count()
        ));
    }
    io::print_success(format!("Now on {} {}.", key, key.name()));
    Ok(())
}

fn cmd_duplicate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let from = context.current_month;
    let to = match args.first() {
        Some(raw) => parse_month(raw)?,
        None => from.successor(),
    };
    // Materializes the source so duplicating an untouched month works.
    context.view_month();

    let prompt = format!("Month {} already has data. Replace it with {}?", to, from);
    let mode = context.mode;
    let theme = &context.theme;
    let mut prompt_error = None;
    let outcome = context.store.duplicate_to(from, to, || {
        confirm_with(mode, theme, &prompt).unwrap_or_else(|err| {
            prompt_error = Some(err);
            false
        })
    })?;
    if let Some(err) = prompt_error {
        return Err(err);
    }

    match outcome {
        DuplicateOutcome::Duplicated { to } => {
            io::print_success(format!("Copied {} onto {}.", from, to))
        }
        DuplicateOutcome::Cancelled => io::print_info("Duplicate cancelled."),
    }
    Ok(())
}

fn cmd_close(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    set_lock(context, args, true)
}

fn cmd_reopen(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    set_lock(context, args, false)
}

fn set_lock(context: &mut ShellContext, args: &[&str], closed: bool) -> CommandResult {
    let key = match args.first() {
        Some(raw) => parse_month(raw)?,
        None => context.current_month,
    };
    context.store.set_closed(key, closed);
    let state = if closed { "closed" } else { "open" };
    io::print_success(format!("Month {} is {}.", key, state));
    Ok(())
}

fn cmd_template_save(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let count = TemplateService::save_template(&mut context.store, context.current_month);
    io::print_success(format!("Template saved with {} fixed expenses.", count));
    Ok(())
}

fn cmd_template_apply(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let count = TemplateService::apply_template(&mut context.store, context.current_month)?;
    io::print_success(format!(
        "Added {} fixed expenses to {}.",
        count, context.current_month
    ));
    Ok(())
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Delete every month and every lock?")? {
        io::print_info("Reset cancelled.");
        return Ok(());
    }
    context.store.reset();
    io::print_success("All months deleted.");
    Ok(())
}
