use std::fs;
use std::path::PathBuf;

use chrono::Local;
use orfi_core::{SystemClock, TransferService};

use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{print_table, section as output_section};
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "export",
            "Export every month as JSON",
            "export [file]",
            cmd_export,
        ),
        CommandEntry::new(
            "import",
            "Replace all months with a JSON export",
            "import <file>",
            cmd_import,
        ),
        CommandEntry::new(
            "backup",
            "Snapshot every month to a backup file",
            "backup [note]",
            cmd_backup,
        ),
        CommandEntry::new("backups", "List ledger backups", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Replace all months with a backup",
            "restore <name>",
            cmd_restore,
        ),
    ]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let json = TransferService::export_json(&context.store, context.current_month, &SystemClock)?;
    match args.first() {
        Some(path) => {
            let path = PathBuf::from(path);
            fs::write(&path, json)?;
            io::print_success(format!(
                "Exported {} months to {}.",
                context.store.months().len(),
                path.display()
            ));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = PathBuf::from(context.arg_or_prompt(args, 0, "File to import", "import <file>")?);
    let text = fs::read_to_string(&path)?;
    // Rejects malformed files before asking anything.
    TransferService::parse_import(&text)?;

    if !context.store.months().is_empty()
        && !context.confirm("Importing replaces every month. Continue?")?
    {
        io::print_info("Import cancelled.");
        return Ok(());
    }

    let outcome = TransferService::import_json(&mut context.store, &text)?;
    if let Some(key) = outcome.current_month {
        context.set_current_month(key)?;
    }
    io::print_success(format!(
        "Imported {} months from {}.",
        outcome.months,
        path.display()
    ));
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let info = context.store.backup(note.as_deref())?;
    io::print_success(format!("Backup `{}` created.", info.name));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.store.list_backups()?;
    if backups.is_empty() {
        io::print_warning("No backups found.");
        return Ok(());
    }
    output_section("Backups");
    let rows: Vec<Vec<String>> = backups
        .iter()
        .map(|info| {
            vec![
                info.name.clone(),
                info.created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                info.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["Name", "Created", "Note"], &rows, &[false, false, false]);
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = context.arg_or_prompt(args, 0, "Backup name", "restore <name>")?;
    if !context.confirm(&format!("Replace every month with backup `{}`?", name))? {
        io::print_info("Restore cancelled.");
        return Ok(());
    }
    context.store.restore_backup(&name)?;
    io::print_success(format!(
        "Restored {} months from `{}`.",
        context.store.months().len(),
        name
    ));
    Ok(())
}
