use orfi_config::Config;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{print_table, section as output_section};
use crate::cli::registry::CommandEntry;

const USAGE: &str = "config [show|set <key> <value>|backup [note]|backups|restore <name>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and manage global CLI preferences",
        USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        return show_config(context);
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    Config::KEYS.join("|")
                )));
            }
            let key = args[1];
            let value = args[2..].join(" ");
            context.config.set(key, value.trim())?;
            context.persist_config()?;
            context.apply_config();
            io::print_success(format!("{} updated.", key));
            Ok(())
        }
        "backup" => {
            let note = (args.len() > 1).then(|| args[1..].join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            io::print_success(format!("Configuration backup `{}` created.", name));
            Ok(())
        }
        "backups" => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                io::print_warning("No configuration backups found.");
                return Ok(());
            }
            output_section("Configuration backups");
            for (index, name) in backups.iter().enumerate() {
                io::print_info(format!("{:>2}. {}", index + 1, name));
            }
            Ok(())
        }
        "restore" => {
            let name = context.arg_or_prompt(args, 1, "Backup name", "config restore <name>")?;
            if !context.confirm(&format!("Restore configuration from `{}`?", name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.config = context.config_manager.restore(&name)?;
            context.apply_config();
            io::print_success(format!("Configuration restored from `{}`.", name));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(format!("usage: {}", USAGE))),
    }
}

fn show_config(context: &ShellContext) -> CommandResult {
    output_section("Configuration");
    let mut rows: Vec<Vec<String>> = context
        .config
        .entries()
        .into_iter()
        .map(|(key, value)| vec![key.to_string(), value])
        .collect();
    rows.push(vec![
        "data_root".to_string(),
        context.data_root.display().to_string(),
    ]);
    print_table(&["Key", "Value"], &rows, &[false, false]);
    io::print_hint(format!(
        "config file: {}",
        context.config_manager.config_path().display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use orfi_config::{ConfigManager, LockMode};
    use orfi_core::LockPolicy;
    use tempfile::tempdir;

    use crate::cli::core::{CliMode, CommandError, ShellContext};

    #[test]
    fn set_persists_and_applies() {
        let dir = tempdir().unwrap();
        let mut context =
            ShellContext::with_data_root(CliMode::Script, dir.path().into()).unwrap();
        context
            .process_line("config set lock_policy advisory")
            .unwrap();
        context
            .process_line("config set installment_hysteresis 500")
            .unwrap();

        assert_eq!(context.config.lock_policy, LockMode::Advisory);
        assert_eq!(context.store.options().lock_policy, LockPolicy::Advisory);

        let saved = ConfigManager::with_base_dir(dir.path().into())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(saved.installment_hysteresis, 500);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let dir = tempdir().unwrap();
        let mut context =
            ShellContext::with_data_root(CliMode::Script, dir.path().into()).unwrap();
        let err = context.process_line("config set theme dark").unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
        let err = context
            .process_line("config set backup_retention 0")
            .unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
        assert!(matches!(
            context.process_line("config set currency").unwrap_err(),
            CommandError::InvalidArguments(_)
        ));
    }

    #[test]
    fn backup_and_restore_round_trip() {
        let dir = tempdir().unwrap();
        let mut context =
            ShellContext::with_data_root(CliMode::Script, dir.path().into()).unwrap();
        context.process_line("config backup before change").unwrap();
        let name = context.config_manager.list_backups().unwrap()[0].clone();
        assert!(name.ends_with("_before-change.json"));

        context.process_line("config set currency usd").unwrap();
        assert_eq!(context.formatter.code(), "USD");

        context
            .process_line(&format!("config restore {}", name))
            .unwrap();
        assert_eq!(context.config.currency, "COP");
        assert_eq!(context.formatter.code(), "COP");
    }
}
