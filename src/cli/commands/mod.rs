pub mod config;
pub mod entry;
pub mod month;
pub mod report;
pub mod system;
pub mod transfer;

use orfi_domain::{EntryId, MonthKey, Section};

use crate::cli::core::CommandError;
use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let groups = [
        system::definitions(),
        month::definitions(),
        report::definitions(),
        entry::definitions(),
        transfer::definitions(),
        config::definitions(),
    ];
    for entry in groups.into_iter().flatten() {
        registry.register(entry);
    }
}

pub(crate) fn parse_month(raw: &str) -> Result<MonthKey, CommandError> {
    raw.parse()
        .map_err(|err| CommandError::InvalidArguments(format!("{err} (use 01-12)")))
}

/// Accepts `12` or `#12`.
pub(crate) fn parse_entry_id(raw: &str) -> Result<EntryId, CommandError> {
    raw.trim_start_matches('#')
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
        .map(EntryId)
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{raw}` is not an entry id")))
}

pub(crate) fn parse_section(raw: &str) -> Result<Section, CommandError> {
    raw.parse().map_err(|err: String| {
        CommandError::InvalidArguments(format!(
            "{err}; expected one of incomes, fixed, purchases, cards, loans, goals"
        ))
    })
}

pub(crate) fn parse_day(raw: &str) -> Result<u8, CommandError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|day| (1..=31).contains(day))
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{raw}` is not a day (1-31)")))
}

pub(crate) fn parse_count(raw: &str, label: &str) -> Result<u32, CommandError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| CommandError::InvalidArguments(format!("{label} must be a whole number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_arguments() {
        assert_eq!(parse_month("4").unwrap(), MonthKey::new(4).unwrap());
        assert!(parse_month("13").is_err());
        assert_eq!(parse_entry_id("#7").unwrap(), EntryId(7));
        assert!(parse_entry_id("0").is_err());
        assert_eq!(parse_section("tarjetas").unwrap(), Section::RevolvingDebts);
        assert!(parse_day("32").is_err());
        assert_eq!(parse_count("12", "term").unwrap(), 12);
    }

    #[test]
    fn every_command_is_registered_once() {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        let names: Vec<&str> = registry.names().collect();
        for expected in [
            "help", "version", "exit", "month", "next", "prev", "show", "summary", "categories",
            "history", "advice", "schedule", "add-income", "add-fixed", "add-purchase",
            "add-card", "add-loan", "add-goal", "edit", "remove", "paid", "mark-all",
            "save-to-goal", "duplicate", "close", "reopen", "template-save", "template-apply",
            "export", "import", "backup", "backups", "restore", "reset", "config",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }
}
