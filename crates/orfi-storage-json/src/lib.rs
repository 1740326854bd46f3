use std::{
    cmp::Reverse,
    collections::BTreeSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use orfi_core::{
    storage::{LedgerBackupInfo, LedgerStorage},
    CoreError,
};
use orfi_domain::{FixedExpenseEntry, MonthKey, MonthMap};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

const JSON_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

const LEDGER_FILE: &str = "ledger.json";
const LOCKS_FILE: &str = "locks.json";
const TEMPLATE_FILE: &str = "template.json";
const BACKUP_DIR: &str = "backups";

/// Prefix of backups requested explicitly.
const MANUAL_PREFIX: &str = "ledger";
/// Prefix of the copies taken before `ledger.json` is overwritten.
const AUTO_PREFIX: &str = "autosave";

/// Directories used by [`JsonLedgerStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// Standard layout: data files in `root`, backups in `root/backups`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let data_root = root.into();
        let backup_root = data_root.join(BACKUP_DIR);
        Self {
            data_root,
            backup_root,
        }
    }
}

/// Filesystem-backed JSON persistence for the month map, lock flags, the
/// fixed-expense template and ledger backups.
#[derive(Debug, Clone)]
pub struct JsonLedgerStorage {
    paths: StoragePaths,
    retention: usize,
}

impl JsonLedgerStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.paths.data_root.join(LEDGER_FILE)
    }

    pub fn locks_path(&self) -> PathBuf {
        self.paths.data_root.join(LOCKS_FILE)
    }

    pub fn template_path(&self) -> PathBuf {
        self.paths.data_root.join(TEMPLATE_FILE)
    }

    pub fn backup_path(&self, name: &str) -> PathBuf {
        self.paths.backup_root.join(name)
    }

    fn write_backup_file(
        &self,
        months: &MonthMap,
        note: Option<&str>,
    ) -> Result<LedgerBackupInfo, CoreError> {
        fs::create_dir_all(&self.paths.backup_root)?;
        let created_at = Utc::now();
        let note = sanitize_backup_note(note);
        let mut stem = format!(
            "{}_{}",
            MANUAL_PREFIX,
            created_at.format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = note.as_deref() {
            stem.push('_');
            stem.push_str(label);
        }
        let file_name = format!("{stem}.{JSON_EXTENSION}");
        let path = self.backup_path(&file_name);
        write_atomic(&path, &to_json(months)?)?;
        self.prune_backups(MANUAL_PREFIX)?;
        Ok(LedgerBackupInfo {
            name: file_name,
            created_at: parse_backup_timestamp(&stem_of(&path)).unwrap_or(created_at),
            note,
            path: Some(path),
        })
    }

    fn backup_existing_file(&self, path: &Path) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.paths.backup_root)?;
        let file_name = format!(
            "{}_{}.{}",
            AUTO_PREFIX,
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT),
            JSON_EXTENSION
        );
        let backup_path = self.backup_path(&file_name);
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "previous ledger copied");
        self.prune_backups(AUTO_PREFIX)?;
        Ok(())
    }

    /// Keeps the newest `retention` backups per prefix.
    fn prune_backups(&self, prefix: &str) -> Result<(), CoreError> {
        let entries = self
            .list_backups()?
            .into_iter()
            .filter(|info| backup_prefix(&info.name) == Some(prefix));
        for entry in entries.skip(self.retention) {
            if let Some(path) = entry.path {
                let _ = fs::remove_file(path);
            }
        }
        Ok(())
    }
}

impl LedgerStorage for JsonLedgerStorage {
    fn load_months(&self) -> Result<Option<MonthMap>, CoreError> {
        read_json(&self.ledger_path())
    }

    fn save_months(&self, months: &MonthMap) -> Result<(), CoreError> {
        let path = self.ledger_path();
        self.backup_existing_file(&path)?;
        save_json(&path, months)
    }

    fn load_locks(&self) -> Result<BTreeSet<MonthKey>, CoreError> {
        Ok(read_json(&self.locks_path())?.unwrap_or_default())
    }

    fn save_locks(&self, closed: &BTreeSet<MonthKey>) -> Result<(), CoreError> {
        save_json(&self.locks_path(), closed)
    }

    fn load_template(&self) -> Result<Option<Vec<FixedExpenseEntry>>, CoreError> {
        read_json(&self.template_path())
    }

    fn save_template(&self, template: &[FixedExpenseEntry]) -> Result<(), CoreError> {
        save_json(&self.template_path(), template)
    }

    fn backup(&self, months: &MonthMap, note: Option<&str>) -> Result<LedgerBackupInfo, CoreError> {
        self.write_backup_file(months, note)
    }

    fn list_backups(&self) -> Result<Vec<LedgerBackupInfo>, CoreError> {
        let dir = &self.paths.backup_root;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let stem = stem_of(&path);
            let Some(created_at) = parse_backup_timestamp(&stem) else {
                continue;
            };
            entries.push(LedgerBackupInfo {
                name: file_name.to_string(),
                created_at,
                note: backup_note(&stem),
                path: Some(path.clone()),
            });
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.name.clone())));
        Ok(entries)
    }

    fn restore_backup(&self, name: &str) -> Result<MonthMap, CoreError> {
        let path = self.backup_path(name);
        if name.contains(['/', '\\']) || !path.exists() {
            return Err(CoreError::NotFound(format!("backup `{name}`")));
        }
        read_json(&path)?.ok_or_else(|| CoreError::NotFound(format!("backup `{name}`")))
    }
}

/// Writes `value` as pretty JSON through a temporary sibling file.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &to_json(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads JSON from `path`; `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|err| CoreError::Serde(format!("{}: {err}", path.display())))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string_pretty(value).map_err(|err| CoreError::Serde(err.to_string()))
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Splits `prefix_YYYYMMDD_HHMMSS[_note]` into its parts.
fn split_backup_stem(stem: &str) -> Option<(&str, &str, &str, Option<&str>)> {
    let mut segments = stem.splitn(4, '_');
    let prefix = segments.next()?;
    let date = segments.next()?;
    let time = segments.next()?;
    Some((prefix, date, time, segments.next()))
}

fn backup_prefix(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(&format!(".{JSON_EXTENSION}"))?;
    split_backup_stem(stem).map(|(prefix, ..)| prefix)
}

fn backup_note(stem: &str) -> Option<String> {
    split_backup_stem(stem)
        .and_then(|(_, _, _, note)| note)
        .map(str::to_string)
}

fn parse_backup_timestamp(stem: &str) -> Option<DateTime<Utc>> {
    let (prefix, date, time, _) = split_backup_stem(stem)?;
    if prefix != MANUAL_PREFIX && prefix != AUTO_PREFIX {
        return None;
    }
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_sanitized() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Reset!! v1.2 ")),
            Some("before-reset-v1-2".into())
        );
        assert_eq!(sanitize_backup_note(Some("***")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }

    #[test]
    fn backup_names_parse() {
        let stem = "ledger_20250301_101500_before-reset";
        let parsed = parse_backup_timestamp(stem).unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-03-01 10:15:00");
        assert_eq!(backup_note(stem).as_deref(), Some("before-reset"));
        assert_eq!(backup_prefix("autosave_20250301_101500.json"), Some("autosave"));
        assert!(parse_backup_timestamp("notes_20250301_101500").is_none());
        assert!(parse_backup_timestamp("ledger_2025_101500").is_none());
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("/data/ledger.json")),
            PathBuf::from("/data/ledger.json.tmp")
        );
    }
}
