use std::{
    collections::BTreeSet,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
};

use chrono::{DateTime, Utc};
use orfi_domain::{FixedExpenseEntry, MonthKey, MonthMap};

use crate::CoreError;

/// Describes a persisted snapshot of the month map.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerBackupInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
    pub path: Option<PathBuf>,
}

/// Abstraction over persistence backends for the ledger, lock flags and the
/// fixed-expense template.
pub trait LedgerStorage: Send + Sync {
    /// `None` when nothing has ever been saved.
    fn load_months(&self) -> Result<Option<MonthMap>, CoreError>;
    fn save_months(&self, months: &MonthMap) -> Result<(), CoreError>;
    fn load_locks(&self) -> Result<BTreeSet<MonthKey>, CoreError>;
    fn save_locks(&self, closed: &BTreeSet<MonthKey>) -> Result<(), CoreError>;
    fn load_template(&self) -> Result<Option<Vec<FixedExpenseEntry>>, CoreError>;
    fn save_template(&self, template: &[FixedExpenseEntry]) -> Result<(), CoreError>;
    fn backup(&self, months: &MonthMap, note: Option<&str>) -> Result<LedgerBackupInfo, CoreError>;
    /// Newest first.
    fn list_backups(&self) -> Result<Vec<LedgerBackupInfo>, CoreError>;
    fn restore_backup(&self, name: &str) -> Result<MonthMap, CoreError>;
}

#[derive(Default)]
struct MemoryState {
    months: Option<MonthMap>,
    locks: BTreeSet<MonthKey>,
    template: Option<Vec<FixedExpenseEntry>>,
    backups: Vec<(LedgerBackupInfo, MonthMap)>,
    saves: usize,
}

/// Process-local storage used by tests and benchmarks.
///
/// Writes can be made to fail on demand to exercise the store's handling of
/// persistence errors.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_months(months: MonthMap) -> Self {
        let storage = Self::default();
        if let Ok(mut state) = storage.state.lock() {
            state.months = Some(months);
        }
        storage
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Months as last written, if any.
    pub fn snapshot(&self) -> Option<MonthMap> {
        self.state.lock().ok().and_then(|state| state.months.clone())
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().map(|state| state.saves).unwrap_or(0)
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Persistence("memory storage poisoned".into()))
    }

    fn writable(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("memory storage is read-only".into()));
        }
        self.state()
    }
}

impl LedgerStorage for MemoryStorage {
    fn load_months(&self) -> Result<Option<MonthMap>, CoreError> {
        Ok(self.state()?.months.clone())
    }

    fn save_months(&self, months: &MonthMap) -> Result<(), CoreError> {
        let mut state = self.writable()?;
        state.months = Some(months.clone());
        state.saves += 1;
        Ok(())
    }

    fn load_locks(&self) -> Result<BTreeSet<MonthKey>, CoreError> {
        Ok(self.state()?.locks.clone())
    }

    fn save_locks(&self, closed: &BTreeSet<MonthKey>) -> Result<(), CoreError> {
        self.writable()?.locks = closed.clone();
        Ok(())
    }

    fn load_template(&self) -> Result<Option<Vec<FixedExpenseEntry>>, CoreError> {
        Ok(self.state()?.template.clone())
    }

    fn save_template(&self, template: &[FixedExpenseEntry]) -> Result<(), CoreError> {
        self.writable()?.template = Some(template.to_vec());
        Ok(())
    }

    fn backup(&self, months: &MonthMap, note: Option<&str>) -> Result<LedgerBackupInfo, CoreError> {
        let mut state = self.writable()?;
        let info = LedgerBackupInfo {
            name: format!("memory-{}", state.backups.len() + 1),
            created_at: Utc::now(),
            note: note.map(str::to_string),
            path: None,
        };
        state.backups.push((info.clone(), months.clone()));
        Ok(info)
    }

    fn list_backups(&self) -> Result<Vec<LedgerBackupInfo>, CoreError> {
        Ok(self
            .state()?
            .backups
            .iter()
            .rev()
            .map(|(info, _)| info.clone())
            .collect())
    }

    fn restore_backup(&self, name: &str) -> Result<MonthMap, CoreError> {
        self.state()?
            .backups
            .iter()
            .find(|(info, _)| info.name == name)
            .map(|(_, months)| months.clone())
            .ok_or_else(|| CoreError::NotFound(format!("backup `{name}`")))
    }
}
