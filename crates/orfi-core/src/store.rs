//! In-memory owner of every ledger month plus the collaborators that keep it
//! consistent: rollover, recalculation, lock flags and persistence.

use std::collections::BTreeSet;

use orfi_domain::{
    FixedExpenseEntry, IncomeEntry, LedgerEntry, LedgerMonth, MonthKey, MonthMap, PurchaseEntry,
    SavingsGoal,
};
use tracing::{info, warn};

use crate::{
    entry_service::validate_months,
    ids::IdGenerator,
    lock::{LockPolicy, MonthLockRegistry},
    recalc::{DebtRecalculator, RecalcPolicy},
    rollover::{DuplicateOutcome, RolloverEngine},
    storage::{LedgerBackupInfo, LedgerStorage},
    time::{Clock, SystemClock},
    CoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    pub lock_policy: LockPolicy,
    pub recalc: RecalcPolicy,
    /// Seed the current month with example entries when storage is empty.
    pub seed_sample_data: bool,
}

pub struct LedgerStore {
    storage: Box<dyn LedgerStorage>,
    months: MonthMap,
    locks: MonthLockRegistry,
    template: Option<Vec<FixedExpenseEntry>>,
    ids: IdGenerator,
    options: StoreOptions,
    notice: Option<String>,
}

impl LedgerStore {
    pub fn open(storage: Box<dyn LedgerStorage>, options: StoreOptions) -> Self {
        Self::open_with_clock(storage, options, &SystemClock)
    }

    /// Loads months, lock flags and the template from `storage`.
    ///
    /// Load failures and months holding invalid entries leave the affected
    /// part empty and are reported through [`LedgerStore::take_notice`].
    pub fn open_with_clock(
        storage: Box<dyn LedgerStorage>,
        options: StoreOptions,
        clock: &dyn Clock,
    ) -> Self {
        let mut store = Self {
            storage,
            months: MonthMap::new(),
            locks: MonthLockRegistry::new(),
            template: None,
            ids: IdGenerator::new(),
            options,
            notice: None,
        };

        let loaded = store.storage.load_months();
        match loaded {
            Ok(Some(months)) => match validate_months(&months) {
                Ok(()) => {
                    store.ids = IdGenerator::seeded_from(&months);
                    store.months = months;
                }
                Err(err) => store.record_failure("load ledger", &err),
            },
            Ok(None) if options.seed_sample_data => {
                let key = clock.current_month();
                let sample = sample_month(&mut store.ids);
                store.months.insert(key, sample);
                info!(month = %key, "seeded sample data");
                store.persist_months();
            }
            Ok(None) => {}
            Err(err) => store.record_failure("load ledger", &err),
        }

        match store.storage.load_locks() {
            Ok(closed) => store.locks = MonthLockRegistry::from_closed(closed),
            Err(err) => store.record_failure("load month locks", &err),
        }
        match store.storage.load_template() {
            Ok(template) => store.template = template,
            Err(err) => store.record_failure("load template", &err),
        }

        store
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn set_recalc_policy(&mut self, policy: RecalcPolicy) {
        self.options.recalc = policy;
    }

    pub fn set_lock_policy(&mut self, policy: LockPolicy) {
        self.options.lock_policy = policy;
    }

    /// Returns the month, materializing it from its predecessor when absent
    /// and refreshing debt installments unless the month is locked.
    pub fn month(&mut self, key: MonthKey) -> &LedgerMonth {
        let mut dirty =
            RolloverEngine::ensure_month(&mut self.months, &mut self.ids, key).created();

        if self.is_writable(key) {
            let recalc = self.options.recalc;
            let month = self.months.entry(key).or_default();
            dirty |= DebtRecalculator::recalc(month, &recalc) > 0;
        }
        if dirty {
            self.persist_months();
        }

        self.months.entry(key).or_default()
    }

    /// Month data without materializing or recalculating.
    pub fn peek(&self, key: MonthKey) -> Option<&LedgerMonth> {
        self.months.get(&key)
    }

    pub fn months(&self) -> &MonthMap {
        &self.months
    }

    pub fn is_materialized(&self, key: MonthKey) -> bool {
        self.months.contains_key(&key)
    }

    /// Applies `mutation` to a working copy of `key` and commits it only when
    /// the closure succeeds.
    pub fn update_month<T, F>(&mut self, key: MonthKey, mutation: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut LedgerMonth, &mut IdGenerator) -> Result<T, CoreError>,
    {
        self.locks.check_writable(key, self.options.lock_policy)?;

        let mut ids = self.ids.clone();
        let mut working = match self.months.get(&key) {
            Some(month) => month.clone(),
            None => {
                let mut staged = self.months.clone();
                RolloverEngine::ensure_month(&mut staged, &mut ids, key);
                staged.remove(&key).unwrap_or_default()
            }
        };

        let value = mutation(&mut working, &mut ids)?;
        self.months.insert(key, working);
        self.ids = ids;
        self.persist_months();
        Ok(value)
    }

    /// Copies `from` onto `to`; see [`RolloverEngine::duplicate_to`].
    pub fn duplicate_to<F>(
        &mut self,
        from: MonthKey,
        to: MonthKey,
        confirm_overwrite: F,
    ) -> Result<DuplicateOutcome, CoreError>
    where
        F: FnOnce() -> bool,
    {
        self.locks.check_writable(to, self.options.lock_policy)?;
        let outcome = RolloverEngine::duplicate_to(
            &mut self.months,
            &mut self.ids,
            from,
            to,
            confirm_overwrite,
        )?;
        if let DuplicateOutcome::Duplicated { to } = outcome {
            let recalc = self.options.recalc;
            DebtRecalculator::recalc(self.months.entry(to).or_default(), &recalc);
            self.persist_months();
        }
        Ok(outcome)
    }

    pub fn is_closed(&self, key: MonthKey) -> bool {
        self.locks.is_closed(key)
    }

    pub fn closed_months(&self) -> Vec<MonthKey> {
        self.locks.closed_months().collect()
    }

    /// Whether mutations on `key` are currently allowed.
    pub fn is_writable(&self, key: MonthKey) -> bool {
        self.locks.check_writable(key, self.options.lock_policy).is_ok()
    }

    pub fn set_closed(&mut self, key: MonthKey, closed: bool) {
        if self.locks.set_closed(key, closed) {
            info!(month = %key, closed, "month lock changed");
            self.persist_locks();
        }
    }

    pub fn template(&self) -> Option<&[FixedExpenseEntry]> {
        self.template.as_deref()
    }

    pub fn set_template(&mut self, template: Vec<FixedExpenseEntry>) {
        if let Err(err) = self.storage.save_template(&template) {
            self.record_failure("save template", &err);
        }
        self.template = Some(template);
    }

    /// Replaces every month, e.g. after an import or a restore.
    pub fn replace_all(&mut self, months: MonthMap) {
        self.ids.observe_all(&months);
        self.months = months;
        self.persist_months();
    }

    /// Drops every month and every lock flag.
    pub fn reset(&mut self) {
        self.months.clear();
        self.locks.clear();
        info!("ledger reset");
        self.persist_months();
        self.persist_locks();
    }

    pub fn backup(&self, note: Option<&str>) -> Result<LedgerBackupInfo, CoreError> {
        self.storage.backup(&self.months, note)
    }

    pub fn list_backups(&self) -> Result<Vec<LedgerBackupInfo>, CoreError> {
        self.storage.list_backups()
    }

    pub fn restore_backup(&mut self, name: &str) -> Result<(), CoreError> {
        let months = self.storage.restore_backup(name)?;
        validate_months(&months)?;
        info!(backup = name, months = months.len(), "backup restored");
        self.replace_all(months);
        Ok(())
    }

    /// Latest persistence failure, cleared on read.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn persist_months(&mut self) {
        if let Err(err) = self.storage.save_months(&self.months) {
            self.record_failure("save ledger", &err);
        }
    }

    fn persist_locks(&mut self) {
        let closed: BTreeSet<MonthKey> = self.locks.closed_months().collect();
        if let Err(err) = self.storage.save_locks(&closed) {
            self.record_failure("save month locks", &err);
        }
    }

    fn record_failure(&mut self, action: &str, err: &CoreError) {
        warn!(action, error = %err, "persistence failure; keeping in-memory state");
        self.notice = Some(format!("Could not {action}: {err}"));
    }
}

fn sample_month(ids: &mut IdGenerator) -> LedgerMonth {
    let mut month = LedgerMonth::new();
    let entries = vec![
        LedgerEntry::Income(IncomeEntry::new("Salario", 3_500_000.0, "Trabajo", 1)),
        LedgerEntry::FixedExpense(FixedExpenseEntry::new(
            "Arriendo",
            1_200_000.0,
            "Vivienda",
            1,
        )),
        LedgerEntry::Purchase(PurchaseEntry::new(
            "Supermercado",
            400_000.0,
            "Alimentación",
            10,
        )),
        LedgerEntry::SavingsGoal(SavingsGoal::new("Emergencias", 5_000_000.0, 1_200_000.0)),
    ];
    for mut entry in entries {
        entry.set_id(ids.next_id());
        month.push(entry);
    }
    month
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use orfi_domain::{DebtTerms, EntryId, RevolvingDebt};

    use crate::{storage::MemoryStorage, time::FixedClock};

    /// Shares one MemoryStorage between the store and the test.
    struct Shared(Arc<MemoryStorage>);

    impl LedgerStorage for Shared {
        fn load_months(&self) -> Result<Option<MonthMap>, CoreError> {
            self.0.load_months()
        }
        fn save_months(&self, months: &MonthMap) -> Result<(), CoreError> {
            self.0.save_months(months)
        }
        fn load_locks(&self) -> Result<BTreeSet<MonthKey>, CoreError> {
            self.0.load_locks()
        }
        fn save_locks(&self, closed: &BTreeSet<MonthKey>) -> Result<(), CoreError> {
            self.0.save_locks(closed)
        }
        fn load_template(&self) -> Result<Option<Vec<FixedExpenseEntry>>, CoreError> {
            self.0.load_template()
        }
        fn save_template(&self, template: &[FixedExpenseEntry]) -> Result<(), CoreError> {
            self.0.save_template(template)
        }
        fn backup(
            &self,
            months: &MonthMap,
            note: Option<&str>,
        ) -> Result<LedgerBackupInfo, CoreError> {
            self.0.backup(months, note)
        }
        fn list_backups(&self) -> Result<Vec<LedgerBackupInfo>, CoreError> {
            self.0.list_backups()
        }
        fn restore_backup(&self, name: &str) -> Result<MonthMap, CoreError> {
            self.0.restore_backup(name)
        }
    }

    fn key(number: u8) -> MonthKey {
        MonthKey::new(number).unwrap()
    }

    fn march_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap())
    }

    fn open_shared(options: StoreOptions) -> (LedgerStore, Arc<MemoryStorage>) {
        let backend = Arc::new(MemoryStorage::new());
        let store = LedgerStore::open_with_clock(
            Box::new(Shared(Arc::clone(&backend))),
            options,
            &march_clock(),
        );
        (store, backend)
    }

    #[test]
    fn empty_storage_is_seeded_for_current_month() {
        let options = StoreOptions {
            seed_sample_data: true,
            ..StoreOptions::default()
        };
        let (store, backend) = open_shared(options);
        let march = store.peek(key(3)).expect("sample month");
        assert_eq!(march.incomes[0].name, "Salario");
        assert_eq!(march.entry_count(), 4);
        assert!(backend.snapshot().is_some());
    }

    #[test]
    fn seeding_can_be_disabled() {
        let (store, _) = open_shared(StoreOptions::default());
        assert!(store.months().is_empty());
    }

    #[test]
    fn month_materializes_and_persists() {
        let (mut store, backend) = open_shared(StoreOptions::default());
        assert!(store.month(key(5)).is_empty());
        assert!(backend.snapshot().unwrap().contains_key(&key(5)));
        let saves = backend.save_count();
        store.month(key(5));
        assert_eq!(backend.save_count(), saves, "no save when nothing changed");
    }

    #[test]
    fn month_fills_missing_installments() {
        let (mut store, _) = open_shared(StoreOptions::default());
        store
            .update_month(key(1), |month, ids| {
                let mut card = RevolvingDebt::new("Visa", DebtTerms::new(1_000_000.0, 12, 0.0185));
                card.id = ids.next_id();
                month.revolving_debts.push(card);
                Ok(())
            })
            .unwrap();
        assert_eq!(store.peek(key(1)).unwrap().revolving_debts[0].computed_installment, None);
        let installment = store.month(key(1)).revolving_debts[0].computed_installment;
        assert!(installment.is_some());
    }

    #[test]
    fn failed_mutation_leaves_month_untouched() {
        let (mut store, _) = open_shared(StoreOptions::default());
        store.month(key(2));
        let before = store.peek(key(2)).cloned();
        let result: Result<(), CoreError> = store.update_month(key(2), |month, ids| {
            let mut income = IncomeEntry::new("Bono", 10.0, "", 1);
            income.id = ids.next_id();
            month.incomes.push(income);
            Err(CoreError::validation("rejected"))
        });
        assert!(result.is_err());
        assert_eq!(store.peek(key(2)).cloned(), before);
    }

    #[test]
    fn closed_month_rejects_mutations_when_enforced() {
        let (mut store, _) = open_shared(StoreOptions::default());
        store.month(key(4));
        store.set_closed(key(4), true);
        let err = store.update_month(key(4), |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, CoreError::MonthClosed(month) if month == key(4)));

        store.set_lock_policy(LockPolicy::Advisory);
        assert!(store.update_month(key(4), |_, _| Ok(())).is_ok());
    }

    #[test]
    fn persistence_failures_become_notices() {
        let (mut store, backend) = open_shared(StoreOptions::default());
        backend.set_fail_writes(true);
        store
            .update_month(key(6), |month, ids| {
                let mut income = IncomeEntry::new("Salario", 100.0, "", 1);
                income.id = ids.next_id();
                month.incomes.push(income);
                Ok(())
            })
            .unwrap();
        assert_eq!(store.peek(key(6)).unwrap().incomes.len(), 1);
        let notice = store.take_notice().expect("notice recorded");
        assert!(notice.contains("save ledger"));
        assert!(store.take_notice().is_none());
    }

    #[test]
    fn locks_survive_reopen() {
        let backend = Arc::new(MemoryStorage::new());
        let mut store = LedgerStore::open_with_clock(
            Box::new(Shared(Arc::clone(&backend))),
            StoreOptions::default(),
            &march_clock(),
        );
        store.set_closed(key(8), true);
        drop(store);

        let reopened = LedgerStore::open_with_clock(
            Box::new(Shared(Arc::clone(&backend))),
            StoreOptions::default(),
            &march_clock(),
        );
        assert!(reopened.is_closed(key(8)));
        assert_eq!(reopened.closed_months(), vec![key(8)]);
    }

    #[test]
    fn reset_clears_months_and_locks() {
        let (mut store, backend) = open_shared(StoreOptions::default());
        store.month(key(1));
        store.set_closed(key(1), true);
        store.reset();
        assert!(store.months().is_empty());
        assert!(!store.is_closed(key(1)));
        assert_eq!(backend.snapshot(), Some(MonthMap::new()));
    }

    #[test]
    fn restore_replaces_months_from_backup() {
        let (mut store, _) = open_shared(StoreOptions::default());
        store.month(key(1));
        let info = store.backup(Some("before reset")).unwrap();
        store.reset();
        store.restore_backup(&info.name).unwrap();
        assert!(store.is_materialized(key(1)));
        assert!(store.restore_backup("missing").is_err());
    }

    fn months_with_broken_card() -> MonthMap {
        let mut terms = DebtTerms::new(1_000_000.0, 12, 0.0185);
        terms.installments_paid = 20;
        let mut card = RevolvingDebt::new("Visa", terms);
        card.id = EntryId(4);
        let mut month = LedgerMonth::new();
        month.revolving_debts.push(card);
        let mut months = MonthMap::new();
        months.insert(key(2), month);
        months
    }

    #[test]
    fn invalid_stored_months_are_not_loaded() {
        let backend = Arc::new(MemoryStorage::with_months(months_with_broken_card()));
        let mut store = LedgerStore::open_with_clock(
            Box::new(Shared(Arc::clone(&backend))),
            StoreOptions::default(),
            &march_clock(),
        );
        assert!(store.months().is_empty());
        let notice = store.take_notice().expect("notice recorded");
        assert!(notice.contains("load ledger"), "{notice}");
        assert!(notice.contains("month 02"), "{notice}");
        assert_eq!(backend.snapshot(), Some(months_with_broken_card()));
    }

    #[test]
    fn invalid_backups_are_not_restored() {
        let (mut store, backend) = open_shared(StoreOptions::default());
        store.month(key(1));
        let before = store.months().clone();
        let info = backend.backup(&months_with_broken_card(), None).unwrap();

        let err = store.restore_backup(&info.name).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(store.months(), &before);
    }
}
