//! Validated CRUD over the entries of a single month.

use std::collections::BTreeSet;

use orfi_domain::{
    DebtTerms, EntryId, Identifiable, LedgerEntry, LedgerMonth, MonthKey, MonthMap, Payable,
    Section,
};
use tracing::info;

use crate::{amortization::InstallmentInputs, store::LedgerStore, CoreError};

pub const MAX_MONTHLY_RATE: f64 = 0.5;
pub const MAX_INSURANCE_PCT: f64 = 1.0;

/// Provides validated CRUD helpers for month entries.
pub struct EntryService;

impl EntryService {
    /// Adds `entry` to `month` under a fresh identifier and returns it.
    pub fn add(
        store: &mut LedgerStore,
        month: MonthKey,
        mut entry: LedgerEntry,
    ) -> Result<EntryId, CoreError> {
        validate(&entry)?;
        refresh_installment(&mut entry);
        store.update_month(month, |ledger, ids| {
            let id = ids.next_id();
            entry.set_id(id);
            info!(month = %month, id = %id, section = %entry.section(), "entry added");
            ledger.push(entry);
            Ok(id)
        })
    }

    /// Replaces the entry `id` with `replacement`, keeping the identifier.
    pub fn edit(
        store: &mut LedgerStore,
        month: MonthKey,
        id: EntryId,
        mut replacement: LedgerEntry,
    ) -> Result<(), CoreError> {
        validate(&replacement)?;
        replacement.set_id(id);
        refresh_installment(&mut replacement);
        store.update_month(month, |ledger, _| {
            let current = ledger.entry(id).ok_or(CoreError::EntryNotFound(id))?;
            if current.section() != replacement.section() {
                return Err(CoreError::validation(format!(
                    "entry {id} is in {}, not {}",
                    current.section(),
                    replacement.section()
                )));
            }
            ledger.replace(replacement);
            Ok(())
        })
    }

    pub fn remove(
        store: &mut LedgerStore,
        month: MonthKey,
        id: EntryId,
    ) -> Result<LedgerEntry, CoreError> {
        store.update_month(month, |ledger, _| {
            let removed = ledger.remove(id).ok_or(CoreError::EntryNotFound(id))?;
            info!(month = %month, id = %id, "entry removed");
            Ok(removed)
        })
    }

    /// Flips the paid flag and returns the new value. A debt moving to paid
    /// records one more installment, never past its term.
    pub fn toggle_paid(
        store: &mut LedgerStore,
        month: MonthKey,
        id: EntryId,
    ) -> Result<bool, CoreError> {
        store.update_month(month, |ledger, _| toggle_in(ledger, id))
    }

    /// Marks every entry of a payable section paid and returns how many
    /// entries changed state.
    pub fn mark_all_paid(
        store: &mut LedgerStore,
        month: MonthKey,
        section: Section,
    ) -> Result<usize, CoreError> {
        if !section.is_payable() {
            return Err(CoreError::validation(format!("{section} have no paid flag")));
        }
        store.update_month(month, |ledger, _| {
            let changed = mark_all_in(ledger, section);
            info!(month = %month, section = %section, changed, "marked all paid");
            Ok(changed)
        })
    }

    /// Adds `amount` to a savings goal's balance and returns the new balance.
    pub fn add_to_savings(
        store: &mut LedgerStore,
        month: MonthKey,
        id: EntryId,
        amount: f64,
    ) -> Result<f64, CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::validation("amount to save must be greater than zero"));
        }
        store.update_month(month, |ledger, _| {
            let goal = ledger
                .savings_goals
                .iter_mut()
                .find(|goal| goal.id == id)
                .ok_or(CoreError::EntryNotFound(id))?;
            goal.current_amount += amount;
            Ok(goal.current_amount)
        })
    }

    /// Snapshot of one section of the month.
    pub fn list(store: &mut LedgerStore, month: MonthKey, section: Section) -> Vec<LedgerEntry> {
        store.month(month).section_entries(section)
    }
}

fn refresh_installment(entry: &mut LedgerEntry) {
    match entry {
        LedgerEntry::RevolvingDebt(card) => {
            card.computed_installment = Some(InstallmentInputs::from(&*card).installment());
        }
        LedgerEntry::InstallmentLoan(loan) => {
            loan.computed_installment = Some(InstallmentInputs::from(&*loan).installment());
        }
        _ => {}
    }
}

fn record_installment(terms: &mut DebtTerms) {
    if terms.installments_paid < terms.term_months {
        terms.installments_paid += 1;
    }
}

fn toggle_in(ledger: &mut LedgerMonth, id: EntryId) -> Result<bool, CoreError> {
    if let Some(item) = ledger.fixed_expenses.iter_mut().find(|e| e.id == id) {
        item.paid = !item.paid;
        return Ok(item.paid);
    }
    if let Some(item) = ledger.purchases.iter_mut().find(|e| e.id == id) {
        item.paid = !item.paid;
        return Ok(item.paid);
    }
    if let Some(item) = ledger.revolving_debts.iter_mut().find(|e| e.id == id) {
        item.paid = !item.paid;
        if item.paid {
            record_installment(&mut item.terms);
        }
        return Ok(item.paid);
    }
    if let Some(item) = ledger.installment_loans.iter_mut().find(|e| e.id == id) {
        item.paid = !item.paid;
        if item.paid {
            record_installment(&mut item.terms);
        }
        return Ok(item.paid);
    }
    match ledger.entry(id) {
        Some(entry) => Err(CoreError::validation(format!("{} have no paid flag", entry.section()))),
        None => Err(CoreError::EntryNotFound(id)),
    }
}

fn mark_all_in(ledger: &mut LedgerMonth, section: Section) -> usize {
    fn mark<T: Payable>(items: &mut [T], set_paid: impl Fn(&mut T)) -> usize {
        let mut changed = 0;
        for item in items.iter_mut().filter(|item| !item.is_paid()) {
            set_paid(item);
            changed += 1;
        }
        changed
    }

    match section {
        Section::FixedExpenses => mark(&mut ledger.fixed_expenses, |e| e.paid = true),
        Section::Purchases => mark(&mut ledger.purchases, |e| e.paid = true),
        Section::RevolvingDebts => mark(&mut ledger.revolving_debts, |e| {
            e.paid = true;
            record_installment(&mut e.terms);
        }),
        Section::InstallmentLoans => mark(&mut ledger.installment_loans, |e| {
            e.paid = true;
            record_installment(&mut e.terms);
        }),
        Section::Incomes | Section::SavingsGoals => 0,
    }
}

/// Checks field ranges before an entry reaches the store.
pub fn validate(entry: &LedgerEntry) -> Result<(), CoreError> {
    use orfi_domain::{NamedEntity, Scheduled};

    if entry.name().trim().is_empty() {
        return Err(CoreError::validation("name cannot be empty"));
    }
    let day = entry.day_of_month();
    if !(1..=31).contains(&day) {
        return Err(CoreError::validation(format!(
            "day of month must be between 1 and 31, got {day}"
        )));
    }

    match entry {
        LedgerEntry::Income(e) => check_amount("amount", e.amount),
        LedgerEntry::FixedExpense(e) => check_amount("amount", e.amount),
        LedgerEntry::Purchase(e) => check_amount("amount", e.amount),
        LedgerEntry::RevolvingDebt(e) => check_terms(&e.terms),
        LedgerEntry::InstallmentLoan(e) => {
            check_terms(&e.terms)?;
            check_fraction("insurance", e.insurance_pct, MAX_INSURANCE_PCT)?;
            check_fraction("insurance tax", e.insurance_tax_pct, MAX_INSURANCE_PCT)
        }
        LedgerEntry::SavingsGoal(e) => {
            check_amount("target", e.target_amount)?;
            check_amount("current balance", e.current_amount)
        }
    }
}

/// Checks every entry of every month, naming the first offender. Used on data
/// that enters the store without going through [`EntryService`].
pub fn validate_months(months: &MonthMap) -> Result<(), CoreError> {
    for (key, month) in months {
        let mut seen = BTreeSet::new();
        for entry in month.entries() {
            let id = entry.id();
            if !seen.insert(id) {
                return Err(CoreError::validation(format!(
                    "month {key}: duplicate entry id {id}"
                )));
            }
            validate(&entry).map_err(|err| match err {
                CoreError::Validation(message) => {
                    CoreError::validation(format!("month {key}, entry {id}: {message}"))
                }
                other => other,
            })?;
        }
    }
    Ok(())
}

fn check_amount(label: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "{label} must be a non-negative number"
        )))
    }
}

fn check_fraction(label: &str, value: f64, max: f64) -> Result<(), CoreError> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "{label} must be between 0% and {}%",
            max * 100.0
        )))
    }
}

fn check_terms(terms: &DebtTerms) -> Result<(), CoreError> {
    check_amount("principal", terms.total_principal)?;
    if terms.term_months < 1 {
        return Err(CoreError::validation("term must be at least one month"));
    }
    if terms.installments_paid > terms.term_months {
        return Err(CoreError::validation(format!(
            "installments paid ({}) cannot exceed the term ({})",
            terms.installments_paid, terms.term_months
        )));
    }
    check_fraction("monthly rate", terms.monthly_rate, MAX_MONTHLY_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orfi_domain::{
        FixedExpenseEntry, IncomeEntry, InstallmentLoan, RevolvingDebt, SavingsGoal,
    };

    use crate::{
        lock::LockPolicy,
        storage::MemoryStorage,
        store::StoreOptions,
    };

    fn store() -> LedgerStore {
        LedgerStore::open(Box::new(MemoryStorage::new()), StoreOptions::default())
    }

    fn key(number: u8) -> MonthKey {
        MonthKey::new(number).unwrap()
    }

    fn card(paid: u32, term: u32) -> LedgerEntry {
        let mut terms = DebtTerms::new(1_000_000.0, term, 0.0185);
        terms.installments_paid = paid;
        LedgerEntry::RevolvingDebt(RevolvingDebt::new("Visa", terms))
    }

    #[test]
    fn add_assigns_ids_and_computes_installments() {
        let mut store = store();
        let first = EntryService::add(
            &mut store,
            key(1),
            LedgerEntry::Income(IncomeEntry::new("Salario", 3_500_000.0, "Trabajo", 1)),
        )
        .unwrap();
        let second = EntryService::add(&mut store, key(1), card(0, 12)).unwrap();
        assert_ne!(first, second);

        let month = store.peek(key(1)).unwrap();
        let installment = month.revolving_debts[0].computed_installment.unwrap();
        assert!((installment - 93_691).abs() <= 1);
    }

    #[test]
    fn invalid_entries_are_rejected_before_mutation() {
        let mut store = store();
        let cases = vec![
            LedgerEntry::Income(IncomeEntry::new("  ", 10.0, "", 1)),
            LedgerEntry::Income(IncomeEntry::new("Bono", -1.0, "", 1)),
            LedgerEntry::Purchase(orfi_domain::PurchaseEntry::new("Cine", 10.0, "", 32)),
            card(13, 12),
            card(0, 0),
            LedgerEntry::RevolvingDebt(RevolvingDebt::new(
                "Usura",
                DebtTerms::new(1000.0, 12, 0.6),
            )),
            LedgerEntry::InstallmentLoan(InstallmentLoan::new(
                "Banco",
                DebtTerms::new(1000.0, 12, 0.01),
                1.5,
                0.19,
            )),
        ];
        for entry in cases {
            let err = EntryService::add(&mut store, key(2), entry).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{err:?}");
        }
        assert!(store.peek(key(2)).is_none());
    }

    #[test]
    fn edit_keeps_id_and_kind() {
        let mut store = store();
        let id = EntryService::add(
            &mut store,
            key(3),
            LedgerEntry::FixedExpense(FixedExpenseEntry::new(
                "Arriendo",
                1_200_000.0,
                "Vivienda",
                5,
            )),
        )
        .unwrap();

        EntryService::edit(
            &mut store,
            key(3),
            id,
            LedgerEntry::FixedExpense(FixedExpenseEntry::new(
                "Arriendo",
                1_300_000.0,
                "Vivienda",
                5,
            )),
        )
        .unwrap();
        let month = store.peek(key(3)).unwrap();
        assert_eq!(month.fixed_expenses[0].id, id);
        assert_eq!(month.fixed_expenses[0].amount, 1_300_000.0);

        let err = EntryService::edit(
            &mut store,
            key(3),
            id,
            LedgerEntry::Income(IncomeEntry::new("Arriendo", 1.0, "", 1)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = EntryService::edit(
            &mut store,
            key(3),
            EntryId(999),
            LedgerEntry::FixedExpense(FixedExpenseEntry::new("Luz", 1.0, "", 1)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::EntryNotFound(EntryId(999))));
    }

    #[test]
    fn toggle_paid_tracks_debt_progress() {
        let mut store = store();
        let id = EntryService::add(&mut store, key(4), card(11, 12)).unwrap();

        assert!(EntryService::toggle_paid(&mut store, key(4), id).unwrap());
        assert_eq!(store.peek(key(4)).unwrap().revolving_debts[0].terms.installments_paid, 12);

        assert!(!EntryService::toggle_paid(&mut store, key(4), id).unwrap());
        assert!(EntryService::toggle_paid(&mut store, key(4), id).unwrap());
        let card = &store.peek(key(4)).unwrap().revolving_debts[0];
        assert_eq!(card.terms.installments_paid, 12, "never past the term");
    }

    #[test]
    fn toggle_paid_rejects_unpayable_entries() {
        let mut store = store();
        let id = EntryService::add(
            &mut store,
            key(5),
            LedgerEntry::SavingsGoal(SavingsGoal::new("Viaje", 100.0, 0.0)),
        )
        .unwrap();
        assert!(matches!(
            EntryService::toggle_paid(&mut store, key(5), id),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            EntryService::toggle_paid(&mut store, key(5), EntryId(12345)),
            Err(CoreError::EntryNotFound(_))
        ));
    }

    #[test]
    fn mark_all_paid_counts_each_entry_once() {
        let mut store = store();
        let first = EntryService::add(&mut store, key(6), card(2, 12)).unwrap();
        EntryService::add(&mut store, key(6), card(4, 12)).unwrap();
        EntryService::toggle_paid(&mut store, key(6), first).unwrap();

        let changed =
            EntryService::mark_all_paid(&mut store, key(6), Section::RevolvingDebts).unwrap();
        assert_eq!(changed, 1);
        let cards = &store.peek(key(6)).unwrap().revolving_debts;
        assert_eq!(cards[0].terms.installments_paid, 3);
        assert_eq!(cards[1].terms.installments_paid, 5);
        assert!(cards.iter().all(|card| card.paid));

        assert!(EntryService::mark_all_paid(&mut store, key(6), Section::Incomes).is_err());
    }

    #[test]
    fn savings_deposits_accumulate() {
        let mut store = store();
        let id = EntryService::add(
            &mut store,
            key(7),
            LedgerEntry::SavingsGoal(SavingsGoal::new("Emergencias", 5_000_000.0, 1_200_000.0)),
        )
        .unwrap();
        let balance = EntryService::add_to_savings(&mut store, key(7), id, 300_000.0).unwrap();
        assert_eq!(balance, 1_500_000.0);
        assert!(EntryService::add_to_savings(&mut store, key(7), id, 0.0).is_err());
        assert!(EntryService::add_to_savings(&mut store, key(7), id, f64::NAN).is_err());
    }

    #[test]
    fn removal_and_locking() {
        let mut store = store();
        let id = EntryService::add(
            &mut store,
            key(8),
            LedgerEntry::Income(IncomeEntry::new("Salario", 1.0, "", 1)),
        )
        .unwrap();
        store.set_closed(key(8), true);
        assert!(matches!(
            EntryService::remove(&mut store, key(8), id),
            Err(CoreError::MonthClosed(_))
        ));

        store.set_lock_policy(LockPolicy::Advisory);
        let removed = EntryService::remove(&mut store, key(8), id).unwrap();
        assert_eq!(removed.section(), Section::Incomes);
        assert!(matches!(
            EntryService::remove(&mut store, key(8), id),
            Err(CoreError::EntryNotFound(_))
        ));
    }
}
