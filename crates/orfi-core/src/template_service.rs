//! Reusable list of fixed expenses that can be stamped onto any month.

use orfi_domain::{FixedExpenseEntry, MonthKey};
use tracing::info;

use crate::{rollover::CarryForward, store::LedgerStore, CoreError};

pub struct TemplateService;

impl TemplateService {
    /// Stores the fixed expenses of `month` as the template and returns how
    /// many were saved.
    pub fn save_template(store: &mut LedgerStore, month: MonthKey) -> usize {
        let template: Vec<FixedExpenseEntry> = store
            .month(month)
            .fixed_expenses
            .iter()
            .map(|expense| expense.carry_forward(expense.id))
            .collect();
        let count = template.len();
        info!(month = %month, count, "fixed-expense template saved");
        store.set_template(template);
        count
    }

    /// Appends the template to `month` as new unpaid entries dated the 1st.
    pub fn apply_template(store: &mut LedgerStore, month: MonthKey) -> Result<usize, CoreError> {
        let template = store
            .template()
            .map(<[FixedExpenseEntry]>::to_vec)
            .ok_or_else(|| CoreError::NotFound("fixed-expense template".into()))?;

        store.update_month(month, |ledger, ids| {
            for expense in &template {
                ledger.fixed_expenses.push(expense.carry_forward(ids.next_id()));
            }
            info!(month = %month, count = template.len(), "fixed-expense template applied");
            Ok(template.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orfi_domain::LedgerEntry;

    use crate::{entry_service::EntryService, storage::MemoryStorage, store::StoreOptions};

    fn key(number: u8) -> MonthKey {
        MonthKey::new(number).unwrap()
    }

    #[test]
    fn apply_without_template_fails() {
        let mut store = LedgerStore::open(Box::new(MemoryStorage::new()), StoreOptions::default());
        assert!(matches!(
            TemplateService::apply_template(&mut store, key(1)),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn template_round_trip_resets_entries() {
        let mut store = LedgerStore::open(Box::new(MemoryStorage::new()), StoreOptions::default());
        let mut rent = FixedExpenseEntry::new("Arriendo", 1_200_000.0, "Vivienda", 5);
        rent.paid = true;
        let id = EntryService::add(&mut store, key(1), LedgerEntry::FixedExpense(rent)).unwrap();

        assert_eq!(TemplateService::save_template(&mut store, key(1)), 1);
        assert_eq!(TemplateService::apply_template(&mut store, key(9)).unwrap(), 1);

        let applied = &store.peek(key(9)).unwrap().fixed_expenses[0];
        assert_eq!(applied.name, "Arriendo");
        assert_eq!(applied.day_of_month, 1);
        assert!(!applied.paid);
        assert_ne!(applied.id, id);
    }

    #[test]
    fn closed_month_rejects_template() {
        let mut store = LedgerStore::open(Box::new(MemoryStorage::new()), StoreOptions::default());
        store.set_template(vec![FixedExpenseEntry::new("Luz", 80_000.0, "Servicios", 3)]);
        store.set_closed(key(2), true);
        assert!(matches!(
            TemplateService::apply_template(&mut store, key(2)),
            Err(CoreError::MonthClosed(_))
        ));
    }
}
