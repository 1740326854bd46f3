use orfi_domain::{EntryId, MonthMap};

/// Monotonic identifier source scoped to one store.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts after the largest identifier already present in `months`.
    pub fn seeded_from(months: &MonthMap) -> Self {
        let mut ids = Self::new();
        ids.observe_all(months);
        ids
    }

    pub fn next_id(&mut self) -> EntryId {
        let id = EntryId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Ensures future identifiers never collide with `id`.
    pub fn observe(&mut self, id: EntryId) {
        if id.0 >= self.next {
            self.next = id.0.saturating_add(1);
        }
    }

    pub fn observe_all(&mut self, months: &MonthMap) {
        if let Some(max) = months.values().filter_map(|month| month.max_id()).max() {
            self.observe(max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orfi_domain::{IncomeEntry, LedgerEntry, LedgerMonth, MonthKey};

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdGenerator::new();
        let first = ids.next_id();
        let second = ids.next_id();
        assert!(second > first);
    }

    #[test]
    fn seeding_skips_existing_ids() {
        let mut month = LedgerMonth::new();
        let mut income = IncomeEntry::new("Salario", 10.0, "", 1);
        income.id = EntryId(41);
        month.push(LedgerEntry::Income(income));
        let mut months = MonthMap::new();
        months.insert(MonthKey::JANUARY, month);

        let mut ids = IdGenerator::seeded_from(&months);
        assert_eq!(ids.next_id(), EntryId(42));
        ids.observe(EntryId(10));
        assert_eq!(ids.next_id(), EntryId(43));
    }

    #[test]
    fn observing_the_largest_id_saturates() {
        let mut ids = IdGenerator::new();
        ids.observe(EntryId(u64::MAX));
        assert_eq!(ids.next_id(), EntryId(u64::MAX));
        assert_eq!(ids.next_id(), EntryId(u64::MAX));
    }
}
