//! Month-level ledger container and the tagged entry variant.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{common::*, entry::*, month::MonthKey};

/// Every materialized month keyed by its [`MonthKey`].
pub type MonthMap = BTreeMap<MonthKey, LedgerMonth>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Names the six ordered sequences held by a [`LedgerMonth`].
pub enum Section {
    Incomes,
    FixedExpenses,
    Purchases,
    RevolvingDebts,
    InstallmentLoans,
    SavingsGoals,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Incomes,
        Section::FixedExpenses,
        Section::Purchases,
        Section::RevolvingDebts,
        Section::InstallmentLoans,
        Section::SavingsGoals,
    ];

    /// Sections whose entries carry a `paid` flag.
    pub fn is_payable(self) -> bool {
        matches!(
            self,
            Section::FixedExpenses
                | Section::Purchases
                | Section::RevolvingDebts
                | Section::InstallmentLoans
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Section::Incomes => "Incomes",
            Section::FixedExpenses => "Fixed expenses",
            Section::Purchases => "Purchases",
            Section::RevolvingDebts => "Cards",
            Section::InstallmentLoans => "Loans",
            Section::SavingsGoals => "Savings goals",
        };
        f.write_str(label)
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "incomes" | "income" | "ingresos" => Ok(Section::Incomes),
            "fixed" | "fixed-expenses" | "gastosfijos" => Ok(Section::FixedExpenses),
            "purchases" | "purchase" | "gastoscompras" => Ok(Section::Purchases),
            "cards" | "card" | "tarjetas" => Ok(Section::RevolvingDebts),
            "loans" | "loan" | "creditos" => Ok(Section::InstallmentLoans),
            "goals" | "goal" | "savings" | "ahorros" => Ok(Section::SavingsGoals),
            other => Err(format!("unknown section `{other}`")),
        }
    }
}

/// One entry of any kind, dispatched by pattern matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Income(IncomeEntry),
    FixedExpense(FixedExpenseEntry),
    Purchase(PurchaseEntry),
    RevolvingDebt(RevolvingDebt),
    InstallmentLoan(InstallmentLoan),
    SavingsGoal(SavingsGoal),
}

impl LedgerEntry {
    pub fn section(&self) -> Section {
        match self {
            LedgerEntry::Income(_) => Section::Incomes,
            LedgerEntry::FixedExpense(_) => Section::FixedExpenses,
            LedgerEntry::Purchase(_) => Section::Purchases,
            LedgerEntry::RevolvingDebt(_) => Section::RevolvingDebts,
            LedgerEntry::InstallmentLoan(_) => Section::InstallmentLoans,
            LedgerEntry::SavingsGoal(_) => Section::SavingsGoals,
        }
    }

    pub fn set_id(&mut self, id: EntryId) {
        match self {
            LedgerEntry::Income(entry) => entry.id = id,
            LedgerEntry::FixedExpense(entry) => entry.id = id,
            LedgerEntry::Purchase(entry) => entry.id = id,
            LedgerEntry::RevolvingDebt(entry) => entry.id = id,
            LedgerEntry::InstallmentLoan(entry) => entry.id = id,
            LedgerEntry::SavingsGoal(entry) => entry.id = id,
        }
    }

    fn as_dyn(&self) -> &dyn EntryView {
        match self {
            LedgerEntry::Income(entry) => entry,
            LedgerEntry::FixedExpense(entry) => entry,
            LedgerEntry::Purchase(entry) => entry,
            LedgerEntry::RevolvingDebt(entry) => entry,
            LedgerEntry::InstallmentLoan(entry) => entry,
            LedgerEntry::SavingsGoal(entry) => entry,
        }
    }
}

trait EntryView: Identifiable + NamedEntity + Scheduled {}
impl<T: Identifiable + NamedEntity + Scheduled> EntryView for T {}

impl Identifiable for LedgerEntry {
    fn id(&self) -> EntryId {
        self.as_dyn().id()
    }
}

impl NamedEntity for LedgerEntry {
    fn name(&self) -> &str {
        self.as_dyn().name()
    }
}

impl Scheduled for LedgerEntry {
    fn day_of_month(&self) -> u8 {
        self.as_dyn().day_of_month()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// All entries recorded for a single month.
///
/// The six sequences always exist once a month is materialized; missing
/// sequences in stored documents deserialize as empty.
pub struct LedgerMonth {
    #[serde(default, alias = "ingresos")]
    pub incomes: Vec<IncomeEntry>,
    #[serde(default, alias = "gastosFijos")]
    pub fixed_expenses: Vec<FixedExpenseEntry>,
    #[serde(default, alias = "gastosCompras")]
    pub purchases: Vec<PurchaseEntry>,
    #[serde(default, alias = "tarjetas")]
    pub revolving_debts: Vec<RevolvingDebt>,
    #[serde(default, alias = "creditos")]
    pub installment_loans: Vec<InstallmentLoan>,
    #[serde(default, alias = "ahorros")]
    pub savings_goals: Vec<SavingsGoal>,
}

impl LedgerMonth {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every sequence is empty.
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|section| self.len(*section) == 0)
    }

    pub fn len(&self, section: Section) -> usize {
        match section {
            Section::Incomes => self.incomes.len(),
            Section::FixedExpenses => self.fixed_expenses.len(),
            Section::Purchases => self.purchases.len(),
            Section::RevolvingDebts => self.revolving_debts.len(),
            Section::InstallmentLoans => self.installment_loans.len(),
            Section::SavingsGoals => self.savings_goals.len(),
        }
    }

    pub fn entry_count(&self) -> usize {
        Section::ALL.iter().map(|section| self.len(*section)).sum()
    }

    /// Appends an entry to the sequence matching its kind.
    pub fn push(&mut self, entry: LedgerEntry) {
        match entry {
            LedgerEntry::Income(entry) => self.incomes.push(entry),
            LedgerEntry::FixedExpense(entry) => self.fixed_expenses.push(entry),
            LedgerEntry::Purchase(entry) => self.purchases.push(entry),
            LedgerEntry::RevolvingDebt(entry) => self.revolving_debts.push(entry),
            LedgerEntry::InstallmentLoan(entry) => self.installment_loans.push(entry),
            LedgerEntry::SavingsGoal(entry) => self.savings_goals.push(entry),
        }
    }

    /// Snapshot of every entry in section order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let mut entries = Vec::with_capacity(self.entry_count());
        entries.extend(self.incomes.iter().cloned().map(LedgerEntry::Income));
        entries.extend(
            self.fixed_expenses
                .iter()
                .cloned()
                .map(LedgerEntry::FixedExpense),
        );
        entries.extend(self.purchases.iter().cloned().map(LedgerEntry::Purchase));
        entries.extend(
            self.revolving_debts
                .iter()
                .cloned()
                .map(LedgerEntry::RevolvingDebt),
        );
        entries.extend(
            self.installment_loans
                .iter()
                .cloned()
                .map(LedgerEntry::InstallmentLoan),
        );
        entries.extend(
            self.savings_goals
                .iter()
                .cloned()
                .map(LedgerEntry::SavingsGoal),
        );
        entries
    }

    pub fn section_entries(&self, section: Section) -> Vec<LedgerEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.section() == section)
            .collect()
    }

    pub fn entry(&self, id: EntryId) -> Option<LedgerEntry> {
        self.entries().into_iter().find(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.ids().any(|candidate| candidate == id)
    }

    /// Every identifier held by the month.
    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.incomes
            .iter()
            .map(|e| e.id)
            .chain(self.fixed_expenses.iter().map(|e| e.id))
            .chain(self.purchases.iter().map(|e| e.id))
            .chain(self.revolving_debts.iter().map(|e| e.id))
            .chain(self.installment_loans.iter().map(|e| e.id))
            .chain(self.savings_goals.iter().map(|e| e.id))
    }

    /// Removes the entry with `id`, returning it when found.
    pub fn remove(&mut self, id: EntryId) -> Option<LedgerEntry> {
        fn take<T: Identifiable>(items: &mut Vec<T>, id: EntryId) -> Option<T> {
            let index = items.iter().position(|item| item.id() == id)?;
            Some(items.remove(index))
        }

        take(&mut self.incomes, id)
            .map(LedgerEntry::Income)
            .or_else(|| take(&mut self.fixed_expenses, id).map(LedgerEntry::FixedExpense))
            .or_else(|| take(&mut self.purchases, id).map(LedgerEntry::Purchase))
            .or_else(|| take(&mut self.revolving_debts, id).map(LedgerEntry::RevolvingDebt))
            .or_else(|| take(&mut self.installment_loans, id).map(LedgerEntry::InstallmentLoan))
            .or_else(|| take(&mut self.savings_goals, id).map(LedgerEntry::SavingsGoal))
    }

    /// Replaces the entry sharing `entry`'s identifier in place, keeping its
    /// position. Returns `false` when no entry of that kind has the id.
    pub fn replace(&mut self, entry: LedgerEntry) -> bool {
        fn swap<T: Identifiable>(items: &mut [T], replacement: T) -> bool {
            match items.iter_mut().find(|item| item.id() == replacement.id()) {
                Some(slot) => {
                    *slot = replacement;
                    true
                }
                None => false,
            }
        }

        match entry {
            LedgerEntry::Income(entry) => swap(&mut self.incomes, entry),
            LedgerEntry::FixedExpense(entry) => swap(&mut self.fixed_expenses, entry),
            LedgerEntry::Purchase(entry) => swap(&mut self.purchases, entry),
            LedgerEntry::RevolvingDebt(entry) => swap(&mut self.revolving_debts, entry),
            LedgerEntry::InstallmentLoan(entry) => swap(&mut self.installment_loans, entry),
            LedgerEntry::SavingsGoal(entry) => swap(&mut self.savings_goals, entry),
        }
    }

    /// Largest identifier in the month, if any.
    pub fn max_id(&self) -> Option<EntryId> {
        self.ids().max()
    }
}
