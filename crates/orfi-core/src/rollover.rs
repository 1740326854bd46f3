//! Month materialization by carrying the previous month forward.
//!
//! Every copied entry is rebuilt field by field through [`CarryForward`], so
//! the reset rules for each kind live next to each other and nothing that is
//! not a declared field survives a copy.

use orfi_domain::{
    DebtTerms, EntryId, FixedExpenseEntry, IncomeEntry, InstallmentLoan, LedgerMonth, MonthKey,
    MonthMap, PurchaseEntry, RevolvingDebt, SavingsGoal, FIRST_DAY,
};
use tracing::info;

use crate::{ids::IdGenerator, CoreError};

/// Builds the next month's copy of an entry under a fresh identifier.
///
/// Copies land on [`FIRST_DAY`] and start unpaid. Cumulative progress
/// (installments paid, savings balances) is kept.
pub trait CarryForward {
    fn carry_forward(&self, id: EntryId) -> Self;
}

impl CarryForward for IncomeEntry {
    fn carry_forward(&self, id: EntryId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            amount: self.amount,
            category: self.category.clone(),
            day_of_month: FIRST_DAY,
        }
    }
}

impl CarryForward for FixedExpenseEntry {
    fn carry_forward(&self, id: EntryId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            amount: self.amount,
            category: self.category.clone(),
            day_of_month: FIRST_DAY,
            paid: false,
        }
    }
}

impl CarryForward for PurchaseEntry {
    fn carry_forward(&self, id: EntryId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            amount: self.amount,
            category: self.category.clone(),
            day_of_month: FIRST_DAY,
            paid: false,
        }
    }
}

fn carry_terms(terms: &DebtTerms) -> DebtTerms {
    DebtTerms {
        total_principal: terms.total_principal,
        term_months: terms.term_months,
        installments_paid: terms.installments_paid,
        monthly_rate: terms.monthly_rate,
    }
}

impl CarryForward for RevolvingDebt {
    fn carry_forward(&self, id: EntryId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            terms: carry_terms(&self.terms),
            computed_installment: self.computed_installment,
            day_of_month: FIRST_DAY,
            paid: false,
        }
    }
}

impl CarryForward for InstallmentLoan {
    fn carry_forward(&self, id: EntryId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            terms: carry_terms(&self.terms),
            insurance_pct: self.insurance_pct,
            insurance_tax_pct: self.insurance_tax_pct,
            computed_installment: self.computed_installment,
            day_of_month: FIRST_DAY,
            paid: false,
        }
    }
}

impl CarryForward for SavingsGoal {
    fn carry_forward(&self, id: EntryId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            day_of_month: FIRST_DAY,
        }
    }
}

fn carry_all<T: CarryForward>(items: &[T], ids: &mut IdGenerator) -> Vec<T> {
    items
        .iter()
        .map(|item| item.carry_forward(ids.next_id()))
        .collect()
}

/// How [`RolloverEngine::ensure_month`] satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    AlreadyPresent,
    ClonedFrom(MonthKey),
    CreatedEmpty,
}

impl MaterializeOutcome {
    /// True when the month did not exist before the call.
    pub fn created(self) -> bool {
        !matches!(self, MaterializeOutcome::AlreadyPresent)
    }
}

/// Result of an explicit duplication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateOutcome {
    Duplicated { to: MonthKey },
    Cancelled,
}

pub struct RolloverEngine;

impl RolloverEngine {
    /// Copies every entry of `source` into a new month with fresh identifiers.
    pub fn carry_forward_month(source: &LedgerMonth, ids: &mut IdGenerator) -> LedgerMonth {
        LedgerMonth {
            incomes: carry_all(&source.incomes, ids),
            fixed_expenses: carry_all(&source.fixed_expenses, ids),
            purchases: carry_all(&source.purchases, ids),
            revolving_debts: carry_all(&source.revolving_debts, ids),
            installment_loans: carry_all(&source.installment_loans, ids),
            savings_goals: carry_all(&source.savings_goals, ids),
        }
    }

    /// Materializes `key` when absent, cloning its circular predecessor if
    /// that month exists (even when empty) and starting empty otherwise.
    pub fn ensure_month(
        months: &mut MonthMap,
        ids: &mut IdGenerator,
        key: MonthKey,
    ) -> MaterializeOutcome {
        if months.contains_key(&key) {
            return MaterializeOutcome::AlreadyPresent;
        }

        let previous = key.predecessor();
        let (month, outcome) = match months.get(&previous) {
            Some(source) => (
                Self::carry_forward_month(source, ids),
                MaterializeOutcome::ClonedFrom(previous),
            ),
            None => (LedgerMonth::new(), MaterializeOutcome::CreatedEmpty),
        };

        match outcome {
            MaterializeOutcome::ClonedFrom(source) => info!(
                month = %key,
                source = %source,
                entries = month.entry_count(),
                "month materialized from predecessor"
            ),
            _ => info!(month = %key, "month materialized empty"),
        }
        months.insert(key, month);
        outcome
    }

    /// Copies `from` onto `to`, replacing whatever `to` held.
    ///
    /// `confirm_overwrite` is consulted only when `to` already holds entries;
    /// a `false` answer leaves everything untouched.
    pub fn duplicate_to<F>(
        months: &mut MonthMap,
        ids: &mut IdGenerator,
        from: MonthKey,
        to: MonthKey,
        confirm_overwrite: F,
    ) -> Result<DuplicateOutcome, CoreError>
    where
        F: FnOnce() -> bool,
    {
        let source = months.get(&from).ok_or(CoreError::MonthNotFound(from))?;

        let target_has_data = months.get(&to).is_some_and(|month| !month.is_empty());
        if target_has_data && !confirm_overwrite() {
            info!(from = %from, to = %to, "duplication cancelled");
            return Ok(DuplicateOutcome::Cancelled);
        }

        let copy = Self::carry_forward_month(source, ids);
        info!(
            from = %from,
            to = %to,
            entries = copy.entry_count(),
            "month duplicated"
        );
        months.insert(to, copy);
        Ok(DuplicateOutcome::Duplicated { to })
    }
}
