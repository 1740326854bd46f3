//! Keeps stored debt installments in step with their inputs.

use orfi_domain::LedgerMonth;
use tracing::debug;

use crate::amortization::InstallmentInputs;

/// Smallest drift, in currency units, that is left alone.
pub const DEFAULT_HYSTERESIS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalcPolicy {
    /// Stored values are overwritten only when they differ by more than this.
    pub threshold: i64,
}

impl Default for RecalcPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_HYSTERESIS,
        }
    }
}

impl RecalcPolicy {
    pub fn with_threshold(threshold: i64) -> Self {
        Self {
            threshold: threshold.max(0),
        }
    }

    fn should_replace(&self, stored: Option<i64>, fresh: i64) -> bool {
        match stored {
            None => true,
            Some(stored) => fresh.abs_diff(stored) > self.threshold.unsigned_abs(),
        }
    }
}

pub struct DebtRecalculator;

impl DebtRecalculator {
    /// Refreshes every card and loan installment in `month`; returns how many
    /// stored values changed.
    pub fn recalc(month: &mut LedgerMonth, policy: &RecalcPolicy) -> usize {
        let mut changed = 0;

        for card in &mut month.revolving_debts {
            let fresh = InstallmentInputs::from(&*card).installment();
            if policy.should_replace(card.computed_installment, fresh) {
                debug!(
                    id = %card.id,
                    stored = ?card.computed_installment,
                    fresh,
                    "card installment updated"
                );
                card.computed_installment = Some(fresh);
                changed += 1;
            }
        }

        for loan in &mut month.installment_loans {
            let fresh = InstallmentInputs::from(&*loan).installment();
            if policy.should_replace(loan.computed_installment, fresh) {
                debug!(
                    id = %loan.id,
                    stored = ?loan.computed_installment,
                    fresh,
                    "loan installment updated"
                );
                loan.computed_installment = Some(fresh);
                changed += 1;
            }
        }

        changed
    }
}
