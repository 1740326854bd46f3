//! Equal-installment (French) amortization with insurance add-ons.

use orfi_domain::{DebtTerms, InstallmentLoan, RevolvingDebt};

/// Inputs to [`cuota`]. Rates and percentages are fractions (`0.0185` = 1.85%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InstallmentInputs {
    pub principal: f64,
    pub monthly_rate: f64,
    pub term_months: i64,
    pub insurance_pct: f64,
    pub insurance_tax_pct: f64,
}

impl InstallmentInputs {
    pub fn new(principal: f64, monthly_rate: f64, term_months: i64) -> Self {
        Self {
            principal,
            monthly_rate,
            term_months,
            ..Self::default()
        }
    }

    pub fn with_insurance(mut self, insurance_pct: f64, insurance_tax_pct: f64) -> Self {
        self.insurance_pct = insurance_pct;
        self.insurance_tax_pct = insurance_tax_pct;
        self
    }

    pub fn installment(&self) -> i64 {
        cuota(
            self.principal,
            self.monthly_rate,
            self.term_months,
            self.insurance_pct,
            self.insurance_tax_pct,
        )
    }
}

impl From<&DebtTerms> for InstallmentInputs {
    fn from(terms: &DebtTerms) -> Self {
        Self::new(
            terms.total_principal,
            terms.monthly_rate,
            i64::from(terms.term_months),
        )
    }
}

impl From<&RevolvingDebt> for InstallmentInputs {
    fn from(debt: &RevolvingDebt) -> Self {
        Self::from(&debt.terms)
    }
}

impl From<&InstallmentLoan> for InstallmentInputs {
    fn from(loan: &InstallmentLoan) -> Self {
        Self::from(&loan.terms).with_insurance(loan.insurance_pct, loan.insurance_tax_pct)
    }
}

/// Monthly installment rounded to whole currency units.
///
/// A non-positive term yields 0. A zero rate divides the principal evenly.
/// Insurance is charged as `principal * insurance_pct / term` per month and
/// taxed at `insurance_tax_pct`.
pub fn cuota(
    principal: f64,
    monthly_rate: f64,
    term_months: i64,
    insurance_pct: f64,
    insurance_tax_pct: f64,
) -> i64 {
    if term_months <= 0 {
        return 0;
    }
    let term = term_months as f64;
    let base = base_installment(principal, monthly_rate, term);
    let insurance_monthly = principal * insurance_pct / term;
    let insurance_tax = insurance_monthly * insurance_tax_pct;
    (base + insurance_monthly + insurance_tax).round() as i64
}

fn base_installment(principal: f64, monthly_rate: f64, term: f64) -> f64 {
    if monthly_rate == 0.0 {
        return principal / term;
    }
    let factor = (1.0 + monthly_rate).powf(term);
    principal * monthly_rate * factor / (factor - 1.0)
}

/// One period of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePeriod {
    pub number: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Full equal-installment schedule, excluding insurance surcharges.
pub fn schedule(principal: f64, monthly_rate: f64, term_months: u32) -> Vec<SchedulePeriod> {
    if term_months == 0 {
        return Vec::new();
    }
    let payment = base_installment(principal, monthly_rate, f64::from(term_months));
    let mut balance = principal;
    let mut periods = Vec::with_capacity(term_months as usize);
    for number in 1..=term_months {
        let interest = balance * monthly_rate;
        let amortized = payment - interest;
        balance = (balance - amortized).max(0.0);
        periods.push(SchedulePeriod {
            number,
            payment,
            interest,
            principal: amortized,
            balance,
        });
    }
    periods
}

/// Principal still owed after `installments_paid` payments.
pub fn outstanding_principal(terms: &DebtTerms) -> f64 {
    if terms.installments_paid == 0 {
        return terms.total_principal;
    }
    schedule(terms.total_principal, terms.monthly_rate, terms.term_months)
        .get(terms.installments_paid as usize - 1)
        .map(|period| period.balance)
        .unwrap_or(0.0)
}
