//! Entry kinds recorded inside a ledger month.
//!
//! Every kind carries an identifier and a day of month. Field aliases accept
//! documents exported by the original Spanish-language web client.

use serde::{Deserialize, Serialize};

use crate::common::*;

impl EntryId {
    /// Placeholder carried by drafts until the store assigns a real identifier.
    pub const UNASSIGNED: EntryId = EntryId(0);
    /// Largest identifier that survives a round trip through the web client's
    /// JSON numbers (2^53 - 1).
    pub const MAX: EntryId = EntryId(9_007_199_254_740_991);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Money received during the month.
pub struct IncomeEntry {
    pub id: EntryId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "monto")]
    pub amount: f64,
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(
        default = "default_day",
        alias = "fecha",
        deserialize_with = "deserialize_day"
    )]
    pub day_of_month: u8,
}

impl IncomeEntry {
    pub fn new(name: impl Into<String>, amount: f64, category: impl Into<String>, day: u8) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            name: name.into(),
            amount,
            category: category.into(),
            day_of_month: day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Recurring bill such as rent or utilities.
pub struct FixedExpenseEntry {
    pub id: EntryId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "monto")]
    pub amount: f64,
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(
        default = "default_day",
        alias = "fecha",
        deserialize_with = "deserialize_day"
    )]
    pub day_of_month: u8,
    #[serde(default)]
    pub paid: bool,
}

impl FixedExpenseEntry {
    pub fn new(name: impl Into<String>, amount: f64, category: impl Into<String>, day: u8) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            name: name.into(),
            amount,
            category: category.into(),
            day_of_month: day,
            paid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Discretionary one-off spending.
pub struct PurchaseEntry {
    pub id: EntryId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "monto")]
    pub amount: f64,
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(
        default = "default_day",
        alias = "fecha",
        deserialize_with = "deserialize_day"
    )]
    pub day_of_month: u8,
    #[serde(default)]
    pub paid: bool,
}

impl PurchaseEntry {
    pub fn new(name: impl Into<String>, amount: f64, category: impl Into<String>, day: u8) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            name: name.into(),
            amount,
            category: category.into(),
            day_of_month: day,
            paid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Principal, rate and progress shared by every debt instrument.
pub struct DebtTerms {
    #[serde(alias = "montoTotal")]
    pub total_principal: f64,
    #[serde(alias = "numeroCuotas")]
    pub term_months: u32,
    #[serde(default, alias = "cuotasPagadas")]
    pub installments_paid: u32,
    /// Fraction per month, `0.0185` meaning 1.85%.
    #[serde(default, alias = "tasaMensual")]
    pub monthly_rate: f64,
}

impl DebtTerms {
    pub fn new(total_principal: f64, term_months: u32, monthly_rate: f64) -> Self {
        Self {
            total_principal,
            term_months,
            installments_paid: 0,
            monthly_rate,
        }
    }

    pub fn remaining_installments(&self) -> u32 {
        self.term_months.saturating_sub(self.installments_paid)
    }

    pub fn is_settled(&self) -> bool {
        self.installments_paid >= self.term_months
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Credit card balance paid in installments ("tarjeta").
pub struct RevolvingDebt {
    pub id: EntryId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(flatten)]
    pub terms: DebtTerms,
    /// Last stored installment; `None` until first computed.
    #[serde(default, alias = "cuotaMensual")]
    pub computed_installment: Option<i64>,
    #[serde(
        default = "default_day",
        alias = "fecha",
        deserialize_with = "deserialize_day"
    )]
    pub day_of_month: u8,
    #[serde(default)]
    pub paid: bool,
}

impl RevolvingDebt {
    pub fn new(name: impl Into<String>, terms: DebtTerms) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            name: name.into(),
            terms,
            computed_installment: None,
            day_of_month: FIRST_DAY,
            paid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Bank loan with optional insurance ("aval") and tax on that insurance ("IVA").
pub struct InstallmentLoan {
    pub id: EntryId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(flatten)]
    pub terms: DebtTerms,
    #[serde(default, alias = "avalPct")]
    pub insurance_pct: f64,
    #[serde(default, alias = "ivaAvalPct")]
    pub insurance_tax_pct: f64,
    #[serde(default, alias = "cuotaMensual")]
    pub computed_installment: Option<i64>,
    #[serde(
        default = "default_day",
        alias = "fecha",
        deserialize_with = "deserialize_day"
    )]
    pub day_of_month: u8,
    #[serde(default)]
    pub paid: bool,
}

impl InstallmentLoan {
    pub fn new(
        name: impl Into<String>,
        terms: DebtTerms,
        insurance_pct: f64,
        insurance_tax_pct: f64,
    ) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            name: name.into(),
            terms,
            insurance_pct,
            insurance_tax_pct,
            computed_installment: None,
            day_of_month: FIRST_DAY,
            paid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Running savings balance towards a target.
pub struct SavingsGoal {
    pub id: EntryId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "meta")]
    pub target_amount: f64,
    #[serde(default, alias = "actual")]
    pub current_amount: f64,
    #[serde(
        default = "default_day",
        alias = "fecha",
        deserialize_with = "deserialize_day"
    )]
    pub day_of_month: u8,
}

impl SavingsGoal {
    pub fn new(name: impl Into<String>, target_amount: f64, current_amount: f64) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            name: name.into(),
            target_amount,
            current_amount,
            day_of_month: FIRST_DAY,
        }
    }
}

macro_rules! impl_entry_traits {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identifiable for $ty {
                fn id(&self) -> EntryId {
                    self.id
                }
            }

            impl NamedEntity for $ty {
                fn name(&self) -> &str {
                    &self.name
                }
            }

            impl Scheduled for $ty {
                fn day_of_month(&self) -> u8 {
                    self.day_of_month
                }
            }
        )+
    };
}

impl_entry_traits!(
    IncomeEntry,
    FixedExpenseEntry,
    PurchaseEntry,
    RevolvingDebt,
    InstallmentLoan,
    SavingsGoal,
);

macro_rules! impl_payable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Payable for $ty {
                fn is_paid(&self) -> bool {
                    self.paid
                }
            }
        )+
    };
}

impl_payable!(FixedExpenseEntry, PurchaseEntry, RevolvingDebt, InstallmentLoan);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_legacy_loan_fields() {
        let raw = r#"{
            "id": 1712345678901,
            "nombre": "Libre inversion",
            "montoTotal": 1000000,
            "numeroCuotas": 12,
            "cuotasPagadas": 3,
            "tasaMensual": 0.0185,
            "avalPct": 0.12,
            "ivaAvalPct": 0.19,
            "cuotaMensual": 105593,
            "fecha": "01",
            "paid": true
        }"#;
        let loan: InstallmentLoan = serde_json::from_str(raw).unwrap();
        assert_eq!(loan.id, EntryId(1712345678901));
        assert_eq!(loan.terms.term_months, 12);
        assert_eq!(loan.terms.installments_paid, 3);
        assert_eq!(loan.computed_installment, Some(105593));
        assert_eq!(loan.day_of_month, 1);
        assert!(loan.paid);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let raw = r#"{"id": 7, "name": "Visa", "total_principal": 500.0, "term_months": 6}"#;
        let card: RevolvingDebt = serde_json::from_str(raw).unwrap();
        assert_eq!(card.terms.installments_paid, 0);
        assert_eq!(card.computed_installment, None);
        assert_eq!(card.day_of_month, FIRST_DAY);
        assert!(!card.paid);
    }

    #[test]
    fn debt_terms_track_progress() {
        let mut terms = DebtTerms::new(1200.0, 12, 0.0);
        terms.installments_paid = 5;
        assert_eq!(terms.remaining_installments(), 7);
        assert!(!terms.is_settled());
        terms.installments_paid = 12;
        assert!(terms.is_settled());
    }
}
