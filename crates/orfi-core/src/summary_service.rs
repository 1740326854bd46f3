//! Totals, breakdowns and advice derived from month data. Read-only.

use std::collections::HashMap;

use orfi_domain::{DebtTerms, LedgerMonth, MonthKey, MonthMap, SavingsGoal};

use crate::amortization::outstanding_principal;

/// Label used for expenses without a category.
pub const UNCATEGORIZED: &str = "Otros";

/// Savings rate below which the low-savings advice is shown.
pub const LOW_SAVINGS_RATE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthSummary {
    pub incomes: f64,
    pub fixed_expenses: f64,
    pub card_installments: f64,
    pub loan_installments: f64,
    pub purchases: f64,
    pub savings: f64,
}

impl MonthSummary {
    pub fn total_expenses(&self) -> f64 {
        self.fixed_expenses + self.card_installments + self.loan_installments + self.purchases
    }

    pub fn free_balance(&self) -> f64 {
        self.incomes - self.total_expenses()
    }

    /// Balance as a fraction of incomes; `None` without incomes.
    pub fn savings_rate(&self) -> Option<f64> {
        if self.incomes == 0.0 {
            None
        } else {
            Some(self.free_balance() / self.incomes)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
    /// Fraction of all categorized spending.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub month: MonthKey,
    pub incomes: f64,
    pub expenses: f64,
    pub balance: f64,
    pub savings_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceKind {
    Overspending,
    LowSavings,
    FiftyThirtyTwenty,
    CardPayoff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub kind: AdviceKind,
    pub title: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebtProgress {
    pub installments_paid: u32,
    pub remaining_installments: u32,
    pub outstanding_principal: f64,
}

pub struct SummaryService;

impl SummaryService {
    pub fn month_summary(month: &LedgerMonth) -> MonthSummary {
        fn installment(value: Option<i64>) -> f64 {
            value.unwrap_or(0) as f64
        }

        MonthSummary {
            incomes: month.incomes.iter().map(|e| e.amount).sum(),
            fixed_expenses: month.fixed_expenses.iter().map(|e| e.amount).sum(),
            card_installments: month
                .revolving_debts
                .iter()
                .map(|e| installment(e.computed_installment))
                .sum(),
            loan_installments: month
                .installment_loans
                .iter()
                .map(|e| installment(e.computed_installment))
                .sum(),
            purchases: month.purchases.iter().map(|e| e.amount).sum(),
            savings: month.savings_goals.iter().map(|e| e.current_amount).sum(),
        }
    }

    /// Fixed expenses and purchases grouped by category, largest first.
    pub fn category_breakdown(month: &LedgerMonth) -> Vec<CategoryTotal> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        let spending = month
            .fixed_expenses
            .iter()
            .map(|e| (e.category.as_str(), e.amount))
            .chain(month.purchases.iter().map(|e| (e.category.as_str(), e.amount)));
        for (category, amount) in spending {
            let label = match category.trim() {
                "" => UNCATEGORIZED,
                trimmed => trimmed,
            };
            *totals.entry(label.to_string()).or_default() += amount;
        }

        let total: f64 = totals.values().sum();
        if total <= 0.0 {
            return Vec::new();
        }

        let mut rows: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, amount)| CategoryTotal {
                category,
                amount,
                share: amount / total,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.category.cmp(&b.category))
        });
        rows
    }

    /// One row per materialized month, latest month key first.
    pub fn history(months: &MonthMap) -> Vec<HistoryRow> {
        months
            .iter()
            .rev()
            .map(|(key, month)| {
                let summary = Self::month_summary(month);
                HistoryRow {
                    month: *key,
                    incomes: summary.incomes,
                    expenses: summary.total_expenses(),
                    balance: summary.free_balance(),
                    savings_rate: summary.savings_rate(),
                }
            })
            .collect()
    }

    pub fn advice(summary: &MonthSummary) -> Vec<Advice> {
        let mut advice = Vec::new();
        if summary.free_balance() < 0.0 {
            advice.push(Advice {
                kind: AdviceKind::Overspending,
                title: "Gastos excesivos",
                detail: "Tus gastos superan tus ingresos. Recorta gastos no esenciales.".into(),
            });
        }
        let rate = summary.savings_rate().unwrap_or(0.0);
        if rate < LOW_SAVINGS_RATE {
            advice.push(Advice {
                kind: AdviceKind::LowSavings,
                title: "Mejora tu ahorro",
                detail: format!(
                    "Estás ahorrando {}%. Apunta al 20%.",
                    crate::percent::format_percent(rate, 1)
                ),
            });
        }
        advice.push(Advice {
            kind: AdviceKind::FiftyThirtyTwenty,
            title: "50/30/20",
            detail: "50% necesidades, 30% gustos, 20% ahorro/inversión.".into(),
        });
        advice.push(Advice {
            kind: AdviceKind::CardPayoff,
            title: "Tarjetas",
            detail: "Paga el total para evitar intereses.".into(),
        });
        advice
    }

    pub fn debt_progress(terms: &DebtTerms) -> DebtProgress {
        DebtProgress {
            installments_paid: terms.installments_paid,
            remaining_installments: terms.remaining_installments(),
            outstanding_principal: outstanding_principal(terms),
        }
    }

    /// Share of the target reached, as a percentage capped at 100.
    pub fn goal_progress(goal: &SavingsGoal) -> f64 {
        if goal.target_amount <= 0.0 {
            return 0.0;
        }
        (goal.current_amount / goal.target_amount * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orfi_domain::{FixedExpenseEntry, IncomeEntry, PurchaseEntry, RevolvingDebt};

    fn month() -> LedgerMonth {
        let mut month = LedgerMonth::new();
        month
            .incomes
            .push(IncomeEntry::new("Salario", 3_500_000.0, "Trabajo", 1));
        month
            .fixed_expenses
            .push(FixedExpenseEntry::new("Arriendo", 1_200_000.0, "Vivienda", 1));
        month
            .fixed_expenses
            .push(FixedExpenseEntry::new("Internet", 100_000.0, "  ", 1));
        month
            .purchases
            .push(PurchaseEntry::new("Supermercado", 400_000.0, "Alimentación", 10));
        month
            .purchases
            .push(PurchaseEntry::new("Regalo", 50_000.0, "", 12));
        let mut card = RevolvingDebt::new("Visa", DebtTerms::new(600_000.0, 6, 0.0));
        card.computed_installment = Some(100_000);
        month.revolving_debts.push(card);
        month
            .savings_goals
            .push(SavingsGoal::new("Emergencias", 5_000_000.0, 1_200_000.0));
        month
    }

    #[test]
    fn summary_totals_match_sections() {
        let summary = SummaryService::month_summary(&month());
        assert_eq!(summary.incomes, 3_500_000.0);
        assert_eq!(summary.fixed_expenses, 1_300_000.0);
        assert_eq!(summary.card_installments, 100_000.0);
        assert_eq!(summary.loan_installments, 0.0);
        assert_eq!(summary.purchases, 450_000.0);
        assert_eq!(summary.savings, 1_200_000.0);
        assert_eq!(summary.total_expenses(), 1_850_000.0);
        assert_eq!(summary.free_balance(), 1_650_000.0);
        let rate = summary.savings_rate().unwrap();
        assert!((rate - 1_650_000.0 / 3_500_000.0).abs() < 1e-12);
    }

    #[test]
    fn savings_rate_needs_incomes() {
        assert_eq!(MonthSummary::default().savings_rate(), None);
    }

    #[test]
    fn blank_categories_group_as_otros() {
        let rows = SummaryService::category_breakdown(&month());
        let labels: Vec<&str> = rows.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(labels, vec!["Vivienda", "Alimentación", "Otros"]);
        assert_eq!(rows[2].amount, 150_000.0);
        let shares: f64 = rows.iter().map(|row| row.share).sum();
        assert!((shares - 1.0).abs() < 1e-9);
    }

    #[test]
    fn breakdown_is_empty_without_spending() {
        assert!(SummaryService::category_breakdown(&LedgerMonth::new()).is_empty());
    }

    #[test]
    fn history_lists_latest_month_first() {
        let mut months = MonthMap::new();
        months.insert(MonthKey::JANUARY, month());
        months.insert(MonthKey::DECEMBER, LedgerMonth::new());
        let rows = SummaryService::history(&months);
        assert_eq!(rows[0].month, MonthKey::DECEMBER);
        assert_eq!(rows[0].savings_rate, None);
        assert_eq!(rows[1].balance, 1_650_000.0);
    }

    #[test]
    fn advice_warns_on_overspending() {
        let summary = MonthSummary {
            incomes: 1_000.0,
            fixed_expenses: 1_200.0,
            ..MonthSummary::default()
        };
        let kinds: Vec<AdviceKind> = SummaryService::advice(&summary)
            .iter()
            .map(|advice| advice.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                AdviceKind::Overspending,
                AdviceKind::LowSavings,
                AdviceKind::FiftyThirtyTwenty,
                AdviceKind::CardPayoff,
            ]
        );

        let healthy = SummaryService::month_summary(&month());
        assert_eq!(SummaryService::advice(&healthy).len(), 2);
    }

    #[test]
    fn progress_helpers() {
        let mut terms = DebtTerms::new(1_000_000.0, 12, 0.0185);
        terms.installments_paid = 5;
        let progress = SummaryService::debt_progress(&terms);
        assert_eq!(progress.remaining_installments, 7);
        assert!((progress.outstanding_principal - 609_876.69).abs() < 0.01);

        let goal = SavingsGoal::new("Viaje", 2_000.0, 500.0);
        assert_eq!(SummaryService::goal_progress(&goal), 25.0);
        let done = SavingsGoal::new("Viaje", 2_000.0, 5_000.0);
        assert_eq!(SummaryService::goal_progress(&done), 100.0);
        assert_eq!(SummaryService::goal_progress(&SavingsGoal::new("x", 0.0, 5.0)), 0.0);
    }
}
