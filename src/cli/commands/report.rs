use orfi_core::{
    amortization::schedule, format_percent, summary_service::MonthSummary, CoreError,
    SummaryService,
};
use orfi_domain::{DebtTerms, Identifiable, LedgerEntry, Section};

use crate::cli::commands::{parse_entry_id, parse_section};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{print_table, section as output_section};
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "show",
            "List the entries of the current month",
            "show [incomes|fixed|purchases|cards|loans|goals]",
            cmd_show,
        ),
        CommandEntry::new("summary", "Totals for the current month", "summary", cmd_summary),
        CommandEntry::new(
            "categories",
            "Spending by category",
            "categories",
            cmd_categories,
        ),
        CommandEntry::new("history", "Balance of every month", "history", cmd_history),
        CommandEntry::new("advice", "Budgeting tips for this month", "advice", cmd_advice),
        CommandEntry::new(
            "schedule",
            "Amortization table of a card or loan",
            "schedule <id>",
            cmd_schedule,
        ),
    ]
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let sections = match args.first() {
        Some(raw) => vec![parse_section(raw)?],
        None => Section::ALL.to_vec(),
    };
    let key = context.current_month;
    let month = context.view_month();
    let lock = if context.store.is_closed(key) {
        " (closed)"
    } else {
        ""
    };
    output_section(format!("{} {}{}", key, key.name(), lock));

    for section in sections {
        let entries = month.section_entries(section);
        io::print_info(format!("{} ({})", section, entries.len()));
        if entries.is_empty() {
            continue;
        }
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|entry| entry_row(context, entry))
            .collect();
        print_table(
            &["#", "Name", "Amount", "Detail", "Day", "Status"],
            &rows,
            &[true, false, true, false, true, false],
        );
    }
    Ok(())
}

fn paid_label(paid: bool) -> String {
    if paid { "paid" } else { "pending" }.to_string()
}

fn debt_detail(terms: &DebtTerms) -> String {
    format!(
        "{}/{} @ {}%",
        terms.installments_paid,
        terms.term_months,
        format_percent(terms.monthly_rate, 2)
    )
}

fn installment_label(context: &ShellContext, installment: Option<i64>) -> String {
    installment
        .map(|units| context.money(units as f64))
        .unwrap_or_else(|| "-".into())
}

fn entry_row(context: &ShellContext, entry: &LedgerEntry) -> Vec<String> {
    match entry {
        LedgerEntry::Income(e) => vec![
            e.id.to_string(),
            e.name.clone(),
            context.money(e.amount),
            e.category.clone(),
            e.day_of_month.to_string(),
            String::new(),
        ],
        LedgerEntry::FixedExpense(e) => vec![
            e.id.to_string(),
            e.name.clone(),
            context.money(e.amount),
            e.category.clone(),
            e.day_of_month.to_string(),
            paid_label(e.paid),
        ],
        LedgerEntry::Purchase(e) => vec![
            e.id.to_string(),
            e.name.clone(),
            context.money(e.amount),
            e.category.clone(),
            e.day_of_month.to_string(),
            paid_label(e.paid),
        ],
        LedgerEntry::RevolvingDebt(e) => vec![
            e.id.to_string(),
            e.name.clone(),
            installment_label(context, e.computed_installment),
            debt_detail(&e.terms),
            e.day_of_month.to_string(),
            paid_label(e.paid),
        ],
        LedgerEntry::InstallmentLoan(e) => vec![
            e.id.to_string(),
            e.name.clone(),
            installment_label(context, e.computed_installment),
            debt_detail(&e.terms),
            e.day_of_month.to_string(),
            paid_label(e.paid),
        ],
        LedgerEntry::SavingsGoal(e) => vec![
            e.id.to_string(),
            e.name.clone(),
            context.money(e.current_amount),
            format!("of {}", context.money(e.target_amount)),
            e.day_of_month.to_string(),
            format!("{:.0}%", SummaryService::goal_progress(e)),
        ],
    }
}

fn rate_label(rate: Option<f64>) -> String {
    rate.map(|rate| format!("{}%", format_percent(rate, 1)))
        .unwrap_or_else(|| "-".into())
}

fn print_summary(context: &ShellContext, summary: &MonthSummary) {
    let rows = vec![
        vec!["Incomes".to_string(), context.money(summary.incomes)],
        vec!["Fixed expenses".to_string(), context.money(summary.fixed_expenses)],
        vec!["Card installments".to_string(), context.money(summary.card_installments)],
        vec!["Loan installments".to_string(), context.money(summary.loan_installments)],
        vec!["Purchases".to_string(), context.money(summary.purchases)],
        vec!["Total expenses".to_string(), context.money(summary.total_expenses())],
        vec!["Free balance".to_string(), context.money(summary.free_balance())],
        vec!["Savings rate".to_string(), rate_label(summary.savings_rate())],
        vec!["Saved in goals".to_string(), context.money(summary.savings)],
    ];
    print_table(&["", "Amount"], &rows, &[false, true]);
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let key = context.current_month;
    let summary = SummaryService::month_summary(&context.view_month());
    output_section(format!("Summary {} {}", key, key.name()));
    print_summary(context, &summary);
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let breakdown = SummaryService::category_breakdown(&context.view_month());
    output_section("Spending by category");
    if breakdown.is_empty() {
        io::print_info("No spending recorded this month.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = breakdown
        .iter()
        .map(|row| {
            vec![
                row.category.clone(),
                context.money(row.amount),
                format!("{}%", format_percent(row.share, 1)),
            ]
        })
        .collect();
    print_table(&["Category", "Amount", "Share"], &rows, &[false, true, true]);
    Ok(())
}

fn cmd_history(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let history = SummaryService::history(context.store.months());
    output_section("History");
    if history.is_empty() {
        io::print_info("No months recorded yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = history
        .iter()
        .map(|row| {
            vec![
                format!("{} {}", row.month, row.month.name()),
                context.money(row.incomes),
                context.money(row.expenses),
                context.money(row.balance),
                rate_label(row.savings_rate),
            ]
        })
        .collect();
    print_table(
        &["Month", "Incomes", "Expenses", "Balance", "Savings"],
        &rows,
        &[false, true, true, true, true],
    );
    Ok(())
}

fn cmd_advice(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = SummaryService::month_summary(&context.view_month());
    output_section("Advice");
    for tip in SummaryService::advice(&summary) {
        io::print_info(format!("- {}: {}", tip.title, tip.detail));
    }
    Ok(())
}

fn debt_terms_of(entry: LedgerEntry) -> Result<DebtTerms, CommandError> {
    match entry {
        LedgerEntry::RevolvingDebt(card) => Ok(card.terms),
        LedgerEntry::InstallmentLoan(loan) => Ok(loan.terms),
        other => Err(CommandError::InvalidArguments(format!(
            "#{} is in {}, not a card or loan",
            other.id(),
            other.section()
        ))),
    }
}

fn cmd_schedule(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = parse_entry_id(&context.arg_or_prompt(args, 0, "Entry id", "schedule <id>")?)?;
    let month = context.view_month();
    let entry = month.entry(id).ok_or(CoreError::EntryNotFound(id))?;
    let terms = debt_terms_of(entry)?;
    let progress = SummaryService::debt_progress(&terms);

    output_section(format!("Schedule #{}", id));
    io::print_info(format!(
        "Paid {} of {} installments, {} outstanding.",
        progress.installments_paid,
        terms.term_months,
        context.money(progress.outstanding_principal)
    ));
    let periods = schedule(terms.total_principal, terms.monthly_rate, terms.term_months);
    let rows: Vec<Vec<String>> = periods
        .iter()
        .map(|period| {
            let marker = if period.number <= terms.installments_paid {
                "paid"
            } else {
                ""
            };
            vec![
                period.number.to_string(),
                context.money(period.payment),
                context.money(period.interest),
                context.money(period.principal),
                context.money(period.balance),
                marker.to_string(),
            ]
        })
        .collect();
    print_table(
        &["#", "Payment", "Interest", "Principal", "Balance", ""],
        &rows,
        &[true, true, true, true, true, false],
    );
    Ok(())
}
