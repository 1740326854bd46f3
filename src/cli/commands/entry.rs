use orfi_core::{parse_percent, CoreError, EntryService};
use orfi_domain::{
    DebtTerms, FixedExpenseEntry, IncomeEntry, InstallmentLoan, LedgerEntry, NamedEntity,
    PurchaseEntry, RevolvingDebt, SavingsGoal, FIRST_DAY,
};

use crate::cli::commands::{parse_count, parse_day, parse_entry_id, parse_section};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;

const ADD_INCOME_USAGE: &str = "add-income <name> <amount> [category] [day]";
const ADD_FIXED_USAGE: &str = "add-fixed <name> <amount> [category] [day]";
const ADD_PURCHASE_USAGE: &str = "add-purchase <name> <amount> [category] [day]";
const ADD_CARD_USAGE: &str = "add-card <name> <balance> <months> <rate%> [paid-installments]";
const ADD_LOAN_USAGE: &str =
    "add-loan <name> <principal> <months> <rate%> [insurance%] [insurance-tax%] [paid-installments]";
const ADD_GOAL_USAGE: &str = "add-goal <name> <target> [saved]";
const EDIT_USAGE: &str = "edit <id> <field> <value>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("add-income", "Record an income", ADD_INCOME_USAGE, cmd_add_income),
        CommandEntry::new("add-fixed", "Record a fixed expense", ADD_FIXED_USAGE, cmd_add_fixed),
        CommandEntry::new(
            "add-purchase",
            "Record a one-off purchase",
            ADD_PURCHASE_USAGE,
            cmd_add_purchase,
        ),
        CommandEntry::new("add-card", "Record a credit card debt", ADD_CARD_USAGE, cmd_add_card),
        CommandEntry::new("add-loan", "Record an installment loan", ADD_LOAN_USAGE, cmd_add_loan),
        CommandEntry::new("add-goal", "Create a savings goal", ADD_GOAL_USAGE, cmd_add_goal),
        CommandEntry::new(
            "edit",
            "Change one field of an entry (name, amount, category, day, principal, term, rate, paid-installments, insurance, tax, target, saved)",
            EDIT_USAGE,
            cmd_edit,
        ),
        CommandEntry::new("remove", "Delete an entry", "remove <id>", cmd_remove),
        CommandEntry::new("paid", "Toggle an entry's paid flag", "paid <id>", cmd_paid),
        CommandEntry::new(
            "mark-all",
            "Mark every entry of a section paid",
            "mark-all <fixed|purchases|cards|loans>",
            cmd_mark_all,
        ),
        CommandEntry::new(
            "save-to-goal",
            "Add money to a savings goal",
            "save-to-goal <id> <amount>",
            cmd_save_to_goal,
        ),
    ]
}

/// Name, amount, category and day shared by the simple entry kinds.
struct FlowArgs {
    name: String,
    amount: f64,
    category: String,
    day: u8,
}

fn flow_args(context: &ShellContext, args: &[&str], usage: &str) -> Result<FlowArgs, CommandError> {
    let name = context.arg_or_prompt(args, 0, "Name", usage)?;
    let amount = context.parse_amount(&context.arg_or_prompt(args, 1, "Amount", usage)?)?;
    let category = args.get(2).map(|value| value.to_string()).unwrap_or_default();
    let day = match args.get(3) {
        Some(raw) => parse_day(raw)?,
        None => FIRST_DAY,
    };
    Ok(FlowArgs {
        name,
        amount,
        category,
        day,
    })
}

fn debt_terms(
    context: &ShellContext,
    args: &[&str],
    usage: &str,
    paid_index: usize,
) -> Result<DebtTerms, CommandError> {
    let principal = context.parse_amount(&context.arg_or_prompt(args, 1, "Principal", usage)?)?;
    let term = parse_count(&context.arg_or_prompt(args, 2, "Months", usage)?, "months")?;
    let rate = parse_percent(&context.arg_or_prompt(args, 3, "Monthly rate %", usage)?)?;
    let mut terms = DebtTerms::new(principal, term, rate);
    if let Some(raw) = args.get(paid_index) {
        terms.installments_paid = parse_count(raw, "paid installments")?;
    }
    Ok(terms)
}

fn add(context: &mut ShellContext, entry: LedgerEntry) -> CommandResult {
    let month = context.current_month;
    let name = entry.name().to_string();
    let section = entry.section();
    let id = EntryService::add(&mut context.store, month, entry)?;
    io::print_success(format!("Added #{} {} to {} ({}).", id, name, section, month));
    Ok(())
}

fn cmd_add_income(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let flow = flow_args(context, args, ADD_INCOME_USAGE)?;
    let entry = IncomeEntry::new(flow.name, flow.amount, flow.category, flow.day);
    add(context, LedgerEntry::Income(entry))
}

fn cmd_add_fixed(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let flow = flow_args(context, args, ADD_FIXED_USAGE)?;
    let entry = FixedExpenseEntry::new(flow.name, flow.amount, flow.category, flow.day);
    add(context, LedgerEntry::FixedExpense(entry))
}

fn cmd_add_purchase(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let flow = flow_args(context, args, ADD_PURCHASE_USAGE)?;
    let entry = PurchaseEntry::new(flow.name, flow.amount, flow.category, flow.day);
    add(context, LedgerEntry::Purchase(entry))
}

fn cmd_add_card(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = context.arg_or_prompt(args, 0, "Card name", ADD_CARD_USAGE)?;
    let terms = debt_terms(context, args, ADD_CARD_USAGE, 4)?;
    add(context, LedgerEntry::RevolvingDebt(RevolvingDebt::new(name, terms)))
}

fn cmd_add_loan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = context.arg_or_prompt(args, 0, "Loan name", ADD_LOAN_USAGE)?;
    let terms = debt_terms(context, args, ADD_LOAN_USAGE, 6)?;
    let insurance = match args.get(4) {
        Some(raw) => parse_percent(raw)?,
        None => 0.0,
    };
    let insurance_tax = match args.get(5) {
        Some(raw) => parse_percent(raw)?,
        None => 0.0,
    };
    let loan = InstallmentLoan::new(name, terms, insurance, insurance_tax);
    add(context, LedgerEntry::InstallmentLoan(loan))
}

fn cmd_add_goal(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = context.arg_or_prompt(args, 0, "Goal name", ADD_GOAL_USAGE)?;
    let target = context.parse_amount(&context.arg_or_prompt(args, 1, "Target", ADD_GOAL_USAGE)?)?;
    let saved = match args.get(2) {
        Some(raw) => context.parse_amount(raw)?,
        None => 0.0,
    };
    add(context, LedgerEntry::SavingsGoal(SavingsGoal::new(name, target, saved)))
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = parse_entry_id(&context.arg_or_prompt(args, 0, "Entry id", EDIT_USAGE)?)?;
    let field = context.arg_or_prompt(args, 1, "Field", EDIT_USAGE)?;
    let value = if args.len() > 2 {
        args[2..].join(" ")
    } else {
        context.arg_or_prompt(args, 2, "New value", EDIT_USAGE)?
    };

    let month = context.current_month;
    let mut entry = context
        .view_month()
        .entry(id)
        .ok_or(CoreError::EntryNotFound(id))?;
    apply_field(context, &mut entry, &field.to_lowercase(), value.trim())?;
    EntryService::edit(&mut context.store, month, id, entry)?;
    io::print_success(format!("Updated #{} {}.", id, field));
    Ok(())
}

fn not_applicable(field: &str, entry: &LedgerEntry) -> CommandError {
    CommandError::InvalidArguments(format!(
        "`{}` does not apply to {}",
        field,
        entry.section()
    ))
}

fn apply_field(
    context: &ShellContext,
    entry: &mut LedgerEntry,
    field: &str,
    value: &str,
) -> CommandResult {
    match field {
        "name" => {
            let name = value.to_string();
            match entry {
                LedgerEntry::Income(e) => e.name = name,
                LedgerEntry::FixedExpense(e) => e.name = name,
                LedgerEntry::Purchase(e) => e.name = name,
                LedgerEntry::RevolvingDebt(e) => e.name = name,
                LedgerEntry::InstallmentLoan(e) => e.name = name,
                LedgerEntry::SavingsGoal(e) => e.name = name,
            }
        }
        "day" => {
            let day = parse_day(value)?;
            match entry {
                LedgerEntry::Income(e) => e.day_of_month = day,
                LedgerEntry::FixedExpense(e) => e.day_of_month = day,
                LedgerEntry::Purchase(e) => e.day_of_month = day,
                LedgerEntry::RevolvingDebt(e) => e.day_of_month = day,
                LedgerEntry::InstallmentLoan(e) => e.day_of_month = day,
                LedgerEntry::SavingsGoal(e) => e.day_of_month = day,
            }
        }
        "amount" | "category" => {
            let (amount, category) = match entry {
                LedgerEntry::Income(e) => (&mut e.amount, &mut e.category),
                LedgerEntry::FixedExpense(e) => (&mut e.amount, &mut e.category),
                LedgerEntry::Purchase(e) => (&mut e.amount, &mut e.category),
                other => return Err(not_applicable(field, other)),
            };
            if field == "amount" {
                *amount = context.parse_amount(value)?;
            } else {
                *category = value.to_string();
            }
        }
        "principal" | "term" | "rate" | "paid-installments" => {
            let terms = match entry {
                LedgerEntry::RevolvingDebt(e) => &mut e.terms,
                LedgerEntry::InstallmentLoan(e) => &mut e.terms,
                other => return Err(not_applicable(field, other)),
            };
            match field {
                "principal" => terms.total_principal = context.parse_amount(value)?,
                "term" => terms.term_months = parse_count(value, "term")?,
                "rate" => terms.monthly_rate = parse_percent(value)?,
                _ => terms.installments_paid = parse_count(value, "paid installments")?,
            }
        }
        "insurance" | "tax" => {
            let loan = match entry {
                LedgerEntry::InstallmentLoan(loan) => loan,
                other => return Err(not_applicable(field, other)),
            };
            let pct = parse_percent(value)?;
            if field == "insurance" {
                loan.insurance_pct = pct;
            } else {
                loan.insurance_tax_pct = pct;
            }
        }
        "target" | "saved" => {
            let goal = match entry {
                LedgerEntry::SavingsGoal(goal) => goal,
                other => return Err(not_applicable(field, other)),
            };
            let amount = context.parse_amount(value)?;
            if field == "target" {
                goal.target_amount = amount;
            } else {
                goal.current_amount = amount;
            }
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown field `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = parse_entry_id(&context.arg_or_prompt(args, 0, "Entry id", "remove <id>")?)?;
    let removed = EntryService::remove(&mut context.store, context.current_month, id)?;
    io::print_success(format!("Removed #{} {}.", id, removed.name()));
    Ok(())
}

fn cmd_paid(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = parse_entry_id(&context.arg_or_prompt(args, 0, "Entry id", "paid <id>")?)?;
    let paid = EntryService::toggle_paid(&mut context.store, context.current_month, id)?;
    let state = if paid { "paid" } else { "pending" };
    io::print_success(format!("#{} marked {}.", id, state));
    Ok(())
}

fn cmd_mark_all(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "mark-all <fixed|purchases|cards|loans>";
    let section = parse_section(&context.arg_or_prompt(args, 0, "Section", usage)?)?;
    let changed = EntryService::mark_all_paid(&mut context.store, context.current_month, section)?;
    io::print_success(format!("{} entries in {} marked paid.", changed, section));
    Ok(())
}

fn cmd_save_to_goal(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "save-to-goal <id> <amount>";
    let id = parse_entry_id(&context.arg_or_prompt(args, 0, "Goal id", usage)?)?;
    let amount = context.parse_amount(&context.arg_or_prompt(args, 1, "Amount", usage)?)?;
    let balance =
        EntryService::add_to_savings(&mut context.store, context.current_month, id, amount)?;
    io::print_success(format!("Goal #{} now holds {}.", id, context.money(balance)));
    Ok(())
}
