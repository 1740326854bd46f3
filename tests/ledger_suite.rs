mod common;

use common::{data_root, open_store};
use orfi::core::{CoreError, EntryService, TemplateService};
use orfi::domain::{
    DebtTerms, FixedExpenseEntry, IncomeEntry, LedgerEntry, MonthKey, RevolvingDebt, SavingsGoal,
};

fn key(number: u8) -> MonthKey {
    MonthKey::new(number).unwrap()
}

#[test]
fn months_locks_and_template_survive_reopen() {
    let root = data_root();
    {
        let mut store = open_store(&root);
        EntryService::add(
            &mut store,
            key(5),
            LedgerEntry::FixedExpense(FixedExpenseEntry::new(
                "Arriendo",
                1_200_000.0,
                "Vivienda",
                5,
            )),
        )
        .unwrap();
        TemplateService::save_template(&mut store, key(5));
        store.set_closed(key(5), true);
    }

    let mut store = open_store(&root);
    assert!(store.is_closed(key(5)));
    assert_eq!(store.template().map(<[_]>::len), Some(1));
    assert_eq!(store.month(key(5)).fixed_expenses[0].name, "Arriendo");

    let err = EntryService::add(
        &mut store,
        key(5),
        LedgerEntry::Income(IncomeEntry::new("Bono", 100_000.0, "", 1)),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::MonthClosed(_)));
}

#[test]
fn ids_stay_unique_across_sessions() {
    let root = data_root();
    let first = {
        let mut store = open_store(&root);
        EntryService::add(
            &mut store,
            key(1),
            LedgerEntry::Income(IncomeEntry::new("Salario", 3_000_000.0, "Trabajo", 1)),
        )
        .unwrap()
    };

    let mut store = open_store(&root);
    let second = EntryService::add(
        &mut store,
        key(1),
        LedgerEntry::Income(IncomeEntry::new("Extra", 200_000.0, "Trabajo", 15)),
    )
    .unwrap();
    assert!(second > first);

    let february = store.month(key(2)).clone();
    let mut ids: Vec<_> = february.incomes.iter().map(|income| income.id).collect();
    ids.extend(store.month(key(1)).incomes.iter().map(|income| income.id));
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), before);
}

#[test]
fn rollover_resets_flags_and_keeps_balances() {
    let root = data_root();
    let mut store = open_store(&root);
    let card = EntryService::add(
        &mut store,
        key(11),
        LedgerEntry::RevolvingDebt(RevolvingDebt::new(
            "Visa",
            DebtTerms::new(1_000_000.0, 12, 0.02),
        )),
    )
    .unwrap();
    let goal = EntryService::add(
        &mut store,
        key(11),
        LedgerEntry::SavingsGoal(SavingsGoal::new("Viaje", 4_000_000.0, 500_000.0)),
    )
    .unwrap();
    EntryService::toggle_paid(&mut store, key(11), card).unwrap();
    EntryService::add_to_savings(&mut store, key(11), goal, 250_000.0).unwrap();

    let december = store.month(key(12)).clone();
    let carried = &december.revolving_debts[0];
    assert!(!carried.paid);
    assert_eq!(carried.day_of_month, 1);
    assert_eq!(carried.terms.installments_paid, 1);
    assert_eq!(december.savings_goals[0].current_amount, 750_000.0);

    let january = store.month(key(1)).clone();
    assert_eq!(january.revolving_debts.len(), 1);
    assert_eq!(january.savings_goals.len(), 1);
}

#[test]
fn month_without_predecessor_starts_empty() {
    let root = data_root();
    let mut store = open_store(&root);
    EntryService::add(
        &mut store,
        key(3),
        LedgerEntry::Income(IncomeEntry::new("Salario", 3_000_000.0, "Trabajo", 1)),
    )
    .unwrap();

    assert!(store.month(key(7)).is_empty());
    assert_eq!(store.month(key(4)).incomes.len(), 1);
}
