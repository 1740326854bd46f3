use orfi::core::{CurrencyFormatter, InstallmentInputs};
use orfi::currency::{parse_amount, LocaleConfig, MoneyFormatter, COP};

#[test]
fn formatter_works_behind_the_core_trait() {
    let formatter: &dyn CurrencyFormatter = &*COP;
    let installment = InstallmentInputs::new(1_000_000.0, 0.02, 12).installment();
    assert_eq!(formatter.format_units(installment), COP.format(installment as f64));
    assert!(formatter.format_units(installment).starts_with("$ 94."));
}

#[test]
fn parse_then_format_keeps_the_amount() {
    let locale = LocaleConfig::for_tag("es-CO");
    for typed in ["1.200.000", "$ 1.200.000", "1200000"] {
        let value = parse_amount(&locale, typed).unwrap();
        assert_eq!(COP.format(value), "$ 1.200.000", "{typed}");
    }
}

#[test]
fn unknown_codes_print_their_code() {
    let formatter = MoneyFormatter::new("MXN", LocaleConfig::default());
    assert_eq!(formatter.format(2_500.0), "MXN 2.500,00");
}
