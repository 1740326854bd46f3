/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: f64) -> String;

    /// Installments are whole currency units.
    fn format_units(&self, units: i64) -> String {
        self.format_amount(units as f64)
    }
}
