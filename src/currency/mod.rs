//! Locale-aware amount formatting and parsing. Defaults to Colombian pesos
//! written the es-CO way: `$ 1.200.000`.

use once_cell::sync::Lazy;
use orfi_core::CurrencyFormatter;

use crate::errors::AppError;

/// Separators used when rendering and reading amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl LocaleConfig {
    pub fn es_co() -> Self {
        Self {
            language_tag: "es-CO".into(),
            decimal_separator: ',',
            grouping_separator: '.',
        }
    }

    /// Known tags get their separators; anything else falls back to es-CO.
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "en-US" | "en-GB" => Self {
                language_tag: tag.into(),
                decimal_separator: '.',
                grouping_separator: ',',
            },
            "es-ES" | "de-DE" | "pt-BR" => Self {
                language_tag: tag.into(),
                ..Self::es_co()
            },
            _ => Self::es_co(),
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::es_co()
    }
}

pub fn symbol_for(code: &str) -> &str {
    match code {
        "COP" => "$",
        "USD" => "US$",
        "EUR" => "€",
        "GBP" => "£",
        other => other,
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "COP" | "JPY" | "CLP" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

pub fn format_number(locale: &LocaleConfig, value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value);
    let (int_part, fraction) = match body.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (body.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", int_part),
    };
    let mut rendered = format!("{}{}", sign, group_digits(digits, locale.grouping_separator));
    if let Some(fraction) = fraction {
        rendered.push(locale.decimal_separator);
        rendered.push_str(fraction);
    }
    rendered
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Renders amounts in one currency and locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormatter {
    code: String,
    locale: LocaleConfig,
}

impl MoneyFormatter {
    pub fn new(code: impl Into<String>, locale: LocaleConfig) -> Self {
        Self {
            code: code.into().to_uppercase(),
            locale,
        }
    }

    pub fn cop() -> Self {
        Self::new("COP", LocaleConfig::es_co())
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn locale(&self) -> &LocaleConfig {
        &self.locale
    }

    pub fn format(&self, amount: f64) -> String {
        let precision = minor_units_for(&self.code);
        let body = format_number(&self.locale, amount.abs(), precision);
        let sign = if amount < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        format!("{}{} {}", sign, symbol_for(&self.code), body)
    }

    /// Reads an amount typed by the user: `1.200.000`, `$ 1.200.000`,
    /// `1200000` or `12,5` in es-CO.
    pub fn parse(&self, text: &str) -> Result<f64, AppError> {
        parse_amount(&self.locale, text)
    }
}

impl Default for MoneyFormatter {
    fn default() -> Self {
        Self::cop()
    }
}

impl CurrencyFormatter for MoneyFormatter {
    fn format_amount(&self, amount: f64) -> String {
        self.format(amount)
    }
}

/// Shared es-CO peso formatter.
pub static COP: Lazy<MoneyFormatter> = Lazy::new(MoneyFormatter::cop);

pub fn parse_amount(locale: &LocaleConfig, text: &str) -> Result<f64, AppError> {
    let invalid = || AppError::InvalidAmount(text.trim().to_string());
    let cleaned: String = text
        .trim()
        .trim_start_matches(|c: char| c.is_alphabetic() || c == '$')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let group = locale.grouping_separator;
    let decimal = locale.decimal_separator;
    let normalized = if cleaned.contains(decimal) {
        cleaned.replace(group, "").replacen(decimal, ".", 1)
    } else if cleaned.contains(group) {
        let groups: Vec<&str> = cleaned.trim_start_matches('-').split(group).collect();
        let grouped = groups[0].len() <= 3 && groups[1..].iter().all(|part| part.len() == 3);
        if grouped {
            cleaned.replace(group, "")
        } else if groups.len() == 2 {
            // A lone separator with a short tail reads as a decimal point.
            cleaned.replacen(group, ".", 1)
        } else {
            return Err(invalid());
        }
    } else {
        cleaned
    };

    let value: f64 = normalized.parse().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}
