//! Comma-decimal percentage text, e.g. "1,85" for 1.85%.

use crate::CoreError;

const MAX_FRACTION_DIGITS: usize = 3;

/// Parses percentage text into a fraction: `"1,85"` becomes `0.0185`.
///
/// Accepts digits with an optional comma and 1-3 fractional digits. A single
/// `.` is read as the comma, matching what users type on numeric keypads.
pub fn parse_percent(text: &str) -> Result<f64, CoreError> {
    let normalized = text.trim().replacen('.', ",", 1);
    let (whole, fraction) = match normalized.split_once(',') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (normalized.as_str(), None),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed(text));
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty()
            || fraction.len() > MAX_FRACTION_DIGITS
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(malformed(text));
        }
    }

    let whole_value: f64 = whole.parse().map_err(|_| malformed(text))?;
    let fraction_value = match fraction {
        Some(digits) => {
            let value: f64 = digits.parse().map_err(|_| malformed(text))?;
            value / 10f64.powi(digits.len() as i32)
        }
        None => 0.0,
    };
    Ok((whole_value + fraction_value) / 100.0)
}

/// Renders a fraction as comma-decimal percentage text without the `%` sign.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, fraction * 100.0).replace('.', ",")
}

fn malformed(text: &str) -> CoreError {
    CoreError::validation(format!(
        "`{}` is not a percentage (use digits with up to {} decimals after a comma, e.g. 1,85)",
        text.trim(),
        MAX_FRACTION_DIGITS
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn parses_comma_decimals() {
        assert!(close(parse_percent("1,85").unwrap(), 0.0185));
        assert!(close(parse_percent("12").unwrap(), 0.12));
        assert!(close(parse_percent("0,125").unwrap(), 0.00125));
        assert!(close(parse_percent(" 19,00 ").unwrap(), 0.19));
        assert!(close(parse_percent("1.5").unwrap(), 0.015));
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["", ",5", "1,", "1,2345", "abc", "-1", "1,2,3", "1.2.3", "1e3", "1 5"] {
            assert!(
                matches!(parse_percent(bad), Err(CoreError::Validation(_))),
                "`{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn formats_with_comma() {
        assert_eq!(format_percent(0.0185, 2), "1,85");
        assert_eq!(format_percent(0.12, 2), "12,00");
        assert_eq!(format_percent(0.0, 1), "0,0");
    }
}
