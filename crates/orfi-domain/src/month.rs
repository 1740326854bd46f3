//! Circular twelve-slot calendar keys.

use std::{fmt, str::FromStr};

use chrono::Datelike;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Identifies a calendar month independent of the year, rendered as "01".."12".
///
/// Ordering follows the calendar for display; arithmetic wraps around so the
/// successor of December is January.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(u8);

impl MonthKey {
    pub const JANUARY: MonthKey = MonthKey(1);
    pub const DECEMBER: MonthKey = MonthKey(12);

    /// Builds a key from a month number in `1..=12`.
    pub fn new(number: u8) -> Result<Self, MonthKeyError> {
        if (1..=12).contains(&number) {
            Ok(Self(number))
        } else {
            Err(MonthKeyError::OutOfRange(number.to_string()))
        }
    }

    /// Key for the month containing `date`.
    pub fn from_date(date: impl Datelike) -> Self {
        Self(date.month() as u8)
    }

    /// All twelve keys in calendar order.
    pub fn all() -> impl Iterator<Item = MonthKey> {
        (1..=12).map(MonthKey)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn successor(self) -> Self {
        if self.0 == 12 {
            Self(1)
        } else {
            Self(self.0 + 1)
        }
    }

    pub fn predecessor(self) -> Self {
        if self.0 == 1 {
            Self(12)
        } else {
            Self(self.0 - 1)
        }
    }

    /// Spanish month name used by the original application and the CLI.
    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.0 - 1)]
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    /// Accepts the canonical two-digit form; a bare single digit ("3") is also
    /// tolerated so callers can pass user input straight through.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.len() > 2 || !trimmed.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MonthKeyError::Malformed(value.to_string()));
        }
        let number: u8 = trimmed
            .parse()
            .map_err(|_| MonthKeyError::Malformed(value.to_string()))?;
        Self::new(number).map_err(|_| MonthKeyError::OutOfRange(value.to_string()))
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when parsing [`MonthKey`] values.
pub enum MonthKeyError {
    Malformed(String),
    OutOfRange(String),
}

impl fmt::Display for MonthKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKeyError::Malformed(value) => write!(f, "`{value}` is not a month key"),
            MonthKeyError::OutOfRange(value) => {
                write!(f, "month `{value}` is outside 01-12")
            }
        }
    }
}

impl std::error::Error for MonthKeyError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn arithmetic_wraps_around_the_year() {
        assert_eq!(MonthKey::DECEMBER.successor(), MonthKey::JANUARY);
        assert_eq!(MonthKey::JANUARY.predecessor(), MonthKey::DECEMBER);
        for key in MonthKey::all() {
            assert_eq!(key.predecessor().successor(), key);
            assert_eq!(key.successor().predecessor(), key);
        }
    }

    #[test]
    fn renders_two_digits() {
        let key: MonthKey = "3".parse().unwrap();
        assert_eq!(key.to_string(), "03");
        assert_eq!("11".parse::<MonthKey>().unwrap().to_string(), "11");
    }

    #[test]
    fn rejects_invalid_keys() {
        assert!("00".parse::<MonthKey>().is_err());
        assert!("13".parse::<MonthKey>().is_err());
        assert!("1a".parse::<MonthKey>().is_err());
        assert!("".parse::<MonthKey>().is_err());
        assert!("012".parse::<MonthKey>().is_err());
    }

    #[test]
    fn serializes_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(MonthKey::new(2).unwrap(), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"02":1}"#);
        let back: BTreeMap<MonthKey, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.keys().next().copied(), MonthKey::new(2).ok());
    }
}
