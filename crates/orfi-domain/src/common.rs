//! Shared traits, identifiers, and serde helpers for ledger entries.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Day assigned to every carried-forward entry.
pub const FIRST_DAY: u8 = 1;

/// Process-unique identifier for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exposes a stable identifier for entities stored in the ledger.
pub trait Identifiable {
    fn id(&self) -> EntryId;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Entries scheduled on a day of the month.
pub trait Scheduled {
    fn day_of_month(&self) -> u8;
}

/// Entries that can be settled for the month.
pub trait Payable {
    fn is_paid(&self) -> bool;
}

/// Accepts a day of month written either as a number (`1`) or as the
/// zero-padded text the original web client stored (`"01"`).
pub fn deserialize_day<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDay {
        Number(u8),
        Text(String),
    }

    match RawDay::deserialize(deserializer)? {
        RawDay::Number(day) => Ok(day),
        RawDay::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(FIRST_DAY);
            }
            trimmed
                .parse::<u8>()
                .map_err(|_| de::Error::custom(format!("invalid day of month `{text}`")))
        }
    }
}

pub fn default_day() -> u8 {
    FIRST_DAY
}
