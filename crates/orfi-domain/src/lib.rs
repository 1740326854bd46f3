//! orfi-domain
//!
//! Pure domain models (MonthKey, ledger entries, LedgerMonth, export document).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod common;
pub mod entry;
pub mod export;
pub mod ledger;
pub mod month;

pub use common::*;
pub use entry::*;
pub use export::*;
pub use ledger::*;
pub use month::*;
