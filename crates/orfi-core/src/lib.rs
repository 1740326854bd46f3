//! orfi-core
//!
//! Ledger engine for orfi: rollover, amortization, recalculation, month locks
//! and the services built on top of them.
//! Depends on orfi-domain. No CLI, no terminal I/O; persistence goes through
//! the [`LedgerStorage`] trait.

pub mod amortization;
pub mod entry_service;
pub mod error;
pub mod format;
pub mod ids;
pub mod lock;
pub mod percent;
pub mod recalc;
pub mod rollover;
pub mod storage;
pub mod store;
pub mod summary_service;
pub mod template_service;
pub mod time;
pub mod transfer;

pub use amortization::{cuota, InstallmentInputs};
pub use entry_service::EntryService;
pub use error::CoreError;
pub use format::CurrencyFormatter;
pub use ids::IdGenerator;
pub use lock::{LockPolicy, MonthLockRegistry};
pub use percent::{format_percent, parse_percent};
pub use recalc::{DebtRecalculator, RecalcPolicy};
pub use rollover::{CarryForward, DuplicateOutcome, MaterializeOutcome, RolloverEngine};
pub use storage::{LedgerBackupInfo, LedgerStorage, MemoryStorage};
pub use store::{LedgerStore, StoreOptions};
pub use summary_service::SummaryService;
pub use template_service::TemplateService;
pub use time::{Clock, SystemClock};
pub use transfer::{ImportOutcome, TransferService};
