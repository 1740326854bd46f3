#![doc(test(attr(deny(warnings))))]

//! orfi is a month-by-month personal finance ledger: incomes, fixed
//! expenses, purchases, credit cards, installment loans and savings goals,
//! with lazy rollover between months.
//!
//! The engine lives in the `orfi-*` workspace crates; this package adds the
//! tracing setup, COP currency formatting, build metadata and the shell.

pub mod cli;
pub mod currency;
pub mod errors;
pub mod utils;

pub use orfi_config as config;
pub use orfi_core as core;
pub use orfi_domain as domain;
pub use orfi_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("orfi tracing initialized.");
    });
}
