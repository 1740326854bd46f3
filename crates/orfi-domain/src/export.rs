//! Whole-store export document exchanged at the import/export boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ledger::MonthMap, month::MonthKey};

/// Document written by export and consumed by import.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub current_month: MonthKey,
    pub data: MonthMap,
}

/// Lenient view of an import document; every field may be missing so the
/// importer can report what is wrong instead of failing inside serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportDocument {
    #[serde(default, alias = "exportado")]
    pub exported_at: Option<String>,
    #[serde(default, alias = "mes")]
    pub current_month: Option<MonthKey>,
    #[serde(default, alias = "datos")]
    pub data: Option<MonthMap>,
}
