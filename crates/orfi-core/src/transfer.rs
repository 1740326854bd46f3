//! Whole-store export and import as JSON documents.

use chrono::{DateTime, Utc};
use orfi_domain::{EntryId, ExportDocument, ImportDocument, MonthKey, MonthMap};
use tracing::info;

use crate::{entry_service::validate_months, store::LedgerStore, time::Clock, CoreError};

/// What an import changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub months: usize,
    /// Current-month pointer carried by the document, for the caller to adopt.
    pub current_month: Option<MonthKey>,
}

pub struct TransferService;

impl TransferService {
    pub fn export_document(
        store: &LedgerStore,
        current_month: MonthKey,
        exported_at: DateTime<Utc>,
    ) -> ExportDocument {
        ExportDocument {
            exported_at,
            current_month,
            data: store.months().clone(),
        }
    }

    /// Pretty-printed export document.
    pub fn export_json(
        store: &LedgerStore,
        current_month: MonthKey,
        clock: &dyn Clock,
    ) -> Result<String, CoreError> {
        let document = Self::export_document(store, current_month, clock.now());
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parses and validates an import document without touching any store.
    pub fn parse_import(text: &str) -> Result<(MonthMap, Option<MonthKey>), CoreError> {
        let document: ImportDocument = serde_json::from_str(text)
            .map_err(|err| CoreError::Import(format!("invalid document: {err}")))?;
        let data = document
            .data
            .ok_or_else(|| CoreError::Import("document has no `data` field".into()))?;
        validate_months(&data).map_err(|err| match err {
            CoreError::Validation(message) => CoreError::Import(message),
            other => other,
        })?;
        for (key, month) in &data {
            if let Some(id) = month.max_id().filter(|id| *id > EntryId::MAX) {
                return Err(CoreError::Import(format!(
                    "month {key}: entry id {id} is out of range"
                )));
            }
        }
        Ok((data, document.current_month))
    }

    /// Replaces every month in `store` with the document's data. A rejected
    /// document leaves the store untouched.
    pub fn import_json(store: &mut LedgerStore, text: &str) -> Result<ImportOutcome, CoreError> {
        let (months, current_month) = Self::parse_import(text)?;
        let outcome = ImportOutcome {
            months: months.len(),
            current_month,
        };
        store.replace_all(months);
        info!(
            months = outcome.months,
            current = ?outcome.current_month.map(|key| key.to_string()),
            "import applied"
        );
        Ok(outcome)
    }
}
