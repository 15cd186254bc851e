//! Record index — the lightweight per-patient listing that fronts the
//! full timeline. One entry per (patient, active history) pair, keyed
//! by a composite id so the detail lookup needs no extra resolution
//! round trip.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::access::AccessScope;
use crate::models::HistoryStatus;
use crate::sources::{IndexRow, PatientDirectory, SourceError};

/// Stable identifier for one record: the patient and the history it
/// belongs to, rendered as `patient_uuid/history_uuid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeId {
    pub patient_id: Uuid,
    pub history_id: Uuid,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid composite record id: {0}")]
pub struct ParseCompositeIdError(pub String);

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.patient_id, self.history_id)
    }
}

impl FromStr for CompositeId {
    type Err = ParseCompositeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (patient, history) = s
            .split_once('/')
            .ok_or_else(|| ParseCompositeIdError(s.to_string()))?;
        let patient_id =
            Uuid::parse_str(patient).map_err(|_| ParseCompositeIdError(s.to_string()))?;
        let history_id =
            Uuid::parse_str(history).map_err(|_| ParseCompositeIdError(s.to_string()))?;
        Ok(CompositeId { patient_id, history_id })
    }
}

/// One line of the record index. Carries only what the listing needs;
/// the heavy clinical payload stays behind the composite id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordIndexEntry {
    pub composite_id: CompositeId,
    pub patient_display_name: String,
    pub last_update: NaiveDate,
    pub status: HistoryStatus,
}

impl From<IndexRow> for RecordIndexEntry {
    fn from(row: IndexRow) -> Self {
        RecordIndexEntry {
            composite_id: CompositeId { patient_id: row.patient_id, history_id: row.history_id },
            patient_display_name: row.patient_display_name,
            last_update: row.last_update,
            status: row.status,
        }
    }
}

/// Build the record index visible under `scope`.
///
/// A bounded scope is walked id by id in its own (sorted) order;
/// patients without a history are silently absent and a per-id source
/// error drops that entry with a warning rather than failing the whole
/// listing. An unbounded scope reads straight from the directory,
/// capped at `page_cap` entries.
pub async fn list_record_index(
    directory: &Arc<dyn PatientDirectory>,
    scope: &AccessScope,
    page_cap: usize,
) -> Result<Vec<RecordIndexEntry>, SourceError> {
    match scope {
        AccessScope::Unbounded => {
            let rows = directory.index_rows(page_cap).await?;
            Ok(rows.into_iter().map(RecordIndexEntry::from).collect())
        }
        AccessScope::Bounded(patient_ids) => {
            let mut entries = Vec::with_capacity(patient_ids.len());
            for &patient_id in patient_ids {
                match directory.index_row(patient_id).await {
                    Ok(Some(row)) => entries.push(RecordIndexEntry::from(row)),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(patient = %patient_id, error = %e, "skipping index entry");
                    }
                }
            }
            Ok(entries)
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
