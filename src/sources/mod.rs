//! The adapter seam between the engine and the clinical stores.
//!
//! `PatientDirectory` serves the mandatory lookups (identity, history,
//! profile) plus the summary index rows; `CategorySource` is implemented
//! once per clinical-event category and feeds the timeline fan-out.
//! `SqliteStore` is the reference implementation over a read-only
//! operational schema.

pub mod sqlite;
pub mod store;

pub use sqlite::{open_database, open_memory_database, run_migrations};
pub use store::SqliteStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CategoryRows, EventCategory, HistoryStatus, MedicalHistoryRecord, MedicalProfile,
    PatientIdentity, SourceFilter,
};

#[derive(Error, Debug)]
pub enum SourceError {
    /// The store could not be reached at all.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the query or row mapping failed.
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        SourceError::Query(err.to_string())
    }
}

impl From<crate::models::ModelError> for SourceError {
    fn from(err: crate::models::ModelError) -> Self {
        SourceError::Query(err.to_string())
    }
}

/// One pre-computed summary row for the record index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub patient_id: Uuid,
    pub history_id: Uuid,
    pub patient_display_name: String,
    /// Latest service-event date, falling back to the history creation
    /// date when the patient has no encounters yet.
    pub last_update: NaiveDate,
    pub status: HistoryStatus,
}

/// Mandatory-path lookups: identity, history header, clinical profile,
/// and the summary rows backing the record index.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn identity(&self, patient_id: Uuid) -> Result<Option<PatientIdentity>, SourceError>;

    async fn history(&self, history_id: Uuid) -> Result<Option<MedicalHistoryRecord>, SourceError>;

    async fn profile(&self, profile_id: Uuid) -> Result<Option<MedicalProfile>, SourceError>;

    /// Summary row for one patient; `None` when the patient has no
    /// history (a skip for the index, not an error).
    async fn index_row(&self, patient_id: Uuid) -> Result<Option<IndexRow>, SourceError>;

    /// All summary rows in store order, capped at `page_cap`.
    async fn index_rows(&self, page_cap: usize) -> Result<Vec<IndexRow>, SourceError>;
}

/// One independently-owned clinical-event category.
#[async_trait]
pub trait CategorySource: Send + Sync {
    fn category(&self) -> EventCategory;

    /// Raw rows for one patient, pre-joined with provider name and
    /// specialty. An empty batch is a normal answer.
    async fn fetch_rows(
        &self,
        patient_id: Uuid,
        filter: &SourceFilter,
    ) -> Result<CategoryRows, SourceError>;
}
