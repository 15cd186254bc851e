//! Timeline aggregation — one chronologically ordered patient record
//! out of many independently-owned clinical-event sources.
//!
//! The mandatory identity and history lookups run first and fail fast,
//! so a miss never spawns (or leaks) category work. The seven category
//! fetches then fan out as one task each behind a per-category timeout,
//! join at a single barrier, normalize into envelope fragments and merge
//! into one deterministic total order.

pub mod aggregate;
pub mod normalize;
pub mod types;

pub use aggregate::{assemble_record, SourceBundle};
pub use normalize::{normalize_rows, NormalizedCategory, UNSPECIFIED_PROVIDER};
pub use types::*;

use thiserror::Error;
use uuid::Uuid;

use crate::sources::SourceError;

/// Record-level failures. Only the mandatory path produces these;
/// category failures degrade into `CategoryDiagnostic` entries instead.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A mandatory fetch could not reach the store at all.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// A mandatory lookup answered, but with no row. Never conflated
    /// with unavailability.
    #[error("{entity} not found: {id}")]
    RecordNotFound { entity: &'static str, id: Uuid },

    /// The requester's resolved scope does not cover the patient.
    #[error("Requester scope does not cover patient {0}")]
    ScopeDenied(Uuid),
}

// ── Tests ──────────────────────────────────────────────────────────────────
