use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use super::normalize::{normalize_rows, NormalizedCategory};
use super::types::{CategoryDiagnostic, CategoryOutcome, EventEnvelope, MedicalRecord};
use super::RecordError;
use crate::config::AggregationLimits;
use crate::index::CompositeId;
use crate::models::{EventCategory, MedicalProfile, SourceFilter};
use crate::sources::{CategorySource, PatientDirectory};

/// The sources one aggregation reads from.
pub struct SourceBundle {
    pub directory: Arc<dyn PatientDirectory>,
    pub categories: Vec<Arc<dyn CategorySource>>,
}

enum CategoryFetch {
    Loaded(NormalizedCategory),
    Failed(String),
    TimedOut,
}

/// Assemble one patient record.
///
/// Identity and history are mandatory and resolved first, failing fast
/// before any category work starts. The profile and every category are
/// optional: the categories fan out as one spawned task each, bounded
/// by the per-category timeout, and a failing or slow branch degrades
/// to an empty contribution with a diagnostic instead of an error.
pub async fn assemble_record(
    bundle: &SourceBundle,
    composite: CompositeId,
    limits: &AggregationLimits,
) -> Result<MedicalRecord, RecordError> {
    let identity = bundle
        .directory
        .identity(composite.patient_id)
        .await?
        .ok_or(RecordError::RecordNotFound { entity: "patient", id: composite.patient_id })?;

    let history = bundle
        .directory
        .history(composite.history_id)
        .await?
        .ok_or(RecordError::RecordNotFound { entity: "history", id: composite.history_id })?;

    // The profile is an optional branch: a miss and a fetch failure
    // both degrade to the default baseline, never abort the record.
    let profile = match bundle.directory.profile(history.profile_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => MedicalProfile::default(),
        Err(e) => {
            warn!(profile = %history.profile_id, error = %e, "profile fetch degraded to default");
            MedicalProfile::default()
        }
    };

    let categories: Vec<EventCategory> =
        bundle.categories.iter().map(|source| source.category()).collect();

    let tasks: Vec<_> = bundle
        .categories
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            let patient_id = composite.patient_id;
            let per_category = limits.category_timeout;
            tokio::spawn(async move {
                let filter = SourceFilter::default();
                match timeout(per_category, source.fetch_rows(patient_id, &filter)).await {
                    Err(_) => CategoryFetch::TimedOut,
                    Ok(Err(e)) => CategoryFetch::Failed(e.to_string()),
                    Ok(Ok(rows)) => CategoryFetch::Loaded(normalize_rows(rows)),
                }
            })
        })
        .collect();

    let mut diagnostics = Vec::with_capacity(categories.len());
    let mut contributions: Vec<(EventCategory, NormalizedCategory)> = Vec::new();

    for (category, joined) in categories.into_iter().zip(join_all(tasks).await) {
        let fetch = match joined {
            Ok(fetch) => fetch,
            Err(e) => CategoryFetch::Failed(format!("task failed: {e}")),
        };
        match fetch {
            CategoryFetch::Loaded(normalized) => {
                if normalized.skipped_rows > 0 {
                    warn!(
                        category = category.as_str(),
                        skipped = normalized.skipped_rows,
                        "skipped undated rows during normalization"
                    );
                }
                diagnostics.push(CategoryDiagnostic {
                    category,
                    outcome: CategoryOutcome::Loaded {
                        events: normalized.envelopes.len() as u32,
                        skipped_rows: normalized.skipped_rows,
                    },
                });
                contributions.push((category, normalized));
            }
            CategoryFetch::Failed(reason) => {
                warn!(category = category.as_str(), %reason, "category source degraded");
                diagnostics.push(CategoryDiagnostic {
                    category,
                    outcome: CategoryOutcome::Failed { reason },
                });
            }
            CategoryFetch::TimedOut => {
                warn!(category = category.as_str(), "category source timed out");
                diagnostics.push(CategoryDiagnostic { category, outcome: CategoryOutcome::TimedOut });
            }
        }
    }

    let events = merge_envelopes(contributions);
    info!(
        patient = %composite.patient_id,
        history = %composite.history_id,
        events = events.len(),
        "assembled medical record"
    );

    Ok(MedicalRecord { identity, profile, history, events, categories: diagnostics })
}

/// De-duplicates by encounter id and sorts per the timeline ordering.
///
/// Contributions fold in fixed category-precedence order, so when two
/// categories surface the same encounter id the last-normalized
/// (highest-precedence-rank) envelope wins — deterministically,
/// regardless of which fetch finished first.
fn merge_envelopes(
    mut contributions: Vec<(EventCategory, NormalizedCategory)>,
) -> Vec<EventEnvelope> {
    contributions.sort_by_key(|(category, _)| category.precedence());

    let mut by_encounter: HashMap<Uuid, EventEnvelope> = HashMap::new();
    for (_, normalized) in contributions {
        for envelope in normalized.envelopes {
            by_encounter.insert(envelope.encounter_id, envelope);
        }
    }

    let mut events: Vec<EventEnvelope> = by_encounter.into_values().collect();
    events.sort_by(|a, b| a.timeline_ordering(b));
    events
}
