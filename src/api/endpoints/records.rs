//! Record index and timeline endpoints.
//!
//! `GET /api/records` — index of records visible to the requester.
//! `GET /api/records/:patient_id/:history_id` — the full timeline.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{requester_from_headers, ApiContext};
use crate::index::{CompositeId, RecordIndexEntry};
use crate::models::{MedicalHistoryRecord, MedicalProfile};
use crate::projection::{project_identity, IdentityView};
use crate::timeline::{CategoryDiagnostic, EventEnvelope, MedicalRecord};

/// `GET /api/records` — the scoped record index.
pub async fn list(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<Vec<RecordIndexEntry>>, ApiError> {
    let (role, context) = requester_from_headers(&headers)?;
    let entries = ctx.service.list_index(role, &context).await?;
    Ok(Json(entries))
}

#[derive(Deserialize)]
pub struct DetailQuery {
    pub reveal_sensitive: Option<bool>,
}

/// Outward shape of one assembled record, identity already projected.
#[derive(Debug, Serialize)]
pub struct MedicalRecordView {
    pub identity: IdentityView,
    pub profile: MedicalProfile,
    pub history: MedicalHistoryRecord,
    pub events: Vec<EventEnvelope>,
    pub categories: Vec<CategoryDiagnostic>,
}

impl MedicalRecordView {
    fn from_record(record: MedicalRecord, reveal_sensitive: bool) -> Self {
        MedicalRecordView {
            identity: project_identity(&record.identity, reveal_sensitive),
            profile: record.profile,
            history: record.history,
            events: record.events,
            categories: record.categories,
        }
    }
}

/// `GET /api/records/:patient_id/:history_id` — one assembled timeline.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path((patient_id, history_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<DetailQuery>,
    headers: HeaderMap,
) -> Result<Json<MedicalRecordView>, ApiError> {
    let (role, context) = requester_from_headers(&headers)?;
    let composite = CompositeId { patient_id, history_id };
    let record = ctx.service.get_timeline(role, &context, composite).await?;
    let reveal = query.reveal_sensitive.unwrap_or(false);
    Ok(Json(MedicalRecordView::from_record(record, reveal)))
}
