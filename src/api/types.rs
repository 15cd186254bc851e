//! Shared types for the API layer.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::access::{RequesterContext, RequesterRole};
use crate::api::error::ApiError;
use crate::service::RecordService;

pub const ROLE_HEADER: &str = "x-requester-role";
pub const PATIENT_HEADER: &str = "x-requester-patient";
pub const DEPENDENTS_HEADER: &str = "x-requester-dependents";
pub const ASSIGNMENTS_HEADER: &str = "x-requester-assignments";

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub service: Arc<RecordService>,
}

impl ApiContext {
    pub fn new(service: Arc<RecordService>) -> Self {
        Self { service }
    }
}

/// Extract the requester role and context from request headers.
///
/// The role header is mandatory. The id headers are optional; dependents
/// and assignments are comma-separated uuid lists. Any malformed value
/// is a bad request, never a silently narrowed scope.
pub fn requester_from_headers(
    headers: &HeaderMap,
) -> Result<(RequesterRole, RequesterContext), ApiError> {
    let role = header_str(headers, ROLE_HEADER)?
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {ROLE_HEADER} header")))?
        .parse::<RequesterRole>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let patient_id = match header_str(headers, PATIENT_HEADER)? {
        Some(raw) => Some(parse_header_uuid(PATIENT_HEADER, raw)?),
        None => None,
    };

    let context = RequesterContext {
        patient_id,
        dependents: parse_uuid_list(headers, DEPENDENTS_HEADER)?,
        assignments: parse_uuid_list(headers, ASSIGNMENTS_HEADER)?,
    };

    Ok((role, context))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {name} header"))),
    }
}

fn parse_header_uuid(name: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid uuid in {name} header")))
}

fn parse_uuid_list(headers: &HeaderMap, name: &str) -> Result<BTreeSet<Uuid>, ApiError> {
    let Some(raw) = header_str(headers, name)? else {
        return Ok(BTreeSet::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_header_uuid(name, part))
        .collect()
}
