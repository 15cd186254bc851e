//! Requester scoping. Every request names a role and, depending on it,
//! a set of patient ids; the resolved scope is the complete universe of
//! patients the requester may see. Scope resolution is pure and is
//! re-applied on the detail path, so a listing from one context can
//! never be replayed against another.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterRole {
    Patient,
    Clinician,
    Admin,
}

impl RequesterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequesterRole::Patient => "patient",
            RequesterRole::Clinician => "clinician",
            RequesterRole::Admin => "admin",
        }
    }
}

impl FromStr for RequesterRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(RequesterRole::Patient),
            "clinician" => Ok(RequesterRole::Clinician),
            "admin" => Ok(RequesterRole::Admin),
            _ => Err(ModelError::InvalidEnum {
                field: "RequesterRole".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Who the requester is, before any scoping rule is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequesterContext {
    /// The requester's own patient id, when they are one.
    pub patient_id: Option<Uuid>,
    /// Dependents under the requester's guardianship.
    pub dependents: BTreeSet<Uuid>,
    /// Patients explicitly assigned to a clinician.
    pub assignments: BTreeSet<Uuid>,
}

/// The patient universe a request may touch.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessScope {
    /// An explicit, possibly empty, set of patient ids.
    Bounded(BTreeSet<Uuid>),
    /// Everything. Only the admin role resolves to this.
    Unbounded,
}

impl AccessScope {
    pub fn permits(&self, patient_id: Uuid) -> bool {
        match self {
            AccessScope::Unbounded => true,
            AccessScope::Bounded(ids) => ids.contains(&patient_id),
        }
    }
}

/// Resolve the scope for a role and context.
///
/// Patients see themselves plus their dependents. Clinicians see
/// exactly their assignment list; no assignments means an empty scope,
/// never a widened one. Admins are unbounded.
pub fn resolve_scope(role: RequesterRole, context: &RequesterContext) -> AccessScope {
    match role {
        RequesterRole::Patient => {
            let mut ids = context.dependents.clone();
            if let Some(own) = context.patient_id {
                ids.insert(own);
            }
            AccessScope::Bounded(ids)
        }
        RequesterRole::Clinician => AccessScope::Bounded(context.assignments.clone()),
        RequesterRole::Admin => AccessScope::Unbounded,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
