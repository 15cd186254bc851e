use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Diagnosis, EventCategory, MedicalHistoryRecord, MedicalProfile, PatientIdentity, Treatment,
};

/// One clinical encounter on the unified timeline.
///
/// The envelope exclusively owns its payload, diagnosis and treatment
/// lists; they are destroyed with it and never shared across envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub encounter_id: Uuid,
    pub category: EventCategory,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub provider_name: String,
    pub provider_specialty: Option<String>,
    pub payloads: Vec<EventPayload>,
    pub diagnoses: Vec<Diagnosis>,
    pub treatments: Vec<Treatment>,
}

impl EventEnvelope {
    /// Total order for the merged timeline: newest (date, start_time)
    /// first, ties broken by category precedence, then by encounter id
    /// so the output is deterministic regardless of which source
    /// finished first.
    pub fn timeline_ordering(&self, other: &Self) -> Ordering {
        other
            .date
            .cmp(&self.date)
            .then_with(|| other.start_time.cmp(&self.start_time))
            .then_with(|| self.category.precedence().cmp(&other.category.precedence()))
            .then_with(|| self.encounter_id.cmp(&other.encounter_id))
    }

    /// Locale-style display stamp: date-only rows render as a date,
    /// rows with a start time combine it with the row date.
    pub fn display_timestamp(&self) -> String {
        match self.start_time {
            Some(time) => NaiveDateTime::new(self.date, time)
                .format("%d/%m/%Y %H:%M")
                .to_string(),
            None => self.date.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Category-specific payload carried by an envelope. One encounter may
/// host several payloads of the same kind (e.g. two exams in one visit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventPayload {
    Consultation {
        reason: Option<String>,
        observations: Option<String>,
    },
    LabExam {
        procedure_description: Option<String>,
        lab_type: Option<String>,
        result: Option<String>,
        description: Option<String>,
    },
    Therapy {
        description: Option<String>,
        observations: Option<String>,
        results: Option<String>,
    },
    SurgicalIntervention {
        procedure: Option<String>,
        anesthesia_type: Option<String>,
        observations: Option<String>,
    },
    VitalsCheck {
        heart_rate: Option<i32>,
        systolic: Option<i32>,
        diastolic: Option<i32>,
        oxygen_saturation: Option<i32>,
        patient_state: Option<String>,
        notes: Option<String>,
    },
    HospitalAdmission {
        ward: Option<String>,
        reason: Option<String>,
        notes: Option<String>,
    },
    HospitalDischarge {
        destination: Option<String>,
        summary: Option<String>,
        notes: Option<String>,
    },
}

/// Per-category outcome of one aggregation, so degraded reads stay
/// observable without becoming record-level errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum CategoryOutcome {
    Loaded { events: u32, skipped_rows: u32 },
    Failed { reason: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDiagnostic {
    pub category: EventCategory,
    pub outcome: CategoryOutcome,
}

/// The assembled patient record: mandatory identity and history, the
/// (possibly defaulted) profile, the merged timeline and per-category
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub identity: PatientIdentity,
    pub profile: MedicalProfile,
    pub history: MedicalHistoryRecord,
    pub events: Vec<EventEnvelope>,
    pub categories: Vec<CategoryDiagnostic>,
}
