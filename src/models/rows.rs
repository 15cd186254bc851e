//! Raw per-category rows as returned by the source adapters, pre-joined
//! with provider name and specialty. Rows are the input of the
//! normalizer; one encounter may span several rows of one category.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diagnosis::Diagnosis;
use super::enums::EventCategory;
use super::treatment::Treatment;

/// Common envelope-forming fields every raw row carries.
///
/// `date` stays optional here: upstream rows occasionally miss it, and
/// the normalizer skips (and counts) those instead of faulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterStamp {
    pub encounter_id: Uuid,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub provider_name: Option<String>,
    pub provider_specialty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRow {
    pub stamp: EncounterStamp,
    pub reason: Option<String>,
    pub observations: Option<String>,
    pub diagnoses: Vec<Diagnosis>,
    pub treatments: Vec<Treatment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabExamRow {
    pub stamp: EncounterStamp,
    pub procedure_description: Option<String>,
    pub lab_type: Option<String>,
    pub result: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyRow {
    pub stamp: EncounterStamp,
    pub description: Option<String>,
    pub observations: Option<String>,
    pub results: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgicalInterventionRow {
    pub stamp: EncounterStamp,
    pub procedure: Option<String>,
    pub anesthesia_type: Option<String>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsCheckRow {
    pub stamp: EncounterStamp,
    pub heart_rate: Option<i32>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    pub patient_state: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalAdmissionRow {
    pub stamp: EncounterStamp,
    pub ward: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalDischargeRow {
    pub stamp: EncounterStamp,
    pub destination: Option<String>,
    pub summary: Option<String>,
    pub notes: Option<String>,
}

/// One category's fetch result — a homogeneous batch of raw rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CategoryRows {
    Consultations(Vec<ConsultationRow>),
    LabExams(Vec<LabExamRow>),
    Therapies(Vec<TherapyRow>),
    SurgicalInterventions(Vec<SurgicalInterventionRow>),
    VitalsChecks(Vec<VitalsCheckRow>),
    HospitalAdmissions(Vec<HospitalAdmissionRow>),
    HospitalDischarges(Vec<HospitalDischargeRow>),
}

impl CategoryRows {
    pub fn category(&self) -> EventCategory {
        match self {
            CategoryRows::Consultations(_) => EventCategory::Consultation,
            CategoryRows::LabExams(_) => EventCategory::LabExam,
            CategoryRows::Therapies(_) => EventCategory::Therapy,
            CategoryRows::SurgicalInterventions(_) => EventCategory::SurgicalIntervention,
            CategoryRows::VitalsChecks(_) => EventCategory::VitalsCheck,
            CategoryRows::HospitalAdmissions(_) => EventCategory::HospitalAdmission,
            CategoryRows::HospitalDischarges(_) => EventCategory::HospitalDischarge,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CategoryRows::Consultations(v) => v.len(),
            CategoryRows::LabExams(v) => v.len(),
            CategoryRows::Therapies(v) => v.len(),
            CategoryRows::SurgicalInterventions(v) => v.len(),
            CategoryRows::VitalsChecks(v) => v.len(),
            CategoryRows::HospitalAdmissions(v) => v.len(),
            CategoryRows::HospitalDischarges(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty batch for a category, used when a degraded branch
    /// contributes nothing.
    pub fn empty(category: EventCategory) -> Self {
        match category {
            EventCategory::Consultation => CategoryRows::Consultations(Vec::new()),
            EventCategory::LabExam => CategoryRows::LabExams(Vec::new()),
            EventCategory::Therapy => CategoryRows::Therapies(Vec::new()),
            EventCategory::SurgicalIntervention => CategoryRows::SurgicalInterventions(Vec::new()),
            EventCategory::VitalsCheck => CategoryRows::VitalsChecks(Vec::new()),
            EventCategory::HospitalAdmission => CategoryRows::HospitalAdmissions(Vec::new()),
            EventCategory::HospitalDischarge => CategoryRows::HospitalDischarges(Vec::new()),
        }
    }
}
