//! Pure per-category mapping from raw rows into envelope fragments.
//!
//! Rows referencing the same encounter id fold into one envelope: the
//! payload list grows per row, consultation child lists (diagnoses,
//! treatments) are appended. Rows without a date cannot be ordered and
//! are skipped and counted instead of aborting the merge.

use std::collections::HashMap;

use uuid::Uuid;

use super::types::{EventEnvelope, EventPayload};
use crate::models::*;

/// Placeholder provider for rows whose provider join came back empty.
pub const UNSPECIFIED_PROVIDER: &str = "unspecified provider";

/// One category's normalized contribution.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCategory {
    pub envelopes: Vec<EventEnvelope>,
    pub skipped_rows: u32,
}

pub fn normalize_rows(rows: CategoryRows) -> NormalizedCategory {
    match rows {
        CategoryRows::Consultations(rows) => normalize_consultations(rows),
        CategoryRows::LabExams(rows) => normalize_lab_exams(rows),
        CategoryRows::Therapies(rows) => normalize_therapies(rows),
        CategoryRows::SurgicalInterventions(rows) => normalize_surgical_interventions(rows),
        CategoryRows::VitalsChecks(rows) => normalize_vitals_checks(rows),
        CategoryRows::HospitalAdmissions(rows) => normalize_hospital_admissions(rows),
        CategoryRows::HospitalDischarges(rows) => normalize_hospital_discharges(rows),
    }
}

/// Groups rows by encounter id in first-seen order. `fill` moves one
/// row's payload (and children) into its envelope.
fn group_rows<R>(
    rows: Vec<R>,
    category: EventCategory,
    stamp: impl Fn(&R) -> &EncounterStamp,
    mut fill: impl FnMut(R, &mut EventEnvelope),
) -> NormalizedCategory {
    let mut envelopes: Vec<EventEnvelope> = Vec::new();
    let mut by_encounter: HashMap<Uuid, usize> = HashMap::new();
    let mut skipped_rows = 0u32;

    for row in rows {
        let s = stamp(&row);
        let Some(date) = s.date else {
            skipped_rows += 1;
            continue;
        };

        let slot = match by_encounter.get(&s.encounter_id) {
            Some(&idx) => idx,
            None => {
                envelopes.push(EventEnvelope {
                    encounter_id: s.encounter_id,
                    category,
                    date,
                    start_time: s.start_time,
                    end_time: s.end_time,
                    provider_name: s
                        .provider_name
                        .clone()
                        .unwrap_or_else(|| UNSPECIFIED_PROVIDER.to_string()),
                    provider_specialty: s.provider_specialty.clone(),
                    payloads: Vec::new(),
                    diagnoses: Vec::new(),
                    treatments: Vec::new(),
                });
                let idx = envelopes.len() - 1;
                by_encounter.insert(s.encounter_id, idx);
                idx
            }
        };

        fill(row, &mut envelopes[slot]);
    }

    NormalizedCategory { envelopes, skipped_rows }
}

pub fn normalize_consultations(rows: Vec<ConsultationRow>) -> NormalizedCategory {
    group_rows(rows, EventCategory::Consultation, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::Consultation {
            reason: row.reason,
            observations: row.observations,
        });
        envelope.diagnoses.extend(row.diagnoses);
        envelope.treatments.extend(row.treatments);
    })
}

pub fn normalize_lab_exams(rows: Vec<LabExamRow>) -> NormalizedCategory {
    group_rows(rows, EventCategory::LabExam, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::LabExam {
            procedure_description: row.procedure_description,
            lab_type: row.lab_type,
            result: row.result,
            description: row.description,
        });
    })
}

pub fn normalize_therapies(rows: Vec<TherapyRow>) -> NormalizedCategory {
    group_rows(rows, EventCategory::Therapy, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::Therapy {
            description: row.description,
            observations: row.observations,
            results: row.results,
        });
    })
}

pub fn normalize_surgical_interventions(
    rows: Vec<SurgicalInterventionRow>,
) -> NormalizedCategory {
    group_rows(rows, EventCategory::SurgicalIntervention, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::SurgicalIntervention {
            procedure: row.procedure,
            anesthesia_type: row.anesthesia_type,
            observations: row.observations,
        });
    })
}

pub fn normalize_vitals_checks(rows: Vec<VitalsCheckRow>) -> NormalizedCategory {
    group_rows(rows, EventCategory::VitalsCheck, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::VitalsCheck {
            heart_rate: row.heart_rate,
            systolic: row.systolic,
            diastolic: row.diastolic,
            oxygen_saturation: row.oxygen_saturation,
            patient_state: row.patient_state,
            notes: row.notes,
        });
    })
}

pub fn normalize_hospital_admissions(rows: Vec<HospitalAdmissionRow>) -> NormalizedCategory {
    group_rows(rows, EventCategory::HospitalAdmission, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::HospitalAdmission {
            ward: row.ward,
            reason: row.reason,
            notes: row.notes,
        });
    })
}

pub fn normalize_hospital_discharges(rows: Vec<HospitalDischargeRow>) -> NormalizedCategory {
    group_rows(rows, EventCategory::HospitalDischarge, |r| &r.stamp, |row, envelope| {
        envelope.payloads.push(EventPayload::HospitalDischarge {
            destination: row.destination,
            summary: row.summary,
            notes: row.notes,
        });
    })
}
