use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{MorbidityKind, MorbiditySeverity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morbidity {
    pub description: String,
    pub identification_date: Option<NaiveDate>,
    pub kind: MorbidityKind,
    pub severity: MorbiditySeverity,
    pub contagious: bool,
    pub classification_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub name: String,
    pub first_manifestation_date: Option<NaiveDate>,
    pub description: Option<String>,
    /// 0–10 scale; sources clamp out-of-range values on read.
    pub severity: u8,
    pub current_state: Option<String>,
}

/// One diagnosis recorded during an encounter. Owned by its envelope,
/// never shared between encounters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub detail: Option<String>,
    pub morbidity: Option<Morbidity>,
    pub symptoms: Vec<Symptom>,
}
