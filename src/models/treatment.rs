use serde::{Deserialize, Serialize};

use super::enums::DurationUnit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub commercial_name: String,
    pub administration_route: Option<String>,
    pub concentration: Option<String>,
    pub manufacturer: Option<String>,
    pub reason_for_use: Option<String>,
    pub dose_quantity: Option<String>,
    pub frequency: Option<String>,
}

/// One prescribed treatment, owning its medication list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub reason: Option<String>,
    pub duration_quantity: Option<i32>,
    pub duration_unit: Option<DurationUnit>,
    pub notes: Option<String>,
    pub medications: Vec<Medication>,
}
