use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BloodType, ResidenceEnvironment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergy {
    pub id: Uuid,
    pub name: String,
    pub allergen_component: Option<String>,
}

/// Clinical baseline for one patient, one-to-one with the identity.
/// A patient without a stored profile reads as `MedicalProfile::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalProfile {
    pub id: Uuid,
    pub blood_type: BloodType,
    pub residence_environment: ResidenceEnvironment,
    pub allergies: Vec<Allergy>,
}

impl MedicalProfile {
    /// Appends an allergy, keeping the set de-duplicated by allergy id.
    pub fn add_allergy(&mut self, allergy: Allergy) {
        if !self.allergies.iter().any(|a| a.id == allergy.id) {
            self.allergies.push(allergy);
        }
    }
}

impl Default for MedicalProfile {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            blood_type: BloodType::Unknown,
            residence_environment: ResidenceEnvironment::Unspecified,
            allergies: Vec::new(),
        }
    }
}
