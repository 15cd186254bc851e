use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Sex;

/// Civil identity of a patient. Owned by the upstream registry — this
/// engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub id: Uuid,
    pub given_names: String,
    pub first_surname: String,
    pub second_surname: Option<String>,
    pub national_id: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub legal_address: Option<String>,
    pub email: Option<String>,
    pub personal_phone: Option<String>,
    pub emergency_phone: Option<String>,
}

impl PatientIdentity {
    /// "Given-names First-surname Second-surname", second surname elided
    /// when absent.
    pub fn display_name(&self) -> String {
        match &self.second_surname {
            Some(second) => format!("{} {} {}", self.given_names, self.first_surname, second),
            None => format!("{} {}", self.given_names, self.first_surname),
        }
    }
}
