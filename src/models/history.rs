use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::HistoryStatus;

/// Header of one clinical history, one-to-one with a medical profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistoryRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub created_on: NaiveDate,
    pub status: HistoryStatus,
}
