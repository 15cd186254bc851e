//! Identity projection. The stored `PatientIdentity` always carries the
//! full contact surface; what leaves the service is a view with the
//! sensitive fields either passed through or withheld. Projection is a
//! pure function of the stored value, so toggling the reveal flag never
//! touches what is persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chrono::NaiveDate;

use crate::models::{PatientIdentity, Sex};

/// Outward-facing identity. Sensitive fields are omitted from the
/// serialized form entirely when withheld, not rendered as nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityView {
    pub id: Uuid,
    pub given_names: String,
    pub first_surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_surname: Option<String>,
    pub national_id: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_phone: Option<String>,
}

/// Project an identity for output, withholding the sensitive contact
/// fields unless `reveal_sensitive` is set.
pub fn project_identity(identity: &PatientIdentity, reveal_sensitive: bool) -> IdentityView {
    let gate = |value: &Option<String>| {
        if reveal_sensitive {
            value.clone()
        } else {
            None
        }
    };

    IdentityView {
        id: identity.id,
        given_names: identity.given_names.clone(),
        first_surname: identity.first_surname.clone(),
        second_surname: identity.second_surname.clone(),
        national_id: identity.national_id.clone(),
        birth_date: identity.birth_date,
        sex: identity.sex,
        legal_address: gate(&identity.legal_address),
        email: gate(&identity.email),
        personal_phone: gate(&identity.personal_phone),
        emergency_phone: gate(&identity.emergency_phone),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn full_identity() -> PatientIdentity {
        PatientIdentity {
            id: Uuid::new_v4(),
            given_names: "Ana".into(),
            first_surname: "Torres".into(),
            second_surname: Some("Quispe".into()),
            national_id: "40582934".into(),
            birth_date: NaiveDate::from_ymd_opt(1988, 4, 2).unwrap(),
            sex: Sex::Female,
            legal_address: Some("Av. Arequipa 1200".into()),
            email: Some("ana@example.com".into()),
            personal_phone: Some("+51 999 111 222".into()),
            emergency_phone: Some("+51 999 333 444".into()),
        }
    }

    #[test]
    fn withheld_view_drops_only_the_sensitive_fields() {
        let identity = full_identity();
        let view = project_identity(&identity, false);

        assert_eq!(view.given_names, identity.given_names);
        assert_eq!(view.national_id, identity.national_id);
        assert_eq!(view.second_surname, identity.second_surname);
        assert_eq!(view.legal_address, None);
        assert_eq!(view.email, None);
        assert_eq!(view.personal_phone, None);
        assert_eq!(view.emergency_phone, None);
    }

    #[test]
    fn revealed_view_passes_everything_through() {
        let identity = full_identity();
        let view = project_identity(&identity, true);
        assert_eq!(view.legal_address, identity.legal_address);
        assert_eq!(view.email, identity.email);
        assert_eq!(view.personal_phone, identity.personal_phone);
        assert_eq!(view.emergency_phone, identity.emergency_phone);
    }

    #[test]
    fn toggling_reveal_never_mutates_the_source() {
        let identity = full_identity();
        let before = identity.clone();

        let _ = project_identity(&identity, false);
        let revealed = project_identity(&identity, true);
        assert_eq!(identity, before);
        assert_eq!(revealed.email, before.email);
    }

    #[test]
    fn withheld_fields_vanish_from_serialized_form() {
        let view = project_identity(&full_identity(), false);
        let json = serde_json::to_value(&view).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("legal_address"));
        assert!(!object.contains_key("email"));
        assert!(!object.contains_key("personal_phone"));
        assert!(!object.contains_key("emergency_phone"));
        assert!(object.contains_key("national_id"));
    }
}
