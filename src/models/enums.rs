use crate::models::ModelError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(EventCategory {
    Consultation => "consultation",
    LabExam => "lab_exam",
    Therapy => "therapy",
    SurgicalIntervention => "surgical_intervention",
    VitalsCheck => "vitals_check",
    HospitalAdmission => "hospital_admission",
    HospitalDischarge => "hospital_discharge",
});

impl EventCategory {
    /// All categories, in tie-break precedence order (lowest rank first).
    pub const ALL: [EventCategory; 7] = [
        EventCategory::Consultation,
        EventCategory::LabExam,
        EventCategory::Therapy,
        EventCategory::SurgicalIntervention,
        EventCategory::VitalsCheck,
        EventCategory::HospitalAdmission,
        EventCategory::HospitalDischarge,
    ];

    /// Fixed rank used to break (date, time) ties so merged output is
    /// deterministic regardless of fetch completion order.
    pub fn precedence(self) -> u8 {
        match self {
            EventCategory::Consultation => 0,
            EventCategory::LabExam => 1,
            EventCategory::Therapy => 2,
            EventCategory::SurgicalIntervention => 3,
            EventCategory::VitalsCheck => 4,
            EventCategory::HospitalAdmission => 5,
            EventCategory::HospitalDischarge => 6,
        }
    }
}

str_enum!(HistoryStatus {
    Active => "active",
    Archived => "archived",
    Pending => "pending",
});

str_enum!(Sex {
    Male => "male",
    Female => "female",
});

str_enum!(BloodType {
    APositive => "a_positive",
    ANegative => "a_negative",
    BPositive => "b_positive",
    BNegative => "b_negative",
    AbPositive => "ab_positive",
    AbNegative => "ab_negative",
    OPositive => "o_positive",
    ONegative => "o_negative",
    Unknown => "unknown",
});

str_enum!(ResidenceEnvironment {
    Urban => "urban",
    Rural => "rural",
    Suburban => "suburban",
    Unspecified => "unspecified",
});

str_enum!(MorbidityKind {
    Acute => "acute",
    Chronic => "chronic",
    Congenital => "congenital",
});

str_enum!(MorbiditySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Critical => "critical",
});

str_enum!(DurationUnit {
    Days => "days",
    Weeks => "weeks",
    Months => "months",
});
