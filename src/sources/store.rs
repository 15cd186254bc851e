//! SQLite reference implementation of the source traits.
//!
//! All reads run on `spawn_blocking` over one shared connection; the
//! engine never writes, so no transaction handling is needed here.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    open_database, open_memory_database, CategorySource, IndexRow, PatientDirectory, SourceError,
};
use crate::models::*;

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &std::path::Path) -> Result<Self, SourceError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn in_memory() -> Result<Self, SourceError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    /// Wrap an already-opened (and migrated) connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    /// The seven category adapters backed by this store.
    pub fn category_sources(&self) -> Vec<Arc<dyn CategorySource>> {
        EventCategory::ALL
            .iter()
            .map(|&category| {
                Arc::new(SqliteCategorySource { store: self.clone(), category })
                    as Arc<dyn CategorySource>
            })
            .collect()
    }

    pub(crate) async fn with_conn<T, F>(&self, op: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SourceError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| SourceError::Unavailable("connection lock poisoned".into()))?;
            op(&guard)
        })
        .await
        .map_err(|e| SourceError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl PatientDirectory for SqliteStore {
    async fn identity(&self, patient_id: Uuid) -> Result<Option<PatientIdentity>, SourceError> {
        self.with_conn(move |conn| fetch_identity(conn, patient_id)).await
    }

    async fn history(&self, history_id: Uuid) -> Result<Option<MedicalHistoryRecord>, SourceError> {
        self.with_conn(move |conn| fetch_history(conn, history_id)).await
    }

    async fn profile(&self, profile_id: Uuid) -> Result<Option<MedicalProfile>, SourceError> {
        self.with_conn(move |conn| fetch_profile(conn, profile_id)).await
    }

    async fn index_row(&self, patient_id: Uuid) -> Result<Option<IndexRow>, SourceError> {
        self.with_conn(move |conn| fetch_index_row(conn, patient_id)).await
    }

    async fn index_rows(&self, page_cap: usize) -> Result<Vec<IndexRow>, SourceError> {
        self.with_conn(move |conn| fetch_index_rows(conn, page_cap)).await
    }
}

/// One category adapter over the shared store.
pub struct SqliteCategorySource {
    store: SqliteStore,
    category: EventCategory,
}

#[async_trait]
impl CategorySource for SqliteCategorySource {
    fn category(&self) -> EventCategory {
        self.category
    }

    async fn fetch_rows(
        &self,
        patient_id: Uuid,
        filter: &SourceFilter,
    ) -> Result<CategoryRows, SourceError> {
        let category = self.category;
        let filter = filter.clone();
        self.store
            .with_conn(move |conn| match category {
                EventCategory::Consultation => {
                    fetch_consultations(conn, patient_id, &filter).map(CategoryRows::Consultations)
                }
                EventCategory::LabExam => {
                    fetch_lab_exams(conn, patient_id, &filter).map(CategoryRows::LabExams)
                }
                EventCategory::Therapy => {
                    fetch_therapies(conn, patient_id, &filter).map(CategoryRows::Therapies)
                }
                EventCategory::SurgicalIntervention => {
                    fetch_surgical_interventions(conn, patient_id, &filter)
                        .map(CategoryRows::SurgicalInterventions)
                }
                EventCategory::VitalsCheck => {
                    fetch_vitals_checks(conn, patient_id, &filter).map(CategoryRows::VitalsChecks)
                }
                EventCategory::HospitalAdmission => {
                    fetch_hospital_admissions(conn, patient_id, &filter)
                        .map(CategoryRows::HospitalAdmissions)
                }
                EventCategory::HospitalDischarge => {
                    fetch_hospital_discharges(conn, patient_id, &filter)
                        .map(CategoryRows::HospitalDischarges)
                }
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str) -> Result<Uuid, SourceError> {
    Uuid::parse_str(s).map_err(|e| SourceError::Query(format!("bad uuid {s:?}: {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, SourceError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| SourceError::Query(format!("bad date {s:?}: {e}")))
}

fn parse_opt_date(s: Option<String>) -> Result<Option<NaiveDate>, SourceError> {
    s.as_deref().map(parse_date).transpose()
}

fn parse_opt_time(s: Option<String>) -> Result<Option<NaiveTime>, SourceError> {
    s.as_deref()
        .map(|t| {
            NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .map_err(|e| SourceError::Query(format!("bad time {t:?}: {e}")))
        })
        .transpose()
}

fn display_name(given: &str, first: &str, second: Option<&str>) -> String {
    match second {
        Some(s) => format!("{given} {first} {s}"),
        None => format!("{given} {first}"),
    }
}

pub(crate) fn fetch_identity(
    conn: &Connection,
    patient_id: Uuid,
) -> Result<Option<PatientIdentity>, SourceError> {
    let row = conn
        .query_row(
            "SELECT id, given_names, first_surname, second_surname, national_id,
                    birth_date, sex, legal_address, email, personal_phone, emergency_phone
             FROM patients WHERE id = ?1",
            params![patient_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<String>>(10)?,
                ))
            },
        )
        .optional()?;

    let Some((id, given, first, second, national_id, birth, sex, address, email, phone, emergency)) =
        row
    else {
        return Ok(None);
    };

    Ok(Some(PatientIdentity {
        id: parse_uuid(&id)?,
        given_names: given,
        first_surname: first,
        second_surname: second,
        national_id,
        birth_date: parse_date(&birth)?,
        sex: Sex::from_str(&sex)?,
        legal_address: address,
        email,
        personal_phone: phone,
        emergency_phone: emergency,
    }))
}

pub(crate) fn fetch_history(
    conn: &Connection,
    history_id: Uuid,
) -> Result<Option<MedicalHistoryRecord>, SourceError> {
    let row = conn
        .query_row(
            "SELECT id, profile_id, created_on, status FROM medical_histories WHERE id = ?1",
            params![history_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, profile_id, created_on, status)) = row else {
        return Ok(None);
    };

    Ok(Some(MedicalHistoryRecord {
        id: parse_uuid(&id)?,
        profile_id: parse_uuid(&profile_id)?,
        created_on: parse_date(&created_on)?,
        status: HistoryStatus::from_str(&status)?,
    }))
}

pub(crate) fn fetch_profile(
    conn: &Connection,
    profile_id: Uuid,
) -> Result<Option<MedicalProfile>, SourceError> {
    let row = conn
        .query_row(
            "SELECT id, blood_type, residence_environment FROM medical_profiles WHERE id = ?1",
            params![profile_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((id, blood_type, residence)) = row else {
        return Ok(None);
    };

    let mut profile = MedicalProfile {
        id: parse_uuid(&id)?,
        blood_type: BloodType::from_str(&blood_type)?,
        residence_environment: ResidenceEnvironment::from_str(&residence)?,
        allergies: Vec::new(),
    };

    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.allergen_component
         FROM profile_allergies pa
         JOIN allergies a ON pa.allergy_id = a.id
         WHERE pa.profile_id = ?1
         ORDER BY a.name",
    )?;
    let rows = stmt.query_map(params![profile_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    for row in rows {
        let (id, name, component) = row?;
        profile.add_allergy(Allergy {
            id: parse_uuid(&id)?,
            name,
            allergen_component: component,
        });
    }

    Ok(Some(profile))
}

const INDEX_ROW_SELECT: &str = "SELECT p.id, h.id, p.given_names, p.first_surname, p.second_surname, h.status,
        COALESCE(
            (SELECT MAX(se.date) FROM service_events se
             WHERE se.patient_id = p.id AND se.date IS NOT NULL),
            h.created_on
        ) AS last_update
 FROM patients p
 JOIN medical_profiles mp ON mp.patient_id = p.id
 JOIN medical_histories h ON h.profile_id = mp.id";

type IndexCols = (String, String, String, String, Option<String>, String, String);

fn index_row_from_cols(cols: IndexCols) -> Result<IndexRow, SourceError> {
    let (patient_id, history_id, given, first, second, status, last_update) = cols;
    Ok(IndexRow {
        patient_id: parse_uuid(&patient_id)?,
        history_id: parse_uuid(&history_id)?,
        patient_display_name: display_name(&given, &first, second.as_deref()),
        last_update: parse_date(&last_update)?,
        status: HistoryStatus::from_str(&status)?,
    })
}

pub(crate) fn fetch_index_row(
    conn: &Connection,
    patient_id: Uuid,
) -> Result<Option<IndexRow>, SourceError> {
    let sql = format!("{INDEX_ROW_SELECT} WHERE p.id = ?1");
    let cols = conn
        .query_row(&sql, params![patient_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .optional()?;

    cols.map(index_row_from_cols).transpose()
}

pub(crate) fn fetch_index_rows(
    conn: &Connection,
    page_cap: usize,
) -> Result<Vec<IndexRow>, SourceError> {
    // Store order, page-capped, unfiltered.
    let sql = format!("{INDEX_ROW_SELECT} ORDER BY p.rowid LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![page_cap as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let cols = rows.collect::<Result<Vec<IndexCols>, _>>()?;
    cols.into_iter().map(index_row_from_cols).collect()
}

// Stamp columns shared by every category query: encounter id, date,
// start/end time, pre-joined provider name and specialty.
const STAMP_COLS: &str = "se.id, se.date, se.start_time, se.end_time, pr.name, pr.specialty";

type StampCols = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn read_stamp_cols(row: &rusqlite::Row<'_>) -> rusqlite::Result<StampCols> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn stamp_from_cols(cols: StampCols) -> Result<EncounterStamp, SourceError> {
    let (event_id, date, start, end, provider_name, provider_specialty) = cols;
    Ok(EncounterStamp {
        encounter_id: parse_uuid(&event_id)?,
        date: parse_opt_date(date)?,
        start_time: parse_opt_time(start)?,
        end_time: parse_opt_time(end)?,
        provider_name,
        provider_specialty,
    })
}

fn category_sql(table: &str, alias: &str, extra_cols: &str) -> String {
    format!(
        "SELECT {STAMP_COLS}, {extra_cols}
         FROM {table} {alias}
         JOIN service_events se ON {alias}.event_id = se.id
         LEFT JOIN providers pr ON se.provider_id = pr.id
         WHERE se.patient_id = ?1
           AND (?2 IS NULL OR se.date >= ?2)
           AND (?3 IS NULL OR se.date <= ?3)
         ORDER BY se.rowid"
    )
}

fn window_params(patient_id: Uuid, filter: &SourceFilter) -> [Option<String>; 3] {
    [
        Some(patient_id.to_string()),
        filter.date_from.map(|d| d.to_string()),
        filter.date_to.map(|d| d.to_string()),
    ]
}

pub(crate) fn fetch_consultations(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<ConsultationRow>, SourceError> {
    let sql = category_sql("consultations", "c", "c.id, c.reason, c.observations");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, String>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut out = Vec::with_capacity(collected.len());
    for (stamp, consultation_id, reason, observations) in collected {
        out.push(ConsultationRow {
            stamp: stamp_from_cols(stamp)?,
            reason,
            observations,
            diagnoses: fetch_diagnoses(conn, &consultation_id)?,
            treatments: fetch_treatments(conn, &consultation_id)?,
        });
    }
    Ok(out)
}

fn fetch_diagnoses(conn: &Connection, consultation_id: &str) -> Result<Vec<Diagnosis>, SourceError> {
    let mut stmt = conn.prepare(
        "SELECT id, detail, morbidity_description, morbidity_identification_date,
                morbidity_kind, morbidity_severity, morbidity_contagious,
                morbidity_classification_code
         FROM diagnoses WHERE consultation_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![consultation_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, Option<String>>(7)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut out = Vec::with_capacity(collected.len());
    for (id, detail, morb_desc, morb_date, kind, severity, contagious, code) in collected {
        let morbidity = match morb_desc {
            Some(description) => Some(Morbidity {
                description,
                identification_date: parse_opt_date(morb_date)?,
                kind: kind
                    .as_deref()
                    .map(MorbidityKind::from_str)
                    .transpose()?
                    .unwrap_or(MorbidityKind::Acute),
                severity: severity
                    .as_deref()
                    .map(MorbiditySeverity::from_str)
                    .transpose()?
                    .unwrap_or(MorbiditySeverity::Mild),
                contagious: contagious != 0,
                classification_code: code,
            }),
            None => None,
        };
        out.push(Diagnosis {
            detail,
            morbidity,
            symptoms: fetch_symptoms(conn, &id)?,
        });
    }
    Ok(out)
}

fn fetch_symptoms(conn: &Connection, diagnosis_id: &str) -> Result<Vec<Symptom>, SourceError> {
    let mut stmt = conn.prepare(
        "SELECT name, first_manifestation_date, description, severity, current_state
         FROM symptoms WHERE diagnosis_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![diagnosis_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (name, first_date, description, severity, current_state) = row?;
        out.push(Symptom {
            name,
            first_manifestation_date: parse_opt_date(first_date)?,
            description,
            severity: severity.clamp(0, 10) as u8,
            current_state,
        });
    }
    Ok(out)
}

fn fetch_treatments(conn: &Connection, consultation_id: &str) -> Result<Vec<Treatment>, SourceError> {
    let mut stmt = conn.prepare(
        "SELECT id, reason, duration_quantity, duration_unit, notes
         FROM treatments WHERE consultation_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![consultation_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut out = Vec::with_capacity(collected.len());
    for (id, reason, quantity, unit, notes) in collected {
        out.push(Treatment {
            reason,
            duration_quantity: quantity.map(|q| q as i32),
            duration_unit: unit.as_deref().map(DurationUnit::from_str).transpose()?,
            notes,
            medications: fetch_medications(conn, &id)?,
        });
    }
    Ok(out)
}

fn fetch_medications(conn: &Connection, treatment_id: &str) -> Result<Vec<Medication>, SourceError> {
    let mut stmt = conn.prepare(
        "SELECT commercial_name, administration_route, concentration, manufacturer,
                reason_for_use, dose_quantity, frequency
         FROM treatment_medications WHERE treatment_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![treatment_id], |row| {
        Ok(Medication {
            commercial_name: row.get(0)?,
            administration_route: row.get(1)?,
            concentration: row.get(2)?,
            manufacturer: row.get(3)?,
            reason_for_use: row.get(4)?,
            dose_quantity: row.get(5)?,
            frequency: row.get(6)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(SourceError::from)
}

pub(crate) fn fetch_lab_exams(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<LabExamRow>, SourceError> {
    let sql = category_sql(
        "lab_exams",
        "x",
        "x.procedure_description, x.lab_type, x.result, x.description",
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, Option<String>>(9)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;

    collected
        .into_iter()
        .map(|(stamp, procedure_description, lab_type, result, description)| {
            Ok(LabExamRow {
                stamp: stamp_from_cols(stamp)?,
                procedure_description,
                lab_type,
                result,
                description,
            })
        })
        .collect()
}

pub(crate) fn fetch_therapies(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<TherapyRow>, SourceError> {
    let sql = category_sql("therapies", "t", "t.description, t.observations, t.results");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;

    collected
        .into_iter()
        .map(|(stamp, description, observations, results)| {
            Ok(TherapyRow { stamp: stamp_from_cols(stamp)?, description, observations, results })
        })
        .collect()
}

pub(crate) fn fetch_surgical_interventions(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<SurgicalInterventionRow>, SourceError> {
    let sql = category_sql(
        "surgical_interventions",
        "s",
        "s.procedure, s.anesthesia_type, s.observations",
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;

    collected
        .into_iter()
        .map(|(stamp, procedure, anesthesia_type, observations)| {
            Ok(SurgicalInterventionRow {
                stamp: stamp_from_cols(stamp)?,
                procedure,
                anesthesia_type,
                observations,
            })
        })
        .collect()
}

pub(crate) fn fetch_vitals_checks(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<VitalsCheckRow>, SourceError> {
    let sql = category_sql(
        "vitals_checks",
        "v",
        "v.heart_rate, v.systolic, v.diastolic, v.oxygen_saturation, v.patient_state, v.notes",
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, Option<i64>>(6)?,
            row.get::<_, Option<i64>>(7)?,
            row.get::<_, Option<i64>>(8)?,
            row.get::<_, Option<i64>>(9)?,
            row.get::<_, Option<String>>(10)?,
            row.get::<_, Option<String>>(11)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;

    collected
        .into_iter()
        .map(|(stamp, heart_rate, systolic, diastolic, oxygen, patient_state, notes)| {
            Ok(VitalsCheckRow {
                stamp: stamp_from_cols(stamp)?,
                heart_rate: heart_rate.map(|v| v as i32),
                systolic: systolic.map(|v| v as i32),
                diastolic: diastolic.map(|v| v as i32),
                oxygen_saturation: oxygen.map(|v| v as i32),
                patient_state,
                notes,
            })
        })
        .collect()
}

pub(crate) fn fetch_hospital_admissions(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<HospitalAdmissionRow>, SourceError> {
    let sql = category_sql("hospital_admissions", "a", "a.ward, a.reason, a.notes");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;

    collected
        .into_iter()
        .map(|(stamp, ward, reason, notes)| {
            Ok(HospitalAdmissionRow { stamp: stamp_from_cols(stamp)?, ward, reason, notes })
        })
        .collect()
}

pub(crate) fn fetch_hospital_discharges(
    conn: &Connection,
    patient_id: Uuid,
    filter: &SourceFilter,
) -> Result<Vec<HospitalDischargeRow>, SourceError> {
    let sql = category_sql("hospital_discharges", "d", "d.destination, d.summary, d.notes");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(window_params(patient_id, filter)), |row| {
        Ok((
            read_stamp_cols(row)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;
    let collected = rows.collect::<Result<Vec<_>, _>>()?;

    collected
        .into_iter()
        .map(|(stamp, destination, summary, notes)| {
            Ok(HospitalDischargeRow { stamp: stamp_from_cols(stamp)?, destination, summary, notes })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sources::open_memory_database;

    pub(crate) fn seed_patient(conn: &Connection, id: Uuid, given: &str, first: &str) {
        conn.execute(
            "INSERT INTO patients (id, given_names, first_surname, second_surname, national_id, birth_date, sex, legal_address, email, personal_phone, emergency_phone)
             VALUES (?1, ?2, ?3, NULL, '40582934', '1988-04-02', 'female', 'Av. Arequipa 1200', 'ana@example.com', '+51 999 111 222', '+51 999 333 444')",
            params![id.to_string(), given, first],
        )
        .unwrap();
    }

    pub(crate) fn seed_chain(conn: &Connection, patient_id: Uuid) -> (Uuid, Uuid) {
        let profile_id = Uuid::new_v4();
        let history_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO medical_profiles (id, patient_id, blood_type, residence_environment)
             VALUES (?1, ?2, 'o_positive', 'urban')",
            params![profile_id.to_string(), patient_id.to_string()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO medical_histories (id, profile_id, created_on, status)
             VALUES (?1, ?2, '2023-06-01', 'active')",
            params![history_id.to_string(), profile_id.to_string()],
        )
        .unwrap();
        (profile_id, history_id)
    }

    pub(crate) fn seed_provider(conn: &Connection, id: Uuid, name: &str, specialty: &str) {
        conn.execute(
            "INSERT INTO providers (id, name, specialty) VALUES (?1, ?2, ?3)",
            params![id.to_string(), name, specialty],
        )
        .unwrap();
    }

    pub(crate) fn seed_event(
        conn: &Connection,
        id: Uuid,
        patient_id: Uuid,
        provider_id: Option<Uuid>,
        date: Option<&str>,
        start_time: Option<&str>,
    ) {
        conn.execute(
            "INSERT INTO service_events (id, patient_id, provider_id, date, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
            params![
                id.to_string(),
                patient_id.to_string(),
                provider_id.map(|p| p.to_string()),
                date,
                start_time
            ],
        )
        .unwrap();
    }

    pub(crate) fn seed_consultation(conn: &Connection, id: Uuid, event_id: Uuid, reason: &str) {
        conn.execute(
            "INSERT INTO consultations (id, event_id, reason, observations)
             VALUES (?1, ?2, ?3, NULL)",
            params![id.to_string(), event_id.to_string(), reason],
        )
        .unwrap();
    }

    pub(crate) fn seed_lab_exam(conn: &Connection, id: Uuid, event_id: Uuid, result: &str) {
        conn.execute(
            "INSERT INTO lab_exams (id, event_id, procedure_description, lab_type, result, description)
             VALUES (?1, ?2, 'Blood panel', 'hematology', ?3, NULL)",
            params![id.to_string(), event_id.to_string(), result],
        )
        .unwrap();
    }

    fn store_with<F: FnOnce(&Connection)>(seed: F) -> SqliteStore {
        let conn = open_memory_database().unwrap();
        seed(&conn);
        SqliteStore::from_connection(conn)
    }

    #[tokio::test]
    async fn identity_fetch_round_trip() {
        let patient_id = Uuid::new_v4();
        let store = store_with(|conn| seed_patient(conn, patient_id, "Ana María", "Torres"));

        let identity = store.identity(patient_id).await.unwrap().unwrap();
        assert_eq!(identity.id, patient_id);
        assert_eq!(identity.display_name(), "Ana María Torres");
        assert_eq!(identity.sex, Sex::Female);
        assert_eq!(identity.legal_address.as_deref(), Some("Av. Arequipa 1200"));
    }

    #[tokio::test]
    async fn identity_miss_is_none_not_error() {
        let store = store_with(|_| {});
        assert!(store.identity(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_chain_resolves() {
        let patient_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        let (profile_id, history_id) = seed_chain(&conn, patient_id);
        let store = SqliteStore::from_connection(conn);

        let history = store.history(history_id).await.unwrap().unwrap();
        assert_eq!(history.profile_id, profile_id);
        assert_eq!(history.status, HistoryStatus::Active);

        let profile = store.profile(profile_id).await.unwrap().unwrap();
        assert_eq!(profile.blood_type, BloodType::OPositive);
    }

    #[tokio::test]
    async fn profile_allergies_deduped_by_id() {
        let patient_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        let (profile_id, _) = seed_chain(&conn, patient_id);
        let allergy_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO allergies (id, name, allergen_component) VALUES (?1, 'Penicillin', 'beta-lactam')",
            params![allergy_id.to_string()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO profile_allergies (profile_id, allergy_id) VALUES (?1, ?2)",
            params![profile_id.to_string(), allergy_id.to_string()],
        )
        .unwrap();
        let store = SqliteStore::from_connection(conn);

        let profile = store.profile(profile_id).await.unwrap().unwrap();
        assert_eq!(profile.allergies.len(), 1);
        assert_eq!(profile.allergies[0].name, "Penicillin");
    }

    #[tokio::test]
    async fn index_row_last_update_prefers_latest_event() {
        let patient_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        seed_chain(&conn, patient_id);
        seed_event(&conn, Uuid::new_v4(), patient_id, None, Some("2024-02-10"), None);
        seed_event(&conn, Uuid::new_v4(), patient_id, None, Some("2024-05-01"), None);
        let store = SqliteStore::from_connection(conn);

        let row = store.index_row(patient_id).await.unwrap().unwrap();
        assert_eq!(row.last_update, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[tokio::test]
    async fn index_row_falls_back_to_history_creation_date() {
        let patient_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        seed_chain(&conn, patient_id);
        let store = SqliteStore::from_connection(conn);

        let row = store.index_row(patient_id).await.unwrap().unwrap();
        assert_eq!(row.last_update, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }

    #[tokio::test]
    async fn index_row_none_without_history() {
        let patient_id = Uuid::new_v4();
        let store = store_with(|conn| seed_patient(conn, patient_id, "Ana", "Torres"));
        assert!(store.index_row(patient_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn index_rows_capped_in_store_order() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            let patient_id = Uuid::new_v4();
            seed_patient(&conn, patient_id, &format!("Patient{i}"), "Torres");
            seed_chain(&conn, patient_id);
        }
        let store = SqliteStore::from_connection(conn);

        let rows = store.index_rows(3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].patient_display_name, "Patient0 Torres");
        assert_eq!(rows[2].patient_display_name, "Patient2 Torres");
    }

    #[tokio::test]
    async fn consultation_rows_pre_join_provider() {
        let patient_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let provider_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        seed_provider(&conn, provider_id, "Dr. Chen", "Cardiology");
        seed_event(&conn, event_id, patient_id, Some(provider_id), Some("2024-01-10"), Some("09:00:00"));
        seed_consultation(&conn, Uuid::new_v4(), event_id, "Chest pain");
        let store = SqliteStore::from_connection(conn);

        let sources = store.category_sources();
        let consultations = sources
            .iter()
            .find(|s| s.category() == EventCategory::Consultation)
            .unwrap();
        let rows = consultations
            .fetch_rows(patient_id, &SourceFilter::default())
            .await
            .unwrap();

        match rows {
            CategoryRows::Consultations(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].stamp.encounter_id, event_id);
                assert_eq!(rows[0].stamp.provider_name.as_deref(), Some("Dr. Chen"));
                assert_eq!(rows[0].stamp.provider_specialty.as_deref(), Some("Cardiology"));
                assert_eq!(rows[0].reason.as_deref(), Some("Chest pain"));
            }
            other => panic!("wrong batch kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn consultation_children_load_with_clamped_symptom_severity() {
        let patient_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let consultation_id = Uuid::new_v4();
        let diagnosis_id = Uuid::new_v4();
        let treatment_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        seed_event(&conn, event_id, patient_id, None, Some("2024-01-10"), None);
        seed_consultation(&conn, consultation_id, event_id, "Fever");
        conn.execute(
            "INSERT INTO diagnoses (id, consultation_id, detail, morbidity_description, morbidity_kind, morbidity_severity, morbidity_contagious, morbidity_classification_code)
             VALUES (?1, ?2, 'Viral infection', 'Influenza', 'acute', 'moderate', 1, 'J11')",
            params![diagnosis_id.to_string(), consultation_id.to_string()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO symptoms (id, diagnosis_id, name, severity) VALUES (?1, ?2, 'Fever', 14)",
            params![Uuid::new_v4().to_string(), diagnosis_id.to_string()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO treatments (id, consultation_id, reason, duration_quantity, duration_unit)
             VALUES (?1, ?2, 'Antiviral course', 5, 'days')",
            params![treatment_id.to_string(), consultation_id.to_string()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO treatment_medications (id, treatment_id, commercial_name, dose_quantity, frequency)
             VALUES (?1, ?2, 'Tamiflu', '75mg', 'twice daily')",
            params![Uuid::new_v4().to_string(), treatment_id.to_string()],
        )
        .unwrap();
        let store = SqliteStore::from_connection(conn);

        let rows = fetch_wrap(&store, patient_id).await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.diagnoses.len(), 1);
        let morbidity = row.diagnoses[0].morbidity.as_ref().unwrap();
        assert_eq!(morbidity.kind, MorbidityKind::Acute);
        assert!(morbidity.contagious);
        // Out-of-range severity clamps to the 0-10 scale
        assert_eq!(row.diagnoses[0].symptoms[0].severity, 10);
        assert_eq!(row.treatments.len(), 1);
        assert_eq!(row.treatments[0].duration_unit, Some(DurationUnit::Days));
        assert_eq!(row.treatments[0].medications[0].commercial_name, "Tamiflu");
    }

    async fn fetch_wrap(store: &SqliteStore, patient_id: Uuid) -> Vec<ConsultationRow> {
        let sources = store.category_sources();
        let src = sources
            .iter()
            .find(|s| s.category() == EventCategory::Consultation)
            .unwrap();
        match src.fetch_rows(patient_id, &SourceFilter::default()).await.unwrap() {
            CategoryRows::Consultations(rows) => rows,
            other => panic!("wrong batch kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn date_window_filters_rows() {
        let patient_id = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_id, "Ana", "Torres");
        let early = Uuid::new_v4();
        let late = Uuid::new_v4();
        seed_event(&conn, early, patient_id, None, Some("2024-01-01"), None);
        seed_event(&conn, late, patient_id, None, Some("2024-03-01"), None);
        seed_lab_exam(&conn, Uuid::new_v4(), early, "normal");
        seed_lab_exam(&conn, Uuid::new_v4(), late, "normal");
        let store = SqliteStore::from_connection(conn);

        let sources = store.category_sources();
        let labs = sources.iter().find(|s| s.category() == EventCategory::LabExam).unwrap();
        let filter = SourceFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 2, 1),
            date_to: None,
        };
        let rows = labs.fetch_rows(patient_id, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn other_patients_rows_never_leak() {
        let patient_a = Uuid::new_v4();
        let patient_b = Uuid::new_v4();
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, patient_a, "Ana", "Torres");
        seed_patient(&conn, patient_b, "Luis", "Ramos");
        let event = Uuid::new_v4();
        seed_event(&conn, event, patient_b, None, Some("2024-01-10"), None);
        seed_lab_exam(&conn, Uuid::new_v4(), event, "high");
        let store = SqliteStore::from_connection(conn);

        let sources = store.category_sources();
        let labs = sources.iter().find(|s| s.category() == EventCategory::LabExam).unwrap();
        let rows = labs.fetch_rows(patient_a, &SourceFilter::default()).await.unwrap();
        assert!(rows.is_empty());
    }
}
