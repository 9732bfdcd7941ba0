//! Strict records for every backend response, and the one boundary function per
//! endpoint that turns loosely-shaped JSON into them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: i64,
    pub reference: String,
    pub title: String,
}

/// Association between a volunteer and a study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyVolunteer {
    pub volunteer_id: i64,
    pub subject_number: Option<String>,
    pub status: Option<String>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub phototype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub label: String,
    pub enrolled_subjects: u32,
    /// Indemnity paid per visit
    pub indemnity: Option<f64>,
}

/// A rendez-vous, optionally assigned to a volunteer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Option<i64>,
    pub study_id: Option<i64>,
    pub group_id: Option<i64>,
    pub volunteer_id: Option<i64>,
    pub date: String,
    pub time: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub created: u32,
    pub total: u32,
    pub errors: Vec<String>,
}

const LIST_WRAPPERS: [&str; 4] = ["content", "data", "items", "results"];

/// Unwraps a list response: bare array, wrapper object, single object or null
pub fn records(value: Value) -> Vec<Map<String, Value>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(mut map) => {
            for key in LIST_WRAPPERS {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(inner) = map.remove(key) {
                        return records(inner);
                    }
                }
            }
            vec![map]
        }
        _ => Vec::new(),
    }
}

/// Unwraps a single-record response, which some endpoints wrap in `data`
fn single_record(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(inner)) => Some(inner),
            Some(other) => {
                map.insert("data".to_string(), other);
                Some(map)
            }
            None => Some(map),
        },
        Value::Array(items) => items.into_iter().find_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    }
}

fn field_i64(map: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(inner) => field_i64(inner, &["id"]),
        _ => None,
    })
}

fn field_f64(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    })
}

fn field_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn field_strings(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn field_count(map: &Map<String, Value>, key: &str) -> u32 {
    field_i64(map, &[key])
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

pub fn parse_study(value: Value) -> Option<Study> {
    let map = single_record(value)?;
    let id = field_i64(&map, &["idEtude", "id"])?;
    Some(Study {
        id,
        reference: field_string(&map, &["ref", "reference", "refEtude"]).unwrap_or_default(),
        title: field_string(&map, &["titre", "title", "libelle"]).unwrap_or_default(),
    })
}

pub fn parse_study_volunteers(value: Value) -> Vec<StudyVolunteer> {
    records(value)
        .into_iter()
        .filter_map(|map| {
            let volunteer_id = field_i64(&map, &["idVolontaire", "idVol", "volontaire"]);
            if volunteer_id.is_none() {
                tracing::debug!("dropping study association without volunteer id");
            }
            Some(StudyVolunteer {
                volunteer_id: volunteer_id?,
                subject_number: field_string(&map, &["numsujet", "numSujet"]),
                status: field_string(&map, &["statut", "status"]),
                group_id: field_i64(&map, &["idGroupe", "groupe"]),
            })
        })
        .collect()
}

pub fn parse_volunteer(value: Value) -> Option<Volunteer> {
    let map = single_record(value)?;
    let id = field_i64(&map, &["idVol", "idVolontaire", "id"])?;
    Some(Volunteer {
        id,
        last_name: field_string(&map, &["nomVol", "nom"]).unwrap_or_default(),
        first_name: field_string(&map, &["prenomVol", "prenom"]).unwrap_or_default(),
        phone: field_string(&map, &["telPortableVol", "telDomicileVol", "telephone"]),
        email: field_string(&map, &["emailVol", "email"]),
        phototype: field_string(&map, &["phototype", "phototypeVol"]),
    })
}

pub fn parse_groups(value: Value) -> Vec<Group> {
    records(value)
        .into_iter()
        .filter_map(|map| {
            let Some(id) = field_i64(&map, &["idGroupe", "id"]) else {
                tracing::debug!("dropping group without id");
                return None;
            };
            Some(Group {
                id,
                label: field_string(&map, &["intitule", "libelle"]).unwrap_or_default(),
                enrolled_subjects: field_count(&map, "nbSujet"),
                indemnity: field_f64(&map, &["iv", "IV", "indemnite"]),
            })
        })
        .collect()
}

pub fn parse_appointments(value: Value) -> Vec<Appointment> {
    records(value)
        .into_iter()
        .filter_map(|map| {
            let Some(date) = field_string(&map, &["date", "dateRdv"]) else {
                tracing::debug!("dropping appointment without date");
                return None;
            };
            Some(Appointment {
                id: field_i64(&map, &["idRdv", "id"]),
                study_id: field_i64(&map, &["idEtude", "etude"]),
                group_id: field_i64(&map, &["idGroupe", "groupe"]),
                volunteer_id: field_i64(&map, &["idVolontaire", "idVol", "volontaire"]),
                // Some endpoints send a full timestamp; only the day is kept
                date: date.chars().take(10).collect(),
                time: field_string(&map, &["heure", "time"]),
                status: field_string(&map, &["etat", "status"]),
            })
        })
        .collect()
}

/// Reads the batch answer; a missing `total` falls back to the number of requests sent
pub fn parse_batch_response(value: Value, sent: u32) -> BatchResponse {
    let map = single_record(value).unwrap_or_default();
    BatchResponse {
        created: field_count(&map, "created"),
        total: field_i64(&map, &["total"])
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(sent),
        errors: field_strings(&map, "errors"),
    }
}
