use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::capacity::{reconcile_capacity, CapacityStatus};
use super::slot_utils::calculate_requested_slots;
use super::types::{AppointmentCreationRequest, DateSlotConfiguration, SlotWindow, PLANNED_STATUS};
use crate::api::BatchResponse;
use crate::error::ValidationError;

/// Longest accepted gap between two appointments
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;
/// Most appointments a single (date, slot) cell may ask for
pub const MAX_SLOT_VOLUME: u32 = 200;
/// Most appointments one batch may create
pub const MAX_BATCH_SIZE: u32 = 5000;

/// A configured date that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDate {
    pub date: NaiveDate,
    pub volumes: Vec<u32>,
}

/// Fields shared by every request of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    pub study_id: i64,
    pub group_id: i64,
    pub duration: Option<u32>,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub group_id: i64,
    pub dates: Vec<PlannedDate>,
}

/// Checks everything that must hold before a batch is assembled
pub fn validate_batch(
    group_id: Option<i64>,
    dates: &[DateSlotConfiguration],
    capacity: &CapacityStatus,
    confirmed: bool,
) -> Result<ValidatedBatch, ValidationError> {
    let group_id = group_id.ok_or(ValidationError::NoGroupSelected)?;
    if dates.is_empty() {
        return Err(ValidationError::NoDates);
    }

    let mut planned = Vec::with_capacity(dates.len());
    for (i, config) in dates.iter().enumerate() {
        let index = i + 1;
        if !config.is_complete() {
            return Err(ValidationError::IncompleteDate { index });
        }
        if let Some(&volume) = config.slots.iter().find(|&&v| v > MAX_SLOT_VOLUME) {
            return Err(ValidationError::VolumeTooLarge {
                index,
                volume,
                max: MAX_SLOT_VOLUME,
            });
        }
        let date = config.to_date().ok_or_else(|| ValidationError::InvalidDate {
            index,
            value: format!("{}/{}/{}", config.day.trim(), config.month.trim(), config.year.trim()),
        })?;
        planned.push(PlannedDate {
            date,
            volumes: config.slots.clone(),
        });
    }

    if *capacity == CapacityStatus::Empty {
        return Err(ValidationError::NothingRequested);
    }
    if capacity.requires_confirmation() && !confirmed {
        return Err(ValidationError::unconfirmed(capacity));
    }

    Ok(ValidatedBatch {
        group_id,
        dates: planned,
    })
}

/// Expands dates x labels x volume into one request per requested slot
///
/// Each non-zero cell emits `volume` identical requests; volumes past the last
/// label are ignored.
pub fn assemble_batch(
    settings: &BatchSettings,
    dates: &[PlannedDate],
    labels: &[String],
) -> Vec<AppointmentCreationRequest> {
    let mut requests = Vec::new();
    for planned in dates {
        let date = planned.date.format("%Y-%m-%d").to_string();
        for (label, &volume) in labels.iter().zip(planned.volumes.iter()) {
            for _ in 0..volume {
                requests.push(AppointmentCreationRequest {
                    study_id: settings.study_id,
                    group_id: settings.group_id,
                    date: date.clone(),
                    time: label.clone(),
                    duration: settings.duration,
                    comments: settings.comments.clone(),
                    status: PLANNED_STATUS.to_string(),
                });
            }
        }
    }
    requests
}

/// Everything the batch-creation form submits
#[derive(Debug, Clone, Deserialize)]
pub struct BatchForm {
    pub study_id: i64,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(flatten)]
    pub window: SlotWindow,
    pub dates: Vec<DateSlotConfiguration>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub confirmed: bool,
}

impl BatchForm {
    /// Reconciles the requested volume against the group's enrolled subjects
    pub fn capacity(&self, labels: &[String], enrolled: u32) -> CapacityStatus {
        let requested = calculate_requested_slots(&self.dates, labels.len());
        reconcile_capacity(requested, enrolled, self.group_id.is_some())
    }

    /// Validates the form and expands it into individual creation requests
    pub fn build_requests(
        &self,
        enrolled: u32,
    ) -> Result<Vec<AppointmentCreationRequest>, ValidationError> {
        let interval = self.window.interval().total_minutes();
        if interval > MAX_INTERVAL_MINUTES {
            return Err(ValidationError::IntervalTooLong { minutes: interval });
        }
        let labels = self.window.labels();
        if labels.is_empty() {
            return Err(ValidationError::NoSlots);
        }
        let requested = calculate_requested_slots(&self.dates, labels.len());
        if requested > MAX_BATCH_SIZE {
            return Err(ValidationError::BatchTooLarge {
                requested,
                max: MAX_BATCH_SIZE,
            });
        }
        let capacity = self.capacity(&labels, enrolled);
        let batch = validate_batch(self.group_id, &self.dates, &capacity, self.confirmed)?;
        let settings = BatchSettings {
            study_id: self.study_id,
            group_id: batch.group_id,
            duration: self.window.interval().duration_minutes(),
            comments: self.comments.clone(),
        };
        Ok(assemble_batch(&settings, &batch.dates, &labels))
    }
}

/// What the user is told after the backend answered a batch submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BatchOutcome {
    Complete { created: u32 },
    Partial { created: u32, total: u32, errors: Vec<String> },
    Failed { errors: String },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, BatchOutcome::Failed { .. })
    }

    pub fn message(&self) -> String {
        match self {
            BatchOutcome::Complete { created } => format!("{} appointment(s) created", created),
            BatchOutcome::Partial { created, total, errors } => format!(
                "{}/{} appointment(s) created, {} error(s): {}",
                created,
                total,
                errors.len(),
                errors.join("; ")
            ),
            BatchOutcome::Failed { errors } if errors.is_empty() => {
                "No appointment was created".to_string()
            }
            BatchOutcome::Failed { errors } => format!("No appointment was created: {}", errors),
        }
    }
}

/// Any reported error downgrades a batch to `Partial`, even when every request was created
pub fn classify_batch_response(response: &BatchResponse) -> BatchOutcome {
    if response.created == 0 {
        BatchOutcome::Failed {
            errors: response.errors.join("; "),
        }
    } else if response.created < response.total || !response.errors.is_empty() {
        BatchOutcome::Partial {
            created: response.created,
            total: response.total,
            errors: response.errors.clone(),
        }
    } else {
        BatchOutcome::Complete {
            created: response.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BatchSettings {
        BatchSettings {
            study_id: 42,
            group_id: 7,
            duration: Some(30),
            comments: "T0".to_string(),
        }
    }

    fn labels() -> Vec<String> {
        vec!["08h00".into(), "08h30".into(), "09h00".into()]
    }

    #[test]
    fn emits_volume_copies_per_cell() {
        let dates = vec![
            PlannedDate {
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                volumes: vec![2, 0, 1],
            },
            PlannedDate {
                date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
                volumes: vec![2, 0, 1],
            },
        ];
        let requests = assemble_batch(&settings(), &dates, &labels());
        assert_eq!(requests.len(), 6);

        let first_day: Vec<(&str, &str)> = requests[..3]
            .iter()
            .map(|r| (r.date.as_str(), r.time.as_str()))
            .collect();
        assert_eq!(
            first_day,
            vec![
                ("2024-01-10", "08h00"),
                ("2024-01-10", "08h00"),
                ("2024-01-10", "09h00")
            ]
        );
        assert!(requests[3..].iter().all(|r| r.date == "2024-01-11"));
        assert!(requests
            .iter()
            .all(|r| r.status == "PLANIFIE" && r.group_id == 7 && r.duration == Some(30)));
    }

    #[test]
    fn volumes_beyond_labels_are_ignored() {
        let dates = vec![PlannedDate {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            volumes: vec![1, 1, 1, 5],
        }];
        assert_eq!(assemble_batch(&settings(), &dates, &labels()).len(), 3);
    }

    #[test]
    fn validation_requires_group_and_complete_dates() {
        let perfect = reconcile_capacity(3, 3, true);
        let dates = vec![DateSlotConfiguration::new("2024", "", "10", vec![1])];
        assert_eq!(
            validate_batch(None, &dates, &perfect, false),
            Err(ValidationError::NoGroupSelected)
        );
        assert_eq!(
            validate_batch(Some(1), &dates, &perfect, false),
            Err(ValidationError::IncompleteDate { index: 1 })
        );
        let bad = vec![DateSlotConfiguration::new("2024", "2", "30", vec![1])];
        assert!(matches!(
            validate_batch(Some(1), &bad, &perfect, false),
            Err(ValidationError::InvalidDate { index: 1, .. })
        ));
    }

    #[test]
    fn shortage_needs_confirmation() {
        let shortage = reconcile_capacity(7, 5, true);
        let dates = vec![DateSlotConfiguration::new("2024", "1", "10", vec![7])];
        assert!(matches!(
            validate_batch(Some(1), &dates, &shortage, false),
            Err(ValidationError::CapacityNotConfirmed(_))
        ));
        let batch = validate_batch(Some(1), &dates, &shortage, true).unwrap();
        assert_eq!(batch.dates[0].date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn form_builds_requests_with_interval_duration() {
        let form: BatchForm = serde_json::from_value(serde_json::json!({
            "study_id": 42,
            "group_id": 7,
            "start_hour": 8, "start_minute": 0,
            "end_hour": 10, "end_minute": 0,
            "interval_hours": 0, "interval_minutes": 30,
            "dates": [
                {"day": "10", "month": "01", "year": "2024", "slots": [1, 1, 0, 1]}
            ],
            "comments": "visite T0"
        }))
        .unwrap();
        let requests = form.build_requests(3).unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].time, "09h30");
        assert!(requests.iter().all(|r| r.duration == Some(30)));
    }

    #[test]
    fn form_without_slots_is_rejected() {
        let form: BatchForm = serde_json::from_value(serde_json::json!({
            "study_id": 42,
            "group_id": 7,
            "start_hour": 10, "start_minute": 0,
            "end_hour": 9, "end_minute": 0,
            "dates": [{"day": "10", "month": "01", "year": "2024", "slots": [1]}]
        }))
        .unwrap();
        assert_eq!(form.build_requests(1), Err(ValidationError::NoSlots));
    }

    #[test]
    fn classifies_backend_counts() {
        let failed = classify_batch_response(&BatchResponse {
            created: 0,
            total: 3,
            errors: vec!["group closed".into(), "study locked".into()],
        });
        assert_eq!(
            failed,
            BatchOutcome::Failed {
                errors: "group closed; study locked".into()
            }
        );
        assert!(!failed.is_success());

        let partial = classify_batch_response(&BatchResponse {
            created: 2,
            total: 3,
            errors: vec!["slot 3 rejected".into()],
        });
        assert!(matches!(partial, BatchOutcome::Partial { created: 2, total: 3, .. }));
        assert!(partial.is_success());

        let complete = classify_batch_response(&BatchResponse {
            created: 3,
            total: 3,
            errors: vec![],
        });
        assert_eq!(complete, BatchOutcome::Complete { created: 3 });
    }

    #[test]
    fn errors_are_kept_when_counts_match() {
        let outcome = classify_batch_response(&BatchResponse {
            created: 2,
            total: 2,
            errors: vec!["slot full".into()],
        });
        assert_eq!(
            outcome,
            BatchOutcome::Partial {
                created: 2,
                total: 2,
                errors: vec!["slot full".into()]
            }
        );
        assert!(outcome.message().contains("slot full"));
    }

    fn form(extra: serde_json::Value) -> BatchForm {
        let mut value = serde_json::json!({
            "study_id": 42,
            "group_id": 7,
            "start_hour": 8, "start_minute": 0,
            "end_hour": 10, "end_minute": 0,
            "interval_hours": 0, "interval_minutes": 30,
            "dates": [{"day": "10", "month": "01", "year": "2024", "slots": [1, 1]}]
        });
        for (key, field) in extra.as_object().unwrap() {
            value[key] = field.clone();
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let huge = form(serde_json::json!({"interval_hours": u32::MAX / 30}));
        assert_eq!(
            huge.build_requests(2),
            Err(ValidationError::IntervalTooLong { minutes: u32::MAX })
        );
        let over_a_day = form(serde_json::json!({"interval_hours": 24, "interval_minutes": 1}));
        assert!(matches!(
            over_a_day.build_requests(2),
            Err(ValidationError::IntervalTooLong { minutes: 1441 })
        ));
    }

    #[test]
    fn oversized_volumes_are_rejected_before_assembly() {
        let huge = form(serde_json::json!({
            "dates": [{"day": "10", "month": "01", "year": "2024", "slots": [u32::MAX, 0]}],
            "confirmed": true
        }));
        assert_eq!(
            huge.build_requests(2),
            Err(ValidationError::BatchTooLarge {
                requested: u32::MAX,
                max: MAX_BATCH_SIZE
            })
        );

        let cell = form(serde_json::json!({
            "dates": [{"day": "10", "month": "01", "year": "2024", "slots": [MAX_SLOT_VOLUME + 1, 0]}],
            "confirmed": true
        }));
        assert!(matches!(
            cell.build_requests(2),
            Err(ValidationError::VolumeTooLarge { index: 1, .. })
        ));
    }

    #[test]
    fn zero_volume_batch_is_rejected() {
        let empty = form(serde_json::json!({
            "dates": [{"day": "10", "month": "01", "year": "2024", "slots": [0, 0]}]
        }));
        assert_eq!(empty.build_requests(4), Err(ValidationError::NothingRequested));
    }
}
