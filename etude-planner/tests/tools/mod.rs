#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use etude_planner::api::{
    Appointment, BatchResponse, Group, Study, StudyBackend, StudyVolunteer, Volunteer,
};
use etude_planner::error::{AppError, AppResult};
use etude_planner::schedule::AppointmentCreationRequest;

/// In-memory backend seeded per test
#[derive(Default)]
pub struct FakeBackend {
    pub studies: HashMap<i64, Study>,
    pub associations: HashMap<i64, Vec<StudyVolunteer>>,
    pub volunteers: HashMap<i64, Volunteer>,
    pub groups: HashMap<i64, Vec<Group>>,
    pub appointments: HashMap<i64, Vec<Appointment>>,
    /// Volunteer ids whose detail fetch fails
    pub failing_volunteers: Vec<i64>,
    /// Answer returned by `create_appointments`; defaults to "all created"
    pub batch_response: Option<BatchResponse>,
    /// Delay applied to every group fetch
    pub group_delay: Option<Duration>,
    pub submitted: Mutex<Vec<AppointmentCreationRequest>>,
}

impl FakeBackend {
    pub fn submitted(&self) -> Vec<AppointmentCreationRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudyBackend for FakeBackend {
    async fn study(&self, study_id: i64) -> AppResult<Study> {
        self.studies
            .get(&study_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("study {}", study_id)))
    }

    async fn study_volunteers(&self, study_id: i64) -> AppResult<Vec<StudyVolunteer>> {
        Ok(self.associations.get(&study_id).cloned().unwrap_or_default())
    }

    async fn volunteer(&self, volunteer_id: i64) -> AppResult<Volunteer> {
        if self.failing_volunteers.contains(&volunteer_id) {
            return Err(AppError::Status {
                status: 500,
                url: format!("/volontaires/{}", volunteer_id),
            });
        }
        self.volunteers
            .get(&volunteer_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("volunteer {}", volunteer_id)))
    }

    async fn study_groups(&self, study_id: i64) -> AppResult<Vec<Group>> {
        if let Some(delay) = self.group_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.groups.get(&study_id).cloned().unwrap_or_default())
    }

    async fn study_appointments(&self, study_id: i64) -> AppResult<Vec<Appointment>> {
        Ok(self.appointments.get(&study_id).cloned().unwrap_or_default())
    }

    async fn create_appointments(
        &self,
        requests: &[AppointmentCreationRequest],
    ) -> AppResult<BatchResponse> {
        self.submitted.lock().unwrap().extend_from_slice(requests);
        Ok(self.batch_response.clone().unwrap_or(BatchResponse {
            created: requests.len() as u32,
            total: requests.len() as u32,
            errors: Vec::new(),
        }))
    }
}

pub fn study(id: i64, reference: &str) -> Study {
    Study {
        id,
        reference: reference.to_string(),
        title: format!("Tolérance {}", reference),
    }
}

pub fn association(volunteer_id: i64, subject_number: &str, status: &str, group_id: i64) -> StudyVolunteer {
    StudyVolunteer {
        volunteer_id,
        subject_number: Some(subject_number.to_string()),
        status: Some(status.to_string()),
        group_id: Some(group_id),
    }
}

pub fn volunteer(id: i64, last_name: &str, first_name: &str, email: &str) -> Volunteer {
    Volunteer {
        id,
        last_name: last_name.to_string(),
        first_name: first_name.to_string(),
        phone: Some(format!("06000000{:02}", id)),
        email: Some(email.to_string()),
        phototype: Some("III".to_string()),
    }
}

pub fn group(id: i64, label: &str, enrolled_subjects: u32) -> Group {
    Group {
        id,
        label: label.to_string(),
        enrolled_subjects,
        indemnity: Some(50.0),
    }
}

pub fn appointment(study_id: i64, volunteer_id: Option<i64>, date: &str, time: &str) -> Appointment {
    Appointment {
        study_id: Some(study_id),
        group_id: Some(1),
        volunteer_id,
        date: date.to_string(),
        time: Some(time.to_string()),
        ..Appointment::default()
    }
}

/// Study 1 with two volunteers: 1 has two visits, 2 has one, plus an unassigned slot
pub fn seeded_backend() -> FakeBackend {
    let mut backend = FakeBackend::default();
    backend.studies.insert(1, study(1, "E24-001"));
    backend.associations.insert(
        1,
        vec![association(1, "1", "INSCRIT", 1), association(2, "2", "PENALITE", 1)],
    );
    backend.volunteers.insert(1, volunteer(1, "Martin", "Julie", "julie@x.fr"));
    backend.volunteers.insert(2, volunteer(2, "Durand", "Paul", "paul@x.fr"));
    backend.groups.insert(1, vec![group(1, "G1", 3)]);
    backend.appointments.insert(
        1,
        vec![
            appointment(1, Some(1), "2024-01-12", "10h00"),
            appointment(1, Some(2), "2024-01-11", "11h00"),
            appointment(1, Some(1), "2024-01-10", "09h00"),
            appointment(1, None, "2024-01-13", "08h00"),
        ],
    );
    backend
}
