pub mod client;
pub mod fetch;
pub mod models;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::schedule::AppointmentCreationRequest;

pub use client::ApiClient;
pub use fetch::{fetch_study_summary, fetch_volunteers, group_enrollment, StudySummary};
pub use models::{Appointment, BatchResponse, Group, Study, StudyVolunteer, Volunteer};

/// The study backend, one method per endpoint this tool consumes
#[async_trait]
pub trait StudyBackend: Send + Sync {
    /// `GET /etudes/{id}`
    async fn study(&self, study_id: i64) -> AppResult<Study>;
    /// `GET /etude-volontaires/etude/{studyId}`
    async fn study_volunteers(&self, study_id: i64) -> AppResult<Vec<StudyVolunteer>>;
    /// `GET /volontaires/{id}`
    async fn volunteer(&self, volunteer_id: i64) -> AppResult<Volunteer>;
    /// `GET /groupes/etude/{studyId}`
    async fn study_groups(&self, study_id: i64) -> AppResult<Vec<Group>>;
    /// `GET /rdvs/search?idEtude=`
    async fn study_appointments(&self, study_id: i64) -> AppResult<Vec<Appointment>>;
    /// `POST /rdvs/batch`
    async fn create_appointments(
        &self,
        requests: &[AppointmentCreationRequest],
    ) -> AppResult<BatchResponse>;
}
