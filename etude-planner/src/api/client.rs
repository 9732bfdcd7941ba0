use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::models::{
    parse_appointments, parse_batch_response, parse_groups, parse_study, parse_study_volunteers,
    parse_volunteer,
};
use super::{Appointment, BatchResponse, Group, Study, StudyBackend, StudyVolunteer, Volunteer};
use crate::error::{AppError, AppResult};
use crate::schedule::AppointmentCreationRequest;

/// Thin REST client over the study backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("etude-planner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(response: reqwest::Response) -> AppResult<Value> {
        let status = response.status();
        let url = response.url().to_string();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| AppError::Decode {
            endpoint: url,
            reason: e.to_string(),
        })
    }

    async fn get_json(&self, path: &str) -> AppResult<Value> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> AppResult<Value> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::read_json(response).await
    }
}

fn decode_error(endpoint: &str, reason: &str) -> AppError {
    AppError::Decode {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl StudyBackend for ApiClient {
    #[instrument(skip(self))]
    async fn study(&self, study_id: i64) -> AppResult<Study> {
        let path = format!("/etudes/{}", study_id);
        let value = self.get_json(&path).await?;
        parse_study(value).ok_or_else(|| decode_error(&path, "missing study id"))
    }

    #[instrument(skip(self))]
    async fn study_volunteers(&self, study_id: i64) -> AppResult<Vec<StudyVolunteer>> {
        let value = self
            .get_json(&format!("/etude-volontaires/etude/{}", study_id))
            .await?;
        Ok(parse_study_volunteers(value))
    }

    async fn volunteer(&self, volunteer_id: i64) -> AppResult<Volunteer> {
        let path = format!("/volontaires/{}", volunteer_id);
        let value = self.get_json(&path).await?;
        parse_volunteer(value).ok_or_else(|| decode_error(&path, "missing volunteer id"))
    }

    #[instrument(skip(self))]
    async fn study_groups(&self, study_id: i64) -> AppResult<Vec<Group>> {
        let value = self.get_json(&format!("/groupes/etude/{}", study_id)).await?;
        Ok(parse_groups(value))
    }

    #[instrument(skip(self))]
    async fn study_appointments(&self, study_id: i64) -> AppResult<Vec<Appointment>> {
        let value = self
            .get_json(&format!("/rdvs/search?idEtude={}", study_id))
            .await?;
        Ok(parse_appointments(value))
    }

    #[instrument(skip(self, requests), fields(count = requests.len()))]
    async fn create_appointments(
        &self,
        requests: &[AppointmentCreationRequest],
    ) -> AppResult<BatchResponse> {
        let value = self.post_json("/rdvs/batch", requests).await?;
        let sent = u32::try_from(requests.len()).unwrap_or(u32::MAX);
        Ok(parse_batch_response(value, sent))
    }
}
