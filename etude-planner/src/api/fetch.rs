use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use super::{StudyBackend, Volunteer};
use crate::error::{AppError, AppResult};

/// Fetches volunteer details with at most `concurrency` requests in flight.
///
/// Returns one result per id, in completion order. A failed fetch is logged and
/// reported in place; it never aborts the others.
pub async fn fetch_volunteers(
    backend: &dyn StudyBackend,
    ids: &[i64],
    concurrency: usize,
) -> Vec<(i64, AppResult<Volunteer>)> {
    stream::iter(ids.iter().copied())
        .map(|id| async move {
            let result = backend.volunteer(id).await;
            if let Err(e) = &result {
                tracing::warn!(volunteer_id = id, error = %e, "volunteer details unavailable");
            }
            (id, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

/// Enrolled subjects of the selected group; 0 when no group is selected.
///
/// A group id the study does not know is `NotFound`, so nothing is ever
/// submitted against it.
pub async fn group_enrollment(
    backend: &dyn StudyBackend,
    study_id: i64,
    group_id: Option<i64>,
) -> AppResult<u32> {
    let Some(group_id) = group_id else {
        return Ok(0);
    };
    backend
        .study_groups(study_id)
        .await?
        .into_iter()
        .find(|g| g.id == group_id)
        .map(|g| g.enrolled_subjects)
        .ok_or_else(|| AppError::NotFound(format!("group {} of study {}", group_id, study_id)))
}

/// Headline counts for a study
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySummary {
    pub study_id: i64,
    pub groups: usize,
    pub enrolled_subjects: u32,
    pub volunteers: usize,
    pub appointments: usize,
    pub assigned_appointments: usize,
}

/// Fetches groups, associations and appointments concurrently under one deadline
pub async fn fetch_study_summary(
    backend: &dyn StudyBackend,
    study_id: i64,
    timeout: Duration,
) -> AppResult<StudySummary> {
    let fetch = async {
        tokio::try_join!(
            backend.study_groups(study_id),
            backend.study_volunteers(study_id),
            backend.study_appointments(study_id),
        )
    };
    let (groups, volunteers, appointments) = tokio::time::timeout(timeout, fetch)
        .await
        .map_err(|_| AppError::Timeout {
            operation: format!("summary of study {}", study_id),
            seconds: timeout.as_secs(),
        })??;

    Ok(StudySummary {
        study_id,
        groups: groups.len(),
        enrolled_subjects: groups.iter().map(|g| g.enrolled_subjects).sum(),
        volunteers: volunteers.len(),
        assigned_appointments: appointments
            .iter()
            .filter(|a| a.volunteer_id.is_some())
            .count(),
        appointments: appointments.len(),
    })
}
