use std::collections::{HashMap, HashSet};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::api::{fetch_volunteers, StudyBackend, StudyVolunteer, Volunteer};
use crate::error::AppResult;

/// Characters `encodeURIComponent` leaves untouched
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// E-mail addresses of a group's volunteers, in association order, without duplicates
pub fn group_recipients(
    associations: &[StudyVolunteer],
    volunteers: &HashMap<i64, Volunteer>,
    group_id: i64,
) -> Vec<String> {
    let mut seen = HashSet::new();
    associations
        .iter()
        .filter(|a| a.group_id == Some(group_id))
        .filter_map(|a| volunteers.get(&a.volunteer_id)?.email.as_deref())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .filter(|email| seen.insert(email.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Builds a `mailto:` URI with `;`-joined recipients and an encoded subject and body
pub fn build_group_mailto(recipients: &[String], subject: &str, body: &str) -> String {
    let mut uri = format!("mailto:{}", recipients.join(";"));
    let mut params = Vec::new();
    if !subject.is_empty() {
        params.push(format!("subject={}", utf8_percent_encode(subject, URI_COMPONENT)));
    }
    if !body.is_empty() {
        params.push(format!("body={}", utf8_percent_encode(body, URI_COMPONENT)));
    }
    if !params.is_empty() {
        uri.push('?');
        uri.push_str(&params.join("&"));
    }
    uri
}

/// Fetches a group's volunteers and composes the e-mail URI for them
pub async fn compose_group_mailto(
    backend: &dyn StudyBackend,
    study_id: i64,
    group_id: i64,
    subject: &str,
    body: &str,
    concurrency: usize,
) -> AppResult<String> {
    let associations = backend.study_volunteers(study_id).await?;
    let ids: Vec<i64> = associations
        .iter()
        .filter(|a| a.group_id == Some(group_id))
        .map(|a| a.volunteer_id)
        .collect();
    let volunteers: HashMap<i64, Volunteer> = fetch_volunteers(backend, &ids, concurrency)
        .await
        .into_iter()
        .filter_map(|(id, result)| Some((id, result.ok()?)))
        .collect();
    let recipients = group_recipients(&associations, &volunteers, group_id);
    tracing::info!(study_id, group_id, recipients = recipients.len(), "group mailto composed");
    Ok(build_group_mailto(&recipients, subject, body))
}
