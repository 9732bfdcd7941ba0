use std::collections::HashMap;

use crate::api::{StudyVolunteer, Volunteer};
use crate::display::format_volunteer_name;
use crate::error::AppResult;

/// What an export knows about one volunteer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolunteerInfo {
    pub subject_number: Option<String>,
    pub status: Option<String>,
    pub group_id: Option<i64>,
    /// `None` when the detail fetch failed or was never made
    pub details: Option<Volunteer>,
}

impl VolunteerInfo {
    pub fn name(&self) -> String {
        self.details
            .as_ref()
            .map(|v| format_volunteer_name(&v.last_name, &v.first_name))
            .unwrap_or_default()
    }

    pub fn phone(&self) -> String {
        self.detail(|v| v.phone.as_deref())
    }

    pub fn email(&self) -> String {
        self.detail(|v| v.email.as_deref())
    }

    pub fn phototype(&self) -> String {
        self.detail(|v| v.phototype.as_deref())
    }

    fn detail(&self, field: impl Fn(&Volunteer) -> Option<&str>) -> String {
        self.details
            .as_ref()
            .and_then(field)
            .unwrap_or_default()
            .to_string()
    }
}

/// Association records and fetched details, keyed by volunteer id
#[derive(Debug, Clone, Default)]
pub struct VolunteerDirectory {
    entries: HashMap<i64, VolunteerInfo>,
}

impl VolunteerDirectory {
    /// Merges associations with per-volunteer fetch results; failed fetches leave details empty
    pub fn build(
        associations: &[StudyVolunteer],
        details: Vec<(i64, AppResult<Volunteer>)>,
    ) -> Self {
        let mut entries: HashMap<i64, VolunteerInfo> = HashMap::new();
        for association in associations {
            let info = entries.entry(association.volunteer_id).or_default();
            info.subject_number = association.subject_number.clone();
            info.status = association.status.clone();
            info.group_id = association.group_id;
        }
        for (id, result) in details {
            if let Ok(volunteer) = result {
                entries.entry(id).or_default().details = Some(volunteer);
            }
        }
        Self { entries }
    }

    pub fn get(&self, volunteer_id: i64) -> Option<&VolunteerInfo> {
        self.entries.get(&volunteer_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows are ordered by subject number (numerically when possible), then by id
    pub fn sort_key(&self, volunteer_id: i64) -> (u8, u64, String, i64) {
        match self.get(volunteer_id).and_then(|i| i.subject_number.as_deref()) {
            Some(number) => match number.trim().parse::<u64>() {
                Ok(n) => (0, n, String::new(), volunteer_id),
                Err(_) => (1, 0, number.to_string(), volunteer_id),
            },
            None => (2, 0, String::new(), volunteer_id),
        }
    }
}
