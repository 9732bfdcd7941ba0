use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status given to every appointment created by a batch
pub const PLANNED_STATUS: &str = "PLANIFIE";

/// A time of day on a single calendar day (no wraparound past midnight)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    /// Clamps hour to 0-23 and minute to 0-59, each independently
    pub fn clamped(hour: u32, minute: u32) -> Self {
        Self {
            hour: hour.min(23),
            minute: minute.min(59),
        }
    }

    pub fn from_minutes(total: u32) -> Self {
        Self::clamped(total / 60, total % 60)
    }

    /// Minutes since midnight
    pub fn minutes(self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Formats as `HHhMM`, e.g. `08h30`
    pub fn label(self) -> String {
        format!("{:02}h{:02}", self.hour, self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Gap between two consecutive appointments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub hours: u32,
    pub minutes: u32,
}

impl Interval {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    /// Saturates instead of overflowing on oversized input
    pub fn total_minutes(self) -> u32 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }

    /// Appointment duration sent to the backend; `None` when the interval is zero
    pub fn duration_minutes(self) -> Option<u32> {
        match self.total_minutes() {
            0 => None,
            minutes => Some(minutes),
        }
    }
}

/// The window the user configures before generating slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    #[serde(default)]
    pub interval_hours: u32,
    #[serde(default)]
    pub interval_minutes: u32,
}

impl SlotWindow {
    pub fn start(&self) -> TimeOfDay {
        TimeOfDay::clamped(self.start_hour, self.start_minute)
    }

    pub fn end(&self) -> TimeOfDay {
        TimeOfDay::clamped(self.end_hour, self.end_minute)
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.interval_hours, self.interval_minutes)
    }

    pub fn labels(&self) -> Vec<String> {
        super::slot_utils::generate_time_slots(self.start(), self.end(), self.interval())
    }
}

/// Volumes requested for one calendar date, indexed by time-slot position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSlotConfiguration {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub slots: Vec<u32>,
}

impl DateSlotConfiguration {
    pub fn new(year: &str, month: &str, day: &str, slots: Vec<u32>) -> Self {
        Self {
            day: day.to_string(),
            month: month.to_string(),
            year: year.to_string(),
            slots,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.day.trim().is_empty() && !self.month.trim().is_empty() && !self.year.trim().is_empty()
    }

    /// Parses the three parts into a calendar date
    pub fn to_date(&self) -> Option<NaiveDate> {
        if !self.is_complete() {
            return None;
        }
        let year: i32 = self.year.trim().parse().ok()?;
        let month: u32 = self.month.trim().parse().ok()?;
        let day: u32 = self.day.trim().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Total volume for the first `slot_count` time slots, saturating at `u32::MAX`
    pub fn requested(&self, slot_count: usize) -> u32 {
        self.slots
            .iter()
            .take(slot_count)
            .fold(0u32, |total, &volume| total.saturating_add(volume))
    }
}

/// One appointment to create; the backend assigns its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCreationRequest {
    #[serde(rename = "idEtude")]
    pub study_id: i64,
    #[serde(rename = "idGroupe")]
    pub group_id: i64,
    pub date: String,
    #[serde(rename = "heure")]
    pub time: String,
    #[serde(rename = "duree", skip_serializing_if = "Option::is_none", default)]
    pub duration: Option<u32>,
    #[serde(rename = "commentaires")]
    pub comments: String,
    #[serde(rename = "etat")]
    pub status: String,
}
