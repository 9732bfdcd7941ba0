use super::types::{DateSlotConfiguration, Interval, TimeOfDay};

/// Sort key used when an appointment has no time
pub const DEFAULT_VISIT_TIME: &str = "00h00";

/// Parses a time string to a time of day
///
/// Accepts `HH:MM`, `HHhMM` and `HHh` (minutes default to zero).
pub fn parse_time(time_str: &str) -> Option<TimeOfDay> {
    let clean = time_str.trim().to_lowercase();
    let (hours, minutes) = clean
        .split_once(':')
        .or_else(|| clean.split_once('h'))?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = if minutes.trim().is_empty() {
        0
    } else {
        minutes.trim().parse().ok()?
    };
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(TimeOfDay { hour: hours, minute: minutes })
}

/// Formats minutes since midnight as a slot label (`HHhMM`)
pub fn format_label(minutes: u32) -> String {
    TimeOfDay::from_minutes(minutes).label()
}

/// Generates the ordered time-slot labels between `start` (inclusive) and `end` (exclusive)
///
/// An empty window (end <= start) yields no labels. A zero interval yields a single
/// label for the start time: one slot spanning the whole window.
pub fn generate_time_slots(start: TimeOfDay, end: TimeOfDay, interval: Interval) -> Vec<String> {
    let start_minutes = start.minutes();
    let end_minutes = end.minutes();
    if end_minutes <= start_minutes {
        return Vec::new();
    }

    let step = interval.total_minutes();
    if step == 0 {
        return vec![start.label()];
    }

    (start_minutes..end_minutes)
        .step_by(step as usize)
        .map(format_label)
        .collect()
}

/// Key used to order visits of the same day; missing times sort first
pub fn visit_time_key(time: Option<&str>) -> &str {
    match time {
        Some(t) if !t.trim().is_empty() => t,
        _ => DEFAULT_VISIT_TIME,
    }
}

/// Sums the requested volume across all dates for the first `slot_count` slots
pub fn calculate_requested_slots(configs: &[DateSlotConfiguration], slot_count: usize) -> u32 {
    configs
        .iter()
        .fold(0u32, |total, c| total.saturating_add(c.requested(slot_count)))
}
