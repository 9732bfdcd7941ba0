use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::api::StudySummary;
use crate::error::AppResult;
use crate::schedule::{BatchOutcome, CapacityStatus, DateSlotConfiguration};

/// Formats a volunteer name as `NOM Prénom`
pub fn format_volunteer_name(last_name: &str, first_name: &str) -> String {
    let last = last_name.trim().to_uppercase();
    let first = first_name.trim();
    match (last.is_empty(), first.is_empty()) {
        (true, _) => first.to_string(),
        (false, true) => last,
        (false, false) => format!("{} {}", last, first),
    }
}

/// Writes exported bytes to a file
pub fn write_export_to_file(bytes: &[u8], path: &Path) -> AppResult<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}

/// Prints the generated time slots and the volume grid for each configured date
pub fn print_slot_preview(labels: &[String], dates: &[DateSlotConfiguration]) {
    if labels.is_empty() {
        println!("No time slot: the end time must be after the start time.");
        return;
    }

    println!("\n=== {} time slot(s) ===", labels.len());
    for (slot, label) in labels.iter().enumerate() {
        let volumes: Vec<String> = dates
            .iter()
            .map(|d| d.slots.get(slot).copied().unwrap_or(0).to_string())
            .collect();
        if volumes.is_empty() {
            println!("  {}", label);
        } else {
            println!("  {} -> {}", label, volumes.join(" | "));
        }
    }
}

/// Prints the capacity badge the way the form shows it
pub fn print_capacity(status: &CapacityStatus, requested: u32, enrolled: u32) {
    let marker = if status.requires_confirmation() { "⚠️ " } else { "" };
    println!(
        "{}[{}] {} (requested: {}, enrolled: {})",
        marker,
        status.code(),
        status.message(),
        requested,
        enrolled
    );
}

pub fn print_batch_outcome(outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::Complete { .. } => println!("{}", outcome.message()),
        BatchOutcome::Partial { errors, .. } => {
            println!("⚠️  {}", outcome.message());
            for error in errors {
                println!("  - {}", error);
            }
        }
        BatchOutcome::Failed { .. } => eprintln!("{}", outcome.message()),
    }
}

pub fn print_summary(summary: &StudySummary) {
    println!("\n=== Study {} ===", summary.study_id);
    println!("Groups: {} ({} enrolled subjects)", summary.groups, summary.enrolled_subjects);
    println!("Volunteers: {}", summary.volunteers);
    println!(
        "Appointments: {} ({} assigned)",
        summary.appointments, summary.assigned_appointments
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_name_is_upper_cased() {
        assert_eq!(format_volunteer_name("Martin", "Julie"), "MARTIN Julie");
        assert_eq!(format_volunteer_name("", "Julie"), "Julie");
        assert_eq!(format_volunteer_name("martin", " "), "MARTIN");
    }
}
