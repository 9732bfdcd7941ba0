use serde::Serialize;

/// How the requested slot volume compares to a group's enrolled subjects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CapacityStatus {
    NoGroup,
    Empty,
    NoSubjects,
    Perfect,
    /// More slots than subjects
    Shortage { difference: u32 },
    /// More subjects than slots
    Excess { difference: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Neutral,
    Success,
    Info,
    Warning,
    Blocking,
}

/// Classifies requested slots against enrolled subjects.
///
/// The zero checks run before the numeric comparison, so zero slots for an empty
/// group is `Empty`, never `Perfect`.
pub fn reconcile_capacity(requested: u32, enrolled: u32, has_group: bool) -> CapacityStatus {
    if !has_group {
        CapacityStatus::NoGroup
    } else if requested == 0 {
        CapacityStatus::Empty
    } else if enrolled == 0 {
        CapacityStatus::NoSubjects
    } else if requested == enrolled {
        CapacityStatus::Perfect
    } else if requested > enrolled {
        CapacityStatus::Shortage {
            difference: requested - enrolled,
        }
    } else {
        CapacityStatus::Excess {
            difference: enrolled - requested,
        }
    }
}

impl CapacityStatus {
    pub fn code(&self) -> &'static str {
        match self {
            CapacityStatus::NoGroup => "no-group",
            CapacityStatus::Empty => "empty",
            CapacityStatus::NoSubjects => "no-subjects",
            CapacityStatus::Perfect => "perfect",
            CapacityStatus::Shortage { .. } => "shortage",
            CapacityStatus::Excess { .. } => "excess",
        }
    }

    pub fn difference(&self) -> u32 {
        match self {
            CapacityStatus::Shortage { difference } | CapacityStatus::Excess { difference } => {
                *difference
            }
            _ => 0,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CapacityStatus::NoGroup | CapacityStatus::Empty => Severity::Neutral,
            CapacityStatus::NoSubjects => Severity::Warning,
            CapacityStatus::Perfect => Severity::Success,
            CapacityStatus::Shortage { .. } => Severity::Blocking,
            CapacityStatus::Excess { .. } => Severity::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            CapacityStatus::NoGroup => "Select a group to check its capacity".to_string(),
            CapacityStatus::Empty => "No appointment slot requested yet".to_string(),
            CapacityStatus::NoSubjects => "The selected group has no enrolled subject".to_string(),
            CapacityStatus::Perfect => "Slots match the enrolled subjects exactly".to_string(),
            CapacityStatus::Shortage { difference } => {
                format!("{} slot(s) more than enrolled subjects", difference)
            }
            CapacityStatus::Excess { difference } => {
                format!("{} enrolled subject(s) without a slot", difference)
            }
        }
    }

    /// Whether the user must explicitly confirm before submitting
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            CapacityStatus::Shortage { .. } | CapacityStatus::NoSubjects
        )
    }
}

/// Serialisable snapshot of a reconciliation, as shown in the live badge
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    pub status: &'static str,
    pub severity: Severity,
    pub message: String,
    pub requested: u32,
    pub enrolled: u32,
    pub difference: u32,
    pub requires_confirmation: bool,
}

impl CapacityReport {
    pub fn new(status: CapacityStatus, requested: u32, enrolled: u32) -> Self {
        Self {
            status: status.code(),
            severity: status.severity(),
            message: status.message(),
            requested,
            enrolled,
            difference: status.difference(),
            requires_confirmation: status.requires_confirmation(),
        }
    }
}
