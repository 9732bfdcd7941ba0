use thiserror::Error;

use crate::config::ConfigError;
use crate::schedule::CapacityStatus;

/// Errors raised before anything is sent to the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a group must be selected")]
    NoGroupSelected,
    #[error("at least one date must be configured")]
    NoDates,
    #[error("date #{index} is incomplete (day, month and year are required)")]
    IncompleteDate { index: usize },
    #[error("date #{index} is not a valid calendar date: {value}")]
    InvalidDate { index: usize, value: String },
    #[error("no time slot can be generated from the configured window")]
    NoSlots,
    #[error("the interval between appointments ({minutes} min) exceeds one day")]
    IntervalTooLong { minutes: u32 },
    #[error("date #{index} asks for {volume} appointments in one slot (at most {max})")]
    VolumeTooLarge { index: usize, volume: u32, max: u32 },
    #[error("{requested} appointments requested in one batch (at most {max})")]
    BatchTooLarge { requested: u32, max: u32 },
    #[error("no appointment requested: every slot volume is zero")]
    NothingRequested,
    #[error("the common volunteer export needs at least two distinct studies")]
    CommonExportNeedsStudies,
    #[error("capacity warning not confirmed: {0}")]
    CapacityNotConfirmed(String),
    #[error("invalid time: {0}")]
    InvalidTime(String),
}

impl ValidationError {
    pub fn unconfirmed(status: &CapacityStatus) -> Self {
        Self::CapacityNotConfirmed(status.message())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type AppResult<T> = Result<T, AppError>;
