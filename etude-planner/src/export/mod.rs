pub mod delimited;
pub mod directory;
pub mod pivot;
pub mod service;
pub mod status;
pub mod xlsx;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use delimited::write_csv;
pub use directory::{VolunteerDirectory, VolunteerInfo};
pub use pivot::{build_pivot, PivotContext};
pub use service::{export_common_volunteers, export_study, ExportDocument};
pub use xlsx::write_workbook;

/// The three volunteer x visit matrices the tool can export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    /// Raw appointment export of one study
    Appointments,
    /// Recruitment sheet handed to the recruiters of one study
    Recruitment,
    /// Volunteers that appear in several studies
    CommonVolunteers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub title: String,
    pub width: f64,
}

impl Column {
    fn new(title: &str, width: f64) -> Self {
        Self {
            title: title.to_string(),
            width,
        }
    }
}

/// Columns of the n-th visit (1-based)
pub fn visit_columns(n: usize) -> [Column; 2] {
    [
        Column::new(&format!("Date visite {}", n), 12.0),
        Column::new(&format!("Heure visite {}", n), 10.0),
    ]
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [
        ExportKind::Appointments,
        ExportKind::Recruitment,
        ExportKind::CommonVolunteers,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ExportKind::Appointments => "appointments",
            ExportKind::Recruitment => "recruitment",
            ExportKind::CommonVolunteers => "common-volunteers",
        }
    }

    /// Prefix of the downloaded file name
    pub fn purpose(self) -> &'static str {
        match self {
            ExportKind::Appointments => "rdv",
            ExportKind::Recruitment => "recrutement",
            ExportKind::CommonVolunteers => "volontaires-communs",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ExportKind::Appointments => "Rendez-vous",
            ExportKind::Recruitment => "Recrutement",
            ExportKind::CommonVolunteers => "Volontaires communs",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            ExportKind::Appointments => "RDV",
            ExportKind::Recruitment => "Recrutement",
            ExportKind::CommonVolunteers => "Communs",
        }
    }

    /// Fixed leading columns, ending with the first visit's date and time
    pub fn leading_columns(self) -> Vec<Column> {
        let mut columns = match self {
            ExportKind::Appointments => vec![
                Column::new("N°", 6.0),
                Column::new("N° sujet", 10.0),
                Column::new("Statut", 14.0),
                Column::new("Nom", 28.0),
                Column::new("Téléphone", 15.0),
                Column::new("Phototype", 10.0),
                Column::new("Email", 30.0),
            ],
            ExportKind::Recruitment => vec![
                Column::new("N°", 6.0),
                Column::new("N° sujet", 10.0),
                Column::new("Nom", 28.0),
                Column::new("Téléphone", 15.0),
                Column::new("Email", 30.0),
                Column::new("Pénalité", 14.0),
            ],
            ExportKind::CommonVolunteers => vec![
                Column::new("N°", 6.0),
                Column::new("ID volontaire", 12.0),
                Column::new("Nom", 28.0),
                Column::new("Téléphone", 15.0),
                Column::new("Email", 30.0),
            ],
        };
        columns.extend(visit_columns(1));
        columns
    }

    pub fn trailing_columns(self) -> Vec<Column> {
        match self {
            ExportKind::Appointments => vec![Column::new("Groupe", 18.0)],
            ExportKind::Recruitment => vec![
                Column::new("Groupe", 18.0),
                Column::new("IV", 8.0),
                Column::new("Présence", 10.0),
                Column::new("Remarques", 30.0),
            ],
            ExportKind::CommonVolunteers => vec![
                Column::new("Nb études", 10.0),
                Column::new("Études", 30.0),
            ],
        }
    }

    /// Whether appointments without a volunteer get a row of their own
    pub fn includes_unassigned(self) -> bool {
        !matches!(self, ExportKind::CommonVolunteers)
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s || kind.purpose() == s)
            .ok_or_else(|| format!("unknown export kind: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Blank strings become `Empty`
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Rectangular volunteer x visit table, ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub kind: ExportKind,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
    pub max_passages: usize,
}

impl PivotTable {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Date and time cells of the n-th visit (1-based) of a row
    pub fn visit(&self, row: usize, n: usize) -> Option<(&Cell, &Cell)> {
        if n == 0 {
            return None;
        }
        let first = self.kind.leading_columns().len() - 2 + 2 * (n - 1);
        let cells = self.rows.get(row)?;
        Some((cells.get(first)?, cells.get(first + 1)?))
    }
}

/// File formats an export can be rendered to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn render(self, document: &ExportDocument) -> crate::error::AppResult<Vec<u8>> {
        match self {
            ExportFormat::Xlsx => write_workbook(document),
            ExportFormat::Csv => write_csv(document),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// `{purpose}-{studyRef}` or `{purpose}-{yyyy-mm-dd}` when no reference is known
pub fn export_file_name(purpose: &str, study_ref: Option<&str>, today: NaiveDate) -> String {
    match study_ref.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => format!("{}-{}", purpose, reference.replace(['/', '\\', ' '], "_")),
        None => format!("{}-{}", purpose, today.format("%Y-%m-%d")),
    }
}
