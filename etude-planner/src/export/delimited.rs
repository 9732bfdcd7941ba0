use csv::WriterBuilder;

use super::service::ExportDocument;
use super::Cell;
use crate::error::{AppError, AppResult};

/// Writes an export as `;`-separated CSV, the layout spreadsheet software expects
/// in French locales. The banner is a one-field record ahead of the headers.
pub fn write_csv(document: &ExportDocument) -> AppResult<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(Vec::new());

    wtr.write_record([document.banner.as_str()])?;
    wtr.write_record(document.table.columns.iter().map(|c| c.title.as_str()))?;
    for row in &document.table.rows {
        wtr.write_record(row.iter().map(Cell::to_string))?;
    }

    wtr.into_inner().map_err(|e| AppError::Io(e.into_error()))
}
