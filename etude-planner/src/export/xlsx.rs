use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use super::service::ExportDocument;
use super::Cell;
use crate::error::AppResult;

const BANNER_ROW: u32 = 0;
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

/// Writes an export as an `.xlsx` workbook.
///
/// Row 1 is the merged study banner, row 2 the column headers, data follows.
pub fn write_workbook(document: &ExportDocument) -> AppResult<Vec<u8>> {
    let table = &document.table;

    let banner_format = Format::new()
        .set_bold()
        .set_font_size(13)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E78))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9E1F2))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_text_wrap();
    let cell_format = Format::new().set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.kind.sheet_name())?;

    // Tables always have more than one column, so the banner merge is never a single cell
    let last_col = table.width().saturating_sub(1).max(1) as u16;
    sheet.merge_range(BANNER_ROW, 0, BANNER_ROW, last_col, &document.banner, &banner_format)?;
    sheet.set_row_height(BANNER_ROW, 24)?;

    for (col, column) in table.columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(HEADER_ROW, col, &column.title, &header_format)?;
        sheet.set_column_width(col, column.width)?;
    }

    for (i, cells) in table.rows.iter().enumerate() {
        let row = FIRST_DATA_ROW + i as u32;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {
                    sheet.write_blank(row, col, &cell_format)?;
                }
                Cell::Text(text) => {
                    sheet.write_string_with_format(row, col, text, &cell_format)?;
                }
                Cell::Number(n) => {
                    sheet.write_number_with_format(row, col, *n, &cell_format)?;
                }
            }
        }
    }
    sheet.set_freeze_panes(FIRST_DATA_ROW, 0)?;

    Ok(workbook.save_to_buffer()?)
}
