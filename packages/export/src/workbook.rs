//! `.xlsx` workbook writer.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook};

use crate::record::ExportRecord;
use crate::{ExportError, HEADERS};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Attendance";

/// MIME type of the produced file.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_FILL: u32 = 0x0044_72C4;
const COLUMN_PADDING: usize = 3;

/// Writes `records` into a workbook and returns the file bytes.
///
/// The header row is bold white Calibri 11 on a blue fill, centered. Each
/// column is as wide as its longest value plus padding. Empty values leave
/// the cell blank.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] if the workbook cannot be assembled.
pub fn export_to_excel(records: &[ExportRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_font_name("Calibri")
        .set_font_size(11)
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_pattern(FormatPattern::Solid)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();

    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string_with_format(0, col, header, &header_format)?;
    }

    for (row, record) in (1u32..).zip(records) {
        for ((col, value), width) in (0u16..).zip(record.row()).zip(widths.iter_mut()) {
            if value.is_empty() {
                continue;
            }
            *width = (*width).max(value.chars().count());
            worksheet.write_string(row, col, value)?;
        }
    }

    for (col, width) in (0u16..).zip(&widths) {
        let width = u16::try_from(width + COLUMN_PADDING).unwrap_or(u16::MAX);
        worksheet.set_column_width(col, width)?;
    }

    log::debug!("Wrote {} record(s) to workbook", records.len());

    Ok(workbook.save_to_buffer()?)
}
