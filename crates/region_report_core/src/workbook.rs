use rust_xlsxwriter::{
    Color, ColNum, Format, FormatAlign, FormatUnderline, RowNum, Url, Workbook, Worksheet,
    XlsxError,
};
use sha2::{Digest, Sha256};

use crate::report::{
    Appearance, Cell, CellStyle, CellValue, HorizontalAlign, Report, Sheet, HEADER_APPEARANCE,
};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLSX_EXTENSION: &str = "xlsx";

/// Columns spanned by a sheet-level notice.
const NOTICE_SPAN: ColNum = 6;
const NOTICE_WIDTH: f64 = 16.0;
const PERCENT_FORMAT: &str = "0.0%";

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("sheet '{sheet}' exceeds spreadsheet limits ({rows} rows, {columns} columns)")]
    Dimensions {
        sheet: String,
        rows: usize,
        columns: usize,
    },
    #[error("failed to encode sheet '{sheet}': {source}")]
    Encode {
        sheet: String,
        #[source]
        source: XlsxError,
    },
    #[error("failed to serialize workbook: {0}")]
    Serialize(#[source] XlsxError),
}

/// Encodes the report as an in-memory `.xlsx` buffer, one worksheet per
/// sheet in report order.
pub fn encode_workbook(report: &Report) -> Result<Vec<u8>, WorkbookError> {
    let mut workbook = Workbook::new();
    for sheet in &report.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }
    workbook.save_to_buffer().map_err(WorkbookError::Serialize)
}

/// Hex SHA-256 of an encoded artifact.
pub fn artifact_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), WorkbookError> {
    let encode = |source: XlsxError| WorkbookError::Encode {
        sheet: sheet.name.clone(),
        source,
    };
    let (last_row, last_column) = sheet_bounds(sheet)?;

    worksheet.set_name(&sheet.name).map_err(encode)?;

    if let Some(notice) = &sheet.notice {
        let format = format_for(CellStyle::Notice.appearance());
        for column in 0..NOTICE_SPAN {
            worksheet
                .set_column_width(column, NOTICE_WIDTH)
                .map_err(encode)?;
        }
        worksheet
            .merge_range(0, 0, 0, NOTICE_SPAN - 1, notice, &format)
            .map_err(encode)?;
        return Ok(());
    }

    let header_format = format_for(HEADER_APPEARANCE);
    for (index, column) in sheet.columns.iter().enumerate() {
        let column_index = index as ColNum;
        worksheet
            .set_column_width(column_index, column.width)
            .map_err(encode)?;
        worksheet
            .write_string_with_format(0, column_index, &column.header, &header_format)
            .map_err(encode)?;
    }

    for (row_offset, cells) in sheet.rows.iter().enumerate() {
        let row = row_offset as RowNum + 1;
        for (column_index, cell) in cells.iter().enumerate() {
            write_cell(worksheet, row, column_index as ColNum, cell).map_err(encode)?;
        }
    }

    if let Some(freeze) = sheet.freeze {
        worksheet
            .set_freeze_panes(freeze.rows, freeze.columns)
            .map_err(encode)?;
    }

    if sheet.autofilter {
        if let Some(last_column) = last_column {
            worksheet
                .autofilter(0, 0, last_row, last_column)
                .map_err(encode)?;
        }
    }

    Ok(())
}

/// Last data row and last column index, checked against format limits.
fn sheet_bounds(sheet: &Sheet) -> Result<(RowNum, Option<ColNum>), WorkbookError> {
    let widest_row = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    let columns = sheet.columns.len().max(widest_row);
    let rows = RowNum::try_from(sheet.rows.len());
    let last_column = columns.checked_sub(1).map(ColNum::try_from).transpose();

    match (rows, last_column) {
        (Ok(rows), Ok(last_column)) if rows < 1_048_576 && columns <= 16_384 => {
            Ok((rows, last_column))
        }
        _ => Err(WorkbookError::Dimensions {
            sheet: sheet.name.clone(),
            rows: sheet.rows.len(),
            columns,
        }),
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    column: ColNum,
    cell: &Cell,
) -> Result<(), XlsxError> {
    let format = format_for(cell.style.appearance());
    match &cell.value {
        CellValue::Text(text) => {
            worksheet.write_string_with_format(row, column, text, &format)?;
        }
        CellValue::Integer(value) => {
            worksheet.write_number_with_format(row, column, *value as f64, &format)?;
        }
        CellValue::Percent(value) => {
            let format = format.set_num_format(PERCENT_FORMAT);
            worksheet.write_number_with_format(row, column, *value / 100.0, &format)?;
        }
        CellValue::Link { url, text } => {
            worksheet.write_url_with_format(
                row,
                column,
                Url::new(url.as_str()).set_text(text.as_str()),
                &format,
            )?;
        }
    }
    Ok(())
}

fn format_for(appearance: Appearance) -> Format {
    let mut format = Format::new();
    if appearance.bold {
        format = format.set_bold();
    }
    if appearance.italic {
        format = format.set_italic();
    }
    if appearance.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if let Some(color) = appearance.font_color {
        format = format.set_font_color(Color::RGB(color));
    }
    if let Some(color) = appearance.fill_color {
        format = format.set_background_color(Color::RGB(color));
    }
    match appearance.align {
        HorizontalAlign::General => format,
        HorizontalAlign::Left => format.set_align(FormatAlign::Left),
        HorizontalAlign::Center => format.set_align(FormatAlign::Center),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Column;

    fn sample_report() -> Report {
        Report {
            sheets: vec![
                Sheet::table(
                    "Services",
                    vec![Column::new("Service Code", 20.0), Column::new("Coverage", 12.0)],
                    vec![vec![
                        Cell::text("s3"),
                        Cell {
                            value: CellValue::Percent(100.0),
                            style: CellStyle::CoverageFull,
                        },
                    ]],
                )
                .with_header_freeze(0)
                .with_autofilter(),
                Sheet::notice("Service Coverage", "No coverage data"),
            ],
        }
    }

    #[test]
    fn encodes_zip_container() {
        let bytes = encode_workbook(&sample_report()).expect("workbook should encode");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn rejects_invalid_sheet_names() {
        let mut report = sample_report();
        report.sheets[0].name = "bad[name]".to_string();

        let error = encode_workbook(&report).expect_err("invalid sheet name should fail");
        assert!(matches!(error, WorkbookError::Encode { ref sheet, .. } if sheet == "bad[name]"));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let first = artifact_sha256(b"report");
        assert_eq!(first, artifact_sha256(b"report"));
        assert_eq!(first.len(), 64);
        assert_ne!(first, artifact_sha256(b"report2"));
    }

    #[test]
    fn bounds_cover_widest_row() {
        let sheet = Sheet::table(
            "Wide",
            vec![Column::new("A", 10.0)],
            vec![vec![Cell::text("a"), Cell::text("b"), Cell::text("c")]],
        );
        assert_eq!(sheet_bounds(&sheet).expect("bounds"), (1, Some(2)));
    }
}
