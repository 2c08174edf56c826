//! Spreadsheet rendering of report rows.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;

use crate::output::{write_atomic, ExportError};
use crate::report::{Movement, ReportRow, REPORT_COLUMNS};

pub const SHEET_NAME: &str = "Exported Data";

const HEADER_FILL: u32 = 0xCAF2F0;
const DECREASE_FONT: u32 = 0xFF0000;
const INCREASE_FONT: u32 = 0x0000FF;
const AMOUNT_FORMAT: &str = "0.00";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub rows: usize,
    pub increases: usize,
    pub decreases: usize,
}

/// Builds the workbook in memory and writes it in one step, so a failed
/// export never leaves a partial file at `path`.
pub fn export_report(rows: &[ReportRow], path: &Path) -> Result<ExportSummary, ExportError> {
    let bytes = render_report(rows)?;
    write_atomic(path, &bytes)?;

    let summary = ExportSummary {
        rows: rows.len(),
        increases: rows.iter().filter(|r| r.movement() == Some(Movement::Increase)).count(),
        decreases: rows.iter().filter(|r| r.movement() == Some(Movement::Decrease)).count(),
    };
    tracing::info!(
        path = %path.display(),
        rows = summary.rows,
        increases = summary.increases,
        decreases = summary.decreases,
        "report exported"
    );
    Ok(summary)
}

pub fn render_report(rows: &[ReportRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;

    let header = Format::new().set_bold().set_background_color(Color::RGB(HEADER_FILL));
    for (col, title) in REPORT_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    let amount = Format::new().set_num_format(AMOUNT_FORMAT);
    let decrease = amount.clone().set_font_color(Color::RGB(DECREASE_FONT));
    let increase = amount.clone().set_font_color(Color::RGB(INCREASE_FONT));

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet.write_string(r, 0, &row.customer_code)?;
        worksheet.write_string(r, 1, &row.branch_code)?;
        worksheet.write_string(r, 2, &row.account_number)?;
        worksheet.write_string(r, 3, &row.company_name)?;
        write_amount(worksheet, r, 4, Some(row.current), &amount)?;
        write_amount(worksheet, r, 5, row.prior, &amount)?;

        let delta_format = match row.movement() {
            Some(Movement::Decrease) => &decrease,
            Some(Movement::Increase) => &increase,
            _ => &amount,
        };
        write_amount(worksheet, r, 6, row.delta, delta_format)?;
    }

    for (col, title) in REPORT_COLUMNS.iter().enumerate() {
        let widest = rows
            .iter()
            .map(|row| match col {
                0 => row.customer_code.chars().count(),
                1 => row.branch_code.chars().count(),
                2 => row.account_number.chars().count(),
                3 => row.company_name.chars().count(),
                _ => 12,
            })
            .max()
            .unwrap_or(0)
            .max(title.len());
        worksheet.set_column_width(col as u16, (widest + 2) as f64)?;
    }

    workbook.save_to_buffer()
}

/// Missing amounts are left as empty cells.
fn write_amount(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<Decimal>,
    format: &Format,
) -> Result<(), XlsxError> {
    if let Some(value) = value.and_then(|v| v.to_f64()) {
        worksheet.write_number_with_format(row, col, value, format)?;
    }
    Ok(())
}
