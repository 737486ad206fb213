//! Writes a [`SurveyStructure`] into the fixed upload workbook.

pub mod layout;

use crate::{
    config::Render,
    survey::{SurveyStructure, ValidationError},
};
use rust_xlsxwriter::{Color, DocProperties, ExcelDateTime, Format, Workbook, XlsxError};
use thiserror::Error;
use tracing::debug;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("survey structure is inconsistent: {0}")]
    InvalidStructure(#[from] ValidationError),
    #[error("question {ordinal}: unsupported question type {answer_type:?}")]
    UnsupportedQuestionType { ordinal: u32, answer_type: String },
    #[error("question {ordinal}: {count} options, the upload sheet holds at most {max}")]
    TooManyOptions {
        ordinal: u32,
        count: usize,
        max: usize,
    },
    #[error("question {ordinal}: option code {code} is outside 1..={max}")]
    OptionCodeOutOfRange { ordinal: u32, code: u32, max: usize },
    #[error("writing workbook: {0}")]
    Workbook(#[from] XlsxError),
}

/// Renders the workbook to bytes. Document timestamps are pinned so the same
/// survey always yields the same file.
pub fn render(survey: &SurveyStructure, cfg: &Render) -> Result<Vec<u8>, RenderError> {
    let rows = layout::rows(survey, cfg.max_options)?;
    let headers = layout::headers(cfg.max_options);

    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(cfg.header_fill));

    let sheet = workbook.add_worksheet();
    sheet.set_name(&cfg.sheet_name)?;

    let header_row = cfg.header_row - 1;
    for (col, h) in headers.iter().enumerate() {
        sheet.write_string_with_format(header_row, col as u16, h, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = header_row + 1 + i as u32;
        for (col, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                sheet.write_string(r, col as u16, value)?;
            }
        }
    }

    for (col, width) in layout::FIXED_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    for i in 0..cfg.max_options {
        let col = layout::FIXED_HEADERS.len() + i;
        sheet.set_column_width(col as u16, layout::OPTION_WIDTH)?;
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(rows = rows.len(), bytes = bytes.len(), "workbook rendered");
    Ok(bytes)
}
