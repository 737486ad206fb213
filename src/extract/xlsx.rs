use super::{ExtractError, Format, RawText};
use calamine::{Reader, Xlsx, open_workbook_from_rs};
use std::io::Cursor;

/// Every sheet in workbook order, introduced by a `=== name ===` marker, then
/// each row's non-empty cells joined with ` | `.
pub(crate) fn extract(bytes: &[u8]) -> Result<RawText, ExtractError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| ExtractError::failure(Format::Xlsx, e))?;

    let mut lines = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| ExtractError::failure(Format::Xlsx, format!("sheet {sheet:?}: {e}")))?;

        lines.push(format!("=== {sheet} ==="));
        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|c| c.to_string().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" | "));
            }
        }
    }
    Ok(RawText::from(lines.join("\n")))
}
