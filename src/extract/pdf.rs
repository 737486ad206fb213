use super::{ExtractError, Format, RawText};
use tracing::{error, warn};

/// Page texts joined in order. Pages with no text layer are skipped and
/// counted; scanned surveys are a known limitation, not an error.
pub(crate) fn extract(bytes: &[u8]) -> Result<RawText, ExtractError> {
    // pdf-extract can panic on malformed fonts and glyph tables.
    let pages = match std::panic::catch_unwind(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(ExtractError::failure(Format::Pdf, e)),
        Err(_) => {
            error!("pdf-extract panicked while reading the upload");
            return Err(ExtractError::failure(
                Format::Pdf,
                "PDF reader crashed on this file (malformed fonts or structure)",
            ));
        }
    };

    let total = pages.len();
    let mut skipped = Vec::new();
    let mut parts = Vec::with_capacity(total);
    for (i, page) in pages.into_iter().enumerate() {
        if page.trim().is_empty() {
            skipped.push(i + 1);
        } else {
            parts.push(page);
        }
    }

    if !skipped.is_empty() {
        warn!(
            total_pages = total,
            skipped = ?skipped,
            "PDF pages without extractable text were skipped"
        );
    }

    Ok(RawText {
        text: parts.join("\n"),
        skipped_pages: skipped.len() as u32,
    })
}
