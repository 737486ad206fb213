use super::{ExtractError, Format, RawText};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub(crate) fn extract(bytes: &[u8]) -> Result<RawText, ExtractError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ExtractError::failure(
            Format::Txt,
            format!("not valid UTF-8 at byte {}", e.valid_up_to()),
        )
    })?;
    Ok(RawText::from(text.to_string()))
}
