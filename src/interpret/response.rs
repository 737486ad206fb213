use super::schema::WireSurvey;
use crate::survey::SurveyStructure;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("static regex"));

/// Result of reading the model's reply. Unparseable replies keep the raw
/// text so the failure can be diagnosed.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Parsed(SurveyStructure),
    Unparseable { raw: String, reason: String },
}

/// Tries, in order: the JSON as found, the outermost `{...}` span, and a
/// repaired version of a reply cut off mid-document.
pub fn parse_response(raw: &str) -> ParseOutcome {
    let candidate = json_candidate(raw);

    let mut last_err = match serde_json::from_str::<WireSurvey>(candidate) {
        Ok(wire) => return ParseOutcome::Parsed(wire.into_survey()),
        Err(e) => e,
    };

    if let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}')) {
        if start < end {
            match serde_json::from_str::<WireSurvey>(&candidate[start..=end]) {
                Ok(wire) => return ParseOutcome::Parsed(wire.into_survey()),
                Err(e) => last_err = e,
            }
        }
    }

    if let Some(repaired) = repair_truncated(candidate) {
        debug!("retrying parse on repaired reply tail");
        match serde_json::from_str::<WireSurvey>(&repaired) {
            Ok(wire) => return ParseOutcome::Parsed(wire.into_survey()),
            Err(e) => last_err = e,
        }
    }

    ParseOutcome::Unparseable {
        raw: raw.to_string(),
        reason: last_err.to_string(),
    }
}

fn json_candidate(raw: &str) -> &str {
    if let Some(m) = FENCED_JSON.captures(raw).and_then(|c| c.get(1)) {
        return m.as_str().trim();
    }
    if raw.contains("```") {
        if let Some(inner) = raw.split("```").nth(1) {
            return inner.trim();
        }
    }
    raw.trim()
}

/// Closes whatever the reply left open: an unterminated string, then
/// brackets and braces in reverse order. Returns `None` when nothing is open.
fn repair_truncated(s: &str) -> Option<String> {
    let start = s.find('{')?;
    let body = &s[start..];

    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in body.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    if stack.is_empty() && !in_string {
        return None;
    }

    let mut out = body.to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    let trimmed_len = out.trim_end().trim_end_matches(',').trim_end().len();
    out.truncate(trimmed_len);
    while let Some(close) = stack.pop() {
        out.push(close);
    }
    Some(out)
}
