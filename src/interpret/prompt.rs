//! The instruction prompt is a contract with the model: its wording decides
//! the JSON we get back. It lives in `prompts/` and is pinned by digest so an
//! edit without a version bump fails the test suite.

pub const PROMPT_VERSION: &str = "survey_structure.v1";

pub const SYSTEM_PROMPT: &str = include_str!("../../prompts/survey_structure.v1.md");

/// sha256 of `SYSTEM_PROMPT`.
pub const SYSTEM_PROMPT_SHA256: &str =
    "6d6861921cd4831e539483486c158c26fb1632893939898c8a5aaa5a38b499e5";

pub const USER_LEAD_IN: &str = "다음 설문지를 분석하여 웹업용 JSON 구조로 변환해주세요:";

pub const TRUNCATION_NOTICE: &str = "[텍스트가 길어 일부만 분석합니다]";

#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
    pub truncated: bool,
}

pub fn build(text: &str, max_chars: usize) -> Prompt {
    let (body, truncated) = match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (&text[..cut], true),
        None => (text, false),
    };

    let mut user = format!("{USER_LEAD_IN}\n\n{body}");
    if truncated {
        user.push_str("\n\n");
        user.push_str(TRUNCATION_NOTICE);
    }

    Prompt {
        system: SYSTEM_PROMPT,
        user,
        truncated,
    }
}
