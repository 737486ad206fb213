//! JSON shape the model is asked to return (see `prompts/`). Kept separate
//! from [`SurveyStructure`] so prompt-level conveniences (positional option
//! codes, optional ordinals, legacy Korean keys) stay out of the domain model.

use crate::survey::{AnswerOption, AnswerType, BranchRule, Question, SurveyStructure};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static OPTION_ENUMERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\(?\d{1,3}\)|\d{1,3}\.\s|[①-⑳])\s*").expect("static regex")
});

#[derive(Debug, Deserialize)]
pub struct WireSurvey {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    pub questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct WireQuestion {
    #[serde(default)]
    pub ordinal: Option<u32>,
    #[serde(default, alias = "문항번호")]
    pub label: Option<String>,
    #[serde(alias = "문항")]
    pub text: String,
    #[serde(alias = "보기유형")]
    pub answer_type: AnswerType,
    #[serde(default, alias = "보기")]
    pub options: Vec<String>,
    #[serde(default)]
    pub branch: Option<BranchRule>,
    #[serde(default, alias = "프로그래밍_로직")]
    pub programming_logic: Option<String>,
    #[serde(default, alias = "콘솔_로직")]
    pub console_logic: Option<String>,
    #[serde(default, alias = "응답가이드")]
    pub response_guide: Option<String>,
    #[serde(default, alias = "검수_로직")]
    pub validation_logic: Option<String>,
}

impl WireSurvey {
    pub fn into_survey(self) -> SurveyStructure {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| q.into_question(i as u32 + 1))
            .collect();
        SurveyStructure {
            title: non_empty(self.title),
            instructions: non_empty(self.instructions),
            questions,
        }
    }
}

impl WireQuestion {
    fn into_question(self, position: u32) -> Question {
        let ordinal = self.ordinal.unwrap_or(position);
        let label = non_empty(self.label).unwrap_or_else(|| format!("Q{ordinal}"));
        let text = strip_label_prefix(&label, self.text.trim()).to_string();
        let options = AnswerOption::numbered(self.options.iter().map(|o| clean_option(o)));
        Question {
            ordinal,
            label,
            text,
            answer_type: self.answer_type,
            options,
            branch: self.branch,
            programming_logic: non_empty(self.programming_logic),
            console_logic: non_empty(self.console_logic),
            response_guide: non_empty(self.response_guide),
            validation_logic: non_empty(self.validation_logic),
        }
    }
}

/// Models sometimes echo the label into the wording ("SQ1. 성별은?").
fn strip_label_prefix<'a>(label: &str, text: &'a str) -> &'a str {
    match text.strip_prefix(label) {
        Some(rest) if rest.starts_with(['.', ')']) => rest[1..].trim_start(),
        _ => text,
    }
}

fn clean_option(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = OPTION_ENUMERATOR.replace(trimmed, "");
    if stripped.trim().is_empty() {
        trimmed.to_string()
    } else {
        stripped.trim().to_string()
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "null")
}
