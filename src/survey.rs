//! Normalized survey model produced by the interpreter and consumed by the
//! renderer. Built once per request, validated, then dropped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyStructure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub ordinal: u32,
    /// Platform question id, e.g. `SQ1` for screeners or `A3` for the main body.
    pub label: String,
    pub text: String,
    pub answer_type: AnswerType,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_logic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_logic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_guide: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_logic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub code: u32,
    pub label: String,
}

impl AnswerOption {
    /// Codes follow position, starting at 1.
    pub fn numbered<I, S>(labels: I) -> Vec<AnswerOption>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| AnswerOption {
                code: i as u32 + 1,
                label: label.into(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerType {
    SingleChoice,
    MultiChoice,
    Ranking,
    Scale,
    OpenText,
    /// Anything the model produced that we don't recognize. Kept so the
    /// renderer can refuse it instead of guessing.
    Other(String),
}

impl AnswerType {
    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "single_choice" | "single" | "radio" | "단일선택" | "단수선택" => Self::SingleChoice,
            "multi_choice" | "multiple_choice" | "multi" | "checkbox" | "복수선택"
            | "중복선택" => Self::MultiChoice,
            "ranking" | "rank" | "순위선택" | "순위형" => Self::Ranking,
            "scale" | "likert" | "척도형" | "척도" => Self::Scale,
            "open_text" | "open" | "text" | "텍스트" | "주관식" | "서술형" => Self::OpenText,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::MultiChoice => "multi_choice",
            Self::Ranking => "ranking",
            Self::Scale => "scale",
            Self::OpenText => "open_text",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for AnswerType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnswerType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Self::parse(&raw))
    }
}

/// Skip logic attached to a question: when the answer to `source` is one of
/// `if_answer`, perform `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRule {
    /// Ordinal of the question whose answer is tested; the owning question
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<u32>,
    pub if_answer: Vec<u32>,
    pub action: BranchAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchAction {
    Goto(u32),
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("survey has no questions")]
    Empty,
    #[error("question ordinals must be strictly increasing: {previous} is followed by {found}")]
    OrdinalOrder { previous: u32, found: u32 },
    #[error("question {ordinal}: option code {code} is used more than once")]
    DuplicateOptionCode { ordinal: u32, code: u32 },
    #[error("question {ordinal}: branch tests unknown question {tested}")]
    UnknownSource { ordinal: u32, tested: u32 },
    #[error("question {ordinal}: branch tests question {tested}, which comes later")]
    SourceAfterOwner { ordinal: u32, tested: u32 },
    #[error("question {ordinal}: branch condition lists no answer codes")]
    EmptyCondition { ordinal: u32 },
    #[error("question {ordinal}: branch tests answer code {code}, which question {tested} does not offer")]
    UnknownAnswerCode { ordinal: u32, tested: u32, code: u32 },
    #[error("question {ordinal}: branch target {target} does not exist")]
    UnknownTarget { ordinal: u32, target: u32 },
    #[error("question {ordinal}: branch target {target} does not come after it")]
    BackwardTarget { ordinal: u32, target: u32 },
}

impl SurveyStructure {
    pub fn question(&self, ordinal: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.ordinal == ordinal)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.questions.is_empty() {
            return Err(ValidationError::Empty);
        }

        for pair in self.questions.windows(2) {
            if pair[1].ordinal <= pair[0].ordinal {
                return Err(ValidationError::OrdinalOrder {
                    previous: pair[0].ordinal,
                    found: pair[1].ordinal,
                });
            }
        }

        let by_ordinal: HashMap<u32, &Question> =
            self.questions.iter().map(|q| (q.ordinal, q)).collect();

        for q in &self.questions {
            let mut seen = HashSet::new();
            if let Some(dup) = q.options.iter().find(|o| !seen.insert(o.code)) {
                return Err(ValidationError::DuplicateOptionCode {
                    ordinal: q.ordinal,
                    code: dup.code,
                });
            }
        }

        for q in &self.questions {
            let Some(rule) = &q.branch else { continue };
            let tested = rule.source.unwrap_or(q.ordinal);
            let Some(source) = by_ordinal.get(&tested) else {
                return Err(ValidationError::UnknownSource {
                    ordinal: q.ordinal,
                    tested,
                });
            };
            if tested > q.ordinal {
                return Err(ValidationError::SourceAfterOwner {
                    ordinal: q.ordinal,
                    tested,
                });
            }
            if rule.if_answer.is_empty() {
                return Err(ValidationError::EmptyCondition { ordinal: q.ordinal });
            }
            if !source.options.is_empty() {
                for &code in &rule.if_answer {
                    if !source.options.iter().any(|o| o.code == code) {
                        return Err(ValidationError::UnknownAnswerCode {
                            ordinal: q.ordinal,
                            tested,
                            code,
                        });
                    }
                }
            }
            if let BranchAction::Goto(target) = rule.action {
                if !by_ordinal.contains_key(&target) {
                    return Err(ValidationError::UnknownTarget {
                        ordinal: q.ordinal,
                        target,
                    });
                }
                if target <= q.ordinal {
                    return Err(ValidationError::BackwardTarget {
                        ordinal: q.ordinal,
                        target,
                    });
                }
            }
        }
        Ok(())
    }
}
