//! Column layout of the platform's bulk-upload sheet. Pure: maps a survey to
//! cell strings, leaving workbook details to the writer.

use super::RenderError;
use crate::survey::{AnswerType, BranchAction, Question, SurveyStructure, ValidationError};

pub const FIXED_HEADERS: [&str; 9] = [
    "문항번호",
    "콘솔번호",
    "프로그래밍 로직",
    "콘솔 로직",
    "응답가이드",
    "검수 로직",
    "질문유형",
    "보기유형",
    "문항",
];

/// Widths for the fixed columns A..I, then every option column.
pub const FIXED_WIDTHS: [f64; 9] = [10.0, 10.0, 20.0, 25.0, 30.0, 25.0, 10.0, 12.0, 70.0];
pub const OPTION_WIDTH: f64 = 30.0;

/// One data row, fixed columns first, then options by code. `None` is an
/// empty cell.
pub type Row = Vec<Option<String>>;

pub fn headers(max_options: usize) -> Vec<String> {
    FIXED_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain((1..=max_options).map(|i| format!("보기{i}")))
        .collect()
}

/// Validates the structure first; an inconsistent survey never reaches a cell.
pub fn rows(survey: &SurveyStructure, max_options: usize) -> Result<Vec<Row>, RenderError> {
    survey.validate()?;
    survey
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| row(survey, q, i + 1, max_options))
        .collect()
}

fn row(
    survey: &SurveyStructure,
    q: &Question,
    position: usize,
    max_options: usize,
) -> Result<Row, RenderError> {
    let (kind, choice) = type_codes(q)?;
    if q.options.len() > max_options {
        return Err(RenderError::TooManyOptions {
            ordinal: q.ordinal,
            count: q.options.len(),
            max: max_options,
        });
    }

    let mut cells: Row = vec![
        Some(q.label.clone()),
        Some(format!("Q{position}")),
        q.programming_logic.clone(),
        console_logic(survey, q)?,
        q.response_guide.clone(),
        q.validation_logic.clone(),
        Some(kind.to_string()),
        Some(choice.to_string()),
        Some(format!("{}. {}", q.label, q.text)),
    ];

    let mut options = q.options.clone();
    options.sort_by_key(|o| o.code);
    for opt in options {
        if opt.code == 0 || opt.code as usize > max_options {
            return Err(RenderError::OptionCodeOutOfRange {
                ordinal: q.ordinal,
                code: opt.code,
                max: max_options,
            });
        }
        let col = FIXED_HEADERS.len() + opt.code as usize - 1;
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = Some(opt.label);
    }
    Ok(cells)
}

/// `질문유형` and `보기유형` for the platform.
fn type_codes(q: &Question) -> Result<(&'static str, &'static str), RenderError> {
    Ok(match &q.answer_type {
        AnswerType::SingleChoice => ("객관식", "단일선택"),
        AnswerType::MultiChoice => ("객관식", "복수선택"),
        AnswerType::Ranking => ("객관식", "순위선택"),
        AnswerType::Scale => ("객관식", "척도형"),
        AnswerType::OpenText => ("주관식", "텍스트"),
        AnswerType::Other(raw) => {
            return Err(RenderError::UnsupportedQuestionType {
                ordinal: q.ordinal,
                answer_type: raw.clone(),
            });
        }
    })
}

/// Branch rule in platform notation, e.g. `SQ1=2,3 → A5` or
/// `SQ2=1 → 설문 종료`, followed by any free-text console logic.
fn console_logic(survey: &SurveyStructure, q: &Question) -> Result<Option<String>, RenderError> {
    let rule = match &q.branch {
        Some(b) => {
            let tested = b.source.unwrap_or(q.ordinal);
            let tested_label = label_of(survey, tested).ok_or(ValidationError::UnknownSource {
                ordinal: q.ordinal,
                tested,
            })?;
            let codes = b
                .if_answer
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let target = match b.action {
                BranchAction::Goto(t) => label_of(survey, t).ok_or(ValidationError::UnknownTarget {
                    ordinal: q.ordinal,
                    target: t,
                })?,
                BranchAction::Terminate => "설문 종료",
            };
            Some(format!("{tested_label}={codes} → {target}"))
        }
        None => None,
    };

    Ok(match (rule, q.console_logic.as_deref()) {
        (Some(r), Some(extra)) => Some(format!("{r}\n{extra}")),
        (Some(r), None) => Some(r),
        (None, extra) => extra.map(str::to_string),
    })
}

fn label_of(survey: &SurveyStructure, ordinal: u32) -> Option<&str> {
    survey.question(ordinal).map(|q| q.label.as_str())
}
