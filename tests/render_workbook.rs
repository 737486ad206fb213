mod common;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use common::THREE_QUESTIONS;
use std::io::Cursor;
use survey_webup::config::Config;
use survey_webup::interpret::{ParseOutcome, parse_response};
use survey_webup::render::{RenderError, layout, render};
use survey_webup::survey::{
    AnswerOption, AnswerType, BranchAction, SurveyStructure, ValidationError,
};

fn three_questions() -> SurveyStructure {
    match parse_response(THREE_QUESTIONS) {
        ParseOutcome::Parsed(s) => {
            s.validate().unwrap();
            s
        }
        ParseOutcome::Unparseable { reason, .. } => panic!("fixture does not parse: {reason}"),
    }
}

fn read_sheet(bytes: &[u8], name: &str) -> Range<Data> {
    let mut wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    wb.worksheet_range(name).unwrap()
}

fn cell(range: &Range<Data>, row: u32, col: u32) -> Option<String> {
    match range.get_value((row, col)) {
        None | Some(Data::Empty) => None,
        Some(v) => Some(v.to_string()),
    }
}

#[test]
fn three_questions_make_three_rows_in_column_order() {
    let cfg = Config::default();
    let bytes = render(&three_questions(), &cfg.render).unwrap();
    let range = read_sheet(&bytes, "설문지");

    // Rows 1-2 blank, headers on row 3, data from row 4 (0-based 2 and 3).
    assert_eq!(range.start(), Some((2, 0)));
    assert_eq!(range.end().map(|(r, _)| r), Some(5));

    let headers: Vec<String> = (0..11).filter_map(|c| cell(&range, 2, c)).collect();
    assert_eq!(
        headers,
        [
            "문항번호", "콘솔번호", "프로그래밍 로직", "콘솔 로직", "응답가이드", "검수 로직",
            "질문유형", "보기유형", "문항", "보기1", "보기2",
        ]
    );
    assert_eq!(cell(&range, 2, 43).as_deref(), Some("보기35"));

    let row = |r: u32| -> Vec<Option<String>> { (0..12).map(|c| cell(&range, r, c)).collect() };
    let s = |v: &str| Some(v.to_string());

    assert_eq!(
        row(3),
        vec![
            s("SQ1"), s("Q1"), None, s("SQ1=2 → A1"), None, None,
            s("객관식"), s("단일선택"), s("SQ1. 귀하의 성별은?"), s("남성"), s("여성"), None,
        ]
    );
    assert_eq!(
        row(4),
        vec![
            s("SQ2"), s("Q2"), s("보기 로테이션"), None, s("해당하는 것을 모두 선택"), None,
            s("객관식"), s("복수선택"), s("SQ2. 이용해 본 채널을 모두 선택해 주세요."),
            s("매장"), s("온라인"), s("모바일 앱"),
        ]
    );
    assert_eq!(
        row(5),
        vec![
            s("A1"), s("Q3"), None, None, None, s("10자 이상"),
            s("주관식"), s("텍스트"), s("A1. 개선되었으면 하는 점을 적어주세요."), None, None, None,
        ]
    );
}

#[test]
fn rendering_is_byte_reproducible() {
    let cfg = Config::default();
    let survey = three_questions();
    let first = render(&survey, &cfg.render).unwrap();
    let second = render(&survey, &cfg.render).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reread_cells_match_layout_exactly() {
    let cfg = Config::default();
    let mut survey = three_questions();
    // Values that a lossy writer would mangle.
    survey.questions[1].options.push(AnswerOption {
        code: 4,
        label: "A&B <태그> \"따옴표\"".into(),
    });
    survey.questions[2].response_guide = Some("첫 줄\n둘째 줄".into());

    let expected = layout::rows(&survey, cfg.render.max_options).unwrap();
    let bytes = render(&survey, &cfg.render).unwrap();
    let range = read_sheet(&bytes, "설문지");

    for (i, row) in expected.iter().enumerate() {
        let r = 3 + i as u32;
        for (c, want) in row.iter().enumerate() {
            assert_eq!(&cell(&range, r, c as u32), want, "row {r} col {c}");
        }
    }
}

#[test]
fn unknown_answer_type_is_refused() {
    let cfg = Config::default();
    let mut survey = three_questions();
    survey.questions[1].answer_type = AnswerType::Other("matrix".into());
    match render(&survey, &cfg.render) {
        Err(RenderError::UnsupportedQuestionType {
            ordinal,
            answer_type,
        }) => {
            assert_eq!(ordinal, 2);
            assert_eq!(answer_type, "matrix");
        }
        other => panic!("expected UnsupportedQuestionType, got {other:?}"),
    }
}

#[test]
fn too_many_options_fail_instead_of_truncating() {
    let cfg = Config::default();
    let mut survey = three_questions();
    survey.questions[1].options = AnswerOption::numbered((1..=36).map(|i| format!("보기 {i}")));
    assert!(matches!(
        render(&survey, &cfg.render),
        Err(RenderError::TooManyOptions {
            ordinal: 2,
            count: 36,
            max: 35
        })
    ));
}

#[test]
fn terminate_rule_and_free_text_console_logic() {
    let mut survey = three_questions();
    let q2 = &mut survey.questions[1];
    q2.branch = Some(survey_webup::survey::BranchRule {
        source: Some(1),
        if_answer: vec![1, 2],
        action: BranchAction::Terminate,
    });
    q2.console_logic = Some("쿼터 초과 시 종료".into());
    survey.validate().unwrap();

    let rows = layout::rows(&survey, 35).unwrap();
    assert_eq!(
        rows[1][3].as_deref(),
        Some("SQ1=1,2 → 설문 종료\n쿼터 초과 시 종료")
    );
}

#[test]
fn dangling_goto_is_rejected_before_any_cell_is_written() {
    let cfg = Config::default();
    let mut survey = three_questions();
    if let Some(rule) = survey.questions[0].branch.as_mut() {
        rule.action = BranchAction::Goto(99);
    }
    match render(&survey, &cfg.render) {
        Err(RenderError::InvalidStructure(ValidationError::UnknownTarget { ordinal, target })) => {
            assert_eq!((ordinal, target), (1, 99));
        }
        other => panic!("expected InvalidStructure, got {other:?}"),
    }
    assert!(layout::rows(&survey, cfg.render.max_options).is_err());
}

#[test]
fn duplicate_option_codes_are_rejected_not_overwritten() {
    let cfg = Config::default();
    let mut survey = three_questions();
    survey.questions[1].options[2].code = 1;
    assert!(matches!(
        render(&survey, &cfg.render),
        Err(RenderError::InvalidStructure(
            ValidationError::DuplicateOptionCode { ordinal: 2, code: 1 }
        ))
    ));
}
