use survey_webup::{config::Config, postprocess::clean_text};

#[test]
fn sanitizes_control_chars() {
    let cfg = Config::default();
    let cleaned = clean_text(&cfg.extract, "Alpha\u{0002}Beta\u{000C}\nLine\tTabbed\r\nNext");

    assert!(!cleaned.contains('\u{0002}'));
    assert!(!cleaned.contains('\u{000C}'));
    assert!(cleaned.contains("AlphaBeta"));
    assert!(cleaned.contains("Line\tTabbed\nNext"));
}

#[test]
fn composes_decomposed_hangul() {
    let cfg = Config::default();
    // "한글" as conjoining jamo (NFD).
    let nfd = "\u{1112}\u{1161}\u{11AB}\u{1100}\u{1173}\u{11AF}";
    assert_eq!(clean_text(&cfg.extract, nfd), "한글");
}

#[test]
fn strips_page_footers_and_collapses_blank_runs() {
    let cfg = Config::default();
    let raw = "SQ1. 성별은?\n\n\n\nPage 3 of 12\n- 4 -\n1) 남성   \n";
    assert_eq!(clean_text(&cfg.extract, raw), "SQ1. 성별은?\n\n1) 남성");
}

#[test]
fn keeps_lone_numbers() {
    let cfg = Config::default();
    assert_eq!(clean_text(&cfg.extract, "척도\n1\n2\n3"), "척도\n1\n2\n3");
}
