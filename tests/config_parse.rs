use survey_webup::config::{ApiKey, Config, Llm};

#[test]
fn parse_example_config() {
    let raw = include_str!("../survey-webup.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    cfg.validate().expect("example config is valid");
    assert_eq!(cfg.render.header_fill, 0xE0E0E0);
    assert_eq!(cfg.render.max_options, 35);
    assert_eq!(cfg.limits.max_prompt_chars, 30_000);
    assert_eq!(
        cfg.extract.control_chars_to_sanitize,
        Config::default().extract.control_chars_to_sanitize
    );
}

#[test]
fn partial_config_takes_defaults() {
    let cfg: Config = toml::from_str("[llm]\nmodel = \"m\"\n").expect("parse TOML");
    assert_eq!(cfg.llm.model, "m");
    assert_eq!(cfg.llm.timeout_seconds, 180);
    assert_eq!(cfg.llm.base_url, "https://api.anthropic.com");
    assert_eq!(cfg.llm.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(cfg.render.sheet_name, "설문지");
    assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    cfg.validate().expect("partial config is valid");
}

#[test]
fn partial_extract_section_keeps_default_patterns() {
    let cfg: Config =
        toml::from_str("[extract]\ncollapse_blank_lines = false\n").expect("parse TOML");
    assert!(!cfg.extract.collapse_blank_lines);
    assert!(cfg.extract.normalize_unicode);
    assert_eq!(
        cfg.extract.strip_line_patterns,
        Config::default().extract.strip_line_patterns
    );
}

#[test]
fn rejects_bad_strip_pattern() {
    let mut cfg = Config::default();
    cfg.extract.strip_line_patterns = vec!["(unclosed".into()];
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_zero_header_row() {
    let mut cfg = Config::default();
    cfg.render.header_row = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn missing_api_key_is_an_error() {
    let llm = Llm {
        api_key_env: "SURVEY_WEBUP_TEST_KEY_THAT_IS_NEVER_SET".into(),
        ..Llm::default()
    };
    let err = ApiKey::from_env(&llm).unwrap_err();
    assert!(err.to_string().contains("SURVEY_WEBUP_TEST_KEY_THAT_IS_NEVER_SET"));
}

#[test]
fn api_key_is_redacted_in_debug() {
    let key = ApiKey::new("sk-secret").unwrap();
    assert_eq!(format!("{key:?}"), "ApiKey(***)");
    assert!(ApiKey::new("   ").is_err());
}

#[test]
fn load_reads_and_validates_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.toml");
    std::fs::write(&good, "[render]\nsheet_name = \"업로드\"\n").unwrap();
    let cfg = Config::load(&good).unwrap();
    assert_eq!(cfg.render.sheet_name, "업로드");
    assert_eq!(cfg.render.header_row, 3);

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[render]\nmax_options = 0\n").unwrap();
    let err = Config::load(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("max_options"));
}
