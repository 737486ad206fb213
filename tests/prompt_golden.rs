use survey_webup::interpret::prompt::{self, PROMPT_VERSION, SYSTEM_PROMPT, SYSTEM_PROMPT_SHA256};
use survey_webup::util::sha256_hex;

#[test]
fn system_prompt_matches_pinned_digest() {
    assert_eq!(
        sha256_hex(SYSTEM_PROMPT.as_bytes()),
        SYSTEM_PROMPT_SHA256,
        "prompt text changed: bump PROMPT_VERSION, add a new prompts/ file and re-pin the digest"
    );
    assert!(SYSTEM_PROMPT.ends_with('\n'));
    assert!(PROMPT_VERSION.ends_with(".v1"));
}

#[test]
fn system_prompt_names_every_answer_type() {
    for t in ["single_choice", "multi_choice", "ranking", "scale", "open_text"] {
        assert!(SYSTEM_PROMPT.contains(t), "prompt does not mention {t}");
    }
    assert!(SYSTEM_PROMPT.contains("\"terminate\""));
}

#[test]
fn user_message_matches_golden() {
    let golden = include_str!("golden/user_message.txt");
    let built = prompt::build("SQ1. 귀하의 성별은?\n1) 남성\n2) 여성", 30_000);
    assert!(!built.truncated);
    assert_eq!(built.user, golden.trim_end_matches('\n'));
    assert_eq!(built.system, SYSTEM_PROMPT);
}
