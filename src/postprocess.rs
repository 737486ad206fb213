use crate::config::Extract;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalizes extracted text before it goes into the prompt.
pub fn clean_text(cfg: &Extract, raw: &str) -> String {
    let mut s = raw.to_string();

    if cfg.normalize_newlines {
        s = s.replace("\r\n", "\n").replace('\r', "\n");
    }

    // Documents authored on macOS often arrive decomposed (NFD), which
    // splits Hangul syllables into jamo.
    if cfg.normalize_unicode {
        s = s.nfc().collect::<String>();
    }

    s = sanitize_control_chars(&s, &cfg.control_chars_to_sanitize);

    if cfg.trim_trailing_whitespace {
        s = s
            .lines()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
    }

    if !cfg.strip_line_patterns.is_empty() {
        s = remove_by_regex(&cfg.strip_line_patterns, &s);
    }

    if cfg.collapse_blank_lines {
        s = collapse_blank_lines(&s);
    }

    s.trim().to_string()
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 { !mask[cp as usize] } else { true }
        })
        .collect()
}

fn remove_by_regex(patterns: &[String], s: &str) -> String {
    // Patterns are checked by Config::validate; anything that still fails to
    // compile is ignored rather than failing a request.
    let regs: Vec<Regex> = patterns.iter().filter_map(|p| Regex::new(p).ok()).collect();

    s.lines()
        .filter(|line| !regs.iter().any(|r| r.is_match(line.trim())))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_blank_lines(s: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0usize;
    for line in s.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n")
}
