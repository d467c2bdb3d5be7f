use anyhow::{Result, anyhow};
use isolang::Language;
use std::path::Path;

/// Language utilities for caption track codes
///
/// Caption platforms label tracks with BCP 47 style tags (`en`, `en-US`,
/// `zh-Hans`, `en-orig`). This module matches those tags against configured
/// language patterns, maps study subjects to the codes they expect, and
/// normalizes base codes through ISO 639.

/// Subjects of the study taxonomy and the track codes each one accepts.
/// The first code of every list is the canonical code stored on fallback.
const SUBJECT_LANGUAGE_CODES: &[(&str, &[&str])] = &[
    ("English", &["en", "en-US", "en-GB"]),
    ("French", &["fr", "fr-FR", "fr-CA"]),
    ("Spanish", &["es", "es-ES", "es-MX", "es-419"]),
    ("German", &["de", "de-DE"]),
    ("Italian", &["it", "it-IT"]),
    ("Japanese", &["ja"]),
    ("Korean", &["ko"]),
    ("Chinese", &["zh", "zh-Hans", "zh-Hant", "zh-CN", "zh-TW"]),
];

/// Check a track code against a pattern.
///
/// A pattern is either an exact code (`ja`) or a prefix wildcard (`en.*`)
/// that matches the bare prefix and any subtag after it (`en-US`, `en_GB`,
/// `en-orig`). Comparison is case-insensitive.
pub fn matches_pattern(code: &str, pattern: &str) -> bool {
    let code = code.trim().to_lowercase();
    let pattern = pattern.trim().to_lowercase();

    match pattern.strip_suffix(".*") {
        Some(prefix) => {
            code == prefix
                || code
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('-') || rest.starts_with('_'))
        }
        None => code == pattern,
    }
}

/// Check a code against an ordered list of patterns
pub fn matches_any_pattern<S: AsRef<str>>(code: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches_pattern(code, p.as_ref()))
}

/// A pattern is valid when its base part is a 2 or 3 letter code
pub fn validate_pattern(pattern: &str) -> Result<()> {
    let base = pattern.trim().strip_suffix(".*").unwrap_or(pattern.trim());
    let base = base_language(base);

    if !(2..=3).contains(&base.len()) || !base.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("Invalid language pattern: {}", pattern));
    }
    Ok(())
}

/// Extract the language code from a downloaded caption file name.
///
/// `temp_abc123.zh-Hans.vtt` yields `zh-Hans`: the component just before the
/// extension, provided the name has at least three dot-separated parts.
pub fn language_from_caption_filename<P: AsRef<Path>>(path: P) -> Option<String> {
    let file_name = path.as_ref().file_name()?.to_string_lossy().to_string();
    let parts: Vec<&str> = file_name.split('.').collect();

    if parts.len() >= 3 {
        let code = parts[parts.len() - 2];
        if !code.is_empty() {
            return Some(code.to_string());
        }
    }
    None
}

/// Track codes expected for a study subject, matched case-insensitively
pub fn subject_language_codes(subject: &str) -> Option<&'static [&'static str]> {
    let subject = subject.trim();
    SUBJECT_LANGUAGE_CODES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(subject))
        .map(|(_, codes)| *codes)
}

/// Canonical code for a subject (the first expected code)
pub fn canonical_subject_code(subject: &str) -> Option<&'static str> {
    subject_language_codes(subject).and_then(|codes| codes.first().copied())
}

/// Whether a stored language code is one the subject expects.
///
/// Membership is exact: `en-orig` is not an English code even though its
/// base language is English, so such rows are refetched.
pub fn language_matches_subject(code: Option<&str>, subject: &str) -> bool {
    match (code, subject_language_codes(subject)) {
        (Some(code), Some(codes)) => codes.contains(&code),
        _ => false,
    }
}

/// Base language of a tag (`en-US` -> `en`, `zh_Hant` -> `zh`)
pub fn base_language(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = base_language(code);

    // If it's a 2-letter code, convert to 3-letter
    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    }
    // If it's already a 3-letter code, ensure it's ISO 639-2/T
    else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // ISO 639-2/B codes that differ from their 639-2/T form
        let part2t = match normalized_code.as_str() {
            "fre" => Some("fra"),
            "ger" => Some("deu"),
            "dut" => Some("nld"),
            "gre" => Some("ell"),
            "chi" => Some("zho"),
            "cze" => Some("ces"),
            "per" => Some("fas"),
            "rum" => Some("ron"),
            _ => None,
        };
        if let Some(part2t) = part2t {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two tags share the same base language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a tag
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
