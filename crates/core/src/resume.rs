//! Best-effort contact extraction from plain resume text.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ParsedResume;

/// Default bound on resume text handed to question generation.
pub const DEFAULT_RESUME_MAX_CHARS: usize = 4000;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static email pattern")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
        .expect("static phone pattern")
});

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Z][a-z]+ [A-Z][a-z]+)").expect("static name pattern")
});

/// Extract name, email and phone from resume text.
///
/// When no name line is found, the upload's file name (if any) is turned
/// into one: extension stripped, `-`/`_` become spaces, words title-cased.
#[must_use]
pub fn parse_resume(text: &str, file_name: Option<&str>) -> ParsedResume {
    let email = EMAIL.find(text).map(|m| m.as_str().to_owned());
    let phone = PHONE.find(text).map(|m| m.as_str().trim().to_owned());
    let name = NAME
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .or_else(|| file_name.and_then(name_from_file_name));

    ParsedResume {
        name,
        email,
        phone,
        text: text.to_owned(),
    }
}

fn name_from_file_name(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let lower = base.to_ascii_lowercase();
    let stem = [".pdf", ".docx", ".doc", ".txt"]
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map_or(base, |ext| &base[..base.len() - ext.len()]);

    let words: Vec<String> = stem
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Bound `text` to at most `max_chars` characters.
///
/// Prefers cutting after the last sentence end or newline inside the bound,
/// as long as that keeps at least half the budget; otherwise cuts hard on a
/// char boundary.
#[must_use]
pub fn truncate_resume_text(text: &str, max_chars: usize) -> &str {
    let Some((hard_end, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let prefix = &text[..hard_end];

    let soft = prefix
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|(i, c)| i + c.len_utf8())
        .last();

    match soft {
        Some(end) if prefix[..end].chars().count() >= max_chars / 2 => prefix[..end].trim_end(),
        _ => prefix,
    }
}
