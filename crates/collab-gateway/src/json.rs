//! Recovery of one JSON value from free-form generative-model text.
//!
//! Stages run in order and the first that parses wins:
//! 1. [`extract_payload`] takes the fenced block (or the outermost object).
//! 2. Direct parse.
//! 3. [`strip_trailing_commas`] drops trailing commas and control characters.
//! 4. [`repair_json`] fixes comments, quoting, Python-style literals and
//!    raw newlines in strings.
//!
//! If nothing parses, the error from stage 2 decides between
//! [`ParseError::Truncated`] and [`ParseError::Malformed`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::error::Category;
use serde_json::Value;

use crate::error::ParseError;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex"));

static OPEN_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*)$").expect("valid regex"));

static TRAILING_COMMA_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\}").expect("valid regex"));

static TRAILING_COMMA_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("valid regex"));

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid regex"));

/// Parse model output into a JSON value.
///
/// # Errors
///
/// - [`ParseError::Empty`] for blank input.
/// - [`ParseError::Truncated`] when the text ends inside a value.
/// - [`ParseError::Malformed`] for anything else that cannot be recovered.
pub fn parse_json_response(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let payload = extract_payload(text);
    let direct_err = match serde_json::from_str::<Value>(payload.trim()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let cleaned = strip_trailing_commas(payload);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        tracing::debug!("model JSON recovered after trailing-comma cleanup");
        return Ok(value);
    }

    if let Ok(value) = serde_json::from_str::<Value>(repair_json(payload).trim()) {
        tracing::debug!("model JSON recovered after repair pass");
        return Ok(value);
    }

    if direct_err.classify() == Category::Eof {
        Err(ParseError::Truncated)
    } else {
        Err(ParseError::Malformed(direct_err.to_string()))
    }
}

/// Contents of the first fenced code block (an unclosed fence counts when
/// it opens the text), else the span from the first
/// `{` to the last `}` when prose surrounds it, else the whole text.
#[must_use]
pub fn extract_payload(text: &str) -> &str {
    if let Some(inner) = FENCE.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str();
    }
    if let Some(inner) = OPEN_FENCE.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str();
    }
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Remove commas directly before `}` or `]`, and all control characters.
#[must_use]
pub fn strip_trailing_commas(text: &str) -> String {
    let no_obj = TRAILING_COMMA_OBJECT.replace_all(text, "}");
    let no_arr = TRAILING_COMMA_ARRAY.replace_all(&no_obj, "]");
    CONTROL_CHARS.replace_all(&no_arr, "").trim().to_string()
}

/// Best-effort rewrite of near-JSON into JSON.
///
/// Unterminated strings and unclosed containers are left as they are, so
/// truncated output still fails to parse.
#[must_use]
pub fn repair_json(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < len {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < len && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(len);
            }
            ',' => {
                let next = next_significant(&chars, i + 1);
                if !matches!(next.map(|j| chars[j]), Some('}' | ']')) {
                    out.push(',');
                }
                i += 1;
            }
            '-' | '0'..='9' => {
                while i < len && matches!(chars[i], '0'..='9' | '-' | '+' | '.' | 'e' | 'E') {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < len && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '$' | '-'))
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let is_key = next_significant(&chars, i).is_some_and(|j| chars[j] == ':');
                if is_key {
                    push_quoted(&mut out, &word);
                } else {
                    match word.as_str() {
                        "true" | "True" | "TRUE" => out.push_str("true"),
                        "false" | "False" | "FALSE" => out.push_str("false"),
                        "null" | "Null" | "NULL" | "None" | "undefined" | "NaN" | "Infinity" => {
                            out.push_str("null");
                        }
                        _ => push_quoted(&mut out, &word),
                    }
                }
            }
            c if c.is_control() && !matches!(c, '\n' | '\r' | '\t') => i += 1,
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn next_significant(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&j| !chars[j].is_whitespace())
}

fn push_quoted(out: &mut String, word: &str) {
    out.push('"');
    out.push_str(word);
    out.push('"');
}

/// Copy a string literal opened at `start` as a double-quoted JSON string.
/// Returns the index after the closing quote, or the input length when the
/// literal never closes.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let len = chars.len();
    out.push('"');
    let mut i = start + 1;
    while i < len {
        let c = chars[i];
        match c {
            '\\' => {
                match chars.get(i + 1) {
                    Some('\'') if quote == '\'' => out.push('\''),
                    Some(&next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                }
                i += 2;
                continue;
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
        i += 1;
    }
    len
}
