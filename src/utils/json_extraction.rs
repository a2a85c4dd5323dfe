//! JSON extraction from LLM responses.
//!
//! The topic-announcement and scorecard prompts ask the backend for a bare
//! JSON object, but models routinely wrap the payload in markdown fences or
//! prose. This module digs the first well-formed object out of such mixed
//! content. Extraction strategies, in order:
//!
//! 1. A `json`-tagged markdown fence
//! 2. A generic markdown fence
//! 3. The first balanced `{...}` anywhere in the content
//!
//! Callers that fail all three fall back to canned content; extraction
//! failure is never an error the user sees.

use regex::Regex;

/// Extracts the first well-formed JSON object from LLM response content.
///
/// Returns `None` when no candidate substring parses as a JSON value.
pub fn extract_json_object(content: &str) -> Option<String> {
    let trimmed = content.trim();

    if let Some(json) = extract_from_fence(trimmed, r"```json\s*\n?([\s\S]*?)\n?```") {
        return Some(json);
    }

    if let Some(json) = extract_from_fence(trimmed, r"```(?:\w+)?\s*\n?([\s\S]*?)\n?```") {
        return Some(json);
    }

    balanced_object(trimmed)
}

/// Pulls a balanced object out of the first fenced block matching `pattern`.
fn extract_from_fence(content: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(content)?;
    balanced_object(caps.get(1)?.as_str().trim())
}

/// Finds the first balanced `{...}` in `content` that parses as JSON.
fn balanced_object(content: &str) -> Option<String> {
    let start = content.find('{')?;
    let substr = &content[start..];
    let end = find_matching_brace(substr)?;
    let candidate = &substr[..=end];

    if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Finds the index of the closing brace matching the leading `{` of `s`.
///
/// String literals (including escaped quotes) are skipped while tracking
/// depth, so braces inside JSON strings do not break the match.
pub fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
