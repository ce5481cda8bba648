//! JSON extraction for model responses.
//!
//! Models are told to return bare JSON but routinely wrap it in code fences,
//! reasoning blocks or explanatory prose. This module finds the JSON object
//! inside that wrapping. It does not repair broken JSON.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?\s*\n?([\s\S]*?)\n?```").unwrap());

static THINK_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

/// Remove reasoning blocks and unwrap the first fenced code block, if any.
pub fn strip_wrapping(text: &str) -> String {
    let without_think = THINK_BLOCK.replace_all(text, "");
    let trimmed = without_think.trim();

    if let Some(inner) = CODE_BLOCK
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
    {
        if inner.contains('{') {
            return inner.to_string();
        }
    }

    trimmed.to_string()
}

/// Find the end (exclusive byte offset) of the balanced object starting at `start`.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the first JSON object embedded in a model response.
///
/// Returns a human-readable reason when no object can be found.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    let cleaned = strip_wrapping(text);
    if cleaned.is_empty() {
        return Err("Model response is empty".to_string());
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(map);
    }

    let mut first_error = None;
    for (start, _) in cleaned.match_indices('{') {
        let Some(end) = balanced_object_end(&cleaned, start) else {
            first_error.get_or_insert_with(|| "JSON object is not terminated".to_string());
            continue;
        };
        match serde_json::from_str::<Value>(&cleaned[start..end]) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert_with(|| format!("Invalid JSON: {}", e));
            }
        }
    }

    Err(first_error.unwrap_or_else(|| "No JSON object found in model response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let map = parse_object(r#"{"lineItems": []}"#).unwrap();
        assert!(map.contains_key("lineItems"));
    }

    #[test]
    fn test_code_fence() {
        let input = "```json\n{\"projectInfo\": {\"name\": \"Tower B\"}}\n```";
        let map = parse_object(input).unwrap();
        assert_eq!(map["projectInfo"]["name"], "Tower B");
    }

    #[test]
    fn test_prose_around_object() {
        let input = "Here is the extracted data:\n{\"lineItems\": [{\"description\": \"Roofing {phase 2}\"}]}\nLet me know if you need more.";
        let map = parse_object(input).unwrap();
        assert_eq!(map["lineItems"][0]["description"], "Roofing {phase 2}");
    }

    #[test]
    fn test_think_block_removed() {
        let input = "<think>the table has {many} rows</think>{\"lineItems\": []}";
        let map = parse_object(input).unwrap();
        assert!(map["lineItems"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_plain_text_fails() {
        let err = parse_object("I'm sorry, I could not read this document.").unwrap_err();
        assert!(err.contains("No JSON object"));
    }

    #[test]
    fn test_truncated_object_fails() {
        let err = parse_object(r#"{"lineItems": [{"description": "Concrete""#).unwrap_err();
        assert!(err.contains("not terminated"));
    }

    #[test]
    fn test_top_level_array_is_not_an_object() {
        assert!(parse_object(r#"[1, 2, 3]"#).is_err());
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let input = r#"Result: {"projectInfo": {"name": "The \"Annex\" }"}}"#;
        let map = parse_object(input).unwrap();
        assert_eq!(map["projectInfo"]["name"], "The \"Annex\" }");
    }
}
