//! Tolerant recovery of a JSON record list from a raw model response.
//!
//! The prompt demands a bare JSON array, but responses arrive wrapped in
//! code fences, preceded by prose, followed by commentary, or as a single
//! object. Everything here is pure and synchronous so the odd shapes are
//! cheap to pin down in tests.

use serde_json::Value;

/// Strip a markdown code fence (```json ... ``` or ``` ... ```) and
/// surrounding whitespace.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // Skip an optional language tag on the fence line
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.rfind("```") {
            return body[..end].trim();
        }
        return body.trim();
    }
    trimmed
}

/// Return the first well-balanced top-level `[...]` substring, tracking
/// bracket depth and skipping brackets inside string literals. Returns
/// None when no balanced array exists.
pub fn first_balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Recover the list of candidate objects from a raw model response.
///
/// Order of attempts mirrors how responses actually go wrong: strip any
/// code fence, isolate the first balanced array and parse it; if there is
/// no array at all, parse the payload as a single object — either one
/// record, or a wrapper with a `grants` key holding the array.
pub fn extract_json_payload(response: &str) -> Result<Vec<Value>, String> {
    let payload = strip_code_fences(response);

    if let Some(array_text) = first_balanced_array(payload) {
        let parsed: Value = serde_json::from_str(array_text)
            .map_err(|e| format!("invalid JSON array: {e}"))?;
        return match parsed {
            Value::Array(items) => Ok(items),
            _ => Err("balanced scan did not yield an array".to_string()),
        };
    }

    // No array anywhere — maybe the model returned a bare object.
    let parsed: Value =
        serde_json::from_str(payload).map_err(|e| format!("no JSON payload in response: {e}"))?;
    match parsed {
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("grants") {
                return Ok(items);
            }
            Ok(vec![Value::Object(map)])
        }
        other => Err(format!("unexpected JSON payload type: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array() {
        let items = extract_json_payload(r#"[{"name":"A","provider":"B"}]"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "A");
    }

    #[test]
    fn fenced_with_trailing_prose() {
        let response = "```json\n[{\"name\":\"A\",\"provider\":\"B\"}]\n``` extra trailing text";
        let items = extract_json_payload(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "A");
        assert_eq!(items[0]["provider"], "B");
    }

    #[test]
    fn bare_fence_without_language_tag() {
        let response = "```\n[{\"name\":\"A\",\"provider\":\"B\"}]\n```";
        assert_eq!(extract_json_payload(response).unwrap().len(), 1);
    }

    #[test]
    fn leading_prose_before_array() {
        let response = "Here are the grants I found:\n[{\"name\":\"A\",\"provider\":\"B\"}]\nLet me know.";
        assert_eq!(extract_json_payload(response).unwrap().len(), 1);
    }

    #[test]
    fn nested_arrays_balance() {
        let response = r#"[{"name":"A","provider":"B","sectors":["x","y"]}] trailing"#;
        let items = extract_json_payload(response).unwrap();
        assert_eq!(items[0]["sectors"][1], "y");
    }

    #[test]
    fn brackets_inside_strings_ignored() {
        let response = r#"[{"name":"A [draft]","provider":"B ] C"}]"#;
        let items = extract_json_payload(response).unwrap();
        assert_eq!(items[0]["name"], "A [draft]");
    }

    #[test]
    fn single_object_becomes_one_record() {
        let items = extract_json_payload(r#"{"name":"A","provider":"B"}"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["provider"], "B");
    }

    #[test]
    fn grants_wrapper_object_unwrapped() {
        let items =
            extract_json_payload(r#"{"grants":[{"name":"A","provider":"B"},{"name":"C","provider":"D"}]}"#)
                .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn empty_array_is_zero_records() {
        assert!(extract_json_payload("[]").unwrap().is_empty());
    }

    #[test]
    fn prose_only_is_an_error() {
        assert!(extract_json_payload("I could not find any grants on this page.").is_err());
    }

    #[test]
    fn unbalanced_array_is_an_error() {
        assert!(extract_json_payload(r#"[{"name":"A","provider":"B"}"#).is_err());
    }

    #[test]
    fn first_balanced_array_finds_match() {
        assert_eq!(first_balanced_array("x [1, [2], 3] y"), Some("[1, [2], 3]"));
        assert_eq!(first_balanced_array("no array"), None);
        assert_eq!(first_balanced_array("[1, 2"), None);
    }
}
