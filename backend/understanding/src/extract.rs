//! Locate JSON embedded in prose.
//!
//! Used when a reply does not parse as a whole. Balanced bracket spans are
//! tried first, in order of their opening bracket; the greedy first-`{` to
//! last-`}` (and `[`..`]`) match comes last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on opening brackets examined per reply.
const MAX_CANDIDATES: usize = 32;

static GREEDY_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static GREEDY_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Substrings of `text` that may hold a JSON value, most plausible first.
pub fn json_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();

    for (start, _) in text
        .char_indices()
        .filter(|(_, c)| matches!(c, '{' | '['))
        .take(MAX_CANDIDATES)
    {
        if let Some(end) = matching_close(text, start) {
            candidates.push(&text[start..=end]);
        }
    }

    for re in [&*GREEDY_OBJECT_RE, &*GREEDY_ARRAY_RE] {
        if let Some(m) = re.find(text) {
            if !candidates.contains(&m.as_str()) {
                candidates.push(m.as_str());
            }
        }
    }

    candidates
}

/// Byte index of the bracket closing the one at `start`.
///
/// String literals are skipped so brackets inside labels do not count.
/// A mismatched closer ends the search.
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_inside_prose() {
        let text = "Sure! Here is the result: {\"detections\": [{\"label\": \"a\"}]} Hope it helps.";
        assert_eq!(
            json_candidates(text).first().copied(),
            Some("{\"detections\": [{\"label\": \"a\"}]}")
        );
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let text = "note: [{\"label\": \"sign ]{ \\\" weird\", \"bbox\": [1,2,3,4]}] end";
        let span = json_candidates(text)[0];
        assert!(span.starts_with("[{"));
        assert!(span.ends_with("}]"));
        assert!(serde_json::from_str::<serde_json::Value>(span).is_ok());
    }

    #[test]
    fn unbalanced_text_has_no_span() {
        assert!(json_candidates("{\"label\": \"a\"").is_empty());
        assert!(json_candidates("I cannot analyze this image.").is_empty());
    }

    #[test]
    fn candidates_include_inner_spans_and_greedy_match() {
        let text = "{\"result\": {\"detections\": []}} trailing }";
        let candidates = json_candidates(text);
        assert_eq!(candidates[0], "{\"result\": {\"detections\": []}}");
        assert!(candidates.contains(&"{\"detections\": []}"));
        assert!(candidates.contains(&"[]"));
        assert_eq!(candidates.last().copied(), Some("{\"result\": {\"detections\": []}} trailing }"));
    }
}
