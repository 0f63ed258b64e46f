//! Pull candidate records out of free-form model output.
//!
//! Models wrap JSON in Markdown fences, prepend chatter ("Here are some songs:"), or nest the
//! array under a key. We accept all of those and skip entries that are not objects.

use serde_json::Value;
use songpipe_core::{CandidateReference, Error, Result};

const LIST_KEYS: &[&str] = &["songs", "recommendations", "items", "results", "tracks"];

/// Return the body of the first fenced code block, or `s` unchanged.
fn strip_code_fence(s: &str) -> &str {
    let Some(open) = s.find("```") else {
        return s;
    };
    let after = &s[open + 3..];
    // Skip the info string (```json).
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(after.len());
    let body = &after[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn span(s: &str, open: char, close: char) -> Option<&str> {
    let a = s.find(open)?;
    let b = s.rfind(close)?;
    (b > a).then(|| &s[a..=b])
}

/// Parse the outermost `[...]` or `{...}` span, trying whichever opens first.
fn extract_json(s: &str) -> Option<Value> {
    let mut spans = vec![(s.find('['), '[', ']'), (s.find('{'), '{', '}')];
    spans.sort_by_key(|(pos, _, _)| pos.unwrap_or(usize::MAX));
    spans
        .into_iter()
        .filter(|(pos, _, _)| pos.is_some())
        .find_map(|(_, open, close)| {
            span(s, open, close).and_then(|t| serde_json::from_str::<Value>(t).ok())
        })
}

fn looks_like_candidate(map: &serde_json::Map<String, Value>) -> bool {
    ["title", "artist", "url", "rawUrl", "raw_url", "link"]
        .iter()
        .any(|k| map.contains_key(*k))
}

fn from_items(items: Vec<Value>) -> Vec<CandidateReference> {
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| match serde_json::from_value::<CandidateReference>(v) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed candidate entry");
                None
            }
        })
        .collect()
}

pub fn candidates_from_value(v: Value) -> Result<Vec<CandidateReference>> {
    match v {
        Value::Array(items) => Ok(from_items(items)),
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if let Some(Value::Array(items)) = map.remove(*key) {
                    return Ok(from_items(items));
                }
            }
            if looks_like_candidate(&map) {
                return Ok(from_items(vec![Value::Object(map)]));
            }
            Err(Error::Parse(
                "json object has no candidate list".to_string(),
            ))
        }
        other => Err(Error::Parse(format!(
            "expected a json array or object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn parse_candidates(text: &str) -> Result<Vec<CandidateReference>> {
    let t = text.trim();
    if t.is_empty() {
        return Err(Error::Parse("empty input".to_string()));
    }
    let body = strip_code_fence(t);
    let v = serde_json::from_str::<Value>(body)
        .ok()
        .or_else(|| extract_json(body))
        .or_else(|| extract_json(t))
        .ok_or_else(|| Error::Parse("no json array or object found".to_string()))?;
    candidates_from_value(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_array() {
        let cs = parse_candidates(
            r#"[{"title":"Song A","artist":"Artist A","url":"https://youtu.be/aaaaaaaaaaa","reason":"upbeat"}]"#,
        )
        .unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].title.as_deref(), Some("Song A"));
        assert_eq!(cs[0].reason.as_deref(), Some("upbeat"));
    }

    #[test]
    fn fenced_with_chatter() {
        let text = "Here are some songs for you:\n```json\n[\n {\"title\":\"A\"},\n {\"title\":\"B\",\"link\":\"x\"}\n]\n```\nEnjoy!";
        let cs = parse_candidates(text).unwrap();
        let titles: Vec<_> = cs.iter().map(|c| c.title_str()).collect();
        assert_eq!(titles, ["A", "B"]);
        assert_eq!(cs[1].url.as_deref(), Some("x"));
    }

    #[test]
    fn unfenced_prose_around_array() {
        let cs = parse_candidates("Sure! [{\"title\":\"A\"}] Hope that helps.").unwrap();
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn nested_under_songs_key() {
        let cs = parse_candidates(r#"{"mood":"calm","songs":[{"title":"A"},{"title":"B"}]}"#)
            .unwrap();
        assert_eq!(cs.len(), 2);
    }

    #[test]
    fn single_object_is_one_candidate() {
        let cs = parse_candidates(r#"{"title":"Solo","artist":"X"}"#).unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].artist_str(), "X");
    }

    #[test]
    fn non_object_entries_are_skipped_but_mistyped_fields_are_kept() {
        let cs = parse_candidates(
            r#"["nope", 3, {"title": 5}, {"url": 123, "title": "Song"}, {"title":"ok"}]"#,
        )
        .unwrap();
        let titles: Vec<_> = cs.iter().map(|c| c.title_str()).collect();
        assert_eq!(titles, ["5", "Song", "ok"]);
        assert_eq!(cs[1].url.as_deref(), Some("123"));
    }

    #[test]
    fn errors_on_no_json() {
        assert!(matches!(parse_candidates(""), Err(Error::Parse(_))));
        assert!(matches!(
            parse_candidates("I could not think of any songs."),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_candidates(r#"{"mood":"calm"}"#),
            Err(Error::Parse(_))
        ));
        assert!(matches!(parse_candidates("42"), Err(Error::Parse(_))));
    }
}
