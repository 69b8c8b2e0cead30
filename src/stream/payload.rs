use serde_json::Value;

/// Classified `data:` payload. The try-JSON-then-raw policy is an explicit
/// branch here rather than caught-exception control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Payload {
    /// JSON object carrying a string `text` field (structured format).
    Text(String),
    /// Anything else, delivered verbatim (legacy format).
    Raw(String),
    /// The `[DONE]` sentinel emitted by OpenAI-compatible upstreams.
    Done,
}

const DONE_SENTINEL: &str = "[DONE]";

pub(crate) fn classify(raw: &str) -> Payload {
    if raw == DONE_SENTINEL {
        return Payload::Done;
    }

    // A payload that is valid JSON but lacks a string `text` field falls
    // through to raw emission; it is never an error.
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(text) = map.get("text").and_then(Value::as_str) {
            return Payload::Text(text.to_string());
        }
    }

    Payload::Raw(raw.to_string())
}
