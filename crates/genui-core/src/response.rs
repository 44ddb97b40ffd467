//! Decoding of model response bodies.
//!
//! Providers disagree on where the generated text lives. Each known layout is
//! a variant of [`ResponseShape`]; anything else is `Unrecognized` and gets
//! rejected before it reaches the extraction step.

use serde_json::Value;

const CANDIDATE_TEXT: &str = "/candidates/0/content/parts/0/text";
const WRAPPED_CANDIDATE_TEXT: &str = "/response/candidates/0/content/parts/0/text";
const TEXT: &str = "/text";
const WRAPPED_TEXT: &str = "/response/text";
const COMPLETION: &str = "/response";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// Gemini `candidates[0].content.parts[0].text`, bare or under `response`
    Candidates(String),
    /// A flat `text` property, bare or under `response`
    Text(String),
    /// Ollama `/api/generate` with `response` holding the completion
    Completion(String),
    Unrecognized,
}

impl ResponseShape {
    pub fn decode(body: &Value) -> Self {
        if let Some(text) = string_at(body, CANDIDATE_TEXT).or_else(|| string_at(body, WRAPPED_CANDIDATE_TEXT)) {
            return ResponseShape::Candidates(text);
        }
        if let Some(text) = string_at(body, TEXT).or_else(|| string_at(body, WRAPPED_TEXT)) {
            return ResponseShape::Text(text);
        }
        if let Some(text) = string_at(body, COMPLETION) {
            return ResponseShape::Completion(text);
        }
        ResponseShape::Unrecognized
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ResponseShape::Candidates(text)
            | ResponseShape::Text(text)
            | ResponseShape::Completion(text) => Some(text),
            ResponseShape::Unrecognized => None,
        }
    }
}

// Empty strings count as absent, same as a missing field
fn string_at(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
