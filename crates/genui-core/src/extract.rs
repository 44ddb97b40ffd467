//! HTML extraction from free-form model output.
//!
//! Models wrap the markup they return in prose, markdown fences, or both.
//! [`extract_code`] picks the most likely HTML payload; [`normalize_response`]
//! is the cleanup pass the generation workflow runs first.

use regex::Regex;
use std::sync::OnceLock;

const FENCE: &str = "```";
const HTML_FENCE: &str = "```html";

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Optional tag: `html` directly, or any other word that ends the fence line
    RE.get_or_init(|| {
        Regex::new(r"(?is)```(?:html|[a-z0-9_+\-]+\r?\n)?(?:\r?\n)?(.*?)```")
            .expect("fenced block pattern is valid")
    })
}

fn html_document() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<html.*</html>").expect("html document pattern is valid"))
}

fn leading_html_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^html\s*").expect("html token pattern is valid"))
}

/// Return the best-guess HTML payload inside `text`.
///
/// Tries, in order: the contents of the first fenced block, the span from the
/// first `<html` to the last `</html>`, and finally the whole input. Every
/// result is trimmed. Empty or absent input yields an empty string.
pub fn extract_code<'a>(text: impl Into<Option<&'a str>>) -> String {
    let text = match text.into() {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    if let Some(inner) = fenced_block().captures(text).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }

    if let Some(document) = html_document().find(text) {
        return document.as_str().trim().to_string();
    }

    text.trim().to_string()
}

/// Strip fence markers and a leading bare `html` token from raw model text.
///
/// Runs unconditionally before [`extract_code`]; removes every "```html" and
/// "```" marker, not only the outer pair.
pub fn normalize_response(text: &str) -> String {
    let without_fences = text.replace(HTML_FENCE, "").replace(FENCE, "");
    leading_html_token()
        .replace(&without_fences, "")
        .trim()
        .to_string()
}
