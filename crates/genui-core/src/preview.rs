//! Terminal rendition of the generated markup.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

const MIN_WIDTH: usize = 20;

/// Render HTML as wrapped plain text lines
pub fn render_preview(code: &str, width: usize) -> Vec<String> {
    let text = html2text::from_read(Cursor::new(code.as_bytes()), width.max(MIN_WIDTH));
    text.lines().map(str::to_string).collect()
}

/// Rendered preview, rebuilt only when the refresh counter, the width, or the
/// code changes.
#[derive(Debug, Default)]
pub struct PreviewCache {
    key: Option<(u64, usize, u64)>,
    lines: Vec<String>,
    renders: u64,
}

impl PreviewCache {
    pub fn lines(&mut self, code: &str, refresh_key: u64, width: usize) -> &[String] {
        let key = (refresh_key, width, fingerprint(code));
        if self.key != Some(key) {
            self.lines = render_preview(code, width);
            self.key = Some(key);
            self.renders += 1;
            tracing::debug!(refresh_key, width, lines = self.lines.len(), "rendered preview");
        }
        &self.lines
    }

    /// Number of times the preview has been rebuilt
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

fn fingerprint(code: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    code.hash(&mut hasher);
    hasher.finish()
}
