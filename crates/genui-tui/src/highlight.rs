use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME_NAME: &str = "base16-ocean.dark";

struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

fn highlighter() -> &'static Highlighter {
    static HIGHLIGHTER: OnceLock<Highlighter> = OnceLock::new();
    HIGHLIGHTER.get_or_init(|| {
        let themes = ThemeSet::load_defaults();
        Highlighter {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: themes.themes.get(THEME_NAME).cloned().unwrap_or_default(),
        }
    })
}

fn to_style(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

/// Highlight HTML source, one ratatui line per source line
pub fn highlight_html(code: &str) -> Vec<Line<'static>> {
    let hl = highlighter();
    let syntax = hl
        .syntaxes
        .find_syntax_by_extension("html")
        .unwrap_or_else(|| hl.syntaxes.find_syntax_plain_text());
    let mut lines = HighlightLines::new(syntax, &hl.theme);

    LinesWithEndings::from(code)
        .map(|line| {
            let plain = line.trim_end_matches(['\n', '\r']);
            match lines.highlight_line(line, &hl.syntaxes) {
                Ok(regions) => Line::from(
                    regions
                        .into_iter()
                        .map(|(style, text)| {
                            Span::styled(text.trim_end_matches(['\n', '\r']).to_string(), to_style(style))
                        })
                        .collect::<Vec<_>>(),
                ),
                Err(err) => {
                    tracing::debug!(error = %err, "highlighting failed, showing plain line");
                    Line::raw(plain.to_string())
                }
            }
        })
        .collect()
}

/// Highlighted lines for the last code shown
#[derive(Default)]
pub struct HighlightCache {
    source: String,
    lines: Vec<Line<'static>>,
}

impl HighlightCache {
    pub fn lines(&mut self, code: &str) -> &[Line<'static>] {
        if self.source != code || (self.lines.is_empty() && !code.is_empty()) {
            self.source = code.to_string();
            self.lines = highlight_html(code);
        }
        &self.lines
    }
}
