use genui_core::{Framework, NoticeLevel, Pane, Provider};
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Tabs, Wrap,
    },
    Frame,
};

use crate::app::{App, FocusPane, InputMode, ScrollState, SignInField};

const PLACEHOLDER: &str = "Your component & code will appear here.";
const PROMPT_HINT: &str = "Describe your component and let AI code it for you.";
const AVATAR_MARKER: &str = "●";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [left_area, output_area] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(65),
    ])
    .areas(body_area);

    let framework_height = Framework::all().len() as u16 + 2;
    let [framework_area, prompt_area] = Layout::vertical([
        Constraint::Length(framework_height),
        Constraint::Min(3),
    ])
    .areas(left_area);

    render_frameworks(app, frame, framework_area);
    render_prompt(app, frame, prompt_area);
    render_output(app, frame, output_area);
    render_footer(app, frame, footer_area);

    if app.session.view.expanded_preview {
        render_expanded_preview(app, frame, area);
    } else {
        app.overlay_area = None;
    }

    // Render popups (in order of priority)
    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    } else if app.show_provider_picker {
        render_provider_picker(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    } else if app.sign_in_form.is_some() {
        render_sign_in(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let account = match &app.user {
        Some(user) => {
            let mut spans = Vec::with_capacity(3);
            // Stands in for the avatar image
            if user.photo_url.is_some() {
                spans.push(Span::styled(format!(" {AVATAR_MARKER}"), Style::default().fg(Color::Green)));
            }
            spans.push(Span::styled(
                format!(" {} ", user.display_name),
                Style::default().fg(Color::Green).bold(),
            ));
            spans.push(Span::styled("(L logout) ", Style::default().fg(Color::Gray)));
            spans
        }
        None => vec![Span::styled(" s sign in ", Style::default().fg(Color::Yellow))],
    };

    let mut spans = vec![
        Span::styled(" GenUI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{}: {}", app.current_provider.display_name(), app.selected_model),
            Style::default().fg(Color::White),
        ),
    ];

    let used: usize = spans.iter().map(|s| s.width()).sum::<usize>()
        + account.iter().map(|s| s.width()).sum::<usize>();
    let pad = (area.width as usize).saturating_sub(used);
    spans.push(Span::raw(" ".repeat(pad)));
    spans.extend(account);

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn focus_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn render_frameworks(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(focus_color(app.focus == FocusPane::Framework)))
        .title(" Framework ");

    let items: Vec<ListItem> = Framework::all()
        .iter()
        .map(|framework| ListItem::new(format!(" {} ", framework.display_name())))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.framework_state);
}

fn render_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else {
        focus_color(app.focus == FocusPane::Prompt)
    };

    let title = if app.session.view.loading {
        // Animated ellipsis: cycles through ".", "..", "..."
        format!(" Generating{} ", ".".repeat(app.animation_frame as usize + 1))
    } else {
        " Describe your component (i to edit, Enter to generate) ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);
    let inner = block.inner(area);

    let text = if app.session.prompt.is_empty() && !editing {
        Text::from(Span::styled(PROMPT_HINT, Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(app.session.prompt.as_str())
    };

    // Keep the cursor line visible
    let (cursor_row, cursor_col) = prompt_cursor_position(&app.session.prompt, app.prompt_cursor);
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));

    let prompt = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(prompt, area);

    if editing {
        let cursor_x = cursor_col.min(inner.width.saturating_sub(1));
        frame.set_cursor_position((inner.x + cursor_x, inner.y + cursor_row - scroll));
    }
}

/// Row and column of a char-index cursor inside unwrapped multi-line text
fn prompt_cursor_position(text: &str, cursor: usize) -> (u16, u16) {
    let before: String = text.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
    (row as u16, col as u16)
}

fn render_output(app: &mut App, frame: &mut Frame, area: Rect) {
    app.output_area = Some(area);
    let view = app.session.view.clone();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(focus_color(app.focus == FocusPane::Output)));

    if !view.output_available {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(inner);
        let placeholder = Paragraph::new(PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .centered();
        frame.render_widget(placeholder, middle);
        return;
    }

    let block = block.title(format!(" {} ", view.pane.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [tabs_area, body_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let selected = match view.pane {
        Pane::Code => 0,
        Pane::Preview => 1,
    };
    let tabs = Tabs::new(vec![Pane::Code.tab_label(), Pane::Preview.tab_label()])
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, tabs_area);

    let lines: Vec<Line<'static>> = match view.pane {
        Pane::Code => app.highlight_cache.lines(app.session.code()).to_vec(),
        Pane::Preview => app
            .preview_cache
            .lines(app.session.code(), view.refresh_key, body_area.width.saturating_sub(1) as usize)
            .iter()
            .map(|l| Line::raw(l.clone()))
            .collect(),
    };

    render_scrolled(frame, body_area, lines, &mut app.output_scroll);
}

fn render_scrolled(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>, scroll: &mut ScrollState) {
    scroll.height = area.height;
    scroll.total = lines.len().min(u16::MAX as usize) as u16;
    scroll.offset = scroll.offset.min(scroll.total.saturating_sub(scroll.height));

    let paragraph = Paragraph::new(lines).scroll((scroll.offset, 0));
    frame.render_widget(paragraph, area);

    if scroll.total > scroll.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state = ScrollbarState::new(scroll.total as usize)
            .position(scroll.offset as usize);
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    if let Some(notice) = &app.notice {
        let style = match notice.level {
            NoticeLevel::Success => Style::default().bg(Color::Green).fg(Color::Black),
            NoticeLevel::Info => Style::default().bg(Color::Blue).fg(Color::White),
            NoticeLevel::Warning => Style::default().bg(Color::Yellow).fg(Color::Black),
            NoticeLevel::Error => Style::default().bg(Color::Red).fg(Color::White),
        };
        let line = Line::from(Span::styled(format!(" {} ", notice.message), style));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = if app.session.view.expanded_preview {
        &[("j/k", "scroll"), ("r", "refresh"), ("c", "copy"), ("d", "download"), ("Esc", "close")]
    } else {
        match app.input_mode {
            InputMode::Editing => &[("Enter", "generate"), ("Alt+Enter", "newline"), ("Esc", "done")],
            InputMode::Normal => &[
                ("i", "edit"),
                ("Enter", "generate"),
                ("Tab", "focus"),
                ("t", "pane"),
                ("c", "copy"),
                ("d", "download"),
                ("r", "refresh"),
                ("f", "expand"),
                ("P", "provider"),
                ("M", "model"),
                ("q", "quit"),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_expanded_preview(app: &mut App, frame: &mut Frame, area: Rect) {
    let overlay = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Preview (Esc to close) ");
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    app.overlay_area = Some(overlay);

    let refresh_key = app.session.view.refresh_key;
    let lines: Vec<Line<'static>> = app
        .preview_cache
        .lines(app.session.code(), refresh_key, inner.width.saturating_sub(1) as usize)
        .iter()
        .map(|l| Line::raw(l.clone()))
        .collect();

    render_scrolled(frame, inner, lines, &mut app.overlay_scroll);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 40, app.available_models.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if model == &app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup_area = popup_rect(area, 45, providers.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Provider ");

    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let key_source = app.get_key_source(*provider);
            let is_current = *provider == app.current_provider;

            let status = match key_source {
                Some("env") => "(env var)",
                Some("config") => "(configured)",
                Some("local") => "(local)",
                _ => "(needs key)",
            };
            let prefix = if is_current { "* " } else { "  " };

            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if key_source.is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{}{} {}", prefix, provider.display_name(), status)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.provider_picker_state);
}

/// Mask all but the last four characters
fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let masked_len = len - 4;
    let last_four: String = key.chars().skip(masked_len).collect();
    format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Enter API Key for {} ", Provider::Gemini.display_name()));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let input = Paragraph::new(mask_key(&app.api_key_input)).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let char_count = format!("{} characters", app.api_key_input.chars().count());
    let status = Paragraph::new(char_count).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}

fn render_sign_in(app: &App, frame: &mut Frame, area: Rect) {
    let Some(form) = &app.sign_in_form else {
        return;
    };

    let popup_area = popup_rect(area, 56, 9);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Sign in (Enter to continue, Esc to cancel) ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let fields = [
        (SignInField::DisplayName, "Name", &form.display_name, 0u16),
        (SignInField::PhotoUrl, "Photo URL (optional)", &form.photo_url, 3u16),
    ];
    for (field, label, value, offset) in fields {
        let active = form.field == field;
        let label_style = if active {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(
            Paragraph::new(label).style(label_style),
            Rect::new(inner.x, inner.y + offset, inner.width, 1),
        );
        let input_area = Rect::new(inner.x, inner.y + offset + 1, inner.width, 1);
        frame.render_widget(
            Paragraph::new(value.as_str()).style(Style::default().fg(Color::Cyan)),
            input_area,
        );
        if active {
            let cursor_x = form.cursor.min(input_area.width.saturating_sub(1) as usize) as u16;
            frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genui_core::{Config, ProfileIdentity, User};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn test_app(dir: &TempDir) -> App {
        let identity = Arc::new(ProfileIdentity::open(dir.path().join("profile.json")));
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Config::new(), None, identity, tx)
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_placeholder_before_first_generation() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let text = screen_text(&mut app);
        assert!(text.contains(PLACEHOLDER));
        assert!(text.contains("HTML + Tailwind CSS"));
        assert!(text.contains("s sign in"));
    }

    #[test]
    fn test_code_and_preview_tabs_after_generation() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.session.prompt = "greeting".to_string();
        let request = app.session.submit().unwrap();
        app.handle_generated(
            request.seq,
            Ok(json!({"text": "<html><body><h1>Hello there</h1></body></html>"})),
        );

        let text = screen_text(&mut app);
        assert!(!text.contains(PLACEHOLDER));
        assert!(text.contains(" Code Editor "));
        assert!(text.contains("Code | Preview"));
        assert!(text.contains("<h1>Hello there</h1>"));

        app.show_pane(Pane::Preview);
        let text = screen_text(&mut app);
        assert!(text.contains("Hello there"));
        assert!(!text.contains("<h1>"));
    }

    #[test]
    fn test_header_marks_profile_photo() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.user = Some(User {
            display_name: "Ada".to_string(),
            photo_url: None,
        });
        let text = screen_text(&mut app);
        assert!(text.contains(" Ada (L logout)"));
        assert!(!text.contains(AVATAR_MARKER));

        app.user = Some(User {
            display_name: "Ada".to_string(),
            photo_url: Some("https://example.com/ada.png".to_string()),
        });
        let text = screen_text(&mut app);
        assert!(text.contains(&format!("{AVATAR_MARKER} Ada (L logout)")));
    }

    #[test]
    fn test_cursor_position_in_multiline_prompt() {
        assert_eq!(prompt_cursor_position("ab\ncd", 0), (0, 0));
        assert_eq!(prompt_cursor_position("ab\ncd", 2), (0, 2));
        assert_eq!(prompt_cursor_position("ab\ncd", 3), (1, 0));
        assert_eq!(prompt_cursor_position("ab\nçd", 5), (1, 2));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("abcd"), "****");
        assert_eq!(mask_key("abcdef"), "**...cdef");
    }
}
