use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use genui_core::Pane;
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Generated { seq, result } => app.handle_generated(seq, result),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Popups take every key while open
    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return Ok(());
    }
    if app.show_provider_picker {
        handle_provider_picker(app, key);
        return Ok(());
    }
    if app.show_model_picker {
        handle_model_picker(app, key);
        return Ok(());
    }
    if app.sign_in_form.is_some() {
        handle_sign_in_form(app, key).await;
        return Ok(());
    }
    if app.session.view.expanded_preview {
        handle_expanded_preview(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await,
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles: Framework -> Prompt -> Output -> Framework
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Framework => FocusPane::Prompt,
                FocusPane::Prompt => FocusPane::Output,
                FocusPane::Output => FocusPane::Framework,
            };
        }
        KeyCode::BackTab => {
            app.focus = match app.focus {
                FocusPane::Framework => FocusPane::Output,
                FocusPane::Prompt => FocusPane::Framework,
                FocusPane::Output => FocusPane::Prompt,
            };
        }

        KeyCode::Char('i') => {
            app.focus = FocusPane::Prompt;
            app.input_mode = InputMode::Editing;
            app.prompt_end();
        }
        KeyCode::Enter => {
            if app.focus == FocusPane::Prompt && app.session.prompt.trim().is_empty() {
                app.input_mode = InputMode::Editing;
            } else {
                app.start_generation();
            }
        }

        // Navigation - depends on focus
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Framework => app.framework_nav_down(),
            FocusPane::Output => app.output_scroll.down(1),
            FocusPane::Prompt => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Framework => app.framework_nav_up(),
            FocusPane::Output => app.output_scroll.up(1),
            FocusPane::Prompt => {}
        },
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.output_scroll.half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.output_scroll.half_page_up();
        }

        // Panes
        KeyCode::Char('1') => app.show_pane(Pane::Code),
        KeyCode::Char('2') => app.show_pane(Pane::Preview),
        KeyCode::Char('t') => app.show_pane(app.session.view.pane.toggled()),

        // Output actions
        KeyCode::Char('c') => app.copy_code(),
        KeyCode::Char('d') => app.download_code(),
        KeyCode::Char('r') => app.refresh_preview(),
        KeyCode::Char('f') => app.toggle_expanded_preview(),

        // Account
        KeyCode::Char('s') => {
            if app.user.is_none() {
                app.begin_sign_in();
            }
        }
        KeyCode::Char('L') => app.sign_out().await,

        // Provider and model
        KeyCode::Char('P') => app.open_provider_picker(),
        KeyCode::Char('M') => app.open_model_picker().await,

        KeyCode::Esc => app.notice = None,

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        // Alt+Enter or Ctrl+J for newline
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => app.prompt_insert('\n'),
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.prompt_insert('\n')
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.start_generation();
        }
        KeyCode::Backspace => app.prompt_backspace(),
        KeyCode::Delete => app.prompt_delete(),
        KeyCode::Left => app.prompt_left(),
        KeyCode::Right => app.prompt_right(),
        KeyCode::Home => app.prompt_home(),
        KeyCode::End => app.prompt_end(),
        KeyCode::Char(c) => app.prompt_insert(c),
        _ => {}
    }
}

fn handle_expanded_preview(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('q') => app.toggle_expanded_preview(),
        KeyCode::Char('j') | KeyCode::Down => app.overlay_scroll.down(1),
        KeyCode::Char('k') | KeyCode::Up => app.overlay_scroll.up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.overlay_scroll.half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.overlay_scroll.half_page_up();
        }
        KeyCode::Char('r') => app.refresh_preview(),
        KeyCode::Char('c') => app.copy_code(),
        KeyCode::Char('d') => app.download_code(),
        // Rejected as blocked while the overlay is open
        KeyCode::Char('s') => {
            if app.user.is_none() {
                app.begin_sign_in();
            }
        }
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_api_key_input(),
        KeyCode::Enter => app.submit_api_key(),
        KeyCode::Backspace => app.api_key_backspace(),
        KeyCode::Left => app.api_key_left(),
        KeyCode::Right => app.api_key_right(),
        KeyCode::Char(c) => app.api_key_insert(c),
        _ => {}
    }
}

fn handle_provider_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_provider_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.provider_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.provider_picker_nav_up(),
        KeyCode::Enter => app.select_provider(),
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

async fn handle_sign_in_form(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_sign_in(),
        KeyCode::Enter => app.submit_sign_in().await,
        _ => {
            let Some(form) = app.sign_in_form.as_mut() else {
                return;
            };
            match key.code {
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.switch_field(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Left => form.move_left(),
                KeyCode::Right => form.move_right(),
                KeyCode::Char(c) => form.insert_char(c),
                _ => {}
            }
        }
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.popup_open() {
        return;
    }
    let x = mouse.column;
    let y = mouse.row;

    let scroll = if app.session.view.expanded_preview {
        match app.overlay_area {
            Some(area) if point_in_rect(x, y, area) => &mut app.overlay_scroll,
            _ => return,
        }
    } else {
        match app.output_area {
            Some(area) if point_in_rect(x, y, area) => &mut app.output_scroll,
            _ => return,
        }
    };

    match mouse.kind {
        MouseEventKind::ScrollDown => scroll.down(WHEEL_LINES),
        MouseEventKind::ScrollUp => scroll.up(WHEEL_LINES),
        _ => {}
    }
}
