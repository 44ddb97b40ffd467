use std::sync::Arc;

use anyhow::Result;
use genui_core::{Config, ProfileIdentity};

mod app;
mod handler;
mod highlight;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("genui: file logging disabled: {err}");
            None
        }
    };

    let config_path = Config::get_config_path().ok();
    let config = match &config_path {
        Some(path) => Config::load_from(path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, path = %path.display(), "unreadable config, using defaults");
            Config::new()
        }),
        None => Config::new(),
    };
    let identity = Arc::new(ProfileIdentity::open_default()?);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(config, config_path, identity, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(err) = &result {
        tracing::error!(error = %err, "exiting with error");
    }
    tracing::info!("shutdown");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await?;
        app.sync_user();
    }
    Ok(())
}
