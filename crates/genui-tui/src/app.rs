use std::path::PathBuf;
use std::sync::Arc;

use genui_core::ai::gemini::GEMINI_BASE_URL;
use genui_core::identity::{sign_in_notice, sign_out_notice};
use genui_core::{
    AiError, Config, Framework, GeminiClient, IdentityProvider, ModelClient, Notice, OllamaClient,
    Pane, PreviewCache, Provider, Session, Settlement, SignInError, SignInRequest,
    SystemClipboard, User,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::highlight::HighlightCache;
use crate::tui::AppEvent;

/// Ticks a notice stays on screen (300ms each)
const NOTICE_TICKS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Framework,
    Prompt,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignInField {
    #[default]
    DisplayName,
    PhotoUrl,
}

/// The sign-in dialog
#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub display_name: String,
    pub photo_url: String,
    pub field: SignInField,
    pub cursor: usize,
}

impl SignInForm {
    pub fn active_text(&self) -> &str {
        match self.field {
            SignInField::DisplayName => &self.display_name,
            SignInField::PhotoUrl => &self.photo_url,
        }
    }

    fn active_text_mut(&mut self) -> &mut String {
        match self.field {
            SignInField::DisplayName => &mut self.display_name,
            SignInField::PhotoUrl => &mut self.photo_url,
        }
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            SignInField::DisplayName => SignInField::PhotoUrl,
            SignInField::PhotoUrl => SignInField::DisplayName,
        };
        self.cursor = self.active_text().chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor;
        let text = self.active_text_mut();
        let byte_pos = char_to_byte_index(text, cursor);
        text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let cursor = self.cursor;
        let text = self.active_text_mut();
        let byte_pos = char_to_byte_index(text, cursor);
        text.remove(byte_pos);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.active_text().chars().count());
    }

    fn request(&self) -> SignInRequest {
        let photo_url = self.photo_url.trim();
        SignInRequest {
            display_name: self.display_name.clone(),
            photo_url: (!photo_url.is_empty()).then(|| photo_url.to_string()),
        }
    }
}

/// Vertical scroll position of a text area
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollState {
    pub offset: u16,
    pub height: u16,
    pub total: u16,
}

impl ScrollState {
    fn max_offset(&self) -> u16 {
        self.total.saturating_sub(self.height)
    }

    pub fn down(&mut self, lines: u16) {
        self.offset = self.offset.saturating_add(lines).min(self.max_offset());
    }

    pub fn up(&mut self, lines: u16) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn half_page_down(&mut self) {
        self.down((self.height / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.up((self.height / 2).max(1));
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub session: Session,

    // Prompt editing
    pub prompt_cursor: usize, // char index into session.prompt
    pub framework_state: ListState,

    // Output panes
    pub output_scroll: ScrollState,
    pub overlay_scroll: ScrollState,
    pub preview_cache: PreviewCache,
    pub highlight_cache: HighlightCache,

    // Notices and animation
    pub notice: Option<Notice>,
    notice_ticks: u8,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Provider state
    pub current_provider: Provider,
    pub selected_model: String,
    pub gemini: Arc<GeminiClient>,
    pub ollama: Arc<OllamaClient>,
    pub show_provider_picker: bool,
    pub provider_picker_state: ListState,
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,

    // Identity
    identity: Arc<dyn IdentityProvider>,
    user_rx: watch::Receiver<Option<User>>,
    pub user: Option<User>,
    pub sign_in_form: Option<SignInForm>,

    // Panel areas for mouse hit-testing (updated during render)
    pub output_area: Option<Rect>,
    pub overlay_area: Option<Rect>,

    clipboard: SystemClipboard,
    pub config: Config,
    config_path: Option<PathBuf>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        identity: Arc<dyn IdentityProvider>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let timeout = config.request_timeout();
        let gemini_key = config.gemini_api_key().unwrap_or_default();
        let gemini = Arc::new(GeminiClient::with_base_url(&gemini_key, GEMINI_BASE_URL, timeout));
        let ollama = Arc::new(OllamaClient::with_timeout(&config.ollama_url(), timeout));

        let mut user_rx = identity.subscribe();
        let user = user_rx.borrow_and_update().clone();

        let session = Session::new();
        let mut framework_state = ListState::default();
        framework_state.select(Some(session.framework.index()));

        tracing::info!(
            provider = config.provider().as_str(),
            model = %config.model(),
            signed_in = user.is_some(),
            "app state initialized"
        );

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Prompt,
            session,
            prompt_cursor: 0,
            framework_state,
            output_scroll: ScrollState::default(),
            overlay_scroll: ScrollState::default(),
            preview_cache: PreviewCache::default(),
            highlight_cache: HighlightCache::default(),
            notice: None,
            notice_ticks: 0,
            animation_frame: 0,
            current_provider: config.provider(),
            selected_model: config.model(),
            gemini,
            ollama,
            show_provider_picker: false,
            provider_picker_state: ListState::default(),
            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),
            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            identity,
            user_rx,
            user,
            sign_in_form: None,
            output_area: None,
            overlay_area: None,
            clipboard: SystemClipboard::new(),
            config,
            config_path,
            events,
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "notice");
        self.notice = Some(notice);
        self.notice_ticks = NOTICE_TICKS;
    }

    fn set_optional_notice(&mut self, notice: Option<Notice>) {
        if let Some(notice) = notice {
            self.set_notice(notice);
        }
    }

    /// Tick animation frame and expire notices (called by Tick event)
    pub fn tick(&mut self) {
        if self.session.view.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.notice.is_some() {
            self.notice_ticks = self.notice_ticks.saturating_sub(1);
            if self.notice_ticks == 0 {
                self.notice = None;
            }
        }
    }

    /// Any dialog drawn over the main screen
    pub fn popup_open(&self) -> bool {
        self.show_api_key_input
            || self.show_provider_picker
            || self.show_model_picker
            || self.sign_in_form.is_some()
    }

    // Generation

    fn model_client(&self) -> Arc<dyn ModelClient> {
        match self.current_provider {
            Provider::Gemini => self.gemini.clone() as Arc<dyn ModelClient>,
            Provider::Ollama => self.ollama.clone() as Arc<dyn ModelClient>,
        }
    }

    pub fn start_generation(&mut self) {
        let request = match self.session.submit() {
            Ok(request) => request,
            Err(err) => {
                self.set_notice(err.notice());
                return;
            }
        };

        let client = self.model_client();
        let model = self.selected_model.clone();
        let tx = self.events.clone();
        self.animation_frame = 0;

        tokio::spawn(async move {
            let result = client.generate(&model, &request.instruction).await;
            let _ = tx.send(AppEvent::Generated {
                seq: request.seq,
                result,
            });
        });
    }

    pub fn handle_generated(&mut self, seq: u64, result: Result<Value, AiError>) {
        let missing_key = matches!(result, Err(AiError::MissingApiKey(_)));
        match self.session.settle(seq, result) {
            Settlement::Stale => {}
            Settlement::Generated => {
                self.output_scroll.reset();
                self.overlay_scroll.reset();
                self.focus = FocusPane::Output;
            }
            Settlement::Failed(_) if missing_key => {
                self.set_notice(Notice::warning(
                    "Gemini API key not configured. Press P to set it up.",
                ));
            }
            Settlement::Failed(err) => self.set_notice(err.notice()),
        }
    }

    // Output actions

    pub fn copy_code(&mut self) {
        let notice = self.session.copy_code(&mut self.clipboard);
        self.set_notice(notice);
    }

    pub fn download_code(&mut self) {
        let notice = self.session.download_code(&self.config.download_dir());
        self.set_notice(notice);
    }

    pub fn refresh_preview(&mut self) {
        let rejection = self.session.refresh_preview();
        self.set_optional_notice(rejection);
    }

    pub fn toggle_expanded_preview(&mut self) {
        match self.session.toggle_expanded_preview() {
            Some(rejection) => self.set_notice(rejection),
            None => self.overlay_scroll.reset(),
        }
    }

    pub fn show_pane(&mut self, pane: Pane) {
        self.session.show_pane(pane);
        self.output_scroll.reset();
    }

    // Framework list

    pub fn framework_nav_down(&mut self) {
        let len = Framework::all().len();
        let i = self.framework_state.selected().unwrap_or(0);
        self.select_framework((i + 1).min(len - 1));
    }

    pub fn framework_nav_up(&mut self) {
        let i = self.framework_state.selected().unwrap_or(0);
        self.select_framework(i.saturating_sub(1));
    }

    fn select_framework(&mut self, index: usize) {
        if let Some(&framework) = Framework::all().get(index) {
            self.framework_state.select(Some(index));
            self.session.framework = framework;
        }
    }

    // Prompt editing

    pub fn prompt_insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.session.prompt, self.prompt_cursor);
        self.session.prompt.insert(byte_pos, c);
        self.prompt_cursor += 1;
    }

    pub fn prompt_backspace(&mut self) {
        if self.prompt_cursor > 0 {
            self.prompt_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.session.prompt, self.prompt_cursor);
            self.session.prompt.remove(byte_pos);
        }
    }

    pub fn prompt_delete(&mut self) {
        if self.prompt_cursor < self.session.prompt.chars().count() {
            let byte_pos = char_to_byte_index(&self.session.prompt, self.prompt_cursor);
            self.session.prompt.remove(byte_pos);
        }
    }

    pub fn prompt_left(&mut self) {
        self.prompt_cursor = self.prompt_cursor.saturating_sub(1);
    }

    pub fn prompt_right(&mut self) {
        let char_count = self.session.prompt.chars().count();
        self.prompt_cursor = (self.prompt_cursor + 1).min(char_count);
    }

    pub fn prompt_home(&mut self) {
        self.prompt_cursor = 0;
    }

    pub fn prompt_end(&mut self) {
        self.prompt_cursor = self.session.prompt.chars().count();
    }

    // Identity

    /// Mirror the identity provider's latest user
    pub fn sync_user(&mut self) {
        if self.user_rx.has_changed().unwrap_or(false) {
            self.user = self.user_rx.borrow_and_update().clone();
        }
    }

    /// Open the sign-in dialog, refusing while another overlay is up
    pub fn begin_sign_in(&mut self) {
        if self.session.view.expanded_preview || self.popup_open() {
            let result: Result<User, SignInError> = Err(SignInError::Blocked);
            self.set_optional_notice(sign_in_notice(&result));
            return;
        }
        self.sign_in_form = Some(SignInForm::default());
    }

    pub fn cancel_sign_in(&mut self) {
        if self.sign_in_form.take().is_some() {
            let result: Result<User, SignInError> = Err(SignInError::Cancelled);
            tracing::debug!("sign-in dismissed");
            self.set_optional_notice(sign_in_notice(&result));
        }
    }

    pub async fn submit_sign_in(&mut self) {
        let Some(form) = self.sign_in_form.take() else {
            return;
        };
        let result = self.identity.sign_in(form.request()).await;
        self.set_optional_notice(sign_in_notice(&result));
        self.sync_user();
    }

    pub async fn sign_out(&mut self) {
        if self.user.is_none() {
            return;
        }
        let result = self.identity.sign_out().await;
        self.set_notice(sign_out_notice(&result));
        self.sync_user();
    }

    // Config

    fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(err) = self.config.save_to(path) {
            tracing::warn!(error = %err, path = %path.display(), "failed to save config");
        }
    }

    // Provider picker methods

    pub fn open_provider_picker(&mut self) {
        let index = Provider::all()
            .iter()
            .position(|p| *p == self.current_provider)
            .unwrap_or(0);
        self.provider_picker_state.select(Some(index));
        self.show_provider_picker = true;
    }

    pub fn provider_picker_nav_down(&mut self) {
        let len = Provider::all().len();
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Returns where a provider's credentials come from: "env", "config", "local", or None
    pub fn get_key_source(&self, provider: Provider) -> Option<&'static str> {
        match provider {
            Provider::Ollama => Some("local"),
            Provider::Gemini => {
                let from_env = std::env::var(genui_core::config::GEMINI_API_KEY_ENV)
                    .is_ok_and(|k| !k.trim().is_empty());
                if from_env {
                    Some("env")
                } else if self.config.gemini_api_key().is_some() {
                    Some("config")
                } else {
                    None
                }
            }
        }
    }

    pub fn select_provider(&mut self) {
        let Some(provider) = self
            .provider_picker_state
            .selected()
            .and_then(|i| Provider::all().get(i).copied())
        else {
            return;
        };
        self.show_provider_picker = false;

        if provider.needs_api_key() && self.get_key_source(provider).is_none() {
            self.show_api_key_input = true;
            self.api_key_input.clear();
            self.api_key_input_cursor = 0;
            return;
        }
        self.switch_provider(provider);
    }

    fn switch_provider(&mut self, provider: Provider) {
        if provider != self.current_provider {
            self.selected_model = provider.default_model().to_string();
            self.config.default_model = Some(self.selected_model.clone());
        }
        self.current_provider = provider;
        self.config.provider = Some(provider.as_str().to_string());
        self.persist_config();
        tracing::info!(provider = provider.as_str(), model = %self.selected_model, "provider selected");
        self.set_notice(Notice::info(format!(
            "Using {} ({})",
            provider.display_name(),
            self.selected_model
        )));
    }

    // API key input

    pub fn cancel_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    pub fn submit_api_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        self.cancel_api_key_input();
        if key.is_empty() {
            return;
        }
        self.gemini = Arc::new(GeminiClient::with_base_url(
            &key,
            GEMINI_BASE_URL,
            self.config.request_timeout(),
        ));
        self.config.gemini_api_key = Some(key);
        self.switch_provider(Provider::Gemini);
    }

    pub fn api_key_insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.api_key_input, self.api_key_input_cursor);
        self.api_key_input.insert(byte_pos, c);
        self.api_key_input_cursor += 1;
    }

    pub fn api_key_backspace(&mut self) {
        if self.api_key_input_cursor > 0 {
            self.api_key_input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.api_key_input, self.api_key_input_cursor);
            self.api_key_input.remove(byte_pos);
        }
    }

    pub fn api_key_left(&mut self) {
        self.api_key_input_cursor = self.api_key_input_cursor.saturating_sub(1);
    }

    pub fn api_key_right(&mut self) {
        let char_count = self.api_key_input.chars().count();
        self.api_key_input_cursor = (self.api_key_input_cursor + 1).min(char_count);
    }

    // Model picker methods

    pub async fn open_model_picker(&mut self) {
        let models = match self.current_provider {
            Provider::Gemini => GeminiClient::list_models(),
            Provider::Ollama => match self.ollama.list_models().await {
                Ok(models) => models,
                Err(err) => {
                    tracing::warn!(error = %err, "could not list Ollama models");
                    self.set_notice(Notice::error("Could not reach Ollama"));
                    return;
                }
            },
        };
        if models.is_empty() {
            self.set_notice(Notice::warning("No models available"));
            return;
        }

        let index = models
            .iter()
            .position(|m| *m == self.selected_model)
            .unwrap_or(0);
        self.available_models = models;
        self.model_picker_state.select(Some(index));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.available_models.get(i) {
                self.selected_model = model.clone();
                self.show_model_picker = false;
                self.config.default_model = Some(self.selected_model.clone());
                self.persist_config();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genui_core::{NoticeLevel, ProfileIdentity};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        app: App,
        rx: mpsc::UnboundedReceiver<AppEvent>,
        dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let identity = Arc::new(ProfileIdentity::open(dir.path().join("profile.json")));
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config {
            download_dir: Some(dir.path().join("downloads")),
            ..Config::new()
        };
        let mut app = App::new(config, Some(dir.path().join("config.json")), identity, tx);
        app.gemini = Arc::new(GeminiClient::new(""));
        Fixture { app, rx, dir }
    }

    fn settle_with(app: &mut App, body: Value) {
        app.session.prompt = "card".to_string();
        let request = app.session.submit().unwrap();
        app.handle_generated(request.seq, Ok(body));
    }

    #[test]
    fn test_empty_prompt_shows_notice() {
        let mut f = fixture();
        f.app.start_generation();
        let notice = f.app.notice.clone().unwrap();
        assert_eq!(notice.message, "Please describe your component first");
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_key_points_to_provider_picker() {
        let mut f = fixture();
        f.app.current_provider = Provider::Gemini;
        for c in "login form".chars() {
            f.app.prompt_insert(c);
        }
        f.app.start_generation();
        assert!(f.app.session.view.loading);

        match f.rx.recv().await {
            Some(AppEvent::Generated { seq, result }) => f.app.handle_generated(seq, result),
            other => panic!("unexpected event {other:?}"),
        }
        let notice = f.app.notice.clone().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("Press P"));
        assert!(!f.app.session.view.loading);
    }

    #[test]
    fn test_generated_code_focuses_output() {
        let mut f = fixture();
        f.app.output_scroll.offset = 7;
        settle_with(
            &mut f.app,
            json!({"candidates": [{"content": {"parts": [{"text": "<p>ok</p>"}]}}]}),
        );
        assert_eq!(f.app.session.code(), "<p>ok</p>");
        assert_eq!(f.app.focus, FocusPane::Output);
        assert_eq!(f.app.output_scroll.offset, 0);
        assert!(f.app.notice.is_none());
    }

    #[test]
    fn test_prompt_editing_is_utf8_safe() {
        let mut f = fixture();
        for c in "héllo".chars() {
            f.app.prompt_insert(c);
        }
        f.app.prompt_left();
        f.app.prompt_left();
        f.app.prompt_left();
        f.app.prompt_backspace();
        assert_eq!(f.app.session.prompt, "hllo");
        f.app.prompt_insert('\n');
        f.app.prompt_end();
        f.app.prompt_insert('!');
        assert_eq!(f.app.session.prompt, "h\nllo!");
        f.app.prompt_home();
        f.app.prompt_delete();
        assert_eq!(f.app.session.prompt, "\nllo!");
    }

    #[test]
    fn test_framework_navigation_updates_session() {
        let mut f = fixture();
        assert_eq!(f.app.session.framework, Framework::HtmlCss);
        f.app.framework_nav_down();
        assert_eq!(f.app.session.framework, Framework::HtmlTailwind);
        for _ in 0..10 {
            f.app.framework_nav_down();
        }
        assert_eq!(f.app.session.framework, Framework::HtmlTailwindBootstrap);
        f.app.framework_nav_up();
        assert_eq!(f.app.session.framework, Framework::HtmlCssJs);
    }

    #[test]
    fn test_notice_expires_after_ticks() {
        let mut f = fixture();
        f.app.set_notice(Notice::info("hello"));
        for _ in 0..NOTICE_TICKS - 1 {
            f.app.tick();
        }
        assert!(f.app.notice.is_some());
        f.app.tick();
        assert!(f.app.notice.is_none());
    }

    #[test]
    fn test_sign_in_blocked_by_expanded_preview() {
        let mut f = fixture();
        settle_with(
            &mut f.app,
            json!({"text": "<html><body>x</body></html>"}),
        );
        f.app.toggle_expanded_preview();
        assert!(f.app.session.view.expanded_preview);

        f.app.begin_sign_in();
        assert!(f.app.sign_in_form.is_none());
        let notice = f.app.notice.clone().unwrap();
        assert_eq!(notice.message, "Sign-in blocked! Close the open preview and try again.");
    }

    #[test]
    fn test_cancelled_sign_in_is_silent() {
        let mut f = fixture();
        f.app.begin_sign_in();
        assert!(f.app.sign_in_form.is_some());
        f.app.cancel_sign_in();
        assert!(f.app.sign_in_form.is_none());
        assert!(f.app.notice.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_and_out_update_header_user() {
        let mut f = fixture();
        f.app.begin_sign_in();
        if let Some(form) = f.app.sign_in_form.as_mut() {
            for c in "Ada".chars() {
                form.insert_char(c);
            }
        }
        f.app.submit_sign_in().await;

        assert_eq!(f.app.user.as_ref().map(|u| u.display_name.as_str()), Some("Ada"));
        assert_eq!(f.app.notice.clone().unwrap().message, "Welcome, Ada!");

        f.app.sign_out().await;
        assert!(f.app.user.is_none());
        assert_eq!(f.app.notice.clone().unwrap().message, "Logged out successfully!");
    }

    #[test]
    fn test_download_uses_configured_dir() {
        let mut f = fixture();
        settle_with(&mut f.app, json!({"response": "<div>hi</div>"}));
        f.app.download_code();
        let saved = f.dir.path().join("downloads").join("GeneratedComponent.html");
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "<div>hi</div>");
        assert_eq!(f.app.notice.clone().unwrap().level, NoticeLevel::Success);
    }

    #[test]
    fn test_api_key_entry_switches_to_gemini_and_saves() {
        let mut f = fixture();
        f.app.current_provider = Provider::Ollama;
        f.app.show_api_key_input = true;
        for c in "abc123".chars() {
            f.app.api_key_insert(c);
        }
        f.app.submit_api_key();

        assert!(!f.app.show_api_key_input);
        assert_eq!(f.app.current_provider, Provider::Gemini);
        assert_eq!(f.app.selected_model, "gemini-2.0-flash");
        let saved = Config::load_from(&f.dir.path().join("config.json")).unwrap();
        assert_eq!(saved.gemini_api_key.as_deref(), Some("abc123"));
        assert_eq!(saved.provider.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_selected_model_is_saved_to_config_file() {
        let mut f = fixture();
        f.app.show_model_picker = true;
        f.app.available_models = vec!["llama3".to_string(), "qwen2.5-coder".to_string()];
        f.app.model_picker_state.select(Some(1));
        f.app.select_model();

        assert!(!f.app.show_model_picker);
        assert_eq!(f.app.selected_model, "qwen2.5-coder");
        let saved = Config::load_from(&f.dir.path().join("config.json")).unwrap();
        assert_eq!(saved.default_model.as_deref(), Some("qwen2.5-coder"));
    }

    #[test]
    fn test_scroll_state_clamps() {
        let mut scroll = ScrollState {
            offset: 0,
            height: 10,
            total: 25,
        };
        scroll.down(100);
        assert_eq!(scroll.offset, 15);
        scroll.half_page_up();
        assert_eq!(scroll.offset, 10);
        scroll.up(100);
        assert_eq!(scroll.offset, 0);
    }
}
