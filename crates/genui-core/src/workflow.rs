//! Generation workflow.
//!
//! A [`Session`] holds everything the screen shows: prompt, framework, the
//! current code, and view flags. Generation is split in two so the UI can run
//! the network call on its own task:
//!
//! 1. [`Session::submit`] validates the prompt and hands back a
//!    [`GenerationRequest`] tagged with a sequence number.
//! 2. [`Session::settle`] applies the finished call. Only the most recently
//!    issued request may change the session; older ones are reported as
//!    [`Settlement::Stale`] and dropped.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::ai::AiError;
use crate::clipboard::ClipboardSink;
use crate::download::DownloadArtifact;
use crate::extract::{extract_code, normalize_response};
use crate::framework::Framework;
use crate::notice::Notice;
use crate::response::ResponseShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Code,
    Preview,
}

impl Pane {
    /// Heading shown above the pane
    pub fn title(&self) -> &'static str {
        match self {
            Pane::Code => "Code Editor",
            Pane::Preview => "Preview",
        }
    }

    /// Label on the pane's tab
    pub fn tab_label(&self) -> &'static str {
        match self {
            Pane::Code => "Code",
            Pane::Preview => "Preview",
        }
    }

    pub fn toggled(&self) -> Pane {
        match self {
            Pane::Code => Pane::Preview,
            Pane::Preview => Pane::Code,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub pane: Pane,
    pub expanded_preview: bool,
    /// Bumped to force the preview to render again from the current code
    pub refresh_key: u64,
    pub loading: bool,
    pub output_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    EmptyPrompt,
    Transport,
    Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    AwaitingResponse,
    Settled(Outcome),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("generation request failed: {0}")]
    Transport(#[from] AiError),

    #[error("unexpected response structure")]
    Shape,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::EmptyPrompt => FailureKind::EmptyPrompt,
            GenerationError::Transport(_) => FailureKind::Transport,
            GenerationError::Shape => FailureKind::Shape,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            GenerationError::EmptyPrompt => Notice::error("Please describe your component first"),
            GenerationError::Transport(_) => Notice::error("Something went wrong while generating code"),
            GenerationError::Shape => Notice::error("Unexpected response structure"),
        }
    }
}

/// One outgoing generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub seq: u64,
    pub instruction: String,
}

#[derive(Debug)]
pub enum Settlement {
    /// A newer request was issued after this one
    Stale,
    Generated,
    Failed(GenerationError),
}

/// Instruction sent to the model for a component description
pub fn build_instruction(prompt: &str, framework: Framework) -> String {
    format!(
        "You are an experienced web developer.\n\
         Generate a modern, animated, and responsive UI component.\n\
         \n\
         Component description: {}\n\
         Framework: {}\n\
         \n\
         Return only the full HTML code (no explanations).",
        prompt,
        framework.as_str()
    )
}

#[derive(Debug, Default)]
pub struct Session {
    pub prompt: String,
    pub framework: Framework,
    pub view: ViewState,
    code: String,
    phase: Phase,
    issued: u64,
    pending: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_code(&self) -> bool {
        !self.code.trim().is_empty()
    }

    /// Validate the prompt and issue a new request.
    ///
    /// Allowed in any phase; a request still in flight becomes stale.
    pub fn submit(&mut self) -> Result<GenerationRequest, GenerationError> {
        self.phase = Phase::Validating;

        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            self.phase = if self.pending.is_some() {
                Phase::AwaitingResponse
            } else {
                Phase::Idle
            };
            return Err(GenerationError::EmptyPrompt);
        }

        let instruction = build_instruction(prompt, self.framework);
        self.issued += 1;
        self.pending = Some(self.issued);
        self.view.loading = true;
        self.phase = Phase::AwaitingResponse;

        tracing::info!(seq = self.issued, framework = self.framework.as_str(), "issuing generation request");
        Ok(GenerationRequest {
            seq: self.issued,
            instruction,
        })
    }

    /// Apply the result of request `seq`
    pub fn settle(&mut self, seq: u64, reply: Result<Value, AiError>) -> Settlement {
        if self.pending != Some(seq) {
            tracing::debug!(seq, latest = self.issued, "discarding stale generation result");
            return Settlement::Stale;
        }
        self.pending = None;
        self.view.loading = false;

        let body = match reply {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(seq, error = %err, "error generating content");
                return self.fail(GenerationError::Transport(err));
            }
        };

        let text = match ResponseShape::decode(&body).into_text() {
            Some(text) => text,
            None => {
                tracing::warn!(seq, %body, "unknown result structure");
                return self.fail(GenerationError::Shape);
            }
        };

        tracing::debug!(seq, raw = %text, "model raw output");
        self.code = extract_code(normalize_response(&text).as_str());
        self.view.output_available = true;
        self.phase = Phase::Settled(Outcome::Success);
        Settlement::Generated
    }

    fn fail(&mut self, err: GenerationError) -> Settlement {
        self.phase = Phase::Settled(Outcome::Failure(err.kind()));
        Settlement::Failed(err)
    }

    pub fn copy_code(&self, clipboard: &mut dyn ClipboardSink) -> Notice {
        if !self.has_code() {
            return Notice::error("No code to copy");
        }
        match clipboard.write_text(&self.code) {
            Ok(()) => Notice::success("Code copied to clipboard!"),
            Err(err) => {
                tracing::warn!(error = %err, "copy failed");
                Notice::error("Failed to copy")
            }
        }
    }

    pub fn download_code(&self, dir: &Path) -> Notice {
        if !self.has_code() {
            return Notice::error("No code to download");
        }
        match DownloadArtifact::html(&self.code).save_in(dir) {
            Ok(path) => Notice::success(format!("File downloaded! {}", path.display())),
            Err(err) => {
                tracing::error!(error = %err, dir = %dir.display(), "download failed");
                Notice::error("Failed to save file")
            }
        }
    }

    /// Force the preview to render again; returns a rejection notice when
    /// there is nothing to show
    pub fn refresh_preview(&mut self) -> Option<Notice> {
        if !self.has_code() {
            return Some(Notice::error("No code to preview"));
        }
        self.view.refresh_key += 1;
        None
    }

    /// Open or close the full-screen preview; closing always succeeds
    pub fn toggle_expanded_preview(&mut self) -> Option<Notice> {
        if !self.view.expanded_preview && !self.has_code() {
            return Some(Notice::error("No code to preview"));
        }
        self.view.expanded_preview = !self.view.expanded_preview;
        None
    }

    pub fn show_pane(&mut self, pane: Pane) {
        self.view.pane = pane;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ModelClient;
    use crate::clipboard::ClipboardError;
    use crate::notice::NoticeLevel;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeClient {
        body: Value,
        calls: AtomicUsize,
    }

    impl FakeClient {
        fn replying(body: Value) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for FakeClient {
        async fn generate(&self, _model: &str, _instruction: &str) -> Result<Value, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Option<String>,
        fail: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Unavailable("no display".into()));
            }
            self.copied = Some(text.to_string());
            Ok(())
        }
    }

    async fn run(session: &mut Session, client: &dyn ModelClient) -> Result<(), GenerationError> {
        let request = session.submit()?;
        let reply = client.generate("test-model", &request.instruction).await;
        match session.settle(request.seq, reply) {
            Settlement::Failed(err) => Err(err),
            Settlement::Generated | Settlement::Stale => Ok(()),
        }
    }

    fn candidates(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn session_with(prompt: &str) -> Session {
        Session {
            prompt: prompt.to_string(),
            ..Session::new()
        }
    }

    #[test]
    fn test_instruction_embeds_prompt_and_framework() {
        let instruction = build_instruction("a pricing card", Framework::HtmlTailwind);
        assert!(instruction.starts_with("You are an experienced web developer.\n"));
        assert!(instruction.contains("\nComponent description: a pricing card\n"));
        assert!(instruction.contains("\nFramework: html-tailwind\n"));
        assert!(instruction.ends_with("Return only the full HTML code (no explanations)."));
    }

    #[tokio::test]
    async fn test_whitespace_prompt_issues_no_call() {
        let client = FakeClient::replying(candidates("<p>x</p>"));
        let mut session = session_with("  \n\t ");

        let err = run(&mut session, &client).await.unwrap_err();

        assert!(matches!(err, GenerationError::EmptyPrompt));
        assert_eq!(err.notice().message, "Please describe your component first");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(!session.view.loading);
    }

    #[test]
    fn test_submit_asserts_loading() {
        let mut session = session_with("navbar");
        let request = session.submit().unwrap();
        assert_eq!(request.seq, 1);
        assert!(session.view.loading);
        assert_eq!(session.phase(), Phase::AwaitingResponse);
    }

    #[tokio::test]
    async fn test_fenced_response_becomes_code() {
        let client = FakeClient::replying(candidates("```html\n<html><body>Hi</body></html>\n```"));
        let mut session = session_with("greeting");

        run(&mut session, &client).await.unwrap();

        assert_eq!(session.code(), "<html><body>Hi</body></html>");
        assert!(session.view.output_available);
        assert!(!session.view.loading);
        assert_eq!(session.phase(), Phase::Settled(Outcome::Success));
    }

    #[tokio::test]
    async fn test_candidates_and_text_shapes_agree() {
        let raw = "html\nSure:\n<html><body><button>Buy</button></body></html>\nThanks";
        let mut via_candidates = session_with("button");
        let mut via_text = session_with("button");

        run(&mut via_candidates, &FakeClient::replying(candidates(raw))).await.unwrap();
        run(&mut via_text, &FakeClient::replying(json!({"text": raw}))).await.unwrap();

        assert_eq!(via_candidates.code(), "<html><body><button>Buy</button></body></html>");
        assert_eq!(via_candidates.code(), via_text.code());
    }

    #[tokio::test]
    async fn test_unknown_shape_keeps_previous_code() {
        let mut session = session_with("card");
        run(&mut session, &FakeClient::replying(candidates("<p>first</p>"))).await.unwrap();

        let err = run(&mut session, &FakeClient::replying(json!({"promptFeedback": {}})))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Shape));
        assert_eq!(err.notice().message, "Unexpected response structure");
        assert_eq!(session.code(), "<p>first</p>");
        assert!(!session.view.loading);
        assert_eq!(session.phase(), Phase::Settled(Outcome::Failure(FailureKind::Shape)));
    }

    #[test]
    fn test_transport_error_clears_loading() {
        let mut session = session_with("card");
        let request = session.submit().unwrap();

        let settlement = session.settle(
            request.seq,
            Err(AiError::Api {
                status: 500,
                message: "boom".into(),
            }),
        );

        match settlement {
            Settlement::Failed(err) => {
                assert_eq!(err.kind(), FailureKind::Transport);
                assert_eq!(err.notice().message, "Something went wrong while generating code");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!session.view.loading);
        assert!(!session.view.output_available);
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut session = session_with("first");
        let older = session.submit().unwrap();
        session.prompt = "second".to_string();
        let newer = session.submit().unwrap();

        assert!(matches!(
            session.settle(newer.seq, Ok(candidates("<p>new</p>"))),
            Settlement::Generated
        ));
        assert!(matches!(
            session.settle(older.seq, Ok(candidates("<p>old</p>"))),
            Settlement::Stale
        ));
        assert_eq!(session.code(), "<p>new</p>");
    }

    #[test]
    fn test_older_response_does_not_clear_loading() {
        let mut session = session_with("first");
        let older = session.submit().unwrap();
        let _newer = session.submit().unwrap();

        session.settle(older.seq, Ok(candidates("<p>old</p>")));
        assert!(session.view.loading);
        assert_eq!(session.code(), "");
    }

    #[test]
    fn test_same_request_settles_once() {
        let mut session = session_with("first");
        let request = session.submit().unwrap();
        session.settle(request.seq, Ok(candidates("<p>a</p>")));
        assert!(matches!(
            session.settle(request.seq, Ok(candidates("<p>b</p>"))),
            Settlement::Stale
        ));
        assert_eq!(session.code(), "<p>a</p>");
    }

    #[test]
    fn test_actions_reject_empty_code() {
        let mut session = Session::new();
        let mut clipboard = RecordingClipboard::default();
        let dir = TempDir::new().unwrap();

        assert_eq!(session.copy_code(&mut clipboard).message, "No code to copy");
        assert!(clipboard.copied.is_none());

        assert_eq!(session.download_code(dir.path()).message, "No code to download");
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        assert!(session.refresh_preview().is_some());
        assert_eq!(session.view.refresh_key, 0);
        assert!(session.toggle_expanded_preview().is_some());
        assert!(!session.view.expanded_preview);
    }

    #[test]
    fn test_copy_and_download_with_code() {
        let mut session = session_with("card");
        let request = session.submit().unwrap();
        session.settle(request.seq, Ok(candidates("<div>card</div>")));

        let mut clipboard = RecordingClipboard::default();
        let notice = session.copy_code(&mut clipboard);
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(clipboard.copied.as_deref(), Some("<div>card</div>"));

        let mut broken = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        assert_eq!(session.copy_code(&mut broken).message, "Failed to copy");

        let dir = TempDir::new().unwrap();
        let notice = session.download_code(dir.path());
        assert_eq!(notice.level, NoticeLevel::Success);
        let saved = std::fs::read_to_string(dir.path().join("GeneratedComponent.html")).unwrap();
        assert_eq!(saved, "<div>card</div>");
    }

    #[test]
    fn test_preview_controls() {
        let mut session = session_with("card");
        let request = session.submit().unwrap();
        session.settle(request.seq, Ok(candidates("<p>x</p>")));

        assert!(session.refresh_preview().is_none());
        assert!(session.refresh_preview().is_none());
        assert_eq!(session.view.refresh_key, 2);

        assert!(session.toggle_expanded_preview().is_none());
        assert!(session.view.expanded_preview);
        assert!(session.toggle_expanded_preview().is_none());
        assert!(!session.view.expanded_preview);
        assert_eq!(session.view.refresh_key, 2);

        session.show_pane(Pane::Preview);
        assert_eq!(session.view.pane.title(), "Preview");
        assert_eq!(Pane::Code.tab_label(), "Code");
        assert_eq!(Pane::Code.title(), "Code Editor");
    }
}
