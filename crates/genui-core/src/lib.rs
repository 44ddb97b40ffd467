pub mod ai;
pub mod clipboard;
pub mod config;
pub mod download;
pub mod extract;
pub mod framework;
pub mod identity;
pub mod notice;
pub mod preview;
pub mod provider;
pub mod response;
pub mod workflow;

// Re-export main types for convenience
pub use ai::{AiError, GeminiClient, ModelClient, OllamaClient};
pub use clipboard::{ClipboardError, ClipboardSink, SystemClipboard};
pub use config::Config;
pub use extract::{extract_code, normalize_response};
pub use framework::Framework;
pub use identity::{IdentityProvider, ProfileIdentity, SignInError, SignInRequest, User};
pub use notice::{Notice, NoticeLevel};
pub use preview::PreviewCache;
pub use provider::Provider;
pub use response::ResponseShape;
pub use workflow::{GenerationError, GenerationRequest, Pane, Phase, Session, Settlement};
