pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),
}

/// A text-generation backend.
///
/// Implementations return the raw JSON body; deciding what shape it has is
/// left to [`crate::response::ResponseShape`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, model: &str, instruction: &str) -> Result<Value, AiError>;
}

/// Read an error body and turn a non-success status into [`AiError::Api`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(AiError::Api {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn build_http_client(timeout: Option<std::time::Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}
