//! Signed-in user tracking.
//!
//! The UI never owns the user record; it subscribes to the provider and
//! mirrors whatever the provider last published.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::notice::Notice;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// What the user entered in the sign-in dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    pub display_name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("sign-in dialog was dismissed")]
    Cancelled,

    #[error("sign-in dialog could not be opened")]
    Blocked,

    #[error("sign-in failed: {0}")]
    Other(String),
}

impl SignInError {
    /// Notice to show for this failure; dismissals are silent
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SignInError::Cancelled => None,
            SignInError::Blocked => Some(Notice::warning(
                "Sign-in blocked! Close the open preview and try again.",
            )),
            SignInError::Other(reason) => {
                tracing::error!(%reason, "login error");
                Some(Notice::error("Login failed. Try again."))
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("sign-out failed: {0}")]
pub struct SignOutError(String);

pub fn sign_in_notice(result: &Result<User, SignInError>) -> Option<Notice> {
    match result {
        Ok(user) => Some(Notice::success(format!("Welcome, {}!", user.display_name))),
        Err(err) => err.notice(),
    }
}

pub fn sign_out_notice(result: &Result<(), SignOutError>) -> Notice {
    match result {
        Ok(()) => Notice::info("Logged out successfully!"),
        Err(err) => {
            tracing::error!(error = %err, "logout error");
            Notice::error("Error during logout")
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Receiver that yields the current user and every later change
    fn subscribe(&self) -> watch::Receiver<Option<User>>;

    async fn sign_in(&self, request: SignInRequest) -> Result<User, SignInError>;

    async fn sign_out(&self) -> Result<(), SignOutError>;
}

/// Identity backed by a profile file, restored on startup
pub struct ProfileIdentity {
    path: PathBuf,
    tx: watch::Sender<Option<User>>,
}

impl ProfileIdentity {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let user = match load_profile(&path) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable profile");
                None
            }
        };
        let (tx, _rx) = watch::channel(user);
        Self { path, tx }
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(Self::open(config_dir.join("genui").join("profile.json")))
    }

    pub fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }
}

#[async_trait]
impl IdentityProvider for ProfileIdentity {
    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    async fn sign_in(&self, request: SignInRequest) -> Result<User, SignInError> {
        let display_name = request.display_name.trim();
        if display_name.is_empty() {
            return Err(SignInError::Other("display name is required".to_string()));
        }

        let user = User {
            display_name: display_name.to_string(),
            photo_url: request
                .photo_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        };

        let content = serde_json::to_string_pretty(&user).map_err(|e| SignInError::Other(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SignInError::Other(e.to_string()))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| SignInError::Other(e.to_string()))?;

        tracing::info!(user = %user.display_name, "signed in");
        self.tx.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), SignOutError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SignOutError(e.to_string())),
        }
        tracing::info!("signed out");
        self.tx.send_replace(None);
        Ok(())
    }
}

fn load_profile(path: &Path) -> anyhow::Result<Option<User>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
