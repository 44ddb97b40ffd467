use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

pub const DOWNLOAD_FILE_NAME: &str = "GeneratedComponent.html";
pub const HTML_MEDIA_TYPE: &str = "text/html";

/// A file ready to be saved for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: &'static str,
    pub media_type: &'static str,
    pub body: String,
}

impl DownloadArtifact {
    pub fn html(code: &str) -> Self {
        Self {
            file_name: DOWNLOAD_FILE_NAME,
            media_type: HTML_MEDIA_TYPE,
            body: code.to_string(),
        }
    }

    /// Write the artifact into `dir`, replacing any earlier download
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name);
        fs::write(&path, &self.body)?;
        tracing::info!(path = %path.display(), media_type = self.media_type, bytes = self.body.len(), "saved download");
        Ok(path)
    }
}

/// Where downloads land when the config does not say otherwise
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_html_artifact_metadata() {
        let artifact = DownloadArtifact::html("<p>x</p>");
        assert_eq!(artifact.file_name, "GeneratedComponent.html");
        assert_eq!(artifact.media_type, "text/html");
    }

    #[test]
    fn test_save_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        DownloadArtifact::html("<p>old</p>").save_in(dir.path()).unwrap();
        let path = DownloadArtifact::html("<p>new</p>").save_in(dir.path()).unwrap();

        assert_eq!(path, dir.path().join(DOWNLOAD_FILE_NAME));
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>new</p>");
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("exports").join("today");
        let path = DownloadArtifact::html("<p>x</p>").save_in(&nested).unwrap();
        assert!(path.exists());
    }
}
