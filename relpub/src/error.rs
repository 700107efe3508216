use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// The placeholder value that release scripts tend to ship with in place of a real token.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_GITHUB_TOKEN_HERE";

/// Errors that stop a publish run. These are returned inside an [`anyhow::Error`], so use
/// `downcast_ref::<PublishError>()` if you need to tell them apart.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum PublishError {
    #[error("no token was given and the GITHUB_TOKEN environment variable is not set")]
    MissingToken,

    #[error("the token is still set to the placeholder value `YOUR_GITHUB_TOKEN_HERE`")]
    PlaceholderToken,

    #[error("could not parse an owner and repo name from `{0}`")]
    InvalidProject(String),

    #[error("release file not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("release file is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("release file is empty: {}", .0.display())]
    EmptyArtifact(PathBuf),

    #[error("failed to create release: {status}\nResponse: {body}")]
    ReleaseRejected { status: StatusCode, body: String },

    #[error("no upload URL in release response")]
    MissingUploadUrl,

    #[error("invalid upload URL `{url}`: {reason}")]
    InvalidUploadUrl { url: String, reason: String },

    #[error(
        "failed to upload {name}: {status}\nResponse: {body}\nThe release at {} was created without this asset and must be cleaned up by hand",
        .release_url.as_deref().unwrap_or("(unknown URL)")
    )]
    AssetRejected {
        name: String,
        status: StatusCode,
        body: String,
        release_url: Option<String>,
    },
}

impl PublishError {
    /// Returns the HTTP status for errors caused by the forge rejecting a request.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PublishError::ReleaseRejected { status, .. }
            | PublishError::AssetRejected { status, .. } => Some(*status),
            PublishError::MissingToken
            | PublishError::PlaceholderToken
            | PublishError::InvalidProject(_)
            | PublishError::MissingArtifact(_)
            | PublishError::NotAFile(_)
            | PublishError::EmptyArtifact(_)
            | PublishError::MissingUploadUrl
            | PublishError::InvalidUploadUrl { .. } => None,
        }
    }

    /// Returns true if this error was caught before any request was sent.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PublishError::MissingToken
                | PublishError::PlaceholderToken
                | PublishError::InvalidProject(_)
                | PublishError::MissingArtifact(_)
                | PublishError::NotAFile(_)
                | PublishError::EmptyArtifact(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_rejected_message_includes_status_and_release() {
        let e = PublishError::AssetRejected {
            name: "app.zip".to_string(),
            status: StatusCode::PAYLOAD_TOO_LARGE,
            body: "too big".to_string(),
            release_url: Some("https://github.com/o/r/releases/tag/v1".to_string()),
        };
        let msg = e.to_string();
        assert!(msg.contains("413"), "{msg}");
        assert!(msg.contains("app.zip"), "{msg}");
        assert!(msg.contains("https://github.com/o/r/releases/tag/v1"), "{msg}");
        assert_eq!(e.status(), Some(StatusCode::PAYLOAD_TOO_LARGE));
        assert!(!e.is_precondition());
    }

    #[test]
    fn precondition_errors_have_no_status() {
        for e in [
            PublishError::MissingToken,
            PublishError::PlaceholderToken,
            PublishError::MissingArtifact(PathBuf::from("nope.zip")),
        ] {
            assert!(e.is_precondition(), "{e}");
            assert_eq!(e.status(), None);
        }
    }
}
