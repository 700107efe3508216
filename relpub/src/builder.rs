//! The `builder` module contains the `PublisherBuilder` struct which is used to create a
//! `Publisher` instance.
use crate::{
    artifact::Artifact,
    error::{PublishError, PLACEHOLDER_TOKEN},
    github::{self, ReleaseRequest},
    publisher::Publisher,
};
use anyhow::{anyhow, Result};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};
use std::{
    env,
    path::{Path, PathBuf},
};
use url::Url;

const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// The content type sent with the uploaded asset unless [`PublisherBuilder::content_type`] is
/// called.
pub const DEFAULT_CONTENT_TYPE: &str = "application/zip";

/// `PublisherBuilder` is used to create a [`Publisher`] instance.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct PublisherBuilder<'a> {
    project: Option<&'a str>,
    tag: Option<&'a str>,
    name: Option<&'a str>,
    body: Option<&'a str>,
    file: Option<PathBuf>,
    token: Option<&'a str>,
    content_type: Option<&'a str>,
    draft: bool,
    prerelease: bool,
    api_base_url: Option<&'a str>,
}

impl<'a> PublisherBuilder<'a> {
    /// Returns a new empty `PublisherBuilder`.
    #[must_use]
    pub fn new() -> Self {
        PublisherBuilder::default()
    }

    /// Set the project to publish to. This can either be just the owner/name, like
    /// `houseabsolute/precious`, or a GitHub URL for any page in the project, like
    /// `https://github.com/houseabsolute/precious/releases`.
    ///
    /// This is required.
    #[must_use]
    pub fn project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Set the tag for the new release. GitHub creates the tag from the default branch if it does
    /// not exist yet.
    ///
    /// This is required.
    #[must_use]
    pub fn tag(mut self, tag: &'a str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Set the display name for the release. Defaults to the tag.
    #[must_use]
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the release notes. This is free-form Markdown. Defaults to an empty string.
    #[must_use]
    pub fn body(mut self, body: &'a str) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the path of the file to upload. The asset is named after the file's base name.
    ///
    /// This is required.
    #[must_use]
    pub fn file<P: AsRef<Path>>(mut self, file: P) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Set a token to use for API requests. If this is not set, then the token is taken from the
    /// `GITHUB_TOKEN` env var.
    #[must_use]
    pub fn token(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    /// Set the `Content-Type` sent with the asset. Defaults to `application/zip`.
    #[must_use]
    pub fn content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Create the release as a draft.
    #[must_use]
    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Mark the release as a prerelease.
    #[must_use]
    pub fn prerelease(mut self) -> Self {
        self.prerelease = true;
        self
    }

    /// Set the base URL for the GitHub API. This is useful for testing or if you want to publish
    /// to an Enterprise version of GitHub. This should be something like
    /// `https://github.my-corp.example.com/api/v3`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Builds a new [`Publisher`] instance and returns it. No requests are made here, but the
    /// token and the file to upload are both checked.
    ///
    /// # Errors
    ///
    /// This returns an error if a required option (`project`, `tag`, or `file`) was not set. It
    /// also returns an error wrapping a [`PublishError`] when:
    ///
    /// * No token was set and `GITHUB_TOKEN` is empty or unset.
    /// * The token is the placeholder value `YOUR_GITHUB_TOKEN_HERE`.
    /// * The file does not exist, is not a regular file, or is empty.
    /// * The project could not be parsed as `owner/name`.
    pub fn build(self) -> Result<Publisher> {
        let Some(project) = self.project else {
            return Err(anyhow!("You must set a project"));
        };
        let Some(tag) = self.tag else {
            return Err(anyhow!("You must set a tag"));
        };
        let Some(file) = self.file.as_deref() else {
            return Err(anyhow!("You must set a file to upload"));
        };

        let token = self.resolve_token()?;
        let artifact = Artifact::from_path(file)?;
        let project_name = github::parse_project_name(project)?;
        let api_base_url = match self.api_base_url {
            Some(u) => Url::parse(u)?,
            None => github::DEFAULT_API_BASE_URL.clone(),
        };

        let release = ReleaseRequest {
            tag_name: tag.to_string(),
            name: self.name.unwrap_or(tag).to_string(),
            body: self.body.unwrap_or_default().to_string(),
            draft: self.draft,
            prerelease: self.prerelease,
        };

        Ok(Publisher::new(
            project_name,
            api_base_url,
            token,
            release,
            artifact,
            self.content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            reqwest_client()?,
        ))
    }

    fn resolve_token(&self) -> Result<String> {
        let token = if let Some(t) = self.token {
            t.to_string()
        } else {
            let t = env::var(TOKEN_ENV_VAR).unwrap_or_default();
            if !t.is_empty() {
                debug!("Using GitHub token from the {TOKEN_ENV_VAR} environment variable.");
            }
            t
        };

        if token.trim().is_empty() {
            return Err(PublishError::MissingToken.into());
        }
        if token == PLACEHOLDER_TOKEN {
            return Err(PublishError::PlaceholderToken.into());
        }
        Ok(token)
    }
}

fn reqwest_client() -> Result<Client> {
    let builder = Client::builder().gzip(true);

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("relpub version {}", super::VERSION))?,
    );
    Ok(builder.default_headers(headers).build()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn artifact_dir() -> Result<(TempDir, PathBuf)> {
        let td = tempdir()?;
        let path = td.path().join("app.zip");
        fs::write(&path, b"PK\x03\x04")?;
        Ok((td, path))
    }

    fn downcast(err: &anyhow::Error) -> Option<&PublishError> {
        err.downcast_ref::<PublishError>()
    }

    #[test]
    fn required_options() -> Result<()> {
        let (_td, path) = artifact_dir()?;

        let err = PublisherBuilder::new()
            .tag("v1")
            .file(&path)
            .token("t")
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "You must set a project");

        let err = PublisherBuilder::new()
            .project("o/r")
            .file(&path)
            .token("t")
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "You must set a tag");

        let err = PublisherBuilder::new()
            .project("o/r")
            .tag("v1")
            .token("t")
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "You must set a file to upload");

        Ok(())
    }

    #[test]
    fn placeholder_token_is_rejected_before_the_file_is_checked() {
        let err = PublisherBuilder::new()
            .project("o/r")
            .tag("v1")
            .file("does-not-exist.zip")
            .token(PLACEHOLDER_TOKEN)
            .build()
            .unwrap_err();
        assert!(matches!(downcast(&err), Some(PublishError::PlaceholderToken)));
    }

    #[test]
    #[serial]
    fn token_from_env() -> Result<()> {
        let (_td, path) = artifact_dir()?;
        let orig = env::var(TOKEN_ENV_VAR).ok();

        env::remove_var(TOKEN_ENV_VAR);
        let err = PublisherBuilder::new()
            .project("o/r")
            .tag("v1")
            .file(&path)
            .build()
            .unwrap_err();
        assert!(matches!(downcast(&err), Some(PublishError::MissingToken)));

        env::set_var(TOKEN_ENV_VAR, PLACEHOLDER_TOKEN);
        let err = PublisherBuilder::new()
            .project("o/r")
            .tag("v1")
            .file(&path)
            .build()
            .unwrap_err();
        assert!(matches!(downcast(&err), Some(PublishError::PlaceholderToken)));

        env::set_var(TOKEN_ENV_VAR, "ghp_fakeToken");
        let publisher = PublisherBuilder::new()
            .project("o/r")
            .tag("v1")
            .file(&path)
            .build();
        assert!(publisher.is_ok());

        match orig {
            Some(v) => env::set_var(TOKEN_ENV_VAR, v),
            None => env::remove_var(TOKEN_ENV_VAR),
        }

        Ok(())
    }

    #[test]
    fn missing_file() {
        let err = PublisherBuilder::new()
            .project("o/r")
            .tag("v1")
            .file("does-not-exist.zip")
            .token("ghp_fakeToken")
            .build()
            .unwrap_err();
        assert!(matches!(downcast(&err), Some(PublishError::MissingArtifact(_))));
    }

    #[test]
    fn invalid_project() -> Result<()> {
        let (_td, path) = artifact_dir()?;
        let err = PublisherBuilder::new()
            .project("not-a-project")
            .tag("v1")
            .file(&path)
            .token("ghp_fakeToken")
            .build()
            .unwrap_err();
        assert!(matches!(downcast(&err), Some(PublishError::InvalidProject(_))));
        Ok(())
    }
}
