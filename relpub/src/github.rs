use crate::error::PublishError;
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

pub(crate) static PROJECT_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://github.com").unwrap());

pub(crate) static DEFAULT_API_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://api.github.com").unwrap());

pub(crate) const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct ReleaseRequest {
    pub(crate) tag_name: String,
    pub(crate) name: String,
    pub(crate) body: String,
    pub(crate) draft: bool,
    pub(crate) prerelease: bool,
}

/// The parts of a created release that we care about. GitHub returns a lot more than this.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub id: Option<u64>,
    pub tag_name: Option<String>,
    /// The templated upload endpoint, something like
    /// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`.
    pub upload_url: Option<String>,
    /// Kept as the raw string. The release already exists by the time this is read, so a
    /// malformed value must not stop the upload.
    pub html_url: Option<String>,
}

/// Accepts either `owner/repo` or a URL for any page in the project, like
/// `https://github.com/owner/repo/releases`, and returns `owner/repo`.
pub(crate) fn parse_project_name(project: &str) -> Result<String> {
    let is_url = project.starts_with("https://") || project.starts_with("http://");
    let parsed = if is_url {
        Url::parse(project).map_err(|_| PublishError::InvalidProject(project.to_string()))?
    } else {
        PROJECT_BASE_URL
            .join(project)
            .map_err(|_| PublishError::InvalidProject(project.to_string()))?
    };

    let parts = parsed.path().split('/').collect::<Vec<_>>();
    if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
        return Err(PublishError::InvalidProject(project.to_string()).into());
    }
    // A bare project name may only contain the owner and repo.
    if !is_url && parts.len() > 3 {
        return Err(PublishError::InvalidProject(project.to_string()).into());
    }

    // The first part is an empty string for the leading '/' in the path.
    let (owner, repo) = (parts[1], parts[2]);
    debug!("Parsed project {project} = {owner} / {repo}");

    Ok(format!("{owner}/{repo}"))
}

pub(crate) fn create_release_url(project_name: &str, api_base_url: &Url) -> Result<Url> {
    let (owner, repo) = project_name
        .split_once('/')
        .ok_or_else(|| PublishError::InvalidProject(project_name.to_string()))?;

    let mut url = api_base_url.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("API base URL `{api_base_url}` cannot be a base"))?
        .pop_if_empty()
        .push("repos")
        .push(owner)
        .push(repo)
        .push("releases");

    Ok(url)
}
