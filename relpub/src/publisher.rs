use crate::{
    artifact::Artifact,
    error::PublishError,
    github::{self, Release, ReleaseRequest},
    upload_url::UploadUrl,
};
use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, RequestBuilder, StatusCode,
};
use url::Url;

/// `Publisher` creates a release and uploads one artifact to it. Use the
/// [`PublisherBuilder`](crate::PublisherBuilder) struct to create a new `Publisher`. All of its
/// configuration is fixed once it is built.
#[derive(Debug)]
pub struct Publisher {
    project_name: String,
    api_base_url: Url,
    token: String,
    release: ReleaseRequest,
    artifact: Artifact,
    content_type: String,
    reqwest_client: Client,
}

/// What was published by a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Published {
    /// The release's page on the forge site, as returned by the API.
    pub html_url: Option<String>,
    pub asset_name: String,
    pub asset_size: u64,
}

impl Publisher {
    pub(crate) fn new(
        project_name: String,
        api_base_url: Url,
        token: String,
        release: ReleaseRequest,
        artifact: Artifact,
        content_type: String,
        reqwest_client: Client,
    ) -> Publisher {
        Publisher {
            project_name,
            api_base_url,
            token,
            release,
            artifact,
            content_type,
            reqwest_client,
        }
    }

    /// Creates the release and then uploads the artifact to it.
    ///
    /// # Errors
    ///
    /// The returned error wraps a [`PublishError`] when the forge rejects either request or the
    /// release response has no usable upload URL. Network failures are returned as-is.
    ///
    /// If the upload fails the release has already been created. It is left in place, so you will
    /// need to delete it by hand before trying again with the same tag.
    pub async fn publish(&self) -> Result<Published> {
        info!("Release file: {}", self.release_file_summary());

        let release = self.create_release().await?;

        let upload_url = release
            .upload_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(PublishError::MissingUploadUrl)?;
        let upload_url = UploadUrl::parse(upload_url)?;

        self.upload_asset(&upload_url, release.html_url.as_deref())
            .await?;

        Ok(Published {
            html_url: release.html_url,
            asset_name: self.artifact.name().to_string(),
            asset_size: self.artifact.size(),
        })
    }

    /// Describes the file that will be uploaded, like `app.zip (1.50 MB)`. This needs no network
    /// access, so it can be shown before anything is published.
    #[must_use]
    pub fn release_file_summary(&self) -> String {
        format!(
            "{} ({:.2} MB)",
            self.artifact.path().display(),
            self.artifact.size_mib()
        )
    }

    /// Creates the release. This is not idempotent. Creating a release for a tag that already has
    /// one is rejected by GitHub with a 422.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ReleaseRejected`] for any status other than `201 Created`.
    pub async fn create_release(&self) -> Result<Release> {
        let url = github::create_release_url(&self.project_name, &self.api_base_url)?;
        info!("Creating release {}...", self.release.tag_name);
        debug!("POST {url}");

        let mut req_builder = self
            .reqwest_client
            .post(url.clone())
            .header(ACCEPT, HeaderValue::from_static(github::ACCEPT_JSON))
            .json(&self.release);
        req_builder = self.add_token_header(req_builder)?;
        let req = req_builder
            .build()
            .with_context(|| format!("failed to build HTTP request for {url}"))?;

        let resp = self
            .reqwest_client
            .execute(req)
            .await
            .with_context(|| format!("failed to execute HTTP request to {url}"))?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::ReleaseRejected { status, body }.into());
        }

        let release = resp
            .json::<Release>()
            .await
            .context("failed to parse the release creation response")?;
        info!("Release created successfully!");
        if let Some(id) = release.id {
            debug!("release id = {id}");
        }

        Ok(release)
    }

    /// Uploads the artifact to the given endpoint. `release_url` is only used to point at the
    /// orphaned release in the error message when the upload is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::AssetRejected`] for any status other than `201 Created`.
    pub async fn upload_asset(
        &self,
        upload_url: &UploadUrl,
        release_url: Option<&str>,
    ) -> Result<()> {
        let name = self.artifact.name();
        let url = upload_url.for_asset(name);
        info!("Uploading {name} ({:.2} MB)...", self.artifact.size_mib());
        debug!("POST {url} from {}", self.artifact.path().display());

        let bytes = self.artifact.read()?;
        let mut req_builder = self
            .reqwest_client
            .post(url.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_str(&self.content_type)
                    .context("failed to create header value for Content-Type header")?,
            )
            .body(bytes);
        req_builder = self.add_token_header(req_builder)?;
        let req = req_builder
            .build()
            .with_context(|| format!("failed to build HTTP request for {url}"))?;

        let resp = self
            .reqwest_client
            .execute(req)
            .await
            .with_context(|| format!("failed to execute HTTP request to upload {name}"))?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::AssetRejected {
                name: name.to_string(),
                status,
                body,
                release_url: release_url.map(String::from),
            }
            .into());
        }

        info!("{name} uploaded successfully!");
        Ok(())
    }

    fn add_token_header(&self, req_builder: RequestBuilder) -> Result<RequestBuilder> {
        debug!("Adding token to GitHub request.");
        let mut auth_val = HeaderValue::from_str(&format!("Bearer {}", self.token))?;
        auth_val.set_sensitive(true);
        Ok(req_builder.header(AUTHORIZATION, auth_val))
    }
}
