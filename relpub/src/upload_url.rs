use crate::error::PublishError;
use std::{fmt, str::FromStr};
use url::Url;

/// An upload endpoint with the URI template suffix (like `{?name,label}`) removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadUrl(Url);

impl UploadUrl {
    /// Strips everything from the first `{` onward and parses what remains.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidUploadUrl`] if nothing is left after stripping the template
    /// or the remainder is not an absolute URL.
    pub fn parse(templated: &str) -> Result<Self, PublishError> {
        let base = templated
            .split_once('{')
            .map_or(templated, |(base, _)| base)
            .trim();
        if base.is_empty() {
            return Err(PublishError::InvalidUploadUrl {
                url: templated.to_string(),
                reason: "the URL is empty once the template is removed".to_string(),
            });
        }

        let url = Url::parse(base).map_err(|e| PublishError::InvalidUploadUrl {
            url: templated.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(PublishError::InvalidUploadUrl {
                url: templated.to_string(),
                reason: "not an http(s) URL".to_string(),
            });
        }

        Ok(UploadUrl(url))
    }

    /// Returns the endpoint for uploading an asset with the given name.
    #[must_use]
    pub fn for_asset(&self, name: &str) -> Url {
        let mut url = self.0.clone();
        url.query_pairs_mut().append_pair("name", name);
        url
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for UploadUrl {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UploadUrl::parse(s)
    }
}

impl fmt::Display for UploadUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::github_template(
        "https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}",
        "https://uploads.github.com/repos/o/r/releases/1/assets"
    )]
    #[case::short_template("https://x/y{?name,label}", "https://x/y")]
    #[case::no_template(
        "https://uploads.github.com/repos/o/r/releases/1/assets",
        "https://uploads.github.com/repos/o/r/releases/1/assets"
    )]
    #[case::only_first_brace_counts("https://x/y{?name}{?label}", "https://x/y")]
    fn parse_strips_template(#[case] templated: &str, #[case] expect: &str) -> anyhow::Result<()> {
        assert_eq!(UploadUrl::parse(templated)?.as_str(), expect);
        Ok(())
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_template("{?name,label}")]
    #[case::relative("/repos/o/r/releases/1/assets{?name,label}")]
    #[case::not_a_base("mailto:someone@example.com")]
    #[case::ftp("ftp://x/y{?name}")]
    fn parse_rejects(#[case] templated: &str) {
        assert!(matches!(
            UploadUrl::parse(templated),
            Err(PublishError::InvalidUploadUrl { .. })
        ));
    }

    #[test]
    fn for_asset_adds_name_query() -> anyhow::Result<()> {
        let url: UploadUrl = "https://x/y{?name,label}".parse()?;
        assert_eq!(
            url.for_asset("My App v1.2.zip").as_str(),
            "https://x/y?name=My+App+v1.2.zip"
        );
        Ok(())
    }
}
