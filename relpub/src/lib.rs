//! A library for publishing a release with a single binary artifact to GitHub.
//!
//! It creates a release for a tag, with a name and Markdown release notes, and then uploads one
//! file to that release as an asset. It is meant for a maintainer or a small build pipeline that
//! would otherwise do this by hand in the web UI.
//!
//! This project also ships a CLI tool named `relpub`.
//!
//! The main entry point for programmatic use is the [`PublisherBuilder`] struct. Here is an example
//! of its usage:
//!
//! ```ignore
//! use relpub::PublisherBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let publisher = PublisherBuilder::new()
//!         .project("houseabsolute/precious")
//!         .tag("v1.2.0")
//!         .body("# Bug fixes\n\n- Lots of them.")
//!         .file("precious-v1.2.0.zip")
//!         .build()?;
//!
//!     let published = publisher.publish().await?;
//!     println!("{:?}", published.html_url);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How Publishing Works
//!
//! [`PublisherBuilder::build`] checks everything it can without touching the network. The token
//! must be set (either explicitly or with the `GITHUB_TOKEN` env var) and must not be the
//! placeholder `YOUR_GITHUB_TOKEN_HERE`. The file to upload must exist and must not be empty.
//!
//! [`Publisher::publish`] then makes exactly two requests:
//!
//! 1. `POST /repos/{owner}/{repo}/releases` to create the release. Anything other than `201
//!    Created` stops the run.
//! 2. `POST` to the release's `upload_url`, with the `{?name,label}` template removed and a `name`
//!    query parameter added, with the file contents as the body.
//!
//! Nothing is retried. If the upload fails, the release has already been created and is left as
//! it is. Delete it by hand before running again with the same tag, otherwise GitHub will reject
//! the new release with a `422`.
//!
//! ## Features
//!
//! This crate offers several features to control the TLS dependency used by `reqwest`:
//!
#![doc = document_features::document_features!()]

mod artifact;
mod builder;
mod error;
mod github;
mod publisher;
mod upload_url;

pub use crate::{
    builder::{PublisherBuilder, DEFAULT_CONTENT_TYPE},
    error::{PublishError, PLACEHOLDER_TOKEN},
    github::Release,
    publisher::{Published, Publisher},
    upload_url::UploadUrl,
};

// The version of the `relpub` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// Sets up logging to stderr. Messages from this crate and the `relpub` binary are shown at
/// `level`. Other crates, like `reqwest` and `hyper`, never go below `Warn` because their debug
/// output drowns out ours.
///
/// Info messages are printed as-is, since they are the progress lines a user reads. Everything
/// else gets a colored level prefix.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error if a logger is already set.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    Dispatch::new()
        .format(move |out, message, record| {
            if record.level() == log::Level::Info {
                out.finish(format_args!("{message}"));
            } else {
                out.finish(format_args!(
                    "{}: {message}",
                    colors.color(record.level())
                ));
            }
        })
        .level(dependency_level(level))
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .chain(std::io::stderr())
        .apply()
}

#[cfg(feature = "logging")]
fn dependency_level(level: log::LevelFilter) -> log::LevelFilter {
    level.min(log::LevelFilter::Warn)
}
