use crate::error::PublishError;
use anyhow::{Context, Result};
use log::debug;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// A local file that will be uploaded as a release asset. An `Artifact` only exists for files that
/// were present and non-empty when it was created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Artifact {
    path: PathBuf,
    name: String,
    size: u64,
}

impl Artifact {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PublishError::MissingArtifact(path.to_path_buf()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("could not stat {}", path.display()));
            }
        };
        if !meta.is_file() {
            return Err(PublishError::NotAFile(path.to_path_buf()).into());
        }
        if meta.len() == 0 {
            return Err(PublishError::EmptyArtifact(path.to_path_buf()).into());
        }

        let name = path
            .file_name()
            .ok_or_else(|| PublishError::NotAFile(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();
        debug!("artifact {name} is {} bytes", meta.len());

        Ok(Artifact {
            path: path.to_path_buf(),
            name,
            size: meta.len(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// The file's base name, which is also the asset name on the release.
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn size_mib(&self) -> f64 {
        self.size as f64 / BYTES_PER_MIB
    }

    // The whole file is read at once, so the handle is closed again before any bytes go over the
    // wire.
    pub(crate) fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("could not read {}", self.path.display()))
    }
}
