//! Domain-specific errors for the install pipeline.

use thiserror::Error;

use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("invalid version {0:?}: expected the major.minor.patch.revision format")]
    InvalidVersion(String),

    #[error("unsupported platform for {artifact}: {platform}")]
    UnsupportedPlatform {
        artifact: &'static str,
        platform: String,
    },

    #[error("{label} {version} is not downloadable using URL: {url}")]
    NotDownloadable {
        label: &'static str,
        version: String,
        url: String,
    },

    #[error("failed to find a downloadable Vulkan runtime version after {attempts} attempts")]
    RuntimeExhausted { attempts: u32 },

    #[error("unable to retrieve {what} from {url}")]
    Registry { what: &'static str, url: String },

    #[error("no available versions found")]
    NoAvailableVersions,

    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for SetupError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
