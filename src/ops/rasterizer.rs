//! SwiftShader and lavapipe installation.
//!
//! Both rasterizers ship as win64 zip builds whose URLs come from the
//! `versions.json` document of the latest `jakoch/rasterizers` release.
//! Installation is resolve → probe → download → unzip.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::io::{download, extract, http};
use crate::ops::context::Context;
use crate::ops::error::SetupError;
use crate::registry::github::{self, RasterizerBuild, RasterizerVersions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rasterizer {
    SwiftShader,
    Lavapipe,
}

impl Rasterizer {
    pub fn label(self) -> &'static str {
        match self {
            Self::SwiftShader => "SwiftShader",
            Self::Lavapipe => "Lavapipe",
        }
    }

    fn build(self, versions: &RasterizerVersions) -> &RasterizerBuild {
        match self {
            Self::SwiftShader => &versions.latest.swiftshader_win64,
            Self::Lavapipe => &versions.latest.lavapipe_win64,
        }
    }
}

/// Resolve the latest build of `which`, probing availability.
pub async fn download_url(ctx: &Context, which: Rasterizer) -> Result<RasterizerBuild, SetupError> {
    let versions = github::rasterizer_versions(ctx).await?;
    let build = which.build(&versions).clone();

    if build.url.is_empty() {
        return Err(SetupError::Other(format!(
            "{} download URL not found",
            which.label()
        )));
    }
    http::is_downloadable(&ctx.client, which.label(), &build.version, &build.url).await?;

    Ok(build)
}

/// Download and unzip the rasterizer into `destination`.
pub async fn install(
    ctx: &Context,
    which: Rasterizer,
    destination: &Path,
) -> Result<PathBuf, SetupError> {
    let build = download_url(ctx, which).await?;
    info!("Downloading {} {}", which.label(), build.version);

    let filename = format!("{}-win64.zip", which.label().to_lowercase());
    let archive = download::fetch(&ctx.client, &build.url, &crate::temp_dir(), &filename).await?;

    let install_path = extract::extract_zip(&archive, destination)?;
    info!("Installed into folder: {}", install_path.display());
    Ok(install_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;

    fn versions_body(server_url: &str) -> String {
        format!(
            r#"{{
                "latest": {{
                    "swiftshader-win64": {{"version": "2025.1.1", "tag": "2025.01", "url": "{server_url}/swiftshader.zip"}},
                    "lavapipe-win64": {{"version": "24.3.3", "tag": "2025.01", "url": "{server_url}/lavapipe.zip"}}
                }}
            }}"#
        )
    }

    async fn mock_release(server: &mut mockito::Server) -> (mockito::Mock, mockito::Mock) {
        let url = server.url();
        let release = server
            .mock("GET", "/repos/jakoch/rasterizers/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"tag_name": "2025.01", "assets": [{{"name": "versions.json", "browser_download_url": "{url}/versions.json"}}]}}"#
            ))
            .create_async()
            .await;
        let versions = server
            .mock("GET", "/versions.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(versions_body(&url))
            .create_async()
            .await;
        (release, versions)
    }

    #[tokio::test]
    async fn download_url_probes_the_published_build() {
        let mut server = mockito::Server::new_async().await;
        let _mocks = mock_release(&mut server).await;
        let _probe = server
            .mock("HEAD", "/swiftshader.zip")
            .with_status(200)
            .create_async()
            .await;

        let url = server.url();
        let ctx = Context::with_endpoints(reqwest::Client::new(), Platform::Windows, &url, &url);

        let build = download_url(&ctx, Rasterizer::SwiftShader).await.unwrap();
        assert_eq!(build.version, "2025.1.1");
        assert!(build.url.ends_with("/swiftshader.zip"));
    }

    #[tokio::test]
    async fn unreachable_build_is_an_availability_error() {
        let mut server = mockito::Server::new_async().await;
        let _mocks = mock_release(&mut server).await;
        let _probe = server
            .mock("HEAD", "/lavapipe.zip")
            .with_status(404)
            .create_async()
            .await;

        let url = server.url();
        let ctx = Context::with_endpoints(reqwest::Client::new(), Platform::Windows, &url, &url);

        let err = download_url(&ctx, Rasterizer::Lavapipe).await.unwrap_err();
        assert!(matches!(err, SetupError::NotDownloadable { .. }));
        assert!(err.to_string().contains("Lavapipe"), "{err}");
    }
}
