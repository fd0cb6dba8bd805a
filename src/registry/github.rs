//! GitHub release lookups.
//!
//! The rasterizer builds (SwiftShader, lavapipe) are published as release
//! assets of `jakoch/rasterizers`, described by a `versions.json` asset
//! attached to the latest release.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::io::http;
use crate::ops::context::Context;
use crate::ops::error::SetupError;

#[derive(Debug, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Latest tagged release of `owner/repo`.
pub async fn latest_release(
    ctx: &Context,
    owner: &str,
    repo: &str,
) -> Result<GithubRelease, SetupError> {
    let url = format!("{}/repos/{owner}/{repo}/releases/latest", ctx.github_base);
    debug!(url, "fetching latest release");
    http::get_json(&ctx.client, &url)
        .await
        .map_err(|_| SetupError::Registry {
            what: "the latest release",
            url,
        })
}

/// Rasterizer builds described by `versions.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RasterizerVersions {
    pub latest: RasterizerLatest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RasterizerLatest {
    #[serde(rename = "swiftshader-win64")]
    pub swiftshader_win64: RasterizerBuild,
    #[serde(rename = "lavapipe-win64")]
    pub lavapipe_win64: RasterizerBuild,
}

/// One published rasterizer build.
#[derive(Debug, Clone, Deserialize)]
pub struct RasterizerBuild {
    pub version: String,
    pub tag: String,
    pub url: String,
}

/// Fetch (once) the rasterizer `versions.json` of the latest release.
pub async fn rasterizer_versions(ctx: &Context) -> Result<Arc<RasterizerVersions>, SetupError> {
    ctx.rasterizer_versions
        .get_or_try_init(|| async {
            let release = latest_release(ctx, "jakoch", "rasterizers").await?;
            let asset = release
                .assets
                .iter()
                .find(|a| a.name == "versions.json")
                .ok_or_else(|| {
                    SetupError::Other(format!(
                        "versions.json not found in latest rasterizers release {}",
                        release.tag_name
                    ))
                })?;

            let versions: RasterizerVersions =
                http::get_json(&ctx.client, &asset.browser_download_url)
                    .await
                    .map_err(|_| SetupError::Registry {
                        what: "versions.json",
                        url: asset.browser_download_url.clone(),
                    })?;
            Ok(Arc::new(versions))
        })
        .await
        .map(Arc::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;

    fn release_body(server_url: &str) -> String {
        format!(
            r#"{{
                "tag_name": "2025.01",
                "assets": [
                    {{"name": "swiftshader-win64.zip", "browser_download_url": "{server_url}/swiftshader-win64.zip"}},
                    {{"name": "versions.json", "browser_download_url": "{server_url}/versions.json"}}
                ]
            }}"#
        )
    }

    #[tokio::test]
    async fn rasterizer_versions_follow_the_asset_link() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _release = server
            .mock("GET", "/repos/jakoch/rasterizers/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(release_body(&url))
            .expect(1)
            .create_async()
            .await;

        let _versions = server
            .mock("GET", "/versions.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "latest": {
                        "swiftshader-win64": {"version": "2025.1.1", "tag": "2025.01", "url": "https://example.test/ss.zip"},
                        "lavapipe-win64": {"version": "24.3.3", "tag": "2025.01", "url": "https://example.test/lp.zip"}
                    }
                }"#,
            )
            .expect(1)
            .create_async()
            .await;

        let ctx = Context::with_endpoints(reqwest::Client::new(), Platform::Windows, &url, &url);

        let first = rasterizer_versions(&ctx).await.unwrap();
        assert_eq!(first.latest.swiftshader_win64.version, "2025.1.1");
        assert_eq!(first.latest.lavapipe_win64.url, "https://example.test/lp.zip");

        // Second call must reuse the cached document (expect(1) above).
        let second = rasterizer_versions(&ctx).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn missing_versions_asset_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/jakoch/rasterizers/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name": "2025.01", "assets": []}"#)
            .create_async()
            .await;

        let url = server.url();
        let ctx = Context::with_endpoints(reqwest::Client::new(), Platform::Windows, &url, &url);

        let err = rasterizer_versions(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("versions.json"), "{err}");
    }

    #[tokio::test]
    async fn latest_release_error_names_the_url() {
        let mut server = mockito::Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/jakoch/rasterizers/releases/latest")
            .with_status(404)
            .create_async()
            .await;

        let url = server.url();
        let ctx = Context::with_endpoints(reqwest::Client::new(), Platform::Windows, &url, &url);

        let err = latest_release(&ctx, "jakoch", "rasterizers").await.unwrap_err();
        assert!(err.to_string().contains("releases/latest"), "{err}");
    }
}
