//! Shared run context.
//!
//! Groups the HTTP client, the detected platform, endpoint roots, and the
//! process-lifetime version caches. The caches are explicit fields (not
//! module globals): fetched lazily on first use, then shared by `Arc` for
//! the remainder of the run. Endpoint roots are plain fields so tests can
//! point them at a local mock server.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::core::platform::{self, Platform};
use crate::registry::github::RasterizerVersions;
use crate::registry::vulkan::{AvailableVersions, LatestVersions, VULKAN_SDK_BASE};

/// Default GitHub API root.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

pub struct Context {
    pub client: reqwest::Client,
    pub platform: Platform,
    /// Ubuntu `VERSION_ID` of the host, probed once; empty off ARM Linux.
    pub linux_distribution: String,
    /// Vendor endpoint root (`…/latest.json`, `…/versions/<p>.json`,
    /// `…/download/…`).
    pub sdk_base: String,
    pub github_base: String,
    pub(crate) latest_versions: OnceCell<Arc<LatestVersions>>,
    pub(crate) available_versions: OnceCell<Arc<AvailableVersions>>,
    pub(crate) rasterizer_versions: OnceCell<Arc<RasterizerVersions>>,
}

impl Context {
    pub fn new(client: reqwest::Client, platform: Platform) -> Self {
        Self::with_endpoints(client, platform, VULKAN_SDK_BASE, GITHUB_API_BASE)
    }

    /// Build a context against alternate endpoint roots (mirrors, tests).
    pub fn with_endpoints(
        client: reqwest::Client,
        platform: Platform,
        sdk_base: impl Into<String>,
        github_base: impl Into<String>,
    ) -> Self {
        let linux_distribution = if platform == Platform::LinuxArm {
            platform::linux_distribution_version_id()
        } else {
            String::new()
        };

        Self {
            client,
            platform,
            linux_distribution,
            sdk_base: sdk_base.into(),
            github_base: github_base.into(),
            latest_versions: OnceCell::new(),
            available_versions: OnceCell::new(),
            rasterizer_versions: OnceCell::new(),
        }
    }
}
