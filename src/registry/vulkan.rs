//! LunarG version documents.
//!
//! The vendor publishes two documents per platform: the latest released
//! version (`latest.json`) and the full list of versions it still serves
//! (`versions/<platform>.json`, sorted descending). Each is fetched at
//! most once per process through the caches in
//! [`Context`](crate::ops::context::Context); every caller afterwards
//! receives the identical `Arc`.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Deserialize;

use crate::core::platform::Platform;
use crate::core::version;
use crate::io::http;
use crate::ops::context::Context;
use crate::ops::error::SetupError;

/// Default vendor endpoint root.
pub const VULKAN_SDK_BASE: &str = "https://vulkan.lunarg.com/sdk";

/// Latest published SDK version per platform.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub windows: String,
    pub linux: String,
    pub mac: String,
    pub warm: String,
}

impl LatestVersions {
    /// Entry for `platform`. ARM Linux reads the `linux` entry; an
    /// unrecognized platform has none.
    pub fn for_platform(&self, platform: &Platform) -> Option<&str> {
        match platform {
            Platform::Windows => Some(&self.windows),
            Platform::WindowsArm => Some(&self.warm),
            Platform::Linux | Platform::LinuxArm => Some(&self.linux),
            Platform::Mac => Some(&self.mac),
            Platform::Other(_) => None,
        }
    }
}

/// All SDK versions the vendor currently publishes for one platform,
/// sorted descending by the vendor.
#[derive(Debug, Clone)]
pub struct AvailableVersions {
    pub versions: Vec<String>,
}

/// Fetch (once) the latest-version document.
pub async fn fetch_latest(ctx: &Context) -> Result<Arc<LatestVersions>, SetupError> {
    ctx.latest_versions
        .get_or_try_init(|| async {
            let url = format!("{}/latest.json", ctx.sdk_base);
            let latest: LatestVersions =
                http::get_json(&ctx.client, &url)
                    .await
                    .map_err(|_| SetupError::Registry {
                        what: "the latest version information",
                        url,
                    })?;
            Ok(Arc::new(latest))
        })
        .await
        .map(Arc::clone)
}

/// Fetch (once) the available-versions document for the run's platform.
pub async fn fetch_available(ctx: &Context) -> Result<Arc<AvailableVersions>, SetupError> {
    ctx.available_versions
        .get_or_try_init(|| async {
            let url = format!("{}/versions/{}.json", ctx.sdk_base, ctx.platform.vendor_key());
            let versions: Vec<String> =
                http::get_json(&ctx.client, &url)
                    .await
                    .map_err(|_| SetupError::Registry {
                        what: "the list of all available Vulkan SDK versions",
                        url,
                    })?;
            Ok(Arc::new(AvailableVersions { versions }))
        })
        .await
        .map(Arc::clone)
}

/// Resolve the requested version to a concrete one.
///
/// `latest` (or an empty request) resolves through the latest-version
/// document; anything else passes through unchanged.
pub async fn resolve_version(ctx: &Context, requested: &str) -> Result<String, SetupError> {
    if !requested.is_empty() && requested != "latest" {
        return Ok(requested.to_string());
    }

    let latest = fetch_latest(ctx).await?;
    latest
        .for_platform(&ctx.platform)
        .map(str::to_string)
        .ok_or_else(|| SetupError::UnsupportedPlatform {
            artifact: "Vulkan SDK",
            platform: ctx.platform.id().to_string(),
        })
}

/// Version immediately below `current` in `versions`.
///
/// The list is re-sorted descending through the numeric comparator before
/// scanning. Returns `current` unchanged when it is absent from the list
/// or already the minimum; an empty list is an error.
pub fn lower_version(current: &str, versions: &[String]) -> Result<String, SetupError> {
    if versions.is_empty() {
        return Err(SetupError::NoAvailableVersions);
    }

    let mut sorted: Vec<&str> = versions.iter().map(String::as_str).collect();
    sorted.sort_by(|a, b| version::compare(b, a));

    let Some(position) = sorted
        .iter()
        .position(|v| version::compare(v, current) == Ordering::Equal)
    else {
        return Ok(current.to_string());
    };

    Ok(sorted
        .get(position + 1)
        .map_or_else(|| current.to_string(), |v| (*v).to_string()))
}
