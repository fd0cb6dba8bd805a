//! Run configuration.
//!
//! Mirrors the CI-style inputs: everything optional, falling back to a
//! platform default. Validation happens here so the install pipeline only
//! sees well-formed values.

use std::path::PathBuf;

use regex::Regex;
use tracing::{info, warn};

use crate::core::platform::Platform;
use crate::ops::error::SetupError;

/// Components the Windows SDK installer accepts.
const OPTIONAL_COMPONENTS_ALLOWLIST: &[&str] = &[
    "com.lunarg.vulkan.32bit",
    "com.lunarg.vulkan.sdl2",
    "com.lunarg.vulkan.glm",
    "com.lunarg.vulkan.volk",
    "com.lunarg.vulkan.vma",
    "com.lunarg.vulkan.debug32",
    // components of old installers
    "com.lunarg.vulkan.thirdparty",
    "com.lunarg.vulkan.debug",
];

/// Raw option values as they come in from the CLI.
#[derive(Debug, Default)]
pub struct RawInputs {
    pub version: Option<String>,
    pub destination: Option<PathBuf>,
    pub install_runtime: bool,
    pub use_cache: bool,
    pub optional_components: Option<String>,
    pub stripdown: bool,
    pub install_swiftshader: bool,
    pub swiftshader_destination: Option<PathBuf>,
    pub install_lavapipe: bool,
    pub lavapipe_destination: Option<PathBuf>,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Concrete version string or `latest`.
    pub version: String,
    pub destination: PathBuf,
    pub install_runtime: bool,
    pub use_cache: bool,
    pub optional_components: Vec<String>,
    pub stripdown: bool,
    pub install_swiftshader: bool,
    pub swiftshader_destination: PathBuf,
    pub install_lavapipe: bool,
    pub lavapipe_destination: PathBuf,
}

impl Config {
    pub fn resolve(platform: &Platform, raw: RawInputs) -> Result<Self, SetupError> {
        Ok(Self {
            version: validate_version(raw.version.as_deref().unwrap_or(""))?,
            destination: raw
                .destination
                .unwrap_or_else(|| default_destination(platform, "VulkanSDK", "vulkan-sdk")),
            install_runtime: raw.install_runtime,
            use_cache: raw.use_cache,
            optional_components: filter_optional_components(
                raw.optional_components.as_deref().unwrap_or(""),
            ),
            stripdown: raw.stripdown,
            install_swiftshader: raw.install_swiftshader,
            swiftshader_destination: raw
                .swiftshader_destination
                .unwrap_or_else(|| default_destination(platform, "Swiftshader", "swiftshader")),
            install_lavapipe: raw.install_lavapipe,
            lavapipe_destination: raw
                .lavapipe_destination
                .unwrap_or_else(|| default_destination(platform, "Lavapipe", "lavapipe")),
        })
    }
}

/// Validate a requested version.
///
/// Empty input means `latest`. Anything else must match the
/// `major.minor.patch.revision` scheme.
pub fn validate_version(requested: &str) -> Result<String, SetupError> {
    if requested.is_empty() || requested == "latest" {
        return Ok("latest".to_string());
    }

    let pattern = Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("version pattern is valid");
    if pattern.is_match(requested) {
        Ok(requested.to_string())
    } else {
        Err(SetupError::InvalidVersion(requested.to_string()))
    }
}

/// Platform default install location: a drive-root folder on Windows, a
/// home-relative one elsewhere.
fn default_destination(platform: &Platform, windows_name: &str, unix_name: &str) -> PathBuf {
    if platform.is_windows_family() {
        PathBuf::from(format!("C:\\{windows_name}"))
    } else {
        crate::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(unix_name)
    }
}

/// Filter a comma-separated component list against the allow-list.
///
/// Unknown entries are dropped with a warning, not an error.
pub fn filter_optional_components(raw: &str) -> Vec<String> {
    let requested: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();

    let (valid, invalid): (Vec<&str>, Vec<&str>) = requested
        .into_iter()
        .partition(|item| OPTIONAL_COMPONENTS_ALLOWLIST.contains(item));

    if !invalid.is_empty() {
        warn!("Please remove the following invalid optional components: {invalid:?}");
    }
    if !valid.is_empty() {
        info!("Installing optional components: {valid:?}");
    }

    valid.into_iter().map(str::to_string).collect()
}
