//! Download URL and filename resolution.
//!
//! The vendor has changed installer packaging and naming at specific
//! version boundaries, so every (artifact, platform) pairing resolves
//! through an ordered rule table: the first rule whose platform matches
//! and whose threshold predicate holds wins. A rule's `above` threshold
//! is exclusive — the boundary version itself keeps the older scheme.

use tracing::info;

use crate::core::platform::Platform;
use crate::core::version;
use crate::io::http;
use crate::ops::context::Context;
use crate::ops::error::SetupError;
use crate::registry::vulkan;

/// A resolved artifact: where to fetch it and what to call it locally.
///
/// `version` can differ from the requested one after the runtime
/// fallback search has walked down the available-versions list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    pub filename: String,
    pub version: String,
}

/// Matching key for rule tables: concrete platforms only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlatformKey {
    Windows,
    WindowsArm,
    Linux,
    LinuxArm,
    Mac,
}

impl PlatformKey {
    fn of(platform: &Platform) -> Option<Self> {
        match platform {
            Platform::Windows => Some(Self::Windows),
            Platform::WindowsArm => Some(Self::WindowsArm),
            Platform::Linux => Some(Self::Linux),
            Platform::LinuxArm => Some(Self::LinuxArm),
            Platform::Mac => Some(Self::Mac),
            Platform::Other(_) => None,
        }
    }
}

/// One naming rule. Applies when the platform matches and the version is
/// strictly above `above` (unconditionally when `above` is `None`).
struct UrlRule {
    platform: PlatformKey,
    above: Option<&'static str>,
    /// URL template; `{base}`, `{version}`, `{distro}` are substituted.
    url: &'static str,
    /// Local filename template for the download.
    filename: &'static str,
}

/// SDK installer/archive naming, newest scheme first per platform.
///
/// Known packaging boundaries: the Windows installer filename scheme
/// changed after 1.4.309.0 (both architectures), the Linux archive
/// compression switched from gzip to xz after 1.3.250.1, and macOS
/// packaging switched from disk image to zip after 1.3.290.0. ARM Linux
/// builds are repackaged per Ubuntu LTS release on GitHub.
const SDK_RULES: &[UrlRule] = &[
    UrlRule {
        platform: PlatformKey::WindowsArm,
        above: Some("1.4.309.0"),
        url: "{base}/download/{version}/warm/vulkansdk-windows-ARM64-{version}.exe",
        filename: "VulkanSDK-Installer.exe",
    },
    UrlRule {
        platform: PlatformKey::WindowsArm,
        above: None,
        url: "{base}/download/{version}/warm/InstallVulkanARM64-{version}.exe",
        filename: "VulkanSDK-Installer.exe",
    },
    UrlRule {
        platform: PlatformKey::Windows,
        above: Some("1.4.309.0"),
        url: "{base}/download/{version}/windows/vulkansdk-windows-X64-{version}.exe",
        filename: "VulkanSDK-Installer.exe",
    },
    UrlRule {
        platform: PlatformKey::Windows,
        above: None,
        url: "{base}/download/{version}/windows/VulkanSDK-{version}-Installer.exe",
        filename: "VulkanSDK-Installer.exe",
    },
    UrlRule {
        platform: PlatformKey::LinuxArm,
        above: None,
        url: "https://github.com/jakoch/vulkan-sdk-arm/releases/download/{version}/vulkansdk-ubuntu-{distro}-arm-{version}.tar.xz",
        filename: "vulkansdk-linux-arm.tar.xz",
    },
    UrlRule {
        platform: PlatformKey::Linux,
        above: Some("1.3.250.1"),
        url: "{base}/download/{version}/linux/vulkansdk-linux-x86_64-{version}.tar.xz",
        filename: "vulkansdk-linux-x86_64.tar.xz",
    },
    UrlRule {
        platform: PlatformKey::Linux,
        above: None,
        url: "{base}/download/{version}/linux/vulkansdk-linux-x86_64-{version}.tar.gz",
        filename: "vulkansdk-linux-x86_64.tar.gz",
    },
    UrlRule {
        platform: PlatformKey::Mac,
        above: Some("1.3.290.0"),
        url: "{base}/download/{version}/mac/vulkansdk-macos-{version}.zip",
        filename: "vulkansdk-macos.zip",
    },
    UrlRule {
        platform: PlatformKey::Mac,
        above: None,
        url: "{base}/download/{version}/mac/vulkansdk-macos-{version}.dmg",
        filename: "vulkansdk-macos.dmg",
    },
];

/// Standalone runtime components, Windows families only.
const RUNTIME_RULES: &[UrlRule] = &[
    UrlRule {
        platform: PlatformKey::Windows,
        above: None,
        url: "{base}/download/{version}/windows/VulkanRT-{version}-Components.zip",
        filename: "vulkan-runtime-components.zip",
    },
    UrlRule {
        platform: PlatformKey::WindowsArm,
        above: None,
        url: "{base}/download/{version}/warm/VulkanRT-ARM64-{version}-Components.zip",
        filename: "vulkan-runtime-components.zip",
    },
];

/// Ubuntu release targeted by ARM Linux repackaging when the host probe
/// reports nothing usable.
const DEFAULT_ARM_DISTRIBUTION: &str = "24.04";

fn find_rule<'a>(
    rules: &'a [UrlRule],
    platform: &Platform,
    version: &str,
    artifact: &'static str,
) -> Result<&'a UrlRule, SetupError> {
    let key = PlatformKey::of(platform).ok_or_else(|| SetupError::UnsupportedPlatform {
        artifact,
        platform: platform.id().to_string(),
    })?;

    rules
        .iter()
        .find(|rule| {
            rule.platform == key
                && rule.above.map_or(true, |threshold| version::is_above(version, threshold))
        })
        .ok_or_else(|| SetupError::UnsupportedPlatform {
            artifact,
            platform: platform.id().to_string(),
        })
}

fn render(template: &str, base: &str, version: &str, distro: &str) -> String {
    template
        .replace("{base}", base)
        .replace("{version}", version)
        .replace("{distro}", distro)
}

fn arm_distribution(probed: &str) -> &str {
    // Only the 22.04 repack differs; everything else takes the default.
    if probed == "22.04" { "22.04" } else { DEFAULT_ARM_DISTRIBUTION }
}

/// SDK download URL for (version, platform). Pure; no availability check.
pub fn sdk_url(
    base: &str,
    version: &str,
    platform: &Platform,
    probed_distribution: &str,
) -> Result<String, SetupError> {
    let rule = find_rule(SDK_RULES, platform, version, "Vulkan SDK")?;
    Ok(render(rule.url, base, version, arm_distribution(probed_distribution)))
}

/// Local filename for the SDK download.
pub fn sdk_filename(version: &str, platform: &Platform) -> Result<String, SetupError> {
    let rule = find_rule(SDK_RULES, platform, version, "Vulkan SDK")?;
    Ok(rule.filename.to_string())
}

/// Runtime download URL for (version, platform). Pure.
pub fn runtime_url(base: &str, version: &str, platform: &Platform) -> Result<String, SetupError> {
    let rule = find_rule(RUNTIME_RULES, platform, version, "Vulkan runtime")?;
    Ok(render(rule.url, base, version, ""))
}

/// Whether the runtime ships inside the SDK installer for `version`.
///
/// From 1.4.313.1 on, the Windows SDK installer runs the bundled runtime
/// installer itself; no standalone components archive is published.
pub fn runtime_bundled_with_sdk(version: &str) -> bool {
    version::is_above(version, "1.4.313.0")
}

/// Resolve the SDK artifact, probing availability before committing to a
/// multi-gigabyte download.
pub async fn resolve_sdk(ctx: &Context, version: &str) -> Result<ResolvedArtifact, SetupError> {
    let url = sdk_url(&ctx.sdk_base, version, &ctx.platform, &ctx.linux_distribution)?;
    let filename = sdk_filename(version, &ctx.platform)?;

    http::is_downloadable(&ctx.client, "VULKAN_SDK", version, &url).await?;

    Ok(ResolvedArtifact {
        url,
        filename,
        version: version.to_string(),
    })
}

/// Resolve the runtime artifact, falling back to lower versions.
///
/// Runtime publication lags the SDK, so a miss on the exact version walks
/// down the vendor's available-versions list. Bounded to three attempts
/// total; when no strictly-lower version exists the search logs it and
/// still spends an attempt on the same version before giving up.
pub async fn resolve_runtime(ctx: &Context, version: &str) -> Result<ResolvedArtifact, SetupError> {
    const MAX_ATTEMPTS: u32 = 3;

    let available = vulkan::fetch_available(ctx).await?;
    if available.versions.is_empty() {
        return Err(SetupError::NoAvailableVersions);
    }

    let mut current = version.to_string();
    for attempt in 1..=MAX_ATTEMPTS {
        let url = runtime_url(&ctx.sdk_base, &current, &ctx.platform)?;
        match http::is_downloadable(&ctx.client, "VULKAN_RUNTIME", &current, &url).await {
            Ok(()) => {
                return Ok(ResolvedArtifact {
                    url,
                    filename: "vulkan-runtime-components.zip".to_string(),
                    version: current,
                });
            }
            Err(_) => {
                info!("Attempt {attempt}: Vulkan runtime {current} is not downloadable");
                let lower = vulkan::lower_version(&current, &available.versions)?;
                if lower == current {
                    info!("No lower version available for Vulkan runtime {current}");
                }
                info!("Trying to download using a lower version {lower}...");
                current = lower;
            }
        }
    }

    Err(SetupError::RuntimeExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// Versioned path of the macOS installer binary inside the image or zip.
struct MacInstallerRule {
    /// Applies when the version is at or above this bound.
    from: Option<&'static str>,
    template: &'static str,
}

/// Newest naming scheme first; the final rule is the unversioned catch-all.
const MAC_INSTALLER_RULES: &[MacInstallerRule] = &[
    MacInstallerRule {
        from: Some("1.4.313.0"),
        template: "vulkansdk-macOS-{version}.app/Contents/MacOS/vulkansdk-macOS-{version}",
    },
    MacInstallerRule {
        from: Some("1.4.304.1"),
        template: "InstallVulkan-{version}.app/Contents/MacOS/InstallVulkan-{version}",
    },
    MacInstallerRule {
        from: None,
        template: "InstallVulkan.app/Contents/MacOS/InstallVulkan",
    },
];

/// Relative path of the macOS installer binary for `version`.
pub fn mac_installer_name(version: &str) -> String {
    let rule = MAC_INSTALLER_RULES
        .iter()
        .find(|rule| rule.from.map_or(true, |from| version::is_at_least(version, from)))
        .expect("mac installer rule table ends with a catch-all");
    rule.template.replace("{version}", version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;

    const BASE: &str = "https://sdk.lunarg.com/sdk";

    #[test]
    fn windows_url_schemes_switch_after_1_4_309_0() {
        let url = sdk_url(BASE, "1.3.250.1", &Platform::Windows, "").unwrap();
        assert_eq!(
            url,
            "https://sdk.lunarg.com/sdk/download/1.3.250.1/windows/VulkanSDK-1.3.250.1-Installer.exe"
        );

        // The boundary version itself keeps the old scheme.
        let url = sdk_url(BASE, "1.4.309.0", &Platform::Windows, "").unwrap();
        assert_eq!(
            url,
            "https://sdk.lunarg.com/sdk/download/1.4.309.0/windows/VulkanSDK-1.4.309.0-Installer.exe"
        );

        let url = sdk_url(BASE, "1.4.313.0", &Platform::Windows, "").unwrap();
        assert_eq!(
            url,
            "https://sdk.lunarg.com/sdk/download/1.4.313.0/windows/vulkansdk-windows-X64-1.4.313.0.exe"
        );
    }

    #[test]
    fn windows_arm_url_schemes_switch_after_1_4_309_0() {
        let url = sdk_url(BASE, "1.3.290.0", &Platform::WindowsArm, "").unwrap();
        assert_eq!(
            url,
            "https://sdk.lunarg.com/sdk/download/1.3.290.0/warm/InstallVulkanARM64-1.3.290.0.exe"
        );

        let url = sdk_url(BASE, "1.4.309.0", &Platform::WindowsArm, "").unwrap();
        assert_eq!(
            url,
            "https://sdk.lunarg.com/sdk/download/1.4.309.0/warm/InstallVulkanARM64-1.4.309.0.exe"
        );

        let url = sdk_url(BASE, "1.4.313.0", &Platform::WindowsArm, "").unwrap();
        assert_eq!(
            url,
            "https://sdk.lunarg.com/sdk/download/1.4.313.0/warm/vulkansdk-windows-ARM64-1.4.313.0.exe"
        );
    }

    #[test]
    fn linux_compression_switches_after_1_3_250_1() {
        let url = sdk_url(BASE, "1.3.250.1", &Platform::Linux, "").unwrap();
        assert!(url.ends_with("/linux/vulkansdk-linux-x86_64-1.3.250.1.tar.gz"), "{url}");

        let url = sdk_url(BASE, "1.3.250.2", &Platform::Linux, "").unwrap();
        assert!(url.ends_with("/linux/vulkansdk-linux-x86_64-1.3.250.2.tar.xz"), "{url}");
    }

    #[test]
    fn linux_filenames_follow_the_compression_boundary() {
        assert_eq!(
            sdk_filename("1.3.249.9", &Platform::Linux).unwrap(),
            "vulkansdk-linux-x86_64.tar.gz"
        );
        assert_eq!(
            sdk_filename("2.3.250.1", &Platform::Linux).unwrap(),
            "vulkansdk-linux-x86_64.tar.xz"
        );
    }

    #[test]
    fn mac_packaging_switches_after_1_3_290_0() {
        assert_eq!(
            sdk_filename("1.3.290.0", &Platform::Mac).unwrap(),
            "vulkansdk-macos.dmg"
        );
        assert_eq!(
            sdk_filename("1.3.290.1", &Platform::Mac).unwrap(),
            "vulkansdk-macos.zip"
        );

        let url = sdk_url(BASE, "1.3.290.0", &Platform::Mac, "").unwrap();
        assert!(url.ends_with("/mac/vulkansdk-macos-1.3.290.0.dmg"), "{url}");
        let url = sdk_url(BASE, "1.3.290.1", &Platform::Mac, "").unwrap();
        assert!(url.ends_with("/mac/vulkansdk-macos-1.3.290.1.zip"), "{url}");
    }

    #[test]
    fn linux_arm_targets_the_probed_ubuntu_release() {
        let url = sdk_url(BASE, "1.4.304.0", &Platform::LinuxArm, "22.04").unwrap();
        assert_eq!(
            url,
            "https://github.com/jakoch/vulkan-sdk-arm/releases/download/1.4.304.0/vulkansdk-ubuntu-22.04-arm-1.4.304.0.tar.xz"
        );

        // Anything but 22.04 (including an empty probe) takes the default.
        let url = sdk_url(BASE, "1.4.304.0", &Platform::LinuxArm, "").unwrap();
        assert!(url.contains("vulkansdk-ubuntu-24.04-arm-"), "{url}");
        let url = sdk_url(BASE, "1.4.304.0", &Platform::LinuxArm, "20.04").unwrap();
        assert!(url.contains("vulkansdk-ubuntu-24.04-arm-"), "{url}");
    }

    #[test]
    fn resolution_is_deterministic() {
        let first = sdk_url(BASE, "1.4.304.0", &Platform::Windows, "").unwrap();
        let second = sdk_url(BASE, "1.4.304.0", &Platform::Windows, "").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn runtime_urls_per_architecture() {
        assert_eq!(
            runtime_url(BASE, "1.3.250.1", &Platform::Windows).unwrap(),
            "https://sdk.lunarg.com/sdk/download/1.3.250.1/windows/VulkanRT-1.3.250.1-Components.zip"
        );
        assert_eq!(
            runtime_url(BASE, "1.4.309.0", &Platform::WindowsArm).unwrap(),
            "https://sdk.lunarg.com/sdk/download/1.4.309.0/warm/VulkanRT-ARM64-1.4.309.0-Components.zip"
        );
    }

    #[test]
    fn runtime_is_a_windows_only_concept() {
        let err = runtime_url(BASE, "1.3.250.1", &Platform::Linux).unwrap_err();
        assert!(matches!(err, SetupError::UnsupportedPlatform { .. }));
        let err = runtime_url(BASE, "1.3.250.1", &Platform::Mac).unwrap_err();
        assert!(matches!(err, SetupError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn unknown_platform_is_rejected_with_its_name() {
        let platform = Platform::Other("freebsd".to_string());
        let err = sdk_url(BASE, "1.3.250.1", &platform, "").unwrap_err();
        assert!(err.to_string().contains("freebsd"), "{err}");
    }

    #[test]
    fn runtime_bundling_starts_after_1_4_313_0() {
        assert!(!runtime_bundled_with_sdk("1.4.313.0"));
        assert!(runtime_bundled_with_sdk("1.4.313.1"));
        assert!(runtime_bundled_with_sdk("1.5.0.0"));
        assert!(!runtime_bundled_with_sdk("1.3.250.1"));
    }

    #[test]
    fn mac_installer_name_schemes() {
        assert_eq!(
            mac_installer_name("1.3.296.0"),
            "InstallVulkan.app/Contents/MacOS/InstallVulkan"
        );
        assert_eq!(
            mac_installer_name("1.4.304.0"),
            "InstallVulkan.app/Contents/MacOS/InstallVulkan"
        );
        assert_eq!(
            mac_installer_name("1.4.304.1"),
            "InstallVulkan-1.4.304.1.app/Contents/MacOS/InstallVulkan-1.4.304.1"
        );
        assert_eq!(
            mac_installer_name("1.4.312.0"),
            "InstallVulkan-1.4.312.0.app/Contents/MacOS/InstallVulkan-1.4.312.0"
        );
        assert_eq!(
            mac_installer_name("1.4.313.0"),
            "vulkansdk-macOS-1.4.313.0.app/Contents/MacOS/vulkansdk-macOS-1.4.313.0"
        );
    }

    #[tokio::test]
    async fn resolve_sdk_fails_fast_when_not_downloadable() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("HEAD", "/download/1.3.250.1/linux/vulkansdk-linux-x86_64-1.3.250.1.tar.gz")
            .with_status(404)
            .create_async()
            .await;

        let ctx = Context::with_endpoints(
            reqwest::Client::new(),
            Platform::Linux,
            server.url(),
            server.url(),
        );

        let err = resolve_sdk(&ctx, "1.3.250.1").await.unwrap_err();
        assert!(matches!(err, SetupError::NotDownloadable { .. }));
    }

    #[tokio::test]
    async fn resolve_sdk_returns_url_and_filename() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("HEAD", "/download/1.3.250.1/linux/vulkansdk-linux-x86_64-1.3.250.1.tar.gz")
            .with_status(200)
            .create_async()
            .await;

        let ctx = Context::with_endpoints(
            reqwest::Client::new(),
            Platform::Linux,
            server.url(),
            server.url(),
        );

        let resolved = resolve_sdk(&ctx, "1.3.250.1").await.unwrap();
        assert_eq!(resolved.filename, "vulkansdk-linux-x86_64.tar.gz");
        assert!(resolved.url.ends_with("/download/1.3.250.1/linux/vulkansdk-linux-x86_64-1.3.250.1.tar.gz"));
        assert_eq!(resolved.version, "1.3.250.1");
    }

    #[tokio::test]
    async fn runtime_fallback_walks_down_the_available_versions() {
        let mut server = mockito::Server::new_async().await;

        let _versions = server
            .mock("GET", "/versions/windows.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["1.4.304.0", "1.3.296.0", "1.3.290.0"]"#)
            .create_async()
            .await;
        let _missing = server
            .mock("HEAD", "/download/1.4.304.0/windows/VulkanRT-1.4.304.0-Components.zip")
            .with_status(404)
            .create_async()
            .await;
        let _found = server
            .mock("HEAD", "/download/1.3.296.0/windows/VulkanRT-1.3.296.0-Components.zip")
            .with_status(200)
            .create_async()
            .await;

        let ctx = Context::with_endpoints(
            reqwest::Client::new(),
            Platform::Windows,
            server.url(),
            server.url(),
        );

        let resolved = resolve_runtime(&ctx, "1.4.304.0").await.unwrap();
        assert_eq!(resolved.version, "1.3.296.0");
        assert!(resolved.url.contains("VulkanRT-1.3.296.0-Components.zip"));
        assert_eq!(resolved.filename, "vulkan-runtime-components.zip");
    }

    #[tokio::test]
    async fn runtime_fallback_exhausts_after_three_attempts() {
        let mut server = mockito::Server::new_async().await;

        let _versions = server
            .mock("GET", "/versions/windows.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["1.4.304.0", "1.3.296.0", "1.3.290.0"]"#)
            .create_async()
            .await;
        // Every probe misses; 1.4.304.0 -> 1.3.296.0 -> 1.3.290.0, then stop.
        let probes = server
            .mock("HEAD", mockito::Matcher::Regex(r"/download/.*Components\.zip".to_string()))
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let ctx = Context::with_endpoints(
            reqwest::Client::new(),
            Platform::Windows,
            server.url(),
            server.url(),
        );

        let err = resolve_runtime(&ctx, "1.4.304.0").await.unwrap_err();
        assert!(matches!(err, SetupError::RuntimeExhausted { attempts: 3 }));
        probes.assert_async().await;
    }

    #[tokio::test]
    async fn runtime_fallback_retries_the_minimum_version() {
        // The lowest known version has no lower neighbour; the search
        // retries it and spends the attempt budget rather than failing
        // on the first miss.
        let mut server = mockito::Server::new_async().await;

        let _versions = server
            .mock("GET", "/versions/windows.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["1.4.304.0", "1.3.296.0", "1.3.290.0"]"#)
            .create_async()
            .await;
        let probes = server
            .mock("HEAD", "/download/1.3.290.0/windows/VulkanRT-1.3.290.0-Components.zip")
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let ctx = Context::with_endpoints(
            reqwest::Client::new(),
            Platform::Windows,
            server.url(),
            server.url(),
        );

        let err = resolve_runtime(&ctx, "1.3.290.0").await.unwrap_err();
        assert!(matches!(err, SetupError::RuntimeExhausted { attempts: 3 }));
        probes.assert_async().await;
    }

    #[tokio::test]
    async fn runtime_fallback_rejects_an_empty_version_list() {
        let mut server = mockito::Server::new_async().await;
        let _versions = server
            .mock("GET", "/versions/windows.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let ctx = Context::with_endpoints(
            reqwest::Client::new(),
            Platform::Windows,
            server.url(),
            server.url(),
        );

        let err = resolve_runtime(&ctx, "1.4.304.0").await.unwrap_err();
        assert!(matches!(err, SetupError::NoAvailableVersions));
    }
}
