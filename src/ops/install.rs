//! SDK and runtime installation.
//!
//! Per-platform orchestration: Windows runs the downloaded installer
//! elevated, macOS mounts a disk image or stages a zip and runs the
//! bundled installer, Linux installs by plain archive extraction. The
//! installer process is best-effort — a failure is recorded and the run
//! continues to verification, so CI always gets a definitive signal.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::core::platform::Platform;
use crate::io::{dmg, extract};
use crate::ops::context::Context;
use crate::ops::error::SetupError;
use crate::ops::resolve;

/// Outcome of one installer process invocation.
#[derive(Debug, Clone)]
pub struct InstallerOutcome {
    /// Whether an installer process was launched at all. Linux installs
    /// have none; extraction is the installation.
    pub attempted: bool,
    pub succeeded: bool,
    pub message: Option<String>,
}

impl InstallerOutcome {
    fn success() -> Self {
        Self {
            attempted: true,
            succeeded: true,
            message: None,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            attempted: true,
            succeeded: false,
            message: Some(message),
        }
    }

    fn not_needed() -> Self {
        Self {
            attempted: false,
            succeeded: true,
            message: None,
        }
    }
}

/// Result of an SDK install run, consumed by the CLI layer.
#[derive(Debug)]
pub struct InstallResult {
    /// Versioned SDK root including the target-architecture subdirectory.
    pub install_path: PathBuf,
    pub installer: InstallerOutcome,
    pub verified: bool,
}

/// Install the SDK from the downloaded artifact.
pub async fn install_sdk(
    ctx: &Context,
    sdk_path: &Path,
    destination: &Path,
    version: &str,
    optional_components: &[String],
) -> Result<InstallResult, SetupError> {
    info!("Installing Vulkan SDK {version}");

    // Install into a versionized folder, e.g. "C:\VulkanSDK\1.3.250.1".
    let versioned = destination.join(version);

    let installer = match &ctx.platform {
        Platform::Windows | Platform::WindowsArm => {
            install_sdk_windows(sdk_path, &versioned, optional_components)
        }
        Platform::Mac => {
            if sdk_path.to_string_lossy().ends_with(".dmg") {
                install_sdk_mac_dmg(sdk_path, &versioned, version, optional_components)?
            } else {
                install_sdk_mac_zip(&ctx.platform, sdk_path, &versioned, version, optional_components)?
            }
        }
        Platform::Linux | Platform::LinuxArm => {
            // The archive already carries a version-named top-level dir.
            fs::create_dir_all(destination)?;
            extract::extract(&ctx.platform, sdk_path, destination)?;
            InstallerOutcome::not_needed()
        }
        Platform::Other(os) => {
            return Err(SetupError::UnsupportedPlatform {
                artifact: "Vulkan SDK",
                platform: os.clone(),
            });
        }
    };

    if let Some(message) = &installer.message {
        warn!("Installer failed: {message}");
    }

    let install_path = sdk_install_path(&ctx.platform, destination, version);
    let verified = verify_sdk(&ctx.platform, &install_path);

    info!("Installed into folder: {}", versioned.display());

    Ok(InstallResult {
        install_path,
        installer,
        verified,
    })
}

fn installer_args(destination: &Path, optional_components: &[String]) -> Vec<String> {
    let mut args = vec![
        "--root".to_string(),
        destination.display().to_string(),
        "--accept-licenses".to_string(),
        "--default-answer".to_string(),
        "--confirm-command".to_string(),
        "install".to_string(),
    ];
    args.extend(optional_components.iter().cloned());
    args
}

/// Run the Windows installer elevated and wait for it to finish.
///
/// The -Wait matters: the elevated process writes files after the launch
/// returns, and verification would race it otherwise.
fn install_sdk_windows(
    sdk_path: &Path,
    destination: &Path,
    optional_components: &[String],
) -> InstallerOutcome {
    let args = installer_args(destination, optional_components).join(" ");
    let command = format!(
        "Start-Process -FilePath '{}' -Args '{}' -Verb RunAs -Wait",
        sdk_path.display(),
        args
    );
    debug!(%command, "running SDK installer");

    match Command::new("powershell.exe").arg(&command).status() {
        Ok(status) if status.success() => InstallerOutcome::success(),
        Ok(status) => InstallerOutcome::failure(format!(
            "installer exited with {status}; arguments used: {args}"
        )),
        Err(err) => InstallerOutcome::failure(format!("failed to launch installer: {err}")),
    }
}

/// Run the installer binary elevated with the normalized argument set.
fn run_elevated_installer(
    installer: &Path,
    destination: &Path,
    optional_components: &[String],
) -> InstallerOutcome {
    let args = installer_args(destination, optional_components);
    debug!(installer = %installer.display(), ?args, "running SDK installer");

    match Command::new("sudo").arg(installer).args(&args).status() {
        Ok(status) if status.success() => InstallerOutcome::success(),
        Ok(status) => InstallerOutcome::failure(format!(
            "installer exited with {status}; arguments used: {}",
            args.join(" ")
        )),
        Err(err) => InstallerOutcome::failure(format!("failed to launch installer: {err}")),
    }
}

/// Disk-image install path (packaging up to 1.3.290.0): mount, run the
/// embedded installer, detach. The mount guard detaches on drop even when
/// the installer failed, so no volume leaks across CI jobs.
fn install_sdk_mac_dmg(
    sdk_path: &Path,
    destination: &Path,
    version: &str,
    optional_components: &[String],
) -> Result<InstallerOutcome, SetupError> {
    let mounted = dmg::attach(sdk_path, dmg::SDK_MOUNT_POINT)?;
    let installer = mounted.path.join(resolve::mac_installer_name(version));
    Ok(run_elevated_installer(&installer, destination, optional_components))
}

/// Zip install path (packaging after 1.3.290.0): stage into scratch
/// space, then run the installer found inside.
fn install_sdk_mac_zip(
    platform: &Platform,
    sdk_path: &Path,
    destination: &Path,
    version: &str,
    optional_components: &[String],
) -> Result<InstallerOutcome, SetupError> {
    let staging = tempfile::Builder::new().prefix("vkup-sdk-").tempdir()?;
    extract::extract(platform, sdk_path, staging.path())?;
    let installer = staging.path().join(resolve::mac_installer_name(version));
    Ok(run_elevated_installer(&installer, destination, optional_components))
}

/// Install the standalone runtime components (Windows only).
///
/// The vendor zip carries a version-named top-level folder
/// (`VulkanRT-<v>-Components`) that must be flattened away: extract to
/// scratch space, wait for the entry to land, then copy its contents into
/// `<destination>/<version>/runtime`.
pub async fn install_runtime(
    ctx: &Context,
    runtime_path: &Path,
    destination: &Path,
    version: &str,
) -> Result<PathBuf, SetupError> {
    info!("Extracting Vulkan runtime");

    let staging = tempfile::Builder::new().prefix("vkup-runtime-").tempdir()?;
    extract::extract(&ctx.platform, runtime_path, staging.path())?;

    // CI runners can lag between extraction returning and the directory
    // entry becoming visible; poll bounded instead of sleeping blind.
    let top_level = wait_for_dir_entry(staging.path(), Duration::from_secs(10))
        .await?
        .ok_or_else(|| {
            SetupError::Other(format!(
                "no runtime contents appeared under {}",
                staging.path().display()
            ))
        })?;

    let install_path = destination.join(version).join("runtime");
    fs::create_dir_all(&install_path)?;

    let mut options = fs_extra::dir::CopyOptions::new();
    options.content_only = true;
    options.overwrite = true;
    fs_extra::dir::copy(&top_level, &install_path, &options)
        .map_err(|e| SetupError::Other(format!("failed to copy runtime files: {e}")))?;

    info!("Installed into folder: {}", install_path.display());
    Ok(install_path)
}

/// Wait for a directory entry to appear under `dir`, with backoff.
async fn wait_for_dir_entry(dir: &Path, max_wait: Duration) -> std::io::Result<Option<PathBuf>> {
    let deadline = Instant::now() + max_wait;
    let mut delay = Duration::from_millis(100);

    loop {
        let entry = fs::read_dir(dir)?
            .flatten()
            .map(|e| e.path())
            .find(|p| p.is_dir());
        if entry.is_some() {
            return Ok(entry);
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(Duration::from_secs(1));
    }
}

/// Copy the runtime files the bundled installer placed in the Windows
/// system directories back under `<versioned SDK root>/runtime`.
///
/// From 1.4.313.1 on the SDK installer runs `helper\VulkanRT.exe`, which
/// installs x64 components into `system32` and x86 ones into `SysWOW64`
/// (WoW64 naming is inverted like that). The cacheable SDK tree should
/// still carry `runtime/x64/vulkan-1.dll` etc., so copy them back.
pub fn install_runtime_from_sdk(versioned_destination: &Path) -> Result<PathBuf, SetupError> {
    info!("Placing Vulkan runtime into the SDK folder");

    let install_path = versioned_destination.join("runtime");
    let pairs: [(&Path, &str); 2] = [
        (Path::new("C:/WINDOWS/SysWOW64"), "x86"),
        (Path::new("C:/WINDOWS/system32"), "x64"),
    ];

    for (system_dir, arch) in pairs {
        if !system_dir.join("vulkan-1.dll").exists() {
            warn!(
                "No {arch} runtime files found in {}. Skipping copy.",
                system_dir.display()
            );
            continue;
        }
        let target = install_path.join(arch);
        fs::create_dir_all(&target)?;
        for file in ["vulkan-1.dll", "vulkaninfo.exe"] {
            fs::copy(system_dir.join(file), target.join(file))?;
        }
        info!("Copied {arch} runtime files to {}", target.display());
    }

    info!("Installed into folder: {}", install_path.display());
    Ok(install_path)
}

/// Versioned SDK path including the per-platform target architecture
/// subdirectory. Windows installs carry no architecture subdirectory.
pub fn sdk_install_path(platform: &Platform, destination: &Path, version: &str) -> PathBuf {
    let versioned = if destination.ends_with(version) {
        destination.to_path_buf()
    } else {
        destination.join(version)
    };

    match platform {
        Platform::Windows | Platform::WindowsArm | Platform::Other(_) => versioned,
        Platform::LinuxArm => versioned.join("aarch64"),
        Platform::Linux => versioned.join("x86_64"),
        Platform::Mac => versioned.join("macOS"),
    }
}

/// Path of the vulkaninfo executable under an SDK root.
pub fn vulkaninfo_path(platform: &Platform, sdk_root: &Path) -> PathBuf {
    if platform.is_windows_family() {
        sdk_root.join("bin").join("vulkaninfoSDK.exe")
    } else {
        sdk_root.join("bin").join("vulkaninfo")
    }
}

/// Existence check of the vulkaninfo binary. Never fails; a miss is the
/// caller's warning.
pub fn verify_sdk(platform: &Platform, sdk_root: &Path) -> bool {
    if !sdk_root.exists() {
        warn!("Vulkan SDK path doesn't exist: {}", sdk_root.display());
    }
    vulkaninfo_path(platform, sdk_root).exists()
}

/// Run `vulkaninfo --summary` if the binary exists and log its output.
pub fn run_vulkaninfo(platform: &Platform, sdk_root: &Path) {
    let binary = vulkaninfo_path(platform, sdk_root);
    if !binary.exists() {
        warn!("vulkaninfo executable not found at path: {}", binary.display());
        return;
    }

    match Command::new(&binary).arg("--summary").output() {
        Ok(output) if output.status.success() => {
            info!("Vulkan info summary:\n{}", String::from_utf8_lossy(&output.stdout).trim());
        }
        Ok(output) => {
            warn!("vulkaninfo exited with {}", output.status);
        }
        Err(err) => {
            warn!("failed to run vulkaninfo: {err}");
        }
    }
}

/// Runtime verification: both loader files must exist under `x64`.
/// Windows-only concept; false elsewhere.
pub fn verify_runtime(platform: &Platform, runtime_path: &Path) -> bool {
    if !platform.is_windows_family() {
        return false;
    }
    let base = runtime_path.join("x64");
    ["vulkan-1.dll", "vulkaninfo.exe"]
        .iter()
        .all(|file| base.join(file).exists())
}

/// Folders the CI cache never needs.
const STRIPDOWN_FOLDERS: &[&str] = &[
    "Demos",
    "Helpers",
    "installerResources",
    "Licenses",
    "Templates",
];

/// Shrink a Windows install before it enters the CI cache.
///
/// Deletes the known-superfluous folders, then the loose files directly
/// under the install root (maintenancetool.exe, installer.dat, …).
/// Subdirectories are skipped in the file pass — the folder list already
/// handled them. Best-effort: individual failures are logged, not fatal.
pub fn stripdown_sdk(platform: &Platform, sdk_install_path: &Path) {
    if !platform.is_windows_family() {
        return;
    }

    info!("Reducing Vulkan SDK size before caching");

    for folder in STRIPDOWN_FOLDERS {
        let path = sdk_install_path.join(folder);
        if !path.exists() {
            debug!("Folder {} doesn't exist.", path.display());
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => info!("Deleted folder: {}", path.display()),
            Err(err) => warn!("Error removing folder {}: {err}", path.display()),
        }
    }

    let entries = match fs::read_dir(sdk_install_path) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Cannot list {}: {err}", sdk_install_path.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => info!("Deleted file: {}", path.display()),
            Err(err) => warn!("Error removing file {}: {err}", path.display()),
        }
    }
}
