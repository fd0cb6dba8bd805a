//! DMG handling via hdiutil

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Mount point used for SDK disk images.
pub const SDK_MOUNT_POINT: &str = "/Volumes/vulkan-sdk";

/// Represents a mounted disk image. Dropping this struct detaches the
/// volume, so a failed installer never leaks a mounted volume into the
/// next CI job.
pub struct MountPoint {
    pub path: PathBuf,
}

impl Drop for MountPoint {
    fn drop(&mut self) {
        let _ = detach(&self.path);
    }
}

/// Attach a DMG file at a fixed mount point.
pub fn attach(dmg_path: &Path, mount_point: &str) -> Result<MountPoint> {
    let output = Command::new("hdiutil")
        .arg("attach")
        .arg("-nobrowse")
        .arg("-mountpoint")
        .arg(mount_point)
        .arg(dmg_path)
        .output()
        .context("Failed to execute hdiutil")?;

    if !output.status.success() {
        bail!(
            "hdiutil attach failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(MountPoint {
        path: PathBuf::from(mount_point),
    })
}

/// Detach a volume
pub fn detach(mount_point: &Path) -> Result<()> {
    // Retry logic often good for detach (busy resource)
    for _ in 0..3 {
        let status = Command::new("hdiutil")
            .arg("detach")
            .arg(mount_point)
            .arg("-force")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if let Ok(s) = status {
            if s.success() {
                return Ok(());
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(500));
    }

    bail!("Failed to detach {}", mount_point.display());
}
