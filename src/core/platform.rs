//! Platform detection.
//!
//! The install pipeline targets five runner flavors: Windows x64, Windows
//! ARM64 ("warm" in vendor URLs), Linux x64, Linux ARM64, and macOS.
//! Detection happens once per process; ARM variants are matched before
//! their x64 counterparts so an ARM64 Windows host is never classified as
//! plain Windows.

use std::fmt;
use std::path::Path;

/// Detected runner platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    WindowsArm,
    Linux,
    LinuxArm,
    Mac,
    /// Unrecognized operating system, carried for diagnostics only. Every
    /// resolver path rejects it with an error naming the OS.
    Other(String),
}

impl Platform {
    /// Detect the platform of the current process.
    pub fn current() -> Self {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Classify an (OS, architecture) pair. ARM checks come first.
    pub fn from_os_arch(os: &str, arch: &str) -> Self {
        match (os, arch) {
            ("windows", "aarch64") => Self::WindowsArm,
            ("windows", _) => Self::Windows,
            ("linux", "aarch64") => Self::LinuxArm,
            ("linux", _) => Self::Linux,
            ("macos", _) => Self::Mac,
            (other, _) => Self::Other(other.to_string()),
        }
    }

    /// Identifier used in logs and error messages.
    pub fn id(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::WindowsArm => "warm",
            Self::Linux => "linux",
            Self::LinuxArm => "linux-arm",
            Self::Mac => "mac",
            Self::Other(os) => os,
        }
    }

    /// Key used in the vendor's version documents and download paths.
    ///
    /// LunarG publishes no separate documents for ARM Linux; it reads the
    /// `linux` entries.
    pub fn vendor_key(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::WindowsArm => "warm",
            Self::Linux | Self::LinuxArm => "linux",
            Self::Mac => "mac",
            Self::Other(os) => os,
        }
    }

    pub fn is_windows_family(&self) -> bool {
        matches!(self, Self::Windows | Self::WindowsArm)
    }

    pub fn is_linux_family(&self) -> bool {
        matches!(self, Self::Linux | Self::LinuxArm)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Read the `VERSION_ID` field from `/etc/os-release`.
///
/// Used only to pick the repackaging target for the ARM Linux SDK
/// archive. A missing file or field yields an empty string; the caller
/// supplies the default.
pub fn linux_distribution_version_id() -> String {
    distribution_version_from(Path::new("/etc/os-release"))
}

fn distribution_version_from(path: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return String::new();
    };
    for line in content.lines() {
        if let Some(raw) = line.strip_prefix("VERSION_ID=") {
            return raw.trim().trim_matches('"').to_string();
        }
    }
    String::new()
}
