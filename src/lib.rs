//! vkup - Vulkan SDK installer for CI runners.
//!
//! Resolves, downloads, and installs versioned LunarG Vulkan SDK and
//! runtime artifacts, plus the SwiftShader and lavapipe software
//! rasterizers, across Windows (x64/ARM64), Linux (x64/ARM64), and macOS.
//!
//! # Architecture
//!
//! - **`core`** — pure leaves: numeric version comparison and platform
//!   detection.
//! - **`registry`** — vendor and GitHub version documents, fetched once
//!   per process and cached in the run [`ops::context::Context`].
//! - **`io`** — availability probing, streaming downloads, the archive
//!   dispatch table, and DMG mounting.
//! - **`ops`** — URL threshold rule tables, the runtime fallback search,
//!   and the per-platform install orchestration.
//!
//! The vendor changes packaging at specific version boundaries (installer
//! filenames, archive compression, disk image vs. zip), so resolution is
//! table-driven throughout: ordered rules with explicit threshold
//! predicates, first match wins.

pub mod cmd;
pub mod config;
pub mod core;
pub mod io;
pub mod ops;
pub mod registry;

use std::path::PathBuf;

/// User agent for vendor and GitHub requests.
pub const USER_AGENT: &str = concat!("vkup/", env!("CARGO_PKG_VERSION"));

/// Scratch directory for downloads and staging.
///
/// Honors `RUNNER_TEMP` (set on CI runners) before the system default.
pub fn temp_dir() -> PathBuf {
    std::env::var_os("RUNNER_TEMP")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Home directory, used for default install destinations.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}
