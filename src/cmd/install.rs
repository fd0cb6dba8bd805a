//! The `install` command: resolve, download, install, verify, export.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::platform::Platform;
use crate::io::download;
use crate::ops::context::Context;
use crate::ops::install;
use crate::ops::rasterizer::{self, Rasterizer};
use crate::ops::resolve;
use crate::registry::vulkan;

pub async fn run(platform: Platform, config: Config) -> Result<()> {
    let ctx = Context::new(reqwest::Client::new(), platform);

    let version = vulkan::resolve_version(&ctx, &config.version).await?;
    info!("Setting up Vulkan SDK {version} on {}", ctx.platform);

    let sdk_root = install::sdk_install_path(&ctx.platform, &config.destination, &version);

    if config.use_cache && install::verify_sdk(&ctx.platform, &sdk_root) {
        info!("Using cached Vulkan SDK at {}", sdk_root.display());
    } else {
        install_sdk(&ctx, &config, &version).await?;
    }

    if config.install_runtime {
        install_runtime(&ctx, &config, &version).await?;
    }

    if config.stripdown {
        install::stripdown_sdk(&ctx.platform, &config.destination.join(&version));
    }

    export_environment(&sdk_root, &version)?;

    if config.install_swiftshader {
        let path = rasterizer::install(&ctx, Rasterizer::SwiftShader, &config.swiftshader_destination).await?;
        info!("SwiftShader ready at {}", path.display());
    }
    if config.install_lavapipe {
        let path = rasterizer::install(&ctx, Rasterizer::Lavapipe, &config.lavapipe_destination).await?;
        info!("Lavapipe ready at {}", path.display());
    }

    Ok(())
}

async fn install_sdk(ctx: &Context, config: &Config, version: &str) -> Result<()> {
    let resolved = resolve::resolve_sdk(ctx, version).await?;
    info!("Downloading Vulkan SDK {version}");
    info!("    URL: {}", resolved.url);

    let sdk_path = download::fetch(
        &ctx.client,
        &resolved.url,
        &crate::temp_dir(),
        &resolved.filename,
    )
    .await?;

    let result = install::install_sdk(
        ctx,
        &sdk_path,
        &config.destination,
        version,
        &config.optional_components,
    )
    .await?;

    if result.verified {
        info!("Vulkan SDK verified: {}", result.install_path.display());
    } else {
        warn!(
            "Vulkan SDK verification failed: vulkaninfo missing under {}",
            result.install_path.display()
        );
    }
    install::run_vulkaninfo(&ctx.platform, &result.install_path);

    Ok(())
}

async fn install_runtime(ctx: &Context, config: &Config, version: &str) -> Result<()> {
    if !ctx.platform.is_windows_family() {
        warn!("The Vulkan runtime is a Windows artifact; skipping on {}", ctx.platform);
        return Ok(());
    }

    let runtime_path = if resolve::runtime_bundled_with_sdk(version) {
        // The SDK installer already ran the bundled runtime installer;
        // collect its output from the system directories.
        install::install_runtime_from_sdk(&config.destination.join(version))?
    } else {
        let resolved = resolve::resolve_runtime(ctx, version).await?;
        info!("Downloading Vulkan runtime {}", resolved.version);
        info!("    URL: {}", resolved.url);
        let archive = download::fetch(
            &ctx.client,
            &resolved.url,
            &crate::temp_dir(),
            &resolved.filename,
        )
        .await?;
        install::install_runtime(ctx, &archive, &config.destination, version).await?
    };

    if install::verify_runtime(&ctx.platform, &runtime_path) {
        info!("Vulkan runtime verified: {}", runtime_path.display());
    } else {
        warn!(
            "Vulkan runtime verification failed under {}",
            runtime_path.display()
        );
    }

    Ok(())
}

/// Under GitHub Actions, append the SDK location to the env/path files so
/// later workflow steps see `VULKAN_SDK`.
fn export_environment(sdk_root: &Path, version: &str) -> std::io::Result<()> {
    if let Ok(env_file) = std::env::var("GITHUB_ENV") {
        let mut file = fs::OpenOptions::new().append(true).create(true).open(env_file)?;
        writeln!(file, "VULKAN_SDK={}", sdk_root.display())?;
        writeln!(file, "VULKAN_VERSION={version}")?;
        info!("Exported VULKAN_SDK={}", sdk_root.display());
    }
    if let Ok(path_file) = std::env::var("GITHUB_PATH") {
        let mut file = fs::OpenOptions::new().append(true).create(true).open(path_file)?;
        writeln!(file, "{}", sdk_root.join("bin").display())?;
    }
    Ok(())
}
