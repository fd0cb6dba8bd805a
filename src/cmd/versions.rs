//! The `versions` command: show what the vendor currently publishes.

use anyhow::Result;

use crate::core::platform::Platform;
use crate::ops::context::Context;
use crate::registry::vulkan;

pub async fn run(platform: Platform) -> Result<()> {
    let ctx = Context::new(reqwest::Client::new(), platform);

    let latest = vulkan::fetch_latest(&ctx).await?;
    match latest.for_platform(&ctx.platform) {
        Some(version) => println!("latest: {version}"),
        None => println!("latest: unknown for platform {}", ctx.platform),
    }

    let available = vulkan::fetch_available(&ctx).await?;
    println!("available ({}):", ctx.platform.vendor_key());
    for version in &available.versions {
        println!("  {version}");
    }

    Ok(())
}
