//! vkup - Vulkan SDK installer CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vkup::cmd;
use vkup::config::{Config, RawInputs};
use vkup::core::platform::Platform;

#[derive(Parser)]
#[command(name = "vkup")]
#[command(author, version, about = "Installs the LunarG Vulkan SDK, runtime, and software rasterizers on CI runners")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the Vulkan SDK and optional extras
    Install {
        /// SDK version to install (`1.2.3.4` or `latest`)
        // Named --sdk-version to stay clear of the VERSION variables CI
        // jobs commonly export for artifact names.
        #[arg(long = "sdk-version", env = "VKUP_SDK_VERSION")]
        version: Option<String>,

        /// Installation destination (platform default when omitted)
        #[arg(long)]
        destination: Option<PathBuf>,

        /// Also install the Vulkan runtime components (Windows only)
        #[arg(long)]
        install_runtime: bool,

        /// Reuse an existing verified install at the destination
        #[arg(long)]
        cache: bool,

        /// Comma-separated optional installer components
        /// (e.g. com.lunarg.vulkan.vma,com.lunarg.vulkan.volk)
        #[arg(long)]
        optional_components: Option<String>,

        /// Delete superfluous SDK folders after install (Windows only)
        #[arg(long)]
        stripdown: bool,

        /// Install the SwiftShader software rasterizer
        #[arg(long)]
        install_swiftshader: bool,

        /// SwiftShader destination (platform default when omitted)
        #[arg(long)]
        swiftshader_destination: Option<PathBuf>,

        /// Install the lavapipe software rasterizer
        #[arg(long)]
        install_lavapipe: bool,

        /// Lavapipe destination (platform default when omitted)
        #[arg(long)]
        lavapipe_destination: Option<PathBuf>,
    },
    /// List the latest and all available SDK versions for this platform
    Versions,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        // Flatten whatever failed into one user-visible message; nothing
        // propagates past this boundary.
        tracing::error!("{error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let platform = Platform::current();

    match cli.command {
        Commands::Install {
            version,
            destination,
            install_runtime,
            cache,
            optional_components,
            stripdown,
            install_swiftshader,
            swiftshader_destination,
            install_lavapipe,
            lavapipe_destination,
        } => {
            let config = Config::resolve(
                &platform,
                RawInputs {
                    version,
                    destination,
                    install_runtime,
                    use_cache: cache,
                    optional_components,
                    stripdown,
                    install_swiftshader,
                    swiftshader_destination,
                    install_lavapipe,
                    lavapipe_destination,
                },
            )?;
            cmd::install::run(platform, config).await
        }
        Commands::Versions => cmd::versions::run(platform).await,
    }
}
