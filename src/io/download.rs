//! Streaming artifact downloads.
//!
//! Downloads go to a `.part` file first and are renamed on completion, so
//! an interrupted run never leaves a truncated archive under the final
//! name.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::USER_AGENT;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download `url` into `dest_dir/filename`, streaming the body to disk.
pub async fn fetch(
    client: &Client,
    url: &str,
    dest_dir: &Path,
    filename: &str,
) -> Result<PathBuf, DownloadError> {
    tokio::fs::create_dir_all(dest_dir).await?;
    let dest = dest_dir.join(filename);
    let part = dest_dir.join(format!("{filename}.part"));

    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let total = response.content_length().unwrap_or(0);
    debug!(url, total, "starting download");

    let mut file = File::create(&part).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await?;
    tokio::fs::rename(&part, &dest).await?;

    info!(
        "Download completed: {} ({})",
        dest.display(),
        format_size(downloaded)
    );
    Ok(dest)
}

/// Format bytes as human readable
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
