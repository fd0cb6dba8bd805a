//! Lightweight HTTP helpers: availability probing and JSON fetches.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::USER_AGENT;
use crate::ops::error::SetupError;

/// Check whether `url` answers a HEAD request with HTTP 200.
///
/// Exactly 200 counts as downloadable. Any other status, and any
/// transport failure, is an error carrying the artifact label, version,
/// and URL for diagnostics. No retries happen here; retry policy belongs
/// to the caller.
pub async fn is_downloadable(
    client: &Client,
    label: &'static str,
    version: &str,
    url: &str,
) -> Result<(), SetupError> {
    let result = client
        .head(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await;

    match result {
        Ok(response) if response.status().as_u16() == 200 => {
            info!("Http(200): the requested {label} {version} is downloadable");
            Ok(())
        }
        Ok(response) => {
            debug!(status = %response.status(), url, "availability probe rejected");
            Err(SetupError::NotDownloadable {
                label,
                version: version.to_string(),
                url: url.to_string(),
            })
        }
        Err(err) => {
            debug!(error = %err, url, "availability probe failed");
            Err(SetupError::NotDownloadable {
                label,
                version: version.to_string(),
                url: url.to_string(),
            })
        }
    }
}

/// GET `url` and deserialize the JSON body.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, reqwest::Error> {
    client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await
}
