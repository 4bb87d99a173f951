use anyhow::{Context, Result};
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Best-effort public address discovery, only used to print where the control
/// page is reachable. Failures are logged and reported as `None`.
pub async fn discover_public_ip(url: &str) -> Option<String> {
    match fetch_public_ip(url).await {
        Ok(ip) if !ip.is_empty() => Some(ip),
        Ok(_) => {
            tracing::warn!(url, "public ip lookup returned an empty body");
            None
        }
        Err(error) => {
            tracing::warn!(url, error = %format!("{error:#}"), "public ip lookup failed");
            None
        }
    }
}

async fn fetch_public_ip(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
        .context("failed to build http client")?;
    let body = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?
        .text()
        .await
        .context("failed to read public ip response")?;
    Ok(body.trim().to_string())
}
