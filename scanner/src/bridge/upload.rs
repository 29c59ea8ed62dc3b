use anyhow::{bail, Context};
use log::info;
use reqwest::header::CONTENT_TYPE;
use sweepcore::report::IntegrationLog;
use tokio::runtime::Builder;

/// POSTs the batch as one JSON document and returns the server's reply text.
pub async fn post_batch(url: &str, log: &IntegrationLog) -> anyhow::Result<String> {
    let body = log.to_json().context("serializing integrations")?;
    let client = reqwest::Client::new();
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .with_context(|| format!("posting batch to {}", url))?;
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("upload to {} rejected with {}: {}", url, status, text);
    }
    Ok(text)
}

/// Blocking wrapper used once a run or conversion has finished.
pub fn upload_batch(url: &str, log: &IntegrationLog) -> anyhow::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for upload")?;
    let reply = runtime.block_on(post_batch(url, log))?;
    info!(
        "Uploaded {} integrations to {}, server response: {}",
        log.len(),
        url,
        reply
    );
    Ok(())
}
