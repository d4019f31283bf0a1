//! The sibling-process HTTP client used by `betterhist get`: talks to
//! whichever session's frontend is published through `BETTERHIST_SERVER`.

use anyhow::Context;
use serde::Deserialize;

use crate::auth::AUTH_HEADER;
use crate::config::ClientConfig;
use crate::store::Snapshot;

#[derive(Deserialize)]
struct GetItemResponse {
    snapshot: Snapshot,
}

/// Fetch one history entry by index from the running session named
/// `list_name`, using `config`'s server URL and token.
pub async fn fetch_snapshot(config: &ClientConfig, list_name: &str, index: i64) -> anyhow::Result<Snapshot> {
    let client = reqwest::Client::new();
    let url = format!("{}/{list_name}/items/{index}", config.server_url);

    let response = client
        .get(&url)
        .header(AUTH_HEADER, &config.auth_token)
        .send()
        .await
        .with_context(|| format!("failed to reach history server at {}", config.server_url))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("history server returned {status}: {body}");
    }

    let parsed: GetItemResponse = response
        .json()
        .await
        .context("history server returned a response we couldn't parse")?;

    Ok(parsed.snapshot)
}
