//! Shared HTTP plumbing for the provider clients.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tabstage_adapters::util::truncate;

const MAX_RETRIES: u32 = 2;

pub(crate) fn create_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow!("failed to create HTTP client: {}", e))
}

/// POST a JSON body and decode the JSON response, retrying rate limits and
/// server errors with linear backoff.
pub(crate) async fn post_json<Req, Resp>(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    body: &Req,
) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let mut retry_count = 0u32;
    loop {
        let send = client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
            .send()
            .await;

        let response = match send {
            Ok(response) => response,
            Err(err) => {
                if (err.is_timeout() || err.is_connect()) && retry_count < MAX_RETRIES {
                    retry_count += 1;
                    tokio::time::sleep(backoff(retry_count)).await;
                    continue;
                }
                return Err(anyhow!("provider request failed: {}", err));
            }
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| anyhow!("failed to read provider response: {}", e))?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                anyhow!(
                    "provider returned malformed response: {} ({})",
                    e,
                    truncate(&text, 120)
                )
            });
        }

        if (status.as_u16() == 429 || status.is_server_error()) && retry_count < MAX_RETRIES {
            retry_count += 1;
            tokio::time::sleep(backoff(retry_count)).await;
            continue;
        }

        return Err(anyhow!("provider error {}: {}", status, truncate(&text, 200)));
    }
}

fn backoff(retry_count: u32) -> Duration {
    Duration::from_millis(250 * u64::from(retry_count))
}
