pub mod error;
pub mod types;

pub use error::{ApiError, Result};
pub use types::{PlayerItem, PlayersPage};

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

pub struct PlayerApiClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PlayerApiClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roster-harvest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch one page of players (`GET <endpoint>?page=N`, 1-based).
    ///
    /// Fails on a non-success status, a non-JSON content type, or a body that
    /// does not decode as a `PlayersPage`.
    pub async fn fetch_page(&self, page: u32) -> Result<PlayersPage> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("page", page)])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_json_content_type(&content_type) {
            return Err(ApiError::ContentType(content_type));
        }

        let body = resp.text().await?;
        let parsed: PlayersPage = serde_json::from_str(&body)?;
        tracing::debug!(
            page,
            players = parsed.players.len(),
            has_more = ?parsed.has_more,
            "Fetched players page"
        );
        Ok(parsed)
    }
}

/// Accepts `application/json` and `+json` media types, with or without
/// parameters such as `charset`.
pub fn is_json_content_type(value: &str) -> bool {
    let media = value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    media == "application/json" || media.ends_with("+json")
}
