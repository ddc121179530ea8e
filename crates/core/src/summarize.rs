use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::{
    config::{ClientConfig, ConfigError},
    error::{ElisumError, Result},
    types::SummaryResponse,
};

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<SummaryResponse>;
}

/// Client for the summarization relay: one `POST {"text": ...}` per call, no retries.
#[derive(Clone, Debug)]
pub struct RelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(config.http_client()?, config.relay_url.clone()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for RelayClient {
    async fn summarize(&self, text: &str) -> Result<SummaryResponse> {
        debug!(endpoint = %self.endpoint, chars = text.chars().count(), "requesting summary");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| ElisumError::service(format!("relay request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ElisumError::service(format!(
                "relay returned {status}: {}",
                body.trim()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ElisumError::service(format!("could not read relay response: {e}")))?;

        serde_json::from_str::<SummaryResponse>(&body).map_err(|e| {
            ElisumError::malformed(format!("relay response is not a completion: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_the_configured_endpoint() {
        let config = ClientConfig {
            relay_url: "http://relay.internal:8080/summarize".into(),
            ..ClientConfig::default()
        };
        let client = RelayClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://relay.internal:8080/summarize");
    }
}
