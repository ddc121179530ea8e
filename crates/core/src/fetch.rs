use async_trait::async_trait;
use tracing::debug;

use crate::error::{ElisumError, Result};

/// Network access scoped to what the extractors need: GET a URL, read the body as text.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ElisumError::extraction(format!("could not fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ElisumError::extraction(format!(
                "fetching {url} returned {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ElisumError::extraction(format!("could not read body of {url}: {e}")))
    }
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for std::sync::Arc<T> {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        (**self).fetch_text(url).await
    }
}
