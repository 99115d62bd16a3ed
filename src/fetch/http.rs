use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use super::RawDocument;
use crate::error::FetchError;

/// 一般的なデスクトップブラウザとして名乗る
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// GETして本文を返す。2xx以外はエラー
    pub async fn get(&self, url: &str) -> Result<RawDocument, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        info!("Fetched {} ({} bytes)", url, body.len());
        Ok(RawDocument::new(url, body))
    }
}
