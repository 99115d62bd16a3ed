use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::RecordStore;
use crate::config::{ScraperConfig, ENV_SERVICE_KEY};
use crate::error::{ConfigError, StoreError};

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Supabase（PostgREST）のテーブルAPI
///
/// 件数は `Prefer: return=representation` で返ってくる行数から数える。
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
}

impl SupabaseStore {
    pub fn new(config: &ScraperConfig) -> Result<Self, ConfigError> {
        let key = HeaderValue::from_str(&config.service_key).map_err(|_| ConfigError::InvalidVar {
            name: ENV_SERVICE_KEY,
            value: "<redacted>".to_string(),
        })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key)).map_err(|_| {
            ConfigError::InvalidVar {
                name: ENV_SERVICE_KEY,
                value: "<redacted>".to_string(),
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.store_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// 送信して返ってきた行数を数える
    async fn send(&self, request: RequestBuilder) -> Result<usize, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(0);
        }
        let rows: Vec<Value> =
            serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(rows.len())
    }
}

fn eq_filter(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn delete(&self, table: &str, column: &str, value: &str) -> Result<usize, StoreError> {
        debug!("DELETE {} where {} = {:?}", table, column, value);
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[(column, eq_filter(value))])
            .header("Prefer", RETURN_REPRESENTATION);
        self.send(request).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        debug!("INSERT {} rows into {}", rows.len(), table);
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&rows);
        self.send(request).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_key: &str,
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        debug!("UPSERT {} rows into {} on {}", rows.len(), table, conflict_key);
        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", MERGE_DUPLICATES)
            .json(&rows);
        self.send(request).await
    }
}
