//! ドキュメント取得
//!
//! 金融機関ごとに静的に宣言された取得方式（HTTP / ブラウザ）でページを取得する。

mod browser;
mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::{ConfigError, FetchError};

pub use browser::BrowserFetcher;
pub use http::{HttpFetcher, DESKTOP_USER_AGENT};

/// 取得方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// 単発のHTTP GET
    Http,
    /// ブラウザで描画後のマークアップを取得（操作手順付き）
    Browser(&'static [BrowserStep]),
}

/// ブラウザ取得時に順番に実行する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserStep {
    /// 要素が表示されるまで待機（textを指定した場合は含むテキストでも絞り込む）
    WaitVisible {
        selector: &'static str,
        text: Option<&'static str>,
        timeout: Duration,
    },
    /// 要素の表示を待ってからクリック
    Click {
        selector: &'static str,
        text: Option<&'static str>,
    },
    /// 固定時間待機
    Pause(Duration),
}

/// 取得対象
#[derive(Debug, Clone, Copy)]
pub struct FetchTarget<'a> {
    pub url: &'a str,
    pub mode: FetchMode,
}

/// 取得したドキュメント
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub body: String,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 1回だけ取得する（リトライなし）
    async fn fetch(&self, target: FetchTarget<'_>) -> Result<RawDocument, FetchError>;
}

/// 取得方式に応じてHTTP / ブラウザに振り分ける
pub struct SiteFetcher {
    http: HttpFetcher,
    browser: BrowserFetcher,
}

impl SiteFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: HttpFetcher::new(config.http_timeout)?,
            browser: BrowserFetcher::new(config),
        })
    }
}

#[async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(&self, target: FetchTarget<'_>) -> Result<RawDocument, FetchError> {
        match target.mode {
            FetchMode::Http => self.http.get(target.url).await,
            FetchMode::Browser(steps) => self.browser.render(target.url, steps).await,
        }
    }
}
