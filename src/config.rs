use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_STORE_URL: &str = "SUPABASE_URL";
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";

const DEFAULT_RATES_TABLE: &str = "public-rates";
const DEFAULT_LOG_TABLE: &str = "scraper_logs";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// SupabaseプロジェクトURL
    pub store_url: String,
    /// サービスキー
    pub service_key: String,
    pub rates_table: String,
    pub log_table: String,
    pub headless: bool,
    /// デバッグモード（ブラウザ待機失敗時にスクリーンショットを出力）
    pub debug: bool,
    pub http_timeout: Duration,
    /// ブラウザのナビゲーション・CDPリクエストのタイムアウト
    pub browser_timeout: Duration,
    pub chrome_path: Option<PathBuf>,
    /// 同時実行ジョブ数の上限（None = 無制限）
    pub max_concurrent_jobs: Option<usize>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            service_key: String::new(),
            rates_table: DEFAULT_RATES_TABLE.to_string(),
            log_table: DEFAULT_LOG_TABLE.to_string(),
            headless: true,
            debug: false,
            http_timeout: Duration::from_secs(20),
            browser_timeout: Duration::from_secs(60),
            chrome_path: None,
            max_concurrent_jobs: None,
        }
    }
}

impl ScraperConfig {
    pub fn new(store_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            service_key: service_key.into(),
            ..Default::default()
        }
    }

    /// プロセス環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる
    ///
    /// 認証情報（URL・サービスキー）が無い場合は起動不可のエラーとする。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let mut config = Self::new(required(ENV_STORE_URL)?, required(ENV_SERVICE_KEY)?);

        if let Some(value) = lookup("SCRAPER_HEADLESS") {
            config.headless = parse_bool("SCRAPER_HEADLESS", &value)?;
        }
        if let Some(value) = lookup("SCRAPER_DEBUG") {
            config.debug = parse_bool("SCRAPER_DEBUG", &value)?;
        }
        if let Some(value) = lookup("SCRAPER_HTTP_TIMEOUT_SECS") {
            config.http_timeout =
                Duration::from_secs(parse_number("SCRAPER_HTTP_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("SCRAPER_BROWSER_TIMEOUT_SECS") {
            config.browser_timeout =
                Duration::from_secs(parse_number("SCRAPER_BROWSER_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("SCRAPER_MAX_CONCURRENCY") {
            let limit = parse_number("SCRAPER_MAX_CONCURRENCY", &value)?;
            if limit == 0 {
                return Err(ConfigError::InvalidVar {
                    name: "SCRAPER_MAX_CONCURRENCY",
                    value,
                });
            }
            config.max_concurrent_jobs = Some(limit as usize);
        }
        if let Some(table) = lookup("SCRAPER_RATES_TABLE").filter(|t| !t.is_empty()) {
            config.rates_table = table;
        }
        if let Some(table) = lookup("SCRAPER_LOG_TABLE").filter(|t| !t.is_empty()) {
            config.log_table = table;
        }
        config.chrome_path = lookup("CHROME_PATH")
            .or_else(|| lookup("CHROMIUM_PATH"))
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_browser_timeout(mut self, timeout: Duration) -> Self {
        self.browser_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_jobs(mut self, limit: usize) -> Self {
        self.max_concurrent_jobs = Some(limit);
        self
    }

    pub fn with_tables(mut self, rates: impl Into<String>, log: impl Into<String>) -> Self {
        self.rates_table = rates.into();
        self.log_table = log.into();
        self
    }
}

/// .envファイルを読み込んでプロセス環境変数に設定する
///
/// ファイルが無ければ何もしない。設定した変数の数を返す。
pub fn load_env_file(path: impl AsRef<Path>) -> std::io::Result<usize> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(0);
    }
    let mut count = 0;
    for line in std::fs::read_to_string(path)?.lines() {
        if let Some((key, value)) = parse_env_line(line) {
            std::env::set_var(key, value);
            count += 1;
        }
    }
    Ok(count)
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim().trim_matches('\'').trim_matches('"');
    if key.starts_with('#') || key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: value.to_string(),
    })
}
