use thiserror::Error;

/// ドキュメント取得エラー（HTTP / ブラウザ）
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("browser init failed: {0}")]
    BrowserInit(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),
}

/// マークアップとして解析できない場合のみ発生する
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("document body is empty")]
    EmptyDocument,

    #[error("document contains no markup")]
    NotMarkup,

    #[error("invalid selector {0:?}")]
    Selector(String),
}

/// ストア（Supabase等）への操作エラー
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store rejected request with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error("store rejected {op} on {table}")]
    Rejected { op: &'static str, table: String },
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("delete of existing rows failed: {0}")]
    Delete(#[source] StoreError),

    #[error("insert of new rows failed: {0}")]
    Insert(#[source] StoreError),

    #[error("record for {found:?} cannot be published under {expected:?}")]
    ScopeViolation { expected: String, found: String },

    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 起動時の設定エラー（実行全体を中断する）
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },

    #[error("institution {0:?} is registered more than once")]
    DuplicateInstitution(String),

    #[error("unknown institution {0:?}")]
    UnknownInstitution(String),

    #[error("could not build store client: {0}")]
    Client(#[from] reqwest::Error),
}

/// 金融機関ジョブ単位のエラー
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("No data extracted")]
    NoData,

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// 失敗理由の分類（ログ・集計用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fetch,
    Extraction,
    NoData,
    Publish,
    Panicked,
}

impl ScraperError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScraperError::Fetch(_) => FailureKind::Fetch,
            ScraperError::Extraction(_) => FailureKind::Extraction,
            ScraperError::NoData => FailureKind::NoData,
            ScraperError::Publish(_) => FailureKind::Publish,
        }
    }
}
