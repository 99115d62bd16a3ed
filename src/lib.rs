//! 定期預金金利スクレイパーライブラリ
//!
//! - スリランカの銀行・ノンバンク各社の定期預金（FD）金利表を取得
//! - 共通スキーマ（期間・支払いタイミング・金利・AER）に正規化
//! - 金融機関単位で公開ストア（Supabase）のデータを置き換え、実行ログを書き込む
//!
//! # 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fd_rates_scraper::{select_jobs, Orchestrator, ScraperConfig, SiteFetcher, SupabaseStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScraperConfig::from_env()?;
//!     let fetcher = Arc::new(SiteFetcher::new(&config)?);
//!     let store = Arc::new(SupabaseStore::new(&config)?);
//!
//!     let orchestrator = Orchestrator::new(&config, fetcher, store);
//!     let summary = orchestrator.run_all(select_jobs(&[])?).await?;
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```
//!
//! # 1金融機関だけ抽出（公開なし）
//!
//! ```rust,ignore
//! use fd_rates_scraper::{extract_records, institutions, Fetcher, ScraperConfig, SiteFetcher};
//!
//! let inst = institutions::find("Alliance Finance").unwrap();
//! let fetcher = SiteFetcher::new(&ScraperConfig::default())?;
//! let raw = fetcher.fetch(inst.target()).await?;
//! for record in extract_records(&inst, &raw)? {
//!     println!("{:?}", record);
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod institutions;
pub mod job;
pub mod model;
pub mod orchestrator;
pub mod publish;
pub mod run_log;
pub mod service;
pub mod store;

// 主要な型をリエクスポート
pub use config::ScraperConfig;
pub use error::{
    ConfigError, ExtractionError, FailureKind, FetchError, PublishError, ScraperError, StoreError,
};
pub use extract::extract_records;
pub use fetch::{Fetcher, FetchMode, FetchTarget, RawDocument, SiteFetcher};
pub use institutions::Institution;
pub use job::{InstitutionJob, JobState};
pub use model::{
    InstitutionCategory, InstitutionJobResult, JobOutcome, PayoutSchedule, RateRecord,
    RunLogEntry, RunStatus, RunSummary,
};
pub use orchestrator::{select_jobs, Orchestrator};
pub use publish::{Publisher, ReplaceReport};
pub use run_log::RunLog;
pub use service::JobService;
pub use store::{MemoryStore, RecordStore, SupabaseStore};
