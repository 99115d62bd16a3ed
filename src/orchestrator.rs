//! 全金融機関ジョブの並列実行
//!
//! ジョブごとに独立したtokioタスクで実行し、1つのジョブの失敗・パニックが
//! 他のジョブに影響しないようにする。実行ログは全ジョブ終了後に1回だけ書き込む。

use std::any::Any;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

use tokio::task::JoinError;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tracing::{error, info, warn};

use crate::config::ScraperConfig;
use crate::error::{ConfigError, FailureKind};
use crate::fetch::Fetcher;
use crate::institutions::{self, Institution};
use crate::job::InstitutionJob;
use crate::model::{InstitutionJobResult, RunSummary};
use crate::publish::Publisher;
use crate::run_log::RunLog;
use crate::service::JobService;
use crate::store::RecordStore;

type JobRunner = BoxCloneService<InstitutionJob, InstitutionJobResult, Infallible>;

pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn RecordStore>,
    rates_table: String,
    log_table: String,
    max_concurrent_jobs: Option<usize>,
}

impl Orchestrator {
    pub fn new(
        config: &ScraperConfig,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            fetcher,
            store,
            rates_table: config.rates_table.clone(),
            log_table: config.log_table.clone(),
            max_concurrent_jobs: config.max_concurrent_jobs,
        }
    }

    fn runner(&self) -> JobRunner {
        let publisher = Publisher::new(Arc::clone(&self.store), self.rates_table.clone());
        let service = JobService::new(Arc::clone(&self.fetcher), publisher);

        match self.max_concurrent_jobs {
            Some(limit) => BoxCloneService::new(
                ServiceBuilder::new()
                    .concurrency_limit(limit)
                    .service(service),
            ),
            None => BoxCloneService::new(service),
        }
    }

    /// 全ジョブを実行して実行ログを書き込む
    ///
    /// 同名の金融機関が含まれる場合はどのジョブも開始せずにエラーを返す。
    pub async fn run_all(&self, jobs: Vec<InstitutionJob>) -> Result<RunSummary, ConfigError> {
        ensure_unique(&jobs)?;

        let targets: Vec<Institution> = jobs.iter().map(|j| *j.institution()).collect();
        let mut log = RunLog::pending(&targets);

        info!(
            "Starting {} jobs (concurrency limit: {})",
            jobs.len(),
            self.max_concurrent_jobs
                .map_or_else(|| "none".to_string(), |n| n.to_string())
        );

        let runner = self.runner();
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let runner = runner.clone();
                tokio::spawn(async move { runner.oneshot(job).await })
            })
            .collect();

        let mut summary = RunSummary::default();
        for (inst, handle) in targets.iter().zip(handles) {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(never)) => match never {},
                Err(e) => panicked(inst, e),
            };

            log.complete(&result);
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.results.push(result);
        }

        summary.log_flushed = match log.flush(&self.store, &self.log_table).await {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to write run log to {}: {}", self.log_table, e);
                false
            }
        };

        info!(
            "Run finished: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}

/// 実行する金融機関を名前で選ぶ（空なら全件）
pub fn select_jobs(names: &[String]) -> Result<Vec<InstitutionJob>, ConfigError> {
    if names.is_empty() {
        return Ok(institutions::all().into_iter().map(InstitutionJob::new).collect());
    }
    names
        .iter()
        .map(|name| {
            institutions::find(name)
                .map(InstitutionJob::new)
                .ok_or_else(|| ConfigError::UnknownInstitution(name.clone()))
        })
        .collect()
}

fn ensure_unique(jobs: &[InstitutionJob]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for job in jobs {
        if !seen.insert(job.name()) {
            return Err(ConfigError::DuplicateInstitution(job.name().to_string()));
        }
    }
    Ok(())
}

fn panicked(inst: &Institution, error: JoinError) -> InstitutionJobResult {
    let message = if error.is_panic() {
        format!("job panicked: {}", panic_message(error.into_panic()))
    } else {
        format!("job was cancelled: {}", error)
    };
    warn!("FAILED {}: {}", inst.name, message);
    InstitutionJobResult::failed(inst.name, inst.category, FailureKind::Panicked, message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
