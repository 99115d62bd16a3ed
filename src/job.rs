//! 金融機関ジョブ
//!
//! Pending → Fetching → Extracting → Publishing → {Succeeded, Failed}
//! のどこで失敗しても結果を返し、パニック以外でジョブの外にエラーを出さない。

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::ScraperError;
use crate::extract::extract_records;
use crate::fetch::Fetcher;
use crate::institutions::Institution;
use crate::model::{InstitutionJobResult, RateRecord};
use crate::publish::{Publisher, ReplaceReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Fetching,
    Extracting,
    Publishing,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Fetching => "fetching",
            JobState::Extracting => "extracting",
            JobState::Publishing => "publishing",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 1金融機関分の取得 → 抽出 → 公開
#[derive(Debug, Clone, Copy)]
pub struct InstitutionJob {
    institution: Institution,
}

impl InstitutionJob {
    pub fn new(institution: Institution) -> Self {
        Self { institution }
    }

    pub fn institution(&self) -> &Institution {
        &self.institution
    }

    pub fn name(&self) -> &'static str {
        self.institution.name
    }

    pub async fn run(&self, fetcher: &dyn Fetcher, publisher: &Publisher) -> InstitutionJobResult {
        let inst = &self.institution;
        info!("Starting {}", inst.name);

        match self.execute(fetcher, publisher).await {
            Ok((records, report)) => {
                self.transition(JobState::Publishing, JobState::Succeeded);
                info!("SUCCESS {}: {} records", inst.name, records.len());
                InstitutionJobResult::succeeded(inst.name, inst.category, records, report)
            }
            Err((state, error)) => {
                self.transition(state, JobState::Failed);
                warn!("FAILED {}: {}", inst.name, error);
                InstitutionJobResult::from_error(inst.name, inst.category, &error)
            }
        }
    }

    /// 失敗時は失敗した状態とエラーを返す
    async fn execute(
        &self,
        fetcher: &dyn Fetcher,
        publisher: &Publisher,
    ) -> Result<(Vec<RateRecord>, ReplaceReport), (JobState, ScraperError)> {
        let inst = &self.institution;

        self.transition(JobState::Pending, JobState::Fetching);
        let raw = fetcher
            .fetch(inst.target())
            .await
            .map_err(|e| (JobState::Fetching, ScraperError::from(e)))?;

        self.transition(JobState::Fetching, JobState::Extracting);
        let records =
            extract_records(inst, &raw).map_err(|e| (JobState::Extracting, ScraperError::from(e)))?;
        if records.is_empty() {
            return Err((JobState::Extracting, ScraperError::NoData));
        }
        debug!("{}: extracted {} records", inst.name, records.len());

        self.transition(JobState::Extracting, JobState::Publishing);
        let report = publisher
            .replace(inst.name, &records)
            .await
            .map_err(|e| (JobState::Publishing, ScraperError::from(e)))?;

        Ok((records, report))
    }

    fn transition(&self, from: JobState, to: JobState) {
        debug!("{}: {} -> {}", self.institution.name, from, to);
    }
}
