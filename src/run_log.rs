//! 実行ログ
//!
//! 実行開始時に全金融機関分をPendingで用意し、各ジョブの結果で1回だけ確定させ、
//! 全ジョブ終了後に一括upsertする。

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::institutions::Institution;
use crate::model::{InstitutionJobResult, JobOutcome, RunLogEntry, RunStatus};
use crate::store::RecordStore;

/// ログテーブルの一意キー
pub const LOG_CONFLICT_KEY: &str = "name";

#[derive(Debug, Clone)]
pub struct RunLog {
    entries: Vec<RunLogEntry>,
}

impl RunLog {
    pub fn pending(institutions: &[Institution]) -> Self {
        Self {
            entries: institutions
                .iter()
                .map(|inst| RunLogEntry::pending(inst.name, inst.category))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[RunLogEntry] {
        &self.entries
    }

    /// 同名のエントリを結果で確定する（確定済みなら何もしない）
    pub fn complete(&mut self, result: &InstitutionJobResult) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.name == result.institution_name)
        else {
            return false;
        };
        if entry.status != RunStatus::Pending {
            debug!("Log entry for {} already completed", entry.name);
            return false;
        }

        match &result.outcome {
            JobOutcome::Success { .. } => {
                entry.status = RunStatus::Success;
                entry.records_updated = result.record_count;
            }
            JobOutcome::Failure { message, .. } => {
                entry.status = RunStatus::Failed;
                entry.records_updated = 0;
                entry.error_message = message.clone();
            }
        }
        true
    }

    /// lastRunを刻印して一括upsertする
    pub async fn flush(
        &mut self,
        store: &Arc<dyn RecordStore>,
        table: &str,
    ) -> Result<usize, StoreError> {
        let now = Utc::now();
        for entry in &mut self.entries {
            entry.last_run = Some(now);
        }

        let rows = self
            .entries
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let written = store.upsert(table, rows, LOG_CONFLICT_KEY).await?;
        info!("Run log written: {} entries to {}", written, table);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::institutions::find;
    use crate::model::InstitutionCategory;
    use crate::publish::ReplaceReport;
    use crate::store::MemoryStore;

    fn log() -> RunLog {
        RunLog::pending(&[find("Alliance Finance").unwrap(), find("DFCC Bank").unwrap()])
    }

    #[test]
    fn test_complete_once() {
        let mut log = log();
        let failed = InstitutionJobResult::failed(
            "DFCC Bank",
            InstitutionCategory::Bank,
            FailureKind::Fetch,
            "https://www.dfcc.lk responded with HTTP 503",
        );

        assert!(log.complete(&failed));
        let ok = InstitutionJobResult::succeeded(
            "DFCC Bank",
            InstitutionCategory::Bank,
            Vec::new(),
            ReplaceReport {
                deleted: 0,
                attempted: 0,
                inserted: 0,
            },
        );
        assert!(!log.complete(&ok));

        let entry = &log.entries()[1];
        assert_eq!(entry.status, RunStatus::Failed);
        assert_eq!(entry.records_updated, 0);
        assert_eq!(entry.error_message, "https://www.dfcc.lk responded with HTTP 503");
        assert_eq!(log.entries()[0].status, RunStatus::Pending);
    }

    #[tokio::test]
    async fn test_flush_stamps_last_run() {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn RecordStore> = memory.clone();
        let mut log = log();

        let written = log.flush(&store, "scraper_logs").await.unwrap();

        assert_eq!(written, 2);
        let rows = memory.rows("scraper_logs").await;
        assert_eq!(rows[0]["name"], "Alliance Finance");
        assert_eq!(rows[0]["institutionType"], "Finance Company");
        assert_eq!(rows[0]["status"], "Pending");
        assert!(rows.iter().all(|r| r["lastRun"].is_string()));
    }
}
