//! 金融機関単位の置き換え公開
//!
//! 対象金融機関の行を削除してから新しい行を挿入する。
//! 削除と挿入の間は原子的ではなく、挿入に失敗するとその金融機関は空になる。

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::model::RateRecord;
use crate::store::RecordStore;

/// 金利テーブルで金融機関を識別する列
pub const INSTITUTION_COLUMN: &str = "bankName";

/// 1回の置き換え結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceReport {
    pub deleted: usize,
    pub attempted: usize,
    pub inserted: usize,
}

impl ReplaceReport {
    /// 送った件数と受け付けられた件数が一致するか
    pub fn is_consistent(&self) -> bool {
        self.attempted == self.inserted
    }
}

#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl Publisher {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// institution_nameの公開行をrecordsで置き換える
    ///
    /// 他の金融機関のレコードが混ざっていればストアに触れずに失敗する。
    pub async fn replace(
        &self,
        institution_name: &str,
        records: &[RateRecord],
    ) -> Result<ReplaceReport, PublishError> {
        if let Some(stray) = records
            .iter()
            .find(|r| r.institution_name != institution_name)
        {
            return Err(PublishError::ScopeViolation {
                expected: institution_name.to_string(),
                found: stray.institution_name.clone(),
            });
        }

        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;

        let deleted = self
            .store
            .delete(&self.table, INSTITUTION_COLUMN, institution_name)
            .await
            .map_err(PublishError::Delete)?;
        debug!("Deleted {} old rows for {}", deleted, institution_name);

        let attempted = rows.len();
        let inserted = self
            .store
            .insert(&self.table, rows)
            .await
            .map_err(PublishError::Insert)?;

        let report = ReplaceReport {
            deleted,
            attempted,
            inserted,
        };

        if report.is_consistent() {
            info!("Published {} rows for {}", inserted, institution_name);
        } else {
            warn!(
                "Insert count mismatch for {}: attempted {}, store accepted {}",
                institution_name, attempted, inserted
            );
        }

        Ok(report)
    }
}
