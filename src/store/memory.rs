use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::RecordStore;
use crate::error::StoreError;

/// ストア操作の種類（呼び出し記録・失敗注入用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Delete,
    Insert,
    Upsert,
}

impl StoreOp {
    fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Delete => "delete",
            StoreOp::Insert => "insert",
            StoreOp::Upsert => "upsert",
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    calls: Vec<(StoreOp, String)>,
    failures: HashSet<(StoreOp, String)>,
    insert_cap: Option<usize>,
}

/// プロセス内のストア（テスト・ドライラン用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// tableへのop呼び出しを常に失敗させる
    pub fn fail_on(mut self, op: StoreOp, table: impl Into<String>) -> Self {
        self.state.get_mut().failures.insert((op, table.into()));
        self
    }

    /// 1回のinsertで受け付ける行数の上限（件数不一致の再現用）
    pub fn with_insert_cap(mut self, cap: usize) -> Self {
        self.state.get_mut().insert_cap = Some(cap);
        self
    }

    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        self.state
            .lock()
            .await
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// `column = value` の行
    pub async fn rows_where(&self, table: &str, column: &str, value: &str) -> Vec<Value> {
        self.rows(table)
            .await
            .into_iter()
            .filter(|row| matches_column(row, column, value))
            .collect()
    }

    /// 呼び出し履歴（失敗した呼び出しも含む）
    pub async fn calls(&self) -> Vec<(StoreOp, String)> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self, op: StoreOp, table: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|(o, t)| *o == op && t == table)
            .count()
    }
}

fn matches_column(row: &Value, column: &str, value: &str) -> bool {
    row.get(column).and_then(Value::as_str) == Some(value)
}

impl State {
    fn record_call(&mut self, op: StoreOp, table: &str) -> Result<(), StoreError> {
        self.calls.push((op, table.to_string()));
        if self.failures.contains(&(op, table.to_string())) {
            return Err(StoreError::Rejected {
                op: op.as_str(),
                table: table.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn delete(&self, table: &str, column: &str, value: &str) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        state.record_call(StoreOp::Delete, table)?;

        let rows = state.tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !matches_column(row, column, value));
        Ok(before - rows.len())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        state.record_call(StoreOp::Insert, table)?;

        let accepted = state.insert_cap.map_or(rows.len(), |cap| cap.min(rows.len()));
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.into_iter().take(accepted));
        Ok(accepted)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_key: &str,
    ) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        state.record_call(StoreOp::Upsert, table)?;

        let existing = state.tables.entry(table.to_string()).or_default();
        let count = rows.len();
        for row in rows {
            let key = row.get(conflict_key).cloned();
            match existing
                .iter_mut()
                .find(|r| key.is_some() && r.get(conflict_key) == key.as_ref())
            {
                Some(slot) => *slot = row,
                None => existing.push(row),
            }
        }
        Ok(count)
    }
}
