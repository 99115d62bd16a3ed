//! 公開ストア
//!
//! 金利テーブルと実行ログテーブルはどちらもJSON行として読み書きする。

mod memory;
mod supabase;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

pub use memory::{MemoryStore, StoreOp};
pub use supabase::SupabaseStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `column = value` の行を全て削除し、削除件数を返す
    async fn delete(&self, table: &str, column: &str, value: &str) -> Result<usize, StoreError>;

    /// 行を挿入し、ストアが受け付けた件数を返す
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<usize, StoreError>;

    /// `conflict_key` が一致する行は上書き、なければ挿入
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_key: &str,
    ) -> Result<usize, StoreError>;
}
