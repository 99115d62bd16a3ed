//! 金利レコード・実行ログの型定義

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, ScraperError};
use crate::publish::ReplaceReport;

/// 金融機関の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstitutionCategory {
    #[serde(rename = "Bank")]
    Bank,
    #[serde(rename = "Finance Company")]
    FinanceCompany,
}

impl InstitutionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionCategory::Bank => "Bank",
            InstitutionCategory::FinanceCompany => "Finance Company",
        }
    }
}

impl fmt::Display for InstitutionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 利息の支払いタイミング
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PayoutSchedule {
    #[serde(rename = "Monthly")]
    Monthly,
    #[serde(rename = "Annually")]
    Annually,
    #[serde(rename = "At Maturity")]
    AtMaturity,
}

impl PayoutSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutSchedule::Monthly => "Monthly",
            PayoutSchedule::Annually => "Annually",
            PayoutSchedule::AtMaturity => "At Maturity",
        }
    }

    /// 見出しテキストから支払いタイミングを判定する
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_ascii_lowercase();
        if label.contains("month") {
            Some(PayoutSchedule::Monthly)
        } else if label.contains("annual") || label.contains("year") {
            Some(PayoutSchedule::Annually)
        } else if label.contains("maturity") {
            Some(PayoutSchedule::AtMaturity)
        } else {
            None
        }
    }
}

impl fmt::Display for PayoutSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 1件の金利（金融機関, 商品, 期間, 支払いタイミング）
///
/// シリアライズ結果はそのまま金利テーブルの1行になる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    #[serde(rename = "bankName")]
    pub institution_name: String,
    #[serde(rename = "institutionType")]
    pub institution_category: InstitutionCategory,
    #[serde(rename = "fdType")]
    pub product_variant: String,
    #[serde(rename = "termMonths")]
    pub term_months: u32,
    #[serde(rename = "payoutSchedule")]
    pub payout_schedule: PayoutSchedule,
    #[serde(rename = "interestRate")]
    pub nominal_rate: f64,
    #[serde(rename = "aer")]
    pub effective_rate: Option<f64>,
}

impl RateRecord {
    /// 公開ストア上で一意になるキー
    pub fn key(&self) -> (&str, u32, PayoutSchedule, &str) {
        (
            &self.institution_name,
            self.term_months,
            self.payout_schedule,
            &self.product_variant,
        )
    }
}

/// 実行ログのステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Success,
    Failed,
}

/// ダッシュボードが読む金融機関ごとの実行ログ行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLogEntry {
    pub name: String,
    pub institution_type: InstitutionCategory,
    pub status: RunStatus,
    pub records_updated: usize,
    pub error_message: String,
    pub last_run: Option<DateTime<Utc>>,
}

pub const NO_ERROR_MESSAGE: &str = "N/A";

impl RunLogEntry {
    pub fn pending(name: impl Into<String>, institution_type: InstitutionCategory) -> Self {
        Self {
            name: name.into(),
            institution_type,
            status: RunStatus::Pending,
            records_updated: 0,
            error_message: NO_ERROR_MESSAGE.to_string(),
            last_run: None,
        }
    }
}

/// ジョブの終了結果
#[derive(Debug)]
pub enum JobOutcome {
    Success {
        records: Vec<RateRecord>,
        report: ReplaceReport,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

/// 1回の実行における金融機関ごとの結果
#[derive(Debug)]
pub struct InstitutionJobResult {
    pub institution_name: String,
    pub category: InstitutionCategory,
    pub outcome: JobOutcome,
    pub record_count: usize,
}

impl InstitutionJobResult {
    pub fn succeeded(
        institution_name: impl Into<String>,
        category: InstitutionCategory,
        records: Vec<RateRecord>,
        report: ReplaceReport,
    ) -> Self {
        Self {
            institution_name: institution_name.into(),
            category,
            record_count: records.len(),
            outcome: JobOutcome::Success { records, report },
        }
    }

    pub fn failed(
        institution_name: impl Into<String>,
        category: InstitutionCategory,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            institution_name: institution_name.into(),
            category,
            record_count: 0,
            outcome: JobOutcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn from_error(
        institution_name: impl Into<String>,
        category: InstitutionCategory,
        error: &ScraperError,
    ) -> Self {
        Self::failed(institution_name, category, error.kind(), error.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            JobOutcome::Failure { kind, .. } => Some(*kind),
            JobOutcome::Success { .. } => None,
        }
    }
}

/// 実行全体のサマリー（オペレーター向け表示専用）
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<InstitutionJobResult>,
    pub log_flushed: bool,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
