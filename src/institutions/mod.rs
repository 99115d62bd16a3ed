//! 金融機関レジストリ
//!
//! 金融機関ごとの取得方式と抽出関数を静的に登録する。
//! サイトのマークアップが変わったらここの抽出関数だけを直す。

mod banks;
mod finance;

use crate::error::ExtractionError;
use crate::extract::Document;
use crate::fetch::{FetchMode, FetchTarget};
use crate::model::{InstitutionCategory, PayoutSchedule, RateRecord};

/// パース済みドキュメントからレコードを取り出す関数
pub type Extractor = fn(&Document, &Institution) -> Result<Vec<RateRecord>, ExtractionError>;

/// 1つの金融機関の設定
#[derive(Debug, Clone, Copy)]
pub struct Institution {
    pub name: &'static str,
    pub category: InstitutionCategory,
    pub url: &'static str,
    pub fetch: FetchMode,
    pub extract: Extractor,
}

impl Institution {
    pub fn target(&self) -> FetchTarget<'static> {
        FetchTarget {
            url: self.url,
            mode: self.fetch,
        }
    }

    pub fn record(
        &self,
        variant: &str,
        term_months: u32,
        payout: PayoutSchedule,
        rate: f64,
        aer: Option<f64>,
    ) -> RateRecord {
        RateRecord {
            institution_name: self.name.to_string(),
            institution_category: self.category,
            product_variant: variant.to_string(),
            term_months,
            payout_schedule: payout,
            nominal_rate: rate,
            effective_rate: aer,
        }
    }
}

/// 登録済みの全金融機関（銀行 → ノンバンクの順）
pub fn all() -> Vec<Institution> {
    banks::INSTITUTIONS
        .iter()
        .chain(finance::INSTITUTIONS)
        .copied()
        .collect()
}

/// 名前で検索（大文字小文字は区別しない）
pub fn find(name: &str) -> Option<Institution> {
    all()
        .into_iter()
        .find(|inst| inst.name.eq_ignore_ascii_case(name.trim()))
}
