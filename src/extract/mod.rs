//! 金利表の抽出
//!
//! サイトごとの抽出関数が共通で使うパーサーと表ナビゲーション。

pub mod parse;
pub mod table;

pub use parse::{leading_integer, parse_rate, parse_rate_and_aer, parse_term_months};
pub use table::{ColumnLayout, Document, PayoutColumn};

use std::collections::HashSet;

use crate::error::ExtractionError;
use crate::fetch::RawDocument;
use crate::institutions::Institution;
use crate::model::RateRecord;

/// ドキュメントを解析して金融機関の抽出関数を適用する
///
/// 結果は公開キー（期間・支払いタイミング・商品）で重複除去し、
/// 期間順に並べる。
pub fn extract_records(
    institution: &Institution,
    raw: &RawDocument,
) -> Result<Vec<RateRecord>, ExtractionError> {
    let document = Document::parse(raw)?;
    let records = (institution.extract)(&document, institution)?;
    Ok(normalize(records))
}

fn normalize(records: Vec<RateRecord>) -> Vec<RateRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<RateRecord> = records
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.institution_name.clone(),
                r.term_months,
                r.payout_schedule,
                r.product_variant.clone(),
            ))
        })
        .collect();

    unique.sort_by(|a, b| {
        (a.term_months, a.payout_schedule, &a.product_variant).cmp(&(
            b.term_months,
            b.payout_schedule,
            &b.product_variant,
        ))
    });
    unique
}
