//! 金利表の共通ナビゲーションと列レイアウト

use scraper::{ElementRef, Html, Selector};

use super::parse::{normalize_whitespace, parse_rate, parse_term_months};
use crate::error::ExtractionError;
use crate::fetch::RawDocument;
use crate::institutions::Institution;
use crate::model::{PayoutSchedule, RateRecord};

pub fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string()))
}

/// 要素の表示テキスト（空白正規化済み）
///
/// テキストノードは空白で区切る（`12.50<br>13.10` -> `12.50 13.10`）。
pub fn text_of(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// 解析済みドキュメント
pub struct Document {
    html: Html,
}

impl Document {
    /// マークアップとして解析する。空・タグを含まない本文はエラー
    pub fn parse(raw: &RawDocument) -> Result<Self, ExtractionError> {
        Self::parse_str(&raw.body)
    }

    pub fn parse_str(body: &str) -> Result<Self, ExtractionError> {
        if body.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        if !body.contains('<') {
            return Err(ExtractionError::NotMarkup);
        }
        Ok(Self {
            html: Html::parse_document(body),
        })
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, ExtractionError> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).collect())
    }

    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>, ExtractionError> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).next())
    }

    /// cssに一致し、テキストにneedleを含む最初の要素（大文字小文字無視）
    pub fn find_with_text(
        &self,
        css: &str,
        needle: &str,
    ) -> Result<Option<ElementRef<'_>>, ExtractionError> {
        let needle = needle.to_lowercase();
        Ok(self
            .select(css)?
            .into_iter()
            .find(|el| text_of(*el).to_lowercase().contains(&needle)))
    }

    /// cssに一致し、テキストが完全一致する最初の要素（大文字小文字無視）
    pub fn find_exact(
        &self,
        css: &str,
        text: &str,
    ) -> Result<Option<ElementRef<'_>>, ExtractionError> {
        Ok(self
            .select(css)?
            .into_iter()
            .find(|el| text_of(*el).eq_ignore_ascii_case(text)))
    }

    /// 文書順でanchorより後にある最初のcss一致要素
    pub fn next_after<'a>(
        &'a self,
        anchor: ElementRef<'a>,
        css: &str,
    ) -> Result<Option<ElementRef<'a>>, ExtractionError> {
        let selector = selector(css)?;
        Ok(self
            .html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .skip_while(|el| *el != anchor)
            .skip(1)
            .find(|el| selector.matches(el)))
    }

    /// 見出しの後にある最初の表
    pub fn table_after_heading(
        &self,
        heading_css: &str,
        needle: &str,
    ) -> Result<Option<ElementRef<'_>>, ExtractionError> {
        match self.find_with_text(heading_css, needle)? {
            Some(heading) => self.next_after(heading, "table"),
            None => Ok(None),
        }
    }
}

/// 後続の兄弟要素でcssに一致する最初のもの
pub fn next_sibling_matching<'a>(
    element: ElementRef<'a>,
    css: &str,
) -> Result<Option<ElementRef<'a>>, ExtractionError> {
    let selector = selector(css)?;
    Ok(element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| selector.matches(el)))
}

/// 自身を含まない最も近い祖先でcssに一致するもの
pub fn closest<'a>(
    element: ElementRef<'a>,
    css: &str,
) -> Result<Option<ElementRef<'a>>, ExtractionError> {
    let selector = selector(css)?;
    Ok(element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| selector.matches(el)))
}

/// 要素内のcss一致要素（子孫）
pub fn select_in<'a>(
    element: ElementRef<'a>,
    css: &str,
) -> Result<Vec<ElementRef<'a>>, ExtractionError> {
    let selector = selector(css)?;
    Ok(element.select(&selector).collect())
}

/// tbody直下の行
pub fn body_rows(table: ElementRef<'_>) -> Result<Vec<ElementRef<'_>>, ExtractionError> {
    select_in(table, "tbody > tr")
}

/// 行のセルテキスト（tdのみ、またはth/td両方）
pub fn row_cells(row: ElementRef<'_>, include_th: bool) -> Result<Vec<String>, ExtractionError> {
    let css = if include_th { "th, td" } else { "td" };
    let selector = selector(css)?;
    Ok(row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| selector.matches(cell))
        .map(text_of)
        .collect())
}

/// 1つの支払いタイミング列（金利列とAER列）
#[derive(Debug, Clone, Copy)]
pub struct PayoutColumn {
    pub payout: PayoutSchedule,
    pub rate: usize,
    pub aer: Option<usize>,
}

impl PayoutColumn {
    pub const fn new(payout: PayoutSchedule, rate: usize, aer: Option<usize>) -> Self {
        Self { payout, rate, aer }
    }
}

/// 期間列 + 支払いタイミングごとの金利列からなる表の形
///
/// セル数が一致しない行・期間を解釈できない行はスキップする。
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    pub cells: usize,
    pub term: usize,
    pub term_parser: fn(&str) -> Option<u32>,
    pub columns: &'static [PayoutColumn],
}

impl ColumnLayout {
    pub const fn new(cells: usize, columns: &'static [PayoutColumn]) -> Self {
        Self {
            cells,
            term: 0,
            term_parser: parse_term_months,
            columns,
        }
    }

    pub const fn with_term_parser(mut self, parser: fn(&str) -> Option<u32>) -> Self {
        self.term_parser = parser;
        self
    }

    /// 1行分のセルからレコードを作る（0〜列数件）
    pub fn row_records(
        &self,
        institution: &Institution,
        variant: &str,
        cells: &[String],
    ) -> Vec<RateRecord> {
        if cells.len() != self.cells {
            return Vec::new();
        }
        let Some(term_months) = (self.term_parser)(&cells[self.term]) else {
            return Vec::new();
        };

        self.columns
            .iter()
            .filter_map(|column| {
                let rate = parse_rate(&cells[column.rate])?;
                let aer = column.aer.and_then(|i| parse_rate(&cells[i]));
                Some(institution.record(variant, term_months, column.payout, rate, aer))
            })
            .collect()
    }

    /// 表全体（tbodyの行、先頭skip行を除く）
    pub fn table_records(
        &self,
        institution: &Institution,
        variant: &str,
        table: ElementRef<'_>,
        skip: usize,
        include_th: bool,
    ) -> Result<Vec<RateRecord>, ExtractionError> {
        let mut records = Vec::new();
        for row in body_rows(table)?.into_iter().skip(skip) {
            let cells = row_cells(row, include_th)?;
            records.extend(self.row_records(institution, variant, &cells));
        }
        Ok(records)
    }
}

/// 期間 | 毎月 | AER | 満期 | AER
pub const MONTHLY_AER_MATURITY_AER: ColumnLayout = ColumnLayout::new(
    5,
    &[
        PayoutColumn::new(PayoutSchedule::Monthly, 1, Some(2)),
        PayoutColumn::new(PayoutSchedule::AtMaturity, 3, Some(4)),
    ],
);

/// 期間 | 満期 | AER | 毎月 | AER
pub const MATURITY_AER_MONTHLY_AER: ColumnLayout = ColumnLayout::new(
    5,
    &[
        PayoutColumn::new(PayoutSchedule::AtMaturity, 1, Some(2)),
        PayoutColumn::new(PayoutSchedule::Monthly, 3, Some(4)),
    ],
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchMode;
    use crate::model::InstitutionCategory;
    use pretty_assertions::assert_eq;

    fn no_records(_: &Document, _: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
        Ok(Vec::new())
    }

    const SAMPLE: Institution = Institution {
        name: "Sample Finance",
        category: InstitutionCategory::FinanceCompany,
        url: "https://sample.lk/fd",
        fetch: FetchMode::Http,
        extract: no_records,
    };

    #[test]
    fn test_two_row_document_yields_one_record_per_row() {
        let doc = Document::parse_str(
            r#"<html><body>
            <table id="rates">
              <thead><tr><th>Term</th><th>Monthly</th><th>AER</th><th>Maturity</th><th>AER</th></tr></thead>
              <tbody>
                <tr><td>12 Months</td><td>13.5%</td><td>13.9%</td><td>-</td><td>-</td></tr>
                <tr><td>6 Months</td><td>-</td><td>-</td><td>12.0%</td><td>-</td></tr>
              </tbody>
            </table>
            </body></html>"#,
        )
        .unwrap();

        let table = doc.first("table#rates").unwrap().unwrap();
        let records = MONTHLY_AER_MATURITY_AER
            .table_records(&SAMPLE, "Standard", table, 0, false)
            .unwrap();

        assert_eq!(
            records,
            vec![
                SAMPLE.record("Standard", 12, PayoutSchedule::Monthly, 13.5, Some(13.9)),
                SAMPLE.record("Standard", 6, PayoutSchedule::AtMaturity, 12.0, None),
            ]
        );
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let layout = MONTHLY_AER_MATURITY_AER;
        let short = vec!["12 Months".to_string(), "13%".to_string()];
        assert!(layout.row_records(&SAMPLE, "Standard", &short).is_empty());

        let no_term: Vec<String> = ["Period", "13%", "-", "12%", "-"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(layout.row_records(&SAMPLE, "Standard", &no_term).is_empty());

        let all_three: Vec<String> = ["2 Years", "10%", "10.4%", "11%", "11%"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(layout.row_records(&SAMPLE, "Standard", &all_three).len(), 2);
    }

    #[test]
    fn test_table_after_heading_walks_document_order() {
        let doc = Document::parse_str(
            r#"<div><p>Fixed Deposits (LKR)</p><div class="wrap"><table id="a"></table></div></div>
               <h3>Senior Citizen Fixed Deposits</h3><table id="b"></table>"#,
        )
        .unwrap();

        let a = doc.table_after_heading("p", "fixed deposits (lkr)").unwrap().unwrap();
        assert_eq!(a.value().attr("id"), Some("a"));

        let b = doc.table_after_heading("h3", "Senior Citizen").unwrap().unwrap();
        assert_eq!(b.value().attr("id"), Some("b"));

        assert!(doc.table_after_heading("h2", "Missing").unwrap().is_none());
    }

    #[test]
    fn test_text_and_ancestor_helpers() {
        let doc = Document::parse_str(
            r#"<div class="card"><h2>Interest Rates – Senior Citizens</h2><h2>Interest Rates</h2>
               <table><tbody><tr><td>12.50<br>13.10</td></tr></tbody></table></div>"#,
        )
        .unwrap();

        let exact = doc.find_exact("h2", "interest rates").unwrap().unwrap();
        assert_eq!(text_of(exact), "Interest Rates");

        let cell = doc.first("td").unwrap().unwrap();
        assert_eq!(text_of(cell), "12.50 13.10");

        let card = closest(cell, "div.card").unwrap().unwrap();
        assert_eq!(card.value().attr("class"), Some("card"));
    }

    #[test]
    fn test_unparsable_documents() {
        assert!(matches!(
            Document::parse_str("   "),
            Err(ExtractionError::EmptyDocument)
        ));
        assert!(matches!(
            Document::parse_str("{\"rates\": []}"),
            Err(ExtractionError::NotMarkup)
        ));
        let doc = Document::parse_str("<p>ok</p>").unwrap();
        assert!(matches!(doc.select("p:::"), Err(ExtractionError::Selector(_))));
    }
}
