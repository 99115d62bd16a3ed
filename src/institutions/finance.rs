//! ノンバンク（登録金融会社）
//!
//! ほとんどのサイトは「期間 | 金利 | AER | 金利 | AER」の5列表なので
//! 共通レイアウトで処理し、表の探し方だけをサイトごとに書く。

use std::time::Duration;

use scraper::ElementRef;

use super::Institution;
use crate::error::ExtractionError;
use crate::extract::table::{
    closest, next_sibling_matching, row_cells, select_in, text_of, ColumnLayout, PayoutColumn,
    MATURITY_AER_MONTHLY_AER, MONTHLY_AER_MATURITY_AER,
};
use crate::extract::{leading_integer, parse_rate, parse_term_months, Document};
use crate::fetch::{BrowserStep, FetchMode};
use crate::model::{InstitutionCategory, PayoutSchedule, RateRecord};

const STANDARD: &str = "Standard";
const SENIOR: &str = "Senior Citizen";

pub(super) const INSTITUTIONS: &[Institution] = &[
    finance(
        "Alliance Finance",
        "https://www.alliancefinance.lk/investments/fixed-deposits/",
        FetchMode::Http,
        alliance,
    ),
    finance(
        "CDB Finance",
        "https://www.cdb.lk/products/cards/fd/cdb-dsfd",
        FetchMode::Browser(CDB_STEPS),
        cdb,
    ),
    finance(
        "Commercial Credit",
        "https://www.cclk.lk/products/deposits/fixed-deposit/en",
        FetchMode::Http,
        commercial_credit,
    ),
    finance(
        "Dialog Finance",
        "https://www.dialogfinance.lk/for-you/fixed-deposits",
        FetchMode::Http,
        dialog,
    ),
    finance(
        "HNB Finance",
        "https://www.hnbfinance.lk/fixed-deposits/",
        FetchMode::Http,
        hnb_finance,
    ),
    finance(
        "Janashakthi Finance",
        "https://www.janashakthifinance.lk/services/fixed-deposits/",
        FetchMode::Http,
        janashakthi,
    ),
    finance(
        "LOLC Finance",
        "https://www.lolcfinance.com/rates-and-returns/interest-rates/",
        FetchMode::Http,
        lolc,
    ),
    finance(
        "MBSL Bank",
        "https://www.mbslbank.com/en/services/personal-services/deposits/fixed-deposits/",
        FetchMode::Http,
        mbsl,
    ),
    finance(
        "Mercantile Investments",
        "https://www.mi.com.lk/en/products-and-services/main-products/fixed-deposit",
        FetchMode::Http,
        mercantile,
    ),
    finance(
        "Nation Lanka Finance",
        "https://www.nationlanka.com/deposits",
        FetchMode::Browser(NATION_LANKA_STEPS),
        nation_lanka,
    ),
    finance("PMF Finance", "https://pmf.lk/en/fixed-deposit/", FetchMode::Http, pmf),
    finance(
        "Singer Finance",
        "https://singerfinance.com/en/products/fixed-deposit/standard-fixed-deposits",
        FetchMode::Http,
        singer,
    ),
    finance(
        "Senkadagala Finance",
        "https://www.senfin.com/personal.html",
        FetchMode::Browser(SENKADAGALA_STEPS),
        senkadagala,
    ),
    finance(
        "Siyapatha Finance",
        "https://www.siyapatha.lk/fixed-deposits/",
        FetchMode::Http,
        siyapatha,
    ),
    finance(
        "SMB Finance",
        "https://www.smblk.com/products-services/fixed-deposits/",
        FetchMode::Http,
        smb,
    ),
    finance(
        "Vallibel Finance",
        "https://www.vallibelfinance.com/product/fixed-deposits",
        FetchMode::Http,
        vallibel,
    ),
    finance(
        "People's Leasing & Finance",
        "https://www.plc.lk/products/fixed-deposits-savings/fixed-deposits/",
        FetchMode::Http,
        plc,
    ),
];

const fn finance(
    name: &'static str,
    url: &'static str,
    fetch: FetchMode,
    extract: super::Extractor,
) -> Institution {
    Institution {
        name,
        category: InstitutionCategory::FinanceCompany,
        url,
        fetch,
        extract,
    }
}

/// 単位付きの期間、なければ先頭の数値を月数とみなす
fn months_or_bare(text: &str) -> Option<u32> {
    parse_term_months(text).or_else(|| leading_integer(text))
}

/// `container_css`内の最初の表を5列レイアウトで読む
fn container_table(
    doc: &Document,
    inst: &Institution,
    container_css: &str,
    variant: &str,
    layout: &ColumnLayout,
) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(container) = doc.first(container_css)? else {
        return Ok(Vec::new());
    };
    match select_in(container, "table")?.into_iter().next() {
        Some(table) => layout.table_records(inst, variant, table, 0, false),
        None => Ok(Vec::new()),
    }
}

fn alliance(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    match doc.first("table#tablepress-1")? {
        Some(table) => MONTHLY_AER_MATURITY_AER.table_records(inst, STANDARD, table, 0, false),
        None => Ok(Vec::new()),
    }
}

const CDB_STEPS: &[BrowserStep] = &[BrowserStep::WaitVisible {
    selector: "div#collapsefirst",
    text: None,
    timeout: Duration::from_secs(20),
}];

/// 期間 | 毎月 | 満期 | AER(毎月) | AER(満期)
const CDB_LAYOUT: ColumnLayout = ColumnLayout::new(
    5,
    &[
        PayoutColumn::new(PayoutSchedule::Monthly, 1, Some(3)),
        PayoutColumn::new(PayoutSchedule::AtMaturity, 2, Some(4)),
    ],
);

/// 期間ごとに<tbody>が分かれていて、各tbodyの先頭行だけが金利行
fn cdb(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(accordion) = doc.first("div#collapsefirst")? else {
        return Ok(Vec::new());
    };
    let Some(table) = select_in(accordion, "table.table-striped")?.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for tbody in select_in(table, "tbody")? {
        if let Some(row) = select_in(tbody, "tr")?.into_iter().next() {
            let cells = row_cells(row, false)?;
            records.extend(CDB_LAYOUT.row_records(inst, STANDARD, &cells));
        }
    }
    Ok(records)
}

fn commercial_credit(
    doc: &Document,
    inst: &Institution,
) -> Result<Vec<RateRecord>, ExtractionError> {
    const LAYOUT: ColumnLayout = MONTHLY_AER_MATURITY_AER.with_term_parser(months_or_bare);

    match doc.table_after_heading("h3", "Non Senior Citizen Rates")? {
        Some(table) => LAYOUT.table_records(inst, STANDARD, table, 0, false),
        None => Ok(Vec::new()),
    }
}

/// 見出し（h3.section-title）ごとに通常/シニアの表がある
fn dialog(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();
    for heading in doc.select("h3.section-title")? {
        let Some(table) = next_sibling_matching(heading, "div.table-responsive")? else {
            continue;
        };
        let title = text_of(heading).to_lowercase();
        let variant = if title.contains("non-senior citizen") {
            STANDARD
        } else if title.contains("senior citizen") {
            SENIOR
        } else {
            continue;
        };
        records.extend(MATURITY_AER_MONTHLY_AER.table_records(inst, variant, table, 0, false)?);
    }
    Ok(records)
}

/// 期間列が<th>のため th/td 両方を読む
fn hnb_finance(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();

    if let Some(heading) = doc.find_exact("h2", "Interest Rates")? {
        if let Some(table) = doc.next_after(heading, "table")? {
            records.extend(MONTHLY_AER_MATURITY_AER.table_records(inst, STANDARD, table, 0, true)?);
        }
    }
    if let Some(table) = doc.table_after_heading("h2", "Interest Rates – Senior Citizens")? {
        records.extend(MONTHLY_AER_MATURITY_AER.table_records(inst, SENIOR, table, 0, true)?);
    }

    Ok(records)
}

fn janashakthi(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    const LAYOUT: &ColumnLayout = &MONTHLY_AER_MATURITY_AER;

    let mut records = container_table(doc, inst, "div#fd-pop-cont_fd_r_normal", STANDARD, LAYOUT)?;
    records.extend(container_table(doc, inst, "div#fd-pop-cont_fd_r_senior", SENIOR, LAYOUT)?);
    Ok(records)
}

/// 期間(月数のみ) | 毎月 | AER | 毎年 | AER | 満期 | AER。2行目はサブ見出し
const LOLC_LAYOUT: ColumnLayout = ColumnLayout::new(
    7,
    &[
        PayoutColumn::new(PayoutSchedule::Monthly, 1, Some(2)),
        PayoutColumn::new(PayoutSchedule::Annually, 3, Some(4)),
        PayoutColumn::new(PayoutSchedule::AtMaturity, 5, Some(6)),
    ],
)
.with_term_parser(months_or_bare);

fn lolc(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();
    for (css, variant) in [("div#GeneralFD", "Normal"), ("div#SCFD", SENIOR)] {
        let Some(tab) = doc.first(css)? else {
            continue;
        };
        if let Some(table) = select_in(tab, "table")?.into_iter().next() {
            records.extend(LOLC_LAYOUT.table_records(inst, variant, table, 1, false)?);
        }
    }
    Ok(records)
}

/// 期間列に日数の行が混じるので日数は除外、単位なしの数値は月数
fn months_unless_days(text: &str) -> Option<u32> {
    if text.to_lowercase().contains("day") {
        return None;
    }
    months_or_bare(text)
}

/// table.table-borderedの1つ目が通常、2つ目がシニア（2つ揃わなければ対象外）
fn mbsl(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    const LAYOUT: ColumnLayout = MONTHLY_AER_MATURITY_AER.with_term_parser(months_unless_days);

    let tables = doc.select("table.table-bordered")?;
    let [normal, senior, ..] = tables.as_slice() else {
        return Ok(Vec::new());
    };

    let mut records = LAYOUT.table_records(inst, "Normal", *normal, 0, true)?;
    records.extend(LAYOUT.table_records(inst, SENIOR, *senior, 0, true)?);
    Ok(records)
}

/// 商品画像（img）を含むdivの次のdiv.table-wrapperが金利表
fn mercantile(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    const PRODUCTS: [(&str, &str); 2] = [
        (r#"img[src*="divimithuru-en.png"]"#, "Divimithuru (Standard)"),
        (r#"img[src*="kruthaguna-en.png"]"#, "Kruthaguna (Senior Citizen)"),
    ];

    let mut records = Vec::new();
    for (image_css, variant) in PRODUCTS {
        let Some(image) = doc.first(image_css)? else {
            continue;
        };
        let Some(block) = closest(image, "div")? else {
            continue;
        };
        if let Some(wrapper) = next_sibling_matching(block, "div.table-wrapper")? {
            let rows = MONTHLY_AER_MATURITY_AER.table_records(inst, variant, wrapper, 0, false)?;
            records.extend(rows);
        }
    }
    Ok(records)
}

const NATION_LANKA_STEPS: &[BrowserStep] = &[BrowserStep::WaitVisible {
    selector: "table th",
    text: Some("Period"),
    timeout: Duration::from_secs(20),
}];

/// 見出し行: 期間 | <支払いタイミング...>。AERは掲載なし
fn nation_lanka(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(table) = doc.first("table.table-auto")? else {
        return Ok(Vec::new());
    };
    let Some(header) = select_in(table, "thead > tr")?.into_iter().next() else {
        return Ok(Vec::new());
    };
    let headers = row_cells(header, true)?;
    let payouts: Vec<Option<PayoutSchedule>> = headers
        .iter()
        .skip(1)
        .map(|h| PayoutSchedule::from_label(h))
        .collect();

    let mut records = Vec::new();
    for row in select_in(table, "tbody > tr")? {
        let cells = row_cells(row, false)?;
        if cells.len() < headers.len() {
            continue;
        }
        let Some(term) = cells.first().and_then(|c| parse_term_months(c)) else {
            continue;
        };
        for (cell, payout) in cells.iter().skip(1).zip(&payouts) {
            let (Some(payout), Some(rate)) = (payout, parse_rate(cell)) else {
                continue;
            };
            records.push(inst.record("Non-Senior Citizen", term, *payout, rate, None));
        }
    }
    Ok(records)
}

fn pmf(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    const LAYOUT: &ColumnLayout = &MONTHLY_AER_MATURITY_AER;

    let mut records = container_table(doc, inst, "div#normal-fd-rates-table", STANDARD, LAYOUT)?;
    records.extend(container_table(doc, inst, "div#se-citizen-fd-rates-table", SENIOR, LAYOUT)?);
    Ok(records)
}

fn singer(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(heading) = doc.find_exact("h2", "Interest Paid Rate")? else {
        return Ok(Vec::new());
    };
    match doc.next_after(heading, "table.rating-table__wrap")? {
        Some(table) => MONTHLY_AER_MATURITY_AER.table_records(inst, STANDARD, table, 0, false),
        None => Ok(Vec::new()),
    }
}

const SENKADAGALA_STEPS: &[BrowserStep] = &[
    BrowserStep::WaitVisible {
        selector: "table#SeniorDeposits",
        text: None,
        timeout: Duration::from_secs(20),
    },
    BrowserStep::WaitVisible {
        selector: "table#GeneralDeposits",
        text: None,
        timeout: Duration::from_secs(20),
    },
];

/// tbodyを使わない表。途中に「Period」の見出し行が繰り返し出てくる
fn senkadagala(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();
    for (css, variant) in [("table#SeniorDeposits", SENIOR), ("table#GeneralDeposits", "General")] {
        if let Some(table) = doc.first(css)? {
            records.extend(senkadagala_table(inst, variant, table)?);
        }
    }
    Ok(records)
}

fn senkadagala_table(
    inst: &Institution,
    variant: &str,
    table: ElementRef<'_>,
) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();
    for row in select_in(table, "tr")?.into_iter().skip(1) {
        let cells = row_cells(row, true)?;
        if cells.iter().any(|c| c.to_lowercase().contains("period")) {
            continue;
        }
        records.extend(MONTHLY_AER_MATURITY_AER.row_records(inst, variant, &cells));
    }
    Ok(records)
}

/// 表はdivのグリッド。見出しh5の次のdiv.b_ron内で、div.col-sm-12が1行・div.colが1セル
///
/// 先頭2行は見出し。
fn siyapatha(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();
    for (needle, variant) in [("General Public", "General Public"), ("Senior Citizens", SENIOR)] {
        let Some(heading) = doc.find_with_text("h5", needle)? else {
            continue;
        };
        let Some(grid) = next_sibling_matching(heading, "div.b_ron")? else {
            continue;
        };
        for row in select_in(grid, "div.col-sm-12")?.into_iter().skip(2) {
            let cells: Vec<String> = select_in(row, "div.col")?.into_iter().map(text_of).collect();
            records.extend(MATURITY_AER_MONTHLY_AER.row_records(inst, variant, &cells));
        }
    }
    Ok(records)
}

/// table.tablebgのうち最初の見出しセルが「Period」のもの
fn smb(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    for table in doc.select("table.tablebg")? {
        let is_rates = select_in(table, "th")?
            .into_iter()
            .next()
            .is_some_and(|th| text_of(th).to_lowercase().contains("period"));
        if is_rates {
            return MONTHLY_AER_MATURITY_AER.table_records(inst, STANDARD, table, 0, false);
        }
    }
    Ok(Vec::new())
}

/// div.rg-containerごとに h3（商品名）+ table.rg-table
fn vallibel(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();
    for container in doc.select("div.rg-container")? {
        let heading = select_in(container, "h3")?.into_iter().next();
        let table = select_in(container, "table.rg-table")?.into_iter().next();
        if let (Some(heading), Some(table)) = (heading, table) {
            let variant = text_of(heading);
            let rows = MONTHLY_AER_MATURITY_AER.table_records(inst, &variant, table, 0, false)?;
            records.extend(rows);
        }
    }
    Ok(records)
}

fn plc(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(heading) = doc.find_exact("h4.wp-block-heading", "Normal Fixed Deposit")? else {
        return Ok(Vec::new());
    };
    match next_sibling_matching(heading, "table")? {
        Some(table) => MATURITY_AER_MONTHLY_AER.table_records(inst, "Normal", table, 0, false),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::institutions::find;
    use pretty_assertions::assert_eq;

    fn run(name: &str, html: &str) -> Vec<(String, u32, PayoutSchedule, f64, Option<f64>)> {
        let inst = find(name).unwrap();
        let doc = Document::parse_str(html).unwrap();
        (inst.extract)(&doc, &inst)
            .unwrap()
            .into_iter()
            .map(|r| {
                assert_eq!(r.institution_category, InstitutionCategory::FinanceCompany);
                (
                    r.product_variant,
                    r.term_months,
                    r.payout_schedule,
                    r.nominal_rate,
                    r.effective_rate,
                )
            })
            .collect()
    }

    #[test]
    fn test_alliance_tablepress() {
        let html = r#"<table id="tablepress-1">
            <thead><tr><th>Period</th><th>Monthly</th><th>AER</th><th>Maturity</th><th>AER</th></tr></thead>
            <tbody>
              <tr><td>12 Months</td><td>10.50%</td><td>11.02%</td><td>11.00%</td><td>11.00%</td></tr>
              <tr><td>60 Months</td><td>–</td><td>–</td><td>12.50%</td><td>–</td></tr>
              <tr><td colspan="5">Rates subject to change</td></tr>
            </tbody></table>"#;

        assert_eq!(
            run("Alliance Finance", html),
            vec![
                ("Standard".into(), 12, PayoutSchedule::Monthly, 10.5, Some(11.02)),
                ("Standard".into(), 12, PayoutSchedule::AtMaturity, 11.0, Some(11.0)),
                ("Standard".into(), 60, PayoutSchedule::AtMaturity, 12.5, None),
            ]
        );
    }

    #[test]
    fn test_cdb_first_row_per_tbody() {
        let html = r#"<div id="collapsefirst"><table class="table table-striped">
            <tbody>
              <tr><td>6 Months</td><td>9.00%</td><td>9.25%</td><td>9.38%</td><td>9.46%</td></tr>
              <tr><td>6 Months</td><td>1%</td><td>1%</td><td>1%</td><td>1%</td></tr>
            </tbody>
            <tbody><tr><td>12 Months</td><td>10.00%</td><td>-</td><td>10.47%</td><td>-</td></tr></tbody>
            </table></div>"#;

        assert_eq!(
            run("CDB Finance", html),
            vec![
                ("Standard".into(), 6, PayoutSchedule::Monthly, 9.0, Some(9.38)),
                ("Standard".into(), 6, PayoutSchedule::AtMaturity, 9.25, Some(9.46)),
                ("Standard".into(), 12, PayoutSchedule::Monthly, 10.0, Some(10.47)),
            ]
        );
    }

    #[test]
    fn test_commercial_credit_bare_month_numbers() {
        let html = r#"<h3>Non Senior Citizen Rates</h3>
            <div><table><tbody>
              <tr><td>24</td><td>11.00%</td><td>11.57%</td><td>12.00%</td><td>12.00%</td></tr>
            </tbody></table></div>"#;

        assert_eq!(
            run("Commercial Credit", html),
            vec![
                ("Standard".into(), 24, PayoutSchedule::Monthly, 11.0, Some(11.57)),
                ("Standard".into(), 24, PayoutSchedule::AtMaturity, 12.0, Some(12.0)),
            ]
        );
    }

    #[test]
    fn test_dialog_sections_by_title() {
        let html = r#"<section>
              <h3 class="section-title">Non-Senior Citizen Rates</h3>
              <div class="table-responsive"><table><tbody>
                <tr><td>3 MONTHS</td><td>8.50%</td><td>8.77%</td><td>-</td><td>-</td></tr>
              </tbody></table></div>
              <h3 class="section-title">Senior Citizen Rates</h3>
              <div class="table-responsive"><table><tbody>
                <tr><td>3 MONTHS</td><td>9.00%</td><td>9.31%</td><td>8.80%</td><td>9.16%</td></tr>
              </tbody></table></div>
              <h3 class="section-title">Corporate</h3>
            </section>"#;

        assert_eq!(
            run("Dialog Finance", html),
            vec![
                ("Standard".into(), 3, PayoutSchedule::AtMaturity, 8.5, Some(8.77)),
                ("Senior Citizen".into(), 3, PayoutSchedule::AtMaturity, 9.0, Some(9.31)),
                ("Senior Citizen".into(), 3, PayoutSchedule::Monthly, 8.8, Some(9.16)),
            ]
        );
    }

    #[test]
    fn test_hnb_finance_exact_headings() {
        let html = r#"<h2>Interest Rates – Senior Citizens</h2>
            <table><tbody>
              <tr><th>12 Months</th><td>11.00%</td><td>11.57%</td><td>-</td><td>-</td></tr>
            </tbody></table>
            <h2>Interest Rates</h2>
            <table><tbody>
              <tr><th>12 Months</th><td>10.00%</td><td>10.47%</td><td>10.50%</td><td>10.50%</td></tr>
            </tbody></table>"#;

        assert_eq!(
            run("HNB Finance", html),
            vec![
                ("Standard".into(), 12, PayoutSchedule::Monthly, 10.0, Some(10.47)),
                ("Standard".into(), 12, PayoutSchedule::AtMaturity, 10.5, Some(10.5)),
                ("Senior Citizen".into(), 12, PayoutSchedule::Monthly, 11.0, Some(11.57)),
            ]
        );
    }

    #[test]
    fn test_lolc_seven_columns_skip_subheader() {
        let html = r#"<div id="GeneralFD"><table><tbody>
              <tr><td>Months</td><td>Rate</td><td>AER</td><td>Rate</td><td>AER</td><td>Rate</td><td>AER</td></tr>
              <tr><td>12</td><td>10.00</td><td>10.47</td><td>10.25</td><td>10.25</td><td>10.50</td><td>10.50</td></tr>
            </tbody></table></div>
            <div id="SCFD"><table><tbody>
              <tr><td>Months</td><td>Rate</td><td>AER</td><td>Rate</td><td>AER</td><td>Rate</td><td>AER</td></tr>
              <tr><td>12</td><td>-</td><td>-</td><td>-</td><td>-</td><td>11.00</td><td>11.00</td></tr>
            </tbody></table></div>"#;

        assert_eq!(
            run("LOLC Finance", html),
            vec![
                ("Normal".into(), 12, PayoutSchedule::Monthly, 10.0, Some(10.47)),
                ("Normal".into(), 12, PayoutSchedule::Annually, 10.25, Some(10.25)),
                ("Normal".into(), 12, PayoutSchedule::AtMaturity, 10.5, Some(10.5)),
                ("Senior Citizen".into(), 12, PayoutSchedule::AtMaturity, 11.0, Some(11.0)),
            ]
        );
    }

    #[test]
    fn test_mbsl_needs_both_tables() {
        let normal = r#"<table class="table table-bordered"><tbody>
              <tr><th>Period</th><th>Monthly</th><th>AER</th><th>Maturity</th><th>AER</th></tr>
              <tr><th>90 Days</th><td>-</td><td>-</td><td>8.00%</td><td>8.24%</td></tr>
              <tr><th>12</th><td>10.00%</td><td>10.47%</td><td>10.50%</td><td>10.50%</td></tr>
            </tbody></table>"#;
        let senior = r#"<table class="table table-bordered"><tbody>
              <tr><td>12 Months</td><td>10.50%</td><td>11.02%</td><td>11.00%</td><td>11.00%</td></tr>
            </tbody></table>"#;

        assert_eq!(
            run("MBSL Bank", &format!("{}{}", normal, senior)),
            vec![
                ("Normal".into(), 12, PayoutSchedule::Monthly, 10.0, Some(10.47)),
                ("Normal".into(), 12, PayoutSchedule::AtMaturity, 10.5, Some(10.5)),
                ("Senior Citizen".into(), 12, PayoutSchedule::Monthly, 10.5, Some(11.02)),
                ("Senior Citizen".into(), 12, PayoutSchedule::AtMaturity, 11.0, Some(11.0)),
            ]
        );
        assert!(run("MBSL Bank", normal).is_empty());
    }

    #[test]
    fn test_mercantile_tables_follow_product_images() {
        let html = r#"<section>
              <div class="banner"><img src="/images/divimithuru-en.png" alt=""></div>
              <div class="table-wrapper"><table><tbody>
                <tr><td>12 Months</td><td>10.00%</td><td>10.47%</td><td>10.50%</td><td>10.50%</td></tr>
              </tbody></table></div>
              <div class="banner"><img src="/images/kruthaguna-en.png" alt=""></div>
              <div class="table-wrapper"><table><tbody>
                <tr><td>12 Months</td><td>-</td><td>-</td><td>11.50%</td><td>11.50%</td></tr>
              </tbody></table></div>
            </section>"#;

        assert_eq!(
            run("Mercantile Investments", html),
            vec![
                ("Divimithuru (Standard)".into(), 12, PayoutSchedule::Monthly, 10.0, Some(10.47)),
                ("Divimithuru (Standard)".into(), 12, PayoutSchedule::AtMaturity, 10.5, Some(10.5)),
                (
                    "Kruthaguna (Senior Citizen)".into(),
                    12,
                    PayoutSchedule::AtMaturity,
                    11.5,
                    Some(11.5)
                ),
            ]
        );
    }

    #[test]
    fn test_nation_lanka_header_driven_payouts() {
        let html = r#"<table class="table-auto">
              <thead><tr><th>Period</th><th>Monthly</th><th>Annually</th><th>At Maturity</th></tr></thead>
              <tbody>
                <tr><td>12 Months</td><td>10.00%</td><td>10.25%</td><td>10.50%</td></tr>
                <tr><td>24 Months</td><td>-</td><td>-</td><td>11.00%</td></tr>
                <tr><td>36 Months</td><td>11.50%</td></tr>
              </tbody></table>"#;

        assert_eq!(
            run("Nation Lanka Finance", html),
            vec![
                ("Non-Senior Citizen".into(), 12, PayoutSchedule::Monthly, 10.0, None),
                ("Non-Senior Citizen".into(), 12, PayoutSchedule::Annually, 10.25, None),
                ("Non-Senior Citizen".into(), 12, PayoutSchedule::AtMaturity, 10.5, None),
                ("Non-Senior Citizen".into(), 24, PayoutSchedule::AtMaturity, 11.0, None),
            ]
        );
    }

    #[test]
    fn test_nation_lanka_empty_header_and_rows() {
        let html = r#"<table class="table-auto">
              <thead><tr></tr></thead>
              <tbody><tr></tr><tr><td>12 Months</td></tr></tbody>
            </table>"#;

        assert!(run("Nation Lanka Finance", html).is_empty());
    }

    #[test]
    fn test_siyapatha_div_grid() {
        let html = r#"<h5>Fixed Deposit Rates - General Public</h5>
            <div class="b_ron">
              <div class="col-sm-12"><div class="col">General Public</div></div>
              <div class="col-sm-12"><div class="col">Period</div><div class="col">Maturity</div><div class="col">AER</div><div class="col">Monthly</div><div class="col">AER</div></div>
              <div class="col-sm-12"><div class="col">12 Months</div><div class="col">11.00%</div><div class="col">11.00%</div><div class="col">10.50%</div><div class="col">11.02%</div></div>
            </div>
            <h5>Senior Citizens</h5>
            <div class="b_ron">
              <div class="col-sm-12"><div class="col">Senior Citizens</div></div>
              <div class="col-sm-12"><div class="col">Period</div><div class="col">Maturity</div><div class="col">AER</div><div class="col">Monthly</div><div class="col">AER</div></div>
              <div class="col-sm-12"><div class="col">12 Months</div><div class="col">12.00%</div><div class="col">12.00%</div><div class="col">-</div><div class="col">-</div></div>
            </div>"#;

        assert_eq!(
            run("Siyapatha Finance", html),
            vec![
                ("General Public".into(), 12, PayoutSchedule::AtMaturity, 11.0, Some(11.0)),
                ("General Public".into(), 12, PayoutSchedule::Monthly, 10.5, Some(11.02)),
                ("Senior Citizen".into(), 12, PayoutSchedule::AtMaturity, 12.0, Some(12.0)),
            ]
        );
    }

    #[test]
    fn test_smb_picks_period_table() {
        let html = r#"<table class="tablebg"><tr><th>Branch</th><th>Phone</th></tr></table>
            <table class="tablebg">
              <thead><tr><th>Period</th><th>Monthly</th><th>AER</th><th>Maturity</th><th>AER</th></tr></thead>
              <tbody><tr><td>6 Months</td><td>9.00</td><td>9.38</td><td>9.25</td><td>9.46</td></tr></tbody>
            </table>"#;

        assert_eq!(
            run("SMB Finance", html),
            vec![
                ("Standard".into(), 6, PayoutSchedule::Monthly, 9.0, Some(9.38)),
                ("Standard".into(), 6, PayoutSchedule::AtMaturity, 9.25, Some(9.46)),
            ]
        );
    }

    #[test]
    fn test_senkadagala_skips_period_rows() {
        let html = r#"<table id="GeneralDeposits">
              <tr><th>General</th></tr>
              <tr><th>Period</th><th>Monthly</th><th>AER</th><th>Maturity</th><th>AER</th></tr>
              <tr><td>12 months</td><td>10.00%</td><td>10.47%</td><td>10.50%</td><td>10.50%</td></tr>
            </table>"#;

        assert_eq!(
            run("Senkadagala Finance", html),
            vec![
                ("General".into(), 12, PayoutSchedule::Monthly, 10.0, Some(10.47)),
                ("General".into(), 12, PayoutSchedule::AtMaturity, 10.5, Some(10.5)),
            ]
        );
    }

    #[test]
    fn test_vallibel_variant_from_heading() {
        let html = r#"<div class="rg-container">
              <h3>Senior Citizen Fixed Deposit</h3>
              <table class="rg-table"><tbody>
                <tr><td>1 Year</td><td>10.75%</td><td>11.30%</td><td>11.25%</td><td>11.25%</td></tr>
              </tbody></table>
            </div>
            <div class="rg-container"><table class="rg-table"></table></div>"#;

        assert_eq!(
            run("Vallibel Finance", html),
            vec![
                (
                    "Senior Citizen Fixed Deposit".into(),
                    12,
                    PayoutSchedule::Monthly,
                    10.75,
                    Some(11.3)
                ),
                (
                    "Senior Citizen Fixed Deposit".into(),
                    12,
                    PayoutSchedule::AtMaturity,
                    11.25,
                    Some(11.25)
                ),
            ]
        );
    }

    #[test]
    fn test_singer_table_after_exact_heading() {
        let html = r#"<h2>Interest Paid Rate Notes</h2>
            <h2>Interest Paid Rate</h2>
            <div class="rating"><table class="rating-table__wrap"><tbody>
              <tr><td>12 Months</td><td>0.00%</td><td>0.00%</td><td>11.00%</td><td>11.00%</td></tr>
            </tbody></table></div>"#;

        assert_eq!(
            run("Singer Finance", html),
            vec![("Standard".into(), 12, PayoutSchedule::AtMaturity, 11.0, Some(11.0))]
        );
    }

    #[test]
    fn test_plc_maturity_first_columns() {
        let html = r#"<div class="entry">
              <h4 class="wp-block-heading">Normal Fixed Deposit</h4>
              <p>Minimum deposit Rs. 10,000</p>
              <table><tbody>
                <tr><td>Period</td><td>Maturity</td><td>AER</td><td>Monthly</td><td>AER</td></tr>
                <tr><td>12 Months</td><td>11.00%</td><td>11.00%</td><td>10.50%</td><td>11.02%</td></tr>
              </tbody></table>
            </div>"#;

        assert_eq!(
            run("People's Leasing & Finance", html),
            vec![
                ("Normal".into(), 12, PayoutSchedule::AtMaturity, 11.0, Some(11.0)),
                ("Normal".into(), 12, PayoutSchedule::Monthly, 10.5, Some(11.02)),
            ]
        );
    }

    #[test]
    fn test_container_tables() {
        let html = r#"<div id="normal-fd-rates-table"><table><tbody>
              <tr><td>6 Months</td><td>9.00%</td><td>9.38%</td><td>9.25%</td><td>9.46%</td></tr>
            </tbody></table></div>"#;

        assert_eq!(
            run("PMF Finance", html),
            vec![
                ("Standard".into(), 6, PayoutSchedule::Monthly, 9.0, Some(9.38)),
                ("Standard".into(), 6, PayoutSchedule::AtMaturity, 9.25, Some(9.46)),
            ]
        );
        assert!(run("Janashakthi Finance", html).is_empty());
    }

    #[test]
    fn test_missing_markup_yields_no_records() {
        for inst in INSTITUTIONS {
            let doc =
                Document::parse_str("<html><body><h2>Coming soon</h2></body></html>").unwrap();
            assert!((inst.extract)(&doc, inst).unwrap().is_empty(), "{}", inst.name);
        }
    }
}
