//! 銀行（ライセンス商業銀行・国営銀行）

use std::time::Duration;

use super::Institution;
use crate::error::ExtractionError;
use crate::extract::table::{
    body_rows, closest, next_sibling_matching, row_cells, select_in, text_of, ColumnLayout,
    PayoutColumn,
};
use crate::extract::{parse_rate, parse_rate_and_aer, parse_term_months, Document};
use crate::fetch::{BrowserStep, FetchMode};
use crate::model::{InstitutionCategory, PayoutSchedule, RateRecord};

const STANDARD: &str = "Standard";
const SENIOR: &str = "Senior Citizen";

pub(super) const INSTITUTIONS: &[Institution] = &[
    Institution {
        name: "Cargills Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.cargillsbank.com/deposit-interest-rates",
        fetch: FetchMode::Http,
        extract: cargills,
    },
    Institution {
        name: "Commercial Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.combank.lk/rates-tariff",
        fetch: FetchMode::Browser(COMMERCIAL_STEPS),
        extract: commercial,
    },
    Institution {
        name: "DFCC Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.dfcc.lk/interest-rates/fd-rates/",
        fetch: FetchMode::Http,
        extract: dfcc,
    },
    Institution {
        name: "Hatton National Bank (HNB)",
        category: InstitutionCategory::Bank,
        url: "https://www.hnb.lk/interest-rates",
        fetch: FetchMode::Browser(HNB_STEPS),
        extract: hnb,
    },
    Institution {
        name: "National Savings Bank (NSB)",
        category: InstitutionCategory::Bank,
        url: "https://www.nsb.lk/rates-tarriffs/rupee-deposit-rates/",
        fetch: FetchMode::Http,
        extract: nsb,
    },
    Institution {
        name: "Nations Trust Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.nationstrust.com/deposit-rates",
        fetch: FetchMode::Http,
        extract: ntb,
    },
    Institution {
        name: "People's Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.peoplesbank.lk/interest-rates/",
        fetch: FetchMode::Http,
        extract: peoples,
    },
    Institution {
        name: "Pan Asia Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.pabcbank.com/personal-banking/savings-investments/fixed-deposits/general-fixed-deposits/",
        fetch: FetchMode::Browser(PAN_ASIA_STEPS),
        extract: pan_asia,
    },
    Institution {
        name: "Sampath Bank",
        category: InstitutionCategory::Bank,
        url: "https://www.sampath.lk/personal-banking/term-deposit-accounts/regular-deposits/Fixed-Deposits?category=personal_banking",
        fetch: FetchMode::Browser(SAMPATH_STEPS),
        extract: sampath,
    },
];

// ---------------------------------------------------------------------------
// Cargills Bank
// ---------------------------------------------------------------------------

/// 期間 | 満期 | AER | 毎月 | AER | 毎年
const CARGILLS_STANDARD: ColumnLayout = ColumnLayout::new(
    6,
    &[
        PayoutColumn::new(PayoutSchedule::AtMaturity, 1, Some(2)),
        PayoutColumn::new(PayoutSchedule::Monthly, 3, Some(4)),
        PayoutColumn::new(PayoutSchedule::Annually, 5, None),
    ],
);

/// 期間 | 満期 | 毎月
const CARGILLS_SENIOR: ColumnLayout = ColumnLayout::new(
    3,
    &[
        PayoutColumn::new(PayoutSchedule::AtMaturity, 1, None),
        PayoutColumn::new(PayoutSchedule::Monthly, 2, None),
    ],
);

fn cargills(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let mut records = Vec::new();

    // 見出しの<p>の直後の兄弟<table>。1行目は列見出し
    let standard = doc.select("p")?.into_iter().find(|p| {
        let text = text_of(*p).to_lowercase();
        text.contains("fixed deposits (lkr)") && !text.contains("senior")
    });
    if let Some(heading) = standard {
        if let Some(table) = next_sibling_matching(heading, "table")? {
            records.extend(CARGILLS_STANDARD.table_records(inst, STANDARD, table, 1, false)?);
        }
    }

    if let Some(heading) = doc.find_with_text("p", "Senior Citizen Fixed Deposits")? {
        if let Some(table) = next_sibling_matching(heading, "table")? {
            records.extend(CARGILLS_SENIOR.table_records(inst, SENIOR, table, 1, false)?);
        }
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Commercial Bank
// ---------------------------------------------------------------------------

const COMMERCIAL_STEPS: &[BrowserStep] = &[
    BrowserStep::Click {
        selector: "a.expand-link",
        text: Some("Fixed Deposits"),
    },
    BrowserStep::WaitVisible {
        selector: "div.expand-block table.with-radius",
        text: None,
        timeout: Duration::from_secs(15),
    },
];

/// 1行 = 「説明 | 金利 | AER | 備考」。説明に期間と支払いタイミングが入っている
fn commercial(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(link) = doc.find_with_text("a.expand-link", "Fixed Deposits")? else {
        return Ok(Vec::new());
    };
    let Some(block) = closest(link, "div.expand-block")? else {
        return Ok(Vec::new());
    };
    let Some(table) = select_in(block, "table.with-radius")?.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in body_rows(table)? {
        let cells = row_cells(row, false)?;
        if cells.len() != 4 {
            continue;
        }
        let Some(term) = parse_term_months(&cells[0]) else {
            continue;
        };
        let Some(rate) = parse_rate(&cells[1]) else {
            continue;
        };
        let description = cells[0].to_lowercase();
        let payout = if description.contains("monthly") {
            PayoutSchedule::Monthly
        } else if description.contains("annually") {
            PayoutSchedule::Annually
        } else {
            PayoutSchedule::AtMaturity
        };
        records.push(inst.record(STANDARD, term, payout, rate, parse_rate(&cells[2])));
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// DFCC Bank
// ---------------------------------------------------------------------------

/// 横持ちの表: 1行目が期間見出し、以降は（金利行, AER行）のペア
fn dfcc(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(container) = doc.first("div#ratest-tab-04")? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for heading in select_in(container, "h3")? {
        if !text_of(heading).contains("FD Rates") {
            continue;
        }
        if let Some(table) = doc.next_after(heading, "table")? {
            records.extend(dfcc_table(inst, table)?);
        }
    }
    Ok(records)
}

fn dfcc_table(
    inst: &Institution,
    table: scraper::ElementRef<'_>,
) -> Result<Vec<RateRecord>, ExtractionError> {
    let rows = body_rows(table)?;
    let Some((header, data)) = rows.split_first() else {
        return Ok(Vec::new());
    };
    let terms: Vec<Option<u32>> = select_in(*header, "th")?
        .into_iter()
        .map(|th| parse_term_months(&text_of(th)))
        .collect();

    let mut records = Vec::new();
    for pair in data.chunks_exact(2) {
        let rates = row_cells(pair[0], false)?;
        let aers = row_cells(pair[1], false)?;
        let Some(label) = rates.first() else {
            continue;
        };
        let payout = if label.contains("Nominal") {
            Some(PayoutSchedule::AtMaturity)
        } else {
            PayoutSchedule::from_label(label)
        };
        let Some(payout) = payout else {
            continue;
        };

        for (col, term) in terms.iter().enumerate().skip(1) {
            let Some(term) = *term else {
                continue;
            };
            if col >= rates.len() || col >= aers.len() {
                continue;
            }
            if let Some(rate) = parse_rate(&rates[col]) {
                records.push(inst.record(STANDARD, term, payout, rate, parse_rate(&aers[col])));
            }
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Hatton National Bank
// ---------------------------------------------------------------------------

const HNB_STEPS: &[BrowserStep] = &[
    BrowserStep::Click {
        selector: "nav.grid a, nav.grid button",
        text: Some("Fixed Deposits"),
    },
    BrowserStep::WaitVisible {
        selector: "h2",
        text: Some("Fixed Deposits Interest Rates"),
        timeout: Duration::from_secs(15),
    },
];

/// 見出し: 期間 | <支払いタイミング...> | AER
fn hnb(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(heading) = doc.find_with_text("h2", "Fixed Deposits Interest Rates")? else {
        return Ok(Vec::new());
    };
    let Some(table) = next_sibling_matching(heading, "table")? else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = select_in(table, "th")?.into_iter().map(text_of).collect();
    if headers.len() < 3 {
        return Ok(Vec::new());
    }
    let payouts: Vec<Option<PayoutSchedule>> = headers[1..headers.len() - 1]
        .iter()
        .map(|h| PayoutSchedule::from_label(h))
        .collect();

    let mut records = Vec::new();
    for row in body_rows(table)? {
        let cells = row_cells(row, false)?;
        let Some(term) = cells.first().and_then(|c| parse_term_months(c)) else {
            continue;
        };
        let aer = cells.last().and_then(|c| parse_rate(c));
        for (i, payout) in payouts.iter().enumerate() {
            let (Some(payout), Some(cell)) = (payout, cells.get(i + 1)) else {
                continue;
            };
            if let Some(rate) = parse_rate(cell) {
                records.push(inst.record(STANDARD, term, *payout, rate, aer));
            }
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// National Savings Bank
// ---------------------------------------------------------------------------

/// 1行 = 「内容 | - | 金利 | - | 支払い | 実効金利」
fn nsb(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(link) = doc.find_with_text("a", "Term Deposits")? else {
        return Ok(Vec::new());
    };
    let Some(card) = closest(link, "div.card")? else {
        return Ok(Vec::new());
    };
    let Some(table) = select_in(card, "table")?.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in body_rows(table)? {
        let cells = row_cells(row, false)?;
        if cells.len() != 6 || cells[0].contains("Endowment") {
            continue;
        }
        let (Some(term), Some(rate)) = (parse_term_months(&cells[0]), parse_rate(&cells[2])) else {
            continue;
        };
        let payout = if cells[4].contains("Maturity") {
            PayoutSchedule::AtMaturity
        } else {
            PayoutSchedule::Monthly
        };
        // 実効金利欄が空なら名目金利と同じ
        let aer = parse_rate(&cells[5]).unwrap_or(rate);
        records.push(inst.record(STANDARD, term, payout, rate, Some(aer)));
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Nations Trust Bank
// ---------------------------------------------------------------------------

/// 3列目以降の列 = 期間。各セルは「金利<br>AER」
///
/// 通貨列はグループ先頭行にしか無いので次の通貨まで引き継ぐ。LKRのみ対象。
fn ntb(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(heading) = doc.find_exact("div.section_heading", "Fixed Deposit Rates")? else {
        return Ok(Vec::new());
    };
    let Some(table) = doc.next_after(heading, "table")? else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = select_in(table, "thead th")?.into_iter().map(text_of).collect();
    let terms: Vec<Option<u32>> = headers.iter().skip(2).map(|h| parse_term_months(h)).collect();

    let mut records = Vec::new();
    let mut currency = String::new();
    for row in body_rows(table)? {
        let cells = row_cells(row, false)?;
        if cells.len() < 2 || cells.len() < headers.len() {
            continue;
        }
        if !cells[0].is_empty() {
            currency = cells[0].clone();
        }
        if currency != "LKR" {
            continue;
        }

        let payout = if cells[1].contains("Maturity") {
            PayoutSchedule::AtMaturity
        } else if cells[1].contains("Monthly") {
            PayoutSchedule::Monthly
        } else if cells[1].contains("Annually") {
            PayoutSchedule::Annually
        } else {
            continue;
        };

        for (cell, term) in cells[2..].iter().zip(&terms) {
            let (Some(term), Some((rate, aer))) = (term, parse_rate_and_aer(cell)) else {
                continue;
            };
            records.push(inst.record(STANDARD, *term, payout, rate, Some(aer.unwrap_or(rate))));
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// People's Bank
// ---------------------------------------------------------------------------

/// 期間 | 満期 | 毎月 | ...（列が増えても先頭3列だけ使う）
fn peoples(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(table) = doc.table_after_heading("h4", "Fixed deposits (Minimum deposit")? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in body_rows(table)? {
        let cells = row_cells(row, false)?;
        if cells.len() < 3 {
            continue;
        }
        let Some(term) = parse_term_months(&cells[0]) else {
            continue;
        };
        if let Some(rate) = parse_rate(&cells[1]) {
            records.push(inst.record(STANDARD, term, PayoutSchedule::AtMaturity, rate, None));
        }
        if let Some(rate) = parse_rate(&cells[2]) {
            records.push(inst.record(STANDARD, term, PayoutSchedule::Monthly, rate, None));
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Pan Asia Bank
// ---------------------------------------------------------------------------

const PAN_ASIA_STEPS: &[BrowserStep] = &[BrowserStep::WaitVisible {
    selector: "h2#cRate",
    text: None,
    timeout: Duration::from_secs(20),
}];

/// 列 = 期間。本文1行目が支払いタイミング、2行目が金利、3行目がAER
fn pan_asia(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    let Some(anchor) = doc.first("h2#cRate")? else {
        return Ok(Vec::new());
    };
    let Some(section) = anchor
        .parent()
        .and_then(|p| p.parent())
        .and_then(scraper::ElementRef::wrap)
    else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for table in select_in(section, "figure.wp-block-table table")? {
        let Some(header) = select_in(table, "thead tr")?.into_iter().next() else {
            continue;
        };
        let terms = row_cells(header, true)?;
        let rows = body_rows(table)?;
        if rows.len() < 3 {
            continue;
        }
        let payouts = row_cells(rows[0], true)?;
        let rates = row_cells(rows[1], true)?;
        let aers = row_cells(rows[2], true)?;

        for (i, term) in terms.iter().enumerate().skip(1) {
            let Some(term) = parse_term_months(term) else {
                continue;
            };
            let Some(payout) = payouts.get(i).and_then(|p| PayoutSchedule::from_label(p)) else {
                continue;
            };
            if let Some(rate) = rates.get(i).and_then(|r| parse_rate(r)) {
                let aer = aers.get(i).and_then(|a| parse_rate(a));
                records.push(inst.record(STANDARD, term, payout, rate, aer));
            }
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Sampath Bank
// ---------------------------------------------------------------------------

const SAMPATH_STEPS: &[BrowserStep] = &[
    BrowserStep::Pause(Duration::from_millis(500)),
    BrowserStep::Click {
        selector: "div.type-info-block-icon-outer",
        text: Some("Rates"),
    },
    BrowserStep::WaitVisible {
        selector: "p",
        text: Some("Normal Fixed Deposit"),
        timeout: Duration::from_secs(15),
    },
];

/// 期間 | 満期 | 毎月 | 毎年。各セルは「13.5% (AER 13.9%)」形式
fn sampath(doc: &Document, inst: &Institution) -> Result<Vec<RateRecord>, ExtractionError> {
    const PAYOUTS: [PayoutSchedule; 3] = [
        PayoutSchedule::AtMaturity,
        PayoutSchedule::Monthly,
        PayoutSchedule::Annually,
    ];

    let Some(heading) = doc.find_with_text("p", "Normal Fixed Deposit")? else {
        return Ok(Vec::new());
    };
    let Some(container) = closest(heading, "div.rates-info-heading")? else {
        return Ok(Vec::new());
    };
    let Some(table) = next_sibling_matching(container, "table")? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in body_rows(table)? {
        let cells = row_cells(row, false)?;
        if cells.len() < 4 || !cells[0].to_lowercase().contains("month") {
            continue;
        }
        let Some(term) = parse_term_months(&cells[0]) else {
            continue;
        };
        for (cell, payout) in cells[1..4].iter().zip(PAYOUTS) {
            if let Some((rate, aer)) = parse_rate_and_aer(cell) {
                records.push(inst.record("Normal", term, payout, rate, Some(aer.unwrap_or(rate))));
            }
        }
    }
    Ok(records)
}
