//! セル文字列の正規化（金利・期間）

use std::sync::LazyLock;

use regex::Regex;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern"));

static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*-?\s*(months?|mths?|years?|yrs?)\b").expect("term pattern")
});

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)").expect("leading integer pattern"));

/// 「値なし」を表すプレースホルダー
const PLACEHOLDERS: &[&str] = &["", "-", "–", "—", "n/a", "na"];

fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    PLACEHOLDERS.iter().any(|p| text.eq_ignore_ascii_case(p))
}

/// 最初の小数値を金利として取り出す（例: "14.5% p.a." -> 14.5）
///
/// プレースホルダーと0以下の値はNone。
pub fn parse_rate(text: &str) -> Option<f64> {
    if is_placeholder(text) {
        return None;
    }
    let rate: f64 = NUMBER.find(text)?.as_str().parse().ok()?;
    (rate > 0.0).then_some(rate)
}

/// 金利とAERが1セルに並ぶ形式（例: "13.5% (AER 13.9%)"）
pub fn parse_rate_and_aer(text: &str) -> Option<(f64, Option<f64>)> {
    if is_placeholder(text) {
        return None;
    }
    let mut numbers = NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| *v > 0.0);
    let rate = numbers.next()?;
    Some((rate, numbers.next()))
}

/// 期間を月数に変換する（"1 Year" -> 12, "6 Months" -> 6）
///
/// 単位の無い数値や日数、0はNone。
pub fn parse_term_months(text: &str) -> Option<u32> {
    let caps = TERM.captures(text)?;
    let value: u32 = caps[1].parse().ok()?;
    let unit = caps[2].to_ascii_lowercase();
    let months = if unit.starts_with('y') {
        value.checked_mul(12)?
    } else {
        value
    };
    (months > 0).then_some(months)
}

/// 先頭の整数（単位なしで月数を書くサイト用）
pub fn leading_integer(text: &str) -> Option<u32> {
    let value: u32 = LEADING_INT.captures(text)?[1].parse().ok()?;
    (value > 0).then_some(value)
}

/// 空白を1つにまとめてトリムする
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("14.5% p.a."), Some(14.5));
        assert_eq!(parse_rate(" 9% "), Some(9.0));
        assert_eq!(parse_rate("AER 13.92%"), Some(13.92));
        assert_eq!(parse_rate("-"), None);
        assert_eq!(parse_rate("–"), None);
        assert_eq!(parse_rate("—"), None);
        assert_eq!(parse_rate(""), None);
        assert_eq!(parse_rate("N/A"), None);
        assert_eq!(parse_rate("0%"), None);
        assert_eq!(parse_rate("0.00"), None);
        assert_eq!(parse_rate("call branch"), None);
    }

    #[test]
    fn test_parse_rate_and_aer() {
        assert_eq!(parse_rate_and_aer("13.5% (AER 13.9%)"), Some((13.5, Some(13.9))));
        assert_eq!(parse_rate_and_aer("11.00%"), Some((11.0, None)));
        assert_eq!(parse_rate_and_aer("-"), None);
    }

    #[test]
    fn test_parse_term_months() {
        assert_eq!(parse_term_months("1 Year"), Some(12));
        assert_eq!(parse_term_months("6 Months"), Some(6));
        assert_eq!(parse_term_months("3 YEARS"), Some(36));
        assert_eq!(parse_term_months("12months"), Some(12));
        assert_eq!(parse_term_months("Monthly - 24 Month"), Some(24));
        assert_eq!(parse_term_months("5 Yrs"), Some(60));
        assert_eq!(parse_term_months("Months"), None);
        assert_eq!(parse_term_months("12"), None);
        assert_eq!(parse_term_months("90 Days"), None);
        assert_eq!(parse_term_months("0 Months"), None);
        assert_eq!(parse_term_months(""), None);
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer(" 24 "), Some(24));
        assert_eq!(leading_integer("60 (5 yrs)"), Some(60));
        assert_eq!(leading_integer("Period"), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Senior\n   Citizen "), "Senior Citizen");
    }
}
