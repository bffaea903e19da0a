//! Currency-section segmentation (spec §4.D.6): any of three signals
//! starts a new `account_section` and updates the active currency.

use lazy_static::lazy_static;
use regex::Regex;

const ISO_CODES: &[&str] = &[
    "SGD", "USD", "EUR", "GBP", "CNY", "JPY", "AUD", "HKD", "MYR", "IDR", "THB", "PHP", "INR", "KRW", "NZD", "CHF",
    "CAD", "TWD", "VND",
];

lazy_static! {
    static ref STANDALONE_CODE: Regex =
        Regex::new(&format!(r"^\s*({})\s*$", ISO_CODES.join("|"))).unwrap();
}

/// Returns the ISO code if `line` is a standalone currency-code line
/// (signal 1).
pub fn standalone_currency_code(line: &str) -> Option<&'static str> {
    let caps = STANDALONE_CODE.captures(line.trim())?;
    let matched = caps.get(1)?.as_str();
    ISO_CODES.iter().find(|&&c| c.eq_ignore_ascii_case(matched)).copied()
}

/// Returns the ISO code if `cell` (a discovered `ColumnKind::Currency` cell
/// value) names one of the known currencies (signal 3: "a run of
/// transactions whose discovered currency column value changes").
pub fn column_currency_code(cell: &str) -> Option<&'static str> {
    let cleaned = cell.trim();
    ISO_CODES.iter().find(|&&c| c.eq_ignore_ascii_case(cleaned)).copied()
}
