//! Noise stripping and page filtering (spec §4.E steps 2–3): per-bank
//! boilerplate removal, and skipping pages dominated by legend/T&C/rate-
//! schedule content with no transactional signal.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_PATTERN: Regex = Regex::new(r"\d{1,2}[-/\s][A-Za-z]{3}[-/\s]?\d{2,4}|\d{1,2}/\d{1,2}/\d{2,4}").unwrap();
    static ref CURRENCY_PATTERN: Regex = Regex::new(r"\d{1,3}(,\d{3})*\.\d{2}").unwrap();
    static ref LEGEND_PATTERN: Regex = Regex::new(r"(?i)(legend|abbreviations used|code\s+description)").unwrap();
    static ref TERMS_PATTERN: Regex = Regex::new(r"(?i)(terms and conditions|terms & conditions)").unwrap();
    static ref RATE_SCHEDULE_PATTERN: Regex = Regex::new(r"(?i)(interest rate schedule|prevailing interest rate)").unwrap();
}

const SKIP_DOMINANCE_THRESHOLD: f64 = 0.40;

/// Generic boilerplate stripped regardless of bank (page numbers,
/// "Page X of Y" footers).
lazy_static! {
    static ref PAGE_FOOTER: Regex = Regex::new(r"(?i)page\s+\d+\s+of\s+\d+").unwrap();
}

fn bank_noise_patterns(bank: &str) -> Vec<Regex> {
    match bank {
        "HSBC" => vec![
            Regex::new(r"(?i)HSBC Bank \(Singapore\) Limited.*?(Co\.|Reg\. No\.)").unwrap(),
        ],
        "DBS" | "POSB" => vec![Regex::new(r"(?i)DBS Bank Ltd.*?(Co\. Reg\.|UEN)").unwrap()],
        "OCBC" => vec![Regex::new(r"(?i)Oversea-Chinese Banking Corporation.*?(Co\. Reg\.)").unwrap()],
        _ => Vec::new(),
    }
}

/// Remove page footers and bank-specific boilerplate from `text`.
pub fn strip_noise(text: &str, bank: &str) -> String {
    let mut out = PAGE_FOOTER.replace_all(text, "").to_string();
    for pattern in bank_noise_patterns(bank) {
        out = pattern.replace_all(&out, "").to_string();
    }
    out
}

/// True when `text` should be skipped: a skip-pattern (legend/T&C/rate
/// schedule) region covers more than 40% of the text AND the page
/// contains neither a currency amount nor a date pattern.
pub fn should_skip_page(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let total_len = text.len().max(1);
    let skip_len: usize = [&*LEGEND_PATTERN, &*TERMS_PATTERN, &*RATE_SCHEDULE_PATTERN]
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str().len())
        .sum();
    let dominance = skip_len as f64 / total_len as f64;

    let has_currency = CURRENCY_PATTERN.is_match(text);
    let has_date = DATE_PATTERN.is_match(text);

    dominance > SKIP_DOMINANCE_THRESHOLD && !has_currency && !has_date
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_page_footer() {
        let stripped = strip_noise("Transaction list Page 2 of 5 more text", "DBS");
        assert!(!stripped.contains("Page 2 of 5"));
    }

    #[test]
    fn skips_legend_heavy_page_without_transactional_signal() {
        let text = "LEGEND: ".to_string() + &"A = Adjustment. ".repeat(30);
        assert!(should_skip_page(&text));
    }

    #[test]
    fn keeps_legend_heavy_page_with_dates_and_amounts() {
        let text = format!(
            "LEGEND: {} 01 DEC 2025 Payment 100.00",
            "A = Adjustment. ".repeat(30)
        );
        assert!(!should_skip_page(&text));
    }
}
