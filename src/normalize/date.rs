//! Date normalization (spec §4.F.1): five input grammars → canonical
//! `DD MMM`, uppercase month, zero-padded day.

use lazy_static::lazy_static;
use regex::Regex;

const MONTHS: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

lazy_static! {
    static ref DASHED: Regex = Regex::new(r"(?i)^(\d{1,2})-([A-Za-z]{3})-(\d{4})$").unwrap();
    static ref SPACED: Regex = Regex::new(r"(?i)^(\d{1,2})\s+([A-Za-z]{3})\s+(\d{4})$").unwrap();
    static ref SLASHED: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$").unwrap();
    static ref CONCAT: Regex = Regex::new(r"(?i)^(\d{1,2})([A-Za-z]{3})(\d{4})$").unwrap();
    static ref CANONICAL: Regex = Regex::new(r"(?i)^(\d{1,2})\s+([A-Za-z]{3})$").unwrap();
}

/// Normalize a date string to `DD MMM`, or `None` if it matches none of the
/// five grammars in spec §4.F.1.
pub fn normalize_date(input: &str) -> Option<String> {
    let trimmed = input.trim();

    if let Some(caps) = DASHED.captures(trimmed) {
        return build(&caps[1], &caps[2]);
    }
    if let Some(caps) = SPACED.captures(trimmed) {
        return build(&caps[1], &caps[2]);
    }
    if let Some(caps) = SLASHED.captures(trimmed) {
        let month_num: u32 = caps[2].parse().ok()?;
        if !(1..=12).contains(&month_num) {
            return None;
        }
        return build_numeric(&caps[1], month_num);
    }
    if let Some(caps) = CONCAT.captures(trimmed) {
        return build(&caps[1], &caps[2]);
    }
    if let Some(caps) = CANONICAL.captures(trimmed) {
        return build(&caps[1], &caps[2]);
    }
    None
}

fn build(day: &str, month: &str) -> Option<String> {
    let day_num: u32 = day.parse().ok()?;
    if !(1..=31).contains(&day_num) {
        return None;
    }
    let month_upper = month.to_uppercase();
    if !MONTHS.contains(&month_upper.as_str()) {
        return None;
    }
    Some(format!("{day_num:02} {month_upper}"))
}

fn build_numeric(day: &str, month_num: u32) -> Option<String> {
    let day_num: u32 = day.parse().ok()?;
    if !(1..=31).contains(&day_num) {
        return None;
    }
    let month = MONTHS[(month_num - 1) as usize];
    Some(format!("{day_num:02} {month}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dashed_grammar() {
        assert_eq!(normalize_date("01-Sep-2025").as_deref(), Some("01 SEP"));
    }

    #[test]
    fn normalizes_spaced_grammar() {
        assert_eq!(normalize_date("01 DEC 2025").as_deref(), Some("01 DEC"));
    }

    #[test]
    fn normalizes_slashed_grammar() {
        assert_eq!(normalize_date("01/12/2025").as_deref(), Some("01 DEC"));
        assert_eq!(normalize_date("01/12/25").as_deref(), Some("01 DEC"));
    }

    #[test]
    fn normalizes_concatenated_grammar() {
        assert_eq!(normalize_date("30SEP2025").as_deref(), Some("30 SEP"));
    }

    #[test]
    fn already_canonical_passes_through() {
        assert_eq!(normalize_date("01 DEC").as_deref(), Some("01 DEC"));
    }

    #[test]
    fn unparseable_yields_none() {
        assert_eq!(normalize_date("not a date"), None);
    }

    #[test]
    fn idempotent_round_trip() {
        for input in ["01-Sep-2025", "01 DEC 2025", "01/12/2025", "30SEP2025", "01 DEC"] {
            let once = normalize_date(input).unwrap();
            let twice = normalize_date(&once).unwrap();
            assert_eq!(once, twice);
        }
    }
}
