//! Amount parsing (spec §4.F.2): comma-stripping, parentheses-as-negation,
//! bare `-` as empty, optional trailing `DR` suffix in word-geometry mode.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a single amount cell. Returns `None` for a bare dash (Aspire
/// convention: absence, not zero) or unparseable text.
///
/// `allow_dr` should be true only for balance-column cells in word-geometry
/// mode (spec §4.D.4): a trailing `DR` negates the value.
pub fn parse_amount(raw: &str, allow_dr: bool) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    let mut body = trimmed.replace(',', "");
    let mut negate_dr = false;
    if allow_dr {
        let upper = body.to_uppercase();
        if let Some(stripped) = upper.strip_suffix("DR") {
            body = stripped.trim_end().to_string();
            negate_dr = true;
        } else if let Some(stripped) = upper.strip_suffix("CR") {
            body = stripped.trim_end().to_string();
        }
    }

    let mut negate_paren = false;
    if body.starts_with('(') && body.ends_with(')') {
        negate_paren = true;
        body = body[1..body.len() - 1].to_string();
    }

    let value = Decimal::from_str(body.trim()).ok()?;
    let signed = if negate_paren || negate_dr { -value } else { value };
    Some(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn strips_thousands_commas() {
        assert_eq!(parse_amount("1,234.56", false), Some(dec!(1234.56)));
    }

    #[test]
    fn parens_negate() {
        assert_eq!(parse_amount("(100.00)", false), Some(dec!(-100.00)));
    }

    #[test]
    fn bare_dash_is_empty() {
        assert_eq!(parse_amount("-", false), None);
    }

    #[test]
    fn dr_suffix_negates_when_allowed() {
        assert_eq!(parse_amount("1,234.56DR", true), Some(dec!(-1234.56)));
        assert_eq!(parse_amount("1,234.56DR", false), None);
    }

    #[test]
    fn cr_suffix_stays_positive() {
        assert_eq!(parse_amount("1,234.56CR", true), Some(dec!(1234.56)));
    }

    #[test]
    fn round_trips_two_decimal_grid() {
        for cents in [0i64, 1, 50, 99, 100, 123456] {
            let value = Decimal::new(cents, 2);
            let formatted = format_with_commas(value);
            assert_eq!(parse_amount(&formatted, false), Some(value));
        }
    }

    fn format_with_commas(value: Decimal) -> String {
        let s = format!("{:.2}", value);
        let (int_part, frac_part) = s.split_once('.').unwrap();
        let negative = int_part.starts_with('-');
        let digits = int_part.trim_start_matches('-');
        let mut grouped = String::new();
        for (i, c) in digits.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let grouped: String = grouped.chars().rev().collect();
        format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
    }
}
