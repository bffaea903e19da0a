//! Per-bank specializations (spec §4.D.4): HSBC's concatenated date
//! grammar and `DR`-suffixed balances, Aspire's dash-as-empty amounts.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::normalize::{amount::parse_amount, date::normalize_date};

lazy_static! {
    static ref HSBC_SUMMARY_STRIP: Regex =
        Regex::new(r"(?i)WITHDRAWALS\s+[\d,]+\.\d{2}DR\s+ASAT\s+\d{1,2}[A-Z]{3}\d{4}").unwrap();
}

/// Behavior that varies by issuing bank within the otherwise bank-agnostic
/// Tier-2 row assembler.
pub struct BankQuirks {
    bank: String,
}

impl BankQuirks {
    pub fn for_bank(bank: &str) -> Self {
        Self { bank: bank.to_string() }
    }

    fn is_hsbc(&self) -> bool {
        self.bank.eq_ignore_ascii_case("HSBC")
    }

    fn is_aspire(&self) -> bool {
        self.bank.eq_ignore_ascii_case("Aspire")
    }

    /// Strip per-page summary lines before row assembly sees them
    /// (HSBC: `WITHDRAWALS 305,465.02DR ASAT 31OCT2025`).
    pub fn strip_noise<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        if self.is_hsbc() {
            HSBC_SUMMARY_STRIP.replace_all(text, "")
        } else {
            std::borrow::Cow::Borrowed(text)
        }
    }

    /// Date parsing; HSBC's `DDMMMYYYY` grammar is already covered by the
    /// shared normalizer's concatenated-grammar branch, so this only
    /// exists as the seam future bank-specific grammars would extend.
    pub fn parse_date(&self, cell: &str) -> Option<String> {
        normalize_date(cell)
    }

    /// Balance-column parsing: HSBC allows a trailing `DR` to negate.
    pub fn parse_balance(&self, cell: &str) -> Option<Decimal> {
        parse_amount(cell, self.is_hsbc())
    }

    /// Amount-column (withdrawal/deposit) parsing: Aspire reads a bare `-`
    /// as empty rather than zero, which `parse_amount` already does
    /// unconditionally; this seam exists for banks that instead use `-`
    /// to mean a literal zero (none currently do, so behavior matches the
    /// shared default).
    pub fn parse_amount_cell(&self, cell: &str) -> Option<Decimal> {
        if self.is_aspire() && cell.trim() == "-" {
            return None;
        }
        parse_amount(cell, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn hsbc_allows_dr_suffix_on_balance() {
        let quirks = BankQuirks::for_bank("HSBC");
        assert_eq!(quirks.parse_balance("1,234.56DR"), Some(dec!(-1234.56)));
    }

    #[test]
    fn non_hsbc_rejects_dr_suffix() {
        let quirks = BankQuirks::for_bank("DBS");
        assert_eq!(quirks.parse_balance("1,234.56DR"), None);
    }

    #[test]
    fn aspire_dash_is_empty_not_zero() {
        let quirks = BankQuirks::for_bank("Aspire");
        assert_eq!(quirks.parse_amount_cell("-"), None);
    }

    #[test]
    fn hsbc_strips_page_summary() {
        let quirks = BankQuirks::for_bank("HSBC");
        let text = "row data WITHDRAWALS 305,465.02DR ASAT 31OCT2025 more text";
        let stripped = quirks.strip_noise(text);
        assert!(!stripped.contains("WITHDRAWALS"));
    }
}
