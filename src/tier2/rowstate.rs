//! Row-assembly state machine (spec §4.D.3): IDLE / IN_TXN / PAST_CLOSING,
//! driven by one event per y-band, top-to-bottom on each page.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::model::{Transaction, TransactionType};
use crate::normalize::{amount::parse_amount, date::normalize_date};
use crate::tier2::assign::BandRow;
use crate::tier2::quirks::BankQuirks;
use crate::model::ColumnKind;

lazy_static! {
    static ref CARRIED_FORWARD: Regex = Regex::new(r"(?i)BALANCE\s*CARRIED\s*FORWARD").unwrap();
    static ref BROUGHT_FORWARD: Regex = Regex::new(r"(?i)BALANCE\s*BROUGHT\s*FORWARD").unwrap();
    static ref SUMMARY_ROW: Regex = Regex::new(r"(?i)\b(TOTAL|END OF STATEMENT|AS\s*AT)\b").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InTxn,
    PastClosing,
}

/// Drives the row-assembly state machine across a sequence of already
/// column-assigned bands (in page/y order), emitting `Transaction`s.
pub struct RowAssembler<'a> {
    state: State,
    current: Option<Transaction>,
    out: Vec<Transaction>,
    quirks: &'a BankQuirks,
    currency: String,
    account_section: u32,
    last_date: Option<String>,
}

impl<'a> RowAssembler<'a> {
    pub fn new(quirks: &'a BankQuirks, currency: String) -> Self {
        Self {
            state: State::Idle,
            current: None,
            out: Vec::new(),
            quirks,
            currency,
            account_section: 0,
            last_date: None,
        }
    }

    pub fn account_section(&self) -> u32 {
        self.account_section
    }

    pub fn set_account_section(&mut self, section: u32) {
        self.account_section = section;
    }

    /// Prepend transactions already emitted by a predecessor assembler
    /// (used when a currency-section boundary forces a fresh assembler).
    pub fn absorb_emitted(&mut self, mut emitted: Vec<Transaction>) {
        emitted.append(&mut self.out);
        self.out = emitted;
    }

    pub fn feed(&mut self, row: &BandRow, page: usize) {
        let description_text = row.get(&ColumnKind::Description).cloned().unwrap_or_default();
        let joined: String = row.values().cloned().collect::<Vec<_>>().join(" ");
        let concatenated = joined.replace([' ', '\t'], "");

        if CARRIED_FORWARD.is_match(&joined) || CARRIED_FORWARD.is_match(&concatenated) {
            self.handle_carried_forward(row, page);
            return;
        }
        if BROUGHT_FORWARD.is_match(&joined) || BROUGHT_FORWARD.is_match(&concatenated) {
            self.handle_brought_forward(row, page);
            return;
        }
        if SUMMARY_ROW.is_match(&joined) {
            if self.state == State::InTxn {
                self.flush();
                self.state = State::Idle;
            }
            return;
        }
        if self.state == State::PastClosing {
            return;
        }

        let date = row
            .get(&ColumnKind::TransactionDate)
            .and_then(|d| self.quirks.parse_date(d));
        let amount = self.extract_amount(row);
        let balance = row.get(&ColumnKind::Balance).and_then(|b| self.quirks.parse_balance(b));

        match (&date, amount) {
            (Some(d), Some((ty, amt))) => {
                self.flush();
                self.last_date = Some(d.clone());
                self.current = Some(self.new_transaction(Some(d.clone()), description_text, ty, amt, balance, page));
            }
            (None, Some((ty, amt))) if self.state == State::InTxn => {
                let differs_balance = self
                    .current
                    .as_ref()
                    .and_then(|t| t.balance)
                    .zip(balance)
                    .map(|(curr, new)| curr != new)
                    .unwrap_or(false);
                if differs_balance {
                    self.flush();
                    self.current = Some(self.new_transaction(
                        self.last_date.clone(),
                        description_text,
                        ty,
                        amt,
                        balance,
                        page,
                    ));
                } else if let Some(current) = self.current.as_mut() {
                    if current.balance.is_none() {
                        current.balance = balance;
                    }
                }
            }
            (None, None) if self.state == State::InTxn && !description_text.trim().is_empty() => {
                if let Some(current) = self.current.as_mut() {
                    if !current.description.is_empty() {
                        current.description.push(' ');
                    }
                    current.description.push_str(description_text.trim());
                }
            }
            _ => {}
        }

        if self.state == State::Idle && self.current.is_some() {
            self.state = State::InTxn;
        }
    }

    fn extract_amount(&self, row: &BandRow) -> Option<(TransactionType, Decimal)> {
        if let Some(cell) = row.get(&ColumnKind::Withdrawal) {
            if let Some(v) = self.quirks.parse_amount_cell(cell) {
                if !v.is_zero() {
                    return Some((TransactionType::Debit, v));
                }
            }
        }
        if let Some(cell) = row.get(&ColumnKind::Deposit) {
            if let Some(v) = self.quirks.parse_amount_cell(cell) {
                if !v.is_zero() {
                    return Some((TransactionType::Credit, v));
                }
            }
        }
        None
    }

    fn handle_carried_forward(&mut self, row: &BandRow, page: usize) {
        let balance = row.get(&ColumnKind::Balance).and_then(|b| self.quirks.parse_balance(b));
        self.flush();
        if let Some(balance) = balance {
            self.out.push(self.new_transaction(
                self.last_date.clone(),
                "BALANCE CARRIED FORWARD".to_string(),
                TransactionType::ClosingBalance,
                balance,
                Some(balance),
                page,
            ));
        }
        self.state = State::PastClosing;
    }

    fn handle_brought_forward(&mut self, row: &BandRow, page: usize) {
        let balance = row.get(&ColumnKind::Balance).and_then(|b| self.quirks.parse_balance(b));
        let was_past_closing = self.state == State::PastClosing;
        self.flush();
        if was_past_closing {
            self.account_section += 1;
        }
        if let Some(balance) = balance {
            let date = row.get(&ColumnKind::TransactionDate).and_then(|d| self.quirks.parse_date(d));
            if date.is_some() {
                self.last_date = date.clone();
            }
            self.out.push(self.new_transaction(
                date.or_else(|| self.last_date.clone()),
                "BALANCE BROUGHT FORWARD".to_string(),
                TransactionType::OpeningBalance,
                balance,
                Some(balance),
                page,
            ));
        }
        self.state = State::InTxn;
    }

    fn new_transaction(
        &self,
        date: Option<String>,
        description: String,
        transaction_type: TransactionType,
        amount: Decimal,
        balance: Option<Decimal>,
        page: usize,
    ) -> Transaction {
        Transaction {
            date,
            description: description.trim().to_string(),
            transaction_type,
            amount,
            balance,
            reference: None,
            counterparty: None,
            channel: None,
            category: None,
            is_cash: false,
            is_cheque: false,
            page_number: page,
            currency: self.currency.clone(),
            account_section: self.account_section,
        }
    }

    pub fn flush(&mut self) {
        if let Some(txn) = self.current.take() {
            self.out.push(txn);
        }
    }

    pub fn finish(mut self) -> Vec<Transaction> {
        self.flush();
        self.out
    }
}

/// Best-effort date normalization reused directly; kept as a free function
/// so quirks modules (HSBC's `DDMMMYYYY`) can fall back to it.
pub fn default_parse_date(cell: &str) -> Option<String> {
    normalize_date(cell)
}

pub fn default_parse_amount(cell: &str, allow_dr: bool) -> Option<Decimal> {
    parse_amount(cell, allow_dr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(pairs: &[(ColumnKind, &str)]) -> BandRow {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn date_and_amount_opens_a_transaction() {
        let quirks = BankQuirks::for_bank("DBS");
        let mut assembler = RowAssembler::new(&quirks, "SGD".into());
        assembler.feed(
            &row(&[
                (ColumnKind::TransactionDate, "01 DEC 2025"),
                (ColumnKind::Description, "Payment to ABC"),
                (ColumnKind::Withdrawal, "100.00"),
                (ColumnKind::Balance, "900.00"),
            ]),
            0,
        );
        let txns = assembler.finish();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].transaction_type, TransactionType::Debit);
        assert_eq!(txns[0].amount, dec!(100.00));
    }

    #[test]
    fn text_only_row_appends_to_description() {
        let quirks = BankQuirks::for_bank("DBS");
        let mut assembler = RowAssembler::new(&quirks, "SGD".into());
        assembler.feed(
            &row(&[
                (ColumnKind::TransactionDate, "01 DEC 2025"),
                (ColumnKind::Description, "Payment to"),
                (ColumnKind::Withdrawal, "100.00"),
                (ColumnKind::Balance, "900.00"),
            ]),
            0,
        );
        assembler.feed(&row(&[(ColumnKind::Description, "ABC Pte Ltd")]), 0);
        let txns = assembler.finish();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "Payment to ABC Pte Ltd");
    }

    #[test]
    fn carried_then_brought_forward_increments_section_exactly_once() {
        let quirks = BankQuirks::for_bank("DBS");
        let mut assembler = RowAssembler::new(&quirks, "SGD".into());
        assembler.feed(
            &row(&[
                (ColumnKind::TransactionDate, "01 DEC 2025"),
                (ColumnKind::Description, "Payment"),
                (ColumnKind::Withdrawal, "100.00"),
                (ColumnKind::Balance, "900.00"),
            ]),
            0,
        );
        assembler.feed(
            &row(&[(ColumnKind::Description, "BALANCE CARRIED FORWARD"), (ColumnKind::Balance, "900.00")]),
            0,
        );
        assembler.feed(
            &row(&[(ColumnKind::Description, "BALANCE BROUGHT FORWARD"), (ColumnKind::Balance, "900.00")]),
            1,
        );
        assert_eq!(assembler.account_section(), 1);
        let txns = assembler.finish();
        assert!(txns
            .iter()
            .any(|t| t.transaction_type == TransactionType::ClosingBalance && t.account_section == 0));
        assert!(txns
            .iter()
            .any(|t| t.transaction_type == TransactionType::OpeningBalance && t.account_section == 1));
    }

    #[test]
    fn summary_row_closes_current_transaction_without_emitting_new_one() {
        let quirks = BankQuirks::for_bank("DBS");
        let mut assembler = RowAssembler::new(&quirks, "SGD".into());
        assembler.feed(
            &row(&[
                (ColumnKind::TransactionDate, "01 DEC 2025"),
                (ColumnKind::Description, "Payment"),
                (ColumnKind::Withdrawal, "100.00"),
                (ColumnKind::Balance, "900.00"),
            ]),
            0,
        );
        assembler.feed(&row(&[(ColumnKind::Description, "TOTAL")]), 0);
        let txns = assembler.finish();
        assert_eq!(txns.len(), 1);
    }
}
