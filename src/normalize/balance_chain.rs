//! Balance-chain validation (spec §4.F.3): per-`account_section` walk of
//! consecutive transactions checking `balance[i-1] + signed_amount(i) == balance[i]`.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{BalanceChainReport, ChainBreak, SectionChainReport, Transaction};

const TOLERANCE: Decimal = dec!(0.02);
const MAX_BREAKS: usize = 20;

/// Validate the balance chain across `transactions`, which must already be
/// in source (post §4.D.5 reversal) order.
pub fn validate(transactions: &[Transaction]) -> BalanceChainReport {
    let mut per_section: IndexMap<u32, SectionChainReport> = IndexMap::new();
    let mut breaks = Vec::new();
    let mut total_links = 0usize;
    let mut valid_links = 0usize;

    let mut sections: IndexMap<u32, Vec<usize>> = IndexMap::new();
    for (idx, txn) in transactions.iter().enumerate() {
        sections.entry(txn.account_section).or_default().push(idx);
    }

    for (section, indices) in &sections {
        let mut section_total = 0usize;
        let mut section_valid = 0usize;
        let mut prev: Option<usize> = None;

        for &idx in indices {
            let txn = &transactions[idx];
            if txn.transaction_type.is_balance_marker() || txn.balance.is_none() {
                prev = None;
                continue;
            }
            if let Some(prev_idx) = prev {
                let prev_txn = &transactions[prev_idx];
                if let (Some(prev_balance), Some(curr_balance)) = (prev_txn.balance, txn.balance) {
                    let expected = prev_balance + txn.signed_amount();
                    let diff = (expected - curr_balance).abs();
                    section_total += 1;
                    if diff <= TOLERANCE {
                        section_valid += 1;
                    } else {
                        log::warn!(
                            "balance_chain: break at row {idx} (section {section}): expected {expected}, actual {curr_balance}"
                        );
                        if breaks.len() < MAX_BREAKS {
                            breaks.push(ChainBreak {
                                row_index: idx,
                                account_section: *section,
                                expected,
                                actual: curr_balance,
                            });
                        }
                    }
                }
            }
            prev = Some(idx);
        }

        total_links += section_total;
        valid_links += section_valid;
        per_section.insert(
            *section,
            SectionChainReport {
                total_links: section_total,
                valid_links: section_valid,
                invalid_links: section_total - section_valid,
                chain_accuracy_pct: pct(section_valid, section_total),
            },
        );
    }

    BalanceChainReport {
        total_links,
        valid_links,
        invalid_links: total_links - valid_links,
        chain_accuracy_pct: pct(valid_links, total_links),
        breaks,
        per_section,
    }
}

fn pct(valid: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        (valid as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;

    fn txn(balance: Option<Decimal>, amount: Decimal, ty: TransactionType, section: u32) -> Transaction {
        Transaction {
            date: Some("01 JAN".into()),
            description: "x".into(),
            transaction_type: ty,
            amount,
            balance,
            reference: None,
            counterparty: None,
            channel: None,
            category: None,
            is_cash: false,
            is_cheque: false,
            page_number: 0,
            currency: "SGD".into(),
            account_section: section,
        }
    }

    #[test]
    fn valid_chain_scores_100() {
        let txns = vec![
            txn(Some(dec!(100.00)), dec!(100.00), TransactionType::OpeningBalance, 0),
            txn(Some(dec!(150.00)), dec!(50.00), TransactionType::Credit, 0),
            txn(Some(dec!(120.00)), dec!(30.00), TransactionType::Debit, 0),
        ];
        let report = validate(&txns);
        assert_eq!(report.chain_accuracy_pct, 100.0);
        assert!(report.breaks.is_empty());
    }

    #[test]
    fn broken_link_is_recorded() {
        let txns = vec![
            txn(Some(dec!(100.00)), dec!(100.00), TransactionType::Credit, 0),
            txn(Some(dec!(300.00)), dec!(50.00), TransactionType::Credit, 0),
        ];
        let report = validate(&txns);
        assert_eq!(report.invalid_links, 1);
        assert_eq!(report.breaks.len(), 1);
        assert_eq!(report.breaks[0].expected, dec!(150.00));
    }

    #[test]
    fn sections_are_isolated() {
        let txns = vec![
            txn(Some(dec!(100.00)), dec!(100.00), TransactionType::OpeningBalance, 0),
            txn(Some(dec!(9999.00)), dec!(50.00), TransactionType::Credit, 1),
        ];
        let report = validate(&txns);
        assert_eq!(report.total_links, 0);
        assert_eq!(report.per_section.len(), 2);
    }
}
