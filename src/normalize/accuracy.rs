//! Accuracy scoring (spec §4.F.4): a weighted composite in [0,100].

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;

use crate::model::{AccuracyReport, BalanceChainReport, Transaction, TransactionType};

const W_CHAIN: f64 = 0.40;
const W_OPEN_CLOSE: f64 = 0.20;
const W_EQUATION: f64 = 0.20;
const W_AMOUNT: f64 = 0.10;
const W_BALANCE: f64 = 0.10;

/// `missing_amount` counts candidate rows a tier dropped or defaulted for
/// want of a usable amount (only Tier-3 can produce this — Tiers 1–2 never
/// construct a `Transaction` without a parsed non-zero amount in the first
/// place).
pub fn score(transactions: &[Transaction], chain: &BalanceChainReport, missing_amount: usize) -> AccuracyReport {
    let mut breakdown = IndexMap::new();

    let chain_component = chain.chain_accuracy_pct.clamp(0.0, 100.0);
    breakdown.insert("balance_chain_continuity".to_string(), chain_component);

    let has_opening = transactions
        .iter()
        .any(|t| t.transaction_type == TransactionType::OpeningBalance);
    let has_closing = transactions
        .iter()
        .any(|t| t.transaction_type == TransactionType::ClosingBalance);
    let open_close_component = match (has_opening, has_closing) {
        (true, true) => 100.0,
        (true, false) | (false, true) => 50.0,
        (false, false) => 0.0,
    };
    breakdown.insert("opening_closing_presence".to_string(), open_close_component);

    let equation_component = if chain_component >= 99.9 {
        100.0
    } else {
        accounting_equation_component(transactions)
    };
    breakdown.insert("accounting_equation".to_string(), equation_component);

    let total = transactions.len();
    let candidate_total = total + missing_amount;
    let pct_missing_amount = if candidate_total == 0 {
        0.0
    } else {
        (missing_amount as f64 / candidate_total as f64) * 100.0
    };
    let amount_component = (100.0 - 5.0 * pct_missing_amount).max(0.0);
    breakdown.insert("amount_completeness".to_string(), amount_component);

    let null_balance = transactions.iter().filter(|t| t.balance.is_none()).count();
    let pct_null_balance = if total == 0 { 0.0 } else { (null_balance as f64 / total as f64) * 100.0 };
    let balance_component = (100.0 - 5.0 * pct_null_balance).max(0.0);
    breakdown.insert("balance_completeness".to_string(), balance_component);

    let overall_score = (chain_component * W_CHAIN
        + open_close_component * W_OPEN_CLOSE
        + equation_component * W_EQUATION
        + amount_component * W_AMOUNT
        + balance_component * W_BALANCE)
        .clamp(0.0, 100.0);

    AccuracyReport {
        overall_score,
        grade: grade_for(overall_score),
        breakdown,
    }
}

fn accounting_equation_component(transactions: &[Transaction]) -> f64 {
    let opening = transactions
        .iter()
        .find(|t| t.transaction_type == TransactionType::OpeningBalance)
        .and_then(|t| t.balance)
        .and_then(|b| b.to_f64())
        .unwrap_or(0.0);
    let closing = transactions
        .iter()
        .find(|t| t.transaction_type == TransactionType::ClosingBalance)
        .and_then(|t| t.balance)
        .and_then(|b| b.to_f64())
        .unwrap_or(0.0);

    let credits: f64 = transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Credit)
        .filter_map(|t| t.amount.to_f64())
        .sum();
    let debits: f64 = transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Debit)
        .filter_map(|t| t.amount.to_f64())
        .sum();

    let diff = (opening + credits - debits - closing).abs();
    let threshold = 0.05 * closing.abs();
    if threshold == 0.0 {
        if diff == 0.0 {
            100.0
        } else {
            0.0
        }
    } else if diff <= threshold {
        100.0
    } else {
        (100.0 * (1.0 - (diff - threshold) / threshold)).max(0.0)
    }
}

fn grade_for(score: f64) -> String {
    if score >= 95.0 {
        "A+"
    } else if score >= 90.0 {
        "A"
    } else if score >= 80.0 {
        "B"
    } else if score >= 70.0 {
        "C"
    } else if score >= 50.0 {
        "D"
    } else {
        "F"
    }
    .to_string()
}
