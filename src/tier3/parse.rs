//! LLM output parsing and deduplication (spec §4.E steps 5–6).

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::model::{Transaction, TransactionType};
use crate::normalize::date::normalize_date;

/// Wire shape requested from the chat model (spec §6 "a JSON array of
/// transaction records conforming to the §3 schema"). Every field carries
/// `#[serde(default)]` (SPEC_FULL §9: "every field absent on the wire
/// adopts its default") so one malformed/sparse element doesn't fail
/// deserialization of the whole batch; `to_transaction` then applies the
/// grammar/sign rejection per element.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LlmTransaction {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub transaction_type: String,
    /// `None` when the model omitted the field entirely, distinct from an
    /// explicit `0` — this is what lets the Normalizer count genuinely
    /// missing amounts rather than a disguised zero.
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

/// JSON schema document describing the expected batch response, generated
/// once and reused in every prompt (spec §4.E step 5).
pub fn response_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Vec<LlmTransaction>)).unwrap_or_default()
}

/// Parse one batch's raw model response into `Transaction`s tagged with
/// `page` and `currency`, plus a count of rows accepted despite a missing
/// amount on the wire. An unparseable response is a batch-level failure
/// (spec §4.E "Failure modes"); an individual row that fails the grammar
/// (unrecognized `type`) or the §3 sign constraint (negative amount) is
/// dropped without failing the rest of the batch (SPEC_FULL §9).
pub fn parse_batch(raw: &str, page: usize, currency: &str) -> Result<(Vec<Transaction>, usize)> {
    let json_slice = extract_json_array(raw).unwrap_or(raw);
    let parsed: Vec<LlmTransaction> =
        serde_json::from_str(json_slice).map_err(|e| Error::SchemaMismatch(e.to_string()))?;

    let mut missing_amount = 0usize;
    let transactions = parsed
        .into_iter()
        .filter_map(|item| to_transaction(item, page, currency))
        .map(|(txn, was_missing)| {
            if was_missing {
                missing_amount += 1;
            }
            txn
        })
        .collect();
    Ok((transactions, missing_amount))
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

/// Returns `(Transaction, missing_amount)`; `missing_amount` is `true` when
/// the row was accepted with a defaulted (zero) amount rather than one the
/// model actually reported — the accuracy scorer counts this separately
/// from a genuine zero-value transaction (spec §4.F.4).
fn to_transaction(item: LlmTransaction, page: usize, currency: &str) -> Option<(Transaction, bool)> {
    let transaction_type = match item.transaction_type.to_lowercase().as_str() {
        "credit" => TransactionType::Credit,
        "debit" => TransactionType::Debit,
        "opening_balance" | "opening balance" => TransactionType::OpeningBalance,
        "closing_balance" | "closing balance" => TransactionType::ClosingBalance,
        _ => return None,
    };
    let date = item.date.as_deref().and_then(normalize_date);
    // Balance markers report their own value as `amount` and `balance`
    // alike (tier1/tier2 construct them the same way); fall back to the
    // reported balance before treating the amount as genuinely missing.
    let reported_amount = match (transaction_type, item.amount) {
        (_, Some(amount)) => Some(amount),
        (TransactionType::OpeningBalance | TransactionType::ClosingBalance, None) => item.balance,
        (_, None) => None,
    };
    let missing_amount = reported_amount.is_none();
    let amount = reported_amount.unwrap_or_default();
    if amount.is_sign_negative() {
        return None;
    }
    Some((
        Transaction {
            date,
            description: item.description,
            transaction_type,
            amount,
            balance: item.balance,
            reference: item.reference,
            counterparty: item.counterparty,
            channel: item.channel,
            category: None,
            is_cash: false,
            is_cheque: false,
            page_number: page,
            currency: currency.to_string(),
            account_section: 0,
        },
        missing_amount,
    ))
}

fn exact_key(t: &Transaction) -> String {
    let desc_prefix: String = t.description.chars().take(60).collect();
    format!(
        "{}|{}|{:.2}|{}|{:?}",
        t.date.clone().unwrap_or_default(),
        desc_prefix,
        t.amount,
        t.balance.map(|b| format!("{b:.2}")).unwrap_or_default(),
        t.transaction_type
    )
}

fn fuzzy_key(t: &Transaction) -> String {
    format!(
        "{}|{}|{:?}|{:.2}",
        t.date.clone().unwrap_or_default(),
        t.balance.map(|b| format!("{b:.2}")).unwrap_or_default(),
        t.transaction_type,
        t.amount
    )
}

/// Two-pass dedup (spec §4.E step 6): exact key first, then a fuzzy key on
/// balance to catch descriptions mis-rendered differently across
/// overlapping batches. Preserves first-seen order.
pub fn dedup(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen_exact = HashSet::new();
    let pass1: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| seen_exact.insert(exact_key(t)))
        .collect();

    let mut seen_fuzzy = HashSet::new();
    pass1.into_iter().filter(|t| seen_fuzzy.insert(fuzzy_key(t))).collect()
}
