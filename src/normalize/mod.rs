//! Normalizer & Validator (spec §4.F): date/amount normalization, balance-
//! chain validation, accuracy scoring, enrichment, and statement metrics.
//! Runs unconditionally after any tier produces transactions.

pub mod accuracy;
pub mod amount;
pub mod balance_chain;
pub mod date;
pub mod enrich;
pub mod metrics;

use crate::model::{AccuracyReport, BalanceChainReport, StatementMetrics, Transaction};

/// Output of the normalizer/validator pass (spec §4.F), folded into
/// `ExtractionResult` by the pipeline.
pub struct NormalizedLedger {
    pub transactions: Vec<Transaction>,
    pub balance_chain: BalanceChainReport,
    pub accuracy: AccuracyReport,
    pub metrics: StatementMetrics,
}

/// Enrich every transaction, then validate the balance chain and score
/// accuracy over the result. Dates/amounts are normalized upstream (by
/// Tiers 1–3 themselves, per spec §4.F.1/.2) since each tier's raw cell
/// format differs; this pass operates on already-typed `Transaction`s.
/// `missing_amount` is the count of candidate rows a tier dropped or
/// defaulted for want of a usable amount (spec §4.F.4 amount completeness).
pub fn normalize(mut transactions: Vec<Transaction>, missing_amount: usize) -> NormalizedLedger {
    for txn in &mut transactions {
        enrich::enrich(txn);
    }
    let balance_chain = balance_chain::validate(&transactions);
    let accuracy = accuracy::score(&transactions, &balance_chain, missing_amount);
    let metrics = metrics::compute(&transactions);

    NormalizedLedger {
        transactions,
        balance_chain,
        accuracy,
        metrics,
    }
}
