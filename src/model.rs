//! The shared data model (spec §3): `Transaction` and its satellites.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The direction/role a transaction plays, encoding sign in `transaction_type`
/// rather than in `amount` (amount is always non-negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
    OpeningBalance,
    ClosingBalance,
}

impl TransactionType {
    /// `+1` for credit/opening, `-1` for debit; closing balance rows are
    /// chain terminators and carry no signed-amount contribution.
    pub fn sign(self) -> i32 {
        match self {
            TransactionType::Credit | TransactionType::OpeningBalance => 1,
            TransactionType::Debit | TransactionType::ClosingBalance => -1,
        }
    }

    pub fn is_balance_marker(self) -> bool {
        matches!(
            self,
            TransactionType::OpeningBalance | TransactionType::ClosingBalance
        )
    }
}

/// A single normalized ledger line (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    /// `DD MMM`, uppercase month, or `None` for an undated sub-transaction
    /// (invariant 2).
    pub date: Option<String>,
    pub description: String,
    pub transaction_type: TransactionType,
    /// Always non-negative; sign is carried by `transaction_type`.
    #[schemars(with = "f64")]
    pub amount: Decimal,
    /// Signed running balance; `None` only when the source PDF omits it.
    #[schemars(with = "Option<f64>")]
    pub balance: Option<Decimal>,
    pub reference: Option<String>,
    pub counterparty: Option<String>,
    pub channel: Option<String>,
    pub category: Option<String>,
    pub is_cash: bool,
    pub is_cheque: bool,
    pub page_number: usize,
    pub currency: String,
    /// Monotonically non-decreasing partition key (invariant 3).
    pub account_section: u32,
}

impl Transaction {
    /// `+amount` for credit/opening, `-amount` for debit/closing — the
    /// quantity the balance-chain walk in §4.F.3 adds to the previous
    /// balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Credit | TransactionType::OpeningBalance => self.amount,
            TransactionType::Debit | TransactionType::ClosingBalance => -self.amount,
        }
    }
}

/// Account holder / statement header metadata (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AccountInfo {
    pub account_holder: Option<String>,
    pub bank: Option<String>,
    pub account_number: Option<String>,
    pub currency: Option<String>,
    pub statement_period: Option<String>,
    pub account_type: Option<String>,
}

/// Source of a bank identification decision (spec §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Vision,
    Product,
    Keyword,
}

/// Result of bank identification (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankLayout {
    pub bank: String,
    pub confidence: f32,
    pub source: DetectionSource,
}

/// Canonical column name in a discovered (or aliased) table/word-geometry
/// layout. Exactly the fixed set in spec §3/§6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    TransactionDate,
    ValueDate,
    Description,
    Counterparty,
    Cheque,
    Reference,
    Withdrawal,
    Deposit,
    Balance,
    /// A per-row currency-code column (spec §4.D.6 signal 3): its value
    /// changing mid-statement starts a new `account_section`.
    Currency,
}

/// A discovered column-to-x-interval mapping plus header y-band (spec §3).
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    pub columns: IndexMap<ColumnKind, crate::geometry::Interval>,
    pub header_y_min: f32,
    pub header_y_max: f32,
}

impl ColumnLayout {
    /// A layout is valid only if it has at least one amount column
    /// (withdrawal or deposit) AND a balance column (spec §3).
    pub fn is_valid(&self) -> bool {
        self.columns.contains_key(&ColumnKind::Balance)
            && (self.columns.contains_key(&ColumnKind::Withdrawal)
                || self.columns.contains_key(&ColumnKind::Deposit))
    }

    /// The column whose interval contains `x_mid`, if any.
    pub fn column_at(&self, x_mid: f32) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(_, iv)| iv.contains(x_mid))
            .map(|(k, _)| *k)
    }
}

/// A single balance-chain break (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainBreak {
    pub row_index: usize,
    pub account_section: u32,
    pub expected: Decimal,
    pub actual: Decimal,
}

/// Per-run (and, nested, per-section) balance-chain validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceChainReport {
    pub total_links: usize,
    pub valid_links: usize,
    pub invalid_links: usize,
    pub chain_accuracy_pct: f64,
    /// Up to 20 breaks, in source order.
    pub breaks: Vec<ChainBreak>,
    pub per_section: IndexMap<u32, SectionChainReport>,
}

/// Balance-chain outcome scoped to one `account_section`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionChainReport {
    pub total_links: usize,
    pub valid_links: usize,
    pub invalid_links: usize,
    pub chain_accuracy_pct: f64,
}

/// Overall accuracy score and its weighted breakdown (spec §4.F.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub overall_score: f64,
    pub grade: String,
    pub breakdown: IndexMap<String, f64>,
}

/// Per-currency slice of `StatementMetrics` (SPEC_FULL §3.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrencyMetrics {
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    pub max_balance: Option<Decimal>,
    pub min_balance: Option<Decimal>,
    pub avg_balance: Option<Decimal>,
    pub credit_count: usize,
    pub credit_sum: Decimal,
    pub debit_count: usize,
    pub debit_sum: Decimal,
    pub max_credit: Option<Decimal>,
    pub min_credit: Option<Decimal>,
    pub max_debit: Option<Decimal>,
    pub min_debit: Option<Decimal>,
    pub cash_deposit_count: usize,
    pub cash_deposit_sum: Decimal,
    pub cash_withdrawal_count: usize,
    pub cash_withdrawal_sum: Decimal,
    pub cheque_withdrawal_count: usize,
    pub cheque_withdrawal_sum: Decimal,
    pub total_fees: Decimal,
}

/// Computed ledger metrics (SPEC_FULL §3.1; named but not structurally
/// defined in spec §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementMetrics {
    #[serde(flatten)]
    pub overall: CurrencyMetrics,
    pub average_credit: Option<Decimal>,
    pub average_debit: Option<Decimal>,
    pub per_currency: IndexMap<String, CurrencyMetrics>,
}

/// Which extraction tier (or combination) ultimately produced the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Table,
    Words,
    Llm,
    LlmOcr,
}

/// A non-fatal event worth surfacing to the caller (SPEC_FULL §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionDiagnostic {
    pub stage: String,
    pub batch_index: Option<usize>,
    pub message: String,
}

/// The single structured output of the pipeline (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub bank: String,
    pub account_info: AccountInfo,
    pub transactions: Vec<Transaction>,
    pub metrics: StatementMetrics,
    pub accuracy: AccuracyReport,
    pub balance_chain: BalanceChainReport,
    pub extraction_method: ExtractionMethod,
    pub pages_processed: usize,
    pub currencies: Vec<String>,
    pub diagnostics: Vec<ExtractionDiagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signed_amount_follows_type() {
        let base = Transaction {
            date: Some("01 JAN".into()),
            description: "x".into(),
            transaction_type: TransactionType::Credit,
            amount: dec!(100.00),
            balance: None,
            reference: None,
            counterparty: None,
            channel: None,
            category: None,
            is_cash: false,
            is_cheque: false,
            page_number: 0,
            currency: "SGD".into(),
            account_section: 0,
        };
        assert_eq!(base.signed_amount(), dec!(100.00));
        let mut debit = base.clone();
        debit.transaction_type = TransactionType::Debit;
        assert_eq!(debit.signed_amount(), dec!(-100.00));
    }

    #[test]
    fn column_layout_requires_amount_and_balance() {
        let mut layout = ColumnLayout::default();
        layout
            .columns
            .insert(ColumnKind::Description, crate::geometry::Interval::new(0.0, 10.0));
        assert!(!layout.is_valid());
        layout
            .columns
            .insert(ColumnKind::Balance, crate::geometry::Interval::new(10.0, 20.0));
        assert!(!layout.is_valid());
        layout
            .columns
            .insert(ColumnKind::Deposit, crate::geometry::Interval::new(20.0, 30.0));
        assert!(layout.is_valid());
    }
}
