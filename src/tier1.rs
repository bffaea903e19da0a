//! Tier-1 Table Extractor (spec §4.C): ruled tables, headers canonicalized
//! via a fixed alias map. First tier tried; short-circuits §4.D/§4.E when
//! it yields ≥3 transactions (spec §4.D.7's abandonment threshold applies
//! symmetrically here per SPEC_FULL §9).

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::model::{AccountInfo, Transaction, TransactionType};
use crate::normalize::{amount::parse_amount, date::normalize_date};
use crate::pdf::tables::TableGrid;
use crate::pdf::PdfAccess;

/// Canonical table-path column name (spec §6 "Table-path canonical map").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    TransactionDate,
    ValueDate,
    Description,
    Debit,
    Credit,
    Balance,
    Cheque,
    Reference,
}

fn canonicalize_header(cell: &str) -> Option<Column> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    match cleaned.as_str() {
        "date" | "txn date" | "trans date" | "transaction date" | "posting date" => Some(Column::TransactionDate),
        "value date" | "effective date" => Some(Column::ValueDate),
        "description" | "particulars" | "details" | "narrative" | "remarks" | "transaction details" => {
            Some(Column::Description)
        }
        "debit" | "withdrawal" | "withdrawals" | "dr" | "debit amount" | "payments" => Some(Column::Debit),
        "credit" | "deposit" | "deposits" | "cr" | "credit amount" | "receipts" => Some(Column::Credit),
        "balance" | "running balance" | "closing balance" | "available balance" | "ledger balance" => {
            Some(Column::Balance)
        }
        "cheque" | "chq" | "cheque no" => Some(Column::Cheque),
        "reference" | "ref" | "ref no" => Some(Column::Reference),
        _ => None,
    }
}

const BALANCE_KEYWORDS_OPEN: &[&str] = &["opening balance", "balance brought forward", "b/f"];
const BALANCE_KEYWORDS_CLOSE: &[&str] = &["closing balance", "balance carried forward", "c/f"];

/// Run the Tier-1 cascade over every page's ruled tables. Returns an empty
/// transaction vector when no table qualifies (spec §4.C: caller then tries
/// Tier 2), plus whatever account-info key-value tables were found along
/// the way (spec §4.C step 2).
pub fn extract(pdf: &dyn PdfAccess, currency: &str) -> crate::error::Result<(Vec<Transaction>, AccountInfo)> {
    let mut transactions = Vec::new();
    let mut account_info = AccountInfo::default();
    let mut last_columns: Option<IndexMap<usize, Column>> = None;

    for page in 0..pdf.page_count() {
        let tables = pdf.page_tables(page)?;
        for table in tables {
            if is_account_info_table(&table) {
                merge_account_info(&mut account_info, &parse_account_info(&table));
                continue;
            }
            if let Some(columns) = header_columns(&table) {
                transactions.extend(rows_to_transactions(&table, &columns, page, currency));
                last_columns = Some(columns);
            } else if is_headers_only_continuation(&table) {
                // SCB-style continuation page: reuse the last page's alias
                // map rather than discarding the page (mirrors Tier-2's
                // header-inheritance rule in spec §4.D.1).
                if let Some(columns) = &last_columns {
                    transactions.extend(rows_to_transactions_including_first(table, columns, page, currency));
                }
            }
        }
    }
    Ok((transactions, account_info))
}

const ACCOUNT_INFO_KEYS: &[(&[&str], AccountInfoField)] = &[
    (
        &["account holder", "name", "customer name", "account name"],
        AccountInfoField::AccountHolder,
    ),
    (&["bank", "bank name"], AccountInfoField::Bank),
    (&["account number", "account no", "acc no", "a/c no"], AccountInfoField::AccountNumber),
    (&["currency"], AccountInfoField::Currency),
    (
        &["statement period", "period", "statement date", "for the period"],
        AccountInfoField::StatementPeriod,
    ),
    (&["account type", "type of account"], AccountInfoField::AccountType),
];

#[derive(Clone, Copy)]
enum AccountInfoField {
    AccountHolder,
    Bank,
    AccountNumber,
    Currency,
    StatementPeriod,
    AccountType,
}

fn account_info_key(cell: &str) -> Option<AccountInfoField> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase();
    let cleaned = cleaned.trim_end_matches(':').trim();
    ACCOUNT_INFO_KEYS
        .iter()
        .find(|(aliases, _)| aliases.contains(&cleaned))
        .map(|(_, field)| *field)
}

/// Structured key-value parse of an account-info table (spec §4.C step 2):
/// each row is either a `[key, value]` pair, or a single cell of the form
/// `"Key: Value"`.
fn parse_account_info(table: &TableGrid) -> AccountInfo {
    let mut info = AccountInfo::default();
    for row in table {
        let (key_cell, value): (&str, String) = if row.len() >= 2 {
            (row[0].as_str(), row[1..].join(" ").trim().to_string())
        } else if let Some(cell) = row.first() {
            match cell.split_once(':') {
                Some((k, v)) => (k, v.trim().to_string()),
                None => continue,
            }
        } else {
            continue;
        };

        let Some(field) = account_info_key(key_cell) else { continue };
        if value.is_empty() {
            continue;
        }
        match field {
            AccountInfoField::AccountHolder => info.account_holder = Some(value),
            AccountInfoField::Bank => info.bank = Some(value),
            AccountInfoField::AccountNumber => info.account_number = Some(value),
            AccountInfoField::Currency => info.currency = Some(value),
            AccountInfoField::StatementPeriod => info.statement_period = Some(value),
            AccountInfoField::AccountType => info.account_type = Some(value),
        }
    }
    info
}

/// Fold a newly-parsed account-info table into the accumulator, keeping the
/// first non-null value seen for each field across however many account-info
/// tables the statement spreads across (header page vs. footer summary).
fn merge_account_info(acc: &mut AccountInfo, new: &AccountInfo) {
    if acc.account_holder.is_none() {
        acc.account_holder = new.account_holder.clone();
    }
    if acc.bank.is_none() {
        acc.bank = new.bank.clone();
    }
    if acc.account_number.is_none() {
        acc.account_number = new.account_number.clone();
    }
    if acc.currency.is_none() {
        acc.currency = new.currency.clone();
    }
    if acc.statement_period.is_none() {
        acc.statement_period = new.statement_period.clone();
    }
    if acc.account_type.is_none() {
        acc.account_type = new.account_type.clone();
    }
}

/// A table whose first row fails header canonicalization (no amount or
/// balance alias recognized) but whose column count matches a previously
/// discovered layout closely enough to be a data-only continuation.
fn is_headers_only_continuation(table: &TableGrid) -> bool {
    table.first().map(|row| !row.is_empty()).unwrap_or(false)
}

fn is_account_info_table(table: &TableGrid) -> bool {
    table.iter().flatten().any(|cell| {
        let lower = cell.to_lowercase();
        lower.contains("account number") || lower.contains("opening balance")
    }) && header_columns(table).is_none()
}

/// Map each column index in the header row to its canonical kind. A table
/// is rejected unless it has both an amount column (debit or credit) and a
/// balance column (spec §4.C step 1).
fn header_columns(table: &TableGrid) -> Option<IndexMap<usize, Column>> {
    let header = table.first()?;
    let mut columns = IndexMap::new();
    for (idx, cell) in header.iter().enumerate() {
        if let Some(kind) = canonicalize_header(cell) {
            columns.insert(idx, kind);
        }
    }
    let has_amount = columns.values().any(|c| matches!(c, Column::Debit | Column::Credit));
    let has_balance = columns.values().any(|c| matches!(c, Column::Balance));
    if has_amount && has_balance {
        Some(columns)
    } else {
        None
    }
}

fn rows_to_transactions(
    table: &TableGrid,
    columns: &IndexMap<usize, Column>,
    page: usize,
    currency: &str,
) -> Vec<Transaction> {
    rows_to_transactions_from(table.iter().skip(1), columns, page, currency)
}

/// Like `rows_to_transactions`, but treats every row (including the first)
/// as data — used for headers-only continuation pages (spec §9 Open
/// Question) that inherit a prior page's column map.
fn rows_to_transactions_including_first(
    table: TableGrid,
    columns: &IndexMap<usize, Column>,
    page: usize,
    currency: &str,
) -> Vec<Transaction> {
    rows_to_transactions_from(table.iter(), columns, page, currency)
}

fn rows_to_transactions_from<'a>(
    rows: impl Iterator<Item = &'a Vec<String>>,
    columns: &IndexMap<usize, Column>,
    page: usize,
    currency: &str,
) -> Vec<Transaction> {
    let mut out = Vec::new();
    for row in rows {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let cell_of = |kind: Column| -> Option<&str> {
            columns
                .iter()
                .find(|(_, c)| **c == kind)
                .and_then(|(idx, _)| row.get(*idx))
                .map(|s| s.as_str())
        };

        let description = cell_of(Column::Description).unwrap_or("").trim().to_string();
        let date = cell_of(Column::TransactionDate).and_then(normalize_date);
        let debit = cell_of(Column::Debit).and_then(|c| parse_amount(c, false));
        let credit = cell_of(Column::Credit).and_then(|c| parse_amount(c, false));
        let balance = cell_of(Column::Balance).and_then(|c| parse_amount(c, false));
        let reference = cell_of(Column::Reference).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let cheque = cell_of(Column::Cheque).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let lower_desc = description.to_lowercase();
        let (transaction_type, amount): (TransactionType, Decimal) =
            if BALANCE_KEYWORDS_OPEN.iter().any(|k| lower_desc.contains(k)) {
                match balance {
                    Some(b) => (TransactionType::OpeningBalance, b),
                    None => continue,
                }
            } else if BALANCE_KEYWORDS_CLOSE.iter().any(|k| lower_desc.contains(k)) {
                match balance {
                    Some(b) => (TransactionType::ClosingBalance, b),
                    None => continue,
                }
            } else if let Some(d) = debit.filter(|v| !v.is_zero()) {
                (TransactionType::Debit, d)
            } else if let Some(c) = credit.filter(|v| !v.is_zero()) {
                (TransactionType::Credit, c)
            } else {
                continue;
            };

        out.push(Transaction {
            date,
            description,
            transaction_type,
            amount,
            balance,
            reference,
            counterparty: None,
            channel: None,
            category: None,
            is_cash: false,
            is_cheque: cheque.is_some(),
            page_number: page,
            currency: currency.to_string(),
            account_section: 0,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::FakePdfAccess;

    fn table(rows: &[&[&str]]) -> TableGrid {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn extracts_ruled_table_rows() {
        let grid = table(&[
            &["Date", "Description", "Withdrawal", "Deposit", "Balance"],
            &["01 DEC 2025", "Opening Balance", "", "", "1,000.00"],
            &["02 DEC 2025", "Payment to ABC", "100.00", "", "900.00"],
            &["03 DEC 2025", "Salary", "", "500.00", "1,400.00"],
        ]);
        let pdf = FakePdfAccess {
            tables: vec![vec![grid]],
            ..Default::default()
        };
        let (txns, _) = extract(&pdf, "SGD").unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].transaction_type, TransactionType::OpeningBalance);
        assert_eq!(txns[1].transaction_type, TransactionType::Debit);
        assert_eq!(txns[2].transaction_type, TransactionType::Credit);
    }

    #[test]
    fn rejects_table_without_balance_column() {
        let grid = table(&[
            &["Date", "Description", "Amount"],
            &["01 DEC 2025", "Something", "100.00"],
        ]);
        let pdf = FakePdfAccess {
            tables: vec![vec![grid]],
            ..Default::default()
        };
        let (txns, _) = extract(&pdf, "SGD").unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn reuses_prior_layout_on_headers_only_continuation_page() {
        let first_page = table(&[
            &["Date", "Description", "Withdrawal", "Deposit", "Balance"],
            &["01 DEC 2025", "Payment to ABC", "100.00", "", "900.00"],
        ]);
        let continuation_page = table(&[
            &["02 DEC 2025", "Salary", "", "500.00", "1,400.00"],
            &["03 DEC 2025", "Rent", "200.00", "", "1,200.00"],
        ]);
        let pdf = FakePdfAccess {
            tables: vec![vec![first_page], vec![continuation_page]],
            ..Default::default()
        };
        let (txns, _) = extract(&pdf, "SGD").unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[1].description, "Salary");
    }

    #[test]
    fn skips_account_info_table() {
        let grid = table(&[
            &["Account Number", "1234567890"],
            &["Opening Balance", "1,000.00"],
        ]);
        let pdf = FakePdfAccess {
            tables: vec![vec![grid]],
            ..Default::default()
        };
        let (txns, _) = extract(&pdf, "SGD").unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn parses_account_info_table_into_structured_fields() {
        let grid = table(&[
            &["Account Holder", "Jane Tan"],
            &["Account Number", "1234567890"],
            &["Currency", "SGD"],
            &["Account Type", "Savings"],
            &["Statement Period", "01 NOV 2025 to 30 NOV 2025"],
        ]);
        let pdf = FakePdfAccess {
            tables: vec![vec![grid]],
            ..Default::default()
        };
        let (txns, account_info) = extract(&pdf, "SGD").unwrap();
        assert!(txns.is_empty());
        assert_eq!(account_info.account_holder.as_deref(), Some("Jane Tan"));
        assert_eq!(account_info.account_number.as_deref(), Some("1234567890"));
        assert_eq!(account_info.currency.as_deref(), Some("SGD"));
        assert_eq!(account_info.account_type.as_deref(), Some("Savings"));
        assert_eq!(account_info.statement_period.as_deref(), Some("01 NOV 2025 to 30 NOV 2025"));
    }

    #[test]
    fn parses_colon_separated_single_cell_account_info() {
        let grid = table(&[&["Account Number: 9988776655"], &["Bank: DBS"]]);
        let pdf = FakePdfAccess {
            tables: vec![vec![grid]],
            ..Default::default()
        };
        let (_, account_info) = extract(&pdf, "SGD").unwrap();
        assert_eq!(account_info.account_number.as_deref(), Some("9988776655"));
        assert_eq!(account_info.bank.as_deref(), Some("DBS"));
    }
}
