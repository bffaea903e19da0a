//! Statement metrics (SPEC_FULL §3.1 / spec §6): aggregate ledger
//! statistics computed from the normalized transaction list.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{CurrencyMetrics, StatementMetrics, Transaction, TransactionType};

pub fn compute(transactions: &[Transaction]) -> StatementMetrics {
    let currencies: Vec<String> = {
        let mut seen = Vec::new();
        for txn in transactions {
            if !seen.contains(&txn.currency) {
                seen.push(txn.currency.clone());
            }
        }
        seen
    };

    let overall = compute_for(transactions);
    let mut per_currency = IndexMap::new();
    if currencies.len() > 1 {
        for currency in &currencies {
            let subset: Vec<Transaction> = transactions
                .iter()
                .filter(|t| &t.currency == currency)
                .cloned()
                .collect();
            per_currency.insert(currency.clone(), compute_for(&subset));
        }
    }

    let average_credit = if overall.credit_count > 0 {
        Some(overall.credit_sum / Decimal::from(overall.credit_count as u64))
    } else {
        None
    };
    let average_debit = if overall.debit_count > 0 {
        Some(overall.debit_sum / Decimal::from(overall.debit_count as u64))
    } else {
        None
    };

    StatementMetrics {
        overall,
        average_credit,
        average_debit,
        per_currency,
    }
}

fn compute_for(transactions: &[Transaction]) -> CurrencyMetrics {
    let mut m = CurrencyMetrics::default();

    let opening = transactions
        .iter()
        .find(|t| t.transaction_type == TransactionType::OpeningBalance)
        .and_then(|t| t.balance);
    let closing = transactions
        .iter()
        .rev()
        .find(|t| t.transaction_type == TransactionType::ClosingBalance)
        .and_then(|t| t.balance);
    m.opening_balance = opening;
    m.closing_balance = closing;

    let balances: Vec<Decimal> = transactions.iter().filter_map(|t| t.balance).collect();
    if !balances.is_empty() {
        m.max_balance = balances.iter().copied().max();
        m.min_balance = balances.iter().copied().min();
        let sum: Decimal = balances.iter().copied().sum();
        m.avg_balance = Some(sum / Decimal::from(balances.len() as u64));
    }

    for txn in transactions {
        match txn.transaction_type {
            TransactionType::Credit => {
                m.credit_count += 1;
                m.credit_sum += txn.amount;
                m.max_credit = Some(m.max_credit.map_or(txn.amount, |v: Decimal| v.max(txn.amount)));
                m.min_credit = Some(m.min_credit.map_or(txn.amount, |v: Decimal| v.min(txn.amount)));
                if txn.is_cash {
                    m.cash_deposit_count += 1;
                    m.cash_deposit_sum += txn.amount;
                }
            }
            TransactionType::Debit => {
                m.debit_count += 1;
                m.debit_sum += txn.amount;
                m.max_debit = Some(m.max_debit.map_or(txn.amount, |v: Decimal| v.max(txn.amount)));
                m.min_debit = Some(m.min_debit.map_or(txn.amount, |v: Decimal| v.min(txn.amount)));
                if txn.is_cash {
                    m.cash_withdrawal_count += 1;
                    m.cash_withdrawal_sum += txn.amount;
                }
                if txn.is_cheque {
                    m.cheque_withdrawal_count += 1;
                    m.cheque_withdrawal_sum += txn.amount;
                }
                if txn.category.as_deref() == Some("fees_charges") {
                    m.total_fees += txn.amount;
                }
            }
            _ => {}
        }
    }

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(ty: TransactionType, amount: Decimal, currency: &str) -> Transaction {
        Transaction {
            date: Some("01 JAN".into()),
            description: "x".into(),
            transaction_type: ty,
            amount,
            balance: Some(amount),
            reference: None,
            counterparty: None,
            channel: None,
            category: None,
            is_cash: false,
            is_cheque: false,
            page_number: 0,
            currency: currency.into(),
            account_section: 0,
        }
    }

    #[test]
    fn aggregates_credit_and_debit() {
        let txns = vec![
            txn(TransactionType::Credit, dec!(100.00), "SGD"),
            txn(TransactionType::Debit, dec!(40.00), "SGD"),
        ];
        let metrics = compute(&txns);
        assert_eq!(metrics.overall.credit_count, 1);
        assert_eq!(metrics.overall.debit_sum, dec!(40.00));
        assert_eq!(metrics.average_credit, Some(dec!(100.00)));
    }

    #[test]
    fn splits_per_currency_only_when_multiple() {
        let single = vec![txn(TransactionType::Credit, dec!(1.00), "SGD")];
        assert!(compute(&single).per_currency.is_empty());

        let multi = vec![
            txn(TransactionType::Credit, dec!(1.00), "SGD"),
            txn(TransactionType::Credit, dec!(2.00), "USD"),
        ];
        let metrics = compute(&multi);
        assert_eq!(metrics.per_currency.len(), 2);
    }
}
