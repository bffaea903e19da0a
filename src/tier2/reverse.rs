//! Reverse-chronological detection (spec §4.D.5): a robustness heuristic
//! only, applied after the full page list is assembled.

use crate::model::Transaction;

/// Percentage of consecutive pairs for which `prev.balance ± amount ==
/// curr.balance` holds, per §4.F.3's identity (tolerance 0.02).
fn quick_chain_score(transactions: &[Transaction]) -> f64 {
    let mut total = 0usize;
    let mut valid = 0usize;
    for pair in transactions.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if let (Some(prev_balance), Some(curr_balance)) = (prev.balance, curr.balance) {
            total += 1;
            let expected = prev_balance + curr.signed_amount();
            if (expected - curr_balance).abs() <= rust_decimal_macros::dec!(0.02) {
                valid += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        (valid as f64 / total as f64) * 100.0
    }
}

/// Reverse `transactions` in place if the reversed order scores strictly
/// higher than the forward order under `quick_chain_score`.
pub fn maybe_reverse(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    let forward_score = quick_chain_score(&transactions);
    let mut reversed = transactions.clone();
    reversed.reverse();
    let reversed_score = quick_chain_score(&reversed);

    if reversed_score > forward_score {
        transactions = reversed;
    }
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;
    use rust_decimal_macros::dec;

    fn txn(balance: rust_decimal::Decimal, amount: rust_decimal::Decimal, ty: TransactionType) -> Transaction {
        Transaction {
            date: Some("01 JAN".into()),
            description: "x".into(),
            transaction_type: ty,
            amount,
            balance: Some(balance),
            reference: None,
            counterparty: None,
            channel: None,
            category: None,
            is_cash: false,
            is_cheque: false,
            page_number: 0,
            currency: "SGD".into(),
            account_section: 0,
        }
    }

    #[test]
    fn reverses_when_newest_first_ordering_scores_better() {
        // Newest-first input: balance decreases then the credit undoes it
        // when read backwards.
        let txns = vec![
            txn(dec!(150.00), dec!(50.00), TransactionType::Credit),
            txn(dec!(100.00), dec!(100.00), TransactionType::OpeningBalance),
        ];
        let result = maybe_reverse(txns);
        assert_eq!(result[0].transaction_type, TransactionType::OpeningBalance);
    }

    #[test]
    fn keeps_forward_order_on_tie() {
        let txns = vec![
            txn(dec!(100.00), dec!(0.00), TransactionType::OpeningBalance),
            txn(dec!(100.00), dec!(0.00), TransactionType::OpeningBalance),
        ];
        let result = maybe_reverse(txns.clone());
        assert_eq!(result[0].date, txns[0].date);
    }
}
