//! Enrichment (spec §4.F.5): derive channel, counterparty, category,
//! `is_cash`, `is_cheque` from the raw description in a single pass.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::Transaction;

const CHANNELS: &[(&str, &[&str])] = &[
    ("FAST", &["FAST"]),
    ("GIRO", &["GIRO"]),
    ("ATM", &["ATM"]),
    ("DEBIT PURCHASE", &["DEBIT PURCHASE", "POS "]),
    ("CHEQUE", &["CHEQUE", "CHQ"]),
    ("NETS", &["NETS"]),
    ("PayNow", &["PAYNOW"]),
    ("PAYMENT/TRANSFER", &["PAYMENT", "TRANSFER", "FUND TRANSFER"]),
    ("REMITTANCE", &["REMITTANCE", "REMIT"]),
];

const CATEGORIES: &[(&str, &[&str])] = &[
    ("salary_payroll", &["SALARY", "PAYROLL"]),
    ("rent", &["RENT", "RENTAL"]),
    ("utilities", &["UTILIT", "ELECTRIC", "WATER BILL", "SP SERVICES"]),
    ("food_beverage", &["RESTAURANT", "CAFE", "FOOD", "HAWKER", "F&B"]),
    ("transport", &["GRAB", "TRANSPORT", "MRT", "TAXI", "PETROL"]),
    ("supplier_payment", &["SUPPLIER", "VENDOR INVOICE"]),
    ("revenue", &["SALES", "REVENUE", "INVOICE PAYMENT"]),
    ("loan", &["LOAN", "INSTALMENT", "INSTALLMENT"]),
    ("tax_government", &["IRAS", "TAX", "CPF"]),
    ("insurance", &["INSURANCE", "PREMIUM"]),
    ("fees_charges", &["FEE", "CHARGE", "COMMISSION"]),
    ("transfer", &["TRANSFER", "GIRO", "FAST PAYMENT"]),
    ("purchase", &["PURCHASE", "POS "]),
    ("refund", &["REFUND", "REVERSAL"]),
];

lazy_static! {
    static ref REFERENCE_CODE: Regex = Regex::new(r"\b[A-Z0-9]{6,}\b").unwrap();
}

/// Enrich `txn` in place, deriving `channel`, `counterparty`, `category`,
/// `is_cash`, `is_cheque` from its description.
pub fn enrich(txn: &mut Transaction) {
    let upper = txn.description.to_uppercase();

    txn.channel = CHANNELS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| upper.contains(k)))
        .map(|(name, _)| name.to_string());

    txn.category = CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| upper.contains(k)))
        .map(|(name, _)| name.to_string())
        .or(Some("other".to_string()));

    txn.is_cash = upper.contains("CASH DEPOSIT") || upper.contains("CASH WITHDRAWAL") || upper.contains("ATM");
    txn.is_cheque = upper.contains("CHEQUE") || upper.contains("CHQ");

    txn.counterparty = derive_counterparty(&txn.description, txn.channel.as_deref());
}

fn derive_counterparty(description: &str, channel: Option<&str>) -> Option<String> {
    let mut stripped = description.to_string();
    if let Some(channel) = channel {
        for keyword in channel_keywords(channel) {
            stripped = stripped.replace(keyword, "");
        }
    }
    let stripped = REFERENCE_CODE.replace_all(&stripped, "");
    let trimmed = stripped.trim().trim_matches(|c: char| c == '-' || c == ':');
    let cleaned = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn channel_keywords(channel: &str) -> &'static [&'static str] {
    CHANNELS
        .iter()
        .find(|(name, _)| *name == channel)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;
    use rust_decimal_macros::dec;

    fn txn(description: &str) -> Transaction {
        Transaction {
            date: Some("01 JAN".into()),
            description: description.into(),
            transaction_type: TransactionType::Credit,
            amount: dec!(1.00),
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
        }
    }

    #[test]
    fn detects_paynow_channel() {
        let mut t = txn("PAYNOW TRANSFER FROM JOHN TAN REF12345678");
        enrich(&mut t);
        assert_eq!(t.channel.as_deref(), Some("PayNow"));
    }

    #[test]
    fn detects_cheque_flag() {
        let mut t = txn("CHEQUE NO 001234 DEPOSIT");
        enrich(&mut t);
        assert!(t.is_cheque);
    }

    #[test]
    fn falls_back_to_other_category() {
        let mut t = txn("MISC TRANSACTION XYZ");
        enrich(&mut t);
        assert_eq!(t.category.as_deref(), Some("other"));
    }

    #[test]
    fn categorizes_fees() {
        let mut t = txn("SERVICE FEE CHARGE");
        enrich(&mut t);
        assert_eq!(t.category.as_deref(), Some("fees_charges"));
    }
}
