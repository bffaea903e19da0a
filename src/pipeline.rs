//! Extraction orchestrator (spec §6): wires the Bank Identifier and the
//! three-tier cascade into a single call, followed unconditionally by the
//! Normalizer & Validator.

use crate::bank;
use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::model::{AccountInfo, BankLayout, ExtractionMethod, ExtractionResult};
use crate::normalize;
use crate::pdf::PdfAccess;
use crate::tier1;
use crate::tier2;
use crate::tier3::{self, CancellationToken, Tier3Config};

const ABANDONMENT_THRESHOLD: usize = 3;
const BANK_HINT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Run the full pipeline: §4.A is assumed already satisfied by `pdf`
/// (an already-open `PdfAccess`); this orchestrates §4.B through §4.F.
pub async fn extract(pdf: &dyn PdfAccess, config: &ExtractorConfig) -> Result<ExtractionResult> {
    if pdf.page_count() == 0 {
        return Err(Error::PdfUnreadable("document has zero pages".to_string()));
    }

    let bank_layout = resolve_bank(pdf, config).await;
    let currency = "SGD".to_string();

    let mut account_info = AccountInfo::default();
    let (transactions, extraction_method, diagnostics, missing_amount) = if pdf.is_scanned() {
        log::debug!("pipeline: document flagged scanned, routing directly to tier 3 (LLM OCR)");
        let (txns, diags, missing) = run_tier3(pdf, &bank_layout.bank, &currency, config).await?;
        (txns, ExtractionMethod::LlmOcr, diags, missing)
    } else {
        let (tier1_txns, tier1_account_info) = tier1::extract(pdf, &currency)?;
        account_info = tier1_account_info;
        if tier1_txns.len() >= ABANDONMENT_THRESHOLD {
            log::debug!("pipeline: tier 1 (table) produced {} transactions, short-circuiting", tier1_txns.len());
            (tier1_txns, ExtractionMethod::Table, Vec::new(), 0)
        } else {
            log::debug!("pipeline: tier 1 produced only {} transactions, falling through to tier 2", tier1_txns.len());
            let tier2_txns = tier2::extract(pdf, &bank_layout.bank)?;
            if tier2_txns.len() >= ABANDONMENT_THRESHOLD {
                log::debug!("pipeline: tier 2 (word geometry) produced {} transactions, short-circuiting", tier2_txns.len());
                (tier2_txns, ExtractionMethod::Words, Vec::new(), 0)
            } else {
                log::debug!("pipeline: tier 2 produced only {} transactions, falling through to tier 3", tier2_txns.len());
                let (txns, diags, missing) = run_tier3(pdf, &bank_layout.bank, &currency, config).await?;
                (txns, ExtractionMethod::Llm, diags, missing)
            }
        }
    };
    account_info.bank = account_info.bank.or_else(|| Some(bank_layout.bank.clone()));
    account_info.currency = account_info.currency.or_else(|| Some(currency.clone()));

    if transactions.len() < ABANDONMENT_THRESHOLD {
        log::error!("pipeline: extraction failed, only {} transactions across all tiers", transactions.len());
        return Err(Error::ExtractionFailed {
            reason: format!("only {} transactions across all tiers", transactions.len()),
        });
    }

    let normalized = normalize::normalize(transactions, missing_amount);

    let mut currencies: Vec<String> = Vec::new();
    for txn in &normalized.transactions {
        if !currencies.contains(&txn.currency) {
            currencies.push(txn.currency.clone());
        }
    }

    Ok(ExtractionResult {
        bank: bank_layout.bank,
        account_info,
        transactions: normalized.transactions,
        metrics: normalized.metrics,
        accuracy: normalized.accuracy,
        balance_chain: normalized.balance_chain,
        extraction_method,
        pages_processed: pdf.page_count(),
        currencies,
        diagnostics,
    })
}

async fn resolve_bank(pdf: &dyn PdfAccess, config: &ExtractorConfig) -> BankLayout {
    if let Some(hint) = &config.bank_hint {
        if hint.confidence > BANK_HINT_CONFIDENCE_THRESHOLD {
            return hint.clone();
        }
    }
    let vision = config.vision.as_deref();
    bank::identify(pdf, vision).await
}

async fn run_tier3(
    pdf: &dyn PdfAccess,
    bank: &str,
    currency: &str,
    config: &ExtractorConfig,
) -> Result<(Vec<crate::model::Transaction>, Vec<crate::model::ExtractionDiagnostic>, usize)> {
    let chat = config.chat.clone().ok_or_else(|| Error::ExtractionFailed {
        reason: "no chat model configured for Tier-3 fallback".to_string(),
    })?;
    let tier3_config = Tier3Config {
        vision: config.vision.clone(),
        chat,
        vision_timeout: config.vision_timeout.unwrap_or(std::time::Duration::from_secs(60)),
        chat_timeout: config.chat_timeout.unwrap_or(std::time::Duration::from_secs(120)),
        max_batch_retries: config.max_batch_retries,
    };
    tier3::extract(pdf, bank, currency, &tier3_config, &CancellationToken::new()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::FakePdfAccess;

    #[tokio::test]
    async fn empty_pdf_is_unreadable() {
        let pdf = FakePdfAccess::default();
        let config = ExtractorConfig::new();
        let result = extract(&pdf, &config).await;
        assert!(matches!(result, Err(Error::PdfUnreadable(_))));
    }

    #[tokio::test]
    async fn ruled_table_statement_uses_table_method() {
        let grid: crate::pdf::tables::TableGrid = vec![
            vec!["Date", "Description", "Withdrawal", "Deposit", "Balance"],
            vec!["01 DEC 2025", "Balance Brought Forward", "", "", "1000.00"],
            vec!["02 DEC 2025", "Payment", "100.00", "", "900.00"],
            vec!["03 DEC 2025", "Salary", "", "500.00", "1400.00"],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.to_string()).collect())
        .collect();

        let pdf = FakePdfAccess {
            texts: vec!["statement text".to_string()],
            tables: vec![vec![grid]],
            ..Default::default()
        };
        let config = ExtractorConfig::new();
        let result = extract(&pdf, &config).await.unwrap();
        assert_eq!(result.extraction_method, ExtractionMethod::Table);
        assert_eq!(result.transactions.len(), 3);
    }

    #[tokio::test]
    async fn account_info_table_is_threaded_into_result() {
        let txn_grid: crate::pdf::tables::TableGrid = vec![
            vec!["Date", "Description", "Withdrawal", "Deposit", "Balance"],
            vec!["01 DEC 2025", "Balance Brought Forward", "", "", "1000.00"],
            vec!["02 DEC 2025", "Payment", "100.00", "", "900.00"],
            vec!["03 DEC 2025", "Salary", "", "500.00", "1400.00"],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.to_string()).collect())
        .collect();
        let info_grid: crate::pdf::tables::TableGrid = vec![
            vec!["Account Holder", "Jane Tan"],
            vec!["Account Number", "1234567890"],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.to_string()).collect())
        .collect();

        let pdf = FakePdfAccess {
            texts: vec!["statement text".to_string()],
            tables: vec![vec![info_grid, txn_grid]],
            ..Default::default()
        };
        let config = ExtractorConfig::new();
        let result = extract(&pdf, &config).await.unwrap();
        assert_eq!(result.account_info.account_holder.as_deref(), Some("Jane Tan"));
        assert_eq!(result.account_info.account_number.as_deref(), Some("1234567890"));
    }
}
