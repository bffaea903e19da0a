//! Tier-3 Language-Model Extractor (spec §4.E): scan-aware OCR substitution,
//! page filtering, noise stripping, adaptive batching, chat-model calls,
//! and two-pass deduplication. The only tier with suspension points
//! (vision/chat model calls), so the only tier that can be cancelled.

pub mod batching;
pub mod client;
pub mod noise;
pub mod parse;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use client::ChatMessage;

use crate::error::{Error, Result};
use crate::model::{ExtractionDiagnostic, Transaction};
use crate::pdf::PdfAccess;

pub use client::{ChatModel, HttpChatModel, HttpVisionModel, VisionModel};

const PROMPT_PREAMBLE: &str = "You are extracting bank statement transactions. \
Respond with a JSON array only, each element matching the given schema. \
Normalize dates to `DD MMM` (uppercase month). Use channel values drawn from: \
FAST, GIRO, ATM, DEBIT PURCHASE, CHEQUE, NETS, PayNow, PAYMENT/TRANSFER, REMITTANCE.";

/// Cooperative cancellation flag shared between the caller and an
/// in-flight Tier-3 extraction (spec §5 "Suspension points").
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tier-3 configuration: model clients plus timeouts/retries (spec §5
/// "recommended: 60s vision, 120s chat per batch", "retry up to 2 times").
pub struct Tier3Config {
    pub vision: Option<Arc<dyn VisionModel>>,
    pub chat: Arc<dyn ChatModel>,
    pub vision_timeout: Duration,
    pub chat_timeout: Duration,
    pub max_batch_retries: usize,
}

/// Run the full Tier-3 cascade. Always produces transactions (or raises
/// `ExtractionFailed`/`ExtractionCancelled`); unlike Tiers 1–2 it has no
/// "return empty, fall through" contract since there is no Tier 4.
pub async fn extract(
    pdf: &dyn PdfAccess,
    bank: &str,
    currency: &str,
    config: &Tier3Config,
    cancellation: &CancellationToken,
) -> Result<(Vec<Transaction>, Vec<ExtractionDiagnostic>, usize)> {
    let page_texts = page_texts_with_ocr(pdf, config, cancellation).await?;

    let filtered: Vec<(usize, String)> = page_texts
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !noise::should_skip_page(text))
        .map(|(idx, text)| (idx, noise::strip_noise(&text, bank)))
        .collect();

    let texts_only: Vec<String> = filtered.iter().map(|(_, t)| t.clone()).collect();
    let batches = batching::build_batches(&texts_only);

    let mut diagnostics = Vec::new();
    let mut all_transactions = Vec::new();
    let mut missing_amount = 0usize;

    for (batch_index, batch) in batches.iter().enumerate() {
        if cancellation.is_cancelled() {
            return Err(Error::ExtractionCancelled("cancelled during Tier-3 batching".into()));
        }
        let batch_text: String = batch
            .pages
            .iter()
            .map(|&local_idx| texts_only[local_idx].as_str())
            .collect::<Vec<_>>()
            .join("\n---PAGE BREAK---\n");

        let page_number = batch.pages.first().map(|&i| filtered[i].0).unwrap_or(0);

        match call_with_retries(config, &batch_text, page_number, currency, batch_index, cancellation).await {
            Ok((mut txns, batch_missing)) => {
                log::debug!("tier3: batch {batch_index} produced {} transactions", txns.len());
                all_transactions.append(&mut txns);
                missing_amount += batch_missing;
            }
            Err(e) => {
                log::warn!("tier3: batch {batch_index} failed: {e}");
                diagnostics.push(ExtractionDiagnostic {
                    stage: "tier3_batch".to_string(),
                    batch_index: Some(batch_index),
                    message: e.to_string(),
                });
            }
        }
    }

    if all_transactions.is_empty() && !batches.is_empty() {
        log::error!("tier3: all {} batches failed", batches.len());
        return Err(Error::ExtractionFailed {
            reason: "all Tier-3 batches failed".to_string(),
        });
    }

    let deduped = parse::dedup(all_transactions);
    Ok((deduped, diagnostics, missing_amount))
}

async fn call_with_retries(
    config: &Tier3Config,
    batch_text: &str,
    page: usize,
    currency: &str,
    batch_index: usize,
    cancellation: &CancellationToken,
) -> Result<(Vec<Transaction>, usize)> {
    let mut last_err = Error::ExtractionFailed {
        reason: format!("batch {batch_index} never attempted"),
    };
    for _attempt in 0..=config.max_batch_retries {
        if cancellation.is_cancelled() {
            return Err(Error::ExtractionCancelled(format!("cancelled before batch {batch_index}")));
        }
        match run_batch(config, batch_text, page, currency).await {
            Ok(result) => return Ok(result),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

async fn run_batch(
    config: &Tier3Config,
    batch_text: &str,
    page: usize,
    currency: &str,
) -> Result<(Vec<Transaction>, usize)> {
    let schema = parse::response_schema();
    let messages = vec![
        ChatMessage::system(format!("{PROMPT_PREAMBLE}\nSchema: {schema}")),
        ChatMessage::user(batch_text.to_string()),
    ];

    let response = tokio::time::timeout(config.chat_timeout, config.chat.chat(&messages))
        .await
        .map_err(|_| Error::ExtractionCancelled("chat model call exceeded deadline".into()))??;

    parse::parse_batch(&response, page, currency)
}

/// When §4.A flags the document as scanned, replace each page's text with
/// vision OCR output (spec §4.E step 1); otherwise pass `pages_text()`
/// through unchanged.
async fn page_texts_with_ocr(
    pdf: &dyn PdfAccess,
    config: &Tier3Config,
    cancellation: &CancellationToken,
) -> Result<Vec<String>> {
    if !pdf.is_scanned() {
        return pdf.pages_text();
    }
    let vision = config
        .vision
        .as_ref()
        .ok_or_else(|| Error::ExtractionFailed {
            reason: "document is scanned but no vision model is configured".to_string(),
        })?;

    let mut texts = Vec::with_capacity(pdf.page_count());
    for page in 0..pdf.page_count() {
        if cancellation.is_cancelled() {
            return Err(Error::ExtractionCancelled("cancelled during vision OCR".into()));
        }
        let image = pdf.render_page(page, 200.0)?;
        let prompt = "Transcribe all visible text on this bank statement page verbatim, preserving line breaks.";
        let text = tokio::time::timeout(config.vision_timeout, vision.analyze_image(&image, prompt))
            .await
            .map_err(|_| Error::ExtractionCancelled("vision OCR call exceeded deadline".into()))??;
        texts.push(text);
    }
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::FakePdfAccess;
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct StubChat(String);
    impl ChatModel for StubChat {
        fn chat<'a>(&'a self, _messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
            let body = self.0.clone();
            async move { Ok(body) }.boxed()
        }
    }

    #[tokio::test]
    async fn extracts_and_dedups_across_overlap() {
        let pdf = FakePdfAccess {
            texts: vec!["01 DEC 2025 Payment 100.00 900.00".to_string()],
            ..Default::default()
        };
        let response = r#"[{"date":"01 DEC","description":"Payment","type":"debit","amount":100.0,"balance":900.0,"reference":null,"counterparty":null,"channel":null}]"#;
        let config = Tier3Config {
            vision: None,
            chat: Arc::new(StubChat(response.to_string())),
            vision_timeout: Duration::from_secs(1),
            chat_timeout: Duration::from_secs(1),
            max_batch_retries: 0,
        };
        let (txns, diagnostics, missing_amount) = extract(&pdf, "DBS", "SGD", &config, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(txns.len(), 1);
        assert!(diagnostics.is_empty());
        assert_eq!(missing_amount, 0);
    }

    struct FailingChat;
    impl ChatModel for FailingChat {
        fn chat<'a>(&'a self, _messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
            async move { Ok("not json".to_string()) }.boxed()
        }
    }

    #[tokio::test]
    async fn all_batches_failing_is_extraction_failed() {
        let pdf = FakePdfAccess {
            texts: vec!["page one".to_string(), "page two".to_string()],
            ..Default::default()
        };
        let config = Tier3Config {
            vision: None,
            chat: Arc::new(FailingChat),
            vision_timeout: Duration::from_secs(1),
            chat_timeout: Duration::from_secs(1),
            max_batch_retries: 0,
        };
        let result = extract(&pdf, "DBS", "SGD", &config, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::ExtractionFailed { .. })));
    }

    struct FlakyChat {
        calls: std::sync::atomic::AtomicUsize,
    }
    impl ChatModel for FlakyChat {
        fn chat<'a>(&'a self, _messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Ok("not json".to_string())
                } else {
                    Ok(r#"[{"date":"02 DEC","description":"Payment","type":"debit","amount":50.0,"balance":450.0,"reference":null,"counterparty":null,"channel":null}]"#.to_string())
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn one_failed_batch_among_several_surfaces_as_diagnostic_not_error() {
        let dense_page = "x".repeat(2000);
        let pdf = FakePdfAccess {
            texts: vec![dense_page.clone(), dense_page.clone(), dense_page.clone(), dense_page],
            ..Default::default()
        };
        let config = Tier3Config {
            vision: None,
            chat: Arc::new(FlakyChat {
                calls: std::sync::atomic::AtomicUsize::new(0),
            }),
            vision_timeout: Duration::from_secs(1),
            chat_timeout: Duration::from_secs(1),
            max_batch_retries: 0,
        };
        let (txns, diagnostics, _) = extract(&pdf, "DBS", "SGD", &config, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!txns.is_empty(), "surviving batch should still produce transactions");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].stage, "tier3_batch");
    }
}
