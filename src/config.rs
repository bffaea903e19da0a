//! Runtime configuration for the extraction pipeline.
//!
//! Shaped like the teacher's `PdfConfig`: a plain struct with `with_*`
//! builder methods and a `Default` impl, rather than a typestate builder —
//! matches the small, flat configuration surface this pipeline actually
//! needs.

use std::sync::Arc;
use std::time::Duration;

use crate::model::BankLayout;
use crate::tier3::{ChatModel, VisionModel};

/// Configuration for a single extraction run.
#[derive(Clone)]
pub struct ExtractorConfig {
    /// Deadline for a single vision model call (§5: recommended 60s).
    pub vision_timeout: Option<Duration>,
    /// Deadline for a single chat model call per batch (§5: recommended 120s).
    pub chat_timeout: Option<Duration>,
    /// Maximum retries for a single failed Tier-3 batch (§5: up to 2).
    pub max_batch_retries: usize,
    /// Optional upstream bank hint (§6): skips §4.B when `confidence > 0.7`.
    pub bank_hint: Option<BankLayout>,
    /// Vision model client, or `None` to skip vision steps entirely.
    pub vision: Option<Arc<dyn VisionModel>>,
    /// Chat model client, required for Tier-3 to produce any output.
    pub chat: Option<Arc<dyn ChatModel>>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self {
            vision_timeout: Some(Duration::from_secs(60)),
            chat_timeout: Some(Duration::from_secs(120)),
            max_batch_retries: 2,
            bank_hint: None,
            vision: None,
            chat: None,
        }
    }

    pub fn with_vision_timeout(mut self, d: Duration) -> Self {
        self.vision_timeout = Some(d);
        self
    }

    pub fn with_chat_timeout(mut self, d: Duration) -> Self {
        self.chat_timeout = Some(d);
        self
    }

    pub fn with_max_batch_retries(mut self, n: usize) -> Self {
        self.max_batch_retries = n;
        self
    }

    pub fn with_bank_hint(mut self, hint: BankLayout) -> Self {
        self.bank_hint = Some(hint);
        self
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionModel>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }
}
