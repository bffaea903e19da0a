//! Vision and chat model client seams (spec §6 external collaborators).
//!
//! Shaped like the teacher pack's `financial-history-builder::llm::client`
//! (`GeminiClient`): a thin `reqwest`-backed struct per capability, async
//! methods, JSON in/out. Traits are kept object-safe (`Arc<dyn VisionModel>`)
//! by returning boxed futures rather than using `async fn` in the trait
//! directly, since the latter is not dyn-compatible.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;

use crate::error::{Error, Result};

/// A single chat message in the conversational format most chat APIs share.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// §4.B step 1 / §4.E step 1: crop-to-text vision inference.
pub trait VisionModel: Send + Sync {
    /// Analyze `image_bytes` (PNG) under `prompt`, returning the model's
    /// raw text response.
    fn analyze_image<'a>(&'a self, image_bytes: &'a [u8], prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// §4.E step 5: batch transaction extraction via chat completion.
pub trait ChatModel: Send + Sync {
    /// Send `messages`, returning the model's raw text response (expected
    /// to be parseable JSON when the prompt instructs it to be).
    fn chat<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>>;
}

/// Generic OpenAI-compatible chat-completions client. Callers targeting a
/// different wire format implement `ChatModel` themselves; this exists so
/// the crate ships a working default rather than only an interface.
pub struct HttpChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpChatModel {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

impl ChatModel for HttpChatModel {
    fn chat<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
        async move {
            let payload = json!({
                "model": self.model,
                "messages": messages.iter().map(|m| json!({"role": m.role, "content": m.content})).collect::<Vec<_>>(),
                "temperature": 0.0,
            });
            let res = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await
                .map_err(|e| Error::ModelCall(e.to_string()))?;

            if !res.status().is_success() {
                let text = res.text().await.unwrap_or_default();
                return Err(Error::ModelCall(format!("chat completion failed: {text}")));
            }
            let body: serde_json::Value = res.json().await.map_err(|e| Error::ModelCall(e.to_string()))?;
            body["choices"][0]["message"]["content"]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| Error::ModelCall("response had no message content".into()))
        }
        .boxed()
    }
}

/// Generic vision-capable chat endpoint (same wire shape as
/// `HttpChatModel`, image attached as a base64 data URL in the user turn).
pub struct HttpVisionModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpVisionModel {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

impl VisionModel for HttpVisionModel {
    fn analyze_image<'a>(&'a self, image_bytes: &'a [u8], prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
            let payload = json!({
                "model": self.model,
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": prompt},
                        {"type": "image_url", "image_url": {"url": format!("data:image/png;base64,{encoded}")}},
                    ],
                }],
                "temperature": 0.0,
            });
            let res = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await
                .map_err(|e| Error::ModelCall(e.to_string()))?;

            if !res.status().is_success() {
                let text = res.text().await.unwrap_or_default();
                return Err(Error::ModelCall(format!("vision call failed: {text}")));
            }
            let body: serde_json::Value = res.json().await.map_err(|e| Error::ModelCall(e.to_string()))?;
            body["choices"][0]["message"]["content"]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| Error::ModelCall("response had no message content".into()))
        }
        .boxed()
    }
}
