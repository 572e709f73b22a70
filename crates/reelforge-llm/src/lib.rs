//! # reelforge-llm
//!
//! `reelforge_core::collaborators::Generator` implemented as a streaming HTTP client
//! against an Ollama-compatible `/api/generate` endpoint. CAG is the only consumer.
//!
//! The server is assumed local-first (Ollama, llama.cpp's server, or anything that speaks
//! the same line-delimited-JSON streaming protocol). Base URL is read from
//! `REELFORGE_GENERATOR_BASE_URL`, falling back to `http://localhost:11434`.

use std::time::Duration;

use async_trait::async_trait;
use reelforge_core::collaborators::{GenerationChunk, GenerationParams, Generator};
use reelforge_core::errors::CoreError;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const GENERATOR_BASE_URL_ENV: &str = "REELFORGE_GENERATOR_BASE_URL";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const STREAM_CHANNEL_CAPACITY: usize = 32;

fn collaborator_unavailable(model_id: &str, reason: impl std::fmt::Display) -> CoreError {
    CoreError::CollaboratorUnavailable {
        collaborator: "Generator".to_string(),
        reason: format!("{model_id}: {reason}"),
    }
}

/// `Generator` backed by an HTTP call to a local (or remote) generation server.
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
    model_id: String,
    context_window: u32,
}

impl HttpGenerator {
    /// Build a client pointed at `REELFORGE_GENERATOR_BASE_URL` (or the default), serving
    /// `model_id` with a `context_window` token budget.
    pub fn new(model_id: impl Into<String>, context_window: u32) -> Self {
        let base_url = std::env::var(GENERATOR_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url, model_id, context_window)
    }

    pub fn with_base_url(base_url: impl Into<String>, model_id: impl Into<String>, context_window: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("reqwest client construction is infallible for this configuration");
        Self {
            client,
            base_url: base_url.into(),
            model_id: model_id.into(),
            context_window,
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn context_window(&self) -> u32 {
        self.context_window
    }

    async fn stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
        cache_hint: Option<&str>,
    ) -> Result<mpsc::Receiver<Result<GenerationChunk, CoreError>>, CoreError> {
        let endpoint = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let mut payload = json!({
            "model": self.model_id,
            "prompt": prompt,
            "stream": true,
            "options": {
                "num_predict": params.max_output_tokens,
                "temperature": params.temperature,
            },
        });
        if let Some(hint) = cache_hint {
            debug!(hint, "resuming generation with cached context fingerprint");
            payload["context_hint"] = json!(hint);
        }

        let mut response = self
            .client
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| collaborator_unavailable(&self.model_id, format!("{} unreachable: {e}", self.base_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(collaborator_unavailable(&self.model_id, format!("HTTP {status}: {body}")));
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let model_id = self.model_id.clone();
        tokio::spawn(async move {
            let mut buffer = String::new();
            loop {
                let chunk = match response.chunk().await {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(collaborator_unavailable(&model_id, format!("stream read failed: {e}")))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].to_string();
                    buffer.drain(..=newline);
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<serde_json::Value>(&line) {
                        Ok(value) => {
                            let text = value.get("response").and_then(|v| v.as_str()).unwrap_or("").to_string();
                            let is_final = value.get("done").and_then(|v| v.as_bool()).unwrap_or(false);
                            if !text.is_empty() || is_final {
                                if tx.send(Ok(GenerationChunk { text, is_final })).await.is_err() {
                                    return;
                                }
                            }
                            if is_final {
                                return;
                            }
                        }
                        Err(e) => warn!(line, error = %e, "skipping malformed generation chunk"),
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_local_ollama() {
        std::env::remove_var(GENERATOR_BASE_URL_ENV);
        let generator = HttpGenerator::new("llama3.1", 8192);
        assert_eq!(generator.base_url, DEFAULT_BASE_URL);
        assert_eq!(generator.context_window(), 8192);
        assert_eq!(generator.model_id(), "llama3.1");
    }

    #[test]
    fn with_base_url_overrides_default() {
        let generator = HttpGenerator::with_base_url("http://example.internal:9000", "llama3.1", 8192);
        assert_eq!(generator.base_url, "http://example.internal:9000");
    }
}
