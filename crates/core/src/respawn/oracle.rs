// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI oracle: a cheap-model sanity check consulted before committing to
//! "idle," when enabled. On timeout or failure, callers treat the oracle
//! as having no opinion rather than propagating the error.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Object-safe so the controller can hold `Arc<dyn IdleOracle>` and swap
/// in a fake for tests.
pub trait IdleOracle: Send + Sync {
    fn ask(
        &self,
        question: OracleQuestion,
    ) -> Pin<Box<dyn Future<Output = Option<bool>> + Send + '_>>;
}

pub struct OracleQuestion {
    pub model: String,
    pub recent_output: String,
    pub prompt: &'static str,
}

/// Reqwest-backed oracle posting to an OpenAI-compatible chat-completions
/// endpoint. Any non-2xx, timeout, or malformed response is treated as
/// "no opinion" (`None`), never an error the controller has to handle.
pub struct HttpIdleOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpIdleOracle {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into(), api_key, timeout }
    }
}

impl IdleOracle for HttpIdleOracle {
    fn ask(&self, question: OracleQuestion) -> Pin<Box<dyn Future<Output = Option<bool>> + Send + '_>> {
        Box::pin(async move {
            let body = serde_json::json!({
                "model": question.model,
                "messages": [
                    { "role": "system", "content": question.prompt },
                    { "role": "user", "content": question.recent_output },
                ],
                "max_tokens": 8,
            });

            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = tokio::time::timeout(self.timeout, request.send()).await.ok()?.ok()?;
            if !response.status().is_success() {
                return None;
            }
            let parsed: serde_json::Value = response.json().await.ok()?;
            let text = parsed["choices"][0]["message"]["content"].as_str()?;
            Some(text.to_ascii_lowercase().contains("yes"))
        })
    }
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod tests;
