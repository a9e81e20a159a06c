//! Remote LLM content classifier
//!
//! OpenAI-compatible chat completions against the configured inference
//! endpoint. One system prompt, one truncated user message, temperature 0,
//! a handful of output tokens. The policy on any failure is fail-closed:
//! the verdict is `Code`, indistinguishable from a genuine code verdict.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dlp_core::item::Verdict;
use dlp_core::ports::ClassifierPort;

use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str = "You are a data loss prevention classifier. \
    Decide whether the user message is source code (any programming, \
    scripting or configuration language). Reply with exactly one word: \
    CODE if it is source code, TEXT otherwise.";

const REQUEST_DEADLINE: Duration = Duration::from_secs(8);
const MAX_OUTPUT_TOKENS: u32 = 10;

pub struct LlmClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClassifier {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_DEADLINE)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    async fn request(&self, body: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: body,
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("classifier request failed")?
            .error_for_status()
            .context("classifier returned error status")?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("classifier response was not valid JSON")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("classifier response had no choices")
    }
}

#[async_trait]
impl ClassifierPort for LlmClassifier {
    async fn classify(&self, body: &str) -> Verdict {
        match self.request(body).await {
            Ok(reply) => {
                let verdict = if reply.to_ascii_uppercase().contains("CODE") {
                    Verdict::Code
                } else {
                    Verdict::Text
                };
                debug!(reply = %reply.trim(), ?verdict, "classifier answered");
                verdict
            }
            Err(e) => {
                warn!(error = %e, "classifier failed, failing closed to Code");
                Verdict::Code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier_for(server: &mockito::ServerGuard) -> LlmClassifier {
        LlmClassifier::new(&LlmConfig {
            endpoint: server.url(),
            api_key: "test-key".into(),
            model: "test-model".into(),
        })
        .unwrap()
    }

    fn reply_body(content: &str) -> String {
        format!(r#"{{"choices":[{{"message":{{"role":"assistant","content":"{content}"}}}}]}}"#)
    }

    #[tokio::test]
    async fn code_reply_maps_to_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply_body("CODE"))
            .create_async()
            .await;

        let verdict = classifier_for(&server).classify("fn main() {}").await;
        assert_eq!(verdict, Verdict::Code);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn keyword_match_is_case_insensitive() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(reply_body("code."))
            .create_async()
            .await;

        let verdict = classifier_for(&server).classify("x = 1").await;
        assert_eq!(verdict, Verdict::Code);
    }

    #[tokio::test]
    async fn non_code_reply_maps_to_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(reply_body("TEXT"))
            .create_async()
            .await;

        let verdict = classifier_for(&server).classify("see you at 3pm").await;
        assert_eq!(verdict, Verdict::Text);
    }

    #[tokio::test]
    async fn server_error_fails_closed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let verdict = classifier_for(&server).classify("anything").await;
        assert_eq!(verdict, Verdict::Code);
    }

    #[tokio::test]
    async fn malformed_body_fails_closed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let verdict = classifier_for(&server).classify("anything").await;
        assert_eq!(verdict, Verdict::Code);
    }
}
