//! Groq client (OpenAI-compatible chat completions).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, LlmError, Provider, Result, build_http_client, send_json};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com";

/// Sampling parameters sent with every chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stop: Option<Vec<String>>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            top_p: 1.0,
            stop: None,
        }
    }
}

pub struct GroqClient {
    http: reqwest::Client,
    headers: HeaderMap,
    base_url: String,
    timeout: Duration,
    sampling: SamplingOptions,
}

impl GroqClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| LlmError::InvalidApiKey {
                provider: Provider::Groq,
                reason: e.to_string(),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http: build_http_client(Provider::Groq, timeout)?,
            headers,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
            sampling: SamplingOptions::default(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: Provider::Groq.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.sampling.temperature,
            max_tokens: self.sampling.max_tokens,
            top_p: self.sampling.top_p,
            stop: self.sampling.stop.as_deref(),
        };
        let request = self
            .http
            .post(self.endpoint())
            .headers(self.headers.clone())
            .json(&body);

        let parsed: ChatResponse = send_json(Provider::Groq, self.timeout, request).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse {
                provider: Provider::Groq,
            })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    // Sent as an explicit null when unset.
    stop: Option<&'a [String]>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
