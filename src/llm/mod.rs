//! Completion providers.
//!
//! The relay talks to a closed set of providers ([`Provider`]). Each one has a
//! client implementing [`CompletionProvider`]; the clients configured at
//! startup are collected in [`Providers`] and shared read-only by every
//! request. Tests inject their own [`CompletionProvider`] implementations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub mod error;
pub mod gemini;
pub mod groq;

pub use error::{LlmError, Result};
pub use gemini::GeminiClient;
pub use groq::{GroqClient, SamplingOptions};

/// The providers the relay can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    Groq,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::Groq];

    /// Resolve a caller-supplied name, ignoring case.
    ///
    /// ```
    /// use prompt_relay::llm::Provider;
    ///
    /// assert_eq!(Provider::from_name("GEMINI"), Some(Provider::Gemini));
    /// assert_eq!(Provider::from_name("openai"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|p| p.id() == name)
    }

    /// Lower-case identifier used in requests and in the status report.
    pub fn id(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
        }
    }

    /// Fixed model every request to this provider uses.
    pub fn model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Groq => "llama-3.3-70b-versatile",
        }
    }

    /// `'gemini' and 'groq'`, for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|p| format!("'{}'", p.id()))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Gemini => "Gemini",
            Provider::Groq => "Groq",
        })
    }
}

/// A single-turn text completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` as one user message and return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Provider handles configured at startup.
///
/// A provider without a handle is "not configured": requests selecting it
/// fail before any network call.
#[derive(Clone, Default)]
pub struct Providers {
    gemini: Option<Arc<dyn CompletionProvider>>,
    groq: Option<Arc<dyn CompletionProvider>>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) the handle for `provider`.
    #[must_use]
    pub fn with(mut self, provider: Provider, client: Arc<dyn CompletionProvider>) -> Self {
        *self.slot(provider) = Some(client);
        self
    }

    fn slot(&mut self, provider: Provider) -> &mut Option<Arc<dyn CompletionProvider>> {
        match provider {
            Provider::Gemini => &mut self.gemini,
            Provider::Groq => &mut self.groq,
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn CompletionProvider>> {
        match provider {
            Provider::Gemini => self.gemini.as_ref(),
            Provider::Groq => self.groq.as_ref(),
        }
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("gemini", &self.gemini.is_some())
            .field("groq", &self.groq.is_some())
            .finish()
    }
}

pub(crate) fn build_http_client(provider: Provider, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| LlmError::ClientBuild { provider, source })
}

/// Send a prepared request and decode a JSON body, mapping every failure to
/// an [`LlmError`] tagged with `provider`.
pub(crate) async fn send_json<R>(
    provider: Provider,
    timeout: Duration,
    request: reqwest::RequestBuilder,
) -> Result<R>
where
    R: DeserializeOwned,
{
    let timed_out = |e: &reqwest::Error| e.is_timeout();

    let response = request.send().await.map_err(|source| {
        if timed_out(&source) {
            LlmError::Timeout {
                provider,
                after: timeout,
            }
        } else {
            LlmError::Transport { provider, source }
        }
    })?;

    let status = response.status();
    tracing::debug!(%provider, status = status.as_u16(), "provider responded");

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(LlmError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    response.json::<R>().await.map_err(|source| {
        if timed_out(&source) {
            LlmError::Timeout {
                provider,
                after: timeout,
            }
        } else {
            LlmError::Decode { provider, source }
        }
    })
}
