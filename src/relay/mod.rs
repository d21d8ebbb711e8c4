//! Provider selection and response normalization.
//!
//! A [`Relay`] owns the configured [`Providers`] and turns a validated
//! [`PromptRequest`] into an [`Envelope`]:
//!
//! 1. resolve `model_provider` (case-insensitive) or fail with
//!    [`RelayError::UnsupportedProvider`]
//! 2. fail with [`RelayError::ProviderNotConfigured`] if that provider has no
//!    client, before any network traffic
//! 3. render the outbound prompt for the [`Task`]
//! 4. make exactly one provider call
//! 5. for generation, keep only the first fenced code block
//!
//! The relay holds no per-request state, so one instance is shared by every
//! connection behind an `Arc`.

use std::time::Instant;

use serde::Serialize;

use crate::error::RelayError;
use crate::llm::{Provider, Providers};

mod envelope;
mod extract;
mod prompt;
mod request;

pub use envelope::{Envelope, format_elapsed};
pub use extract::extract_code;
pub use prompt::Task;
pub use request::{DEFAULT_COMPLEXITY, DEFAULT_LANGUAGE, DEFAULT_PROVIDER, PromptRequest};

pub const GENERATE_PATH: &str = "/api/ai/generate";
pub const EXPLAIN_PATH: &str = "/api/ai/explain";

pub struct Relay {
    providers: Providers,
}

impl Relay {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Ask the provider for code and return only the code.
    pub async fn generate(&self, request: &PromptRequest) -> Result<Envelope, RelayError> {
        let task = Task::Generate {
            language: &request.language,
            complexity: &request.complexity,
        };
        self.dispatch(request, task).await
    }

    /// Ask the provider to explain the code in the prompt. The completion is
    /// returned untouched.
    pub async fn explain(&self, request: &PromptRequest) -> Result<Envelope, RelayError> {
        self.dispatch(request, Task::Explain).await
    }

    async fn dispatch(&self, request: &PromptRequest, task: Task<'_>) -> Result<Envelope, RelayError> {
        let provider = Provider::from_name(&request.model_provider)
            .ok_or_else(|| RelayError::UnsupportedProvider(request.model_provider.clone()))?;
        let client = self
            .providers
            .get(provider)
            .ok_or(RelayError::ProviderNotConfigured(provider))?;

        let outbound = task.render(&request.prompt);
        tracing::info!(task = task.name(), %provider, model = provider.model(), "dispatching prompt");
        tracing::debug!(prompt = %outbound, "outbound prompt");

        let started = Instant::now();
        let completion = client.complete(&outbound).await.map_err(|err| {
            tracing::error!(task = task.name(), %provider, error = %err, "provider call failed");
            RelayError::from(err)
        })?;

        let result = match task {
            Task::Generate { .. } => extract_code(&completion),
            Task::Explain => completion,
        };

        Ok(Envelope {
            model: provider.model().to_owned(),
            model_provider: request.model_provider.clone(),
            result,
            time_taken: format_elapsed(started.elapsed()),
        })
    }

    /// Snapshot for `GET /api/status`.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            status: "online",
            endpoints: Endpoints {
                generate: GENERATE_PATH,
                explain: EXPLAIN_PATH,
            },
            api_keys: ApiKeys {
                gemini: self.providers.is_configured(Provider::Gemini),
                groq: self.providers.is_configured(Provider::Groq),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub endpoints: Endpoints,
    pub api_keys: ApiKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    pub generate: &'static str,
    pub explain: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiKeys {
    pub gemini: bool,
    pub groq: bool,
}
