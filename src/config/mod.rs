//! Runtime configuration from flags and environment variables.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::llm::{self, GeminiClient, GroqClient, LlmError, Provider, Providers};
use crate::security::CorsMiddleware;
use crate::server::DEFAULT_MAX_REQUEST_SIZE;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "prompt-relay",
    version,
    about = "HTTP relay that forwards code prompts to Gemini or Groq"
)]
pub struct Config {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Google Gemini API key. Gemini stays disabled when unset or empty.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Groq API key. Groq stays disabled when unset or empty.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = llm::gemini::DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    #[arg(long, env = "GROQ_BASE_URL", default_value = llm::groq::DEFAULT_BASE_URL)]
    pub groq_base_url: String,

    /// Seconds before an outbound provider call is abandoned.
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = 60)]
    pub provider_timeout_secs: u64,

    /// Largest accepted request (head plus body), in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_REQUEST_SIZE)]
    pub max_body_bytes: usize,

    /// Comma-separated origins allowed by CORS; `*` allows any.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Key for `provider`, if one was supplied and is not blank.
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Groq => self.groq_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    /// Build a client for every provider that has a key.
    pub fn providers(&self) -> Result<Providers, LlmError> {
        let timeout = self.provider_timeout();
        let mut providers = Providers::new();

        if let Some(key) = self.api_key(Provider::Gemini) {
            let client = GeminiClient::new(key, &self.gemini_base_url, timeout)?;
            providers = providers.with(Provider::Gemini, Arc::new(client));
        }
        if let Some(key) = self.api_key(Provider::Groq) {
            let client = GroqClient::new(key, &self.groq_base_url, timeout)?;
            providers = providers.with(Provider::Groq, Arc::new(client));
        }

        Ok(providers)
    }

    pub fn cors(&self) -> CorsMiddleware {
        let origins = self
            .cors_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty());
        CorsMiddleware::with_origins(origins)
    }
}
