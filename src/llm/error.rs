use std::time::Duration;

use thiserror::Error;

use super::Provider;

/// Failures talking to a completion provider.
///
/// The `Display` output is what callers of the relay see in the `error`
/// field, so it includes the upstream body for non-success statuses.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to build HTTP client for {provider}: {source}")]
    ClientBuild {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid {provider} API key: {reason}")]
    InvalidApiKey { provider: Provider, reason: String },

    #[error("{provider} request timed out after {after:?}")]
    Timeout { provider: Provider, after: Duration },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API returned {status}: {body}")]
    Api {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("failed to parse {provider} response: {source}")]
    Decode {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} response contained no text")]
    EmptyResponse { provider: Provider },
}

pub type Result<T> = std::result::Result<T, LlmError>;
