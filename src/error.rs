//! Request-level failures and their HTTP mapping.

use thiserror::Error;

use crate::http::{Response, StatusCode};
use crate::llm::{LlmError, Provider};

/// Everything that can end a relay request early.
///
/// The `Display` text is the `error` field of the JSON body; provider call
/// failures pass the client error through verbatim.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing \"prompt\" in request body")]
    MissingPrompt,

    #[error(
        "Unsupported model provider: {0}. Supported providers are {supported}.",
        supported = Provider::supported_list()
    )]
    UnsupportedProvider(String),

    #[error("{0} API key not configured in environment variables")]
    ProviderNotConfigured(Provider),

    #[error(transparent)]
    ProviderCall(#[from] LlmError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingPrompt | RelayError::UnsupportedProvider(_) => StatusCode::BadRequest,
            RelayError::ProviderNotConfigured(_) | RelayError::ProviderCall(_) => {
                StatusCode::InternalServerError
            }
        }
    }
}

impl From<RelayError> for Response {
    fn from(err: RelayError) -> Self {
        Response::error(err.status(), err.to_string())
    }
}
