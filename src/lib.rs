//! # prompt-relay
//!
//! A small async HTTP/1.1 service that forwards a code prompt to Google
//! Gemini or Groq and returns the completion.
//!
//! `POST /api/ai/generate` wraps the prompt in a code-only instruction and
//! returns the first fenced code block of the reply. `POST /api/ai/explain`
//! asks for an explanation and returns the reply as-is.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use prompt_relay::api;
//! use prompt_relay::llm::{GroqClient, Provider, Providers};
//! use prompt_relay::relay::Relay;
//! use prompt_relay::security::CorsMiddleware;
//! use prompt_relay::{Request, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let groq = GroqClient::new("gsk-...", "https://api.groq.com", std::time::Duration::from_secs(60))?;
//!     let relay = Relay::new(Providers::new().with(Provider::Groq, Arc::new(groq)));
//!     let router = Arc::new(api::router(Arc::new(relay), CorsMiddleware::permissive()));
//!
//!     let server = Server::bind("127.0.0.1:5000").await?;
//!     server
//!         .run(move |req: Request| {
//!             let router = Arc::clone(&router);
//!             async move { router.route(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod llm;
pub mod middleware;
pub mod relay;
pub mod router;
pub mod security;
pub mod server;

pub use config::Config;
pub use error::RelayError;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use relay::Relay;
pub use router::Router;
pub use server::{Server, ServerError};
