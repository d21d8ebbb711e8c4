//! HTTP surface of the relay.
//!
//! | Method | Path                | Handler                        |
//! |--------|---------------------|--------------------------------|
//! | GET    | `/api/status`       | provider key report            |
//! | GET    | `/health`           | liveness with a UTC timestamp  |
//! | POST   | `/api/ai/generate`  | [`Relay::generate`]            |
//! | POST   | `/api/ai/explain`   | [`Relay::explain`]             |

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::context::Context;
use crate::error::RelayError;
use crate::middleware::{LoggerMiddleware, RequestId};
use crate::relay::{EXPLAIN_PATH, Envelope, GENERATE_PATH, PromptRequest, Relay};
use crate::router::Router;
use crate::security::CorsMiddleware;
use crate::{Response, StatusCode};

pub const STATUS_PATH: &str = "/api/status";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
}

/// Build the application router around a shared [`Relay`].
///
/// The logger runs outermost so it sees CORS preflight responses too.
pub fn router(relay: Arc<Relay>, cors: CorsMiddleware) -> Router {
    let mut router = Router::new();
    router.layer(LoggerMiddleware::new());
    router.layer(cors);

    let status_relay = Arc::clone(&relay);
    router.get(STATUS_PATH, move |_ctx: Context| {
        let relay = Arc::clone(&status_relay);
        async move { Response::json(StatusCode::Ok, &relay.status()) }
    });

    router.get(HEALTH_PATH, |_ctx: Context| async {
        let health = Health {
            status: "OK",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        Response::json(StatusCode::Ok, &health)
    });

    let generate_relay = Arc::clone(&relay);
    router.post(GENERATE_PATH, move |ctx: Context| {
        let relay = Arc::clone(&generate_relay);
        async move {
            let outcome = match parse_prompt(&ctx) {
                Ok(request) => relay.generate(&request).await,
                Err(err) => Err(err),
            };
            respond(&ctx, outcome)
        }
    });

    router.post(EXPLAIN_PATH, move |ctx: Context| {
        let relay = Arc::clone(&relay);
        async move {
            let outcome = match parse_prompt(&ctx) {
                Ok(request) => relay.explain(&request).await,
                Err(err) => Err(err),
            };
            respond(&ctx, outcome)
        }
    });

    router
}

// An undecodable body is treated like an empty one.
fn parse_prompt(ctx: &Context) -> Result<PromptRequest, RelayError> {
    let body = ctx.json::<Value>().ok();
    PromptRequest::from_json(body.as_ref())
}

fn respond(ctx: &Context, outcome: Result<Envelope, RelayError>) -> Response {
    match outcome {
        Ok(envelope) => Response::json(StatusCode::Ok, &envelope),
        Err(err) => {
            let request_id = ctx.extensions().get::<RequestId>().map(ToString::to_string);
            tracing::warn!(
                request_id = request_id.as_deref().unwrap_or("-"),
                path = ctx.request().path(),
                status = err.status().as_u16(),
                error = %err,
                "request rejected"
            );
            Response::from(err)
        }
    }
}
