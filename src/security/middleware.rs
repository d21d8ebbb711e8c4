//! Cross-Origin Resource Sharing for the relay's browser clients.

use std::pin::Pin;

use crate::{
    Method, Response, StatusCode,
    context::Context,
    middleware::{Middleware, Next},
};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// CORS middleware: handles preflight requests and stamps
/// `Access-Control-*` headers on actual responses.
///
/// # Behavior
///
/// - No `Origin` header, or an origin outside the allow-list: the request
///   passes through untouched.
/// - `OPTIONS` preflight: answered with `204 No Content` here; the router is
///   never reached.
/// - Anything else: the handler runs and the CORS headers are appended.
/// - With the wildcard origin the response carries `*`; a specific origin is
///   echoed back together with `Vary: Origin`.
///
/// # Examples
///
/// ```rust
/// use prompt_relay::security::CorsMiddleware;
///
/// let open = CorsMiddleware::permissive();
/// let locked = CorsMiddleware::with_origins(["http://localhost:5173"]);
/// ```
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CorsMiddleware {
    /// Accept every origin.
    pub fn permissive() -> Self {
        Self::with_origins(["*"])
    }

    /// Accept only the listed origins; `"*"` anywhere in the list accepts all.
    pub fn with_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    fn allow_origin(&self, origin: &str) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            Some("*".to_owned())
        } else if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin.to_owned())
        } else {
            None
        }
    }
}

fn decorate(resp: &mut Response, allow_origin: &str) {
    resp.add_header("Access-Control-Allow-Origin", allow_origin);
    resp.add_header("Access-Control-Allow-Methods", ALLOWED_METHODS);
    resp.add_header("Access-Control-Allow-Headers", ALLOWED_HEADERS);
    if allow_origin != "*" {
        resp.add_header("Vary", "Origin");
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let allow_origin = ctx
            .request()
            .headers()
            .get("origin")
            .and_then(|origin| self.allow_origin(origin));
        let is_preflight = ctx.request().method() == &Method::Options;

        Box::pin(async move {
            let Some(allow_origin) = allow_origin else {
                return next.run(ctx).await;
            };

            if is_preflight {
                let mut resp =
                    Response::new(StatusCode::NoContent).header("Access-Control-Max-Age", "3600");
                decorate(&mut resp, &allow_origin);
                return resp;
            }

            let mut resp = next.run(ctx).await;
            decorate(&mut resp, &allow_origin);
            resp
        })
    }
}
