//! Middleware pipeline: composable before/after logic around route handlers.
//!
//! ## Core types
//!
//! - [`Middleware`]: trait implemented by all middleware.
//! - [`Next`]: cursor into the remaining chain; the last step is the route
//!   handler the router matched for this request.
//! - [`MiddlewareHandler`]: type-erased, cheaply-cloneable middleware function.
//! - [`LoggerMiddleware`]: request id assignment and access logging.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::time::Instant;

use crate::{Response, context::Context, router::Handler};

/// A type-erased, reference-counted middleware function.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is consumed by [`run`](Self::run), so a middleware can forward a
/// request at most once.
pub struct Next {
    middlewares: Arc<[MiddlewareHandler]>,
    index: usize,
    endpoint: Handler,
}

impl Next {
    /// Positions a cursor at the start of `middlewares`, ending in `endpoint`.
    pub fn new(middlewares: Arc<[MiddlewareHandler]>, endpoint: Handler) -> Self {
        Self {
            middlewares,
            index: 0,
            endpoint,
        }
    }

    /// Invokes the next middleware, or the endpoint once the chain is exhausted.
    pub async fn run(mut self, ctx: Context) -> Response {
        if let Some(handler) = self.middlewares.get(self.index).cloned() {
            self.index += 1;
            handler(ctx, self).await
        } else {
            (self.endpoint)(ctx).await
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors may pass the request through (`next.run(ctx).await`),
/// short-circuit with their own [`Response`], or decorate the downstream
/// response.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// Process-unique id assigned to each request by [`LoggerMiddleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Assigns a [`RequestId`] and logs method, path, status and duration once
/// the downstream handler has answered.
#[derive(Default)]
pub struct LoggerMiddleware {
    next_id: AtomicU64,
}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Middleware for LoggerMiddleware {
    fn handle(&self, mut ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().to_string();
            let path = ctx.request().path().to_owned();
            ctx.extensions_mut().insert(id);

            let response = next.run(ctx).await;

            tracing::info!(
                request_id = %id,
                %method,
                %path,
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "request served"
            );

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::into_handler;
    use crate::{Request, StatusCode};

    fn ctx() -> Context {
        let (req, _) = Request::parse(b"GET /api/status HTTP/1.1\r\n\r\n").unwrap();
        Context::new(req)
    }

    fn endpoint(status: StatusCode) -> Handler {
        into_handler(move |_ctx: Context| async move { Response::new(status) })
    }

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn handle(&self, _ctx: Context, _next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
            Box::pin(async { Response::new(StatusCode::NoContent) })
        }
    }

    #[tokio::test]
    async fn empty_chain_reaches_endpoint() {
        let next = Next::new(Arc::from(Vec::new()), endpoint(StatusCode::Ok));
        assert_eq!(next.run(ctx()).await.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn short_circuit_skips_endpoint() {
        let chain: Arc<[MiddlewareHandler]> = Arc::from(vec![from_middleware(Arc::new(ShortCircuit))]);
        let next = Next::new(chain, endpoint(StatusCode::Ok));
        assert_eq!(next.run(ctx()).await.status(), StatusCode::NoContent);
    }

    #[tokio::test]
    async fn logger_injects_increasing_request_ids() {
        let seen = into_handler(|ctx: Context| {
            let id = ctx.extensions().get::<RequestId>().copied();
            async move { Response::new(StatusCode::Ok).body(format!("{:?}", id.map(|i| i.0))) }
        });
        let chain: Arc<[MiddlewareHandler]> =
            Arc::from(vec![from_middleware(Arc::new(LoggerMiddleware::new()))]);

        let first = Next::new(chain.clone(), seen.clone()).run(ctx()).await;
        let second = Next::new(chain, seen).run(ctx()).await;
        assert_eq!(first.payload(), b"Some(1)");
        assert_eq!(second.payload(), b"Some(2)");
    }
}
