//! Request routing: map exact URL paths and HTTP methods to handlers.
//!
//! Trailing slashes are normalized on both registered paths and incoming
//! paths, so `/api/status/` and `/api/status` are the same route.
//!
//! Every request runs through the router's middleware stack (in registration
//! order) before reaching its handler. When no route matches, the stack still
//! runs and ends in a JSON fallback:
//!
//! | Situation                          | Response                                 |
//! |------------------------------------|------------------------------------------|
//! | path unknown                       | `404 {"error": "Route not found"}`       |
//! | path known, method not registered  | `405 {"error": "Method not allowed"}`    |

use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::middleware::{Middleware, MiddlewareHandler, Next, from_middleware};
use crate::{Method, Request, Response, StatusCode};

/// Type-erased, heap-allocated async handler.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements it through the blanket impl.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

/// Erase a concrete handler into a [`Handler`].
pub fn into_handler(handler: impl IntoHandler) -> Handler {
    Arc::new(move |ctx| handler.call(ctx))
}

fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// HTTP request router.
///
/// # Examples
///
/// ```rust,no_run
/// use prompt_relay::{Router, Response, StatusCode};
/// use prompt_relay::context::Context;
/// use prompt_relay::middleware::LoggerMiddleware;
///
/// let mut router = Router::new();
/// router.layer(LoggerMiddleware::new());
/// router.get("/ping", |_ctx: Context| async { Response::new(StatusCode::Ok) });
/// ```
pub struct Router {
    routes: Vec<Route>,
    middlewares: Vec<MiddlewareHandler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middlewares: Vec::new(),
        }
    }

    /// Register a handler for `GET` requests on `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Register a handler for `POST` requests on `path`.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, path, handler);
    }

    /// Append a middleware; the first one added is the outermost.
    pub fn layer(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(from_middleware(Arc::new(middleware)));
    }

    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler: into_handler(handler),
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    // First route with the same path and method; otherwise a 405 or 404 fallback.
    fn resolve(&self, method: &Method, path: &str) -> Handler {
        let path = normalize(path);
        let mut path_known = false;

        for route in self.routes.iter().filter(|r| r.path == path) {
            if &route.method == method {
                return route.handler.clone();
            }
            path_known = true;
        }

        if path_known {
            let allow = self
                .routes
                .iter()
                .filter(|r| r.path == path)
                .map(|r| r.method.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            into_handler(move |_ctx: Context| {
                let allow = allow.clone();
                async move {
                    Response::error(StatusCode::MethodNotAllowed, "Method not allowed")
                        .header("Allow", allow)
                }
            })
        } else {
            into_handler(|_ctx: Context| async {
                Response::error(StatusCode::NotFound, "Route not found")
            })
        }
    }

    /// Dispatch `request` through the middleware stack to its handler.
    pub async fn route(&self, request: Request) -> Response {
        let endpoint = self.resolve(request.method(), request.path());
        let chain: Arc<[MiddlewareHandler]> = Arc::from(self.middlewares.as_slice());
        Next::new(chain, endpoint).run(Context::new(request)).await
    }
}
