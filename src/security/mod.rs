//! Security middleware.

mod middleware;

pub use middleware::CorsMiddleware;
