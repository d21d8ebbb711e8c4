//! HTTP/1.1 listener.
//!
//! One tokio task per connection. Each buffered request is handed to a
//! handler closure; connections stay open unless the client sends
//! `Connection: close` or speaks HTTP/1.0 without keep-alive.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Default cap on a buffered request (head plus body): 10 MiB.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

const INITIAL_BUF_SIZE: usize = 4096;

/// Bound listener plus the per-request size cap.
///
/// ```rust,no_run
/// use prompt_relay::server::Server;
/// use prompt_relay::http::{Request, Response, StatusCode};
///
/// # async fn serve() -> Result<(), prompt_relay::ServerError> {
/// let server = Server::bind("127.0.0.1:0").await?.max_request_size(64 * 1024);
/// let addr = server.local_addr();
/// server
///     .run_until(
///         |req: Request| async move {
///             Response::error(StatusCode::NotFound, format!("nothing at {}", req.path()))
///         },
///         async move { println!("shutting down {addr}") },
///     )
///     .await
/// # }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    max_request_size: usize,
}

impl Server {
    /// Bind `addr` (`host:port`); port `0` picks a free port.
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        })
    }

    /// Requests whose head plus declared body exceed `bytes` get `413`.
    #[must_use]
    pub fn max_request_size(mut self, bytes: usize) -> Self {
        self.max_request_size = bytes;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve forever.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        self.run_until(handler, std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep running on their own tasks; only the
    /// accept loop stops.
    pub async fn run_until<H, F, S>(self, handler: H, shutdown: S) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
        S: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        let max_request_size = self.max_request_size;
        info!(address = %self.local_addr, "prompt-relay listening");

        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) =
                    handle_connection(stream, peer_addr, handler, max_request_size).await
                {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

async fn reject(stream: &mut TcpStream, status: StatusCode, message: String) -> std::io::Result<()> {
    let response = Response::error(status, message).keep_alive(false);
    stream.write_all(&response.into_bytes()).await
}

/// Handles a single TCP connection, one request per loop iteration, until the
/// peer closes it or asks for `Connection: close`.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
    max_request_size: usize,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Pipelined requests may already be buffered; only read when the
        // buffer holds no complete head.
        let (request, body_offset) = match Request::parse_head(&buf) {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                if buf.len() > max_request_size {
                    warn!(peer = %peer_addr, "request head too large, sending 413");
                    reject(&mut stream, StatusCode::PayloadTooLarge, "Request entity too large".into()).await?;
                    break;
                }
                if stream.read_buf(&mut buf).await? == 0 {
                    debug!(peer = %peer_addr, "connection closed by peer");
                    break;
                }
                continue;
            }
            Err(e @ RequestError::UnsupportedTransferEncoding { .. }) => {
                warn!(peer = %peer_addr, error = %e, "unsupported framing, sending 501");
                reject(&mut stream, StatusCode::NotImplemented, e.to_string()).await?;
                break;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request, sending 400");
                reject(&mut stream, StatusCode::BadRequest, format!("Bad Request: {e}")).await?;
                break;
            }
        };

        // A declared length that overflows counts as too large.
        let Some(total_needed) = body_offset
            .checked_add(request.content_length())
            .filter(|&total| total <= max_request_size)
        else {
            warn!(peer = %peer_addr, declared = request.content_length(), "body too large, sending 413");
            reject(&mut stream, StatusCode::PayloadTooLarge, "Request entity too large".into()).await?;
            break;
        };

        // The head is parsed once; the body is read to completion and then
        // split off the buffer without copying.
        if buf.len() < total_needed {
            buf.reserve(total_needed - buf.len());
        }
        while buf.len() < total_needed {
            if stream.read_buf(&mut buf).await? == 0 {
                debug!(peer = %peer_addr, "connection closed mid-body");
                return Ok(());
            }
        }
        let body = buf.split_to(total_needed).freeze().split_off(body_offset);
        let request = request.with_body(body);

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request).await.keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close, shutting down");
            break;
        }
    }

    Ok(())
}
