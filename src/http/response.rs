//! HTTP/1.1 response builder.
//!
//! Provides a fluent builder API for constructing responses, JSON helpers for
//! the relay's endpoints, and serialization to the wire format.

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use super::{Headers, StatusCode};

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Response under construction. Handlers build one with the chained
/// setters; the connection task encodes it with [`Response::into_bytes`].
///
/// # Examples
///
/// ```
/// use prompt_relay::http::{Response, StatusCode};
///
/// let response = Response::error(StatusCode::BadRequest, "Missing \"prompt\" in request body");
/// assert_eq!(response.status(), StatusCode::BadRequest);
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
/// assert!(text.contains("Content-Type: application/json\r\n"));
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
    keep_alive: bool,
}

impl Response {
    /// Empty-bodied response with keep-alive on.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
            keep_alive: true,
        }
    }

    /// Serializes `value` as the JSON body.
    ///
    /// Serialization failures degrade to a plain-text `500` so a handler can
    /// never produce a half-written body.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .header("Content-Type", JSON_CONTENT_TYPE)
                .body_bytes(body),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::new(StatusCode::InternalServerError).body("response serialization failed")
            }
        }
    }

    /// Builds the `{"error": message}` body every failing endpoint returns.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
        }

        Self::json(
            status,
            &ErrorBody {
                error: message.into(),
            },
        )
    }

    /// Adds a header; repeated names are kept side by side.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    /// In-place variant of [`Response::header`] for middleware that decorates
    /// a response it did not build.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    #[must_use]
    pub fn body(self, text: impl Into<String>) -> Self {
        self.body_bytes(text.into())
    }

    #[must_use]
    pub fn body_bytes(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.body = payload.into();
        self
    }

    /// Chooses the `Connection` header written by [`Response::into_bytes`].
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The body as set by the handler.
    pub fn payload(&self) -> &[u8] {
        &self.body
    }

    /// Encode status line, headers and body for the socket.
    ///
    /// `Content-Length` and `Connection` are always written. A non-empty body
    /// without an explicit `Content-Type` is labelled as UTF-8 text.
    pub fn into_bytes(mut self) -> BytesMut {
        if !self.body.is_empty() && !self.headers.contains("content-type") {
            self.headers.insert("Content-Type", TEXT_CONTENT_TYPE);
        }
        self.headers
            .insert("Connection", if self.keep_alive { "keep-alive" } else { "close" });

        let mut head = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in self.headers.iter() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n\r\n", self.body.len()));

        let mut buf = BytesMut::with_capacity(head.len() + self.body.len());
        buf.put_slice(head.as_bytes());
        buf.put_slice(&self.body);
        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}
