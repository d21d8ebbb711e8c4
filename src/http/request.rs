//! HTTP/1.1 request parsing using the [`httparse`] crate.

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request head.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength { value: String },

    #[error("transfer encoding {encoding:?} is not supported")]
    UnsupportedTransferEncoding { encoding: String },
}

/// A parsed HTTP/1.1 request.
///
/// The body holds at most `Content-Length` bytes; anything after it in the
/// input buffer belongs to the next pipelined request.
///
/// # Examples
///
/// ```
/// use prompt_relay::http::request::Request;
///
/// let raw = b"POST /api/ai/explain?x=1 HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}";
/// let (request, offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.path(), "/api/ai/explain");
/// assert_eq!(request.content_length(), 2);
/// assert_eq!(&request.body()[..], b"{}");
/// assert_eq!(offset + 2, raw.len());
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    content_length: usize,
    body: Bytes,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Parse a request from `buf`.
    ///
    /// Returns the request and the offset at which its body starts. The body
    /// is filled with whatever part of it is already present in `buf`; callers
    /// compare `offset + content_length()` against the buffer length to know
    /// whether the body is complete.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: the header block is not fully received.
    /// - [`RequestError::Parse`]: the head is malformed.
    /// - [`RequestError::InvalidContentLength`]: `Content-Length` is not a number.
    /// - [`RequestError::UnsupportedTransferEncoding`]: chunked (or any other
    ///   transfer coding) bodies are not accepted.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let (request, body_offset) = Self::parse_head(buf)?;
        let available = &buf[body_offset..];
        let body = Bytes::copy_from_slice(&available[..available.len().min(request.content_length)]);
        Ok((request.with_body(body), body_offset))
    }

    /// Parse only the head; the body is left empty.
    ///
    /// The connection loop uses this so that a body arriving over several
    /// reads is never copied more than once.
    pub fn parse_head(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method: Method = match raw_req.method {
            Some(m) => match m.parse() {
                Ok(method) => method,
                Err(never) => match never {},
            },
            None => return Err(RequestError::MissingField { field: "method" }),
        };

        let raw_path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;
        // The relay has no use for query strings.
        let path = raw_path
            .split_once('?')
            .map_or(raw_path, |(path, _)| path)
            .to_owned();

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        if let Some(encoding) = header_map.get("transfer-encoding") {
            return Err(RequestError::UnsupportedTransferEncoding {
                encoding: encoding.to_owned(),
            });
        }

        let content_length = match header_map.get("content-length") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| RequestError::InvalidContentLength {
                    value: value.to_owned(),
                })?,
            None => 0,
        };

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                content_length,
                body: Bytes::new(),
            },
            body_offset,
        ))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version number (0 = HTTP/1.0, 1 = HTTP/1.1).
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Declared body length; `0` when the header is absent.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Attach the body bytes read after the head.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_probe() {
        let raw = b"GET /api/status HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/api/status");
        assert_eq!(req.version(), 1);
        assert_eq!(req.content_length(), 0);
        assert!(req.body().is_empty());
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn query_string_is_dropped() {
        let raw = b"GET /health?verbose=1 HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/health");
    }

    #[test]
    fn incomplete_head() {
        let raw = b"POST /api/ai/generate HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn body_stops_at_content_length() {
        let raw = b"POST /a HTTP/1.1\r\nContent-Length: 4\r\n\r\nbodyGET /b HTTP/1.1\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(&req.body()[..], b"body");
        assert_eq!(&raw[offset + 4..offset + 7], b"GET");
    }

    #[test]
    fn partial_body_is_reported_through_length() {
        let raw = b"POST /a HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), 10);
        assert_eq!(req.body().len(), 3);
    }

    #[test]
    fn head_only_parse_leaves_body_empty() {
        let raw = b"POST /a HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody";
        let (req, offset) = Request::parse_head(raw).unwrap();
        assert_eq!(req.content_length(), 4);
        assert!(req.body().is_empty());

        let req = req.with_body(Bytes::copy_from_slice(&raw[offset..]));
        assert_eq!(&req.body()[..], b"body");
    }

    #[test]
    fn huge_content_length_parses_without_panicking() {
        let raw = format!("POST /a HTTP/1.1\r\nContent-Length: {}\r\n\r\n", usize::MAX);
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        assert_eq!(req.content_length(), usize::MAX);
        assert!(req.body().is_empty());
    }

    #[test]
    fn bad_content_length() {
        let raw = b"POST /a HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
        assert!(matches!(
            Request::parse(raw),
            Err(RequestError::InvalidContentLength { .. })
        ));
    }

    #[test]
    fn chunked_is_rejected() {
        let raw = b"POST /a HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
        assert!(matches!(
            Request::parse(raw),
            Err(RequestError::UnsupportedTransferEncoding { .. })
        ));
    }

    #[test]
    fn http10_closes_by_default() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn explicit_connection_close() {
        let raw = b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(!req.is_keep_alive());
    }
}
