use crate::dispatcher::HeaderVec;
use crate::router::ParamVec;
use http::Method;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

/// Largest request body accepted; anything bigger is answered with a 413
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Why a transport request could not become a [`ParsedRequest`]
#[derive(Debug)]
pub enum RequestError {
    /// Unknown method or a body that could not be read
    Malformed(io::Error),
    /// Body longer than [`MAX_BODY_BYTES`]
    TooLarge { limit: u64 },
}

impl RequestError {
    /// Status code to answer with
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Malformed(_) => 400,
            Self::TooLarge { .. } => 413,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed request: {e}"),
            Self::TooLarge { limit } => write!(f, "request body exceeds {limit} bytes"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            Self::TooLarge { .. } => None,
        }
    }
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        Self::Malformed(e)
    }
}

/// Transport-independent view of an HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Header names lowercased
    pub headers: HeaderVec,
    pub query_params: ParamVec,
    pub body: Vec<u8>,
}

impl ParsedRequest {
    /// Build from a method and a raw request target such as `/api/pet?x=1`
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method,
            path: path.to_string(),
            headers: HeaderVec::new(),
            query_params: parse_query_params(query),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a query string into ordered, decoded pairs
///
/// Repeated names are kept in arrival order. `+` decodes to a space.
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

/// Read a whole body, failing once it grows past `limit` bytes
pub fn read_body<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>, RequestError> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() as u64 > limit {
        return Err(RequestError::TooLarge { limit });
    }
    Ok(body)
}

/// Extract a [`ParsedRequest`] from a `tiny_http` request, reading the body
///
/// A declared `Content-Length` over [`MAX_BODY_BYTES`] is refused before any
/// of the body is read.
pub fn parse_request(req: &mut tiny_http::Request) -> Result<ParsedRequest, RequestError> {
    let method = Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    if req.body_length().is_some_and(|len| len as u64 > MAX_BODY_BYTES) {
        return Err(RequestError::TooLarge {
            limit: MAX_BODY_BYTES,
        });
    }
    let mut parsed = ParsedRequest::new(method, req.url());
    for header in req.headers() {
        parsed = parsed.with_header(header.field.as_str().as_str(), header.value.as_str());
    }
    let body = read_body(req.as_reader(), MAX_BODY_BYTES)?;
    debug!(
        method = %parsed.method,
        path = %parsed.path,
        headers = parsed.headers.len(),
        body_len = body.len(),
        "parsed request"
    );
    Ok(parsed.with_body(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_split() {
        let req = ParsedRequest::new(Method::GET, "/api/pet/findByStatus?status=available&status=sold");
        assert_eq!(req.path, "/api/pet/findByStatus");
        assert_eq!(req.query_params.len(), 2);
        assert_eq!(req.query_params[1].1, "sold");
    }

    #[test]
    fn test_query_decoding() {
        let params = parse_query_params("username=jane+doe&password=p%40ss");
        assert_eq!(params[0].1, "jane doe");
        assert_eq!(params[1].1, "p@ss");
        assert!(parse_query_params("").is_empty());
    }

    #[test]
    fn test_headers_lowercased() {
        let req = ParsedRequest::new(Method::DELETE, "/api/pet/1").with_header("API_KEY", "secret");
        assert_eq!(req.headers[0].0.as_ref(), "api_key");
        assert_eq!(req.get_header("Api_Key"), Some("secret"));
    }

    #[test]
    fn test_read_body_limit() {
        let body = read_body(&b"{\"id\":1, \"name\":\"rex\"}"[..], 8).unwrap_err();
        assert!(matches!(body, RequestError::TooLarge { limit: 8 }));
        assert_eq!(body.status(), 413);

        let exact = read_body(&b"12345678"[..], 8).unwrap();
        assert_eq!(exact, b"12345678");
        assert!(read_body(io::empty(), 0).unwrap().is_empty());
    }
}
