//! HTTP transport
//!
//! [`AppService`] holds everything needed to answer a request and can be
//! driven directly in tests. [`HttpServer`] wraps it in a `tiny_http`
//! listener with a fixed worker pool.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{
    parse_query_params, parse_request, read_body, ParsedRequest, RequestError, MAX_BODY_BYTES,
};
pub use response::{body_bytes, into_tiny_response, status_reason};
pub use service::{render_swagger_ui, AppService};
