use crate::dispatcher::{HandlerResponse, ResponseBody};
use std::io::Cursor;
use tracing::warn;

/// Reason phrase for the status line
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

/// Serialise the body; JSON that fails to serialise becomes an empty body
#[must_use]
pub fn body_bytes(body: &ResponseBody) -> Vec<u8> {
    match body {
        ResponseBody::Empty => Vec::new(),
        ResponseBody::Text(s) => s.clone().into_bytes(),
        ResponseBody::Json(v) => serde_json::to_vec(v).unwrap_or_else(|e| {
            warn!(error = %e, "failed to serialise response body");
            Vec::new()
        }),
    }
}

/// Convert to a `tiny_http` response
#[must_use]
pub fn into_tiny_response(resp: HandlerResponse) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let mut out = tiny_http::Response::from_data(body_bytes(&resp.body))
        .with_status_code(tiny_http::StatusCode(resp.status));
    for (name, value) in &resp.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out = out.with_header(header),
            Err(()) => warn!(header = %name, "dropping header with non-ASCII content"),
        }
    }
    out
}
