//! Operation dispatch
//!
//! The [`Dispatcher`] maps operation ids to handler functions. Every route in
//! the table must have a handler before the server starts; see
//! [`Dispatcher::verify_routes`]. Handler panics are caught and turned into a
//! 500 response so one bad handler cannot take down a worker thread.

use crate::error::RegistryResult;
use crate::ids::RequestId;
use crate::mock::MockGenerator;
use crate::openapi::RouteTable;
use crate::router::ParamVec;
use anyhow::bail;
use http::Method;
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header name/value pairs; names are stored lowercase
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data passed to a handler
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    pub operation_id: String,
    pub path_params: ParamVec,
    /// Query pairs in arrival order; repeated names are kept
    pub query_params: ParamVec,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HandlerRequest {
    /// Get a path parameter by name
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name; the last occurrence wins
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value supplied for `name`
    ///
    /// Handles both exploded (`?tags=a&tags=b`) and comma-separated
    /// (`?tags=a,b`) forms. Empty items are dropped.
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

/// Response produced by a handler or by the service itself
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: ResponseBody,
}

impl HandlerResponse {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json; charset=utf-8".to_string()));
        Self {
            status,
            headers,
            body: ResponseBody::Json(body),
        }
    }

    #[must_use]
    pub fn text(status: u16, content_type: &str, body: String) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), content_type.to_string()));
        Self {
            status,
            headers,
            body: ResponseBody::Text(body),
        }
    }

    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// JSON error body: `{"error": message}`
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: String) -> Self {
        self.set_header(name, value);
        self
    }
}

/// Per-request state handed to a handler
pub struct HandlerContext<'a> {
    pub document_title: &'a str,
    pub mock: MockGenerator<'a>,
}

/// Result a handler returns; errors become a 500
pub type HandlerResult = RegistryResult<HandlerResponse>;

/// A request handler
pub type Handler = Arc<dyn Fn(&HandlerRequest, &mut HandlerContext<'_>) -> HandlerResult + Send + Sync>;

#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("Dispatcher").field("handlers", &names).finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for an operation id, replacing any earlier one
    pub fn register<F>(&mut self, operation_id: &str, handler: F)
    where
        F: Fn(&HandlerRequest, &mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        if self
            .handlers
            .insert(operation_id.to_string(), Arc::new(handler))
            .is_some()
        {
            warn!(operation_id, "handler replaced");
        }
        debug!(operation_id, "handler registered");
    }

    #[must_use]
    pub fn has_handler(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Check that every route has a handler
    ///
    /// Handlers without a route are only logged.
    pub fn verify_routes(&self, routes: &RouteTable) -> anyhow::Result<()> {
        let missing: Vec<&str> = routes
            .iter()
            .map(|r| r.operation_id())
            .filter(|id| !self.handlers.contains_key(*id))
            .collect();
        for id in self.handlers.keys() {
            if routes.get(id).is_none() {
                warn!(operation_id = %id, "handler has no matching route");
            }
        }
        if !missing.is_empty() {
            bail!("no handler registered for: {}", missing.join(", "));
        }
        Ok(())
    }

    /// Run the handler for `req.operation_id`
    pub fn dispatch(&self, req: &HandlerRequest, ctx: &mut HandlerContext<'_>) -> HandlerResponse {
        let Some(handler) = self.handlers.get(&req.operation_id) else {
            error!(
                request_id = %req.request_id,
                operation_id = %req.operation_id,
                "no handler for operation"
            );
            return HandlerResponse::error(501, "Not Implemented");
        };

        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| handler(req, ctx))) {
            Ok(Ok(response)) => {
                debug!(
                    request_id = %req.request_id,
                    operation_id = %req.operation_id,
                    status = response.status,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "handler complete"
                );
                response
            }
            Ok(Err(err)) => {
                error!(
                    request_id = %req.request_id,
                    operation_id = %req.operation_id,
                    error = %err,
                    "handler failed"
                );
                HandlerResponse::error(500, &err.to_string())
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    request_id = %req.request_id,
                    operation_id = %req.operation_id,
                    panic_message = %message,
                    "handler panicked"
                );
                HandlerResponse::error(500, &format!("Handler panicked: {message}"))
            }
        }
    }
}
