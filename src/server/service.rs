use super::request::ParsedRequest;
use super::response::status_reason;
use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, HandlerContext, HandlerRequest, HandlerResponse};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::mock::MockGenerator;
use crate::openapi::SealedRegistry;
use crate::router::{RouteOutcome, Router};
use anyhow::{Context, Result};
use http::Method;
use minijinja::{context, Environment};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

const SWAGGER_UI_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }} - Swagger UI</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = function () {
      window.ui = SwaggerUIBundle({ url: "{{ document_url }}", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// Render the Swagger UI page pointing at `document_url`
pub fn render_swagger_ui(title: &str, document_url: &str) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("swagger-ui", SWAGGER_UI_TEMPLATE)?;
    env.get_template("swagger-ui")?
        .render(context! { title => title, document_url => document_url })
}

/// Documents and pages served by the discovery endpoints, rendered at start-up
#[derive(Debug, Clone)]
struct DiscoveryPages {
    json: String,
    yaml: String,
    swagger_ui: String,
}

/// Request handling independent of the transport
///
/// Owns the router, the dispatcher and the sealed registry. Shared across
/// worker threads behind an `Arc`.
#[derive(Debug)]
pub struct AppService {
    router: Router,
    dispatcher: Dispatcher,
    registry: SealedRegistry,
    prefix: String,
    pages: DiscoveryPages,
    base_seed: u64,
    counter: AtomicU64,
}

impl AppService {
    /// Build the service; fails if a route has no handler or the document
    /// cannot be rendered.
    pub fn new(registry: SealedRegistry, dispatcher: Dispatcher, config: &AppConfig) -> Result<Self> {
        dispatcher.verify_routes(&registry.routes)?;
        let prefix = config.route_prefix.trim_matches('/').to_string();
        let router = Router::new(&registry.routes, &prefix);
        let json_url = join_prefix(&prefix, "/openapi/v3.json");
        let pages = DiscoveryPages {
            json: registry
                .document
                .to_json()
                .context("failed to render the OpenAPI document as JSON")?,
            yaml: registry
                .document
                .to_yaml()
                .context("failed to render the OpenAPI document as YAML")?,
            swagger_ui: render_swagger_ui(registry.document.title(), &json_url)
                .context("failed to render the Swagger UI page")?,
        };
        let base_seed = config.mock_seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });
        Ok(Self {
            router,
            dispatcher,
            registry,
            prefix,
            pages,
            base_seed,
            counter: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handle one request; every response carries `x-request-id`
    #[must_use]
    pub fn handle(&self, req: ParsedRequest) -> HandlerResponse {
        let started = Instant::now();
        let request_id = RequestId::from_header_or_new(req.get_header(REQUEST_ID_HEADER));
        let method = req.method.clone();
        let path = req.path.clone();

        let (operation, response) = match self.discovery(&req.method, &req.path) {
            Some(resp) => ("discovery".to_string(), resp),
            None => self.route(req, request_id),
        };
        let response = response.with_header(REQUEST_ID_HEADER, request_id.to_string());

        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            operation_id = %operation,
            status = response.status,
            latency_us = started.elapsed().as_micros() as u64,
            "request"
        );
        response
    }

    fn discovery(&self, method: &Method, path: &str) -> Option<HandlerResponse> {
        if *method != Method::GET {
            return None;
        }
        let path = path.trim_end_matches('/');
        if path.eq_ignore_ascii_case("/health") {
            return Some(HandlerResponse::json(200, serde_json::json!({ "status": "ok" })));
        }
        let is = |target: &str| path.eq_ignore_ascii_case(&join_prefix(&self.prefix, target));
        let json = |body: &String| {
            HandlerResponse::text(200, "application/json; charset=utf-8", body.clone())
        };
        if is("/openapi/v3.json") || is("/swagger.json") {
            return Some(json(&self.pages.json));
        }
        if is("/openapi/v3.yaml") {
            return Some(HandlerResponse::text(
                200,
                "text/yaml; charset=utf-8",
                self.pages.yaml.clone(),
            ));
        }
        if is("/swagger/ui") {
            return Some(HandlerResponse::text(
                200,
                "text/html; charset=utf-8",
                self.pages.swagger_ui.clone(),
            ));
        }
        None
    }

    fn route(&self, req: ParsedRequest, request_id: RequestId) -> (String, HandlerResponse) {
        match self.router.route(&req.method, &req.path) {
            RouteOutcome::Matched(m) => {
                let operation_id = m.operation_id().to_string();
                let handler_req = HandlerRequest {
                    request_id,
                    method: req.method,
                    path: req.path,
                    operation_id: operation_id.clone(),
                    path_params: m.path_params,
                    query_params: req.query_params,
                    headers: req.headers,
                    body: req.body,
                };
                let seed = self
                    .base_seed
                    .wrapping_add(self.counter.fetch_add(1, Ordering::Relaxed));
                let mut ctx = HandlerContext {
                    document_title: self.registry.document.title(),
                    mock: MockGenerator::new(&self.registry.schemas, seed),
                };
                let response = self.dispatcher.dispatch(&handler_req, &mut ctx);
                (operation_id, response)
            }
            RouteOutcome::MethodNotAllowed { allowed } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let resp = HandlerResponse::error(405, status_reason(405)).with_header("allow", allow);
                (String::new(), resp)
            }
            RouteOutcome::NotFound => (String::new(), HandlerResponse::error(404, status_reason(404))),
        }
    }
}

fn join_prefix(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("/{prefix}{path}")
    }
}
