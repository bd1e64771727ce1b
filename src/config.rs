//! Application configuration
//!
//! Everything is read once from the environment at the binary's edge and then
//! passed down explicitly. The CLI can override any value.
//!
//! | Variable | Default |
//! |---|---|
//! | `OPENAPI_DOC_TITLE` | `Swagger Petstore` |
//! | `OPENAPI_DOC_VERSION` | `1.0.0` |
//! | `OPENAPI_DOC_DESCRIPTION` | pet store blurb |
//! | `OPENAPI_VERSION` | `v3` (3.0.1); `v31` gives 3.1.0 |
//! | `PETSTORE_BIND_ADDR` | `0.0.0.0:7071` |
//! | `PETSTORE_ROUTE_PREFIX` | `api` |
//! | `PETSTORE_WORKERS` | `4` |
//! | `PETSTORE_MOCK_SEED` | unset (seeded from the clock) |

use crate::openapi::OpenApiVersion;
use std::env;

pub const DEFAULT_TITLE: &str = "Swagger Petstore";
pub const DEFAULT_DOC_VERSION: &str = "1.0.0";
pub const DEFAULT_DESCRIPTION: &str = "This is a sample server Petstore API designed by \
[http://swagger.io](http://swagger.io).";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7071";
pub const DEFAULT_ROUTE_PREFIX: &str = "api";
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub doc_title: String,
    pub doc_version: String,
    pub doc_description: String,
    pub openapi_version: OpenApiVersion,
    pub bind_addr: String,
    /// Route prefix without slashes; empty mounts routes at the root
    pub route_prefix: String,
    pub workers: usize,
    /// Fixed base seed for fixtures; `None` seeds from the clock
    pub mock_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            doc_title: DEFAULT_TITLE.to_string(),
            doc_version: DEFAULT_DOC_VERSION.to_string(),
            doc_description: DEFAULT_DESCRIPTION.to_string(),
            openapi_version: OpenApiVersion::default(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            workers: DEFAULT_WORKERS,
            mock_seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup; unparsable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            doc_title: non_empty("OPENAPI_DOC_TITLE").unwrap_or(defaults.doc_title),
            doc_version: non_empty("OPENAPI_DOC_VERSION").unwrap_or(defaults.doc_version),
            doc_description: non_empty("OPENAPI_DOC_DESCRIPTION")
                .unwrap_or(defaults.doc_description),
            openapi_version: non_empty("OPENAPI_VERSION")
                .and_then(|v| OpenApiVersion::parse(&v))
                .unwrap_or(defaults.openapi_version),
            bind_addr: non_empty("PETSTORE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            route_prefix: lookup("PETSTORE_ROUTE_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or(defaults.route_prefix),
            workers: non_empty("PETSTORE_WORKERS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.workers),
            mock_seed: non_empty("PETSTORE_MOCK_SEED").and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Base URL advertised in the document's `servers` block
    #[must_use]
    pub fn server_url(&self) -> String {
        let host = match self.bind_addr.rsplit_once(':') {
            Some(("0.0.0.0", port)) | Some(("[::]", port)) => format!("localhost:{port}"),
            _ => self.bind_addr.clone(),
        };
        if self.route_prefix.is_empty() {
            format!("http://{host}")
        } else {
            format!("http://{host}/{}", self.route_prefix)
        }
    }
}
