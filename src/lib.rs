//! # Pet Store OpenAPI
//!
//! A mock "Swagger Petstore" HTTP function-app whose API surface is declared
//! explicitly at start-up and compiled once into an OpenAPI 3.x document.
//!
//! ## Overview
//!
//! Every endpoint logs a line, builds a payload from a schema-driven fixture
//! generator and returns it. There is no persistence and no authentication
//! enforcement; security schemes exist only in the document.
//!
//! ## Architecture
//!
//! - **[`openapi`]** - schema, security scheme and route registries plus the
//!   document compiler
//! - **[`petstore`]** - the catalogue (10 schemas, 2 schemes, 18 routes) and
//!   its handlers
//! - **[`mock`]** - seeded generator producing values that conform to a shape
//! - **[`router`]** - segment matcher with literal-first precedence
//! - **[`dispatcher`]** - operation id to handler mapping
//! - **[`server`]** - `tiny_http` transport and discovery endpoints
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - the binary's edge
//!
//! ### Start-up flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Main as petstore serve
//!     participant Cat as petstore::build_registry
//!     participant Reg as ApiRegistry
//!     participant Comp as compile_document
//!     participant Srv as HttpServer
//!
//!     Main->>Cat: build_registry()
//!     Cat->>Reg: register_schema / register_scheme / add_route
//!     Reg-->>Cat: Ok or RegistryError (fatal)
//!     Main->>Reg: compile(&DocumentInfo)
//!     Reg->>Comp: closure check, build JSON
//!     Comp-->>Reg: Arc<CompiledDocument>
//!     Reg-->>Main: Sealed
//!     Main->>Srv: start(addr)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use petstore_openapi::config::AppConfig;
//! use petstore_openapi::petstore;
//!
//! let config = AppConfig::default();
//! let document = petstore::document(&config)?;
//! println!("{}", document.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod mock;
pub mod openapi;
pub mod petstore;
pub mod router;
pub mod server;

pub use dispatcher::{Dispatcher, HandlerContext, HandlerRequest, HandlerResponse};
pub use error::{RegistryError, RegistryResult};
pub use mock::MockGenerator;
pub use openapi::{ApiRegistry, CompiledDocument, DocumentInfo, RegistryState};
pub use router::{RouteOutcome, Router};
pub use server::{AppService, HttpServer, ServerHandle};
