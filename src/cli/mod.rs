//! # CLI Module
//!
//! Command-line entry points for the `petstore` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Build and compile the registry, then serve the API. Any registry error
//! aborts start-up with a non-zero exit code.
//!
//! ```bash
//! petstore serve --addr 127.0.0.1:7071 --workers 8
//! ```
//!
//! ### `document`
//!
//! Print the compiled OpenAPI document, or write it to a file:
//!
//! ```bash
//! petstore document --format yaml --output openapi.yaml
//! ```
//!
//! ### `routes`
//!
//! List every route with its method, path, operation id and inline
//! constraint.
//!
//! ## Configuration
//!
//! Global flags (`--title`, `--doc-version`, `--openapi-version`,
//! `--prefix`) override the environment, which overrides the defaults. See
//! [`crate::config`].

mod commands;


pub use commands::{render_document, route_lines, run, run_cli, Cli, Commands, DocumentFormat};
