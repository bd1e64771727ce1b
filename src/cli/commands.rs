use crate::config::AppConfig;
use crate::openapi::{OpenApiVersion, PathSegment, RouteTable};
use crate::petstore;
use crate::server::{AppService, HttpServer};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface for the pet store function-app
///
/// Every option falls back to its environment variable (see
/// [`AppConfig`](crate::config::AppConfig)) and then to the built-in default.
#[derive(Debug, Parser)]
#[command(name = "petstore")]
#[command(about = "Swagger Petstore mock function-app", long_about = None, version)]
pub struct Cli {
    /// Document title
    #[arg(long, global = true)]
    pub title: Option<String>,

    /// Document version (`info.version`)
    #[arg(long, global = true)]
    pub doc_version: Option<String>,

    /// OpenAPI version: v3 (3.0.1) or v31 (3.1.0)
    #[arg(long, global = true)]
    pub openapi_version: Option<String>,

    /// Route prefix every operation is mounted under
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile the registry and serve the API
    Serve {
        /// Address to bind
        #[arg(long)]
        addr: Option<String>,

        /// Worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Fixed base seed for generated fixtures
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print or write the compiled OpenAPI document
    Document {
        #[arg(short, long, value_enum, default_value_t = DocumentFormat::Json)]
        format: DocumentFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered routes
    Routes,
}

impl Cli {
    /// Apply command-line overrides on top of `base`
    pub fn config(&self, base: AppConfig) -> anyhow::Result<AppConfig> {
        let mut config = base;
        if let Some(title) = &self.title {
            config.doc_title.clone_from(title);
        }
        if let Some(version) = &self.doc_version {
            config.doc_version.clone_from(version);
        }
        if let Some(raw) = &self.openapi_version {
            config.openapi_version = OpenApiVersion::parse(raw)
                .ok_or_else(|| anyhow!("unsupported OpenAPI version '{raw}'"))?;
        }
        if let Some(prefix) = &self.prefix {
            config.route_prefix = prefix.trim_matches('/').to_string();
        }
        if let Commands::Serve {
            addr,
            workers,
            seed,
        } = &self.command
        {
            if let Some(addr) = addr {
                config.bind_addr.clone_from(addr);
            }
            if let Some(workers) = workers {
                config.workers = (*workers).max(1);
            }
            if seed.is_some() {
                config.mock_seed = *seed;
            }
        }
        Ok(config)
    }
}

/// Parse the command line and run it against the environment configuration
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config(AppConfig::from_env())?;
    run(&cli.command, &config)
}

/// Run one command
pub fn run(command: &Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve { .. } => serve(config),
        Commands::Document { format, output } => {
            let rendered = render_document(config, *format)?;
            match output {
                Some(path) => fs::write(path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => io::stdout()
                    .lock()
                    .write_all(rendered.as_bytes())
                    .context("failed to write the document to stdout")?,
            }
            Ok(())
        }
        Commands::Routes => {
            let registry = petstore::build_registry()?;
            let mut out = io::stdout().lock();
            for line in route_lines(registry.routes()) {
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
    }
}

fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let registry = petstore::sealed_registry(config).context("failed to build the API registry")?;
    let service = AppService::new(registry, petstore::dispatcher(), config)?;
    let handle = HttpServer::new(Arc::new(service), config.workers)
        .start(config.bind_addr.as_str())
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        addr = %handle.local_addr(),
        docs = %format!("{}/swagger/ui", config.server_url()),
        "pet store ready"
    );
    handle
        .join()
        .map_err(|e| anyhow!("server worker panicked: {e:?}"))
}

/// Compile the document and render it in `format`
pub fn render_document(config: &AppConfig, format: DocumentFormat) -> anyhow::Result<String> {
    let document = petstore::document(config).context("failed to compile the OpenAPI document")?;
    let rendered = match format {
        DocumentFormat::Json => document.to_json()?,
        DocumentFormat::Yaml => document.to_yaml()?,
    };
    Ok(rendered)
}

/// One tab-separated line per route: method, path, operation id, constraint
#[must_use]
pub fn route_lines(routes: &RouteTable) -> Vec<String> {
    routes
        .iter()
        .map(|entry| {
            let constraints: Vec<String> = entry
                .template
                .segments()
                .iter()
                .filter_map(|segment| match segment {
                    PathSegment::Param {
                        name,
                        constraint: Some(c),
                    } => Some(format!("{name}:{c}")),
                    _ => None,
                })
                .collect();
            format!(
                "{}\t{}\t{}\t{}",
                entry.descriptor.method,
                entry.template.normalized(),
                entry.operation_id(),
                if constraints.is_empty() {
                    "-".to_string()
                } else {
                    constraints.join(",")
                }
            )
        })
        .collect()
}
