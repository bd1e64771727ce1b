use super::compiler::{compile_document, CompiledDocument, DocumentInfo};
use super::routes::RouteTable;
use super::schema::{SchemaRegistry, SchemaShape};
use super::security::{SecurityScheme, SecuritySchemeRegistry};
use super::types::RouteDescriptor;
use crate::error::{RegistryError, RegistryResult};
use std::sync::Arc;
use tracing::info;

/// Lifecycle of an [`ApiRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Open,
    Sealed,
}

/// The three registries plus the seal
///
/// Mutators work while the set is [`RegistryState::Open`]. The first
/// successful [`ApiRegistry::compile`] seals it; after that every mutator
/// returns `RegistryClosed` and `compile` hands back the same document.
#[derive(Debug)]
pub struct ApiRegistry {
    schemas: SchemaRegistry,
    schemes: SecuritySchemeRegistry,
    routes: RouteTable,
    compiled: Option<Arc<CompiledDocument>>,
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemas: SchemaRegistry::new(),
            schemes: SecuritySchemeRegistry::new(),
            routes: RouteTable::new(),
            compiled: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> RegistryState {
        if self.compiled.is_some() {
            RegistryState::Sealed
        } else {
            RegistryState::Open
        }
    }

    fn ensure_open(&self) -> RegistryResult<()> {
        match self.state() {
            RegistryState::Open => Ok(()),
            RegistryState::Sealed => Err(RegistryError::RegistryClosed),
        }
    }

    pub fn register_schema(&mut self, name: &str, shape: SchemaShape) -> RegistryResult<()> {
        self.ensure_open()?;
        self.schemas.register(name, shape)
    }

    pub fn register_scheme(&mut self, name: &str, scheme: SecurityScheme) -> RegistryResult<()> {
        self.ensure_open()?;
        self.schemes.register(name, scheme)
    }

    pub fn add_route(&mut self, descriptor: RouteDescriptor) -> RegistryResult<()> {
        self.ensure_open()?;
        self.routes
            .add_route(descriptor, &self.schemas, &self.schemes)
    }

    /// Compile and seal
    ///
    /// A failed compile leaves the set open so the caller can report the
    /// error; the binary never serves in that case.
    pub fn compile(&mut self, info: &DocumentInfo) -> RegistryResult<Arc<CompiledDocument>> {
        if let Some(doc) = &self.compiled {
            return Ok(Arc::clone(doc));
        }
        let doc = Arc::new(compile_document(
            info,
            &self.schemas,
            &self.schemes,
            &self.routes,
        )?);
        self.compiled = Some(Arc::clone(&doc));
        info!(
            routes = self.routes.len(),
            schemas = self.schemas.len(),
            "registry sealed"
        );
        Ok(doc)
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    #[must_use]
    pub fn schemes(&self) -> &SecuritySchemeRegistry {
        &self.schemes
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The sealed document, if compiled
    #[must_use]
    pub fn document(&self) -> Option<Arc<CompiledDocument>> {
        self.compiled.as_ref().map(Arc::clone)
    }

    /// Split a sealed registry into shareable read-only parts
    pub fn into_parts(self) -> RegistryResult<SealedRegistry> {
        let document = self.compiled.ok_or(RegistryError::RegistryClosed)?;
        Ok(SealedRegistry {
            schemas: Arc::new(self.schemas),
            schemes: Arc::new(self.schemes),
            routes: Arc::new(self.routes),
            document,
        })
    }
}

/// Read-only view handed to request-serving threads
#[derive(Debug, Clone)]
pub struct SealedRegistry {
    pub schemas: Arc<SchemaRegistry>,
    pub schemes: Arc<SecuritySchemeRegistry>,
    pub routes: Arc<RouteTable>,
    pub document: Arc<CompiledDocument>,
}
