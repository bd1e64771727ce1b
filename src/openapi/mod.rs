//! Declarative API surface
//!
//! Schemas, security schemes and routes are registered explicitly at start-up
//! and compiled once into an OpenAPI 3.x document. See [`ApiRegistry`].

mod compiler;
mod registry;
mod routes;
mod schema;
mod security;
mod types;

pub use compiler::{
    compile_document, CompiledDocument, Contact, DocumentCell, DocumentInfo, License,
    OpenApiVersion,
};
pub use registry::{ApiRegistry, RegistryState, SealedRegistry};
pub use routes::{PathSegment, PathTemplate, RouteEntry, RouteTable};
pub use schema::{
    EnumMember, EnumShape, FieldShape, ObjectShape, PrimitiveKind, SchemaEntry, SchemaRegistry,
    SchemaShape,
};
pub use security::{ApiKeyLocation, FlowType, OAuthFlow, SecurityScheme, SecuritySchemeRegistry};
pub use types::{
    BodyDescriptor, HeaderDescriptor, ParameterDescriptor, ParameterLocation, ResponseDescriptor,
    RouteDescriptor, SecurityRequirement, Visibility,
};
