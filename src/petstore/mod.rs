//! The pet store catalogue
//!
//! Schemas, security schemes and the 18 routes of the sample API, plus the
//! handlers that answer them with generated fixtures. Nothing is persisted and
//! security requirements are documented but never enforced.

mod pet;
mod store;
mod user;

pub use user::{EXPIRES_AFTER_HEADER, RATE_LIMIT_HEADER};

use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, HandlerContext, HandlerRequest, HandlerResponse};
use crate::error::RegistryResult;
use crate::openapi::{
    ApiRegistry, CompiledDocument, Contact, DocumentCell, DocumentInfo, EnumShape, FlowType,
    License, OAuthFlow, ObjectShape, ResponseDescriptor, SchemaShape, SealedRegistry,
    SecurityRequirement, SecurityScheme,
};
use std::sync::Arc;
use tracing::info;

pub const PETSTORE_AUTH: &str = "petstore_auth";
pub const API_KEY: &str = "api_key";

const OAUTH_DIALOG_URL: &str = "http://petstore.swagger.io/oauth/dialog";
const TERMS_OF_SERVICE: &str = "https://github.com/Azure/azure-functions-openapi-extension";

static DOCUMENT: DocumentCell = DocumentCell::new();

/// `PetStatus` enum; also used to parse `findByStatus` filters
#[must_use]
pub fn pet_status() -> EnumShape {
    EnumShape::new()
        .member("Available", 1, "available")
        .member("Pending", 2, "pending")
        .member("Sold", 3, "sold")
}

#[must_use]
pub fn order_status() -> EnumShape {
    EnumShape::new()
        .member("Placed", 1, "placed")
        .member("Approved", 2, "approved")
        .member("Delivered", 3, "delivered")
}

/// Register every schema, scheme and route of the pet store
pub fn build_registry() -> RegistryResult<ApiRegistry> {
    let mut registry = ApiRegistry::new();

    registry.register_schema("PetStatus", pet_status().into())?;
    registry.register_schema("OrderStatus", order_status().into())?;
    registry.register_schema(
        "Category",
        ObjectShape::new()
            .field("id", SchemaShape::int64())
            .field("name", SchemaShape::string())
            .into(),
    )?;
    registry.register_schema(
        "Tag",
        ObjectShape::new()
            .field("id", SchemaShape::int64())
            .field("name", SchemaShape::string())
            .into(),
    )?;
    registry.register_schema(
        "Pet",
        ObjectShape::new()
            .field("id", SchemaShape::int64())
            .field("category", SchemaShape::reference("Category"))
            .required_field("name", SchemaShape::string())
            .required_field("photoUrls", SchemaShape::array_of(SchemaShape::string()))
            .field("tags", SchemaShape::array_of(SchemaShape::reference("Tag")))
            .field("status", SchemaShape::reference("PetStatus"))
            .into(),
    )?;
    registry.register_schema(
        "Order",
        ObjectShape::new()
            .field("id", SchemaShape::int64())
            .field("petId", SchemaShape::int64())
            .field("quantity", SchemaShape::int32())
            .field("shipDate", SchemaShape::date_time())
            .field("status", SchemaShape::reference("OrderStatus"))
            .field("complete", SchemaShape::boolean())
            .into(),
    )?;
    registry.register_schema(
        "User",
        ObjectShape::new()
            .field("id", SchemaShape::int64())
            .field("username", SchemaShape::string())
            .field("firstName", SchemaShape::string())
            .field("lastName", SchemaShape::string())
            .field("email", SchemaShape::string())
            .field("password", SchemaShape::string())
            .field("phone", SchemaShape::string())
            .field("userStatus", SchemaShape::int32())
            .into(),
    )?;
    registry.register_schema(
        "ApiResponse",
        ObjectShape::new()
            .field("code", SchemaShape::int32())
            .field("type", SchemaShape::string())
            .field("message", SchemaShape::string())
            .into(),
    )?;
    registry.register_schema(
        "PetUrlForm",
        ObjectShape::new()
            .field("name", SchemaShape::string())
            .field("status", SchemaShape::reference("PetStatus"))
            .into(),
    )?;
    registry.register_schema(
        "PetFormData",
        ObjectShape::new()
            .field("additionalMetadata", SchemaShape::string())
            .field("file", SchemaShape::binary())
            .into(),
    )?;

    registry.register_scheme(
        PETSTORE_AUTH,
        SecurityScheme::oauth2(
            FlowType::Implicit,
            OAuthFlow::implicit(OAUTH_DIALOG_URL)
                .scope("write:pets", "modify pets in your account")
                .scope("read:pets", "read your pets"),
        ),
    )?;
    registry.register_scheme(API_KEY, SecurityScheme::api_key_header(API_KEY))?;

    for route in pet::routes()
        .into_iter()
        .chain(store::routes())
        .chain(user::routes())
    {
        registry.add_route(route)?;
    }
    info!(
        schemas = registry.schemas().len(),
        schemes = registry.schemes().len(),
        routes = registry.routes().len(),
        "pet store registry built"
    );
    Ok(registry)
}

/// Document metadata for `config`
#[must_use]
pub fn document_info(config: &AppConfig) -> DocumentInfo {
    let mut info = DocumentInfo::new(&config.doc_title, &config.doc_version);
    info.description = Some(config.doc_description.clone());
    info.terms_of_service = Some(TERMS_OF_SERVICE.to_string());
    info.contact = Some(Contact {
        name: "Santosh Ganti".to_string(),
        email: "admin@homelab.santoshganti.net".to_string(),
        url: "https://www.homelab.santoshganti.net".to_string(),
    });
    info.license = Some(License {
        name: "MIT".to_string(),
        url: "http://opensource.org/licenses/MIT".to_string(),
    });
    info.openapi_version = config.openapi_version;
    info.servers = vec![config.server_url()];
    info
}

/// Build, compile and seal the registry in one step
pub fn sealed_registry(config: &AppConfig) -> RegistryResult<SealedRegistry> {
    let mut registry = build_registry()?;
    registry.compile(&document_info(config))?;
    registry.into_parts()
}

/// Process-wide document, compiled on first use
///
/// Later calls return the same `Arc` whatever `config` they pass.
pub fn document(config: &AppConfig) -> RegistryResult<Arc<CompiledDocument>> {
    DOCUMENT.get_or_compile(|| build_registry()?.compile(&document_info(config)))
}

/// Dispatcher with a handler for every pet store operation
#[must_use]
pub fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    pet::register(&mut dispatcher);
    store::register(&mut dispatcher);
    user::register(&mut dispatcher);
    dispatcher
}

fn log_title(req: &HandlerRequest, ctx: &HandlerContext<'_>) {
    info!(
        request_id = %req.request_id,
        operation_id = %req.operation_id,
        "document title: {}",
        ctx.document_title
    );
}

/// Numeric path id, or the 400 the catalogue declares for a bad one
fn path_id(req: &HandlerRequest, name: &str) -> Result<i64, HandlerResponse> {
    req.get_path_param(name)
        .and_then(|raw| raw.trim().parse().ok())
        .ok_or_else(|| HandlerResponse::error(400, "Invalid ID supplied"))
}

fn petstore_auth() -> SecurityRequirement {
    SecurityRequirement::new(PETSTORE_AUTH)
        .scope("write:pets")
        .scope("read:pets")
}

fn api_key() -> SecurityRequirement {
    SecurityRequirement::new(API_KEY)
}

fn ok_json(schema: SchemaShape) -> ResponseDescriptor {
    ResponseDescriptor::json(schema, "successful operation")
}

fn no_body(text: &str) -> ResponseDescriptor {
    ResponseDescriptor::without_body(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::RegistryState;

    #[test]
    fn test_catalogue_counts() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.schemas().len(), 10);
        assert_eq!(registry.schemes().len(), 2);
        assert_eq!(registry.routes().len(), 18);
        assert_eq!(registry.state(), RegistryState::Open);
    }

    #[test]
    fn test_every_route_has_a_handler() {
        let registry = build_registry().unwrap();
        dispatcher().verify_routes(registry.routes()).unwrap();
    }

    #[test]
    fn test_document_info_carries_contact() {
        let info = document_info(&AppConfig::default());
        assert_eq!(info.title, "Swagger Petstore");
        assert_eq!(info.contact.unwrap().name, "Santosh Ganti");
        assert_eq!(info.servers, vec!["http://localhost:7071/api".to_string()]);
    }

    #[test]
    fn test_document_is_shared() {
        let a = document(&AppConfig::default()).unwrap();
        let b = document(&AppConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.operation_count(), 18);
    }
}
