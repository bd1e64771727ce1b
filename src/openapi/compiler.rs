//! Document compiler
//!
//! Folds the three registries into one typed `utoipa` OpenAPI model and
//! renders it once. Paths keep route registration order; components are
//! keyed by name. Compiling the same registries twice gives byte-identical
//! JSON and YAML.

use super::routes::RouteTable;
use super::schema::{with_description, SchemaRegistry};
use super::security::SecuritySchemeRegistry;
use super::types::{
    BodyDescriptor, ParameterDescriptor, ParameterLocation, ResponseDescriptor, RouteDescriptor,
};
use crate::error::{RegistryError, RegistryResult};
use http::Method;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use utoipa::openapi::extensions::ExtensionsBuilder;
use utoipa::openapi::path::{Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn};
use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
use utoipa::openapi::security::SecurityRequirement as OpenApiRequirement;
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{
    ComponentsBuilder, ContactBuilder, ContentBuilder, Deprecated, HeaderBuilder, Info,
    InfoBuilder, LicenseBuilder, OpenApi, OpenApiBuilder, PathItem, PathsBuilder, RefOr, Required,
    Response, ResponseBuilder, ServerBuilder,
};

/// OpenAPI version emitted in the `openapi` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenApiVersion {
    #[default]
    V3_0,
    V3_1,
}

impl OpenApiVersion {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V3_0 => "3.0.1",
            OpenApiVersion::V3_1 => "3.1.0",
        }
    }

    /// Accepts `v3`, `3.0`, `3.0.1`, `v31`, `3.1` and `3.1.0`
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v3" | "3" | "3.0" | "3.0.1" => Some(OpenApiVersion::V3_0),
            "v31" | "3.1" | "3.1.0" => Some(OpenApiVersion::V3_1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub name: String,
    pub url: String,
}

/// Everything that goes into the document besides the registries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub openapi_version: OpenApiVersion,
    pub servers: Vec<String>,
}

impl DocumentInfo {
    #[must_use]
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            openapi_version: OpenApiVersion::default(),
            servers: Vec::new(),
        }
    }

    fn to_openapi(&self) -> Info {
        let contact = self.contact.as_ref().map(|c| {
            ContactBuilder::new()
                .name(Some(&c.name))
                .url(Some(&c.url))
                .email(Some(&c.email))
                .build()
        });
        let license = self
            .license
            .as_ref()
            .map(|l| LicenseBuilder::new().name(&l.name).url(Some(&l.url)).build());
        InfoBuilder::new()
            .title(&self.title)
            .version(&self.version)
            .description(self.description.as_ref())
            .terms_of_service(self.terms_of_service.as_ref())
            .contact(contact)
            .license(license)
            .build()
    }
}

/// The resolved document. Never mutated after construction.
///
/// Holds the typed model and its JSON rendering; the rendering carries the
/// requested `openapi` version and sorted `x-` extension keys.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDocument {
    title: String,
    spec: OpenApi,
    value: Value,
    path_count: usize,
    operation_count: usize,
}

impl CompiledDocument {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The typed OpenAPI model
    #[must_use]
    pub fn spec(&self) -> &OpenApi {
        &self.spec
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn path_count(&self) -> usize {
        self.path_count
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_count
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.value)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.value)
    }
}

/// Compile the registries into a document
///
/// # Errors
///
/// `IncompleteDocument` if the title or version is blank and
/// `StaleReference` if a route references something the given registries
/// do not contain. `Render` if serialisation fails.
pub fn compile_document(
    info: &DocumentInfo,
    schemas: &SchemaRegistry,
    schemes: &SecuritySchemeRegistry,
    routes: &RouteTable,
) -> RegistryResult<CompiledDocument> {
    if info.title.trim().is_empty() {
        return Err(RegistryError::IncompleteDocument { field: "title" });
    }
    if info.version.trim().is_empty() {
        return Err(RegistryError::IncompleteDocument { field: "version" });
    }
    check_closure(schemas, schemes, routes)?;

    let mut tags = IndexSet::new();
    let mut items: IndexMap<&str, PathItem> = IndexMap::new();
    for entry in routes.iter() {
        let route = &entry.descriptor;
        tags.extend(route.tags.iter().cloned());
        let item = items.entry(entry.template.normalized()).or_default();
        let Some(slot) = operation_slot(item, &route.method) else {
            return Err(RegistryError::InvalidRoute {
                operation_id: route.operation_id.clone(),
                reason: format!("method {} has no OpenAPI operation field", route.method),
            });
        };
        *slot = Some(operation(route));
    }
    let path_count = items.len();
    let paths = items
        .into_iter()
        .fold(PathsBuilder::new(), |paths, (path, item)| paths.path(path, item))
        .build();

    let mut components = ComponentsBuilder::new();
    for entry in schemas.iter() {
        let schema = with_description(entry.shape.to_openapi(), entry.description.as_deref());
        components = components.schema(&entry.name, schema);
    }
    for (name, scheme) in schemes.iter() {
        components = components.security_scheme(name, scheme.to_openapi());
    }

    let servers = info
        .servers
        .iter()
        .map(|url| ServerBuilder::new().url(url).build())
        .collect::<Vec<_>>();
    let tags = tags
        .iter()
        .map(|name| TagBuilder::new().name(name).build())
        .collect::<Vec<_>>();
    let spec = OpenApiBuilder::new()
        .info(info.to_openapi())
        .servers((!servers.is_empty()).then_some(servers))
        .paths(paths)
        .components(Some(components.build()))
        .tags((!tags.is_empty()).then_some(tags))
        .build();

    let mut value = serde_json::to_value(&spec).map_err(|e| RegistryError::Render {
        reason: e.to_string(),
    })?;
    // the typed model only speaks 3.1.0
    if let Value::Object(doc) = &mut value {
        doc.insert(
            "openapi".into(),
            Value::String(info.openapi_version.as_str().into()),
        );
    }
    sort_extensions(&mut value);

    info!(
        title = %info.title,
        openapi = info.openapi_version.as_str(),
        paths = path_count,
        operations = routes.len(),
        schemas = schemas.len(),
        security_schemes = schemes.len(),
        "compiled OpenAPI document"
    );

    Ok(CompiledDocument {
        title: info.title.clone(),
        spec,
        value,
        path_count,
        operation_count: routes.len(),
    })
}

fn check_closure(
    schemas: &SchemaRegistry,
    schemes: &SecuritySchemeRegistry,
    routes: &RouteTable,
) -> RegistryResult<()> {
    for entry in schemas.iter() {
        let mut refs = Vec::new();
        entry.shape.collect_refs(&mut refs);
        if let Some(missing) = refs.into_iter().find(|r| !schemas.contains(r)) {
            return Err(RegistryError::StaleReference {
                origin: entry.name.clone(),
                reference: missing.to_string(),
            });
        }
    }
    for entry in routes.iter() {
        let route = &entry.descriptor;
        let stale = |reference: String| RegistryError::StaleReference {
            origin: route.operation_id.clone(),
            reference,
        };
        if let Some(missing) = route.schema_refs().into_iter().find(|r| !schemas.contains(r)) {
            return Err(stale(missing.to_string()));
        }
        for requirement in &route.security {
            match schemes.get(&requirement.scheme) {
                None => return Err(stale(requirement.scheme.clone())),
                Some(scheme) => {
                    if let Some(scope) = requirement.scopes.iter().find(|s| !scheme.has_scope(s)) {
                        return Err(stale(format!("{}:{scope}", requirement.scheme)));
                    }
                }
            }
        }
    }
    Ok(())
}

/// The field of `item` that holds the operation for `method`
fn operation_slot<'a>(item: &'a mut PathItem, method: &Method) -> Option<&'a mut Option<Operation>> {
    match method.as_str() {
        "GET" => Some(&mut item.get),
        "PUT" => Some(&mut item.put),
        "POST" => Some(&mut item.post),
        "DELETE" => Some(&mut item.delete),
        "OPTIONS" => Some(&mut item.options),
        "HEAD" => Some(&mut item.head),
        "PATCH" => Some(&mut item.patch),
        "TRACE" => Some(&mut item.trace),
        _ => None,
    }
}

fn operation(route: &RouteDescriptor) -> Operation {
    let mut op = OperationBuilder::new()
        .tags((!route.tags.is_empty()).then(|| route.tags.iter().cloned().collect::<Vec<_>>()))
        .summary(route.summary.as_ref())
        .description(route.description.as_ref())
        .operation_id(Some(&route.operation_id))
        .request_body(route.request_body.as_ref().map(request_body))
        .deprecated(route.deprecated.then_some(Deprecated::True))
        .extensions(Some(
            ExtensionsBuilder::new()
                .add("x-ms-visibility", route.visibility.as_str())
                .build(),
        ));
    for param in &route.parameters {
        op = op.parameter(parameter(param));
    }
    for (status, response) in &route.responses {
        op = op.response(status.to_string(), RefOr::T(response_object(response)));
    }
    for requirement in &route.security {
        op = op.security(OpenApiRequirement::new(
            &requirement.scheme,
            requirement.scopes.iter(),
        ));
    }
    op.build()
}

fn parameter(param: &ParameterDescriptor) -> Parameter {
    let location = match param.location {
        ParameterLocation::Path => ParameterIn::Path,
        ParameterLocation::Query => ParameterIn::Query,
        ParameterLocation::Header => ParameterIn::Header,
    };
    let mut extensions = ExtensionsBuilder::new();
    if let Some(summary) = &param.summary {
        extensions = extensions.add("x-ms-summary", summary.as_str());
    }
    ParameterBuilder::new()
        .name(&param.name)
        .parameter_in(location)
        .description(param.description.as_ref())
        .required(required(param.required))
        .explode(param.explode.then_some(true))
        .schema(Some(param.schema.to_openapi()))
        .extensions(Some(
            extensions
                .add("x-ms-visibility", param.visibility.as_str())
                .build(),
        ))
        .build()
}

fn request_body(body: &BodyDescriptor) -> RequestBody {
    RequestBodyBuilder::new()
        .description(body.description.as_ref())
        .content(
            &body.media_type,
            ContentBuilder::new()
                .schema(body.schema.as_ref().map(|s| s.to_openapi()))
                .build(),
        )
        .required(Some(required(body.required)))
        .build()
}

fn response_object(response: &ResponseDescriptor) -> Response {
    let mut builder = ResponseBuilder::new().description(&response.description);
    for (name, header) in &response.headers {
        builder = builder.header(
            name,
            HeaderBuilder::new()
                .schema(header.schema.to_openapi())
                .description(header.description.as_ref())
                .build(),
        );
    }
    if let Some(media_type) = &response.media_type {
        builder = builder.content(
            media_type,
            ContentBuilder::new()
                .schema(response.schema.as_ref().map(|s| s.to_openapi()))
                .build(),
        );
    }
    if let Some(summary) = &response.summary {
        builder = builder.extensions(Some(
            ExtensionsBuilder::new()
                .add("x-ms-summary", summary.as_str())
                .build(),
        ));
    }
    builder.build()
}

fn required(flag: bool) -> Required {
    if flag {
        Required::True
    } else {
        Required::False
    }
}

/// Moves `x-` keys to the end of every object, sorted by name
///
/// Extension maps serialise in hash order, which would make two renders of
/// the same registries differ.
fn sort_extensions(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let (mut extensions, rest): (Vec<(String, Value)>, Vec<(String, Value)>) =
                std::mem::take(map)
                    .into_iter()
                    .partition(|(k, _)| k.starts_with("x-"));
            extensions.sort_by(|a, b| a.0.cmp(&b.0));
            *map = rest.into_iter().chain(extensions).collect::<Map<String, Value>>();
            for v in map.values_mut() {
                sort_extensions(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_extensions),
        _ => {}
    }
}

/// Compute-once slot for a shared document
///
/// Concurrent first callers block until one of them has compiled; all of
/// them then receive the same `Arc`. A failed compile leaves the slot empty.
#[derive(Debug, Default)]
pub struct DocumentCell {
    cell: OnceCell<Arc<CompiledDocument>>,
}

impl DocumentCell {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_compile<F>(&self, compile: F) -> RegistryResult<Arc<CompiledDocument>>
    where
        F: FnOnce() -> RegistryResult<Arc<CompiledDocument>>,
    {
        self.cell.get_or_try_init(compile).map(Arc::clone)
    }

    #[must_use]
    pub fn get(&self) -> Option<Arc<CompiledDocument>> {
        self.cell.get().map(Arc::clone)
    }
}
