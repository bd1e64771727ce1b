use super::schema::SchemaShape;
use http::Method;
use indexmap::{IndexMap, IndexSet};

/// Where a parameter is carried on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "Path"),
            ParameterLocation::Query => write!(f, "Query"),
            ParameterLocation::Header => write!(f, "Header"),
        }
    }
}

/// Visibility hint emitted as `x-ms-visibility`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Important,
    Advanced,
    Internal,
}

impl Visibility {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Important => "important",
            Visibility::Advanced => "advanced",
            Visibility::Internal => "internal",
        }
    }
}

/// A single operation parameter
///
/// Construct with [`ParameterDescriptor::path`], [`ParameterDescriptor::query`]
/// or [`ParameterDescriptor::header`]. Path parameters start out required.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: SchemaShape,
    pub explode: bool,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub visibility: Visibility,
}

impl ParameterDescriptor {
    fn new(name: &str, location: ParameterLocation, schema: SchemaShape) -> Self {
        Self {
            name: name.to_string(),
            location,
            required: location == ParameterLocation::Path,
            schema,
            explode: false,
            summary: None,
            description: None,
            visibility: Visibility::default(),
        }
    }

    #[must_use]
    pub fn path(name: &str, schema: SchemaShape) -> Self {
        Self::new(name, ParameterLocation::Path, schema)
    }

    #[must_use]
    pub fn query(name: &str, schema: SchemaShape) -> Self {
        Self::new(name, ParameterLocation::Query, schema)
    }

    #[must_use]
    pub fn header(name: &str, schema: SchemaShape) -> Self {
        Self::new(name, ParameterLocation::Header, schema)
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    /// Sets both the summary and the description, which is how every
    /// parameter of the pet store is documented.
    #[must_use]
    pub fn described(mut self, text: &str) -> Self {
        self.summary = Some(text.to_string());
        self.description = Some(text.to_string());
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Request body of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    pub media_type: String,
    pub schema: Option<SchemaShape>,
    pub description: Option<String>,
    pub required: bool,
}

impl BodyDescriptor {
    #[must_use]
    pub fn new(media_type: &str, schema: SchemaShape) -> Self {
        Self {
            media_type: media_type.to_string(),
            schema: Some(schema),
            description: None,
            required: false,
        }
    }

    #[must_use]
    pub fn json(schema: SchemaShape) -> Self {
        Self::new("application/json", schema)
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }
}

/// A documented response header
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDescriptor {
    pub description: Option<String>,
    pub schema: SchemaShape,
}

/// One response of an operation, keyed by status code on the route
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    pub description: String,
    pub summary: Option<String>,
    pub media_type: Option<String>,
    pub schema: Option<SchemaShape>,
    pub headers: IndexMap<String, HeaderDescriptor>,
}

impl ResponseDescriptor {
    /// Response carrying a body of the given media type and shape
    #[must_use]
    pub fn with_body(media_type: &str, schema: SchemaShape, description: &str) -> Self {
        Self {
            description: description.to_string(),
            summary: Some(description.to_string()),
            media_type: Some(media_type.to_string()),
            schema: Some(schema),
            headers: IndexMap::new(),
        }
    }

    /// `application/json` shorthand for [`ResponseDescriptor::with_body`]
    #[must_use]
    pub fn json(schema: SchemaShape, description: &str) -> Self {
        Self::with_body("application/json", schema, description)
    }

    /// Response with no body at all
    #[must_use]
    pub fn without_body(description: &str) -> Self {
        Self {
            description: description.to_string(),
            summary: Some(description.to_string()),
            media_type: None,
            schema: None,
            headers: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, schema: SchemaShape, description: &str) -> Self {
        self.headers.insert(
            name.to_string(),
            HeaderDescriptor {
                description: Some(description.to_string()),
                schema,
            },
        );
        self
    }
}

/// Reference from a route to a registered security scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRequirement {
    pub scheme: String,
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    #[must_use]
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            scopes: Vec::new(),
        }
    }

    #[must_use]
    pub fn scope(mut self, scope: &str) -> Self {
        self.scopes.push(scope.to_string());
        self
    }
}

/// Complete metadata for one HTTP operation
///
/// Built with the chained setters below and handed to
/// [`RouteTable::add_route`](super::RouteTable::add_route), after which it is
/// never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDescriptor {
    pub operation_id: String,
    pub method: Method,
    /// Raw template, inline constraints included (e.g. `/user/{username:regex(...)}`)
    pub path_template: String,
    pub tags: IndexSet<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub request_body: Option<BodyDescriptor>,
    pub responses: IndexMap<u16, ResponseDescriptor>,
    pub security: Vec<SecurityRequirement>,
    pub deprecated: bool,
    pub visibility: Visibility,
}

impl RouteDescriptor {
    #[must_use]
    pub fn new(method: Method, path_template: &str, operation_id: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            method,
            path_template: path_template.to_string(),
            tags: IndexSet::new(),
            summary: None,
            description: None,
            parameters: Vec::new(),
            request_body: None,
            responses: IndexMap::new(),
            security: Vec::new(),
            deprecated: false,
            visibility: Visibility::default(),
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn request_body(mut self, body: BodyDescriptor) -> Self {
        self.request_body = Some(body);
        self
    }

    #[must_use]
    pub fn response(mut self, status: u16, response: ResponseDescriptor) -> Self {
        self.responses.insert(status, response);
        self
    }

    #[must_use]
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Every schema name referenced anywhere in the descriptor, in
    /// declaration order, duplicates included.
    #[must_use]
    pub fn schema_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for param in &self.parameters {
            param.schema.collect_refs(&mut out);
        }
        if let Some(body) = &self.request_body {
            if let Some(schema) = &body.schema {
                schema.collect_refs(&mut out);
            }
        }
        for response in self.responses.values() {
            if let Some(schema) = &response.schema {
                schema.collect_refs(&mut out);
            }
            for header in response.headers.values() {
                header.schema.collect_refs(&mut out);
            }
        }
        out
    }

    /// Media type declared for a status code, if that response has a body
    #[must_use]
    pub fn content_type_for(&self, status: u16) -> Option<&str> {
        self.responses
            .get(&status)
            .and_then(|r| r.media_type.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parameter_defaults_to_required() {
        let p = ParameterDescriptor::path("petId", SchemaShape::int64());
        assert!(p.required);
        let q = ParameterDescriptor::query("status", SchemaShape::string());
        assert!(!q.required);
    }

    #[test]
    fn test_schema_refs_walks_every_position() {
        let route = RouteDescriptor::new(Method::POST, "/pet", "addPet")
            .parameter(ParameterDescriptor::query(
                "status",
                SchemaShape::array_of(SchemaShape::reference("PetStatus")),
            ))
            .request_body(BodyDescriptor::json(SchemaShape::reference("Pet")))
            .response(
                200,
                ResponseDescriptor::json(SchemaShape::reference("Pet"), "ok")
                    .header("X-Thing", SchemaShape::reference("Tag"), "thing"),
            );
        assert_eq!(route.schema_refs(), vec!["PetStatus", "Pet", "Pet", "Tag"]);
    }

    #[test]
    fn test_content_type_for() {
        let route = RouteDescriptor::new(Method::GET, "/user/login", "loginUser")
            .response(
                200,
                ResponseDescriptor::with_body("text/plain", SchemaShape::string(), "ok"),
            )
            .response(400, ResponseDescriptor::without_body("bad"));
        assert_eq!(route.content_type_for(200), Some("text/plain"));
        assert_eq!(route.content_type_for(400), None);
        assert_eq!(route.content_type_for(500), None);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(ParameterLocation::Path.to_string(), "Path");
        assert_eq!(ParameterLocation::Header.to_string(), "Header");
    }
}
