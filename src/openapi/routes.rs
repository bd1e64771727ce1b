use super::schema::SchemaRegistry;
use super::security::{SecurityScheme, SecuritySchemeRegistry};
use super::types::{ParameterLocation, RouteDescriptor};
use crate::error::{RegistryError, RegistryResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Methods an OpenAPI path item has an operation field for
const DOCUMENTED_METHODS: [&str; 8] = [
    "GET", "PUT", "POST", "DELETE", "OPTIONS", "HEAD", "PATCH", "TRACE",
];

/// One segment of a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    /// `{name}` or `{name:constraint}`; the constraint is kept verbatim
    Param {
        name: String,
        constraint: Option<String>,
    },
}

/// Parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    normalized: String,
    shape: String,
    segments: Vec<PathSegment>,
}

impl PathTemplate {
    /// Parse a template such as `/user/{username:regex((?!^login$)(^.+$))}`
    ///
    /// Braces inside a constraint are balanced, so regex quantifiers like
    /// `{2,3}` stay part of the constraint.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err(format!("path template '{raw}' must start with '/'"));
        }
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw[1..].chars();
        while let Some(c) = chars.next() {
            match c {
                '/' => {
                    segments.push(PathSegment::Literal(std::mem::take(&mut current)));
                }
                '{' if current.is_empty() => {
                    let mut depth = 1usize;
                    let mut body = String::new();
                    for c in chars.by_ref() {
                        match c {
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                        body.push(c);
                    }
                    if depth != 0 {
                        return Err(format!("unbalanced '{{' in path template '{raw}'"));
                    }
                    let (name, constraint) = match body.split_once(':') {
                        Some((name, constraint)) => (name, Some(constraint.to_string())),
                        None => (body.as_str(), None),
                    };
                    if name.is_empty() {
                        return Err(format!("empty placeholder in path template '{raw}'"));
                    }
                    segments.push(PathSegment::Param {
                        name: name.to_string(),
                        constraint,
                    });
                    match chars.next() {
                        None => return Ok(Self::finish(raw, segments)),
                        Some('/') => {}
                        Some(other) => {
                            return Err(format!(
                                "unexpected '{other}' after placeholder in path template '{raw}'"
                            ))
                        }
                    }
                }
                '{' | '}' => {
                    return Err(format!("stray '{c}' in path template '{raw}'"));
                }
                _ => current.push(c),
            }
        }
        segments.push(PathSegment::Literal(current));
        Ok(Self::finish(raw, segments))
    }

    fn finish(raw: &str, mut segments: Vec<PathSegment>) -> Self {
        // "/" parses as a single empty literal
        if segments.len() == 1 && segments[0] == PathSegment::Literal(String::new()) {
            segments.clear();
        }
        let mut normalized = String::new();
        let mut shape = String::new();
        for seg in &segments {
            normalized.push('/');
            shape.push('/');
            match seg {
                PathSegment::Literal(s) => {
                    normalized.push_str(s);
                    shape.push_str(&s.to_ascii_lowercase());
                }
                PathSegment::Param { name, .. } => {
                    normalized.push('{');
                    normalized.push_str(name);
                    normalized.push('}');
                    shape.push_str("{}");
                }
            }
        }
        if normalized.is_empty() {
            normalized.push('/');
            shape.push('/');
        }
        Self {
            raw: raw.to_string(),
            normalized,
            shape,
            segments,
        }
    }

    /// The template exactly as registered
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The template with inline constraints removed; used as the document key
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Lowercased literals with placeholder names erased, e.g. `/pet/{}`
    ///
    /// Two templates with the same shape match the same request paths.
    #[must_use]
    pub fn shape(&self) -> &str {
        &self.shape
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Placeholder names in order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::Param { name, .. } => Some(name.as_str()),
            PathSegment::Literal(_) => None,
        })
    }
}

/// A registered route: the descriptor plus its parsed template
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub descriptor: RouteDescriptor,
    pub template: PathTemplate,
}

impl RouteEntry {
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.descriptor.operation_id
    }
}

/// Ordered, append-only table of route descriptors
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<RouteEntry>>,
    keys: HashSet<(String, String)>,
    operation_ids: HashSet<String>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route after checking it against the registries
    ///
    /// # Errors
    ///
    /// `DuplicateRoute` when `(method, path shape)` is taken,
    /// `InvalidRoute` for structural problems, and `DanglingReference` for
    /// the first schema, scheme or scope that does not resolve.
    pub fn add_route(
        &mut self,
        descriptor: RouteDescriptor,
        schemas: &SchemaRegistry,
        schemes: &SecuritySchemeRegistry,
    ) -> RegistryResult<()> {
        let op_id = descriptor.operation_id.clone();
        let invalid = |reason: String| RegistryError::InvalidRoute {
            operation_id: op_id.clone(),
            reason,
        };

        let template = PathTemplate::parse(&descriptor.path_template).map_err(&invalid)?;
        let key = (
            descriptor.method.as_str().to_string(),
            template.shape().to_string(),
        );
        if self.keys.contains(&key) {
            return Err(RegistryError::DuplicateRoute {
                method: key.0,
                path: template.normalized().to_string(),
            });
        }

        if op_id.trim().is_empty() {
            return Err(invalid("operation id is empty".to_string()));
        }
        if !DOCUMENTED_METHODS.contains(&descriptor.method.as_str()) {
            return Err(invalid(format!(
                "method {} cannot be described in an OpenAPI path item",
                descriptor.method
            )));
        }
        if self.operation_ids.contains(&op_id) {
            return Err(invalid("operation id is already in use".to_string()));
        }

        let placeholders: HashSet<&str> = template.param_names().collect();
        let mut declared = HashSet::new();
        for param in &descriptor.parameters {
            if param.location != ParameterLocation::Path {
                continue;
            }
            if !param.required {
                return Err(invalid(format!(
                    "path parameter '{}' must be required",
                    param.name
                )));
            }
            if !placeholders.contains(param.name.as_str()) {
                return Err(invalid(format!(
                    "path parameter '{}' has no placeholder in '{}'",
                    param.name, descriptor.path_template
                )));
            }
            declared.insert(param.name.as_str());
        }
        if let Some(missing) = template.param_names().find(|p| !declared.contains(p)) {
            return Err(invalid(format!(
                "placeholder '{{{missing}}}' has no matching path parameter"
            )));
        }

        for reference in descriptor.schema_refs() {
            if !schemas.contains(reference) {
                return Err(RegistryError::DanglingReference {
                    origin: op_id.clone(),
                    reference: reference.to_string(),
                });
            }
        }

        for requirement in &descriptor.security {
            let Some(scheme) = schemes.get(&requirement.scheme) else {
                return Err(RegistryError::DanglingReference {
                    origin: op_id.clone(),
                    reference: requirement.scheme.clone(),
                });
            };
            if matches!(scheme, SecurityScheme::ApiKey { .. }) && !requirement.scopes.is_empty() {
                return Err(invalid(format!(
                    "api key scheme '{}' does not take scopes",
                    requirement.scheme
                )));
            }
            if let Some(scope) = requirement.scopes.iter().find(|s| !scheme.has_scope(s)) {
                return Err(RegistryError::DanglingReference {
                    origin: op_id.clone(),
                    reference: format!("{}:{scope}", requirement.scheme),
                });
            }
        }

        debug!(
            operation_id = %op_id,
            method = %descriptor.method,
            path = %template.normalized(),
            "registered route"
        );
        self.keys.insert(key);
        self.operation_ids.insert(op_id);
        self.routes.push(Arc::new(RouteEntry {
            descriptor,
            template,
        }));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.routes.iter()
    }

    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&Arc<RouteEntry>> {
        self.routes.iter().find(|r| r.operation_id() == operation_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
