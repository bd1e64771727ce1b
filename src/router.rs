//! Request routing
//!
//! [`Router`] turns every registered path template into a segment matcher.
//! Matchers are ordered so that a literal segment wins over a parameter at
//! the first position where two templates differ; ties keep registration
//! order. Inline constraints are compiled with `regex` when possible. A
//! constraint the regex engine cannot express (look-around, for example) is
//! logged and left out, which is safe for this route table because the
//! literal routes it was guarding against already win on precedence.

use crate::openapi::{PathSegment, RouteEntry, RouteTable};
use http::Method;
use regex::{Regex, RegexBuilder};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of path parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted path parameters, name then decoded value
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A successful match
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub entry: Arc<RouteEntry>,
    pub path_params: ParamVec,
}

impl RouteMatch {
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn operation_id(&self) -> &str {
        self.entry.operation_id()
    }
}

/// Outcome of [`Router::route`]
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Matched(RouteMatch),
    /// The path exists under other methods
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

#[derive(Debug)]
enum SegmentMatcher {
    Literal(String),
    Param {
        name: Arc<str>,
        constraint: Option<Regex>,
    },
}

#[derive(Debug)]
struct CompiledRoute {
    entry: Arc<RouteEntry>,
    segments: Vec<SegmentMatcher>,
    // 0 for literal, 1 for parameter; sorts literal-first
    rank: Vec<u8>,
}

/// Segment-based router over a [`RouteTable`]
#[derive(Debug)]
pub struct Router {
    prefix: Vec<String>,
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Build a router for `table`, mounted under `prefix` (e.g. `"api"`)
    #[must_use]
    pub fn new(table: &RouteTable, prefix: &str) -> Self {
        let prefix: Vec<String> = split_path(prefix).map(str::to_string).collect();
        let mut routes: Vec<CompiledRoute> = table
            .iter()
            .map(|entry| {
                let segments: Vec<SegmentMatcher> = entry
                    .template
                    .segments()
                    .iter()
                    .map(|seg| match seg {
                        PathSegment::Literal(s) => SegmentMatcher::Literal(s.clone()),
                        PathSegment::Param { name, constraint } => SegmentMatcher::Param {
                            name: Arc::from(name.as_str()),
                            constraint: constraint
                                .as_deref()
                                .and_then(|c| compile_constraint(entry.operation_id(), name, c)),
                        },
                    })
                    .collect();
                let rank = segments
                    .iter()
                    .map(|s| match s {
                        SegmentMatcher::Literal(_) => 0,
                        SegmentMatcher::Param { .. } => 1,
                    })
                    .collect();
                CompiledRoute {
                    entry: Arc::clone(entry),
                    segments,
                    rank,
                }
            })
            .collect();
        // stable: equal ranks keep registration order
        routes.sort_by(|a, b| a.rank.cmp(&b.rank));
        debug!(routes = routes.len(), prefix = ?prefix, "router built");
        Self { prefix, routes }
    }

    /// Resolve a request path (query string already removed)
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> RouteOutcome {
        let mut parts = split_path(path);
        for expected in &self.prefix {
            match parts.next() {
                Some(part) if part.eq_ignore_ascii_case(expected) => {}
                _ => return RouteOutcome::NotFound,
            }
        }
        let parts: SmallVec<[&str; 8]> = parts.collect();

        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = match_segments(&route.segments, &parts) else {
                continue;
            };
            if route.entry.descriptor.method == *method {
                return RouteOutcome::Matched(RouteMatch {
                    entry: Arc::clone(&route.entry),
                    path_params: params,
                });
            }
            if !allowed.contains(&route.entry.descriptor.method) {
                allowed.push(route.entry.descriptor.method.clone());
            }
        }
        if allowed.is_empty() {
            RouteOutcome::NotFound
        } else {
            RouteOutcome::MethodNotAllowed { allowed }
        }
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

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(segments: &[SegmentMatcher], parts: &[&str]) -> Option<ParamVec> {
    if segments.len() != parts.len() {
        return None;
    }
    let mut params = ParamVec::new();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            SegmentMatcher::Literal(lit) => {
                if !lit.eq_ignore_ascii_case(part) {
                    return None;
                }
            }
            SegmentMatcher::Param { name, constraint } => {
                let value = urlencoding::decode(part).ok()?;
                if let Some(re) = constraint {
                    if !re.is_match(&value) {
                        return None;
                    }
                }
                params.push((Arc::clone(name), value.into_owned()));
            }
        }
    }
    Some(params)
}

/// Compile an inline route constraint, or `None` if it cannot be enforced
fn compile_constraint(operation_id: &str, param: &str, raw: &str) -> Option<Regex> {
    let pattern = if let Some(inner) = raw.strip_prefix("regex(").and_then(|r| r.strip_suffix(')')) {
        inner.to_string()
    } else {
        match raw.to_ascii_lowercase().as_str() {
            "int" | "long" => r"^-?[0-9]+$".to_string(),
            "alpha" => r"^[A-Za-z]+$".to_string(),
            "bool" => r"^(true|false)$".to_string(),
            "guid" => {
                r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$".to_string()
            }
            _ => {
                warn!(
                    operation_id,
                    param,
                    constraint = raw,
                    "unsupported route constraint; parameter left unconstrained"
                );
                return None;
            }
        }
    };
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(
                operation_id,
                param,
                constraint = raw,
                error = %err,
                "route constraint not expressible; parameter left unconstrained"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{ParameterDescriptor, RouteDescriptor, SchemaRegistry, SchemaShape, SecuritySchemeRegistry};

    fn table(routes: Vec<RouteDescriptor>) -> RouteTable {
        let (s, k) = (SchemaRegistry::new(), SecuritySchemeRegistry::new());
        let mut t = RouteTable::new();
        for r in routes {
            t.add_route(r, &s, &k).unwrap();
        }
        t
    }

    fn user_routes() -> RouteTable {
        table(vec![
            RouteDescriptor::new(
                Method::GET,
                "/user/{username:regex((?!^login$)(^.+$))}",
                "getUserByName",
            )
            .parameter(ParameterDescriptor::path("username", SchemaShape::string())),
            RouteDescriptor::new(Method::GET, "/user/login", "loginUser"),
        ])
    }

    fn matched(outcome: RouteOutcome) -> RouteMatch {
        match outcome {
            RouteOutcome::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_beats_param_regardless_of_order() {
        let router = Router::new(&user_routes(), "api");
        let m = matched(router.route(&Method::GET, "/api/user/login"));
        assert_eq!(m.operation_id(), "loginUser");
        let m = matched(router.route(&Method::GET, "/api/user/jdoe"));
        assert_eq!(m.operation_id(), "getUserByName");
        assert_eq!(m.get_path_param("username"), Some("jdoe"));
    }

    #[test]
    fn test_prefix_required() {
        let router = Router::new(&user_routes(), "/api/");
        assert!(matches!(
            router.route(&Method::GET, "/user/jdoe"),
            RouteOutcome::NotFound
        ));
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let router = Router::new(&user_routes(), "api");
        match router.route(&Method::DELETE, "/api/user/jdoe") {
            RouteOutcome::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::GET]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_percent_decoding() {
        let router = Router::new(&user_routes(), "api");
        let m = matched(router.route(&Method::GET, "/api/user/jane%20doe"));
        assert_eq!(m.get_path_param("username"), Some("jane doe"));
    }

    #[test]
    fn test_int_constraint_enforced() {
        let t = table(vec![RouteDescriptor::new(Method::GET, "/pet/{petId:long}", "getPetById")
            .parameter(ParameterDescriptor::path("petId", SchemaShape::int64()))]);
        let router = Router::new(&t, "");
        assert!(matches!(
            router.route(&Method::GET, "/pet/12"),
            RouteOutcome::Matched(_)
        ));
        assert!(matches!(
            router.route(&Method::GET, "/pet/abc"),
            RouteOutcome::NotFound
        ));
    }

    #[test]
    fn test_supported_regex_constraint() {
        let t = table(vec![RouteDescriptor::new(
            Method::GET,
            "/code/{code:regex(^[a-z]{2,3}$)}",
            "getCode",
        )
        .parameter(ParameterDescriptor::path("code", SchemaShape::string()))]);
        let router = Router::new(&t, "");
        assert!(matches!(router.route(&Method::GET, "/code/ab"), RouteOutcome::Matched(_)));
        assert!(matches!(router.route(&Method::GET, "/code/abcd"), RouteOutcome::NotFound));
    }

    #[test]
    fn test_insertion_order_breaks_ties() {
        let t = table(vec![
            RouteDescriptor::new(Method::GET, "/a/{x}", "first")
                .parameter(ParameterDescriptor::path("x", SchemaShape::string())),
            RouteDescriptor::new(Method::POST, "/a/{y}", "second")
                .parameter(ParameterDescriptor::path("y", SchemaShape::string())),
        ]);
        let router = Router::new(&t, "");
        assert_eq!(matched(router.route(&Method::GET, "/a/1")).operation_id(), "first");
        assert_eq!(matched(router.route(&Method::POST, "/a/1")).operation_id(), "second");
    }
}
