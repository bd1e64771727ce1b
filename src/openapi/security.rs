use crate::error::{RegistryError, RegistryResult};
use indexmap::IndexMap;
use tracing::debug;
use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, AuthorizationCode, ClientCredentials, Flow, Implicit, OAuth2, Password,
    Scopes, SecurityScheme as OpenApiScheme,
};

/// Where an API key is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// OAuth2 flow type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    Implicit,
    Password,
    ClientCredentials,
    AuthorizationCode,
}

impl FlowType {
    /// Key used under `flows` in the document
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Implicit => "implicit",
            FlowType::Password => "password",
            FlowType::ClientCredentials => "clientCredentials",
            FlowType::AuthorizationCode => "authorizationCode",
        }
    }

    fn needs_authorization_url(self) -> bool {
        matches!(self, FlowType::Implicit | FlowType::AuthorizationCode)
    }

    fn needs_token_url(self) -> bool {
        !matches!(self, FlowType::Implicit)
    }
}

/// A single OAuth2 flow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OAuthFlow {
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    /// Scope name to description
    pub scopes: IndexMap<String, String>,
}

impl OAuthFlow {
    #[must_use]
    pub fn implicit(authorization_url: &str) -> Self {
        Self {
            authorization_url: Some(authorization_url.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn scope(mut self, name: &str, description: &str) -> Self {
        self.scopes.insert(name.to_string(), description.to_string());
        self
    }
}

/// A named authentication scheme. Documentation only; nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityScheme {
    ApiKey {
        name: String,
        location: ApiKeyLocation,
        description: Option<String>,
    },
    OAuth2 {
        flows: IndexMap<FlowType, OAuthFlow>,
        description: Option<String>,
    },
}

impl SecurityScheme {
    #[must_use]
    pub fn api_key_header(name: &str) -> Self {
        SecurityScheme::ApiKey {
            name: name.to_string(),
            location: ApiKeyLocation::Header,
            description: None,
        }
    }

    #[must_use]
    pub fn oauth2(flow_type: FlowType, flow: OAuthFlow) -> Self {
        let mut flows = IndexMap::new();
        flows.insert(flow_type, flow);
        SecurityScheme::OAuth2 {
            flows,
            description: None,
        }
    }

    /// Whether `scope` is declared by any flow. API keys have no scopes.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        match self {
            SecurityScheme::ApiKey { .. } => false,
            SecurityScheme::OAuth2 { flows, .. } => {
                flows.values().any(|f| f.scopes.contains_key(scope))
            }
        }
    }

    fn validate(&self, scheme: &str) -> RegistryResult<()> {
        match self {
            SecurityScheme::ApiKey { name, .. } => {
                if name.trim().is_empty() {
                    return Err(RegistryError::InvalidSecurityScheme {
                        scheme: scheme.to_string(),
                        reason: "api key parameter name is empty".to_string(),
                    });
                }
                Ok(())
            }
            SecurityScheme::OAuth2 { flows, .. } => {
                let flow_err = |reason: String| RegistryError::InvalidSecurityFlow {
                    scheme: scheme.to_string(),
                    reason,
                };
                if flows.is_empty() {
                    return Err(flow_err("no flows declared".to_string()));
                }
                for (flow_type, flow) in flows {
                    let kind = flow_type.as_str();
                    if flow.scopes.is_empty() {
                        return Err(flow_err(format!("{kind} flow declares no scopes")));
                    }
                    if flow_type.needs_authorization_url() {
                        check_url(&flow.authorization_url, kind, "authorizationUrl")
                            .map_err(flow_err)?;
                    }
                    if flow_type.needs_token_url() {
                        check_url(&flow.token_url, kind, "tokenUrl").map_err(flow_err)?;
                    }
                    if flow.refresh_url.is_some() {
                        check_url(&flow.refresh_url, kind, "refreshUrl").map_err(flow_err)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Converts the scheme into its OpenAPI form
    #[must_use]
    pub fn to_openapi(&self) -> OpenApiScheme {
        match self {
            SecurityScheme::ApiKey {
                name,
                location,
                description,
            } => {
                let value = match description {
                    Some(desc) => ApiKeyValue::with_description(name, desc),
                    None => ApiKeyValue::new(name),
                };
                OpenApiScheme::ApiKey(match location {
                    ApiKeyLocation::Header => ApiKey::Header(value),
                    ApiKeyLocation::Query => ApiKey::Query(value),
                    ApiKeyLocation::Cookie => ApiKey::Cookie(value),
                })
            }
            SecurityScheme::OAuth2 { flows, description } => {
                let flows = flows.iter().map(|(flow_type, flow)| flow.to_openapi(*flow_type));
                OpenApiScheme::OAuth2(match description {
                    Some(desc) => OAuth2::with_description(flows, desc),
                    None => OAuth2::new(flows),
                })
            }
        }
    }
}

impl OAuthFlow {
    /// URLs were checked at registration, so a missing one renders empty
    fn to_openapi(&self, flow_type: FlowType) -> Flow {
        let scopes = Scopes::from_iter(self.scopes.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let authorization_url = self.authorization_url.clone().unwrap_or_default();
        let token_url = self.token_url.clone().unwrap_or_default();
        match (flow_type, self.refresh_url.clone()) {
            (FlowType::Implicit, None) => Flow::Implicit(Implicit::new(authorization_url, scopes)),
            (FlowType::Implicit, Some(refresh)) => {
                Flow::Implicit(Implicit::with_refresh_url(authorization_url, scopes, refresh))
            }
            (FlowType::Password, None) => Flow::Password(Password::new(token_url, scopes)),
            (FlowType::Password, Some(refresh)) => {
                Flow::Password(Password::with_refresh_url(token_url, scopes, refresh))
            }
            (FlowType::ClientCredentials, None) => {
                Flow::ClientCredentials(ClientCredentials::new(token_url, scopes))
            }
            (FlowType::ClientCredentials, Some(refresh)) => Flow::ClientCredentials(
                ClientCredentials::with_refresh_url(token_url, scopes, refresh),
            ),
            (FlowType::AuthorizationCode, None) => Flow::AuthorizationCode(
                AuthorizationCode::new(authorization_url, token_url, scopes),
            ),
            (FlowType::AuthorizationCode, Some(refresh)) => Flow::AuthorizationCode(
                AuthorizationCode::with_refresh_url(authorization_url, token_url, scopes, refresh),
            ),
        }
    }
}

fn check_url(url: &Option<String>, kind: &str, field: &str) -> Result<(), String> {
    match url {
        None => Err(format!("{kind} flow requires {field}")),
        Some(raw) => url::Url::parse(raw)
            .map(|_| ())
            .map_err(|e| format!("{kind} flow {field} '{raw}' is not an absolute URL: {e}")),
    }
}

/// Append-only map of scheme name to scheme, in registration order
#[derive(Debug, Clone, Default)]
pub struct SecuritySchemeRegistry {
    schemes: IndexMap<String, SecurityScheme>,
}

impl SecuritySchemeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, scheme: SecurityScheme) -> RegistryResult<()> {
        if self.schemes.contains_key(name) {
            return Err(RegistryError::DuplicateScheme {
                name: name.to_string(),
            });
        }
        scheme.validate(name)?;
        debug!(scheme = %name, "registered security scheme");
        self.schemes.insert(name.to_string(), scheme);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SecurityScheme> {
        self.schemes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SecurityScheme)> {
        self.schemes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}
