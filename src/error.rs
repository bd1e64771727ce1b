use std::fmt;

/// Registry and compilation error
///
/// Every variant is a start-up (programmer or configuration) error. None of
/// them are produced while serving requests, and the process must not start
/// serving while any of them is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A schema with this name is already registered
    DuplicateSchema {
        /// The colliding schema name
        name: String,
    },
    /// No schema with this name is registered
    UnknownSchema {
        /// The missing schema name
        name: String,
    },
    /// An enum shape is not a bijection between identifiers and wire strings
    InvalidEnum {
        /// Schema name of the enum
        name: String,
        /// What is wrong with it
        reason: String,
    },
    /// A security scheme with this name is already registered
    DuplicateScheme {
        /// The colliding scheme name
        name: String,
    },
    /// An OAuth2 scheme declares no flows, a flow without scopes, or a flow
    /// missing a URL its type requires
    InvalidSecurityFlow {
        /// Scheme name
        scheme: String,
        /// What is wrong with it
        reason: String,
    },
    /// A security scheme is structurally invalid (e.g. an API key with no name)
    InvalidSecurityScheme {
        /// Scheme name
        scheme: String,
        /// What is wrong with it
        reason: String,
    },
    /// A route with the same method and path is already registered
    DuplicateRoute {
        /// HTTP method
        method: String,
        /// Path of the rejected route, constraints stripped
        path: String,
    },
    /// A route or schema references a schema, scheme or scope that is not registered
    DanglingReference {
        /// Where the reference was found (operation id or schema name)
        origin: String,
        /// The unresolved name
        reference: String,
    },
    /// A route descriptor is structurally invalid
    InvalidRoute {
        /// Operation id (may be empty when that is the problem)
        operation_id: String,
        /// What is wrong with it
        reason: String,
    },
    /// A reference resolved at registration time no longer resolves at compile time
    StaleReference {
        /// Operation id holding the reference
        origin: String,
        /// The unresolved name
        reference: String,
    },
    /// The registry set has been sealed by a compile
    RegistryClosed,
    /// `info.title` or `info.version` is empty
    IncompleteDocument {
        /// The empty field
        field: &'static str,
    },
    /// The typed document could not be rendered to JSON
    Render {
        /// Serializer message
        reason: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateSchema { name } => {
                write!(f, "schema '{name}' is already registered")
            }
            RegistryError::UnknownSchema { name } => write!(f, "unknown schema '{name}'"),
            RegistryError::InvalidEnum { name, reason } => {
                write!(f, "enum schema '{name}' is invalid: {reason}")
            }
            RegistryError::DuplicateScheme { name } => {
                write!(f, "security scheme '{name}' is already registered")
            }
            RegistryError::InvalidSecurityFlow { scheme, reason } => {
                write!(f, "security scheme '{scheme}' has an invalid flow: {reason}")
            }
            RegistryError::InvalidSecurityScheme { scheme, reason } => {
                write!(f, "security scheme '{scheme}' is invalid: {reason}")
            }
            RegistryError::DuplicateRoute { method, path } => {
                write!(f, "route {method} {path} is already registered")
            }
            RegistryError::DanglingReference { origin, reference } => {
                write!(f, "'{origin}' references unregistered '{reference}'")
            }
            RegistryError::InvalidRoute {
                operation_id,
                reason,
            } => write!(f, "route '{operation_id}' is invalid: {reason}"),
            RegistryError::StaleReference { origin, reference } => write!(
                f,
                "'{origin}' references '{reference}', which no longer resolves at compile time"
            ),
            RegistryError::RegistryClosed => {
                write!(f, "registry is sealed; no further registrations are accepted")
            }
            RegistryError::IncompleteDocument { field } => {
                write!(f, "document info.{field} must not be empty")
            }
            RegistryError::Render { reason } => {
                write!(f, "failed to render the OpenAPI document: {reason}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Result alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
