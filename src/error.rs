use thiserror::Error;

use crate::config::ConfigError;
use crate::context::ValidationEvent;
use crate::schema::SchemaKind;

/// Main library error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {details}")]
    Xml { details: String },

    #[error("Data binding error for <{root}>: {details}")]
    Binding { root: String, details: String },

    #[error("Marshalling error for <{root}>: {details}")]
    Marshal { root: String, details: String },

    #[error("Strict validation rejected {} event(s): {}", events.len(), summarize(events))]
    StrictValidation { events: Vec<ValidationEvent> },

    #[error("Schema validation failed for {kind}: {}", errors.join("; "))]
    SchemaValidation { kind: SchemaKind, errors: Vec<String> },

    #[error("No schema resource is mapped for schema kind {kind}")]
    UnmappedSchemaKind { kind: SchemaKind },

    #[error("Schema resource not found: {name}")]
    SchemaResourceNotFound { name: String },

    #[error("Unresolved schema references while compiling {schema}: {}", names.join(", "))]
    UnresolvedSchemaReference { schema: String, names: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },
}

/// LibXML2-specific error types
///
/// Cloneable so that a failed compilation can be shared by every caller
/// waiting on the same schema cache entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {}", details.join("; "))]
    SchemaParseFailed { details: Vec<String> },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Document parsing failed: {name}")]
    DocumentParseFailed { name: String },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("Unresolved schema references: {}", names.join(", "))]
    UnresolvedResources { schema: String, names: Vec<String> },

    #[error("Validation generated an internal error with code {code}: {name}")]
    InternalError { code: i32, name: String },
}

fn summarize(events: &[ValidationEvent]) -> String {
    events
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// Error conversion implementations
impl From<ConfigError> for DescriptorError {
    fn from(err: ConfigError) -> Self {
        DescriptorError::Config(err.to_string())
    }
}

impl From<LibXml2Error> for DescriptorError {
    fn from(err: LibXml2Error) -> Self {
        match err {
            LibXml2Error::UnresolvedResources { schema, names } => {
                DescriptorError::UnresolvedSchemaReference { schema, names }
            }
            other => DescriptorError::LibXml2Internal {
                details: other.to_string(),
            },
        }
    }
}

impl From<quick_xml::Error> for DescriptorError {
    fn from(err: quick_xml::Error) -> Self {
        DescriptorError::Xml {
            details: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
