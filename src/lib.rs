//! # jee-descriptor Library
//!
//! Reading, writing and validating Java EE / Jakarta EE deployment
//! descriptors (`ejb-jar.xml`, `web.xml`, `application-client.xml`,
//! `persistence.xml`, tag library and handler chain files).
//!
//! Documents from any schema generation (DTD based J2EE 1.3, J2EE 1.4, Java EE
//! 5 through 8, Jakarta EE) are reconciled to a single canonical namespace and
//! version by a chain of pull-based event filters before they reach the record
//! model or the schema validator.

pub mod binding;
pub mod cache;
pub mod config;
pub mod context;
pub mod dialect;
pub mod error;
pub mod event;
pub mod filter;
pub mod libxml2;
pub mod model;
pub mod report;
pub mod schema;
pub mod writer;

pub use binding::{
    DescriptorBinding, marshal, unmarshal, unmarshal_handler_chains, unmarshal_javaee,
    unmarshal_persistence, unmarshal_taglib,
};
pub use cache::{CacheStats, SchemaCache, SchemaCacheKey};
pub use config::{Config, ConfigManager};
pub use context::{ParseContext, PublicIdRegistry, Severity, ValidationEvent};
pub use dialect::LegacyDialect;
pub use error::{DescriptorError, LibXml2Error, Result};
pub use event::{EventSource, XmlEvent, XmlEventReader};
pub use filter::{
    HandlerChainsFilter, NamespaceFilter, TaglibFilter, VersionPatchFilter, VersionPatchTable,
};
pub use libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
pub use model::Descriptor;
pub use report::{EventReporter, VerbosityLevel};
pub use schema::{
    DirectoryResources, MemoryResources, ResourceLocator, SchemaCatalog, SchemaKind,
    SchemaValidator,
};
pub use writer::{DocumentOptions, EventWriter, WriterMode};
