//! Schema resolution and validation of Java EE descriptors
//!
//! A [`SchemaValidator`] validates a descriptor against the single
//! consolidated Java EE 6 schema of its kind. The document is first passed
//! through the same namespace and version reconciliation used for binding, so
//! a J2EE 1.4 `ejb-jar.xml` is checked as if it had been written for EJB 3.1.
//!
//! Schemas are bundled resources addressed by file name. Every include and
//! import they contain is answered from the same [`ResourceLocator`]; a
//! reference that cannot be found fails compilation instead of producing a
//! partial schema.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use crate::cache::{SchemaCache, SchemaCacheKey};
use crate::config::Config;
use crate::context::{ParseContext, Severity, ValidationEvent};
use crate::dialect::{XML_NS, XSD_NS};
use crate::error::{DescriptorError, Result};
use crate::event::XmlEventReader;
use crate::filter::{NamespaceFilter, VersionPatchFilter, VersionPatchTable};
use crate::libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
use crate::report::EventReporter;
use crate::writer::{DocumentOptions, EventWriter};

/// Base schema for the `xml:` attributes, always loaded alongside the root schema
pub const XML_SCHEMA_FILE: &str = "xml.xsd";

/// Logical location of bundled schema resources
pub const SCHEMA_RESOURCE_DIR: &str = "META-INF/schema";

/// Supported schema kinds, each validated against one consolidated schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaKind {
    WebApp30,
    EjbJar31,
    Application6,
    ApplicationClient6,
    Connector16,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 5] = [
        SchemaKind::WebApp30,
        SchemaKind::EjbJar31,
        SchemaKind::Application6,
        SchemaKind::ApplicationClient6,
        SchemaKind::Connector16,
    ];

    pub fn root_element(self) -> &'static str {
        match self {
            SchemaKind::WebApp30 => "web-app",
            SchemaKind::EjbJar31 => "ejb-jar",
            SchemaKind::Application6 => "application",
            SchemaKind::ApplicationClient6 => "application-client",
            SchemaKind::Connector16 => "connector",
        }
    }

    /// Value the root `version` attribute is patched to before validation
    pub fn canonical_version(self) -> &'static str {
        match self {
            SchemaKind::WebApp30 => "3.0",
            SchemaKind::EjbJar31 => "3.1",
            SchemaKind::Application6 => "6",
            SchemaKind::ApplicationClient6 => "6",
            SchemaKind::Connector16 => "1.6",
        }
    }

    pub fn schema_file_name(self) -> &'static str {
        match self {
            SchemaKind::WebApp30 => "web-app_3_0.xsd",
            SchemaKind::EjbJar31 => "ejb-jar_3_1.xsd",
            SchemaKind::Application6 => "application_6.xsd",
            SchemaKind::ApplicationClient6 => "application-client_6.xsd",
            SchemaKind::Connector16 => "connector_1_6.xsd",
        }
    }

    pub fn from_root_element(root: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.root_element() == root)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root_element(), self.canonical_version())
    }
}

/// Which root schema resource each kind validates against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCatalog {
    entries: BTreeMap<SchemaKind, String>,
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        let entries = SchemaKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.schema_file_name().to_string()))
            .collect();
        Self { entries }
    }
}

impl SchemaCatalog {
    /// A catalog with no mappings at all
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Default catalog with file names replaced per root element name.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self> {
        let mut catalog = Self::default();
        for (root, file_name) in overrides {
            let kind = SchemaKind::from_root_element(root).ok_or_else(|| {
                DescriptorError::Config(format!(
                    "schema override for <{}> does not name a supported schema kind",
                    root
                ))
            })?;
            if !file_name.ends_with(".xsd") || resource_name(file_name) != file_name {
                return Err(DescriptorError::Config(format!(
                    "schema override for <{}> must be a bare .xsd file name, got '{}'",
                    root, file_name
                )));
            }
            catalog.entries.insert(kind, file_name.clone());
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, kind: SchemaKind, file_name: impl Into<String>) {
        self.entries.insert(kind, file_name.into());
    }

    pub fn remove(&mut self, kind: SchemaKind) -> Option<String> {
        self.entries.remove(&kind)
    }

    pub fn file_for(&self, kind: SchemaKind) -> Result<&str> {
        self.entries
            .get(&kind)
            .map(String::as_str)
            .ok_or(DescriptorError::UnmappedSchemaKind { kind })
    }
}

/// Last path segment of a schema reference: `http://x/y/javaee_6.xsd` → `javaee_6.xsd`
pub fn resource_name(reference: &str) -> &str {
    let reference = reference.split(['?', '#']).next().unwrap_or(reference);
    reference.rsplit(['/', '\\']).next().unwrap_or(reference)
}

/// Source of bundled schema files, addressed by bare file name
pub trait ResourceLocator: Send + Sync {
    fn load(&self, name: &str) -> Option<Vec<u8>>;

    fn exists(&self, name: &str) -> bool {
        self.load(name).is_some()
    }
}

/// Resources under `<root>/META-INF/schema/`
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(SCHEMA_RESOURCE_DIR).join(resource_name(name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLocator for DirectoryResources {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.path_of(name);
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "schema resource unavailable");
                None
            }
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }
}

/// Resources held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: &str, content: impl AsRef<[u8]>) {
        self.entries
            .insert(resource_name(name).to_string(), content.as_ref().to_vec());
    }
}

impl ResourceLocator for MemoryResources {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.get(resource_name(name)).cloned()
    }

    fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(resource_name(name))
    }
}

/// `targetNamespace` of a schema document, if it declares one
fn target_namespace(schema: &[u8]) -> Result<Option<String>> {
    let mut reader = quick_xml::Reader::from_reader(schema);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() != b"schema" {
                    return Ok(None);
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(crate::event::xml_error)?;
                    if attr.key.as_ref() == b"targetNamespace" {
                        let value = attr.decode_and_unescape_value(reader.decoder()).map_err(crate::event::xml_error)?;
                        return Ok(Some(value.into_owned()));
                    }
                }
                return Ok(None);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Schema that pulls in `xml.xsd` and the root schema in one compilation
fn driver_schema(root_file: &str, target_namespace: Option<&str>) -> String {
    use quick_xml::escape::escape;

    let root_reference = match target_namespace {
        Some(ns) => format!(
            r#"<xsd:import namespace="{}" schemaLocation="{}"/>"#,
            escape(ns),
            escape(root_file)
        ),
        None => format!(r#"<xsd:include schemaLocation="{}"/>"#, escape(root_file)),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:xsd="{}">
  <xsd:import namespace="{}" schemaLocation="{}"/>
  {}
</xsd:schema>"#,
        XSD_NS, XML_NS, XML_SCHEMA_FILE, root_reference
    )
}

/// Validates descriptors against their consolidated Java EE schema
pub struct SchemaValidator {
    catalog: SchemaCatalog,
    resources: Arc<dyn ResourceLocator>,
    versions: VersionPatchTable,
    cache: SchemaCache,
    reporter: EventReporter,
    strict: bool,
    wrapper: LibXml2Wrapper,
}

impl SchemaValidator {
    pub fn new(resources: Arc<dyn ResourceLocator>) -> Self {
        Self {
            catalog: SchemaCatalog::default(),
            resources,
            versions: VersionPatchTable::default(),
            cache: SchemaCache::default(),
            reporter: EventReporter::default(),
            strict: false,
            wrapper: LibXml2Wrapper::new(),
        }
    }

    /// Build a validator from configuration, reading schemas from the
    /// configured resource root.
    pub fn from_config(config: &Config) -> Result<Self> {
        let resources = Arc::new(DirectoryResources::new(config.schema.resource_root.clone()));
        Ok(Self::new(resources)
            .with_catalog(SchemaCatalog::with_overrides(&config.schema.catalog)?)
            .with_versions(VersionPatchTable::with_overrides(&config.schema.versions)?)
            .with_cache(SchemaCache::new(config.schema.cache_capacity))
            .with_reporter(EventReporter::new(config.validation.output_level))
            .strict(config.validation.strict))
    }

    pub fn with_catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_versions(mut self, versions: VersionPatchTable) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_cache(mut self, cache: SchemaCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_reporter(mut self, reporter: EventReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Compiled schema for `kind`, from the cache when possible.
    ///
    /// Fails before touching libxml2 if the kind is unmapped or if the root
    /// schema or `xml.xsd` is missing.
    pub fn schema_for(&self, kind: SchemaKind) -> Result<Arc<XmlSchemaPtr>> {
        let file_name = self.catalog.file_for(kind)?;
        for name in [file_name, XML_SCHEMA_FILE] {
            if !self.resources.exists(name) {
                return Err(DescriptorError::SchemaResourceNotFound {
                    name: name.to_string(),
                });
            }
        }

        let key = SchemaCacheKey::new(kind, file_name);
        if let Some(schema) = self.cache.get(&key) {
            return Ok(schema);
        }

        let root = self
            .resources
            .load(file_name)
            .ok_or_else(|| DescriptorError::SchemaResourceNotFound {
                name: file_name.to_string(),
            })?;
        let driver = driver_schema(file_name, target_namespace(&root)?.as_deref());

        let schema = self.cache.get_or_compile(key, || {
            self.wrapper
                .parse_schema_with_resources(driver.as_bytes(), file_name, Arc::clone(&self.resources))
        })?;
        Ok(schema)
    }

    /// Validate a descriptor of the given kind.
    ///
    /// Returns the non-fatal events observed along the way. Any schema error
    /// fails with [`DescriptorError::SchemaValidation`]; in strict mode any
    /// event at all fails with [`DescriptorError::StrictValidation`].
    pub fn validate_javaee<R: Read>(&self, kind: SchemaKind, input: R) -> Result<Vec<ValidationEvent>> {
        self.validate_document(kind, input)
            .inspect_err(|err| self.reporter.report_error(err))
    }

    fn validate_document<R: Read>(&self, kind: SchemaKind, mut input: R) -> Result<Vec<ValidationEvent>> {
        let schema = self.schema_for(kind)?;

        let mut source = Vec::new();
        input.read_to_end(&mut source)?;

        let mut ctx = ParseContext::new();
        let mut filtered = VersionPatchFilter::with_table(
            NamespaceFilter::javaee(XmlEventReader::new(source.as_slice())),
            self.versions.clone(),
        );
        let mut writer = EventWriter::document(
            Vec::new(),
            DocumentOptions {
                indent: None,
                strip_schema_location: true,
            },
        );
        writer.write_all(&mut filtered, &mut ctx)?;
        let document = writer.into_inner();

        let label = kind.root_element();
        match self.wrapper.validate_memory(&schema, &document, label)? {
            ValidationResult::Valid { warnings } => {
                for warning in warnings {
                    ctx.emit(warning);
                }
            }
            ValidationResult::Invalid { diagnostics, .. } => {
                self.reporter.report(diagnostics.iter());
                let errors = diagnostics
                    .into_iter()
                    .filter(|event| event.severity >= Severity::Error)
                    .map(|event| event.to_string())
                    .collect();
                return Err(DescriptorError::SchemaValidation { kind, errors });
            }
            ValidationResult::InternalError { code } => {
                return Err(DescriptorError::LibXml2Internal {
                    details: format!("validation of {} returned code {}", kind, code),
                });
            }
        }

        self.reporter.report(ctx.events().iter());
        if self.strict && ctx.has_events() {
            return Err(DescriptorError::StrictValidation {
                events: ctx.into_events(),
            });
        }
        Ok(ctx.into_events())
    }

    pub fn validate_javaee_str(&self, kind: SchemaKind, xml: &str) -> Result<Vec<ValidationEvent>> {
        self.validate_javaee(kind, xml.as_bytes())
    }

    pub fn validate_javaee_file(&self, kind: SchemaKind, path: &Path) -> Result<Vec<ValidationEvent>> {
        let file = std::fs::File::open(path)?;
        self.validate_javaee(kind, std::io::BufReader::new(file))
    }
}
