//! LibXML2 FFI wrapper
//!
//! XSD compilation and validation go through libxml2 directly; the Rust
//! ecosystem has no XML Schema 1.0 validator of comparable coverage.
//!
//! ## Thread safety
//!
//! - **Schema parsing** is not thread-safe in libxml2 and additionally relies
//!   on the process-wide external entity loader, so every compilation holds
//!   [`SCHEMA_PARSE_LOCK`].
//! - **Validation** is parallel: a compiled schema is read-only and each call
//!   creates its own validation context.
//!
//! ## Resource resolution
//!
//! While a schema compiles, every `xsd:include`/`xsd:import` (and any other
//! external entity) is answered from the [`ResourceLocator`] passed to
//! [`LibXml2Wrapper::parse_schema_with_resources`], looked up by the last path
//! segment of the reference. Nothing is read from disk or the network by
//! libxml2 itself. Names that could not be resolved are collected and turn a
//! compilation that libxml2 would merely warn about into an error.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Arc, Mutex, Once, OnceLock, PoisonError};

use libc::{c_char, c_int, c_void};

use crate::context::{Severity, ValidationEvent};
use crate::error::{LibXml2Error, LibXml2Result};
use crate::schema::{ResourceLocator, resource_name};

/// Global initialization flag for libxml2
static LIBXML2_INIT: Once = Once::new();

/// Serializes schema compilation
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

/// Loader that was installed before ours, used outside schema compilation
static PREVIOUS_LOADER: OnceLock<XmlExternalEntityLoader> = OnceLock::new();

// xmlParserOption flags
const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlParserInput {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlParserCtxt {
    _private: [u8; 0],
}

pub type XmlExternalEntityLoader = Option<
    unsafe extern "C" fn(
        url: *const c_char,
        id: *const c_char,
        ctxt: *mut XmlParserCtxt,
    ) -> *mut XmlParserInput,
>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    // Schema parsing
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Entity resolution
    pub fn xmlSetExternalEntityLoader(f: XmlExternalEntityLoader);
    pub fn xmlGetExternalEntityLoader() -> XmlExternalEntityLoader;
    pub fn xmlNewStringInputStream(
        ctxt: *mut XmlParserCtxt,
        buffer: *const u8,
    ) -> *mut XmlParserInput;

    // Documents
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);

    // Schema validation
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        sherr: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

/// Collects libxml2 diagnostics as [`ValidationEvent`]s
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut xmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let events = unsafe { &mut *(user_data as *mut Vec<ValidationEvent>) };
    let error = unsafe { &*error };

    let message = if error.message.is_null() {
        format!("libxml2 error code {}", error.code)
    } else {
        unsafe { CStr::from_ptr(error.message) }
            .to_string_lossy()
            .trim()
            .to_string()
    };
    let severity = match error.level {
        1 => Severity::Warning,
        2 => Severity::Error,
        _ => Severity::FatalError,
    };

    let mut event = ValidationEvent::new(severity, message);
    if error.line > 0 {
        event = event.at_line(error.line as u32);
    }
    events.push(event);
}

/// Compilation state visible to the entity loader on the compiling thread
struct ResolverScope {
    locator: Arc<dyn ResourceLocator>,
    // input streams may point into these until the parser context is freed
    buffers: Vec<CString>,
    resolved: Vec<String>,
    unresolved: Vec<String>,
}

thread_local! {
    static ACTIVE_SCOPE: RefCell<Option<ResolverScope>> = const { RefCell::new(None) };
}

unsafe extern "C" fn resource_entity_loader(
    url: *const c_char,
    id: *const c_char,
    ctxt: *mut XmlParserCtxt,
) -> *mut XmlParserInput {
    let url_str = if url.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(url) }.to_string_lossy().into_owned()
    };

    let handled = ACTIVE_SCOPE.with(|cell| {
        let mut guard = cell.borrow_mut();
        let scope = guard.as_mut()?;
        let name = resource_name(&url_str).to_string();

        let input = match scope.locator.load(&name).and_then(|bytes| CString::new(bytes).ok()) {
            Some(buffer) => {
                let input = unsafe { xmlNewStringInputStream(ctxt, buffer.as_ptr() as *const u8) };
                tracing::trace!(reference = %url_str, resource = %name, "resolved schema reference");
                scope.buffers.push(buffer);
                scope.resolved.push(name);
                input
            }
            None => {
                tracing::warn!(reference = %url_str, resource = %name, "schema reference not found");
                scope.unresolved.push(name);
                ptr::null_mut()
            }
        };
        Some(input)
    });

    match handled {
        Some(input) => input,
        None => match PREVIOUS_LOADER.get().copied().flatten() {
            Some(previous) => unsafe { previous(url, id, ctxt) },
            None => ptr::null_mut(),
        },
    }
}

/// Installs a [`ResolverScope`] for the current thread and removes it on drop
struct ScopeGuard;

impl ScopeGuard {
    fn enter(locator: Arc<dyn ResourceLocator>) -> Self {
        ACTIVE_SCOPE.with(|cell| {
            *cell.borrow_mut() = Some(ResolverScope {
                locator,
                buffers: Vec::new(),
                resolved: Vec::new(),
                unresolved: Vec::new(),
            });
        });
        ScopeGuard
    }

    /// Names resolved and not resolved so far
    fn outcome(&self) -> (Vec<String>, Vec<String>) {
        ACTIVE_SCOPE.with(|cell| match cell.borrow().as_ref() {
            Some(scope) => (scope.resolved.clone(), scope.unresolved.clone()),
            None => (Vec::new(), Vec::new()),
        })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE_SCOPE.with(|cell| cell.borrow_mut().take());
    }
}

/// Thread-safe handle to a compiled schema, freed when the last clone drops
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: compiled xmlSchema structures are only read during validation
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and must not be freed elsewhere.
    pub(crate) unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        if ptr.is_null() {
            return Err(LibXml2Error::SchemaParseFailed { details: Vec::new() });
        }

        Ok(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }

    pub fn is_valid(&self) -> bool {
        !self.inner.ptr.is_null()
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Conforms; warnings may still have been reported
    Valid { warnings: Vec<ValidationEvent> },
    /// Does not conform (libxml2 return code > 0)
    Invalid {
        error_count: i32,
        diagnostics: Vec<ValidationEvent>,
    },
    /// libxml2 failed internally (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    pub fn from_code(code: c_int, diagnostics: Vec<ValidationEvent>) -> Self {
        match code {
            0 => ValidationResult::Valid {
                warnings: diagnostics,
            },
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                diagnostics,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationResult::InternalError { .. })
    }
}

pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    /// Initializes libxml2 and installs the resource-backed entity loader
    /// exactly once per process.
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
            let _ = PREVIOUS_LOADER.set(xmlGetExternalEntityLoader());
            xmlSetExternalEntityLoader(Some(resource_entity_loader));
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Compile a self-contained schema. Any external reference fails to resolve.
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        self.parse_schema_with_resources(schema_data, "<memory>", Arc::new(NoResources))
    }

    /// Compile a schema whose includes and imports are answered by `locator`.
    ///
    /// `name` only labels errors. Fails with [`LibXml2Error::UnresolvedResources`]
    /// when any reference could not be located, even if libxml2 produced a schema.
    pub fn parse_schema_with_resources(
        &self,
        schema_data: &[u8],
        name: &str,
        locator: Arc<dyn ResourceLocator>,
    ) -> LibXml2Result<XmlSchemaPtr> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| LibXml2Error::MemoryAllocation)?;

        let _lock = SCHEMA_PARSE_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let scope = ScopeGuard::enter(locator);
        let mut diagnostics: Vec<ValidationEvent> = Vec::new();

        let schema_ptr = unsafe {
            let parser_ctxt = xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                &mut diagnostics as *mut Vec<ValidationEvent> as *mut c_void,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);
            schema_ptr
        };

        // take ownership first so an early return frees the schema
        let schema = unsafe { XmlSchemaPtr::from_raw(schema_ptr) };
        let (resolved, unresolved) = scope.outcome();
        drop(scope);

        tracing::debug!(
            schema = %name,
            resolved = resolved.len(),
            unresolved = unresolved.len(),
            "compiled schema"
        );

        if !unresolved.is_empty() {
            return Err(LibXml2Error::UnresolvedResources {
                schema: name.to_string(),
                names: unresolved,
            });
        }

        schema.map_err(|_| LibXml2Error::SchemaParseFailed {
            details: diagnostics
                .into_iter()
                .filter(|event| event.severity != Severity::Warning)
                .map(|event| event.message)
                .collect(),
        })
    }

    /// Validate an in-memory document. Network access is disabled while parsing it.
    ///
    /// Safe to call concurrently with a shared `schema`.
    pub fn validate_memory(
        &self,
        schema: &XmlSchemaPtr,
        xml_content: &[u8],
        name: &str,
    ) -> LibXml2Result<ValidationResult> {
        let size = c_int::try_from(xml_content.len()).map_err(|_| LibXml2Error::MemoryAllocation)?;
        let c_name = CString::new(name).unwrap_or_default();

        unsafe {
            let doc = xmlReadMemory(
                xml_content.as_ptr() as *const c_char,
                size,
                c_name.as_ptr(),
                ptr::null(),
                XML_PARSE_NONET | XML_PARSE_NOERROR | XML_PARSE_NOWARNING,
            );
            if doc.is_null() {
                return Err(LibXml2Error::DocumentParseFailed {
                    name: name.to_string(),
                });
            }

            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                xmlFreeDoc(doc);
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut diagnostics: Vec<ValidationEvent> = Vec::new();
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                &mut diagnostics as *mut Vec<ValidationEvent> as *mut c_void,
            );

            let result_code = xmlSchemaValidateDoc(valid_ctxt, doc);

            xmlSchemaFreeValidCtxt(valid_ctxt);
            xmlFreeDoc(doc);

            match ValidationResult::from_code(result_code, diagnostics) {
                ValidationResult::InternalError { code } => Err(LibXml2Error::InternalError {
                    code,
                    name: name.to_string(),
                }),
                result => Ok(result),
            }
        }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Locator that knows no resources
struct NoResources;

impl ResourceLocator for NoResources {
    fn load(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}
