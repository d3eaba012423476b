//! Pull-based XML event stream
//!
//! Parsing is modelled as a chain of [`EventSource`] stages. The first stage is
//! always an [`XmlEventReader`] wrapping quick-xml's namespace-aware reader;
//! every filter stage consumes the same interface it exposes, so stages can be
//! stacked in any order. Each call to [`EventSource::next_event`] receives the
//! per-parse [`ParseContext`], which is how the DOCTYPE public ids and the
//! validation events reach later consumers without any shared global state.

use std::fmt::Display;
use std::io::BufRead;
use std::sync::OnceLock;

use quick_xml::encoding::Decoder;
use quick_xml::events::Event;
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::reader::NsReader;
use regex::Regex;

use crate::context::ParseContext;
use crate::error::{DescriptorError, Result};

/// Cached regex for DOCTYPE declaration contents
static DOCTYPE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_doctype_regex() -> &'static Regex {
    DOCTYPE_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?s)^\s*([^\s\[>]+)\s*(?:PUBLIC\s+(?:"([^"]*)"|'([^']*)')(?:\s+(?:"([^"]*)"|'([^']*)'))?|SYSTEM\s+(?:"([^"]*)"|'([^']*)'))?"#,
        )
        .expect("Failed to compile DOCTYPE regex")
    })
}

/// Namespace-qualified XML name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local_name: String,
}

impl QualifiedName {
    pub fn new(namespace: Option<&str>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            prefix: None,
            local_name: local_name.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Name as written in the source document (`prefix:local` or `local`)
    pub fn qname(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// Ordinary (non namespace-declaring) attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: QualifiedName,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: QualifiedName::new(None, local_name),
            value: value.into(),
        }
    }
}

/// `xmlns` or `xmlns:prefix` declaration carried by a start element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    /// `None` for the default namespace
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: QualifiedName,
    pub attributes: Vec<XmlAttribute>,
    pub namespaces: Vec<NamespaceBinding>,
}

impl StartElement {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, local_name: &str, value: &str) -> Self {
        self.attributes.push(XmlAttribute::new(local_name, value));
        self
    }

    /// Value of the unqualified attribute `local_name`
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.namespace.is_none() && attr.name.local_name == local_name)
            .map(|attr| attr.value.as_str())
    }

    /// Replace the value of an existing unqualified attribute in place.
    ///
    /// Returns false, leaving the element untouched, when the attribute is absent.
    pub fn set_attribute(&mut self, local_name: &str, value: &str) -> bool {
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.namespace.is_none() && attr.name.local_name == local_name)
        {
            Some(attr) => {
                attr.value = value.to_string();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: QualifiedName,
}

/// A single parse event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    DocType {
        root: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Start(StartElement),
    End(EndElement),
    Text(String),
    CData(String),
}

/// A stage of the event pipeline
pub trait EventSource {
    /// Pull the next event, or `None` at end of document.
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        (**self).next_event(ctx)
    }
}

/// Collect every remaining event of a source
pub fn drain<S: EventSource>(source: &mut S, ctx: &mut ParseContext) -> Result<Vec<XmlEvent>> {
    let mut events = Vec::new();
    while let Some(event) = source.next_event(ctx)? {
        events.push(event);
    }
    Ok(events)
}

pub(crate) fn xml_error(err: impl Display) -> DescriptorError {
    DescriptorError::Xml {
        details: err.to_string(),
    }
}

/// Decode raw bytes in the document's declared encoding
fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(xml_error)
}

fn resolved_namespace(resolved: ResolveResult<'_>, qname: &[u8], decoder: Decoder) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(decode(decoder, ns.as_ref())?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(DescriptorError::Xml {
            details: format!(
                "unbound namespace prefix '{}' on '{}'",
                String::from_utf8_lossy(&prefix),
                String::from_utf8_lossy(qname)
            ),
        }),
    }
}

/// Split DOCTYPE contents into root name, public id and system id
pub fn parse_doctype(contents: &str) -> Option<(String, Option<String>, Option<String>)> {
    let caps = get_doctype_regex().captures(contents)?;
    let root = caps.get(1)?.as_str().to_string();
    let pick = |a: usize, b: usize| {
        caps.get(a)
            .or_else(|| caps.get(b))
            .map(|m| m.as_str().trim().to_string())
    };
    let public_id = pick(2, 3);
    let system_id = pick(4, 5).or_else(|| pick(6, 7));
    Some((root, public_id, system_id))
}

/// First pipeline stage: namespace-aware reader over a byte stream.
///
/// DTDs are never loaded. A DOCTYPE declaration only contributes its public id
/// to the context's registry, which is all later stages need from it.
///
/// Names, attribute values and character data are decoded in the encoding the
/// XML declaration names. Whitespace-only text between elements is dropped;
/// any other text is kept exactly as written.
pub struct XmlEventReader<R: BufRead> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> XmlEventReader<R> {
    pub fn new(input: R) -> Self {
        let mut reader = NsReader::from_reader(input);
        reader.config_mut().expand_empty_elements = true;

        Self {
            reader,
            buf: Vec::new(),
            finished: false,
        }
    }

    fn start_element(&self, e: &quick_xml::events::BytesStart<'_>, namespace: Option<String>) -> Result<StartElement> {
        let decoder = self.reader.decoder();
        let name = e.name();
        let mut start = StartElement::new(QualifiedName {
            namespace,
            prefix: name.prefix().map(|p| decode(decoder, p.as_ref())).transpose()?,
            local_name: decode(decoder, e.local_name().as_ref())?,
        });

        for attr in e.attributes() {
            let attr = attr.map_err(xml_error)?;
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(xml_error)?
                .into_owned();

            if let Some(binding) = attr.key.as_namespace_binding() {
                let prefix = match binding {
                    PrefixDeclaration::Default => None,
                    PrefixDeclaration::Named(prefix) => Some(decode(decoder, prefix)?),
                };
                start.namespaces.push(NamespaceBinding { prefix, uri: value });
                continue;
            }

            let (resolved, local) = self.reader.resolve_attribute(attr.key);
            let namespace = resolved_namespace(resolved, attr.key.as_ref(), decoder)?;
            start.attributes.push(XmlAttribute {
                name: QualifiedName {
                    namespace,
                    prefix: attr.key.prefix().map(|p| decode(decoder, p.as_ref())).transpose()?,
                    local_name: decode(decoder, local.as_ref())?,
                },
                value,
            });
        }

        Ok(start)
    }
}

impl<'a> XmlEventReader<&'a [u8]> {
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> EventSource for XmlEventReader<R> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            // fixed once the XML declaration has been read
            let decoder = self.reader.decoder();
            let (resolved, event) = self
                .reader
                .read_resolved_event_into(&mut self.buf)
                .map_err(xml_error)?;

            match event {
                Event::Start(e) => {
                    let namespace = resolved_namespace(resolved, e.name().as_ref(), decoder)?;
                    let e = e.into_owned();
                    return Ok(Some(XmlEvent::Start(self.start_element(&e, namespace)?)));
                }
                Event::End(e) => {
                    let namespace = resolved_namespace(resolved, e.name().as_ref(), decoder)?;
                    let name = QualifiedName {
                        namespace,
                        prefix: e.name().prefix().map(|p| decode(decoder, p.as_ref())).transpose()?,
                        local_name: decode(decoder, e.local_name().as_ref())?,
                    };
                    return Ok(Some(XmlEvent::End(EndElement { name })));
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(xml_error)?.into_owned();
                    if !text.trim().is_empty() {
                        return Ok(Some(XmlEvent::Text(text)));
                    }
                }
                Event::CData(e) => {
                    return Ok(Some(XmlEvent::CData(decode(decoder, &e)?)));
                }
                Event::DocType(e) => {
                    let contents = decode(decoder, &e)?;
                    let Some((root, public_id, system_id)) = parse_doctype(&contents) else {
                        tracing::debug!(doctype = %contents, "unparseable DOCTYPE ignored");
                        continue;
                    };
                    // Resolution is suppressed: the DTD itself is never fetched.
                    if let Some(public_id) = &public_id {
                        ctx.record_public_id(public_id.clone());
                    }
                    return Ok(Some(XmlEvent::DocType {
                        root,
                        public_id,
                        system_id,
                    }));
                }
                Event::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                // declaration, comments and processing instructions
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::EJB_2_0_PUBLIC_ID;

    fn read_all(xml: &str) -> (Vec<XmlEvent>, ParseContext) {
        let mut ctx = ParseContext::new();
        let mut reader = XmlEventReader::from_str(xml);
        let events = drain(&mut reader, &mut ctx).unwrap();
        (events, ctx)
    }

    #[test]
    fn test_parse_doctype_public() {
        let (root, public_id, system_id) = parse_doctype(
            r#" ejb-jar PUBLIC "-//Sun Microsystems, Inc.//DTD Enterprise JavaBeans 2.0//EN" "http://java.sun.com/dtd/ejb-jar_2_0.dtd""#,
        )
        .unwrap();
        assert_eq!(root, "ejb-jar");
        assert_eq!(public_id.as_deref(), Some(EJB_2_0_PUBLIC_ID));
        assert_eq!(
            system_id.as_deref(),
            Some("http://java.sun.com/dtd/ejb-jar_2_0.dtd")
        );
    }

    #[test]
    fn test_parse_doctype_system_and_bare() {
        let (root, public_id, system_id) =
            parse_doctype(" taglib SYSTEM 'web-jsptaglibrary_1_1.dtd'").unwrap();
        assert_eq!(root, "taglib");
        assert_eq!(public_id, None);
        assert_eq!(system_id.as_deref(), Some("web-jsptaglibrary_1_1.dtd"));

        let (root, public_id, system_id) = parse_doctype(" web-app").unwrap();
        assert_eq!(root, "web-app");
        assert!(public_id.is_none() && system_id.is_none());
    }

    #[test]
    fn test_reader_resolves_namespaces() {
        let (events, _) = read_all(
            r#"<?xml version="1.0"?>
<ejb-jar xmlns="http://java.sun.com/xml/ns/j2ee"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="a b" version="2.1">
  <!-- comment -->
  <display-name>Shop</display-name>
  <enterprise-beans/>
</ejb-jar>"#,
        );

        assert_eq!(events.len(), 7);
        let XmlEvent::Start(root) = &events[0] else {
            panic!("expected start element, got {:?}", events[0]);
        };
        assert_eq!(root.name.local_name, "ejb-jar");
        assert_eq!(root.name.namespace(), Some("http://java.sun.com/xml/ns/j2ee"));
        assert_eq!(root.namespaces.len(), 2);
        assert_eq!(root.attribute("version"), Some("2.1"));

        let schema_location = root
            .attributes
            .iter()
            .find(|a| a.name.local_name == "schemaLocation")
            .unwrap();
        assert_eq!(
            schema_location.name.namespace(),
            Some("http://www.w3.org/2001/XMLSchema-instance")
        );
        assert_eq!(schema_location.name.qname(), "xsi:schemaLocation");

        assert_eq!(events[2], XmlEvent::Text("Shop".to_string()));
        // empty element expanded into start + end
        assert!(matches!(&events[4], XmlEvent::Start(s) if s.name.local_name == "enterprise-beans"));
        assert!(matches!(&events[5], XmlEvent::End(e) if e.name.local_name == "enterprise-beans"));
    }

    #[test]
    fn test_reader_records_public_id() {
        let (events, ctx) = read_all(
            r#"<?xml version="1.0"?>
<!DOCTYPE ejb-jar PUBLIC "-//Sun Microsystems, Inc.//DTD Enterprise JavaBeans 2.0//EN" "http://java.sun.com/dtd/ejb-jar_2_0.dtd">
<ejb-jar><display-name>Old</display-name></ejb-jar>"#,
        );

        assert!(matches!(&events[0], XmlEvent::DocType { root, .. } if root == "ejb-jar"));
        assert!(ctx.public_ids().contains(EJB_2_0_PUBLIC_ID));
        assert_eq!(ctx.public_ids().len(), 1);
    }

    #[test]
    fn test_reader_rejects_unbound_prefix() {
        let mut ctx = ParseContext::new();
        let mut reader = XmlEventReader::from_str("<foo:root/>");
        let err = drain(&mut reader, &mut ctx).unwrap_err();
        assert!(matches!(err, DescriptorError::Xml { .. }));
    }

    #[test]
    fn test_reader_rejects_mismatched_end() {
        let mut ctx = ParseContext::new();
        let mut reader = XmlEventReader::from_str("<a><b></a>");
        assert!(drain(&mut reader, &mut ctx).is_err());
    }

    #[test]
    fn test_reader_keeps_significant_whitespace() {
        let (events, _) = read_all("<env-entry>\n  <env-entry-value>  padded  </env-entry-value>\n</env-entry>");
        assert_eq!(events.len(), 5);
        assert_eq!(events[2], XmlEvent::Text("  padded  ".to_string()));
    }

    #[test]
    fn test_reader_decodes_declared_encoding() {
        let latin1: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><web-app id=\"caf\xE9\"><display-name>Caf\xE9</display-name><description><![CDATA[na\xEFve]]></description></web-app>";
        let mut ctx = ParseContext::new();
        let events = drain(&mut XmlEventReader::new(latin1), &mut ctx).unwrap();

        let XmlEvent::Start(root) = &events[0] else {
            panic!("expected root start, got {:?}", events[0]);
        };
        assert_eq!(root.attribute("id"), Some("caf\u{e9}"));
        assert_eq!(events[2], XmlEvent::Text("Caf\u{e9}".to_string()));
        assert_eq!(events[5], XmlEvent::CData("na\u{ef}ve".to_string()));
    }

    #[test]
    fn test_reader_rejects_malformed_cdata_bytes() {
        let broken: &[u8] = b"<description><![CDATA[bad \xFF byte]]></description>";
        let mut ctx = ParseContext::new();
        let err = drain(&mut XmlEventReader::new(broken), &mut ctx).unwrap_err();
        assert!(matches!(err, DescriptorError::Xml { .. }));
    }

    #[test]
    fn test_set_attribute_only_touches_existing() {
        let mut start = StartElement::new(QualifiedName::new(None, "web-app"))
            .with_attribute("version", "2.4")
            .with_attribute("id", "w1");

        assert!(start.set_attribute("version", "3.0"));
        assert!(!start.set_attribute("metadata-complete", "true"));
        assert_eq!(start.attribute("version"), Some("3.0"));
        assert_eq!(start.attribute("id"), Some("w1"));
        assert_eq!(start.attributes.len(), 2);
    }
}
