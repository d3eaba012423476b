//! Serialization of an event stream back into XML text.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::context::ParseContext;
use crate::dialect::{XML_NS, XSI_NS};
use crate::error::Result;
use crate::event::{EventSource, QualifiedName, StartElement, XmlEvent};

/// How element and attribute names are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    /// Local names only, no namespace declarations. This is the form the
    /// serde record binding reads.
    Binding,
    /// Complete namespace-qualified document with an XML declaration.
    Document,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Indent nested elements by this many spaces
    pub indent: Option<usize>,
    /// Drop `xsi:schemaLocation` and `xsi:noNamespaceSchemaLocation` hints
    pub strip_schema_location: bool,
}

type Scope = Vec<(Option<String>, String)>;

pub struct EventWriter<W: Write> {
    writer: Writer<W>,
    mode: WriterMode,
    options: DocumentOptions,
    scopes: Vec<Scope>,
    open: Vec<String>,
    started: bool,
}

impl<W: Write> EventWriter<W> {
    pub fn binding(inner: W) -> Self {
        Self::with_mode(Writer::new(inner), WriterMode::Binding, DocumentOptions::default())
    }

    pub fn document(inner: W, options: DocumentOptions) -> Self {
        let writer = match options.indent {
            Some(width) if width > 0 => Writer::new_with_indent(inner, b' ', width),
            _ => Writer::new(inner),
        };
        Self::with_mode(writer, WriterMode::Document, options)
    }

    fn with_mode(writer: Writer<W>, mode: WriterMode, options: DocumentOptions) -> Self {
        Self {
            writer,
            mode,
            options,
            scopes: Vec::new(),
            open: Vec::new(),
            started: false,
        }
    }

    pub fn mode(&self) -> WriterMode {
        self.mode
    }

    pub fn write(&mut self, event: &XmlEvent) -> Result<()> {
        if !self.started {
            self.started = true;
            if self.mode == WriterMode::Document {
                self.writer
                    .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            }
        }

        match event {
            // DTDs are never carried forward
            XmlEvent::DocType { .. } => {}
            XmlEvent::Start(start) => {
                let element = match self.mode {
                    WriterMode::Binding => binding_start(start),
                    WriterMode::Document => self.document_start(start),
                };
                self.open.push(String::from_utf8_lossy(element.name().as_ref()).into_owned());
                self.writer.write_event(Event::Start(element))?;
            }
            XmlEvent::End(_) => {
                // the scope stack pairs every end with the name actually written
                if let Some(name) = self.open.pop() {
                    self.scopes.pop();
                    self.writer.write_event(Event::End(BytesEnd::new(name)))?;
                }
            }
            // serde trims character data but never CDATA sections
            XmlEvent::Text(text) if self.mode == WriterMode::Binding && text.trim() != text.as_str() => {
                self.write_cdata(text)?;
            }
            XmlEvent::Text(text) => {
                self.writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            XmlEvent::CData(text) => self.write_cdata(text)?,
        }
        Ok(())
    }

    /// Write `text` as CDATA, splitting the section at every `]]>`
    fn write_cdata(&mut self, text: &str) -> Result<()> {
        let mut rest = text;
        while let Some(at) = rest.find("]]>") {
            self.writer
                .write_event(Event::CData(BytesCData::new(&rest[..at + 2])))?;
            rest = &rest[at + 2..];
        }
        self.writer.write_event(Event::CData(BytesCData::new(rest)))?;
        Ok(())
    }

    /// Pull every remaining event of `source` through this writer.
    pub fn write_all<S: EventSource>(&mut self, source: &mut S, ctx: &mut ParseContext) -> Result<()> {
        while let Some(event) = source.next_event(ctx)? {
            self.write(&event)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn resolve<'a>(&'a self, prefix: Option<&str>, declared: &'a Scope) -> Option<&'a str> {
        declared
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .or_else(|| self.lookup(prefix))
    }

    /// Nearest prefix bound to `uri` that is not shadowed by a closer declaration
    fn prefix_for(&self, uri: &str, declared: &Scope) -> Option<String> {
        declared
            .iter()
            .rev()
            .chain(self.scopes.iter().rev().flat_map(|scope| scope.iter().rev()))
            .filter(|(_, u)| u == uri)
            .filter_map(|(p, _)| p.as_deref())
            .find(|p| self.resolve(Some(*p), declared) == Some(uri))
            .map(str::to_string)
    }

    fn document_start(&mut self, start: &StartElement) -> BytesStart<'static> {
        let mut declared: Scope = Vec::new();

        let element_name = self.element_name(&start.name, &mut declared);

        let mut attributes = Vec::with_capacity(start.attributes.len());
        for attr in &start.attributes {
            let Some(namespace) = attr.name.namespace() else {
                attributes.push((attr.name.local_name.clone(), attr.value.clone()));
                continue;
            };
            if namespace == XML_NS {
                attributes.push((format!("xml:{}", attr.name.local_name), attr.value.clone()));
                continue;
            }
            if namespace == XSI_NS
                && self.options.strip_schema_location
                && matches!(
                    attr.name.local_name.as_str(),
                    "schemaLocation" | "noNamespaceSchemaLocation"
                )
            {
                continue;
            }

            let prefix = match self.prefix_for(namespace, &declared) {
                Some(prefix) => prefix,
                None => {
                    let prefix = attr
                        .name
                        .prefix
                        .clone()
                        .filter(|p| !declared.iter().any(|(q, _)| q.as_deref() == Some(p.as_str())))
                        .unwrap_or_else(|| format!("ns{}", declared.len() + 1));
                    declared.push((Some(prefix.clone()), namespace.to_string()));
                    prefix
                }
            };
            attributes.push((format!("{}:{}", prefix, attr.name.local_name), attr.value.clone()));
        }

        // keep source prefix declarations that nothing above has overridden
        for binding in &start.namespaces {
            let Some(prefix) = &binding.prefix else {
                continue;
            };
            if declared.iter().any(|(p, _)| p.as_deref() == Some(prefix.as_str())) {
                continue;
            }
            if self.lookup(Some(prefix)) == Some(binding.uri.as_str()) {
                continue;
            }
            declared.push((Some(prefix.clone()), binding.uri.clone()));
        }

        let mut element = BytesStart::new(element_name);
        for (prefix, uri) in &declared {
            match prefix {
                Some(prefix) => element.push_attribute((format!("xmlns:{}", prefix).as_str(), uri.as_str())),
                None => element.push_attribute(("xmlns", uri.as_str())),
            }
        }
        for (name, value) in &attributes {
            element.push_attribute((name.as_str(), value.as_str()));
        }

        self.scopes.push(declared);
        element
    }

    fn element_name(&self, name: &QualifiedName, declared: &mut Scope) -> String {
        match (name.namespace(), name.prefix.as_deref()) {
            (None, _) => {
                if self.lookup(None).is_some_and(|uri| !uri.is_empty()) {
                    declared.push((None, String::new()));
                }
                name.local_name.clone()
            }
            (Some(namespace), Some(prefix)) => {
                if self.lookup(Some(prefix)) != Some(namespace) {
                    declared.push((Some(prefix.to_string()), namespace.to_string()));
                }
                format!("{}:{}", prefix, name.local_name)
            }
            (Some(namespace), None) => {
                if self.lookup(None) != Some(namespace) {
                    declared.push((None, namespace.to_string()));
                }
                name.local_name.clone()
            }
        }
    }
}

fn binding_start(start: &StartElement) -> BytesStart<'static> {
    let mut element = BytesStart::new(start.name.local_name.clone());
    for attr in &start.attributes {
        match attr.name.namespace() {
            None => element.push_attribute((attr.name.local_name.as_str(), attr.value.as_str())),
            // xml:lang and friends bind by local name
            Some(XML_NS) => element.push_attribute((attr.name.local_name.as_str(), attr.value.as_str())),
            Some(_) => {}
        }
    }
    element
}

/// Render a complete event list as a string, mostly for diagnostics and tests.
pub fn events_to_string(events: &[XmlEvent], mode: WriterMode, options: DocumentOptions) -> Result<String> {
    let mut writer = match mode {
        WriterMode::Binding => EventWriter::binding(Vec::new()),
        WriterMode::Document => EventWriter::document(Vec::new(), options),
    };
    for event in events {
        writer.write(event)?;
    }
    String::from_utf8(writer.into_inner()).map_err(crate::event::xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{J2EE_NS, JAVAEE_NS};
    use crate::event::{XmlEventReader, drain};

    fn events(xml: &str) -> Vec<XmlEvent> {
        let mut ctx = ParseContext::new();
        drain(&mut XmlEventReader::from_str(xml), &mut ctx).unwrap()
    }

    const SOURCE: &str = r#"<ejb-jar xmlns="http://java.sun.com/xml/ns/j2ee" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://java.sun.com/xml/ns/j2ee ejb-jar_2_1.xsd" version="2.1"><display-name xml:lang="en">Shop &amp; Co</display-name></ejb-jar>"#;

    #[test]
    fn test_binding_mode_uses_local_names() {
        let xml = events_to_string(&events(SOURCE), WriterMode::Binding, DocumentOptions::default()).unwrap();
        assert_eq!(
            xml,
            r#"<ejb-jar version="2.1"><display-name lang="en">Shop &amp; Co</display-name></ejb-jar>"#
        );
    }

    #[test]
    fn test_document_mode_declares_namespaces() {
        let xml = events_to_string(&events(SOURCE), WriterMode::Document, DocumentOptions::default()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"xmlns="{}""#, J2EE_NS)));
        assert!(xml.contains(r#"xsi:schemaLocation="#));
        assert!(xml.contains(r#"xml:lang="en""#));

        // and it reads back to the same events
        let reparsed = events(&xml);
        assert_eq!(reparsed, events(SOURCE));
    }

    #[test]
    fn test_document_mode_strips_schema_location() {
        let options = DocumentOptions {
            indent: None,
            strip_schema_location: true,
        };
        let xml = events_to_string(&events(SOURCE), WriterMode::Document, options).unwrap();
        assert!(!xml.contains("schemaLocation"));
        assert!(xml.contains(r#"version="2.1""#));
    }

    #[test]
    fn test_document_mode_redeclares_rewritten_namespace() {
        let mut source = events(SOURCE);
        for event in &mut source {
            match event {
                XmlEvent::Start(start) => start.name.namespace = Some(JAVAEE_NS.to_string()),
                XmlEvent::End(end) => end.name.namespace = Some(JAVAEE_NS.to_string()),
                _ => {}
            }
        }
        let xml = events_to_string(&source, WriterMode::Document, DocumentOptions::default()).unwrap();
        assert!(xml.contains(&format!(r#"xmlns="{}""#, JAVAEE_NS)));

        let reparsed = events(&xml);
        let XmlEvent::Start(root) = &reparsed[0] else {
            panic!("expected root start");
        };
        assert_eq!(root.name.namespace(), Some(JAVAEE_NS));
        let XmlEvent::Start(child) = &reparsed[1] else {
            panic!("expected child start");
        };
        assert_eq!(child.name.namespace(), Some(JAVAEE_NS));
    }

    #[test]
    fn test_document_mode_indents() {
        let options = DocumentOptions {
            indent: Some(2),
            strip_schema_location: false,
        };
        let xml = events_to_string(
            &events("<web-app><servlet><servlet-name>a</servlet-name></servlet></web-app>"),
            WriterMode::Document,
            options,
        )
        .unwrap();
        assert!(xml.contains("\n  <servlet>"));
        assert!(xml.contains("\n    <servlet-name>a</servlet-name>"));
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let source = vec![
            XmlEvent::Start(StartElement::new(QualifiedName::new(None, "description"))),
            XmlEvent::CData("a]]>b".to_string()),
            XmlEvent::End(crate::event::EndElement {
                name: QualifiedName::new(None, "description"),
            }),
        ];
        let xml = events_to_string(&source, WriterMode::Document, DocumentOptions::default()).unwrap();
        assert!(xml.ends_with("<description><![CDATA[a]]]]><![CDATA[>b]]></description>"));

        let reparsed = events(&xml);
        let text: String = reparsed
            .iter()
            .filter_map(|event| match event {
                XmlEvent::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "a]]>b");
    }

    #[test]
    fn test_binding_mode_protects_padded_text() {
        let xml = events_to_string(
            &events("<env-entry-value>  padded  </env-entry-value>"),
            WriterMode::Binding,
            DocumentOptions::default(),
        )
        .unwrap();
        assert_eq!(xml, "<env-entry-value><![CDATA[  padded  ]]></env-entry-value>");

        let document = events_to_string(
            &events("<env-entry-value>  padded  </env-entry-value>"),
            WriterMode::Document,
            DocumentOptions::default(),
        )
        .unwrap();
        assert!(document.ends_with("<env-entry-value>  padded  </env-entry-value>"));
    }

    #[test]
    fn test_unqualified_child_resets_default_namespace() {
        let source = vec![
            XmlEvent::Start(StartElement::new(QualifiedName::new(Some(JAVAEE_NS), "root"))),
            XmlEvent::Start(StartElement::new(QualifiedName::new(None, "child"))),
            XmlEvent::End(crate::event::EndElement {
                name: QualifiedName::new(None, "child"),
            }),
            XmlEvent::End(crate::event::EndElement {
                name: QualifiedName::new(Some(JAVAEE_NS), "root"),
            }),
        ];
        let xml = events_to_string(&source, WriterMode::Document, DocumentOptions::default()).unwrap();
        assert!(xml.contains(r#"<child xmlns="">"#));
    }
}
