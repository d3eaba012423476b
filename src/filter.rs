//! Reconciliation stages stacked on top of an [`XmlEventReader`](crate::event::XmlEventReader).
//!
//! Every stage rewrites an event completely before handing it on, so a
//! downstream consumer never observes a half-normalized element.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::{ParseContext, ValidationEvent};
use crate::dialect::{JAVAEE_ALTERNATES, JAVAEE_NS, PERSISTENCE_ALTERNATES, PERSISTENCE_NS};
use crate::error::{DescriptorError, Result};
use crate::event::{EventSource, NamespaceBinding, QualifiedName, XmlEvent};
use crate::schema::SchemaKind;

/// Element namespace rewriting shared by every namespace-normalizing stage
#[derive(Debug, Clone)]
struct NamespaceRewriter {
    target: String,
    alternates: &'static [&'static str],
    warned: BTreeSet<String>,
}

impl NamespaceRewriter {
    fn new(target: &str, alternates: &'static [&'static str]) -> Self {
        Self {
            target: target.to_string(),
            alternates,
            warned: BTreeSet::new(),
        }
    }

    fn for_namespace(target: &str) -> Self {
        let alternates = match target {
            JAVAEE_NS => JAVAEE_ALTERNATES,
            PERSISTENCE_NS => PERSISTENCE_ALTERNATES,
            _ => &[],
        };
        Self::new(target, alternates)
    }

    fn rewrite(&mut self, name: &mut QualifiedName, ctx: &mut ParseContext) {
        match name.namespace.as_deref() {
            Some(ns) if ns == self.target => return,
            // DTD-era documents carry no namespace at all
            None => {}
            Some(ns) if self.alternates.contains(&ns) => {}
            Some(ns) => {
                if self.warned.insert(ns.to_string()) {
                    ctx.emit(ValidationEvent::warning(format!(
                        "unexpected namespace '{}' on <{}>, treating it as '{}'",
                        ns, name.local_name, self.target
                    )));
                }
            }
        }
        name.namespace = Some(self.target.clone());
    }

    fn apply(&mut self, event: &mut XmlEvent, ctx: &mut ParseContext) {
        match event {
            XmlEvent::Start(start) => self.rewrite(&mut start.name, ctx),
            XmlEvent::End(end) => self.rewrite(&mut end.name, ctx),
            _ => {}
        }
    }
}

/// Rewrites every element to a single canonical namespace.
pub struct NamespaceFilter<S> {
    source: S,
    rewriter: NamespaceRewriter,
}

impl<S: EventSource> NamespaceFilter<S> {
    /// Normalize to `target`, accepting its known historical variants silently.
    pub fn new(source: S, target: &str) -> Self {
        Self {
            source,
            rewriter: NamespaceRewriter::for_namespace(target),
        }
    }

    pub fn javaee(source: S) -> Self {
        Self::new(source, JAVAEE_NS)
    }

    pub fn persistence(source: S) -> Self {
        Self::new(source, PERSISTENCE_NS)
    }

    pub fn target(&self) -> &str {
        &self.rewriter.target
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: EventSource> EventSource for NamespaceFilter<S> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        let Some(mut event) = self.source.next_event(ctx)? else {
            return Ok(None);
        };
        self.rewriter.apply(&mut event, ctx);
        Ok(Some(event))
    }
}

/// Root element name to canonical `version` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPatchTable {
    entries: BTreeMap<String, String>,
}

impl Default for VersionPatchTable {
    fn default() -> Self {
        let entries = SchemaKind::ALL
            .iter()
            .map(|kind| {
                (
                    kind.root_element().to_string(),
                    kind.canonical_version().to_string(),
                )
            })
            .collect();
        Self { entries }
    }
}

impl VersionPatchTable {
    /// Default table with `overrides` applied.
    ///
    /// Every key must be the root element of a supported schema kind.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self> {
        let mut table = Self::default();
        for (root, version) in overrides {
            if SchemaKind::from_root_element(root).is_none() {
                return Err(DescriptorError::Config(format!(
                    "version override for <{}> does not name a supported schema kind",
                    root
                )));
            }
            if version.trim().is_empty() {
                return Err(DescriptorError::Config(format!(
                    "version override for <{}> is empty",
                    root
                )));
            }
            table.entries.insert(root.clone(), version.trim().to_string());
        }
        Ok(table)
    }

    pub fn version_for(&self, root: &str) -> Option<&str> {
        self.entries.get(root).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Forces the root element's `version` attribute to its canonical value.
///
/// Only the first start element of the document is considered, and only an
/// existing unqualified `version` attribute is replaced. A missing attribute
/// is not added.
pub struct VersionPatchFilter<S> {
    source: S,
    table: VersionPatchTable,
    seen_root: bool,
}

impl<S: EventSource> VersionPatchFilter<S> {
    pub fn new(source: S) -> Self {
        Self::with_table(source, VersionPatchTable::default())
    }

    pub fn with_table(source: S, table: VersionPatchTable) -> Self {
        Self {
            source,
            table,
            seen_root: false,
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: EventSource> EventSource for VersionPatchFilter<S> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        let Some(mut event) = self.source.next_event(ctx)? else {
            return Ok(None);
        };

        if let XmlEvent::Start(start) = &mut event {
            if !self.seen_root {
                self.seen_root = true;
                if let Some(canonical) = self.table.version_for(&start.name.local_name) {
                    let current = start.attribute("version").map(str::to_string);
                    if let Some(current) = current.filter(|v| v != canonical) {
                        tracing::debug!(
                            root = %start.name.local_name,
                            from = %current,
                            to = %canonical,
                            "patched descriptor version"
                        );
                        start.set_attribute("version", canonical);
                    }
                }
            }
        }

        Ok(Some(event))
    }
}

/// Legacy TLD 1.1 element names and their current spelling
const TAGLIB_RENAMES: &[(&str, &str)] = &[
    ("tlibversion", "tlib-version"),
    ("jspversion", "jsp-version"),
    ("shortname", "short-name"),
    ("tagclass", "tag-class"),
    ("teiclass", "tei-class"),
    ("bodycontent", "body-content"),
    ("info", "description"),
];

fn taglib_rename(local_name: &str) -> Option<&'static str> {
    TAGLIB_RENAMES
        .iter()
        .find(|(old, _)| *old == local_name)
        .map(|(_, new)| *new)
}

/// Java EE namespace normalization plus the TLD 1.1 element renames.
pub struct TaglibFilter<S> {
    source: S,
    rewriter: NamespaceRewriter,
}

impl<S: EventSource> TaglibFilter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            rewriter: NamespaceRewriter::for_namespace(JAVAEE_NS),
        }
    }
}

impl<S: EventSource> EventSource for TaglibFilter<S> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        let Some(mut event) = self.source.next_event(ctx)? else {
            return Ok(None);
        };

        let name = match &mut event {
            XmlEvent::Start(start) => Some(&mut start.name),
            XmlEvent::End(end) => Some(&mut end.name),
            _ => None,
        };
        if let Some(name) = name {
            if let Some(renamed) = taglib_rename(&name.local_name) {
                name.local_name = renamed.to_string();
            }
        }

        self.rewriter.apply(&mut event, ctx);
        Ok(Some(event))
    }
}

/// Elements whose text is a (possibly wildcarded) QName
const QNAME_PATTERN_ELEMENTS: &[&str] = &["service-name-pattern", "port-name-pattern"];

/// Java EE namespace normalization for `handler-chains` documents.
///
/// Keeps the prefix bindings in scope so QName-valued patterns such as
/// `ns1:EchoService*` can be expanded to `{http://example.com}EchoService*`.
pub struct HandlerChainsFilter<S> {
    source: S,
    rewriter: NamespaceRewriter,
    bindings: Vec<Vec<NamespaceBinding>>,
    elements: Vec<String>,
}

impl<S: EventSource> HandlerChainsFilter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            rewriter: NamespaceRewriter::for_namespace(JAVAEE_NS),
            bindings: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Namespace URI currently bound to `prefix` (`None` for the default namespace)
    pub fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|binding| binding.prefix.as_deref() == prefix)
            .map(|binding| binding.uri.as_str())
    }

    fn expand_pattern(&self, text: &str, ctx: &mut ParseContext) -> String {
        let text = text.trim();
        if text.starts_with('{') {
            return text.to_string();
        }
        let Some((prefix, local)) = text.split_once(':') else {
            return text.to_string();
        };
        match self.lookup_namespace_uri(Some(prefix)) {
            Some(uri) => format!("{{{}}}{}", uri, local),
            None => {
                ctx.emit(ValidationEvent::warning(format!(
                    "undeclared prefix '{}' in name pattern '{}'",
                    prefix, text
                )));
                text.to_string()
            }
        }
    }
}

impl<S: EventSource> EventSource for HandlerChainsFilter<S> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        let Some(mut event) = self.source.next_event(ctx)? else {
            return Ok(None);
        };

        match &mut event {
            XmlEvent::Start(start) => {
                self.bindings.push(start.namespaces.clone());
                self.elements.push(start.name.local_name.clone());
            }
            XmlEvent::End(_) => {
                self.bindings.pop();
                self.elements.pop();
            }
            XmlEvent::Text(text) => {
                let in_pattern = self
                    .elements
                    .last()
                    .is_some_and(|name| QNAME_PATTERN_ELEMENTS.contains(&name.as_str()));
                if in_pattern {
                    *text = self.expand_pattern(text, ctx);
                }
            }
            _ => {}
        }

        self.rewriter.apply(&mut event, ctx);
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{J2EE_NS, JCP_JAVAEE_NS, JCP_PERSISTENCE_NS};
    use crate::event::{StartElement, XmlEventReader, drain};

    fn starts(events: &[XmlEvent]) -> Vec<&StartElement> {
        events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::Start(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_namespace_filter_rewrites_alternates_silently() {
        let xml = format!(
            r#"<web-app xmlns="{}" version="4.0"><servlet><servlet-name>s</servlet-name></servlet></web-app>"#,
            JCP_JAVAEE_NS
        );
        let mut ctx = ParseContext::new();
        let mut filter = NamespaceFilter::javaee(XmlEventReader::from_str(&xml));
        let events = drain(&mut filter, &mut ctx).unwrap();

        for event in &events {
            match event {
                XmlEvent::Start(s) => assert_eq!(s.name.namespace(), Some(JAVAEE_NS)),
                XmlEvent::End(e) => assert_eq!(e.name.namespace(), Some(JAVAEE_NS)),
                _ => {}
            }
        }
        assert!(!ctx.has_events());
    }

    #[test]
    fn test_namespace_filter_warns_once_per_unknown_namespace() {
        let xml = r#"<ejb-jar xmlns="urn:acme"><display-name>x</display-name><description>y</description></ejb-jar>"#;
        let mut ctx = ParseContext::new();
        let mut filter = NamespaceFilter::javaee(XmlEventReader::from_str(xml));
        let events = drain(&mut filter, &mut ctx).unwrap();

        assert!(starts(&events).iter().all(|s| s.name.namespace() == Some(JAVAEE_NS)));
        assert_eq!(ctx.events().len(), 1);
        assert!(ctx.events()[0].message.contains("urn:acme"));
    }

    #[test]
    fn test_namespace_filter_persistence_family() {
        let xml = format!(
            r#"<persistence xmlns="{}" version="2.1"><persistence-unit name="pu"/></persistence>"#,
            JCP_PERSISTENCE_NS
        );
        let mut ctx = ParseContext::new();
        let mut filter = NamespaceFilter::persistence(XmlEventReader::from_str(&xml));
        let events = drain(&mut filter, &mut ctx).unwrap();

        assert!(starts(&events).iter().all(|s| s.name.namespace() == Some(PERSISTENCE_NS)));
        assert!(!ctx.has_events());
    }

    #[test]
    fn test_version_patch_root_only() {
        let xml = format!(
            r#"<ejb-jar xmlns="{}" id="jar" version="2.1"><enterprise-beans><session><ejb-name>A</ejb-name></session></enterprise-beans><ejb-jar version="2.1"/></ejb-jar>"#,
            J2EE_NS
        );
        let mut ctx = ParseContext::new();
        let mut filter = VersionPatchFilter::new(NamespaceFilter::javaee(XmlEventReader::from_str(&xml)));
        let events = drain(&mut filter, &mut ctx).unwrap();
        let starts = starts(&events);

        assert_eq!(starts[0].attribute("version"), Some("3.1"));
        assert_eq!(starts[0].attribute("id"), Some("jar"));
        assert_eq!(starts[0].attributes.len(), 2);
        // nested element with the same name is left alone
        let nested = starts.iter().skip(1).find(|s| s.name.local_name == "ejb-jar").unwrap();
        assert_eq!(nested.attribute("version"), Some("2.1"));
    }

    #[test]
    fn test_version_patch_does_not_add_missing_attribute() {
        let mut ctx = ParseContext::new();
        let mut filter = VersionPatchFilter::new(XmlEventReader::from_str("<connector><display-name/></connector>"));
        let events = drain(&mut filter, &mut ctx).unwrap();
        assert_eq!(starts(&events)[0].attribute("version"), None);
    }

    #[test]
    fn test_version_patch_ignores_other_roots() {
        let mut ctx = ParseContext::new();
        let mut filter = VersionPatchFilter::new(XmlEventReader::from_str(r#"<persistence version="1.0"/>"#));
        let events = drain(&mut filter, &mut ctx).unwrap();
        assert_eq!(starts(&events)[0].attribute("version"), Some("1.0"));
    }

    #[test]
    fn test_default_table_covers_every_schema_kind() {
        let table = VersionPatchTable::default();
        assert_eq!(table.len(), SchemaKind::ALL.len());
        assert_eq!(table.version_for("web-app"), Some("3.0"));
        assert_eq!(table.version_for("ejb-jar"), Some("3.1"));
        assert_eq!(table.version_for("application"), Some("6"));
        assert_eq!(table.version_for("application-client"), Some("6"));
        assert_eq!(table.version_for("connector"), Some("1.6"));
    }

    #[test]
    fn test_table_overrides_validated() {
        let mut overrides = BTreeMap::new();
        overrides.insert("web-app".to_string(), "3.1".to_string());
        let table = VersionPatchTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.version_for("web-app"), Some("3.1"));
        assert_eq!(table.version_for("ejb-jar"), Some("3.1"));

        overrides.insert("faces-config".to_string(), "2.0".to_string());
        assert!(matches!(
            VersionPatchTable::with_overrides(&overrides),
            Err(DescriptorError::Config(_))
        ));
    }

    #[test]
    fn test_taglib_filter_renames_legacy_elements() {
        let xml = "<taglib><tlibversion>1.0</tlibversion><shortname>t</shortname><info>about</info>\
                   <tag><name>x</name><tagclass>a.B</tagclass><bodycontent>empty</bodycontent></tag></taglib>";
        let mut ctx = ParseContext::new();
        let mut filter = TaglibFilter::new(XmlEventReader::from_str(xml));
        let events = drain(&mut filter, &mut ctx).unwrap();

        let names: Vec<_> = starts(&events).iter().map(|s| s.name.local_name.clone()).collect();
        assert_eq!(
            names,
            vec!["taglib", "tlib-version", "short-name", "description", "tag", "name", "tag-class", "body-content"]
        );
        let ends: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::End(end) => Some(end.name.local_name.as_str()),
                _ => None,
            })
            .collect();
        assert!(ends.contains(&"tlib-version"));
        assert!(!ends.contains(&"info"));
        assert!(starts(&events).iter().all(|s| s.name.namespace() == Some(JAVAEE_NS)));
    }

    #[test]
    fn test_handler_chains_expands_patterns() {
        let xml = r#"<handler-chains xmlns="http://java.sun.com/xml/ns/javaee">
  <handler-chain xmlns:ns1="http://example.com/echo">
    <service-name-pattern>ns1:EchoService*</service-name-pattern>
    <port-name-pattern>*</port-name-pattern>
  </handler-chain>
  <handler-chain>
    <service-name-pattern>ns1:Other</service-name-pattern>
  </handler-chain>
</handler-chains>"#;
        let mut ctx = ParseContext::new();
        let mut filter = HandlerChainsFilter::new(XmlEventReader::from_str(xml));
        let events = drain(&mut filter, &mut ctx).unwrap();

        let texts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["{http://example.com/echo}EchoService*", "*", "ns1:Other"]);
        // ns1 went out of scope with the first chain
        assert_eq!(ctx.events().len(), 1);
        assert_eq!(filter.lookup_namespace_uri(Some("ns1")), None);
    }
}
