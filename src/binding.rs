//! Reading and writing descriptor records
//!
//! Unmarshalling runs the source document through the reconciliation stage
//! for its family ([`NamespaceFilter`], [`TaglibFilter`] or
//! [`HandlerChainsFilter`]), renders the result in binding form and hands it
//! to the serde record model. Every call gets its own [`ParseContext`], so the
//! DOCTYPE public ids it records never outlive the call.
//!
//! Marshalling goes the other way: records are serialized, re-read as events,
//! placed in the descriptor's namespace and written as a complete document.

use std::io::{Read, Write};

use crate::config::Config;
use crate::context::{ParseContext, ValidationEvent};
use crate::dialect::XML_NS;
use crate::error::{DescriptorError, Result};
use crate::event::{EventSource, XmlEvent, XmlEventReader, xml_error};
use crate::filter::{HandlerChainsFilter, NamespaceFilter, TaglibFilter};
use crate::model::{Descriptor, HandlerChains, Persistence, TldTaglib};
use crate::report::EventReporter;
use crate::writer::{DocumentOptions, EventWriter};

const DEFAULT_INDENT: usize = 4;

/// Which reconciliation stage a document passes through before binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reconciliation {
    /// DOCTYPE handling only
    None,
    /// Rewrite element namespaces to the descriptor's namespace
    Namespace,
    Taglib,
    HandlerChains,
}

/// Qualifies the `lang` attribute written by the record model as `xml:lang`
struct XmlLangQualifier<S> {
    source: S,
}

impl<S: EventSource> EventSource for XmlLangQualifier<S> {
    fn next_event(&mut self, ctx: &mut ParseContext) -> Result<Option<XmlEvent>> {
        let mut event = self.source.next_event(ctx)?;
        if let Some(XmlEvent::Start(start)) = &mut event {
            for attr in &mut start.attributes {
                if attr.name.namespace.is_none() && attr.name.local_name == "lang" {
                    attr.name.namespace = Some(XML_NS.to_string());
                    attr.name.prefix = Some("xml".to_string());
                }
            }
        }
        Ok(event)
    }
}

/// Entry point for binding descriptors to records and back
#[derive(Debug, Clone)]
pub struct DescriptorBinding {
    reporter: EventReporter,
    strict: bool,
    indent: Option<usize>,
}

impl Default for DescriptorBinding {
    fn default() -> Self {
        Self {
            reporter: EventReporter::default(),
            strict: false,
            indent: Some(DEFAULT_INDENT),
        }
    }
}

impl DescriptorBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            reporter: EventReporter::new(config.validation.output_level),
            strict: config.validation.strict,
            indent: config.output.effective_indent(),
        }
    }

    pub fn with_reporter(mut self, reporter: EventReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Fail an unmarshal call on any validation event, warnings included
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Indentation of marshalled documents; `None` writes everything on one line
    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    /// Serialize `value` as a complete document in its descriptor namespace
    pub fn marshal<T: Descriptor>(&self, value: &T) -> Result<String> {
        let mut out = Vec::new();
        self.marshal_to(value, &mut out)?;
        String::from_utf8(out).map_err(xml_error)
    }

    pub fn marshal_to<T: Descriptor, W: Write>(&self, value: &T, out: W) -> Result<()> {
        self.write_document(value, out)
            .inspect_err(|err| self.reporter.report_error(err))
    }

    fn write_document<T: Descriptor, W: Write>(&self, value: &T, out: W) -> Result<()> {
        let bound = quick_xml::se::to_string_with_root(T::ROOT_ELEMENT, value).map_err(|e| {
            DescriptorError::Marshal {
                root: T::ROOT_ELEMENT.to_string(),
                details: e.to_string(),
            }
        })?;

        let mut ctx = ParseContext::new();
        let mut source = XmlLangQualifier {
            source: NamespaceFilter::new(XmlEventReader::from_str(&bound), T::NAMESPACE),
        };
        let mut writer = EventWriter::document(
            out,
            DocumentOptions {
                indent: self.indent,
                strip_schema_location: false,
            },
        );
        writer.write_all(&mut source, &mut ctx)?;
        writer.into_inner().flush()?;

        tracing::debug!(root = T::ROOT_ELEMENT, "marshalled descriptor");
        Ok(())
    }

    /// Read a Java EE descriptor written against any of the namespaces of its
    /// family, normalizing element namespaces to `T::NAMESPACE`.
    pub fn unmarshal_javaee<T: Descriptor, R: Read>(&self, input: R) -> Result<T> {
        self.read_javaee(input).map(|(value, _)| value)
    }

    /// Like [`unmarshal_javaee`](Self::unmarshal_javaee), also returning the
    /// events observed during the call.
    pub fn read_javaee<T: Descriptor, R: Read>(&self, input: R) -> Result<(T, Vec<ValidationEvent>)> {
        self.read(input, Reconciliation::Namespace)
    }

    /// Read a descriptor without namespace normalization. DOCTYPE public ids
    /// are still recorded and no DTD is fetched.
    pub fn unmarshal<T: Descriptor, R: Read>(&self, input: R) -> Result<T> {
        self.read(input, Reconciliation::None).map(|(value, _)| value)
    }

    pub fn unmarshal_persistence<R: Read>(&self, input: R) -> Result<Persistence> {
        self.unmarshal_javaee(input)
    }

    /// Read a tag library descriptor, including JSP 1.1 element names
    pub fn unmarshal_taglib<R: Read>(&self, input: R) -> Result<TldTaglib> {
        self.read(input, Reconciliation::Taglib).map(|(value, _)| value)
    }

    /// Read a `handler-chains` document, expanding prefixed name patterns to
    /// `{namespace}local` form.
    pub fn unmarshal_handler_chains<R: Read>(&self, input: R) -> Result<HandlerChains> {
        self.read(input, Reconciliation::HandlerChains)
            .map(|(value, _)| value)
    }

    fn read<T: Descriptor, R: Read>(
        &self,
        input: R,
        reconciliation: Reconciliation,
    ) -> Result<(T, Vec<ValidationEvent>)> {
        self.bind(input, reconciliation)
            .inspect_err(|err| self.reporter.report_error(err))
    }

    fn bind<T: Descriptor, R: Read>(
        &self,
        mut input: R,
        reconciliation: Reconciliation,
    ) -> Result<(T, Vec<ValidationEvent>)> {
        let mut document = Vec::new();
        input.read_to_end(&mut document)?;

        let mut ctx = ParseContext::new();
        let reader = XmlEventReader::new(document.as_slice());
        let (root, bound) = match reconciliation {
            Reconciliation::None => render_binding(reader, &mut ctx)?,
            Reconciliation::Namespace => {
                render_binding(NamespaceFilter::new(reader, T::NAMESPACE), &mut ctx)?
            }
            Reconciliation::Taglib => render_binding(TaglibFilter::new(reader), &mut ctx)?,
            Reconciliation::HandlerChains => {
                render_binding(HandlerChainsFilter::new(reader), &mut ctx)?
            }
        };

        let Some(root) = root else {
            return Err(DescriptorError::Xml {
                details: "document has no root element".to_string(),
            });
        };
        if root != T::ROOT_ELEMENT {
            ctx.emit(ValidationEvent::error(format!(
                "unexpected root element <{}>, expected <{}>",
                root,
                T::ROOT_ELEMENT
            )));
        }
        let dialects = ctx.public_ids().dialects();
        for dialect in dialects {
            if dialect.root_element() != T::ROOT_ELEMENT {
                ctx.emit(ValidationEvent::warning(format!(
                    "DOCTYPE declares a {:?} <{}> document, read as <{}>",
                    dialect,
                    dialect.root_element(),
                    T::ROOT_ELEMENT
                )));
            }
        }

        let mut value: T = quick_xml::de::from_str(&bound).map_err(|e| DescriptorError::Binding {
            root: T::ROOT_ELEMENT.to_string(),
            details: e.to_string(),
        })?;
        value.after_unmarshal(&mut ctx);

        tracing::debug!(
            root = T::ROOT_ELEMENT,
            public_ids = ctx.public_ids().len(),
            events = ctx.events().len(),
            "unmarshalled descriptor"
        );

        self.reporter.report(ctx.events().iter());
        if self.strict && ctx.has_events() {
            return Err(DescriptorError::StrictValidation {
                events: ctx.into_events(),
            });
        }
        Ok((value, ctx.into_events()))
    }
}

/// Render `source` in binding form, returning the local name of the root
/// element alongside the text.
fn render_binding<S: EventSource>(mut source: S, ctx: &mut ParseContext) -> Result<(Option<String>, String)> {
    let mut writer = EventWriter::binding(Vec::new());
    let mut root = None;
    while let Some(event) = source.next_event(ctx)? {
        if root.is_none() {
            if let XmlEvent::Start(start) = &event {
                root = Some(start.name.local_name.clone());
            }
        }
        writer.write(&event)?;
    }
    let bound = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    Ok((root, bound))
}

/// Serialize with the default binding
pub fn marshal<T: Descriptor>(value: &T) -> Result<String> {
    DescriptorBinding::default().marshal(value)
}

pub fn unmarshal_javaee<T: Descriptor, R: Read>(input: R) -> Result<T> {
    DescriptorBinding::default().unmarshal_javaee(input)
}

pub fn unmarshal<T: Descriptor, R: Read>(input: R) -> Result<T> {
    DescriptorBinding::default().unmarshal(input)
}

pub fn unmarshal_persistence<R: Read>(input: R) -> Result<Persistence> {
    DescriptorBinding::default().unmarshal_persistence(input)
}

pub fn unmarshal_taglib<R: Read>(input: R) -> Result<TldTaglib> {
    DescriptorBinding::default().unmarshal_taglib(input)
}

pub fn unmarshal_handler_chains<R: Read>(input: R) -> Result<HandlerChains> {
    DescriptorBinding::default().unmarshal_handler_chains(input)
}
