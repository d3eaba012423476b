//! JAX-WS `handler-chains` documents

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::JAVAEE_NS;
use crate::model::{Descriptor, ParamValue, Text};
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerChains {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "handler-chain", default, skip_serializing_if = "Vec::is_empty")]
    pub handler_chain: Vec<HandlerChain>,
}

impl HandlerChains {
    /// Chains that apply to the given service and port, in declaration order
    pub fn chains_for<'a>(
        &'a self,
        service: (Option<&'a str>, &'a str),
        port: (Option<&'a str>, &'a str),
    ) -> impl Iterator<Item = &'a HandlerChain> + 'a {
        self.handler_chain
            .iter()
            .filter(move |chain| chain.applies_to(service, port))
    }
}

impl Descriptor for HandlerChains {
    const ROOT_ELEMENT: &'static str = "handler-chains";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "1.3";
    const SCHEMA_KIND: Option<SchemaKind> = None;

    fn declared_version(&self) -> Option<&str> {
        None
    }
}

/// Name patterns are kept in the `{namespace}local` form produced while
/// reading; [`NamePattern`] interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerChain {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "service-name-pattern", default, skip_serializing_if = "Option::is_none")]
    pub service_name_pattern: Option<String>,
    #[serde(rename = "port-name-pattern", default, skip_serializing_if = "Option::is_none")]
    pub port_name_pattern: Option<String>,
    #[serde(rename = "protocol-bindings", default, skip_serializing_if = "Option::is_none")]
    pub protocol_bindings: Option<String>,
    #[serde(rename = "handler", default, skip_serializing_if = "Vec::is_empty")]
    pub handler: Vec<Handler>,
}

impl HandlerChain {
    pub fn service_name_pattern(&self) -> Option<NamePattern> {
        self.service_name_pattern.as_deref().map(NamePattern::parse)
    }

    pub fn port_name_pattern(&self) -> Option<NamePattern> {
        self.port_name_pattern.as_deref().map(NamePattern::parse)
    }

    /// Protocol binding ids or `##` tokens, whitespace separated
    pub fn protocol_bindings(&self) -> Vec<&str> {
        self.protocol_bindings
            .as_deref()
            .map(|b| b.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// A chain without a pattern applies to every name
    pub fn applies_to(&self, service: (Option<&str>, &str), port: (Option<&str>, &str)) -> bool {
        let service_ok = self
            .service_name_pattern()
            .is_none_or(|p| p.matches(service.0, service.1));
        let port_ok = self
            .port_name_pattern()
            .is_none_or(|p| p.matches(port.0, port.1));
        service_ok && port_ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "handler-name", default)]
    pub handler_name: String,
    #[serde(rename = "handler-class", default)]
    pub handler_class: String,
    #[serde(rename = "init-param", default, skip_serializing_if = "Vec::is_empty")]
    pub init_param: Vec<ParamValue>,
    #[serde(rename = "soap-header", default, skip_serializing_if = "Vec::is_empty")]
    pub soap_header: Vec<String>,
    #[serde(rename = "soap-role", default, skip_serializing_if = "Vec::is_empty")]
    pub soap_role: Vec<String>,
    #[serde(rename = "port-name", default, skip_serializing_if = "Vec::is_empty")]
    pub port_name: Vec<String>,
}

impl Handler {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            handler_name: name.into(),
            handler_class: class.into(),
            ..Default::default()
        }
    }
}

/// A service or port name pattern: an optional namespace and a local part
/// that may end in `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    pub namespace: Option<String>,
    pub local: String,
}

impl NamePattern {
    /// Parse `{namespace}local` or a bare local part.
    /// A prefix that could not be resolved while reading stays in `local`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix('{') {
            if let Some((namespace, local)) = rest.split_once('}') {
                return Self {
                    namespace: Some(namespace.to_string()),
                    local: local.to_string(),
                };
            }
        }
        Self {
            namespace: None,
            local: text.to_string(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.local.ends_with('*')
    }

    /// A pattern without a namespace matches names in any namespace
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        if let Some(expected) = &self.namespace {
            if namespace != Some(expected.as_str()) {
                return false;
            }
        }
        match self.local.strip_suffix('*') {
            Some(prefix) => local.starts_with(prefix),
            None => self.local == local,
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local),
            None => f.write_str(&self.local),
        }
    }
}
