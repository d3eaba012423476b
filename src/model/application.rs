//! `application.xml`

use serde::{Deserialize, Serialize};

use crate::context::ParseContext;
use crate::dialect::JAVAEE_NS;
use crate::model::{
    Descriptor, EjbLocalRef, EjbRef, EnvEntry, Icon, JndiConsumer, MessageDestination,
    MessageDestinationRef, PersistenceContextRef, PersistenceUnitRef, ResourceEnvRef, ResourceRef,
    SecurityRole, Text,
};
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "application-name", default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "icon", default, skip_serializing_if = "Vec::is_empty")]
    pub icon: Vec<Icon>,
    #[serde(rename = "initialize-in-order", default, skip_serializing_if = "Option::is_none")]
    pub initialize_in_order: Option<String>,
    #[serde(rename = "module", default, skip_serializing_if = "Vec::is_empty")]
    pub module: Vec<Module>,
    #[serde(rename = "security-role", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role: Vec<SecurityRole>,
    #[serde(rename = "library-directory", default, skip_serializing_if = "Option::is_none")]
    pub library_directory: Option<String>,
    #[serde(rename = "env-entry", default, skip_serializing_if = "Vec::is_empty")]
    pub env_entry: Vec<EnvEntry>,
    #[serde(rename = "ejb-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub ejb_ref: Vec<EjbRef>,
    #[serde(rename = "ejb-local-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub ejb_local_ref: Vec<EjbLocalRef>,
    #[serde(rename = "resource-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub resource_ref: Vec<ResourceRef>,
    #[serde(rename = "resource-env-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub resource_env_ref: Vec<ResourceEnvRef>,
    #[serde(rename = "message-destination-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub message_destination_ref: Vec<MessageDestinationRef>,
    #[serde(rename = "persistence-context-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub persistence_context_ref: Vec<PersistenceContextRef>,
    #[serde(rename = "persistence-unit-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub persistence_unit_ref: Vec<PersistenceUnitRef>,
    #[serde(rename = "message-destination", default, skip_serializing_if = "Vec::is_empty")]
    pub message_destination: Vec<MessageDestination>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_in_order(&self) -> bool {
        self.initialize_in_order.as_deref().map(str::trim) == Some("true")
    }

    pub fn modules_of(&self, kind: ModuleKind) -> impl Iterator<Item = &Module> {
        self.module.iter().filter(move |m| m.kind() == Some(kind))
    }

    /// Context root of the web module packaged as `web_uri`
    pub fn context_root(&self, web_uri: &str) -> Option<&str> {
        self.module
            .iter()
            .filter_map(|m| m.web.as_ref())
            .find(|w| w.web_uri == web_uri)
            .map(|w| w.context_root.as_str())
    }
}

impl Descriptor for Application {
    const ROOT_ELEMENT: &'static str = "application";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "6";
    const SCHEMA_KIND: Option<SchemaKind> = Some(SchemaKind::Application6);

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn after_unmarshal(&mut self, ctx: &mut ParseContext) {
        self.collapse_duplicate_references(ctx);
    }
}

impl_jndi_consumer!(Application, |app| app.application_name.as_deref());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Connector,
    Ejb,
    Java,
    Web,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebModule {
    #[serde(rename = "web-uri", default)]
    pub web_uri: String,
    #[serde(rename = "context-root", default)]
    pub context_root: String,
}

/// Exactly one of `connector`, `ejb`, `java` or `web` is expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ejb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebModule>,
    #[serde(rename = "alt-dd", default, skip_serializing_if = "Option::is_none")]
    pub alt_dd: Option<String>,
}

impl Module {
    pub fn ejb(uri: impl Into<String>) -> Self {
        Self {
            ejb: Some(uri.into()),
            ..Default::default()
        }
    }

    pub fn web(uri: impl Into<String>, context_root: impl Into<String>) -> Self {
        Self {
            web: Some(WebModule {
                web_uri: uri.into(),
                context_root: context_root.into(),
            }),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> Option<ModuleKind> {
        if self.connector.is_some() {
            Some(ModuleKind::Connector)
        } else if self.ejb.is_some() {
            Some(ModuleKind::Ejb)
        } else if self.java.is_some() {
            Some(ModuleKind::Java)
        } else if self.web.is_some() {
            Some(ModuleKind::Web)
        } else {
            None
        }
    }

    /// Archive path of the module
    pub fn uri(&self) -> Option<&str> {
        self.connector
            .as_deref()
            .or(self.ejb.as_deref())
            .or(self.java.as_deref())
            .or(self.web.as_ref().map(|w| w.web_uri.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modules() {
        let app: Application = quick_xml::de::from_str(concat!(
            r#"<application version="6">"#,
            "<application-name>shop</application-name>",
            "<initialize-in-order>true</initialize-in-order>",
            "<module><ejb>shop-ejb.jar</ejb></module>",
            "<module><web><web-uri>shop.war</web-uri><context-root>/shop</context-root></web>",
            "<alt-dd>META-INF/alt-web.xml</alt-dd></module>",
            "<module><java>shop-client.jar</java></module>",
            "<library-directory>lib</library-directory>",
            "</application>"
        ))
        .unwrap();

        assert!(app.initialize_in_order());
        assert_eq!(app.module.len(), 3);
        assert_eq!(app.module[1].kind(), Some(ModuleKind::Web));
        assert_eq!(app.module[1].alt_dd.as_deref(), Some("META-INF/alt-web.xml"));
        assert_eq!(app.context_root("shop.war"), Some("/shop"));
        let ejbs: Vec<_> = app.modules_of(ModuleKind::Ejb).filter_map(Module::uri).collect();
        assert_eq!(ejbs, vec!["shop-ejb.jar"]);
        assert_eq!(app.library_directory.as_deref(), Some("lib"));
    }

    #[test]
    fn test_module_constructors() {
        assert_eq!(Module::ejb("a.jar").uri(), Some("a.jar"));
        assert_eq!(Module::web("b.war", "/b").kind(), Some(ModuleKind::Web));
        assert_eq!(Module::default().kind(), None);
    }
}
