//! `ra.xml`

use serde::{Deserialize, Serialize};

use crate::dialect::JAVAEE_NS;
use crate::model::{Descriptor, Icon, Text};
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "@metadata-complete", default, skip_serializing_if = "Option::is_none")]
    pub metadata_complete: Option<String>,
    #[serde(rename = "module-name", default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "icon", default, skip_serializing_if = "Vec::is_empty")]
    pub icon: Vec<Icon>,
    #[serde(rename = "vendor-name", default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    #[serde(rename = "eis-type", default, skip_serializing_if = "Option::is_none")]
    pub eis_type: Option<String>,
    #[serde(rename = "resourceadapter-version", default, skip_serializing_if = "Option::is_none")]
    pub resourceadapter_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(rename = "resourceadapter", default)]
    pub resource_adapter: ResourceAdapter,
    #[serde(rename = "required-work-context", default, skip_serializing_if = "Vec::is_empty")]
    pub required_work_context: Vec<String>,
}

impl Connector {
    pub fn new(resource_adapter_class: impl Into<String>) -> Self {
        Self {
            resource_adapter: ResourceAdapter {
                resourceadapter_class: Some(resource_adapter_class.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Descriptor for Connector {
    const ROOT_ELEMENT: &'static str = "connector";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "1.6";
    const SCHEMA_KIND: Option<SchemaKind> = Some(SchemaKind::Connector16);

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "license-required", default)]
    pub license_required: String,
}

impl License {
    pub fn is_required(&self) -> bool {
        self.license_required.trim() == "true"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigProperty {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "config-property-name", default)]
    pub config_property_name: String,
    #[serde(rename = "config-property-type", default)]
    pub config_property_type: String,
    #[serde(rename = "config-property-value", default, skip_serializing_if = "Option::is_none")]
    pub config_property_value: Option<String>,
    #[serde(rename = "config-property-ignore", default, skip_serializing_if = "Option::is_none")]
    pub config_property_ignore: Option<String>,
    #[serde(
        rename = "config-property-supports-dynamic-updates",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub config_property_supports_dynamic_updates: Option<String>,
    #[serde(rename = "config-property-confidential", default, skip_serializing_if = "Option::is_none")]
    pub config_property_confidential: Option<String>,
}

impl ConfigProperty {
    pub fn new(name: impl Into<String>, property_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            config_property_name: name.into(),
            config_property_type: property_type.into(),
            config_property_value: Some(value.into()),
            ..Default::default()
        }
    }
}

fn find_property<'a>(properties: &'a [ConfigProperty], name: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|p| p.config_property_name == name)
        .and_then(|p| p.config_property_value.as_deref())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAdapter {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "resourceadapter-class", default, skip_serializing_if = "Option::is_none")]
    pub resourceadapter_class: Option<String>,
    #[serde(rename = "config-property", default, skip_serializing_if = "Vec::is_empty")]
    pub config_property: Vec<ConfigProperty>,
    #[serde(rename = "outbound-resourceadapter", default, skip_serializing_if = "Option::is_none")]
    pub outbound_resourceadapter: Option<OutboundResourceAdapter>,
    #[serde(rename = "adminobject", default, skip_serializing_if = "Vec::is_empty")]
    pub adminobject: Vec<AdminObject>,
}

impl ResourceAdapter {
    pub fn config_property(&self, name: &str) -> Option<&str> {
        find_property(&self.config_property, name)
    }

    pub fn connection_definitions(&self) -> &[ConnectionDefinition] {
        self.outbound_resourceadapter
            .as_ref()
            .map(|o| o.connection_definition.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundResourceAdapter {
    #[serde(rename = "connection-definition", default, skip_serializing_if = "Vec::is_empty")]
    pub connection_definition: Vec<ConnectionDefinition>,
    /// `NoTransaction`, `LocalTransaction` or `XATransaction`
    #[serde(rename = "transaction-support", default, skip_serializing_if = "Option::is_none")]
    pub transaction_support: Option<String>,
    #[serde(rename = "reauthentication-support", default, skip_serializing_if = "Option::is_none")]
    pub reauthentication_support: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    #[serde(rename = "managedconnectionfactory-class", default)]
    pub managedconnectionfactory_class: String,
    #[serde(rename = "config-property", default, skip_serializing_if = "Vec::is_empty")]
    pub config_property: Vec<ConfigProperty>,
    #[serde(rename = "connectionfactory-interface", default)]
    pub connectionfactory_interface: String,
    #[serde(rename = "connectionfactory-impl-class", default)]
    pub connectionfactory_impl_class: String,
    #[serde(rename = "connection-interface", default)]
    pub connection_interface: String,
    #[serde(rename = "connection-impl-class", default)]
    pub connection_impl_class: String,
}

impl ConnectionDefinition {
    pub fn config_property(&self, name: &str) -> Option<&str> {
        find_property(&self.config_property, name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminObject {
    #[serde(rename = "adminobject-interface", default)]
    pub adminobject_interface: String,
    #[serde(rename = "adminobject-class", default)]
    pub adminobject_class: String,
    #[serde(rename = "config-property", default, skip_serializing_if = "Vec::is_empty")]
    pub config_property: Vec<ConfigProperty>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_binding_form() {
        let connector: Connector = quick_xml::de::from_str(concat!(
            r#"<connector version="1.5">"#,
            "<vendor-name>Acme</vendor-name><eis-type>Queue</eis-type>",
            "<license><license-required>false</license-required></license>",
            "<resourceadapter><resourceadapter-class>acme.Adapter</resourceadapter-class>",
            "<config-property><config-property-name>host</config-property-name>",
            "<config-property-type>java.lang.String</config-property-type>",
            "<config-property-value>localhost</config-property-value></config-property>",
            "<outbound-resourceadapter><connection-definition>",
            "<managedconnectionfactory-class>acme.Mcf</managedconnectionfactory-class>",
            "<connectionfactory-interface>acme.Cf</connectionfactory-interface>",
            "<connectionfactory-impl-class>acme.CfImpl</connectionfactory-impl-class>",
            "<connection-interface>acme.Conn</connection-interface>",
            "<connection-impl-class>acme.ConnImpl</connection-impl-class>",
            "</connection-definition><transaction-support>XATransaction</transaction-support>",
            "</outbound-resourceadapter>",
            "<adminobject><adminobject-interface>acme.Dest</adminobject-interface>",
            "<adminobject-class>acme.DestImpl</adminobject-class></adminobject>",
            "</resourceadapter></connector>"
        ))
        .unwrap();

        assert_eq!(connector.version(), "1.5");
        assert!(!connector.license.as_ref().unwrap().is_required());
        let adapter = &connector.resource_adapter;
        assert_eq!(adapter.config_property("host"), Some("localhost"));
        assert_eq!(adapter.connection_definitions().len(), 1);
        assert_eq!(adapter.connection_definitions()[0].connection_impl_class, "acme.ConnImpl");
        assert_eq!(adapter.adminobject[0].adminobject_class, "acme.DestImpl");
    }

    #[test]
    fn test_new_connector() {
        let connector = Connector::new("acme.Adapter");
        assert_eq!(connector.version(), "1.6");
        assert!(connector.resource_adapter.connection_definitions().is_empty());
        assert_eq!(connector.resource_adapter.config_property("host"), None);
    }
}
