//! `persistence.xml`

use serde::{Deserialize, Serialize};

use crate::dialect::PERSISTENCE_NS;
use crate::model::Descriptor;
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persistence {
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "persistence-unit", default, skip_serializing_if = "Vec::is_empty")]
    pub persistence_unit: Vec<PersistenceUnit>,
}

impl Persistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self, name: &str) -> Option<&PersistenceUnit> {
        self.persistence_unit.iter().find(|u| u.name == name)
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.persistence_unit.iter().map(|u| u.name.as_str())
    }
}

impl Descriptor for Persistence {
    const ROOT_ELEMENT: &'static str = "persistence";
    const NAMESPACE: &'static str = PERSISTENCE_NS;
    const DEFAULT_VERSION: &'static str = "2.0";
    const SCHEMA_KIND: Option<SchemaKind> = None;

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceUnitTransactionType {
    Jta,
    ResourceLocal,
}

impl PersistenceUnitTransactionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "JTA" => Some(PersistenceUnitTransactionType::Jta),
            "RESOURCE_LOCAL" => Some(PersistenceUnitTransactionType::ResourceLocal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PersistenceUnitTransactionType::Jta => "JTA",
            PersistenceUnitTransactionType::ResourceLocal => "RESOURCE_LOCAL",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceUnit {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@transaction-type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(rename = "jta-data-source", default, skip_serializing_if = "Option::is_none")]
    pub jta_data_source: Option<String>,
    #[serde(rename = "non-jta-data-source", default, skip_serializing_if = "Option::is_none")]
    pub non_jta_data_source: Option<String>,
    #[serde(rename = "mapping-file", default, skip_serializing_if = "Vec::is_empty")]
    pub mapping_file: Vec<String>,
    #[serde(rename = "jar-file", default, skip_serializing_if = "Vec::is_empty")]
    pub jar_file: Vec<String>,
    #[serde(rename = "class", default, skip_serializing_if = "Vec::is_empty")]
    pub class: Vec<String>,
    #[serde(rename = "exclude-unlisted-classes", default, skip_serializing_if = "Option::is_none")]
    pub exclude_unlisted_classes: Option<String>,
    /// `ALL`, `NONE`, `ENABLE_SELECTIVE`, `DISABLE_SELECTIVE` or `UNSPECIFIED`
    #[serde(rename = "shared-cache-mode", default, skip_serializing_if = "Option::is_none")]
    pub shared_cache_mode: Option<String>,
    #[serde(rename = "validation-mode", default, skip_serializing_if = "Option::is_none")]
    pub validation_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PersistenceProperties>,
}

impl PersistenceUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declared transaction type. Without one, a unit is JTA when it names a
    /// JTA data source or no data source at all.
    pub fn transaction_type(&self) -> PersistenceUnitTransactionType {
        if let Some(declared) = self
            .transaction_type
            .as_deref()
            .and_then(PersistenceUnitTransactionType::parse)
        {
            return declared;
        }
        if self.non_jta_data_source.is_some() && self.jta_data_source.is_none() {
            PersistenceUnitTransactionType::ResourceLocal
        } else {
            PersistenceUnitTransactionType::Jta
        }
    }

    /// An empty element counts as `true`
    pub fn excludes_unlisted_classes(&self) -> bool {
        match self.exclude_unlisted_classes.as_deref().map(str::trim) {
            None => false,
            Some(value) => value.is_empty() || value == "true",
        }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.as_ref()?.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties
            .get_or_insert_with(PersistenceProperties::default)
            .set(name, value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceProperties {
    #[serde(rename = "property", default, skip_serializing_if = "Vec::is_empty")]
    pub property: Vec<PersistenceProperty>,
}

impl PersistenceProperties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Replaces an existing value in place, otherwise appends
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.property.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.property.push(PersistenceProperty { name, value }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceProperty {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@value", default)]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_binding_form() {
        let persistence: Persistence = quick_xml::de::from_str(concat!(
            r#"<persistence version="2.0">"#,
            r#"<persistence-unit name="orders" transaction-type="RESOURCE_LOCAL">"#,
            "<provider>org.example.Provider</provider>",
            "<non-jta-data-source>jdbc/Orders</non-jta-data-source>",
            "<class>shop.Order</class><class>shop.LineItem</class>",
            "<exclude-unlisted-classes>true</exclude-unlisted-classes>",
            "<shared-cache-mode>ENABLE_SELECTIVE</shared-cache-mode>",
            r#"<properties><property name="ddl" value="create"/></properties>"#,
            "</persistence-unit>",
            r#"<persistence-unit name="audit"/>"#,
            "</persistence>"
        ))
        .unwrap();

        assert_eq!(persistence.unit_names().collect::<Vec<_>>(), vec!["orders", "audit"]);
        let orders = persistence.unit("orders").unwrap();
        assert_eq!(orders.transaction_type(), PersistenceUnitTransactionType::ResourceLocal);
        assert_eq!(orders.class, vec!["shop.Order", "shop.LineItem"]);
        assert!(orders.excludes_unlisted_classes());
        assert_eq!(orders.property("ddl"), Some("create"));
        assert_eq!(orders.property("missing"), None);

        let audit = persistence.unit("audit").unwrap();
        assert_eq!(audit.transaction_type(), PersistenceUnitTransactionType::Jta);
        assert!(!audit.excludes_unlisted_classes());
    }

    #[test]
    fn test_transaction_type_inferred_from_data_sources() {
        let mut unit = PersistenceUnit::new("local");
        unit.non_jta_data_source = Some("jdbc/Local".to_string());
        assert_eq!(unit.transaction_type(), PersistenceUnitTransactionType::ResourceLocal);

        unit.jta_data_source = Some("jdbc/Managed".to_string());
        assert_eq!(unit.transaction_type(), PersistenceUnitTransactionType::Jta);
    }

    #[test]
    fn test_set_property_replaces_in_place() {
        let mut unit = PersistenceUnit::new("orders");
        unit.set_property("a", "1");
        unit.set_property("b", "2");
        unit.set_property("a", "3");

        let names: Vec<&str> = unit
            .properties
            .as_ref()
            .unwrap()
            .property
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(unit.property("a"), Some("3"));
    }

    #[test]
    fn test_default_version() {
        assert_eq!(Persistence::new().version(), "2.0");
        assert_eq!(Persistence::SCHEMA_KIND, None);
    }
}
