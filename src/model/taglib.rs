//! Tag library descriptors (`*.tld`)
//!
//! JSP 1.1 documents use different element names (`tlibversion`,
//! `tagclass`, ...). [`TaglibFilter`](crate::filter::TaglibFilter) renames
//! them before binding, so only the current names appear here.

use serde::{Deserialize, Serialize};

use crate::dialect::JAVAEE_NS;
use crate::model::{Descriptor, Icon, Listener, Text};
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TldTaglib {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "icon", default, skip_serializing_if = "Vec::is_empty")]
    pub icon: Vec<Icon>,
    #[serde(rename = "tlib-version", default)]
    pub tlib_version: String,
    #[serde(rename = "jsp-version", default, skip_serializing_if = "Option::is_none")]
    pub jsp_version: Option<String>,
    #[serde(rename = "short-name", default)]
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "listener", default, skip_serializing_if = "Vec::is_empty")]
    pub listener: Vec<Listener>,
    #[serde(rename = "tag", default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Tag>,
    #[serde(rename = "function", default, skip_serializing_if = "Vec::is_empty")]
    pub function: Vec<Function>,
}

impl TldTaglib {
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tag.iter().find(|t| t.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.function.iter().find(|f| f.name == name)
    }
}

impl Descriptor for TldTaglib {
    const ROOT_ELEMENT: &'static str = "taglib";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "2.1";
    const SCHEMA_KIND: Option<SchemaKind> = None;

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "tag-class", default)]
    pub tag_class: String,
    #[serde(rename = "tei-class", default, skip_serializing_if = "Option::is_none")]
    pub tei_class: Option<String>,
    /// `empty`, `JSP`, `scriptless` or `tagdependent`
    #[serde(rename = "body-content", default, skip_serializing_if = "Option::is_none")]
    pub body_content: Option<String>,
    #[serde(rename = "attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<TldAttribute>,
    #[serde(rename = "dynamic-attributes", default, skip_serializing_if = "Option::is_none")]
    pub dynamic_attributes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl Tag {
    /// Names of the attributes marked `required`
    pub fn required_attributes(&self) -> Vec<&str> {
        self.attribute
            .iter()
            .filter(|a| a.is_required())
            .map(|a| a.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TldAttribute {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtexprvalue: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,
}

fn xsd_boolean(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true" | "yes"))
}

impl TldAttribute {
    pub fn is_required(&self) -> bool {
        xsd_boolean(self.required.as_deref())
    }

    pub fn allows_runtime_expression(&self) -> bool {
        xsd_boolean(self.rtexprvalue.as_deref())
    }
}

/// EL function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "function-class", default)]
    pub function_class: String,
    #[serde(rename = "function-signature", default)]
    pub function_signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taglib_binding_form() {
        let taglib: TldTaglib = quick_xml::de::from_str(concat!(
            "<taglib><tlib-version>1.0</tlib-version><jsp-version>1.2</jsp-version>",
            "<short-name>shop</short-name><uri>http://example.com/shop</uri>",
            "<tag><name>price</name><tag-class>shop.PriceTag</tag-class>",
            "<body-content>empty</body-content>",
            "<attribute><name>value</name><required>true</required>",
            "<rtexprvalue>yes</rtexprvalue></attribute>",
            "<attribute><name>currency</name></attribute></tag>",
            "<function><name>format</name><function-class>shop.Fn</function-class>",
            "<function-signature>java.lang.String format(double)</function-signature></function>",
            "</taglib>"
        ))
        .unwrap();

        assert_eq!(taglib.short_name, "shop");
        assert_eq!(taglib.version(), "2.1");
        let price = taglib.tag("price").unwrap();
        assert_eq!(price.required_attributes(), vec!["value"]);
        assert!(price.attribute[0].allows_runtime_expression());
        assert!(!price.attribute[1].allows_runtime_expression());
        assert_eq!(taglib.function("format").unwrap().function_class, "shop.Fn");
    }
}
