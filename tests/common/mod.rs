//! Shared fixtures for the integration tests
//!
//! The schemas are cut-down stand-ins for the Java EE 6 set. They keep the
//! parts the tests rely on: a root schema including a common schema, a fixed
//! `version` attribute, and an `xml:lang` reference resolved through `xml.xsd`.

#![allow(dead_code)]

use std::path::Path;

use jee_descriptor::MemoryResources;
use jee_descriptor::schema::SCHEMA_RESOURCE_DIR;

pub const XML_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.w3.org/XML/1998/namespace">
  <xs:attribute name="lang" type="xs:string"/>
</xs:schema>"#;

pub const JAVAEE_6_XSD: &str = r###"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            xmlns:javaee="http://java.sun.com/xml/ns/javaee"
            targetNamespace="http://java.sun.com/xml/ns/javaee"
            elementFormDefault="qualified">
  <xsd:import namespace="http://www.w3.org/XML/1998/namespace"
              schemaLocation="http://www.w3.org/2001/xml.xsd"/>
  <xsd:complexType name="display-nameType">
    <xsd:simpleContent>
      <xsd:extension base="xsd:string">
        <xsd:attribute ref="xml:lang"/>
      </xsd:extension>
    </xsd:simpleContent>
  </xsd:complexType>
  <xsd:complexType name="anyContentType">
    <xsd:sequence>
      <xsd:any namespace="##targetNamespace" processContents="skip"
               minOccurs="0" maxOccurs="unbounded"/>
    </xsd:sequence>
  </xsd:complexType>
</xsd:schema>"###;

fn root_schema(root: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            xmlns:javaee="http://java.sun.com/xml/ns/javaee"
            targetNamespace="http://java.sun.com/xml/ns/javaee"
            elementFormDefault="qualified">
  <xsd:include schemaLocation="javaee_6.xsd"/>
  <xsd:element name="{root}">
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element name="display-name" type="javaee:display-nameType"
                     minOccurs="0" maxOccurs="unbounded"/>
        <xsd:element name="content" type="javaee:anyContentType" minOccurs="0"/>
        <xsd:element name="enterprise-beans" type="javaee:anyContentType" minOccurs="0"/>
      </xsd:sequence>
      <xsd:attribute name="version" type="xsd:string" fixed="{version}"/>
      <xsd:attribute name="id" type="xsd:ID"/>
    </xsd:complexType>
  </xsd:element>
</xsd:schema>"#
    )
}

pub fn ejb_jar_xsd() -> String {
    root_schema("ejb-jar", "3.1")
}

pub fn web_app_xsd() -> String {
    root_schema("web-app", "3.0")
}

/// Complete fixture set: `xml.xsd`, `javaee_6.xsd`, ejb-jar and web-app roots
pub fn fixture_resources() -> MemoryResources {
    MemoryResources::new()
        .with("xml.xsd", XML_XSD)
        .with("javaee_6.xsd", JAVAEE_6_XSD)
        .with("ejb-jar_3_1.xsd", ejb_jar_xsd())
        .with("web-app_3_0.xsd", web_app_xsd())
}

/// Write the fixture set below `<root>/META-INF/schema/`
pub fn write_schema_dir(root: &Path) {
    let dir = root.join(SCHEMA_RESOURCE_DIR);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("xml.xsd"), XML_XSD).unwrap();
    std::fs::write(dir.join("javaee_6.xsd"), JAVAEE_6_XSD).unwrap();
    std::fs::write(dir.join("ejb-jar_3_1.xsd"), ejb_jar_xsd()).unwrap();
    std::fs::write(dir.join("web-app_3_0.xsd"), web_app_xsd()).unwrap();
}

/// J2EE 1.4 `ejb-jar.xml` declaring version 2.1 and a schema location hint
pub const EJB_JAR_2_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ejb-jar xmlns="http://java.sun.com/xml/ns/j2ee"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://java.sun.com/xml/ns/j2ee http://java.sun.com/xml/ns/j2ee/ejb-jar_2_1.xsd"
         version="2.1" id="shop">
  <display-name xml:lang="en">Shop</display-name>
  <enterprise-beans>
    <session>
      <ejb-name>Cart</ejb-name>
      <ejb-class>shop.CartBean</ejb-class>
      <session-type>Stateful</session-type>
    </session>
  </enterprise-beans>
</ejb-jar>"#;

/// EJB 2.0 DTD document with no namespace at all
pub const EJB_JAR_2_0_DTD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ejb-jar PUBLIC "-//Sun Microsystems, Inc.//DTD Enterprise JavaBeans 2.0//EN" "http://java.sun.com/dtd/ejb-jar_2_0.dtd">
<ejb-jar>
  <display-name>Bank</display-name>
  <enterprise-beans>
    <entity>
      <ejb-name>Account</ejb-name>
      <ejb-class>bank.AccountBean</ejb-class>
      <persistence-type>Container</persistence-type>
    </entity>
  </enterprise-beans>
</ejb-jar>"#;

/// EJB 1.1 DTD document; its container-managed entity has no cmp-version
pub const EJB_JAR_1_1_DTD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ejb-jar PUBLIC "-//Sun Microsystems, Inc.//DTD Enterprise JavaBeans 1.1//EN" "http://java.sun.com/j2ee/dtds/ejb-jar_1_1.dtd">
<ejb-jar>
  <enterprise-beans>
    <entity>
      <ejb-name>Account</ejb-name>
      <ejb-class>bank.AccountBean</ejb-class>
      <persistence-type>Container</persistence-type>
      <cmp-field><field-name>balance</field-name></cmp-field>
    </entity>
  </enterprise-beans>
</ejb-jar>"#;
