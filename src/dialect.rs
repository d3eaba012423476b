//! Namespace URIs and DOCTYPE public identifiers of the historical descriptor
//! dialects, from the DTD-based J2EE 1.2 descriptors up to Jakarta EE.

/// Canonical namespace every Java EE descriptor is normalized to.
pub const JAVAEE_NS: &str = "http://java.sun.com/xml/ns/javaee";

/// J2EE 1.4 namespace.
pub const J2EE_NS: &str = "http://java.sun.com/xml/ns/j2ee";

/// Java EE 7/8 namespace hosted by the JCP.
pub const JCP_JAVAEE_NS: &str = "http://xmlns.jcp.org/xml/ns/javaee";

/// Jakarta EE 9+ namespace.
pub const JAKARTAEE_NS: &str = "https://jakarta.ee/xml/ns/jakartaee";

/// Canonical namespace of `persistence.xml`.
pub const PERSISTENCE_NS: &str = "http://java.sun.com/xml/ns/persistence";

pub const JCP_PERSISTENCE_NS: &str = "http://xmlns.jcp.org/xml/ns/persistence";

pub const JAKARTA_PERSISTENCE_NS: &str = "https://jakarta.ee/xml/ns/persistence";

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespaces rewritten to [`JAVAEE_NS`] without complaint.
pub const JAVAEE_ALTERNATES: &[&str] = &[J2EE_NS, JCP_JAVAEE_NS, JAKARTAEE_NS];

/// Namespaces rewritten to [`PERSISTENCE_NS`] without complaint.
pub const PERSISTENCE_ALTERNATES: &[&str] = &[JCP_PERSISTENCE_NS, JAKARTA_PERSISTENCE_NS];

/// A DTD-based descriptor generation, identified by its DOCTYPE public id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LegacyDialect {
    Ejb11,
    Ejb20,
    WebApp22,
    WebApp23,
    Application12,
    Application13,
    ApplicationClient12,
    ApplicationClient13,
    Connector10,
    Taglib11,
    Taglib12,
}

pub const EJB_1_1_PUBLIC_ID: &str = "-//Sun Microsystems, Inc.//DTD Enterprise JavaBeans 1.1//EN";
pub const EJB_2_0_PUBLIC_ID: &str = "-//Sun Microsystems, Inc.//DTD Enterprise JavaBeans 2.0//EN";

const PUBLIC_IDS: &[(&str, LegacyDialect)] = &[
    (EJB_1_1_PUBLIC_ID, LegacyDialect::Ejb11),
    (EJB_2_0_PUBLIC_ID, LegacyDialect::Ejb20),
    (
        "-//Sun Microsystems, Inc.//DTD Web Application 2.2//EN",
        LegacyDialect::WebApp22,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD Web Application 2.3//EN",
        LegacyDialect::WebApp23,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD J2EE Application 1.2//EN",
        LegacyDialect::Application12,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD J2EE Application 1.3//EN",
        LegacyDialect::Application13,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD J2EE Application Client 1.2//EN",
        LegacyDialect::ApplicationClient12,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD J2EE Application Client 1.3//EN",
        LegacyDialect::ApplicationClient13,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD Connector 1.0//EN",
        LegacyDialect::Connector10,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD JSP Tag Library 1.1//EN",
        LegacyDialect::Taglib11,
    ),
    (
        "-//Sun Microsystems, Inc.//DTD JSP Tag Library 1.2//EN",
        LegacyDialect::Taglib12,
    ),
];

impl LegacyDialect {
    /// Look up the dialect declared by a DOCTYPE public identifier.
    pub fn from_public_id(public_id: &str) -> Option<Self> {
        let public_id = public_id.trim();
        PUBLIC_IDS
            .iter()
            .find(|(id, _)| *id == public_id)
            .map(|(_, dialect)| *dialect)
    }

    pub fn public_id(self) -> &'static str {
        PUBLIC_IDS
            .iter()
            .find(|(_, dialect)| *dialect == self)
            .map(|(id, _)| *id)
            .unwrap_or_default()
    }

    /// Root element name of documents written in this dialect
    pub fn root_element(self) -> &'static str {
        match self {
            LegacyDialect::Ejb11 | LegacyDialect::Ejb20 => "ejb-jar",
            LegacyDialect::WebApp22 | LegacyDialect::WebApp23 => "web-app",
            LegacyDialect::Application12 | LegacyDialect::Application13 => "application",
            LegacyDialect::ApplicationClient12 | LegacyDialect::ApplicationClient13 => {
                "application-client"
            }
            LegacyDialect::Connector10 => "connector",
            LegacyDialect::Taglib11 | LegacyDialect::Taglib12 => "taglib",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_lookup() {
        assert_eq!(
            LegacyDialect::from_public_id(EJB_1_1_PUBLIC_ID),
            Some(LegacyDialect::Ejb11)
        );
        assert_eq!(
            LegacyDialect::from_public_id("  -//Sun Microsystems, Inc.//DTD Web Application 2.3//EN "),
            Some(LegacyDialect::WebApp23)
        );
        assert_eq!(LegacyDialect::from_public_id("-//Acme//DTD Nothing//EN"), None);
    }

    #[test]
    fn test_public_id_table_is_consistent() {
        for (id, dialect) in PUBLIC_IDS {
            assert_eq!(dialect.public_id(), *id);
            assert_eq!(LegacyDialect::from_public_id(id), Some(*dialect));
        }
        assert_eq!(LegacyDialect::Connector10.root_element(), "connector");
    }
}
