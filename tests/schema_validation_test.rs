//! Schema validation against bundled schema resources

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use jee_descriptor::dialect::JAVAEE_NS;
use jee_descriptor::{
    DescriptorError, DirectoryResources, MemoryResources, ResourceLocator, SchemaCatalog, SchemaKind,
    SchemaValidator, VersionPatchTable,
};
use rayon::prelude::*;
use tempfile::TempDir;

fn validator() -> SchemaValidator {
    SchemaValidator::new(Arc::new(common::fixture_resources()))
}

/// Locator that must never be consulted
struct UnreachableResources;

impl ResourceLocator for UnreachableResources {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        panic!("resource '{name}' requested");
    }
}

#[test]
fn test_j2ee_document_validates_after_patching() {
    let events = validator()
        .validate_javaee_str(SchemaKind::EjbJar31, common::EJB_JAR_2_1)
        .unwrap();
    assert!(events.is_empty(), "{events:?}");
}

#[test]
fn test_dtd_document_validates_without_fetching_dtd() {
    let events = validator()
        .validate_javaee_str(SchemaKind::EjbJar31, common::EJB_JAR_2_0_DTD)
        .unwrap();
    assert!(events.is_empty(), "{events:?}");
}

#[test]
fn test_unexpected_element_is_rejected() {
    let xml = format!(
        r#"<ejb-jar xmlns="{JAVAEE_NS}" version="3.1"><display-name>x</display-name><session-bean/></ejb-jar>"#
    );
    let err = validator()
        .validate_javaee_str(SchemaKind::EjbJar31, &xml)
        .unwrap_err();

    match err {
        DescriptorError::SchemaValidation { kind, errors } => {
            assert_eq!(kind, SchemaKind::EjbJar31);
            assert!(!errors.is_empty());
            assert!(errors.iter().any(|e| e.contains("session-bean")), "{errors:?}");
        }
        other => panic!("expected a schema validation error, got {other:?}"),
    }
}

#[test]
fn test_version_table_override_is_applied() {
    let overrides = BTreeMap::from([("ejb-jar".to_string(), "3.2".to_string())]);
    let validator = validator().with_versions(VersionPatchTable::with_overrides(&overrides).unwrap());

    // the fixture schema fixes version to 3.1
    let err = validator
        .validate_javaee_str(SchemaKind::EjbJar31, common::EJB_JAR_2_1)
        .unwrap_err();
    assert!(matches!(err, DescriptorError::SchemaValidation { .. }), "got {err:?}");
}

#[test]
fn test_web_app_from_jcp_namespace() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<web-app xmlns="http://xmlns.jcp.org/xml/ns/javaee"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://xmlns.jcp.org/xml/ns/javaee http://xmlns.jcp.org/xml/ns/javaee/web-app_4_0.xsd"
         version="4.0">
  <display-name xml:lang="de">Laden</display-name>
</web-app>"#;
    let events = validator().validate_javaee_str(SchemaKind::WebApp30, xml).unwrap();
    assert!(events.is_empty(), "{events:?}");
}

#[test]
fn test_foreign_namespace_warns_and_fails_strict() {
    let xml = r#"<web-app xmlns="urn:acme:web" version="3.0"><display-name>x</display-name></web-app>"#;

    let events = validator().validate_javaee_str(SchemaKind::WebApp30, xml).unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].message.contains("urn:acme:web"));

    let err = validator()
        .strict(true)
        .validate_javaee_str(SchemaKind::WebApp30, xml)
        .unwrap_err();
    assert!(matches!(err, DescriptorError::StrictValidation { .. }), "got {err:?}");
}

#[test]
fn test_missing_include_is_reported_by_name() {
    let resources = MemoryResources::new()
        .with("xml.xsd", common::XML_XSD)
        .with("ejb-jar_3_1.xsd", common::ejb_jar_xsd());

    let err = SchemaValidator::new(Arc::new(resources))
        .validate_javaee_str(SchemaKind::EjbJar31, common::EJB_JAR_2_1)
        .unwrap_err();

    match err {
        DescriptorError::UnresolvedSchemaReference { names, .. } => {
            assert!(names.iter().any(|n| n.ends_with("javaee_6.xsd")), "{names:?}");
        }
        other => panic!("expected an unresolved reference, got {other:?}"),
    }
}

#[test]
fn test_missing_root_schema_is_not_found() {
    let resources = MemoryResources::new().with("xml.xsd", common::XML_XSD);
    let err = SchemaValidator::new(Arc::new(resources))
        .validate_javaee_str(SchemaKind::Application6, "<application/>")
        .unwrap_err();

    match err {
        DescriptorError::SchemaResourceNotFound { name } => assert_eq!(name, "application_6.xsd"),
        other => panic!("expected a missing resource, got {other:?}"),
    }
}

#[test]
fn test_unmapped_kind_fails_before_loading_resources() {
    let mut catalog = SchemaCatalog::default();
    catalog.remove(SchemaKind::Connector16);
    let validator = SchemaValidator::new(Arc::new(UnreachableResources)).with_catalog(catalog);

    let err = validator
        .validate_javaee_str(SchemaKind::Connector16, "<connector/>")
        .unwrap_err();
    assert!(
        matches!(err, DescriptorError::UnmappedSchemaKind { kind: SchemaKind::Connector16 }),
        "got {err:?}"
    );
}

#[test]
fn test_concurrent_validation_compiles_once() {
    let validator = validator();

    let results: Vec<_> = (0..16)
        .into_par_iter()
        .map(|i| {
            let source = if i % 2 == 0 {
                common::EJB_JAR_2_1
            } else {
                common::EJB_JAR_2_0_DTD
            };
            validator.validate_javaee_str(SchemaKind::EjbJar31, source)
        })
        .collect();

    assert!(results.iter().all(|r| matches!(r, Ok(events) if events.is_empty())));
    assert_eq!(validator.cache().stats().entry_count, 1);
}

#[test]
fn test_directory_resources() {
    let temp_dir = TempDir::new().unwrap();
    common::write_schema_dir(temp_dir.path());

    let descriptor = temp_dir.path().join("ejb-jar.xml");
    std::fs::write(&descriptor, common::EJB_JAR_2_1).unwrap();

    let validator = SchemaValidator::new(Arc::new(DirectoryResources::new(temp_dir.path())));
    let events = validator
        .validate_javaee_file(SchemaKind::EjbJar31, &descriptor)
        .unwrap();
    assert!(events.is_empty(), "{events:?}");
}
