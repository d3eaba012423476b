//! Marshal then unmarshal again, for each descriptor kind

use jee_descriptor::dialect::{JAVAEE_NS, PERSISTENCE_NS};
use jee_descriptor::model::{
    ApplicationClient, AssemblyDescriptor, CmpField, ContainerTransaction, EjbJar, EjbLocalRef,
    EntityBean, EnvEntry, Filter, FilterMapping, LifecycleCallback, MessageDrivenBean, Method,
    MethodPermission, Persistence, PersistenceType, PersistenceUnit, ResourceRef, SecurityRole,
    Servlet, SessionBean, SessionType, Text, WebApp, WelcomeFileList,
};
use jee_descriptor::{Descriptor, DescriptorBinding};
use tempfile::NamedTempFile;

fn round_trip<T: Descriptor>(value: &T) -> (String, T) {
    let xml = jee_descriptor::marshal(value).unwrap();
    let back = jee_descriptor::unmarshal_javaee(xml.as_bytes()).unwrap();
    (xml, back)
}

fn sample_ejb_jar() -> EjbJar {
    let mut jar = EjbJar::new();
    jar.version = Some("3.1".to_string());
    jar.module_name = Some("orders".to_string());
    jar.display_name = vec![
        Text::new("Orders").with_lang("en"),
        Text::new("Commandes").with_lang("fr"),
    ];

    let mut processor = SessionBean::new("OrderProcessor", "orders.OrderProcessorBean", SessionType::Stateless);
    processor.business_local.push("orders.OrderProcessor".to_string());
    processor.env_entry.push(EnvEntry::new("maxItems", "java.lang.Integer", "50"));
    processor.resource_ref.push(ResourceRef::new("jdbc/orders", "javax.sql.DataSource"));
    processor.ejb_local_ref.push(EjbLocalRef {
        ejb_ref_name: "ejb/Inventory".to_string(),
        ejb_link: Some("Inventory".to_string()),
        ..Default::default()
    });
    processor.post_construct.push(LifecycleCallback {
        lifecycle_callback_class: None,
        lifecycle_callback_method: "init".to_string(),
    });
    jar.add_session(processor);

    let mut order = EntityBean::new("Order", "orders.OrderBean", PersistenceType::Container);
    order.cmp_version = Some("2.x".to_string());
    order.abstract_schema_name = Some("OrderSchema".to_string());
    order.cmp_field = vec![CmpField::new("id"), CmpField::new("total")];
    order.primkey_field = Some("id".to_string());
    jar.add_entity(order);

    let mut listener = MessageDrivenBean::new("OrderListener", "orders.OrderListenerBean");
    listener.transaction_type = Some("Container".to_string());
    jar.add_message_driven(listener);

    *jar.assembly_descriptor_mut() = AssemblyDescriptor {
        security_role: vec![SecurityRole::new("clerk")],
        method_permission: vec![MethodPermission {
            role_name: vec!["clerk".to_string()],
            method: vec![Method::new("OrderProcessor", "submit").with_params(["orders.Order"])],
            ..Default::default()
        }],
        container_transaction: vec![ContainerTransaction {
            method: vec![Method::new("OrderProcessor", "*")],
            trans_attribute: "Required".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };
    jar
}

#[test]
fn test_ejb_jar_round_trip() {
    let jar = sample_ejb_jar();
    let (xml, back) = round_trip(&jar);

    assert!(xml.contains(JAVAEE_NS), "{xml}");
    assert!(xml.contains(r#"xml:lang="fr""#), "{xml}");
    assert_eq!(back, jar);
    assert_eq!(
        back.assembly_descriptor.as_ref().unwrap().trans_attribute("OrderProcessor", "submit"),
        Some("Required")
    );
}

#[test]
fn test_web_app_round_trip() {
    let mut web_app = WebApp::new();
    web_app.version = Some("3.0".to_string());
    web_app.display_name.push(Text::new("storefront"));
    web_app.distributable = Some(Default::default());

    let mut servlet = Servlet::new("catalog", "store.CatalogServlet");
    servlet.load_on_startup = Some("2".to_string());
    web_app.add_servlet(servlet, &["/catalog/*", "/items/*"]);
    web_app.add_servlet(Servlet::new("admin", "store.AdminServlet"), &["/admin/*"]);

    web_app.filter.push(Filter::new("gzip", "store.GzipFilter"));
    web_app.filter_mapping.push(FilterMapping {
        filter_name: "gzip".to_string(),
        url_pattern: vec!["/*".to_string()],
        ..Default::default()
    });
    web_app.welcome_file_list = Some(WelcomeFileList {
        welcome_file: vec!["index.jsp".to_string(), "index.html".to_string()],
    });
    web_app.resource_ref.push(ResourceRef::new("jdbc/store", "javax.sql.DataSource"));

    let (_, back) = round_trip(&web_app);

    assert_eq!(back, web_app);
    assert!(back.is_distributable());
    assert_eq!(back.servlet_url_patterns("catalog"), vec!["/catalog/*", "/items/*"]);
    assert_eq!(back.welcome_files(), ["index.jsp", "index.html"]);
}

#[test]
fn test_application_client_round_trip() {
    let mut client = ApplicationClient::new();
    client.version = Some("6".to_string());
    client.display_name.push(Text::new("order-console"));
    client.env_entry.push(EnvEntry::new("greeting", "java.lang.String", "hello"));
    client.callback_handler = Some("console.LoginHandler".to_string());

    let (_, back) = round_trip(&client);
    assert_eq!(back, client);
}

#[test]
fn test_padded_values_survive_round_trip() {
    let mut client = ApplicationClient::new();
    client.display_name.push(Text::new("order-console"));
    client.env_entry.push(EnvEntry::new("greeting", "java.lang.String", "  hello  "));
    client.env_entry.push(EnvEntry::new("banner", "java.lang.String", "\tline one\nline two\n"));
    client.description.push(Text::new("ends with ]]> inside"));

    let (xml, back) = round_trip(&client);
    assert!(xml.contains("<env-entry-value>  hello  </env-entry-value>"));
    assert_eq!(back.env_entry[0].env_entry_value.as_deref(), Some("  hello  "));
    assert_eq!(back, client);
}

#[test]
fn test_persistence_round_trip() {
    let mut unit = PersistenceUnit::new("orders");
    unit.transaction_type = Some("JTA".to_string());
    unit.jta_data_source = Some("jdbc/orders".to_string());
    unit.class = vec!["orders.Order".to_string(), "orders.LineItem".to_string()];
    unit.set_property("eclipselink.logging.level", "FINE");
    unit.set_property("eclipselink.ddl-generation", "create-tables");

    let mut persistence = Persistence::new();
    persistence.version = Some("2.0".to_string());
    persistence.persistence_unit.push(unit);

    let xml = jee_descriptor::marshal(&persistence).unwrap();
    assert!(xml.contains(PERSISTENCE_NS), "{xml}");

    let back = jee_descriptor::unmarshal_persistence(xml.as_bytes()).unwrap();
    assert_eq!(back, persistence);
    assert_eq!(
        back.unit("orders").unwrap().property("eclipselink.ddl-generation"),
        Some("create-tables")
    );
}

#[test]
fn test_duplicate_references_collapse_after_marshal() {
    let mut jar = EjbJar::new();
    let mut bean = SessionBean::new("Billing", "billing.BillingBean", SessionType::Stateless);
    bean.env_entry.push(EnvEntry::new("rate", "java.lang.Double", "0.1"));
    bean.env_entry.push(EnvEntry::new("currency", "java.lang.String", "EUR"));
    bean.env_entry.push(EnvEntry::new("java:comp/env/rate", "java.lang.Double", "0.2"));
    jar.add_session(bean);

    let xml = jee_descriptor::marshal(&jar).unwrap();
    let (back, events) = DescriptorBinding::new().read_javaee::<EjbJar, _>(xml.as_bytes()).unwrap();

    let entries = &back.session("Billing").unwrap().env_entry;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].env_entry_value.as_deref(), Some("0.2"));
    assert_eq!(entries[1].env_entry_name, "currency");
    assert_eq!(events.len(), 1);
    assert!(events[0].message.contains("Billing"));
}

#[test]
fn test_marshal_to_file_without_indent() {
    let jar = sample_ejb_jar();
    let file = NamedTempFile::new().unwrap();

    DescriptorBinding::new()
        .with_indent(None)
        .marshal_to(&jar, file.reopen().unwrap())
        .unwrap();

    let written = std::fs::read_to_string(file.path()).unwrap();
    assert!(written.starts_with("<?xml"));
    assert!(!written.contains("\n    <"));

    let back: EjbJar = jee_descriptor::unmarshal_javaee(std::fs::File::open(file.path()).unwrap()).unwrap();
    assert_eq!(back, jar);
}
