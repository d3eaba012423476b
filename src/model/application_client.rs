use serde::{Deserialize, Serialize};

use crate::context::ParseContext;
use crate::dialect::JAVAEE_NS;
use crate::model::{
    Descriptor, EjbLocalRef, EjbRef, EnvEntry, Icon, JndiConsumer, LifecycleCallback,
    MessageDestination, MessageDestinationRef, PersistenceContextRef, PersistenceUnitRef,
    ResourceEnvRef, ResourceRef, Text,
};
use crate::schema::SchemaKind;

/// `application-client.xml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationClient {
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
    #[serde(rename = "post-construct", default, skip_serializing_if = "Vec::is_empty")]
    pub post_construct: Vec<LifecycleCallback>,
    #[serde(rename = "pre-destroy", default, skip_serializing_if = "Vec::is_empty")]
    pub pre_destroy: Vec<LifecycleCallback>,
    #[serde(rename = "callback-handler", default, skip_serializing_if = "Option::is_none")]
    pub callback_handler: Option<String>,
    #[serde(rename = "message-destination", default, skip_serializing_if = "Vec::is_empty")]
    pub message_destination: Vec<MessageDestination>,
}

impl ApplicationClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Descriptor for ApplicationClient {
    const ROOT_ELEMENT: &'static str = "application-client";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "6";
    const SCHEMA_KIND: Option<SchemaKind> = Some(SchemaKind::ApplicationClient6);

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn after_unmarshal(&mut self, ctx: &mut ParseContext) {
        self.collapse_duplicate_references(ctx);
    }
}

impl_jndi_consumer!(ApplicationClient, |client| client.module_name.as_deref());
