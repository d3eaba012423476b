//! `ejb-jar.xml`

use serde::{Deserialize, Serialize};

use crate::context::ParseContext;
use crate::dialect::{JAVAEE_NS, LegacyDialect};
use crate::model::{
    Descriptor, EjbLocalRef, EjbRef, Empty, EnvEntry, Icon, JndiConsumer, LifecycleCallback,
    MessageDestination, MessageDestinationRef, PersistenceContextRef, PersistenceUnitRef,
    ResourceEnvRef, ResourceRef, SecurityIdentity, SecurityRole, SecurityRoleRef, Text,
};
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Stateless,
    Stateful,
    Singleton,
}

impl SessionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Stateless" => Some(SessionType::Stateless),
            "Stateful" => Some(SessionType::Stateful),
            "Singleton" => Some(SessionType::Singleton),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Stateless => "Stateless",
            SessionType::Stateful => "Stateful",
            SessionType::Singleton => "Singleton",
        }
    }
}

/// Who demarcates transactions (`transaction-type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Bean,
    Container,
}

impl TransactionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Bean" => Some(TransactionType::Bean),
            "Container" => Some(TransactionType::Container),
            _ => None,
        }
    }
}

/// Who persists an entity bean (`persistence-type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceType {
    Bean,
    Container,
}

impl PersistenceType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Bean" => Some(PersistenceType::Bean),
            "Container" => Some(PersistenceType::Container),
            _ => None,
        }
    }
}

/// Container-managed persistence contract (`cmp-version`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpVersion {
    Cmp1,
    Cmp2,
}

impl CmpVersion {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1.x" => Some(CmpVersion::Cmp1),
            "2.x" => Some(CmpVersion::Cmp2),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CmpVersion::Cmp1 => "1.x",
            CmpVersion::Cmp2 => "2.x",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EjbJar {
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
    #[serde(rename = "enterprise-beans", default, skip_serializing_if = "Option::is_none")]
    pub enterprise_beans: Option<EnterpriseBeans>,
    #[serde(rename = "assembly-descriptor", default, skip_serializing_if = "Option::is_none")]
    pub assembly_descriptor: Option<AssemblyDescriptor>,
    #[serde(rename = "ejb-client-jar", default, skip_serializing_if = "Option::is_none")]
    pub ejb_client_jar: Option<String>,
}

impl EjbJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_metadata_complete(&self) -> bool {
        self.metadata_complete.as_deref().map(str::trim) == Some("true")
    }

    pub fn enterprise_beans_mut(&mut self) -> &mut EnterpriseBeans {
        self.enterprise_beans.get_or_insert_with(EnterpriseBeans::default)
    }

    pub fn assembly_descriptor_mut(&mut self) -> &mut AssemblyDescriptor {
        self.assembly_descriptor
            .get_or_insert_with(AssemblyDescriptor::default)
    }

    pub fn add_session(&mut self, bean: SessionBean) {
        self.enterprise_beans_mut().session.push(bean);
    }

    pub fn add_entity(&mut self, bean: EntityBean) {
        self.enterprise_beans_mut().entity.push(bean);
    }

    pub fn add_message_driven(&mut self, bean: MessageDrivenBean) {
        self.enterprise_beans_mut().message_driven.push(bean);
    }

    /// Names of every bean in declaration order, sessions first
    pub fn ejb_names(&self) -> Vec<&str> {
        let Some(beans) = &self.enterprise_beans else {
            return Vec::new();
        };
        beans
            .session
            .iter()
            .map(|b| b.ejb_name.as_str())
            .chain(beans.entity.iter().map(|b| b.ejb_name.as_str()))
            .chain(beans.message_driven.iter().map(|b| b.ejb_name.as_str()))
            .collect()
    }

    pub fn session(&self, ejb_name: &str) -> Option<&SessionBean> {
        self.enterprise_beans
            .as_ref()?
            .session
            .iter()
            .find(|b| b.ejb_name == ejb_name)
    }

    pub fn entity(&self, ejb_name: &str) -> Option<&EntityBean> {
        self.enterprise_beans
            .as_ref()?
            .entity
            .iter()
            .find(|b| b.ejb_name == ejb_name)
    }

    pub fn message_driven(&self, ejb_name: &str) -> Option<&MessageDrivenBean> {
        self.enterprise_beans
            .as_ref()?
            .message_driven
            .iter()
            .find(|b| b.ejb_name == ejb_name)
    }
}

impl Descriptor for EjbJar {
    const ROOT_ELEMENT: &'static str = "ejb-jar";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "3.0";
    const SCHEMA_KIND: Option<SchemaKind> = Some(SchemaKind::EjbJar31);

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn after_unmarshal(&mut self, ctx: &mut ParseContext) {
        let Some(beans) = self.enterprise_beans.as_mut() else {
            return;
        };

        let default_cmp = if ctx.public_ids().has_dialect(LegacyDialect::Ejb11) {
            CmpVersion::Cmp1
        } else {
            CmpVersion::Cmp2
        };

        for bean in &mut beans.session {
            bean.collapse_duplicate_references(ctx);
        }
        for bean in &mut beans.entity {
            bean.collapse_duplicate_references(ctx);
            bean.apply_default_cmp_version(default_cmp);
        }
        for bean in &mut beans.message_driven {
            bean.collapse_duplicate_references(ctx);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseBeans {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "session", default, skip_serializing_if = "Vec::is_empty")]
    pub session: Vec<SessionBean>,
    #[serde(rename = "entity", default, skip_serializing_if = "Vec::is_empty")]
    pub entity: Vec<EntityBean>,
    #[serde(rename = "message-driven", default, skip_serializing_if = "Vec::is_empty")]
    pub message_driven: Vec<MessageDrivenBean>,
}

impl EnterpriseBeans {
    pub fn len(&self) -> usize {
        self.session.len() + self.entity.len() + self.message_driven.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionBean {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "ejb-name", default)]
    pub ejb_name: String,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(rename = "local-home", default, skip_serializing_if = "Option::is_none")]
    pub local_home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(rename = "business-local", default, skip_serializing_if = "Vec::is_empty")]
    pub business_local: Vec<String>,
    #[serde(rename = "business-remote", default, skip_serializing_if = "Vec::is_empty")]
    pub business_remote: Vec<String>,
    #[serde(rename = "local-bean", default, skip_serializing_if = "Option::is_none")]
    pub local_bean: Option<Empty>,
    #[serde(rename = "service-endpoint", default, skip_serializing_if = "Option::is_none")]
    pub service_endpoint: Option<String>,
    #[serde(rename = "ejb-class", default, skip_serializing_if = "Option::is_none")]
    pub ejb_class: Option<String>,
    #[serde(rename = "session-type", default, skip_serializing_if = "Option::is_none")]
    pub session_type: Option<String>,
    #[serde(rename = "init-on-startup", default, skip_serializing_if = "Option::is_none")]
    pub init_on_startup: Option<String>,
    #[serde(rename = "concurrency-management-type", default, skip_serializing_if = "Option::is_none")]
    pub concurrency_management_type: Option<String>,
    #[serde(rename = "transaction-type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
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
    #[serde(rename = "security-role-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role_ref: Vec<SecurityRoleRef>,
    #[serde(rename = "security-identity", default, skip_serializing_if = "Option::is_none")]
    pub security_identity: Option<SecurityIdentity>,
}

impl SessionBean {
    pub fn new(ejb_name: impl Into<String>, ejb_class: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            ejb_name: ejb_name.into(),
            ejb_class: Some(ejb_class.into()),
            session_type: Some(session_type.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn session_type(&self) -> Option<SessionType> {
        self.session_type.as_deref().and_then(SessionType::parse)
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type.as_deref().and_then(TransactionType::parse)
    }

    pub fn init_on_startup(&self) -> bool {
        self.init_on_startup.as_deref().map(str::trim) == Some("true")
    }

    pub fn is_local_bean(&self) -> bool {
        self.local_bean.is_some()
    }
}

impl_jndi_consumer!(SessionBean, |bean| Some(bean.ejb_name.as_str()));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmpField {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "field-name", default)]
    pub field_name: String,
}

impl CmpField {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            description: Vec::new(),
            field_name: field_name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityBean {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "ejb-name", default)]
    pub ejb_name: String,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(rename = "local-home", default, skip_serializing_if = "Option::is_none")]
    pub local_home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(rename = "ejb-class", default, skip_serializing_if = "Option::is_none")]
    pub ejb_class: Option<String>,
    #[serde(rename = "persistence-type", default, skip_serializing_if = "Option::is_none")]
    pub persistence_type: Option<String>,
    #[serde(rename = "prim-key-class", default, skip_serializing_if = "Option::is_none")]
    pub prim_key_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentrant: Option<String>,
    #[serde(rename = "cmp-version", default, skip_serializing_if = "Option::is_none")]
    pub cmp_version: Option<String>,
    #[serde(rename = "abstract-schema-name", default, skip_serializing_if = "Option::is_none")]
    pub abstract_schema_name: Option<String>,
    #[serde(rename = "cmp-field", default, skip_serializing_if = "Vec::is_empty")]
    pub cmp_field: Vec<CmpField>,
    #[serde(rename = "primkey-field", default, skip_serializing_if = "Option::is_none")]
    pub primkey_field: Option<String>,
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
    #[serde(rename = "security-role-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role_ref: Vec<SecurityRoleRef>,
    #[serde(rename = "security-identity", default, skip_serializing_if = "Option::is_none")]
    pub security_identity: Option<SecurityIdentity>,
}

impl EntityBean {
    pub fn new(ejb_name: impl Into<String>, ejb_class: impl Into<String>, persistence_type: PersistenceType) -> Self {
        let persistence_type = match persistence_type {
            PersistenceType::Bean => "Bean",
            PersistenceType::Container => "Container",
        };
        Self {
            ejb_name: ejb_name.into(),
            ejb_class: Some(ejb_class.into()),
            persistence_type: Some(persistence_type.to_string()),
            ..Default::default()
        }
    }

    pub fn persistence_type(&self) -> Option<PersistenceType> {
        self.persistence_type.as_deref().and_then(PersistenceType::parse)
    }

    pub fn cmp_version(&self) -> Option<CmpVersion> {
        self.cmp_version.as_deref().and_then(CmpVersion::parse)
    }

    pub fn is_reentrant(&self) -> bool {
        matches!(self.reentrant.as_deref().map(str::trim), Some("true" | "True"))
    }

    pub fn cmp_field_names(&self) -> impl Iterator<Item = &str> {
        self.cmp_field.iter().map(|f| f.field_name.as_str())
    }

    /// Only container-managed beans without an explicit `cmp-version` change.
    fn apply_default_cmp_version(&mut self, default: CmpVersion) {
        if self.cmp_version.is_none() && self.persistence_type() == Some(PersistenceType::Container) {
            tracing::trace!(ejb_name = %self.ejb_name, cmp_version = default.as_str(), "defaulted cmp-version");
            self.cmp_version = Some(default.as_str().to_string());
        }
    }
}

impl_jndi_consumer!(EntityBean, |bean| Some(bean.ejb_name.as_str()));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "activation-config-property", default, skip_serializing_if = "Vec::is_empty")]
    pub activation_config_property: Vec<ActivationConfigProperty>,
}

impl ActivationConfig {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.activation_config_property
            .iter()
            .find(|p| p.activation_config_property_name == name)
            .map(|p| p.activation_config_property_value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfigProperty {
    #[serde(rename = "activation-config-property-name", default)]
    pub activation_config_property_name: String,
    #[serde(rename = "activation-config-property-value", default)]
    pub activation_config_property_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDrivenBean {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "ejb-name", default)]
    pub ejb_name: String,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "ejb-class", default, skip_serializing_if = "Option::is_none")]
    pub ejb_class: Option<String>,
    #[serde(rename = "messaging-type", default, skip_serializing_if = "Option::is_none")]
    pub messaging_type: Option<String>,
    #[serde(rename = "transaction-type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(rename = "message-destination-type", default, skip_serializing_if = "Option::is_none")]
    pub message_destination_type: Option<String>,
    #[serde(rename = "message-destination-link", default, skip_serializing_if = "Option::is_none")]
    pub message_destination_link: Option<String>,
    #[serde(rename = "activation-config", default, skip_serializing_if = "Option::is_none")]
    pub activation_config: Option<ActivationConfig>,
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
    #[serde(rename = "security-role-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role_ref: Vec<SecurityRoleRef>,
    #[serde(rename = "security-identity", default, skip_serializing_if = "Option::is_none")]
    pub security_identity: Option<SecurityIdentity>,
}

impl MessageDrivenBean {
    pub fn new(ejb_name: impl Into<String>, ejb_class: impl Into<String>) -> Self {
        Self {
            ejb_name: ejb_name.into(),
            ejb_class: Some(ejb_class.into()),
            ..Default::default()
        }
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type.as_deref().and_then(TransactionType::parse)
    }
}

impl_jndi_consumer!(MessageDrivenBean, |bean| Some(bean.ejb_name.as_str()));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodParams {
    #[serde(rename = "method-param", default, skip_serializing_if = "Vec::is_empty")]
    pub method_param: Vec<String>,
}

/// A method (or `*` for all methods) of a named bean
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Method {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "ejb-name", default)]
    pub ejb_name: String,
    #[serde(rename = "method-intf", default, skip_serializing_if = "Option::is_none")]
    pub method_intf: Option<String>,
    #[serde(rename = "method-name", default)]
    pub method_name: String,
    #[serde(rename = "method-params", default, skip_serializing_if = "Option::is_none")]
    pub method_params: Option<MethodParams>,
}

impl Method {
    pub fn new(ejb_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            ejb_name: ejb_name.into(),
            method_name: method_name.into(),
            ..Default::default()
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.method_params = Some(MethodParams {
            method_param: params.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.method_name == "*"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodPermission {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "role-name", default, skip_serializing_if = "Vec::is_empty")]
    pub role_name: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unchecked: Option<Empty>,
    #[serde(rename = "method", default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<Method>,
}

impl MethodPermission {
    pub fn is_unchecked(&self) -> bool {
        self.unchecked.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerTransaction {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "method", default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<Method>,
    #[serde(rename = "trans-attribute", default)]
    pub trans_attribute: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeList {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "method", default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<Method>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyDescriptor {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "security-role", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role: Vec<SecurityRole>,
    #[serde(rename = "method-permission", default, skip_serializing_if = "Vec::is_empty")]
    pub method_permission: Vec<MethodPermission>,
    #[serde(rename = "container-transaction", default, skip_serializing_if = "Vec::is_empty")]
    pub container_transaction: Vec<ContainerTransaction>,
    #[serde(rename = "message-destination", default, skip_serializing_if = "Vec::is_empty")]
    pub message_destination: Vec<MessageDestination>,
    #[serde(rename = "exclude-list", default, skip_serializing_if = "Option::is_none")]
    pub exclude_list: Option<ExcludeList>,
}

impl AssemblyDescriptor {
    /// `trans-attribute` governing `method_name` of `ejb_name`: an exact method
    /// match beats a `*` entry.
    pub fn trans_attribute(&self, ejb_name: &str, method_name: &str) -> Option<&str> {
        let mut wildcard = None;
        for tx in &self.container_transaction {
            for method in tx.method.iter().filter(|m| m.ejb_name == ejb_name) {
                if method.method_name == method_name {
                    return Some(tx.trans_attribute.as_str());
                }
                if method.is_wildcard() {
                    wildcard = Some(tx.trans_attribute.as_str());
                }
            }
        }
        wildcard
    }
}
