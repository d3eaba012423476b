//! Types shared by several descriptor kinds, including the deployment
//! reference records and the [`JndiConsumer`] view over them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{ParseContext, ValidationEvent};

/// Localized text such as `description` or `display-name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    #[serde(rename = "@lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            lang: None,
            value: value.into(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// Text in the requested language, falling back to the unlabelled entry
pub fn localized<'a>(texts: &'a [Text], lang: Option<&str>) -> Option<&'a str> {
    texts
        .iter()
        .find(|t| t.lang.as_deref() == lang)
        .or_else(|| texts.iter().find(|t| t.lang.is_none()))
        .or_else(|| texts.first())
        .map(|t| t.value.as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(rename = "@lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(rename = "small-icon", default, skip_serializing_if = "Option::is_none")]
    pub small_icon: Option<String>,
    #[serde(rename = "large-icon", default, skip_serializing_if = "Option::is_none")]
    pub large_icon: Option<String>,
}

/// `init-param` / `context-param`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamValue {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "param-name", default)]
    pub param_name: String,
    #[serde(rename = "param-value", default)]
    pub param_value: String,
}

impl ParamValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            description: Vec::new(),
            param_name: name.into(),
            param_value: value.into(),
        }
    }
}

/// Marker element with no content, such as `<unchecked/>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// `name`/`value` pair carried as child elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRole {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "role-name", default)]
    pub role_name: String,
}

impl SecurityRole {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRoleRef {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "role-name", default)]
    pub role_name: String,
    #[serde(rename = "role-link", default, skip_serializing_if = "Option::is_none")]
    pub role_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAs {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "role-name", default)]
    pub role_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIdentity {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "use-caller-identity", default, skip_serializing_if = "Option::is_none")]
    pub use_caller_identity: Option<String>,
    #[serde(rename = "run-as", default, skip_serializing_if = "Option::is_none")]
    pub run_as: Option<RunAs>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionTarget {
    #[serde(rename = "injection-target-class", default)]
    pub injection_target_class: String,
    #[serde(rename = "injection-target-name", default)]
    pub injection_target_name: String,
}

/// `post-construct` / `pre-destroy`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleCallback {
    #[serde(rename = "lifecycle-callback-class", default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_callback_class: Option<String>,
    #[serde(rename = "lifecycle-callback-method", default)]
    pub lifecycle_callback_method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "listener-class", default)]
    pub listener_class: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDestination {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "message-destination-name", default)]
    pub message_destination_name: String,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

const COMP_ENV_PREFIX: &str = "java:comp/env/";

/// Key of a reference name: `java:`-qualified names are kept, anything else
/// is placed under `java:comp/env/`.
pub fn normalize_reference_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("java:") {
        name.to_string()
    } else {
        format!("{}{}", COMP_ENV_PREFIX, name)
    }
}

/// The kinds of deployment reference a component can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceKind {
    EnvEntry,
    EjbRef,
    EjbLocalRef,
    ResourceRef,
    ResourceEnvRef,
    MessageDestinationRef,
    PersistenceContextRef,
    PersistenceUnitRef,
}

impl ReferenceKind {
    pub fn element_name(self) -> &'static str {
        match self {
            ReferenceKind::EnvEntry => "env-entry",
            ReferenceKind::EjbRef => "ejb-ref",
            ReferenceKind::EjbLocalRef => "ejb-local-ref",
            ReferenceKind::ResourceRef => "resource-ref",
            ReferenceKind::ResourceEnvRef => "resource-env-ref",
            ReferenceKind::MessageDestinationRef => "message-destination-ref",
            ReferenceKind::PersistenceContextRef => "persistence-context-ref",
            ReferenceKind::PersistenceUnitRef => "persistence-unit-ref",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// A reference record identified by its (normalized) name
pub trait Keyed {
    const KIND: ReferenceKind;

    /// Name as written in the descriptor
    fn name(&self) -> &str;

    fn key(&self) -> String {
        normalize_reference_name(self.name())
    }
}

/// Collapse records sharing a key: the last definition wins and takes the
/// position of the first. One warning event is emitted per duplicate.
pub fn dedupe_by_key<T: Keyed>(items: &mut Vec<T>, consumer: Option<&str>, ctx: &mut ParseContext) {
    if items.len() < 2 {
        return;
    }

    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<T> = Vec::with_capacity(items.len());

    for item in items.drain(..) {
        let key = item.key();
        match positions.get(&key) {
            Some(&index) => {
                ctx.emit(ValidationEvent::warning(format!(
                    "duplicate {} '{}' in {}; the last definition is used",
                    T::KIND,
                    key,
                    consumer.unwrap_or("<unnamed component>")
                )));
                unique[index] = item;
            }
            None => {
                positions.insert(key, unique.len());
                unique.push(item);
            }
        }
    }

    *items = unique;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "env-entry-name", default)]
    pub env_entry_name: String,
    #[serde(rename = "env-entry-type", default, skip_serializing_if = "Option::is_none")]
    pub env_entry_type: Option<String>,
    #[serde(rename = "env-entry-value", default, skip_serializing_if = "Option::is_none")]
    pub env_entry_value: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

impl EnvEntry {
    pub fn new(name: impl Into<String>, entry_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            env_entry_name: name.into(),
            env_entry_type: Some(entry_type.into()),
            env_entry_value: Some(value.into()),
            ..Default::default()
        }
    }
}

impl Keyed for EnvEntry {
    const KIND: ReferenceKind = ReferenceKind::EnvEntry;

    fn name(&self) -> &str {
        &self.env_entry_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjbRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "ejb-ref-name", default)]
    pub ejb_ref_name: String,
    #[serde(rename = "ejb-ref-type", default, skip_serializing_if = "Option::is_none")]
    pub ejb_ref_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(rename = "ejb-link", default, skip_serializing_if = "Option::is_none")]
    pub ejb_link: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

impl Keyed for EjbRef {
    const KIND: ReferenceKind = ReferenceKind::EjbRef;

    fn name(&self) -> &str {
        &self.ejb_ref_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjbLocalRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "ejb-ref-name", default)]
    pub ejb_ref_name: String,
    #[serde(rename = "ejb-ref-type", default, skip_serializing_if = "Option::is_none")]
    pub ejb_ref_type: Option<String>,
    #[serde(rename = "local-home", default, skip_serializing_if = "Option::is_none")]
    pub local_home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(rename = "ejb-link", default, skip_serializing_if = "Option::is_none")]
    pub ejb_link: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

impl Keyed for EjbLocalRef {
    const KIND: ReferenceKind = ReferenceKind::EjbLocalRef;

    fn name(&self) -> &str {
        &self.ejb_ref_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "res-ref-name", default)]
    pub res_ref_name: String,
    #[serde(rename = "res-type", default, skip_serializing_if = "Option::is_none")]
    pub res_type: Option<String>,
    #[serde(rename = "res-auth", default, skip_serializing_if = "Option::is_none")]
    pub res_auth: Option<String>,
    #[serde(rename = "res-sharing-scope", default, skip_serializing_if = "Option::is_none")]
    pub res_sharing_scope: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

impl ResourceRef {
    pub fn new(name: impl Into<String>, res_type: impl Into<String>) -> Self {
        Self {
            res_ref_name: name.into(),
            res_type: Some(res_type.into()),
            ..Default::default()
        }
    }
}

impl Keyed for ResourceRef {
    const KIND: ReferenceKind = ReferenceKind::ResourceRef;

    fn name(&self) -> &str {
        &self.res_ref_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEnvRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "resource-env-ref-name", default)]
    pub resource_env_ref_name: String,
    #[serde(rename = "resource-env-ref-type", default, skip_serializing_if = "Option::is_none")]
    pub resource_env_ref_type: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

impl Keyed for ResourceEnvRef {
    const KIND: ReferenceKind = ReferenceKind::ResourceEnvRef;

    fn name(&self) -> &str {
        &self.resource_env_ref_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDestinationRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "message-destination-ref-name", default)]
    pub message_destination_ref_name: String,
    #[serde(rename = "message-destination-type", default, skip_serializing_if = "Option::is_none")]
    pub message_destination_type: Option<String>,
    #[serde(rename = "message-destination-usage", default, skip_serializing_if = "Option::is_none")]
    pub message_destination_usage: Option<String>,
    #[serde(rename = "message-destination-link", default, skip_serializing_if = "Option::is_none")]
    pub message_destination_link: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
    #[serde(rename = "lookup-name", default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
}

impl Keyed for MessageDestinationRef {
    const KIND: ReferenceKind = ReferenceKind::MessageDestinationRef;

    fn name(&self) -> &str {
        &self.message_destination_ref_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceContextRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "persistence-context-ref-name", default)]
    pub persistence_context_ref_name: String,
    #[serde(rename = "persistence-unit-name", default, skip_serializing_if = "Option::is_none")]
    pub persistence_unit_name: Option<String>,
    /// `Transaction` (the default) or `Extended`
    #[serde(rename = "persistence-context-type", default, skip_serializing_if = "Option::is_none")]
    pub persistence_context_type: Option<String>,
    #[serde(rename = "persistence-property", default, skip_serializing_if = "Vec::is_empty")]
    pub persistence_property: Vec<Property>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
}

impl PersistenceContextRef {
    pub fn is_extended(&self) -> bool {
        self.persistence_context_type.as_deref().map(str::trim) == Some("Extended")
    }
}

impl Keyed for PersistenceContextRef {
    const KIND: ReferenceKind = ReferenceKind::PersistenceContextRef;

    fn name(&self) -> &str {
        &self.persistence_context_ref_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceUnitRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "persistence-unit-ref-name", default)]
    pub persistence_unit_ref_name: String,
    #[serde(rename = "persistence-unit-name", default, skip_serializing_if = "Option::is_none")]
    pub persistence_unit_name: Option<String>,
    #[serde(rename = "mapped-name", default, skip_serializing_if = "Option::is_none")]
    pub mapped_name: Option<String>,
    #[serde(rename = "injection-target", default, skip_serializing_if = "Vec::is_empty")]
    pub injection_target: Vec<InjectionTarget>,
}

impl Keyed for PersistenceUnitRef {
    const KIND: ReferenceKind = ReferenceKind::PersistenceUnitRef;

    fn name(&self) -> &str {
        &self.persistence_unit_ref_name
    }
}

/// A component that declares deployment references
pub trait JndiConsumer {
    /// Name of the component, used in diagnostics
    fn consumer_name(&self) -> Option<&str>;

    fn env_entries(&self) -> &[EnvEntry];
    fn env_entries_mut(&mut self) -> &mut Vec<EnvEntry>;
    fn ejb_refs(&self) -> &[EjbRef];
    fn ejb_refs_mut(&mut self) -> &mut Vec<EjbRef>;
    fn ejb_local_refs(&self) -> &[EjbLocalRef];
    fn ejb_local_refs_mut(&mut self) -> &mut Vec<EjbLocalRef>;
    fn resource_refs(&self) -> &[ResourceRef];
    fn resource_refs_mut(&mut self) -> &mut Vec<ResourceRef>;
    fn resource_env_refs(&self) -> &[ResourceEnvRef];
    fn resource_env_refs_mut(&mut self) -> &mut Vec<ResourceEnvRef>;
    fn message_destination_refs(&self) -> &[MessageDestinationRef];
    fn message_destination_refs_mut(&mut self) -> &mut Vec<MessageDestinationRef>;
    fn persistence_context_refs(&self) -> &[PersistenceContextRef];
    fn persistence_context_refs_mut(&mut self) -> &mut Vec<PersistenceContextRef>;
    fn persistence_unit_refs(&self) -> &[PersistenceUnitRef];
    fn persistence_unit_refs_mut(&mut self) -> &mut Vec<PersistenceUnitRef>;

    /// Every declared reference as `(kind, normalized key)`, in declaration
    /// order within each kind.
    fn reference_keys(&self) -> Vec<(ReferenceKind, String)> {
        fn keys<T: Keyed>(items: &[T]) -> impl Iterator<Item = (ReferenceKind, String)> + '_ {
            items.iter().map(|item| (T::KIND, item.key()))
        }

        keys(self.env_entries())
            .chain(keys(self.ejb_refs()))
            .chain(keys(self.ejb_local_refs()))
            .chain(keys(self.resource_refs()))
            .chain(keys(self.resource_env_refs()))
            .chain(keys(self.message_destination_refs()))
            .chain(keys(self.persistence_context_refs()))
            .chain(keys(self.persistence_unit_refs()))
            .collect()
    }

    fn env_entry(&self, name: &str) -> Option<&EnvEntry> {
        let key = normalize_reference_name(name);
        self.env_entries().iter().find(|entry| entry.key() == key)
    }

    fn resource_ref(&self, name: &str) -> Option<&ResourceRef> {
        let key = normalize_reference_name(name);
        self.resource_refs().iter().find(|r| r.key() == key)
    }

    /// Enforce unique reference names within each kind
    fn collapse_duplicate_references(&mut self, ctx: &mut ParseContext) {
        let consumer = self.consumer_name().map(str::to_string);
        let consumer = consumer.as_deref();

        dedupe_by_key(self.env_entries_mut(), consumer, ctx);
        dedupe_by_key(self.ejb_refs_mut(), consumer, ctx);
        dedupe_by_key(self.ejb_local_refs_mut(), consumer, ctx);
        dedupe_by_key(self.resource_refs_mut(), consumer, ctx);
        dedupe_by_key(self.resource_env_refs_mut(), consumer, ctx);
        dedupe_by_key(self.message_destination_refs_mut(), consumer, ctx);
        dedupe_by_key(self.persistence_context_refs_mut(), consumer, ctx);
        dedupe_by_key(self.persistence_unit_refs_mut(), consumer, ctx);
    }
}
