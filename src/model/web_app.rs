//! `web.xml`

use serde::{Deserialize, Serialize};

use crate::context::ParseContext;
use crate::dialect::JAVAEE_NS;
use crate::model::{
    Descriptor, EjbLocalRef, EjbRef, Empty, EnvEntry, Icon, JndiConsumer, LifecycleCallback,
    Listener, MessageDestination, MessageDestinationRef, ParamValue, PersistenceContextRef,
    PersistenceUnitRef, ResourceEnvRef, ResourceRef, RunAs, SecurityRole, SecurityRoleRef, Text,
};
use crate::schema::SchemaKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebApp {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributable: Option<Empty>,
    #[serde(rename = "context-param", default, skip_serializing_if = "Vec::is_empty")]
    pub context_param: Vec<ParamValue>,
    #[serde(rename = "filter", default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Filter>,
    #[serde(rename = "filter-mapping", default, skip_serializing_if = "Vec::is_empty")]
    pub filter_mapping: Vec<FilterMapping>,
    #[serde(rename = "listener", default, skip_serializing_if = "Vec::is_empty")]
    pub listener: Vec<Listener>,
    #[serde(rename = "servlet", default, skip_serializing_if = "Vec::is_empty")]
    pub servlet: Vec<Servlet>,
    #[serde(rename = "servlet-mapping", default, skip_serializing_if = "Vec::is_empty")]
    pub servlet_mapping: Vec<ServletMapping>,
    #[serde(rename = "session-config", default, skip_serializing_if = "Option::is_none")]
    pub session_config: Option<SessionConfig>,
    #[serde(rename = "mime-mapping", default, skip_serializing_if = "Vec::is_empty")]
    pub mime_mapping: Vec<MimeMapping>,
    #[serde(rename = "welcome-file-list", default, skip_serializing_if = "Option::is_none")]
    pub welcome_file_list: Option<WelcomeFileList>,
    #[serde(rename = "error-page", default, skip_serializing_if = "Vec::is_empty")]
    pub error_page: Vec<ErrorPage>,
    #[serde(rename = "security-constraint", default, skip_serializing_if = "Vec::is_empty")]
    pub security_constraint: Vec<SecurityConstraint>,
    #[serde(rename = "login-config", default, skip_serializing_if = "Option::is_none")]
    pub login_config: Option<LoginConfig>,
    #[serde(rename = "security-role", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role: Vec<SecurityRole>,
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
    #[serde(rename = "message-destination", default, skip_serializing_if = "Vec::is_empty")]
    pub message_destination: Vec<MessageDestination>,
}

impl WebApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_distributable(&self) -> bool {
        self.distributable.is_some()
    }

    pub fn context_param(&self, name: &str) -> Option<&str> {
        self.context_param
            .iter()
            .find(|p| p.param_name == name)
            .map(|p| p.param_value.as_str())
    }

    pub fn servlet(&self, name: &str) -> Option<&Servlet> {
        self.servlet.iter().find(|s| s.servlet_name == name)
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filter.iter().find(|f| f.filter_name == name)
    }

    /// URL patterns mapped to the named servlet, across all mappings
    pub fn servlet_url_patterns(&self, servlet_name: &str) -> Vec<&str> {
        self.servlet_mapping
            .iter()
            .filter(|m| m.servlet_name == servlet_name)
            .flat_map(|m| m.url_pattern.iter().map(String::as_str))
            .collect()
    }

    /// Servlets with a non-negative `load-on-startup`, in start order.
    /// Ties keep declaration order.
    pub fn startup_order(&self) -> Vec<&Servlet> {
        let mut servlets: Vec<(i32, &Servlet)> = self
            .servlet
            .iter()
            .filter_map(|s| s.load_on_startup().filter(|n| *n >= 0).map(|n| (n, s)))
            .collect();
        servlets.sort_by_key(|(order, _)| *order);
        servlets.into_iter().map(|(_, s)| s).collect()
    }

    pub fn welcome_files(&self) -> &[String] {
        self.welcome_file_list
            .as_ref()
            .map(|list| list.welcome_file.as_slice())
            .unwrap_or_default()
    }

    pub fn add_servlet(&mut self, servlet: Servlet, url_patterns: &[&str]) {
        if !url_patterns.is_empty() {
            self.servlet_mapping.push(ServletMapping {
                servlet_name: servlet.servlet_name.clone(),
                url_pattern: url_patterns.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            });
        }
        self.servlet.push(servlet);
    }
}

impl Descriptor for WebApp {
    const ROOT_ELEMENT: &'static str = "web-app";
    const NAMESPACE: &'static str = JAVAEE_NS;
    const DEFAULT_VERSION: &'static str = "3.0";
    const SCHEMA_KIND: Option<SchemaKind> = Some(SchemaKind::WebApp30);

    fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn after_unmarshal(&mut self, ctx: &mut ParseContext) {
        self.collapse_duplicate_references(ctx);
    }
}

impl_jndi_consumer!(WebApp, |app| app.module_name.as_deref());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "filter-name", default)]
    pub filter_name: String,
    #[serde(rename = "filter-class", default, skip_serializing_if = "Option::is_none")]
    pub filter_class: Option<String>,
    #[serde(rename = "async-supported", default, skip_serializing_if = "Option::is_none")]
    pub async_supported: Option<String>,
    #[serde(rename = "init-param", default, skip_serializing_if = "Vec::is_empty")]
    pub init_param: Vec<ParamValue>,
}

impl Filter {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            filter_name: name.into(),
            filter_class: Some(class.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterMapping {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "filter-name", default)]
    pub filter_name: String,
    #[serde(rename = "url-pattern", default, skip_serializing_if = "Vec::is_empty")]
    pub url_pattern: Vec<String>,
    #[serde(rename = "servlet-name", default, skip_serializing_if = "Vec::is_empty")]
    pub servlet_name: Vec<String>,
    #[serde(rename = "dispatcher", default, skip_serializing_if = "Vec::is_empty")]
    pub dispatcher: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Servlet {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "servlet-name", default)]
    pub servlet_name: String,
    #[serde(rename = "servlet-class", default, skip_serializing_if = "Option::is_none")]
    pub servlet_class: Option<String>,
    #[serde(rename = "jsp-file", default, skip_serializing_if = "Option::is_none")]
    pub jsp_file: Option<String>,
    #[serde(rename = "init-param", default, skip_serializing_if = "Vec::is_empty")]
    pub init_param: Vec<ParamValue>,
    #[serde(rename = "load-on-startup", default, skip_serializing_if = "Option::is_none")]
    pub load_on_startup: Option<String>,
    #[serde(rename = "enabled", default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
    #[serde(rename = "async-supported", default, skip_serializing_if = "Option::is_none")]
    pub async_supported: Option<String>,
    #[serde(rename = "run-as", default, skip_serializing_if = "Option::is_none")]
    pub run_as: Option<RunAs>,
    #[serde(rename = "security-role-ref", default, skip_serializing_if = "Vec::is_empty")]
    pub security_role_ref: Vec<SecurityRoleRef>,
}

impl Servlet {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            servlet_name: name.into(),
            servlet_class: Some(class.into()),
            ..Default::default()
        }
    }

    /// `load-on-startup` as an integer. An empty element means "some time
    /// during startup" and maps to 0.
    pub fn load_on_startup(&self) -> Option<i32> {
        let value = self.load_on_startup.as_deref()?.trim();
        if value.is_empty() {
            return Some(0);
        }
        value.parse().ok()
    }

    pub fn init_param(&self, name: &str) -> Option<&str> {
        self.init_param
            .iter()
            .find(|p| p.param_name == name)
            .map(|p| p.param_value.as_str())
    }

    pub fn is_async_supported(&self) -> bool {
        self.async_supported.as_deref().map(str::trim) == Some("true")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServletMapping {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "servlet-name", default)]
    pub servlet_name: String,
    #[serde(rename = "url-pattern", default, skip_serializing_if = "Vec::is_empty")]
    pub url_pattern: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes
    #[serde(rename = "session-timeout", default, skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<String>,
    #[serde(rename = "tracking-mode", default, skip_serializing_if = "Vec::is_empty")]
    pub tracking_mode: Vec<String>,
}

impl SessionConfig {
    pub fn session_timeout(&self) -> Option<i64> {
        self.session_timeout.as_deref()?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MimeMapping {
    #[serde(default)]
    pub extension: String,
    #[serde(rename = "mime-type", default)]
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WelcomeFileList {
    #[serde(rename = "welcome-file", default, skip_serializing_if = "Vec::is_empty")]
    pub welcome_file: Vec<String>,
}

/// Either `error-code` or `exception-type` selects the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPage {
    #[serde(rename = "error-code", default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(rename = "exception-type", default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(default)]
    pub location: String,
}

impl ErrorPage {
    pub fn error_code(&self) -> Option<u16> {
        self.error_code.as_deref()?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResourceCollection {
    #[serde(rename = "web-resource-name", default)]
    pub web_resource_name: String,
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "url-pattern", default, skip_serializing_if = "Vec::is_empty")]
    pub url_pattern: Vec<String>,
    #[serde(rename = "http-method", default, skip_serializing_if = "Vec::is_empty")]
    pub http_method: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConstraint {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "role-name", default, skip_serializing_if = "Vec::is_empty")]
    pub role_name: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDataConstraint {
    #[serde(rename = "description", default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<Text>,
    #[serde(rename = "transport-guarantee", default)]
    pub transport_guarantee: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityConstraint {
    #[serde(rename = "display-name", default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<Text>,
    #[serde(rename = "web-resource-collection", default, skip_serializing_if = "Vec::is_empty")]
    pub web_resource_collection: Vec<WebResourceCollection>,
    #[serde(rename = "auth-constraint", default, skip_serializing_if = "Option::is_none")]
    pub auth_constraint: Option<AuthConstraint>,
    #[serde(rename = "user-data-constraint", default, skip_serializing_if = "Option::is_none")]
    pub user_data_constraint: Option<UserDataConstraint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormLoginConfig {
    #[serde(rename = "form-login-page", default)]
    pub form_login_page: String,
    #[serde(rename = "form-error-page", default)]
    pub form_error_page: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginConfig {
    #[serde(rename = "auth-method", default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    #[serde(rename = "realm-name", default, skip_serializing_if = "Option::is_none")]
    pub realm_name: Option<String>,
    #[serde(rename = "form-login-config", default, skip_serializing_if = "Option::is_none")]
    pub form_login_config: Option<FormLoginConfig>,
}
