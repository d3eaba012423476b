//! Descriptor record model
//!
//! Plain serde records mirroring the Java EE descriptor schemas. Records are
//! populated from the binding form produced by
//! [`EventWriter::binding`](crate::writer::EventWriter::binding): local element
//! names only, attributes as `@name` fields, text content as `$text`.
//!
//! Enumerated schema values (`session-type`, `persistence-type`, ...) are kept
//! as the strings found in the document so that unknown or legacy spellings
//! survive a round trip; typed getters interpret them.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::context::ParseContext;
use crate::schema::SchemaKind;

/// Implements [`JndiConsumer`] for a record carrying the standard
/// `env-entry` ... `persistence-unit-ref` fields.
macro_rules! impl_jndi_consumer {
    ($ty:ty, |$this:ident| $name:expr) => {
        impl $crate::model::JndiConsumer for $ty {
            fn consumer_name(&self) -> Option<&str> {
                let $this = self;
                $name
            }

            fn env_entries(&self) -> &[$crate::model::EnvEntry] {
                &self.env_entry
            }

            fn env_entries_mut(&mut self) -> &mut Vec<$crate::model::EnvEntry> {
                &mut self.env_entry
            }

            fn ejb_refs(&self) -> &[$crate::model::EjbRef] {
                &self.ejb_ref
            }

            fn ejb_refs_mut(&mut self) -> &mut Vec<$crate::model::EjbRef> {
                &mut self.ejb_ref
            }

            fn ejb_local_refs(&self) -> &[$crate::model::EjbLocalRef] {
                &self.ejb_local_ref
            }

            fn ejb_local_refs_mut(&mut self) -> &mut Vec<$crate::model::EjbLocalRef> {
                &mut self.ejb_local_ref
            }

            fn resource_refs(&self) -> &[$crate::model::ResourceRef] {
                &self.resource_ref
            }

            fn resource_refs_mut(&mut self) -> &mut Vec<$crate::model::ResourceRef> {
                &mut self.resource_ref
            }

            fn resource_env_refs(&self) -> &[$crate::model::ResourceEnvRef] {
                &self.resource_env_ref
            }

            fn resource_env_refs_mut(&mut self) -> &mut Vec<$crate::model::ResourceEnvRef> {
                &mut self.resource_env_ref
            }

            fn message_destination_refs(&self) -> &[$crate::model::MessageDestinationRef] {
                &self.message_destination_ref
            }

            fn message_destination_refs_mut(
                &mut self,
            ) -> &mut Vec<$crate::model::MessageDestinationRef> {
                &mut self.message_destination_ref
            }

            fn persistence_context_refs(&self) -> &[$crate::model::PersistenceContextRef] {
                &self.persistence_context_ref
            }

            fn persistence_context_refs_mut(
                &mut self,
            ) -> &mut Vec<$crate::model::PersistenceContextRef> {
                &mut self.persistence_context_ref
            }

            fn persistence_unit_refs(&self) -> &[$crate::model::PersistenceUnitRef] {
                &self.persistence_unit_ref
            }

            fn persistence_unit_refs_mut(
                &mut self,
            ) -> &mut Vec<$crate::model::PersistenceUnitRef> {
                &mut self.persistence_unit_ref
            }
        }
    };
}

mod common;

pub mod application;
pub mod application_client;
pub mod connector;
pub mod ejb_jar;
pub mod handler_chains;
pub mod persistence;
pub mod taglib;
pub mod web_app;

pub use application::{Application, Module, ModuleKind, WebModule};
pub use application_client::ApplicationClient;
pub use common::*;
pub use connector::{
    AdminObject, ConfigProperty, ConnectionDefinition, Connector, License, OutboundResourceAdapter,
    ResourceAdapter,
};
pub use ejb_jar::{
    AssemblyDescriptor, CmpField, CmpVersion, ContainerTransaction, EjbJar, EnterpriseBeans,
    EntityBean, Method, MethodParams, MethodPermission, MessageDrivenBean, PersistenceType,
    SessionBean, SessionType, TransactionType,
};
pub use handler_chains::{Handler, HandlerChain, HandlerChains, NamePattern};
pub use persistence::{
    Persistence, PersistenceProperties, PersistenceProperty, PersistenceUnit,
    PersistenceUnitTransactionType,
};
pub use taglib::{Function, Tag, TldAttribute, TldTaglib};
pub use web_app::{
    ErrorPage, Filter, FilterMapping, FormLoginConfig, LoginConfig, MimeMapping, Servlet,
    ServletMapping, SessionConfig, WebApp, WelcomeFileList,
};

/// A descriptor document type that can be bound from and to XML
pub trait Descriptor: Serialize + DeserializeOwned {
    /// Local name of the document element
    const ROOT_ELEMENT: &'static str;
    /// Namespace the descriptor is normalized to and written in
    const NAMESPACE: &'static str;
    /// Version assumed when the document declares none
    const DEFAULT_VERSION: &'static str;
    /// Schema the descriptor validates against, if it has one
    const SCHEMA_KIND: Option<SchemaKind>;

    /// The `version` attribute as found in the document
    fn declared_version(&self) -> Option<&str>;

    fn version(&self) -> &str {
        self.declared_version().unwrap_or(Self::DEFAULT_VERSION)
    }

    /// Hook run once the record graph is populated, with the parse context of
    /// the call that populated it.
    fn after_unmarshal(&mut self, _ctx: &mut ParseContext) {}
}
