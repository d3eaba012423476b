//! Per-parse state threaded through every filter stage and record hook.
//!
//! A [`ParseContext`] is created immediately before a top-level parse call and
//! dropped when the call returns, whether it succeeded or failed. Nothing in
//! here is global or thread-scoped, so nested parses on the same thread each
//! see their own registry.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::LegacyDialect;

/// Severity of a [`ValidationEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
    FatalError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::FatalError => write!(f, "FATAL_ERROR"),
        }
    }
}

/// Something noteworthy observed while reading or validating a descriptor
/// that did not by itself abort the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvent {
    pub severity: Severity,
    pub message: String,
    /// Line in the source document, when known
    pub line: Option<u32>,
}

impl ValidationEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            line: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.severity, line, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Ordered set of DOCTYPE public identifiers seen during one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicIdRegistry {
    ids: BTreeSet<String>,
}

impl PublicIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a public id; returns false when it was already present.
    pub fn insert(&mut self, public_id: impl Into<String>) -> bool {
        self.ids.insert(public_id.into())
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.ids.contains(public_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Legacy dialects implied by the recorded public ids. Unknown ids are skipped.
    pub fn dialects(&self) -> BTreeSet<LegacyDialect> {
        self.ids
            .iter()
            .filter_map(|id| LegacyDialect::from_public_id(id))
            .collect()
    }

    pub fn has_dialect(&self, dialect: LegacyDialect) -> bool {
        self.ids
            .iter()
            .any(|id| LegacyDialect::from_public_id(id) == Some(dialect))
    }
}

/// State scoped to a single parse operation
#[derive(Debug, Default)]
pub struct ParseContext {
    public_ids: PublicIdRegistry,
    events: Vec<ValidationEvent>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_public_id(&mut self, public_id: impl Into<String>) {
        let public_id = public_id.into();
        tracing::trace!(public_id = %public_id, "recorded DOCTYPE public id");
        self.public_ids.insert(public_id);
    }

    pub fn public_ids(&self) -> &PublicIdRegistry {
        &self.public_ids
    }

    pub fn emit(&mut self, event: ValidationEvent) {
        tracing::debug!(severity = %event.severity, message = %event.message, "validation event");
        self.events.push(event);
    }

    pub fn events(&self) -> &[ValidationEvent] {
        &self.events
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<ValidationEvent> {
        self.events
    }
}
