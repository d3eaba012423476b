use std::sync::Arc;

use moka::sync::Cache;

use crate::error::LibXml2Error;
use crate::libxml2::XmlSchemaPtr;
use crate::schema::SchemaKind;

/// Cache key: the schema kind together with the root schema resource it
/// compiled from, so a catalog override never reuses a stale compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaCacheKey {
    pub kind: SchemaKind,
    pub file_name: String,
}

impl SchemaCacheKey {
    pub fn new(kind: SchemaKind, file_name: impl Into<String>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: u64,
}

/// In-memory cache of compiled schemas
///
/// Compiled schemas are read-only and shared across threads. `moka` makes
/// concurrent requests for the same key wait for a single compilation, and a
/// failed compilation is not cached, so the next request tries again.
#[derive(Clone)]
pub struct SchemaCache {
    cache: Cache<SchemaCacheKey, Arc<XmlSchemaPtr>>,
}

impl SchemaCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();

        Self { cache }
    }

    /// Get a compiled schema, or compile it with `loader` if missing.
    ///
    /// `loader` runs at most once per key among concurrent callers.
    pub fn get_or_compile<F>(
        &self,
        key: SchemaCacheKey,
        loader: F,
    ) -> Result<Arc<XmlSchemaPtr>, LibXml2Error>
    where
        F: FnOnce() -> Result<XmlSchemaPtr, LibXml2Error>,
    {
        let kind = key.kind;
        if let Some(schema) = self.cache.get(&key) {
            tracing::trace!(kind = %kind, "schema cache hit");
            return Ok(schema);
        }

        self.cache
            .try_get_with(key, || {
                tracing::debug!(kind = %kind, "compiling schema");
                loader().map(Arc::new)
            })
            .map_err(|e| (*e).clone())
    }

    pub fn get(&self, key: &SchemaCacheKey) -> Option<Arc<XmlSchemaPtr>> {
        self.cache.get(key)
    }

    pub fn contains(&self, key: &SchemaCacheKey) -> bool {
        self.cache.contains_key(key)
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libxml2::LibXml2Wrapper;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SIMPLE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root" type="xs:string"/>
</xs:schema>"#;

    #[test]
    fn test_compiles_once_per_key() {
        let cache = SchemaCache::new(8);
        let wrapper = LibXml2Wrapper::new();
        let compilations = AtomicUsize::new(0);
        let key = SchemaCacheKey::new(SchemaKind::WebApp30, "web-app_3_0.xsd");

        for _ in 0..3 {
            let schema = cache
                .get_or_compile(key.clone(), || {
                    compilations.fetch_add(1, Ordering::SeqCst);
                    wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes())
                })
                .unwrap();
            assert!(schema.is_valid());
        }

        assert_eq!(compilations.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&key));
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = SchemaCache::new(8);
        let key = SchemaCacheKey::new(SchemaKind::EjbJar31, "ejb-jar_3_1.xsd");

        let err = cache
            .get_or_compile(key.clone(), || Err(LibXml2Error::MemoryAllocation))
            .unwrap_err();
        assert_eq!(err, LibXml2Error::MemoryAllocation);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_keys_distinguish_resource_names() {
        let a = SchemaCacheKey::new(SchemaKind::WebApp30, "web-app_3_0.xsd");
        let b = SchemaCacheKey::new(SchemaKind::WebApp30, "custom-web-app.xsd");
        assert_ne!(a, b);
    }

    #[test]
    fn test_concurrent_access_single_compilation() {
        use rayon::prelude::*;

        let cache = SchemaCache::new(8);
        let compilations = AtomicUsize::new(0);
        let key = SchemaCacheKey::new(SchemaKind::Connector16, "connector_1_6.xsd");

        let ok = (0..16)
            .into_par_iter()
            .map(|_| {
                cache
                    .get_or_compile(key.clone(), || {
                        compilations.fetch_add(1, Ordering::SeqCst);
                        LibXml2Wrapper::new().parse_schema_from_memory(SIMPLE_XSD.as_bytes())
                    })
                    .is_ok()
            })
            .all(|ok| ok);

        assert!(ok);
        assert_eq!(compilations.load(Ordering::SeqCst), 1);
    }
}
