//! Name → schema resolution for deserialization.

use std::sync::Arc;

use indexmap::IndexMap;
use modelkit_core::Schema;
use tracing::debug;

/// Schemas known to the serializer, keyed by schema name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, schema: &Arc<Schema>) -> Self {
        self.register(schema);
        self
    }

    /// Registers `schema` under its name, returning the schema it replaced.
    pub fn register(&mut self, schema: &Arc<Schema>) -> Option<Arc<Schema>> {
        let previous = self
            .schemas
            .insert(schema.name().to_string(), Arc::clone(schema));
        if previous.is_some() {
            debug!(schema = %schema.name(), "Replaced registered schema");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Returns `true` if exactly this schema is registered under its name.
    pub fn contains(&self, schema: &Arc<Schema>) -> bool {
        self.schemas
            .get(schema.name())
            .is_some_and(|registered| Arc::ptr_eq(registered, schema))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let user = Schema::builder("User").build().unwrap();
        let registry = Registry::new().with(&user);

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&user));
        assert!(Arc::ptr_eq(registry.get("User").unwrap(), &user));
        assert!(registry.get("Group").is_none());
    }

    #[test]
    fn test_same_name_replaces_and_identity_matters() {
        let first = Schema::builder("User").build().unwrap();
        let second = Schema::builder("User").build().unwrap();
        let mut registry = Registry::new().with(&first);

        let previous = registry.register(&second).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));
        assert!(!registry.contains(&first));
        assert!(registry.contains(&second));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["User"]);
    }
}
