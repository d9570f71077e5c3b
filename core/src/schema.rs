//! Schema definition and field-table merging.
//!
//! A [`Schema`] is an immutable, ordered name → [`Field`] table built once by
//! a [`SchemaBuilder`]. Builders compose tables from parent schemas and
//! [`Mixin`]s, then apply the schema's own declarations on top.
//!
//! Merge rules:
//!
//! - Included sources (`extends` and `mixin`) are applied in call order;
//!   a later source overrides an earlier one by name.
//! - Own fields are applied last and override every included field.
//! - Inherited fields that are not overridden keep their identity: the
//!   `Arc<Field>` is shared with the source it came from.
//! - The registry keeps first-declaration order; an override replaces the
//!   entry in place.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modelkit_core::{Field, Mixin, Schema};
//!
//! let timestamps = Mixin::builder("Timestamps")
//!     .field("created", Field::datetime())
//!     .build()
//!     .unwrap();
//!
//! let parent = Schema::builder("Parent")
//!     .field("name", Field::string())
//!     .field("email", Field::email())
//!     .build()
//!     .unwrap();
//!
//! let child = Schema::builder("Child")
//!     .extends(&parent)
//!     .mixin(&timestamps)
//!     .field("name", Field::string().required())
//!     .build()
//!     .unwrap();
//!
//! let names: Vec<_> = child.fields().keys().map(String::as_str).collect();
//! assert_eq!(names, ["name", "email", "created"]);
//! assert!(!Arc::ptr_eq(&child.fields()["name"], &parent.fields()["name"]));
//! assert!(Arc::ptr_eq(&child.fields()["email"], &parent.fields()["email"]));
//! assert!(child.is_subschema_of(&parent));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ConfigError, DecodeError, FieldError};
use crate::field::Field;
use crate::value::Map;

/// Ordered field registry.
pub type FieldTable = IndexMap<String, Arc<Field>>;

/// The field registry of one model type.
pub struct Schema {
    name: String,
    fields: FieldTable,
    bases: Vec<Arc<Schema>>,
}

impl Schema {
    /// Starts a new schema definition.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            collector: Collector::new(name.into()),
            bases: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields, own and inherited, in registry order.
    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Arc<Field>> {
        self.fields.get(name)
    }

    /// Looks up a field, failing with a [`FieldError`] naming this schema.
    pub fn try_field(&self, name: &str) -> Result<&Arc<Field>, FieldError> {
        self.fields
            .get(name)
            .ok_or_else(|| FieldError::new(&self.name, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Schemas passed to [`SchemaBuilder::extends`], in call order.
    pub fn bases(&self) -> &[Arc<Schema>] {
        &self.bases
    }

    /// Returns `true` if this schema is `other` or extends it, directly or
    /// through any chain of parents.
    pub fn is_subschema_of(&self, other: &Arc<Schema>) -> bool {
        std::ptr::eq(self, Arc::as_ptr(other)) || self.bases.iter().any(|base| base.is_subschema_of(other))
    }

    /// Decodes raw external data into keyword data for this schema.
    ///
    /// Each field reads its external key (`source` or name). Missing keys
    /// are skipped; unknown raw keys are ignored. The output is keyed by
    /// field name and includes read-only fields.
    pub fn decode(&self, raw: &Map) -> Result<Map, DecodeError> {
        let mut decoded = Map::with_capacity(self.fields.len());
        for (name, field) in &self.fields {
            if let Some(value) = raw.get(field.external_name()) {
                decoded.insert(name.clone(), field.decode(value.clone())?);
            }
        }
        Ok(decoded)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field(
                "bases",
                &self.bases.iter().map(|base| base.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A named set of fields that schemas can include but that cannot be
/// instantiated on its own.
pub struct Mixin {
    name: String,
    fields: FieldTable,
}

impl Mixin {
    pub fn builder(name: impl Into<String>) -> MixinBuilder {
        MixinBuilder {
            collector: Collector::new(name.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds a [`Schema`].
#[must_use]
pub struct SchemaBuilder {
    collector: Collector,
    bases: Vec<Arc<Schema>>,
}

impl SchemaBuilder {
    /// Inherits every field of `parent`.
    pub fn extends(mut self, parent: &Arc<Schema>) -> Self {
        self.collector.include(parent.name(), parent.fields());
        self.bases.push(Arc::clone(parent));
        self
    }

    /// Includes every field of `mixin`.
    pub fn mixin(mut self, mixin: &Arc<Mixin>) -> Self {
        self.collector.include(mixin.name(), mixin.fields());
        self
    }

    /// Declares an own field.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.collector.declare(name.into(), field);
        self
    }

    /// Declares an own field holding one nested model of `schema`.
    pub fn nested(self, name: impl Into<String>, schema: &Arc<Schema>) -> Self {
        self.field(name, Field::embedded(schema))
    }

    pub fn build(self) -> Result<Arc<Schema>, ConfigError> {
        let (name, fields) = self.collector.finish()?;
        Ok(Arc::new(Schema {
            name,
            fields,
            bases: self.bases,
        }))
    }
}

/// Builds a [`Mixin`].
#[must_use]
pub struct MixinBuilder {
    collector: Collector,
}

impl MixinBuilder {
    /// Includes every field of another mixin.
    pub fn mixin(mut self, mixin: &Arc<Mixin>) -> Self {
        self.collector.include(mixin.name(), mixin.fields());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.collector.declare(name.into(), field);
        self
    }

    pub fn build(self) -> Result<Arc<Mixin>, ConfigError> {
        let (name, fields) = self.collector.finish()?;
        Ok(Arc::new(Mixin { name, fields }))
    }
}

/// Accumulates included tables and own declarations.
struct Collector {
    name: String,
    fields: FieldTable,
    own: Vec<(String, Field)>,
}

impl Collector {
    fn new(name: String) -> Self {
        Self {
            name,
            fields: FieldTable::new(),
            own: Vec::new(),
        }
    }

    fn include(&mut self, source: &str, table: &FieldTable) {
        for (name, field) in table {
            if let Some(previous) = self.fields.insert(name.clone(), Arc::clone(field)) {
                if !Arc::ptr_eq(&previous, field) {
                    debug!(schema = %self.name, field = %name, source, "Included field overrides earlier one");
                }
            }
        }
    }

    fn declare(&mut self, name: String, field: Field) {
        self.own.push((name, field));
    }

    fn finish(mut self) -> Result<(String, FieldTable), ConfigError> {
        let mut seen = HashSet::new();
        for (name, field) in std::mem::take(&mut self.own) {
            if name.is_empty() {
                return Err(ConfigError::EmptyFieldName { schema: self.name });
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateField {
                    schema: self.name,
                    field: name,
                });
            }

            let field = Arc::new(field.bind(&name)?);
            if self.fields.insert(name.clone(), field).is_some() {
                debug!(schema = %self.name, field = %name, "Own field overrides inherited one");
            }
        }

        debug!(
            schema = %self.name,
            fields = ?self.fields.keys().collect::<Vec<_>>(),
            "Collected schema fields"
        );
        Ok((self.name, self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn parent() -> Arc<Schema> {
        Schema::builder("Parent")
            .field("name", Field::string())
            .field("email", Field::email())
            .build()
            .unwrap()
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = Schema::builder("User")
            .field("login", Field::string())
            .field("name", Field::string())
            .field("karma", Field::integer())
            .build()
            .unwrap();

        let names: Vec<_> = schema.fields().keys().cloned().collect();
        assert_eq!(names, vec!["login", "name", "karma"]);
        assert_eq!(schema.fields()["karma"].name(), "karma");
    }

    #[test]
    fn test_child_override_has_new_identity() {
        let parent = parent();
        let child = Schema::builder("Child")
            .extends(&parent)
            .field("name", Field::string().required())
            .build()
            .unwrap();

        assert!(!Arc::ptr_eq(child.field("name").unwrap(), parent.field("name").unwrap()));
        assert!(Arc::ptr_eq(child.field("email").unwrap(), parent.field("email").unwrap()));
        assert!(child.field("name").unwrap().is_required());
    }

    #[test]
    fn test_later_mixin_overrides_earlier() {
        let first = Mixin::builder("First")
            .field("token", Field::string())
            .build()
            .unwrap();
        let second = Mixin::builder("Second")
            .field("token", Field::integer())
            .build()
            .unwrap();

        let schema = Schema::builder("Session")
            .mixin(&first)
            .mixin(&second)
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(schema.field("token").unwrap(), second.fields().get("token").unwrap()));
    }

    #[test]
    fn test_mixin_can_include_mixin() {
        let base = Mixin::builder("Base").field("id", Field::integer()).build().unwrap();
        let audit = Mixin::builder("Audit")
            .mixin(&base)
            .field("author", Field::string())
            .build()
            .unwrap();

        let names: Vec<_> = audit.fields().keys().cloned().collect();
        assert_eq!(names, vec!["id", "author"]);
    }

    #[test]
    fn test_duplicate_own_field_is_rejected() {
        let err = Schema::builder("User")
            .field("name", Field::string())
            .field("name", Field::integer())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateField {
                schema: "User".to_string(),
                field: "name".to_string()
            }
        );
    }

    #[test]
    fn test_empty_field_name_is_rejected() {
        let err = Schema::builder("User").field("", Field::new()).build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFieldName { .. }));
    }

    #[test]
    fn test_subschema_follows_parent_chain() {
        let parent = parent();
        let child = Schema::builder("Child").extends(&parent).build().unwrap();
        let grandchild = Schema::builder("GrandChild").extends(&child).build().unwrap();
        let unrelated = Schema::builder("Unrelated").build().unwrap();

        assert!(grandchild.is_subschema_of(&parent));
        assert!(grandchild.is_subschema_of(&grandchild));
        assert!(!parent.is_subschema_of(&child));
        assert!(!unrelated.is_subschema_of(&parent));
    }

    #[test]
    fn test_decode_maps_sources_and_skips_missing_keys() {
        let schema = Schema::builder("User")
            .field("name", Field::string().source("username"))
            .field("role", Field::string())
            .field("id", Field::integer().read_only())
            .build()
            .unwrap();

        let raw = Value::map([("username", Value::from("Jack")), ("id", Value::from(7)), ("extra", Value::from(true))]);
        let decoded = schema.decode(raw.as_map().unwrap()).unwrap();

        assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["name", "id"]);
        assert_eq!(decoded["name"], Value::from("Jack"));
        assert_eq!(decoded["id"], Value::from(7));
    }

    #[test]
    fn test_try_field_names_schema_and_key() {
        let err = parent().try_field("foo").unwrap_err();
        assert_eq!(err.to_string(), "'Parent' model has no field 'foo'");
    }

    #[test]
    fn test_nested_wraps_schema_into_embedded_field() {
        let address = Schema::builder("Address").field("city", Field::string()).build().unwrap();
        let person = Schema::builder("Person").nested("address", &address).build().unwrap();

        assert!(matches!(
            person.field("address").unwrap().kind(),
            crate::FieldKind::Embedded(schema) if Arc::ptr_eq(schema, &address)
        ));
    }
}
