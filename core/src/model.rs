//! Model instances.
//!
//! A [`Model`] is a shared handle to one record of a [`Schema`]. Cloning the
//! handle shares the record; equality is identity. Values are read and
//! written through the schema's fields, so unknown names fail with a
//! [`FieldError`] and defaults are resolved lazily on first read.
//!
//! Assignment never validates. Call [`Model::validate`] or
//! [`Model::validation_errors`] explicitly.
//!
//! # Example
//!
//! ```
//! use modelkit_core::{Field, Model, Schema, Value};
//!
//! let user = Schema::builder("User")
//!     .field("login", Field::string().required())
//!     .field("karma", Field::integer())
//!     .build()
//!     .unwrap();
//!
//! let root = Model::new(&user, [("login", Value::from("root")), ("karma", Value::from("max"))]).unwrap();
//! let err = root.validate().unwrap_err();
//! assert_eq!(err.to_string(), "karma should be an integer");
//!
//! root.set("karma", 42).unwrap();
//! assert!(root.is_valid());
//! assert_eq!(root.to_json().unwrap(), r#"{"login":"root","karma":42}"#);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::warn;

use crate::error::{EncodeError, FieldError, Result, ValidationError};
use crate::guard::{Walk, WalkGuard};
use crate::json::JsonOptions;
use crate::schema::Schema;
use crate::value::{Map, Value, map_to_json};

struct ModelInner {
    schema: Arc<Schema>,
    data: RwLock<Map>,
}

/// Shared handle to one model instance.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Creates an instance and assigns `values` in order.
    ///
    /// Fails with a [`FieldError`] on the first name the schema does not
    /// declare. Unassigned fields resolve to their defaults when read.
    pub fn new<K, V, I>(schema: &Arc<Schema>, values: I) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let model = Self::empty(schema);
        model.update(values)?;
        Ok(model)
    }

    /// Creates an instance with every field unset.
    pub fn empty(schema: &Arc<Schema>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                schema: Arc::clone(schema),
                data: RwLock::new(Map::new()),
            }),
        }
    }

    /// Creates an instance from an already-built mapping, such as the
    /// output of [`Schema::decode`].
    pub fn from_map(schema: &Arc<Schema>, values: Map) -> Result<Self> {
        Self::new(schema, values)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    /// Returns `true` if both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reads a field, resolving its default on first access.
    pub fn get(&self, name: &str) -> std::result::Result<Value, FieldError> {
        let field = self.inner.schema.try_field(name)?;
        Ok(field.read(self))
    }

    /// Assigns a field without validating the value.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.inner.schema.try_field(name)?;
        field.write(self, value.into())
    }

    /// Assigns several fields in order, stopping at the first unknown name.
    /// Fields assigned before the failure keep their new values.
    pub fn update<K, V, I>(&self, values: I) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Assigns every entry of `values`.
    pub fn update_from(&self, values: &Map) -> Result<()> {
        self.update(values.iter().map(|(name, value)| (name, value.clone())))
    }

    pub(crate) fn stored(&self, name: &str) -> Option<Value> {
        self.inner.data.read().get(name).cloned()
    }

    pub(crate) fn store(&self, name: &str, value: Value) {
        self.inner.data.write().insert(name.to_string(), value);
    }

    /// Stores `value` unless the slot was filled meanwhile; returns what
    /// the slot holds afterwards.
    pub(crate) fn store_if_absent(&self, name: &str, value: Value) -> Value {
        self.inner
            .data
            .write()
            .entry(name.to_string())
            .or_insert(value)
            .clone()
    }

    /// Validates every field in registry order and returns the first
    /// failure, prefixed with the field name (`"login is required"`).
    ///
    /// Errors raised inside nested models carry a dotted path
    /// (`"address.city should be a string"`).
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let Some(_guard) = WalkGuard::enter(self.addr(), Walk::Validate) else {
            return Ok(());
        };

        for (name, field) in self.inner.schema.fields() {
            let value = field.read(self);
            field
                .validate(&value)
                .map_err(|err| attach_field(name, err))?;
        }
        Ok(())
    }

    /// Validation entry point for a model nested inside another one.
    ///
    /// An instance that is already being validated further up the current
    /// path passes; its own frame reports its errors.
    pub(crate) fn validate_nested(&self) -> std::result::Result<(), ValidationError> {
        self.validate()
    }

    /// Validates every field and collects the first failure of each, keyed
    /// by field name. Empty when the instance is valid.
    pub fn validation_errors(&self) -> IndexMap<String, String> {
        let Some(_guard) = WalkGuard::enter(self.addr(), Walk::Validate) else {
            return IndexMap::new();
        };

        self.inner
            .schema
            .fields()
            .iter()
            .filter_map(|(name, field)| {
                let value = field.read(self);
                field
                    .validate(&value)
                    .err()
                    .map(|err| (name.clone(), err.to_string()))
            })
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Projects the instance to plain data keyed by external names.
    ///
    /// Read-only fields are omitted. Each value goes through its field's
    /// encoders; nested models, lists and mappings left in the result are
    /// projected recursively. Fails with [`EncodeError::Cycle`] if the
    /// instance is reached again while it is being encoded.
    pub fn to_dict(&self) -> std::result::Result<Map, EncodeError> {
        let schema = &self.inner.schema;
        let Some(_guard) = WalkGuard::enter(self.addr(), Walk::Encode) else {
            warn!(model = %schema.name(), "Circular reference while encoding model");
            return Err(EncodeError::Cycle(schema.name().to_string()));
        };

        let mut encoded = Map::with_capacity(schema.fields().len());
        for field in schema.fields().values() {
            if field.is_read_only() {
                continue;
            }
            let value = field.encode(field.read(self))?;
            encoded.insert(field.external_name().to_string(), project(value)?);
        }
        Ok(encoded)
    }

    /// Same as [`Model::to_dict`].
    pub fn encode(&self) -> std::result::Result<Map, EncodeError> {
        self.to_dict()
    }

    /// Serializes [`Model::to_dict`] as compact JSON in registry order.
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(&JsonOptions::default())
    }

    /// Serializes [`Model::to_dict`] as JSON with formatting options.
    pub fn to_json_with(&self, options: &JsonOptions) -> Result<String> {
        let json = serde_json::Value::Object(map_to_json(&self.to_dict()?)?);
        options.render(json)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

fn attach_field(name: &str, err: ValidationError) -> ValidationError {
    match err.field {
        Some(inner) => ValidationError {
            field: Some(format!("{name}.{inner}")),
            message: err.message,
        },
        None => err.with_field(name),
    }
}

fn project(value: Value) -> std::result::Result<Value, EncodeError> {
    match value {
        Value::Model(model) => model.to_dict().map(Value::Map),
        Value::List(items) => items
            .into_iter()
            .map(project)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List),
        Value::Map(entries) => entries
            .into_iter()
            .map(|(key, value)| Ok((key, project(value)?)))
            .collect::<std::result::Result<Map, _>>()
            .map(Value::Map),
        other => Ok(other),
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = &self.inner.schema;
        let mut out = f.debug_struct(schema.name());

        let Some(_guard) = WalkGuard::enter(self.addr(), Walk::Format) else {
            return out.finish_non_exhaustive();
        };

        let data = self.inner.data.read().clone();
        for name in schema.fields().keys() {
            if let Some(value) = data.get(name) {
                out.field(name, value);
            }
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn user() -> Arc<Schema> {
        Schema::builder("User")
            .field("name", Field::string())
            .field("email", Field::email())
            .field("karma", Field::integer())
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_unknown_field() {
        let err = Model::new(&user(), [("foo", "bar")]).unwrap_err();
        assert_eq!(err.to_string(), "'User' model has no field 'foo'");
    }

    #[test]
    fn test_get_and_set_reject_unknown_field() {
        let jack = Model::new(&user(), [("name", "Jack")]).unwrap();
        assert!(jack.get("foo").is_err());
        assert!(jack.set("foo", "bar").is_err());
        assert_eq!(jack.get("name").unwrap(), Value::from("Jack"));
    }

    #[test]
    fn test_unset_field_without_default_is_null() {
        assert_eq!(Model::empty(&user()).get("email").unwrap(), Value::Null);
    }

    #[test]
    fn test_update_keeps_values_assigned_before_failure() {
        let jack = Model::empty(&user());
        let err = jack
            .update([("name", Value::from("Jack")), ("foo", Value::from(1))])
            .unwrap_err();

        assert!(matches!(err, crate::Error::Field(_)));
        assert_eq!(jack.get("name").unwrap(), Value::from("Jack"));
    }

    #[test]
    fn test_update_from_map() {
        let jack = Model::empty(&user());
        let Value::Map(values) = Value::map([("name", Value::from("Jack")), ("karma", Value::from(3))]) else {
            unreachable!()
        };
        jack.update_from(&values).unwrap();
        assert_eq!(jack.get("karma").unwrap(), Value::from(3));
    }

    #[test]
    fn test_assignment_does_not_validate() {
        let jack = Model::empty(&user());
        jack.set("karma", "lots").unwrap();
        assert_eq!(jack.get("karma").unwrap(), Value::from("lots"));
        assert!(jack.validate().is_err());
    }

    #[test]
    fn test_validation_errors_collects_one_per_field() {
        let jack = Model::new(
            &user(),
            [("name", Value::from(1)), ("email", Value::from("jack")), ("karma", Value::from(2))],
        )
        .unwrap();

        let errors = jack.validation_errors();
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["name", "email"]);
        assert_eq!(errors["name"], "should be a string");
        assert!(!jack.is_valid());
    }

    #[test]
    fn test_validation_errors_is_empty_when_valid() {
        let jack = Model::new(&user(), [("name", "Jack")]).unwrap();
        assert!(jack.validation_errors().is_empty());
        assert!(jack.is_valid());
    }

    #[test]
    fn test_to_dict_is_idempotent() {
        let jack = Model::new(&user(), [("name", "Jack")]).unwrap();
        assert_eq!(jack.to_dict().unwrap(), jack.to_dict().unwrap());
        assert_eq!(jack.encode().unwrap(), jack.to_dict().unwrap());
    }

    #[test]
    fn test_equality_is_identity() {
        let a = Model::new(&user(), [("name", "Jack")]).unwrap();
        let b = Model::new(a.schema(), [("name", "Jack")]).unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_lists_assigned_fields() {
        let jack = Model::new(&user(), [("name", "Jack")]).unwrap();
        assert_eq!(format!("{:?}", jack), r#"User { name: "Jack" }"#);
    }

    #[test]
    fn test_to_json_with_indent_and_sorted_keys() {
        let jack = Model::new(&user(), [("name", Value::from("Jack")), ("karma", Value::from(1))]).unwrap();
        let options = JsonOptions {
            indent: Some(2),
            sort_keys: true,
        };

        let json = jack.to_json_with(&options).unwrap();
        assert_eq!(
            json,
            "{\n  \"email\": null,\n  \"karma\": 1,\n  \"name\": \"Jack\"\n}"
        );
    }
}
