//! Read-only reflection over schemas and model instances.
//!
//! ```
//! use modelkit_core::{Field, Schema, Value, inspect};
//!
//! let user = Schema::builder("User")
//!     .field("name", Field::string())
//!     .build()
//!     .unwrap();
//!
//! let fields = inspect(&user).unwrap().fields();
//! assert!(fields.contains_key("name"));
//! assert!(inspect(&Value::from("foo")).is_err());
//! ```

use std::sync::Arc;

use crate::error::InspectError;
use crate::model::Model;
use crate::schema::{FieldTable, Schema};
use crate::value::Value;

/// Things whose schema can be inspected.
pub trait Inspectable {
    fn inspected_schema(&self) -> Result<Arc<Schema>, InspectError>;
}

impl Inspectable for Arc<Schema> {
    fn inspected_schema(&self) -> Result<Arc<Schema>, InspectError> {
        Ok(Arc::clone(self))
    }
}

impl Inspectable for Model {
    fn inspected_schema(&self) -> Result<Arc<Schema>, InspectError> {
        Ok(Arc::clone(self.schema()))
    }
}

impl Inspectable for Value {
    fn inspected_schema(&self) -> Result<Arc<Schema>, InspectError> {
        match self {
            Value::Model(model) => model.inspected_schema(),
            other => Err(InspectError(other.kind_name().to_string())),
        }
    }
}

/// Reflection handle for one schema.
#[derive(Debug, Clone)]
pub struct ModelInspector {
    schema: Arc<Schema>,
}

impl ModelInspector {
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// A copy of the field registry. Changing the copy leaves the schema
    /// untouched.
    pub fn fields(&self) -> FieldTable {
        self.schema.fields().clone()
    }
}

/// Inspects a schema, a model instance, or a value holding a model.
pub fn inspect<T: Inspectable + ?Sized>(target: &T) -> Result<ModelInspector, InspectError> {
    Ok(ModelInspector {
        schema: target.inspected_schema()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn user() -> Arc<Schema> {
        Schema::builder("User")
            .field("name", Field::string())
            .field("email", Field::email())
            .build()
            .unwrap()
    }

    #[test]
    fn test_inspect_schema_and_instance_agree() {
        let user = user();
        let jack = Model::new(&user, [("name", "Jack")]).unwrap();

        let from_schema = inspect(&user).unwrap().fields();
        let from_model = inspect(&jack).unwrap().fields();
        assert_eq!(
            from_schema.keys().collect::<Vec<_>>(),
            from_model.keys().collect::<Vec<_>>()
        );
        assert_eq!(inspect(&Value::from(jack)).unwrap().name(), "User");
    }

    #[test]
    fn test_mutating_copy_leaves_schema_untouched() {
        let user = user();
        let mut fields = inspect(&user).unwrap().fields();
        fields.shift_remove("name");

        assert_eq!(fields.len(), 1);
        assert!(user.contains("name"));
    }

    #[test]
    fn test_non_model_value_is_rejected() {
        let err = inspect(&Value::from(1)).unwrap_err();
        assert_eq!(err, InspectError("integer".to_string()));
    }
}
