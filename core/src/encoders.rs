//! Value transformers applied when a model is projected to plain data.
//!
//! Encoders run in declaration order; each receives the previous one's
//! output. Closures of shape `Fn(Value) -> Result<Value, EncodeError>` are
//! encoders as well.

use std::sync::Arc;

use crate::error::EncodeError;
use crate::value::{ISO_FORMAT, Value};

/// A single encoding step.
pub trait Encoder: Send + Sync {
    fn encode(&self, value: Value) -> Result<Value, EncodeError>;
}

impl<F> Encoder for F
where
    F: Fn(Value) -> Result<Value, EncodeError> + Send + Sync,
{
    fn encode(&self, value: Value) -> Result<Value, EncodeError> {
        self(value)
    }
}

/// Projects a model instance to its plain mapping.
///
/// Anything that is not a model passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Model;

impl Encoder for Model {
    fn encode(&self, value: Value) -> Result<Value, EncodeError> {
        match value {
            Value::Model(model) => Ok(Value::Map(model.to_dict()?)),
            other => Ok(other),
        }
    }
}

/// Requires a list and runs every element through the inner encoders.
#[derive(Clone, Default)]
pub struct List {
    encoders: Vec<Arc<dyn Encoder>>,
}

impl List {
    pub fn new(encoders: Vec<Arc<dyn Encoder>>) -> Self {
        Self { encoders }
    }

    pub fn with(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoders.push(Arc::new(encoder));
        self
    }
}

impl Encoder for List {
    fn encode(&self, value: Value) -> Result<Value, EncodeError> {
        let items = match value {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => items,
            other => return Err(EncodeError::NotAList(other.kind_name().to_string())),
        };

        items
            .into_iter()
            .map(|item| {
                self.encoders
                    .iter()
                    .try_fold(item, |acc, encoder| encoder.encode(acc))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

/// List of models: every model element is projected, other elements are
/// kept as they are.
pub fn collection() -> List {
    List::default().with(Model)
}

/// Formats a datetime as text, ISO-8601 unless a strftime-style format is given.
#[derive(Debug, Clone, Default)]
pub struct DateTime {
    format: Option<String>,
}

impl DateTime {
    pub fn iso() -> Self {
        Self::default()
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
        }
    }
}

impl Encoder for DateTime {
    fn encode(&self, value: Value) -> Result<Value, EncodeError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::DateTime(dt) => {
                let format = self.format.as_deref().unwrap_or(ISO_FORMAT);
                Ok(Value::String(dt.format(format).to_string()))
            }
            other => Err(EncodeError::NotADateTime(other.kind_name().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{Field, Opaque, Schema};

    fn sample_datetime(micro: u32) -> Value {
        Value::from(
            NaiveDate::from_ymd_opt(2013, 2, 13)
                .unwrap()
                .and_hms_micro_opt(15, 55, 37, micro)
                .unwrap(),
        )
    }

    #[test]
    fn test_list_passes_plain_values_through() {
        let result = List::default().encode(Value::from(vec![1, 2, 3])).unwrap();
        assert_eq!(result, Value::from(vec![1, 2, 3]));
    }

    #[test]
    fn test_list_keeps_null() {
        assert_eq!(List::default().encode(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_list_rejects_non_list() {
        let err = List::default()
            .encode(Value::from(Opaque::new(())))
            .unwrap_err();
        assert_eq!(err, EncodeError::NotAList("opaque object".to_string()));
    }

    #[test]
    fn test_list_applies_inner_encoders_in_order() {
        let double = |v: Value| Ok::<_, EncodeError>(Value::from(v.as_i64().unwrap_or_default() * 2));
        let increment = |v: Value| Ok::<_, EncodeError>(Value::from(v.as_i64().unwrap_or_default() + 1));
        let encoder = List::default().with(double).with(increment);

        let result = encoder.encode(Value::from(vec![1, 2])).unwrap();
        assert_eq!(result, Value::from(vec![3, 5]));
    }

    #[test]
    fn test_collection_projects_models_and_keeps_others() {
        let user = Schema::builder("User")
            .field("name", Field::new().source("username"))
            .build()
            .unwrap();
        let foo = crate::Model::new(&user, [("name", "Foo")]).unwrap();

        let result = collection()
            .encode(Value::List(vec![Value::from(foo), Value::from("raw")]))
            .unwrap();

        assert_eq!(
            result,
            Value::List(vec![Value::map([("username", "Foo")]), Value::from("raw")])
        );
    }

    #[test]
    fn test_datetime_iso_and_custom_format() {
        assert_eq!(
            DateTime::iso().encode(sample_datetime(0)).unwrap(),
            Value::from("2013-02-13T15:55:37")
        );
        assert_eq!(
            DateTime::iso().encode(sample_datetime(12345)).unwrap(),
            Value::from("2013-02-13T15:55:37.012345")
        );
        assert_eq!(
            DateTime::with_format("%d/%m/%Y %H:%M:%S")
                .encode(sample_datetime(0))
                .unwrap(),
            Value::from("13/02/2013 15:55:37")
        );
        assert_eq!(DateTime::iso().encode(Value::Null).unwrap(), Value::Null);
    }
}
