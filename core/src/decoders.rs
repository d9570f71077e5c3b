//! Value transformers applied when raw external data is decoded.
//!
//! Decoders mirror [`encoders`](crate::encoders): they run in declaration
//! order, skip null, and closures of shape
//! `Fn(Value) -> Result<Value, DecodeError>` qualify.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::DecodeError;
use crate::schema::Schema;
use crate::value::{ISO_FORMAT, Value};

/// A single decoding step.
pub trait Decoder: Send + Sync {
    fn decode(&self, value: Value) -> Result<Value, DecodeError>;
}

impl<F> Decoder for F
where
    F: Fn(Value) -> Result<Value, DecodeError> + Send + Sync,
{
    fn decode(&self, value: Value) -> Result<Value, DecodeError> {
        self(value)
    }
}

fn unexpected(expected: &str, found: &Value) -> DecodeError {
    DecodeError::UnexpectedType {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

/// Decodes a raw mapping through a schema's [`Schema::decode`].
///
/// The result is a decoded mapping, not a model instance.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<Schema>,
}

impl Model {
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
        }
    }
}

impl Decoder for Model {
    fn decode(&self, value: Value) -> Result<Value, DecodeError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Map(raw) => Ok(Value::Map(self.schema.decode(&raw)?)),
            other => Err(unexpected("map", &other)),
        }
    }
}

/// Decodes every mapping element of a list through a schema; other
/// elements pass through.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: Arc<Schema>,
}

impl Collection {
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
        }
    }
}

impl Decoder for Collection {
    fn decode(&self, value: Value) -> Result<Value, DecodeError> {
        let items = match value {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => items,
            other => return Err(unexpected("list", &other)),
        };

        items
            .into_iter()
            .map(|item| match item {
                Value::Map(raw) => self.schema.decode(&raw).map(Value::Map),
                other => Ok(other),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

/// Parses text into a datetime.
///
/// Without an explicit format, accepts `%Y-%m-%dT%H:%M:%S` with optional
/// fractional seconds.
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

impl Decoder for DateTime {
    fn decode(&self, value: Value) -> Result<Value, DecodeError> {
        let text = match value {
            Value::Null => return Ok(Value::Null),
            Value::String(text) => text,
            other => return Err(unexpected("string", &other)),
        };

        let format = self.format.as_deref().unwrap_or(ISO_FORMAT);
        NaiveDateTime::parse_from_str(&text, format)
            .map(Value::DateTime)
            .map_err(|_| DecodeError::InvalidFormat {
                value: text,
                format: format.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::Field;

    fn datetime(micro: u32) -> Value {
        Value::from(
            NaiveDate::from_ymd_opt(2013, 2, 13)
                .unwrap()
                .and_hms_micro_opt(15, 55, 37, micro)
                .unwrap(),
        )
    }

    fn user_schema() -> Arc<Schema> {
        Schema::builder("User")
            .field("name", Field::new().source("username"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_datetime_from_iso() {
        let decoded = DateTime::iso()
            .decode(Value::from("2013-02-13T15:55:37"))
            .unwrap();
        assert_eq!(decoded, datetime(0));
    }

    #[test]
    fn test_datetime_from_iso_with_microseconds() {
        let decoded = DateTime::iso()
            .decode(Value::from("2013-02-13T15:55:37.012345"))
            .unwrap();
        assert_eq!(decoded, datetime(12345));
    }

    #[test]
    fn test_datetime_with_custom_format() {
        let decoded = DateTime::with_format("%d/%m/%Y %H:%M:%S")
            .decode(Value::from("13/02/2013 15:55:37"))
            .unwrap();
        assert_eq!(decoded, datetime(0));
    }

    #[test]
    fn test_datetime_rejects_malformed_text() {
        let err = DateTime::iso()
            .decode(Value::from("invalid datetime string"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFormat { .. }));
        assert_eq!(DateTime::iso().decode(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_model_decoder_returns_decoded_mapping() {
        let decoded = Model::new(&user_schema())
            .decode(Value::map([("username", "Foo")]))
            .unwrap();
        assert_eq!(decoded, Value::map([("name", "Foo")]));
    }

    #[test]
    fn test_collection_decoder_maps_each_element() {
        let raw = Value::List(vec![
            Value::map([("username", "Foo")]),
            Value::map([("username", "Bar")]),
        ]);
        let decoded = Collection::new(&user_schema()).decode(raw).unwrap();
        assert_eq!(
            decoded,
            Value::List(vec![
                Value::map([("name", "Foo")]),
                Value::map([("name", "Bar")]),
            ])
        );
    }

    #[test]
    fn test_collection_decoder_rejects_non_list() {
        let err = Collection::new(&user_schema())
            .decode(Value::from("nope"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedType { .. }));
    }
}
