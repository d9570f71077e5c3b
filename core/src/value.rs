//! Dynamic values stored in model fields.
//!
//! Fields are untyped slots: a `String` field may hold an integer until the
//! model is validated. [`Value`] is the closed set of shapes a slot can hold,
//! including nested [`Model`] handles and [`Opaque`] foreign objects that the
//! engine stores but never interprets.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::EncodeError;
use crate::model::Model;

/// Insertion-ordered string-keyed mapping, the plain-data form of a model.
pub type Map = IndexMap<String, Value>;

/// ISO-8601 layout used when a datetime has to become text.
pub(crate) const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A field value.
///
/// Data variants compare structurally; [`Value::Model`] and [`Value::Opaque`]
/// compare by identity.
///
/// # Examples
///
/// ```
/// use modelkit_core::Value;
///
/// let v = Value::from("admin");
/// assert_eq!(v.as_str(), Some("admin"));
/// assert_ne!(Value::from(1), Value::from(1.0));
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Map(Map),
    /// Shared handle to a model instance.
    Model(Model),
    /// Foreign object stored as-is.
    Opaque(Opaque),
}

impl Value {
    /// Builds a [`Value::Map`] from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Model(_) => "model",
            Value::Opaque(_) => "opaque object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Value::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(obj) => Some(obj),
            _ => None,
        }
    }

    /// Converts to a JSON value.
    ///
    /// Datetimes become ISO-8601 strings and nested models are projected
    /// through [`Model::to_dict`]. Opaque objects and non-finite floats have
    /// no JSON form and fail with [`EncodeError::NotRepresentable`].
    pub fn to_json(&self) -> Result<JsonValue, EncodeError> {
        Ok(match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .ok_or_else(|| EncodeError::NotRepresentable(format!("float {f}")))?,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::DateTime(dt) => JsonValue::String(dt.format(ISO_FORMAT).to_string()),
            Value::List(items) => JsonValue::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Map(map) => JsonValue::Object(map_to_json(map)?),
            Value::Model(model) => JsonValue::Object(map_to_json(&model.to_dict()?)?),
            Value::Opaque(obj) => {
                return Err(EncodeError::NotRepresentable(obj.type_name().to_string()));
            }
        })
    }

    /// Converts from a JSON value. Integral numbers that fit `i64` become
    /// [`Value::Integer`], every other number becomes [`Value::Float`].
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

pub(crate) fn map_to_json(map: &Map) -> Result<serde_json::Map<String, JsonValue>, EncodeError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
        .collect()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format(ISO_FORMAT)),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Model(model) => fmt::Debug::fmt(model, f),
            Value::Opaque(obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

/// A foreign object stored in a field without interpretation.
///
/// Cloning shares the object. Equality is identity.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Rust type name of the wrapped object.
    pub fn type_name(&self) -> &str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        Value::Model(model)
    }
}

impl From<Opaque> for Value {
    fn from(obj: Opaque) -> Self {
        Value::Opaque(obj)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_integer_and_float_are_distinct() {
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from(1), Value::Integer(1));
    }

    #[test]
    fn test_opaque_equality_is_identity() {
        let a = Opaque::new(42u8);
        let b = Opaque::new(42u8);
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn test_option_none_is_null() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_null());
    }

    #[test]
    fn test_to_json_formats_datetime_as_iso() {
        let dt = NaiveDate::from_ymd_opt(2013, 2, 13)
            .unwrap()
            .and_hms_opt(15, 55, 37)
            .unwrap();
        let json = Value::from(dt).to_json().unwrap();
        assert_eq!(json, JsonValue::String("2013-02-13T15:55:37".into()));
    }

    #[test]
    fn test_to_json_rejects_opaque() {
        let err = Value::from(Opaque::new(())).to_json().unwrap_err();
        assert!(matches!(err, EncodeError::NotRepresentable(_)));
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let json: JsonValue = serde_json::from_str(r#"{"b": 1, "a": [2.5, null]}"#).unwrap();
        let value = Value::from_json(json);
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(
            map["a"],
            Value::List(vec![Value::Float(2.5), Value::Null])
        );
    }
}
