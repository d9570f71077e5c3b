//! Field validators.
//!
//! A validator inspects a value and either passes silently or fails with a
//! [`ValidationError`] describing the violated rule. Any closure of shape
//! `Fn(&Value) -> Result<(), ValidationError>` is a validator too.
//!
//! Type validators ([`Str`], [`Integer`], [`Float`], [`Boolean`],
//! [`DateTime`], [`Model`], [`List`] and the pattern validators) accept
//! [`Value::Null`]: absence is [`Required`]'s business.
//!
//! # Examples
//!
//! ```
//! use modelkit_core::validators::{Email, Validator};
//! use modelkit_core::Value;
//!
//! assert!(Email.validate(&Value::from("foo2bar@example.com")).is_ok());
//! let err = Email.validate(&Value::from("@localhost")).unwrap_err();
//! assert_eq!(err.message, "should be a valid email");
//! ```

use std::net::IpAddr;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::ValidationError;
use crate::schema::Schema;
use crate::value::Value;

/// A single validation rule.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self(value)
    }
}

/// Fails if the value is null.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator for Required {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            return Err(ValidationError::new("is required"));
        }
        Ok(())
    }
}

/// Fails if the value is not equal to one of the configured choices.
///
/// Null is not skipped: an unset field with choices fails unless null is
/// itself a choice.
#[derive(Debug, Clone)]
pub struct In {
    choices: Vec<Value>,
}

impl In {
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn choices(&self) -> &[Value] {
        &self.choices
    }
}

impl Validator for In {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if !self.choices.contains(value) {
            return Err(ValidationError::new(format!(
                "should be in {:?}",
                self.choices
            )));
        }
        Ok(())
    }
}

macro_rules! kind_validator {
    ($(#[$doc:meta])* $name:ident, $pattern:pat, $message:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Validator for $name {
            fn validate(&self, value: &Value) -> Result<(), ValidationError> {
                match value {
                    Value::Null | $pattern => Ok(()),
                    _ => Err(ValidationError::new($message)),
                }
            }
        }
    };
}

kind_validator!(
    /// Value must be a string.
    Str,
    Value::String(_),
    "should be a string"
);
kind_validator!(
    /// Value must be an integer.
    Integer,
    Value::Integer(_),
    "should be an integer"
);
kind_validator!(
    /// Value must be a float. Integers are rejected.
    Float,
    Value::Float(_),
    "should be a float"
);
kind_validator!(
    /// Value must be a boolean.
    Boolean,
    Value::Bool(_),
    "should be a boolean"
);
kind_validator!(
    /// Value must be a datetime.
    DateTime,
    Value::DateTime(_),
    "should be a datetime"
);

/// Value must be an instance of the given schema (or one derived from it),
/// and must itself validate.
///
/// The first failure inside the nested model is propagated unchanged.
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

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl Validator for Model {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Null => Ok(()),
            Value::Model(model) if model.schema().is_subschema_of(&self.schema) => {
                model.validate_nested()
            }
            _ => Err(ValidationError::new(format!(
                "should be an instance of '{}'",
                self.schema.name()
            ))),
        }
    }
}

/// Value must be a list; each element is checked against every inner
/// validator in order.
#[derive(Clone, Default)]
pub struct List {
    validators: Vec<Arc<dyn Validator>>,
}

impl List {
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Self { validators }
    }

    /// Adds an inner validator applied to every element.
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }
}

impl Validator for List {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let items = match value {
            Value::Null => return Ok(()),
            Value::List(items) => items,
            _ => return Err(ValidationError::new("should be a list")),
        };

        for item in items {
            for validator in &self.validators {
                validator.validate(item)?;
            }
        }
        Ok(())
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+$").expect("static regex must compile"));

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("static regex must compile")
});

static URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9+.-]+)://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
        .expect("static regex must compile")
});

fn string_matching<'a>(value: &'a Value) -> Result<Option<&'a str>, ValidationError> {
    Str.validate(value)?;
    Ok(value.as_str())
}

/// Value must be a string shaped like `local@domain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Validator for Email {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match string_matching(value)? {
            Some(s) if !EMAIL_RE.is_match(s) => {
                Err(ValidationError::new("should be a valid email"))
            }
            _ => Ok(()),
        }
    }
}

/// Value must be an http(s) URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl Validator for Url {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match string_matching(value)? {
            Some(s) if !URL_RE.is_match(s) => Err(ValidationError::new("should be a valid URL")),
            _ => Ok(()),
        }
    }
}

/// Value must be a `scheme://...` URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uri;

impl Validator for Uri {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match string_matching(value)? {
            Some(s) if !URI_RE.is_match(s) => Err(ValidationError::new("should be a valid URI")),
            _ => Ok(()),
        }
    }
}

/// Value must be an IPv4 or IPv6 address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ip;

impl Validator for Ip {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match string_matching(value)? {
            Some(s) if s.parse::<IpAddr>().is_err() => Err(ValidationError::new(
                "should be a valid IPv4 or IPv6 address",
            )),
            _ => Ok(()),
        }
    }
}
