//! Declarative data models with validation and plain-data projection.
//!
//! This crate provides the model engine:
//!
//! - [`Field`]: metadata for one attribute, covering its default, validator
//!   chain, encoders and decoders.
//! - [`Schema`]: an immutable, ordered field registry built with
//!   [`Schema::builder`], composed from parent schemas and [`Mixin`]s.
//! - [`Model`]: a record of a schema with dict-like access, validation
//!   and projection to plain data ([`Model::to_dict`], [`Schema::decode`]).
//! - [`Value`]: the dynamic values fields hold.
//!
//! Validators, encoders and decoders live in the [`validators`],
//! [`encoders`] and [`decoders`] modules. Closures with the right shape can
//! be used in place of any of them.
//!
//! # Example
//!
//! ```
//! use modelkit_core::*;
//!
//! let token = Schema::builder("Token")
//!     .field("key", Field::string().required())
//!     .field("secret", Field::string().required())
//!     .build()
//!     .unwrap();
//!
//! let user = Schema::builder("User")
//!     .field("login", Field::string().required())
//!     .field("name", Field::string())
//!     .field("role", Field::string().choices(["admin", "moderator", "user"]))
//!     .field("email", Field::email().required())
//!     .field("token", Field::embedded(&token).required())
//!     .field("addresses", Field::list(Vec::new()))
//!     .build()
//!     .unwrap();
//!
//! let jack = Model::new(&user, [
//!     ("login", Value::from("jack")),
//!     ("name", Value::from("Jack")),
//!     ("role", Value::from("user")),
//!     ("email", Value::from("jack@example.com")),
//!     ("token", Value::map([("key", "vs7dfxxx"), ("secret", "ds5ds4xxx")])),
//! ]).unwrap();
//!
//! assert!(jack.validate().is_ok());
//!
//! let plain = jack.to_dict().unwrap();
//! assert_eq!(plain["token"], Value::map([("key", "vs7dfxxx"), ("secret", "ds5ds4xxx")]));
//!
//! jack.set("role", "root").unwrap();
//! let err = jack.validate().unwrap_err();
//! assert!(err.to_string().starts_with("role should be in"));
//! ```

pub mod decoders;
pub mod encoders;
mod error;
mod field;
mod guard;
mod inspection;
mod json;
mod model;
mod schema;
pub mod validators;
mod value;

pub use error::{
    ConfigError, DecodeError, EncodeError, Error, FieldError, InspectError, Result,
    ValidationError,
};
pub use field::{DefaultValue, Field, FieldKind};
pub use inspection::{Inspectable, ModelInspector, inspect};
pub use json::JsonOptions;
pub use model::Model;
pub use schema::{FieldTable, Mixin, MixinBuilder, Schema, SchemaBuilder};
pub use value::{Map, Opaque, Value};
