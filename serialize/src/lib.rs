//! JSON persistence for collections of models.
//!
//! Each model is written as `{"model": <schema name>, "obj": <to_dict>}` in a
//! JSON array. Reading resolves the schema name through a [`Registry`],
//! decodes `obj` with [`Schema::decode`](modelkit_core::Schema::decode),
//! builds the instance and validates it.
//!
//! # Example
//!
//! ```
//! use modelkit_core::{Field, Model, Schema};
//! use modelkit_serialize::{Registry, SerializerConfig, deserialize, serialize};
//!
//! let user = Schema::builder("User")
//!     .field("login", Field::string().required())
//!     .build()
//!     .unwrap();
//! let registry = Registry::new().with(&user);
//!
//! let jack = Model::new(&user, [("login", "jack")]).unwrap();
//! let json = serialize(&[jack], &registry, &SerializerConfig::default()).unwrap();
//! assert_eq!(json, r#"[{"model":"User","obj":{"login":"jack"}}]"#);
//!
//! let models = deserialize(&json, &registry).unwrap();
//! assert_eq!(models[0].get("login").unwrap().as_str(), Some("jack"));
//! ```

mod config;
mod error;
mod registry;

use std::io::{Read, Write};

use modelkit_core::{Model, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

pub use config::SerializerConfig;
pub use error::{Result, SerializeError};
pub use registry::Registry;

/// Serializes `models` to a JSON array.
///
/// # Errors
///
/// Returns [`SerializeError::NotSerializable`] for a model whose schema is
/// not registered or not allowed by `config`, or that fails validation
/// while `config.require_valid` is set.
pub fn serialize(models: &[Model], registry: &Registry, config: &SerializerConfig) -> Result<String> {
    let entries = models
        .iter()
        .map(|model| entry(model, registry, config))
        .collect::<Result<Vec<_>>>()?;

    debug!(count = entries.len(), "Serialized models");
    Ok(config.json.render(JsonValue::Array(entries))?)
}

/// Serializes a single model as a one-element array.
pub fn serialize_one(model: &Model, registry: &Registry, config: &SerializerConfig) -> Result<String> {
    serialize(std::slice::from_ref(model), registry, config)
}

/// Serializes `models` into `writer`.
pub fn serialize_to_writer(
    mut writer: impl Write,
    models: &[Model],
    registry: &Registry,
    config: &SerializerConfig,
) -> Result<()> {
    let json = serialize(models, registry, config)?;
    writer.write_all(json.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn entry(model: &Model, registry: &Registry, config: &SerializerConfig) -> Result<JsonValue> {
    let schema = model.schema();
    let refuse = |reason: &str| SerializeError::NotSerializable {
        model: format!("{model:?}"),
        reason: reason.to_string(),
    };

    if !registry.contains(schema) {
        return Err(refuse("schema is not registered"));
    }
    if !config.is_allowed(schema.name()) {
        return Err(refuse("schema is not allowed by configuration"));
    }
    if config.require_valid {
        if let Err(err) = model.validate() {
            return Err(refuse(&err.to_string()));
        }
    }

    let obj = Value::Map(model.to_dict()?).to_json()?;
    let mut entry = serde_json::Map::new();
    entry.insert("model".to_string(), JsonValue::String(schema.name().to_string()));
    entry.insert("obj".to_string(), obj);
    Ok(JsonValue::Object(entry))
}

/// Deserializes models from JSON text holding one entry object or an array
/// of them.
///
/// # Errors
///
/// Returns [`SerializeError::MissingModelKey`] for an entry without a
/// `model` key, [`SerializeError::UnknownModel`] when the registry cannot
/// resolve it, and [`SerializeError::InvalidInstance`] when the built
/// instance fails validation.
pub fn deserialize(json: &str, registry: &Registry) -> Result<Vec<Model>> {
    let data: JsonValue = serde_json::from_str(json)?;
    from_json(data, registry)
}

/// Deserializes models from a reader.
pub fn deserialize_from_reader(reader: impl Read, registry: &Registry) -> Result<Vec<Model>> {
    let data: JsonValue = serde_json::from_reader(reader)?;
    from_json(data, registry)
}

fn from_json(data: JsonValue, registry: &Registry) -> Result<Vec<Model>> {
    let entries = match data {
        JsonValue::Array(entries) => entries,
        other => vec![other],
    };

    let models = entries
        .into_iter()
        .map(|entry| instantiate(entry, registry))
        .collect::<Result<Vec<_>>>()?;

    debug!(count = models.len(), "Deserialized models");
    Ok(models)
}

fn instantiate(entry: JsonValue, registry: &Registry) -> Result<Model> {
    let JsonValue::Object(mut entry) = entry else {
        return Err(SerializeError::MalformedEntry(format!(
            "expected an object, found {entry}"
        )));
    };

    let name = match entry.remove("model") {
        None => return Err(SerializeError::MissingModelKey),
        Some(JsonValue::String(name)) => name,
        Some(other) => {
            return Err(SerializeError::MalformedEntry(format!(
                "`model` must be a string, found {other}"
            )));
        }
    };
    let schema = registry
        .get(&name)
        .ok_or_else(|| SerializeError::UnknownModel(name.clone()))?;

    let raw = match entry.remove("obj").map(Value::from_json) {
        Some(Value::Map(raw)) => raw,
        _ => {
            return Err(SerializeError::MalformedEntry(format!(
                "`obj` of '{name}' must be an object"
            )));
        }
    };

    let decoded = schema.decode(&raw).map_err(modelkit_core::Error::from)?;
    let model = Model::from_map(schema, decoded)?;
    model
        .validate()
        .map_err(|err| SerializeError::InvalidInstance {
            model: name,
            reason: err.to_string(),
        })?;
    Ok(model)
}
