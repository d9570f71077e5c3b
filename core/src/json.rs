//! JSON text output options.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Error, Result};

/// Formatting options for [`Model::to_json_with`](crate::Model::to_json_with).
///
/// The default is compact output in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Pretty-print with this many spaces per level.
    pub indent: Option<usize>,
    /// Sort object keys at every level.
    pub sort_keys: bool,
}

impl JsonOptions {
    /// Renders `json` as text.
    pub fn render(&self, json: JsonValue) -> Result<String> {
        let json = if self.sort_keys { sorted(json) } else { json };

        let Some(width) = self.indent else {
            return Ok(serde_json::to_string(&json)?);
        };

        let indent = " ".repeat(width);
        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
        json.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| Error::Json(e.to_string()))
    }
}

fn sorted(json: JsonValue) -> JsonValue {
    match json {
        JsonValue::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            JsonValue::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
