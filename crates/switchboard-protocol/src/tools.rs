//! Tool descriptors, input schemas and the tool-call result envelope.
//!
//! A [`ToolDescriptor`] is what `tools/list` advertises. Its [`InputSchema`]
//! doubles as the typed input contract: the dispatcher validates arguments
//! against it before a handler ever sees them.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────────

/// JSON type of a tool input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Whether `value` satisfies this type. Integers satisfy `number`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item schema of an array field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSchema {
    #[serde(rename = "type")]
    pub kind: FieldType,
}

/// Schema of a single input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemSchema>,
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    schema: FieldSchema,
    required: bool,
}

/// Object schema for tool arguments: field name → {type, required?, description}.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<Field>,
}

/// Argument validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("field '{field}' must be of type {expected}")]
    WrongType { field: String, expected: FieldType },
}

impl InputSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.schema)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name && f.required)
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.name.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Check `args` against this schema.
    ///
    /// `null` is treated as an empty object. Fields not declared in the
    /// schema are left alone.
    pub fn validate(&self, args: &Value) -> Result<(), SchemaError> {
        let empty = serde_json::Map::new();
        let object = match args {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => return Err(SchemaError::NotAnObject),
        };

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(SchemaError::MissingField(field.name.clone()));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.schema.kind.matches(value) => {
                    return Err(SchemaError::WrongType {
                        field: field.name.clone(),
                        expected: field.schema.kind,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

struct Properties<'a>(&'a [Field]);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in self.0 {
            map.serialize_entry(&field.name, &field.schema)?;
        }
        map.end()
    }
}

impl Serialize for InputSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let required: Vec<&str> = self.required().collect();
        let mut map = serializer.serialize_map(Some(if required.is_empty() { 2 } else { 3 }))?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &Properties(&self.fields))?;
        if !required.is_empty() {
            map.serialize_entry("required", &required)?;
        }
        map.end()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// A named, schema-described operation a session may invoke.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: InputSchema::default(),
        }
    }

    pub fn required(self, name: &str, kind: FieldType, description: &str) -> Self {
        self.push(name, kind, None, true, description)
    }

    pub fn optional(self, name: &str, kind: FieldType, description: &str) -> Self {
        self.push(name, kind, None, false, description)
    }

    pub fn required_array(self, name: &str, items: FieldType, description: &str) -> Self {
        self.push(name, FieldType::Array, Some(items), true, description)
    }

    pub fn optional_array(self, name: &str, items: FieldType, description: &str) -> Self {
        self.push(name, FieldType::Array, Some(items), false, description)
    }

    fn push(
        mut self,
        name: &str,
        kind: FieldType,
        items: Option<FieldType>,
        required: bool,
        description: &str,
    ) -> Self {
        self.input_schema.fields.push(Field {
            name: name.to_string(),
            schema: FieldSchema {
                kind,
                description: description.to_string(),
                items: items.map(|kind| ItemSchema { kind }),
            },
            required,
        });
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tools/call
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// One content block of a tool-call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Uniform result envelope of a tool invocation.
///
/// `is_error` is always serialized so callers never have to look at the
/// content to tell success from failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Wrap a backend value as pretty-printed JSON text.
    pub fn success(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        }
    }

    pub fn failure(message: impl AsRef<str>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {}", message.as_ref()),
            }],
            is_error: true,
        }
    }

    /// Text of the first content block.
    pub fn text(&self) -> &str {
        match self.content.first() {
            Some(ToolContent::Text { text }) => text,
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead_tool() -> ToolDescriptor {
        ToolDescriptor::new("get_lead", "Get a lead.")
            .required("account_id", FieldType::String, "Account.")
            .optional("page", FieldType::Number, "Page.")
            .optional_array("fields", FieldType::String, "Fields.")
    }

    #[test]
    fn serializes_as_object_schema() {
        let json = serde_json::to_value(lead_tool()).unwrap();
        assert_eq!(json["inputSchema"]["type"], "object");
        assert_eq!(json["inputSchema"]["required"], json!(["account_id"]));
        assert_eq!(json["inputSchema"]["properties"]["page"]["type"], "number");
        assert_eq!(json["inputSchema"]["properties"]["fields"]["items"]["type"], "string");
    }

    #[test]
    fn empty_schema_omits_required() {
        let json = serde_json::to_value(ToolDescriptor::new("list", "List.")).unwrap();
        assert!(json["inputSchema"].get("required").is_none());
        assert_eq!(json["inputSchema"]["properties"], json!({}));
    }

    #[test]
    fn validate_accepts_well_typed_arguments() {
        let schema = lead_tool().input_schema;
        assert!(schema.validate(&json!({"account_id": "a1", "page": 2, "extra": true})).is_ok());
    }

    #[test]
    fn validate_rejects_missing_and_null_required() {
        let schema = lead_tool().input_schema;
        assert_eq!(
            schema.validate(&json!({})),
            Err(SchemaError::MissingField("account_id".into()))
        );
        assert_eq!(
            schema.validate(&json!({"account_id": null})),
            Err(SchemaError::MissingField("account_id".into()))
        );
        assert_eq!(
            schema.validate(&Value::Null),
            Err(SchemaError::MissingField("account_id".into()))
        );
    }

    #[test]
    fn validate_rejects_wrong_types() {
        let schema = lead_tool().input_schema;
        let err = schema.validate(&json!({"account_id": 7})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::WrongType { field: "account_id".into(), expected: FieldType::String }
        );
        assert_eq!(schema.validate(&json!([1, 2])), Err(SchemaError::NotAnObject));
    }

    #[test]
    fn integer_is_a_number_but_not_vice_versa() {
        assert!(FieldType::Number.matches(&json!(3)));
        assert!(!FieldType::Integer.matches(&json!(3.5)));
    }

    #[test]
    fn envelope_always_carries_is_error() {
        let ok = serde_json::to_value(ToolCallResult::success(&json!({"a": 1}))).unwrap();
        assert_eq!(ok["isError"], false);
        assert_eq!(ok["content"][0]["type"], "text");

        let err = ToolCallResult::failure("boom");
        assert!(err.is_error);
        assert_eq!(err.text(), "Error: boom");
    }
}
