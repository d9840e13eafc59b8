//! Declarative REST endpoints.
//!
//! Every tool of every integration is one [`Endpoint`]: a verb, a path
//! template and a rule for where the remaining arguments go. Binding an
//! endpoint to a [`RestClient`] yields the tool's handler.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::error::{ToolError, ToolResult};
use crate::handler::ToolHandler;
use crate::http::{RestClient, Verb};

/// Where the arguments left over after path substitution are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Query string.
    Query,
    /// JSON request body.
    Body,
    /// Dropped.
    None,
    /// JSON:API document `{data:{type, attributes}}`.
    JsonApi(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub verb: Verb,
    pub path: &'static str,
    pub payload: Payload,
}

impl Endpoint {
    pub const fn get(path: &'static str) -> Self {
        Self { verb: Verb::Get, path, payload: Payload::Query }
    }

    pub const fn post(path: &'static str) -> Self {
        Self { verb: Verb::Post, path, payload: Payload::Body }
    }

    pub const fn patch(path: &'static str) -> Self {
        Self { verb: Verb::Patch, path, payload: Payload::Body }
    }

    pub const fn delete(path: &'static str) -> Self {
        Self { verb: Verb::Delete, path, payload: Payload::Query }
    }

    pub const fn with(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Shorthand for an endpoint that sends nothing beyond its path.
    pub const fn bare(self) -> Self {
        self.with(Payload::None)
    }

    /// Names of the `{placeholders}` in the path template.
    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
        let path = self.path;
        path.match_indices('{').filter_map(move |(start, _)| {
            let rest = &path[start + 1..];
            rest.find('}').map(|end| &rest[..end])
        })
    }

    /// Substitute placeholders from `args` and return the concrete path
    /// together with the arguments that were not consumed.
    pub fn render(&self, args: &Value) -> Result<(String, Map<String, Value>), ToolError> {
        let mut rest = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(ToolError::InvalidArguments(
                    "arguments must be a JSON object".into(),
                ));
            }
        };

        let mut path = String::with_capacity(self.path.len() + 16);
        let mut template = self.path;
        while let Some(start) = template.find('{') {
            let Some(len) = template[start..].find('}') else {
                break;
            };
            let name = &template[start + 1..start + len];
            path.push_str(&template[..start]);
            path.push_str(&path_segment(name, rest.remove(name))?);
            template = &template[start + len + 1..];
        }
        path.push_str(template);

        Ok((path, rest))
    }

    pub fn bind(self, client: Arc<RestClient>) -> RestOperation {
        RestOperation { client, endpoint: self }
    }
}

fn path_segment(name: &str, value: Option<Value>) -> Result<String, ToolError> {
    let segment = match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => {
            return Err(ToolError::InvalidArguments(format!(
                "missing required field '{name}'"
            )));
        }
        Some(_) => {
            return Err(ToolError::InvalidArguments(format!(
                "field '{name}' must be a string or number"
            )));
        }
    };

    let unsafe_char = segment
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_control());
    if segment.is_empty() || segment == "." || segment == ".." || unsafe_char {
        return Err(ToolError::InvalidArguments(format!(
            "field '{name}' is not a valid path segment"
        )));
    }
    Ok(segment)
}

/// Flatten arguments into query pairs. Arrays repeat the key, objects are
/// sent as compact JSON and nulls are skipped.
pub fn query_pairs(args: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(args.len());
    for (key, value) in args {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push((key.clone(), scalar(item)));
                }
            }
            other => pairs.push((key.clone(), scalar(other))),
        }
    }
    pairs
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An [`Endpoint`] bound to the client of its integration.
pub struct RestOperation {
    client: Arc<RestClient>,
    endpoint: Endpoint,
}

impl ToolHandler for RestOperation {
    async fn invoke(&self, args: Value) -> ToolResult {
        let (path, rest) = self.endpoint.render(&args)?;
        let verb = self.endpoint.verb;

        match self.endpoint.payload {
            Payload::Query => {
                self.client.send(verb, &path, &query_pairs(&rest), None).await
            }
            Payload::Body => {
                let body = Value::Object(rest);
                self.client.send(verb, &path, &[], Some(&body)).await
            }
            Payload::None => self.client.send(verb, &path, &[], None).await,
            Payload::JsonApi(kind) => {
                let body = json!({ "data": { "type": kind, "attributes": rest } });
                self.client.send(verb, &path, &[], Some(&body)).await
            }
        }
    }
}
