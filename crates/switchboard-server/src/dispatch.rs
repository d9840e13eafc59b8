//! Dispatch normalizer.
//!
//! Every tool invocation resolves to exactly one envelope, success or
//! error, whatever the backend or the failure looked like. Failure text is
//! taken with a fixed precedence: the backend body's `message`, then its
//! `error`, then the failure's own message.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde_json::{Map, Value};
use switchboard_integrations::{ToolError, ToolResult};
use switchboard_protocol::ToolCallResult;
use tracing::{debug, warn};

use crate::catalog::ToolCatalog;

pub struct Dispatcher {
    catalog: ToolCatalog,
}

impl Dispatcher {
    pub fn new(catalog: ToolCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Invoke `name` and wrap the outcome. Never fails and never panics outward.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match self.invoke(name, arguments).await {
            Ok(value) => {
                debug!("Tool {} succeeded", name);
                ToolCallResult::success(&value)
            }
            Err(err) => {
                warn!("Tool {} failed: {}", name, err);
                ToolCallResult::failure(failure_message(&err))
            }
        }
    }

    async fn invoke(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let operation = self
            .catalog
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args) => args,
        };
        operation
            .descriptor
            .input_schema
            .validate(&args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        AssertUnwindSafe(operation.invoke(args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::Handler(panic_message(&*panic))))
    }
}

/// Human-readable failure text.
pub fn failure_message(err: &ToolError) -> String {
    err.backend_body()
        .and_then(|body| body_field(body, "message").or_else(|| body_field(body, "error")))
        .unwrap_or_else(|| err.to_string())
}

fn body_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
