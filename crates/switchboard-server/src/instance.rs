//! Bound server instance: one scope's tool view plus its dispatcher.

use std::sync::Arc;

use serde_json::{Value, json};
use switchboard_integrations::{ConfigError, Integration};
use switchboard_protocol::{
    CallToolParams, HandlerResult, Methods, PROTOCOL_VERSION, RpcError, ToolDescriptor,
};
use switchboard_transport::RequestHandler;
use tracing::debug;

use crate::catalog::ToolCatalog;
use crate::dispatch::Dispatcher;
use crate::scope::{ResolvedScope, Scope};

pub const SERVER_NAME: &str = "switchboard";

/// The server instance a session is bound to. Immutable after construction.
pub struct ScopedServer {
    resolved: ResolvedScope,
    dispatcher: Dispatcher,
}

impl ScopedServer {
    /// Materialize `resolved` from the integrations it enables.
    pub fn new(resolved: ResolvedScope, integrations: &[Arc<dyn Integration>]) -> Result<Self, ConfigError> {
        let enabled: Vec<Arc<dyn Integration>> = integrations
            .iter()
            .filter(|i| resolved.enabled.contains(&i.id()))
            .cloned()
            .collect();
        let catalog = ToolCatalog::compose(&enabled, resolved.whitelist.clone())?;
        Ok(Self {
            resolved,
            dispatcher: Dispatcher::new(catalog),
        })
    }

    pub fn scope(&self) -> Scope {
        self.resolved.scope
    }

    pub fn tools(&self) -> Vec<&ToolDescriptor> {
        self.dispatcher.catalog().list()
    }

    fn initialize_result(&self) -> Value {
        let mut result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        });
        if self.resolved.is_unconfigured() {
            let missing: Vec<&str> = self
                .resolved
                .unconfigured
                .iter()
                .map(|id| id.display_name())
                .collect();
            result["instructions"] = Value::String(format!(
                "Scope '{}' has no configured integrations ({} not configured); no tools are available.",
                self.resolved.scope,
                missing.join(", ")
            ));
        }
        result
    }
}

impl RequestHandler for ScopedServer {
    async fn handle_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        debug!("[{}] {}", self.resolved.scope, method);
        match method {
            Methods::INITIALIZE => Ok(self.initialize_result()),
            Methods::INITIALIZED => Ok(Value::Null),
            Methods::PING => Ok(json!({})),
            Methods::TOOLS_LIST => Ok(json!({ "tools": self.tools() })),
            Methods::TOOLS_CALL => {
                let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
                    .map_err(|e| RpcError::invalid_params(format!("Invalid tools/call params: {e}")))?;
                let result = self.dispatcher.call(&params.name, params.arguments).await;
                serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }
}
