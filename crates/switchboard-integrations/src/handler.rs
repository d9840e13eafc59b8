//! Tool handlers and the name → handler pairing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use switchboard_protocol::ToolDescriptor;

use crate::error::{ToolError, ToolResult};

/// A single callable operation: `invoke(input) -> result-or-error`.
///
/// Arguments have already been checked against the tool's input schema when
/// `invoke` is called.
pub trait ToolHandler: Send + Sync {
    fn invoke(&self, args: Value) -> impl Future<Output = ToolResult> + Send;
}

/// Object-safe version of [`ToolHandler`] so heterogeneous handlers can live
/// in one dispatch table.
pub trait DynToolHandler: Send + Sync {
    fn invoke_dyn<'a>(
        &'a self,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send + 'a>>;
}

impl<T: ToolHandler> DynToolHandler for T {
    fn invoke_dyn<'a>(
        &'a self,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send + 'a>> {
        Box::pin(self.invoke(args))
    }
}

/// A tool descriptor paired with the handler that executes it.
#[derive(Clone)]
pub struct Operation {
    pub descriptor: ToolDescriptor,
    handler: Arc<dyn DynToolHandler>,
}

impl Operation {
    pub fn new<H: ToolHandler + 'static>(descriptor: ToolDescriptor, handler: H) -> Self {
        Self {
            descriptor,
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub async fn invoke(&self, args: Value) -> ToolResult {
        self.handler.invoke_dyn(args).await
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation").field("name", &self.descriptor.name).finish()
    }
}

/// Handler for an operation whose backing sub-API is not configured.
pub struct Unavailable {
    pub reason: &'static str,
}

impl ToolHandler for Unavailable {
    async fn invoke(&self, _args: Value) -> ToolResult {
        Err(ToolError::Unavailable(self.reason.to_string()))
    }
}
