//! JSON-RPC 2.0 base types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// JSON-RPC 2.0 request ID, either a string or integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// Inbound JSON-RPC 2.0 message. A message without `id` is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSuccessResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

/// JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    pub error: RpcError,
}

/// JSON-RPC 2.0 response (success or error).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcResponse {
    Success(RpcSuccessResponse),
    Error(RpcErrorResponse),
}

/// JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Result from a request handler.
pub type HandlerResult = Result<Value, RpcError>;

// ─────────────────────────────────────────────────────────────────────────────
// Helper constructors
// ─────────────────────────────────────────────────────────────────────────────

impl RpcRequest {
    pub fn new(id: impl Into<Option<RequestId>>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Parse a raw message body, validating the JSON-RPC 2.0 shape.
    ///
    /// The error carries whatever request id could be recovered so the caller
    /// can still address its error response.
    pub fn parse(body: &[u8]) -> Result<Self, RpcErrorResponse> {
        let parsed: Value = serde_json::from_slice(body)
            .map_err(|_| RpcErrorResponse::new(None, RpcError::parse_error("Failed to parse JSON")))?;

        let id: Option<RequestId> = parsed
            .get("id")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok());

        let request: RpcRequest = serde_json::from_value(parsed).map_err(|_| {
            RpcErrorResponse::new(id.clone(), RpcError::invalid_request("Invalid JSON-RPC 2.0 request"))
        })?;

        if !request.is_valid() {
            return Err(RpcErrorResponse::new(
                id,
                RpcError::invalid_request("Invalid JSON-RPC 2.0 request"),
            ));
        }
        Ok(request)
    }

    /// Validate that this is a well-formed JSON-RPC 2.0 message.
    pub fn is_valid(&self) -> bool {
        self.jsonrpc == "2.0" && !self.method.is_empty()
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

impl RpcSuccessResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result,
        }
    }
}

impl RpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            error,
        }
    }
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
        }
    }
}

impl RpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Success(RpcSuccessResponse::new(id, result))
    }

    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Self::Error(RpcErrorResponse::new(id, error))
    }

    /// Build the response for a handler outcome.
    pub fn from_result(id: Option<RequestId>, result: HandlerResult) -> Self {
        match result {
            Ok(value) => Self::success(id.unwrap_or(RequestId::Number(0)), value),
            Err(err) => Self::error(id, err),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<RpcErrorResponse> for RpcResponse {
    fn from(value: RpcErrorResponse) -> Self {
        Self::Error(value)
    }
}
