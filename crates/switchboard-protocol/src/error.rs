//! Error object carried in a JSON-RPC `error` member.
//!
//! Besides the five reserved JSON-RPC codes, the gateway uses a small
//! block of server-defined codes for failures that happen before a message
//! reaches a session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,

    /// `mcp-session-id` names no live session.
    SessionNotFound,
    /// Non-initiating message sent without a session id.
    MissingSessionId,
    /// Session creation refused because the gateway is full.
    SessionLimit,
    /// Route token that resolves to no scope.
    UnknownScope,

    Custom(i32),
}

impl RpcErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::SessionNotFound => -32001,
            Self::MissingSessionId => -32002,
            Self::SessionLimit => -32003,
            Self::UnknownScope => -32004,
            Self::Custom(c) => *c,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32001 => Self::SessionNotFound,
            -32002 => Self::MissingSessionId,
            -32003 => Self::SessionLimit,
            -32004 => Self::UnknownScope,
            c => Self::Custom(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured detail (e.g. the offending session id).
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(RpcErrorCode::MethodNotFound, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    pub fn session_not_found(session_id: &str) -> Self {
        Self::new(RpcErrorCode::SessionNotFound, "Session not found")
            .with_data(serde_json::json!({ "sessionId": session_id }))
    }

    pub fn missing_session_id() -> Self {
        Self::new(RpcErrorCode::MissingSessionId, "Missing mcp-session-id header")
    }

    pub fn session_limit(max: usize) -> Self {
        Self::new(RpcErrorCode::SessionLimit, "Too many sessions")
            .with_data(serde_json::json!({ "maxSessions": max }))
    }

    pub fn unknown_scope(scope: &str) -> Self {
        Self::new(RpcErrorCode::UnknownScope, format!("Unknown scope: {scope}"))
    }

    pub fn error_code(&self) -> RpcErrorCode {
        RpcErrorCode::from_code(self.code)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}
