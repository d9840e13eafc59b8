//! Error types for integration configuration and tool invocation.

use serde_json::Value;

use crate::IntegrationId;

/// Failure of a single tool invocation.
///
/// Every variant is recovered by the dispatcher into an error envelope; none
/// of them ever fails the surrounding protocol exchange.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The operation exists but a sub-API it needs is not configured.
    #[error("{0}")]
    Unavailable(String),

    /// The backend answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    Backend { status: u16, body: Value },

    /// Network failure, timeout or undecodable response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("Token acquisition failed: {0}")]
    Credentials(String),

    #[error("Handler failed: {0}")]
    Handler(String),
}

impl ToolError {
    /// Parsed error body of a backend response, if any.
    pub fn backend_body(&self) -> Option<&Value> {
        match self {
            Self::Backend { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result of a tool handler.
pub type ToolResult = Result<Value, ToolError>;

/// Configuration problems. Always fatal for the affected integration or the
/// whole process; never downgraded to a per-call failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is set but empty")]
    EmptyCredential(&'static str),

    #[error("invalid value for {setting}: {reason}")]
    InvalidSetting { setting: &'static str, reason: String },

    #[error("tool '{tool}' is declared by both {first} and {second}")]
    DuplicateTool {
        tool: String,
        first: IntegrationId,
        second: IntegrationId,
    },

    #[error("failed to build HTTP client for {integration}: {source}")]
    HttpClient {
        integration: IntegrationId,
        #[source]
        source: reqwest::Error,
    },
}
