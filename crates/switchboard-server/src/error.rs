//! Routing and scope errors.

use switchboard_integrations::ConfigError;
use switchboard_protocol::RpcError;
use thiserror::Error;

/// Failure to route a message to a session.
///
/// These end the single HTTP exchange; none of them is retried.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    #[error("Missing mcp-session-id header")]
    MissingSessionId,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session limit reached ({0})")]
    SessionLimit(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RouteError> for RpcError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::UnknownScope(scope) => RpcError::unknown_scope(&scope),
            RouteError::MissingSessionId => RpcError::missing_session_id(),
            RouteError::SessionNotFound(id) => RpcError::session_not_found(&id),
            RouteError::SessionLimit(max) => RpcError::session_limit(max),
            RouteError::Config(e) => RpcError::internal(e.to_string()),
        }
    }
}
