//! Seams between the HTTP transport and the session layer.
//!
//! The transport never looks inside a session. It hands parsed JSON-RPC
//! messages to a [`SessionGateway`] and turns the outcome into HTTP.

use std::future::Future;

use serde_json::Value;
use switchboard_protocol::{HandlerResult, RpcError, RpcRequest, RpcResponse};
use tokio::sync::{broadcast, watch};

/// Handles the JSON-RPC methods of one bound server instance.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> impl Future<Output = HandlerResult> + Send;
}

/// Run one message through `handler`. Notifications produce no response.
pub async fn handle_message<H: RequestHandler>(
    handler: &H,
    request: RpcRequest,
) -> Option<RpcResponse> {
    let RpcRequest { id, method, params, .. } = request;
    let result = handler.handle_request(&method, params).await;
    match id {
        Some(id) => Some(RpcResponse::from_result(Some(id), result)),
        None => None,
    }
}

/// Server → client message stream of one session.
///
/// `closed` flips to `true` once the session is closed. Messages queued
/// before that are still delivered, then the stream ends.
pub struct Subscription {
    pub messages: broadcast::Receiver<String>,
    pub closed: watch::Receiver<bool>,
}

/// Outcome of opening a session.
#[derive(Debug)]
pub struct Opened {
    pub session_id: String,
    pub response: Option<RpcResponse>,
}

/// Session-level entry point the transport drives.
///
/// Errors are protocol errors; the transport maps their codes to HTTP
/// statuses (`SessionNotFound` → 404, `MissingSessionId` → 400, ...).
/// Enforcing a session limit is the gateway's job, at the point it
/// registers the session.
pub trait SessionGateway: Send + Sync + 'static {
    /// Create a session bound to `scope` and dispatch its first message.
    fn open(
        &self,
        scope: &str,
        request: RpcRequest,
    ) -> impl Future<Output = Result<Opened, RpcError>> + Send;

    /// Forward a message to an existing session.
    fn route(
        &self,
        session_id: &str,
        request: RpcRequest,
    ) -> impl Future<Output = Result<Option<RpcResponse>, RpcError>> + Send;

    fn close(&self, session_id: &str) -> Result<(), RpcError>;

    fn subscribe(&self, session_id: &str) -> Result<Subscription, RpcError>;

    fn session_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchboard_protocol::RequestId;

    struct Echo;

    impl RequestHandler for Echo {
        async fn handle_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
            match method {
                "echo" => Ok(params.unwrap_or(Value::Null)),
                other => Err(RpcError::method_not_found(other)),
            }
        }
    }

    #[tokio::test]
    async fn request_gets_a_response() {
        let req = RpcRequest::new(RequestId::Number(3), "echo", Some(json!({"a": 1})));
        let resp = handle_message(&Echo, req).await.unwrap();
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["result"], json!({"a": 1}));
    }

    #[tokio::test]
    async fn notification_gets_none() {
        let req = RpcRequest::new(None, "echo", None);
        assert!(handle_message(&Echo, req).await.is_none());
    }

    #[tokio::test]
    async fn handler_error_keeps_request_id() {
        let req = RpcRequest::new(RequestId::String("q".into()), "nope", None);
        let resp = handle_message(&Echo, req).await.unwrap();
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["id"], "q");
        assert_eq!(json["error"]["code"], -32601);
    }
}
