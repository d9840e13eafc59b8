//! Streamable HTTP transport server using Axum.
//!
//! Every scope gets its own pair of routes (`/{scope}/mcp` and
//! `/{scope}/mcp/{token}`; the `all` scope lives at `/mcp`). POST carries
//! JSON-RPC messages, GET opens the session's event stream and DELETE
//! closes the session.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{RawPathParams, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{MethodRouter, get, post},
};
use bytes::Bytes;
use futures_util::stream::{self, Stream};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use subtle::ConstantTimeEq;
use switchboard_protocol::{RequestId, RpcError, RpcErrorCode, RpcRequest, RpcResponse, SESSION_HEADER};
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::handler::{SessionGateway, Subscription};

/// Scope token of the route pair that serves `/mcp`.
pub const ALL_SCOPE: &str = "all";

/// Transport server configuration.
#[derive(Debug)]
pub struct TransportConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
    /// Shared API key. `None` leaves every route open.
    pub api_key: Option<SecretString>,
    /// Scope tokens to expose, each at `/{token}/mcp` (`all` at `/mcp`)
    pub scopes: Vec<String>,
    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hostname: "0.0.0.0".into(),
            api_key: None,
            scopes: vec![ALL_SCOPE.into()],
            enable_cors: false,
        }
    }
}

/// Path of the route pair serving `scope`.
pub fn scope_path(scope: &str) -> String {
    if scope == ALL_SCOPE {
        "/mcp".into()
    } else {
        format!("/{scope}/mcp")
    }
}

/// Shared state for the transport server.
struct AppState<G: SessionGateway> {
    gateway: Arc<G>,
    api_key: Option<SecretString>,
}

/// Scope bound to the route that received a request.
#[derive(Debug, Clone)]
struct BoundScope(Arc<str>);

/// The transport server. Owns the listener task until [`stop`](Self::stop).
pub struct TransportServer {
    /// Shutdown signal
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Server task handle
    handle: Option<tokio::task::JoinHandle<()>>,
    /// Actual bound port
    port: u16,
}

impl TransportServer {
    /// Bind the listener and start serving `gateway`.
    pub async fn start<G: SessionGateway>(
        config: TransportConfig,
        gateway: Arc<G>,
    ) -> Result<Self, TransportError> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let addr_text = format!("{}:{}", config.hostname, config.port);
        let addr: SocketAddr = addr_text
            .parse()
            .map_err(|source| TransportError::Address { addr: addr_text.clone(), source })?;

        let state = Arc::new(AppState {
            gateway,
            api_key: config.api_key,
        });

        let app = router(state, &config.scopes, config.enable_cors);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr: addr_text.clone(), source })?;
        let actual_port = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr: addr_text, source })?
            .port();

        info!(
            "Switchboard transport listening on http://{}:{} ({} scopes)",
            config.hostname,
            actual_port,
            config.scopes.len()
        );

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port: actual_port,
        })
    }

    /// Get the actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Gracefully stop the server.
    ///
    /// Open event streams keep a graceful shutdown waiting, so close the
    /// sessions first.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Switchboard transport stopped");
    }
}

fn router<G: SessionGateway>(state: Arc<AppState<G>>, scopes: &[String], enable_cors: bool) -> Router {
    let mut mcp = Router::new();
    for scope in scopes {
        let path = scope_path(scope);
        let bound = BoundScope(Arc::from(scope.as_str()));
        mcp = mcp.merge(
            Router::new()
                .route(&path, session_methods::<G>())
                .route(&format!("{path}/{{token}}"), session_methods::<G>())
                .layer(Extension(bound)),
        );
    }
    let mcp = mcp.route_layer(middleware::from_fn_with_state(state.clone(), require_api_key::<G>));

    let mut app = Router::new()
        .route("/health", get(health_handler::<G>))
        .merge(mcp)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if enable_cors {
        app = app.layer(
            CorsLayer::permissive().expose_headers([HeaderName::from_static(SESSION_HEADER)]),
        );
    }
    app.with_state(state)
}

fn session_methods<G: SessionGateway>() -> MethodRouter<Arc<AppState<G>>> {
    post(handle_post::<G>)
        .get(handle_get::<G>)
        .delete(handle_delete::<G>)
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Accept `Authorization: Bearer <key>` or the key as the `{token}` path
/// segment. Without a configured key every request passes.
async fn require_api_key<G: SessionGateway>(
    State(state): State<Arc<AppState<G>>>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Response {
    let Some(key) = &state.api_key else {
        return next.run(request).await;
    };
    let key = key.expose_secret().as_bytes();

    let header_token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let path_token = params.iter().find(|(name, _)| *name == "token").map(|(_, v)| v);

    let accepted = |token: Option<&str>| token.is_some_and(|t| bool::from(t.as_bytes().ct_eq(key)));
    if accepted(header_token) | accepted(path_token) {
        next.run(request).await
    } else {
        warn!("Rejected unauthenticated request to {}", request.uri().path());
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn health_handler<G: SessionGateway>(State(state): State<Arc<AppState<G>>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "server": "switchboard",
        "sessions": state.gateway.session_count(),
    }))
}

async fn handle_post<G: SessionGateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(scope): Extension<BoundScope>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match RpcRequest::parse(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!("Rejected malformed message: {}", err.error.message);
            return (StatusCode::BAD_REQUEST, Json(RpcResponse::from(err))).into_response();
        }
    };
    let id = request.id.clone();

    match session_id(&headers) {
        Some(session_id) => match state.gateway.route(session_id, request).await {
            Ok(response) => reply(response),
            Err(err) => error_response(id, err),
        },
        None => match state.gateway.open(&scope.0, request).await {
            Ok(opened) => {
                let mut response = reply(opened.response);
                match HeaderValue::from_str(&opened.session_id) {
                    Ok(value) => {
                        response.headers_mut().insert(SESSION_HEADER, value);
                    }
                    Err(_) => warn!("Session id is not a valid header value"),
                }
                response
            }
            Err(err) => error_response(id, err),
        },
    }
}

async fn handle_get<G: SessionGateway>(
    State(state): State<Arc<AppState<G>>>,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = session_id(&headers) else {
        return error_response(None, RpcError::missing_session_id());
    };
    match state.gateway.subscribe(session_id) {
        Ok(subscription) => {
            debug!("Event stream opened for session {session_id}");
            Sse::new(event_stream(subscription))
                .keep_alive(KeepAlive::default())
                .into_response()
        }
        Err(err) => error_response(None, err),
    }
}

async fn handle_delete<G: SessionGateway>(
    State(state): State<Arc<AppState<G>>>,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = session_id(&headers) else {
        return error_response(None, RpcError::missing_session_id());
    };
    match state.gateway.close(session_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(None, err),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn reply(response: Option<RpcResponse>) -> Response {
    match response {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// HTTP status for a protocol error surfaced by the session layer.
pub fn status_for(code: RpcErrorCode) -> StatusCode {
    match code {
        RpcErrorCode::ParseError | RpcErrorCode::InvalidRequest | RpcErrorCode::MissingSessionId => {
            StatusCode::BAD_REQUEST
        }
        RpcErrorCode::SessionNotFound | RpcErrorCode::UnknownScope => StatusCode::NOT_FOUND,
        RpcErrorCode::SessionLimit => StatusCode::SERVICE_UNAVAILABLE,
        RpcErrorCode::MethodNotFound | RpcErrorCode::InvalidParams => StatusCode::BAD_REQUEST,
        RpcErrorCode::InternalError | RpcErrorCode::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(id: Option<RequestId>, err: RpcError) -> Response {
    let status = status_for(err.error_code());
    debug!("Request failed with {status}: {}", err.message);
    (status, Json(RpcResponse::error(id, err))).into_response()
}

/// Stream the session's messages until it closes. Messages sent before the
/// close are still delivered.
fn event_stream(subscription: Subscription) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(subscription, |mut sub| async move {
        let message = loop {
            if *sub.closed.borrow() {
                break buffered(&mut sub.messages);
            }
            tokio::select! {
                biased;
                message = sub.messages.recv() => match message {
                    Ok(data) => break Some(data),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Event stream lagged, {skipped} messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break None,
                },
                changed = sub.closed.changed() => {
                    if changed.is_err() {
                        break buffered(&mut sub.messages);
                    }
                }
            }
        };
        message.map(|data| (Ok(Event::default().event("message").data(data)), sub))
    })
}

/// Next message already queued for a closed session, if any.
fn buffered(messages: &mut broadcast::Receiver<String>) -> Option<String> {
    loop {
        match messages.try_recv() {
            Ok(data) => return Some(data),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Event stream lagged, {skipped} messages dropped");
            }
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tokio::sync::watch;

    #[test]
    fn all_scope_is_served_at_root() {
        assert_eq!(scope_path("all"), "/mcp");
        assert_eq!(scope_path("dealfront-lite"), "/dealfront-lite/mcp");
    }

    #[test]
    fn routing_errors_map_to_distinct_statuses() {
        assert_eq!(status_for(RpcErrorCode::SessionNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(RpcErrorCode::MissingSessionId), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(RpcErrorCode::SessionLimit), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(RpcErrorCode::ParseError), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(RpcErrorCode::InternalError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn messages_sent_before_close_are_delivered() {
        for _ in 0..200 {
            let (messages, receiver) = broadcast::channel(16);
            let (closed, closed_rx) = watch::channel(false);
            let events = tokio::spawn(
                event_stream(Subscription { messages: receiver, closed: closed_rx }).collect::<Vec<_>>(),
            );
            tokio::task::yield_now().await;

            messages.send("expired".to_string()).unwrap();
            closed.send_replace(true);
            assert_eq!(events.await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn stream_opened_after_close_drains_then_ends() {
        let (messages, receiver) = broadcast::channel(16);
        let (closed, closed_rx) = watch::channel(false);
        messages.send("one".to_string()).unwrap();
        messages.send("two".to_string()).unwrap();
        closed.send_replace(true);

        let events: Vec<_> = event_stream(Subscription { messages: receiver, closed: closed_rx })
            .collect()
            .await;
        assert_eq!(events.len(), 2);
    }
}
