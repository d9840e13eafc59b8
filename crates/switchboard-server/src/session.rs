//! Session router.
//!
//! Owns the registry of live sessions. A message without a session id that
//! may initiate one creates a session (`Pending` → `Active`); the entry is
//! registered before the message is handled, so later requests carrying the
//! new id find it even while the first exchange is still running. Closing
//! the session's channel is the only way an entry leaves the registry
//! (`Active` → `Closed`); idle eviction goes through the same path.
//!
//! With a session limit, each entry holds a semaphore permit from before it
//! is registered until it closes, so concurrent opens cannot overshoot.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Value, json};
use switchboard_integrations::Integration;
use switchboard_protocol::{RpcError, RpcNotification, RpcRequest, RpcResponse, methods::can_initiate_session};
use switchboard_transport::{Opened, SessionGateway, Subscription, handle_message};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::ToolCatalog;
use crate::channel::SessionChannel;
use crate::error::RouteError;
use crate::instance::ScopedServer;
use crate::scope::{Scope, ScopeResolver};

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Active,
    Closed,
}

struct SessionEntry {
    server: ScopedServer,
    channel: SessionChannel,
    state: Mutex<SessionState>,
    last_seen: Mutex<Instant>,
    permit: Mutex<Option<OwnedSemaphorePermit>>,
}

impl SessionEntry {
    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.lock())
    }

    fn close(&self) -> bool {
        *self.state.lock() = SessionState::Closed;
        let closed = self.channel.close();
        drop(self.permit.lock().take());
        closed
    }
}

type Registry = DashMap<String, Arc<SessionEntry>>;

struct SessionLimit {
    max: usize,
    slots: Arc<Semaphore>,
}

pub struct SessionRouter {
    resolver: ScopeResolver,
    integrations: Vec<Arc<dyn Integration>>,
    sessions: Arc<Registry>,
    idle_timeout: Option<Duration>,
    limit: Option<SessionLimit>,
}

impl SessionRouter {
    /// Build a router over the configured integrations.
    ///
    /// Composes the `all` catalog once so duplicate tool names fail here
    /// rather than on the first session.
    pub fn new(integrations: Vec<Arc<dyn Integration>>, idle_timeout: Option<Duration>) -> Result<Self, RouteError> {
        let catalog = ToolCatalog::compose(&integrations, None)?;
        let resolver = ScopeResolver::new(integrations.iter().map(|i| i.id()).collect());
        info!(
            "Session router ready: {} integrations, {} tools",
            resolver.configured().len(),
            catalog.len()
        );
        Ok(Self {
            resolver,
            integrations,
            sessions: Arc::new(DashMap::new()),
            idle_timeout: idle_timeout.filter(|t| !t.is_zero()),
            limit: None,
        })
    }

    /// Cap the number of live sessions. `None` leaves it unbounded.
    pub fn with_max_sessions(mut self, max: Option<usize>) -> Self {
        self.limit = max.map(|max| SessionLimit { max, slots: Arc::new(Semaphore::new(max)) });
        self
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// Create a session bound to `scope` and handle its initiating message.
    pub async fn open(&self, scope: &str, request: RpcRequest) -> Result<(String, Option<RpcResponse>), RouteError> {
        if !can_initiate_session(&request.method) {
            return Err(RouteError::MissingSessionId);
        }
        let scope: Scope = scope.parse()?;
        let server = ScopedServer::new(self.resolver.resolve(scope), &self.integrations)?;
        let permit = self.reserve_slot()?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let entry = Arc::new(SessionEntry {
            server,
            channel: SessionChannel::bind(session_id.clone()),
            state: Mutex::new(SessionState::Pending),
            last_seen: Mutex::new(Instant::now()),
            permit: Mutex::new(permit),
        });

        let registry = Arc::downgrade(&self.sessions);
        entry.channel.on_close(move |id| {
            if let Some(sessions) = registry.upgrade() {
                sessions.remove(id);
            }
            info!("Session closed: {}", id);
        });

        self.sessions.insert(session_id.clone(), entry.clone());
        *entry.state.lock() = SessionState::Active;
        info!(
            "Session opened: {} (scope: {}, {} tools)",
            session_id,
            scope,
            entry.server.tools().len()
        );

        let response = handle_message(&entry.server, request).await;
        Ok((session_id, response))
    }

    /// Forward a message to an existing session.
    pub async fn route(&self, session_id: &str, request: RpcRequest) -> Result<Option<RpcResponse>, RouteError> {
        let entry = self.entry(session_id)?;
        entry.touch();
        debug!("Routing {} to session {}", request.method, session_id);
        Ok(handle_message(&entry.server, request).await)
    }

    pub fn close(&self, session_id: &str) -> Result<(), RouteError> {
        self.entry(session_id)?.close();
        Ok(())
    }

    pub fn subscribe(&self, session_id: &str) -> Result<Subscription, RouteError> {
        Ok(self.entry(session_id)?.channel.subscribe())
    }

    /// Push a notification to the session's open streams.
    pub fn notify(&self, session_id: &str, method: &str, params: Option<Value>) -> Result<usize, RouteError> {
        let entry = self.entry(session_id)?;
        Ok(entry.channel.send(&RpcNotification::new(method, params)))
    }

    /// Close every session idle for at least the idle timeout as of `now`.
    /// Returns the evicted ids.
    pub fn evict_idle(&self, now: Instant) -> Vec<String> {
        let Some(timeout) = self.idle_timeout else {
            return Vec::new();
        };
        let expired: Vec<(String, Arc<SessionEntry>)> = self
            .sessions
            .iter()
            .filter(|e| e.value().idle_for(now) >= timeout)
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        for (id, entry) in &expired {
            entry.channel.send(&RpcNotification::new(
                "notifications/message",
                Some(json!({
                    "level": "info",
                    "logger": "switchboard",
                    "data": format!("Session expired after {}s idle", timeout.as_secs()),
                })),
            ));
            entry.close();
            info!("Session evicted after idle timeout: {}", id);
        }
        expired.into_iter().map(|(id, _)| id).collect()
    }

    /// Run [`evict_idle`](Self::evict_idle) periodically until the router
    /// is dropped. Does nothing when eviction is disabled.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let timeout = self.idle_timeout?;
        let period = (timeout / 4).clamp(Duration::from_millis(10), MAX_SWEEP_INTERVAL);
        let router: Weak<Self> = Arc::downgrade(self);
        info!("Idle session sweeper running every {:?} (timeout {:?})", period, timeout);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(router) = router.upgrade() else {
                    break;
                };
                router.evict_idle(Instant::now());
            }
        }))
    }

    /// Close every session, e.g. before shutting the transport down.
    pub fn close_all(&self) {
        let entries: Vec<Arc<SessionEntry>> = self.sessions.iter().map(|e| e.value().clone()).collect();
        for entry in entries {
            entry.close();
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_scope(&self, session_id: &str) -> Option<Scope> {
        self.sessions.get(session_id).map(|e| e.server.scope())
    }

    pub fn session_state(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.get(session_id).map(|e| *e.state.lock())
    }

    // ── Internal ──────────────────────────────────────────────────────────

    fn reserve_slot(&self) -> Result<Option<OwnedSemaphorePermit>, RouteError> {
        let Some(limit) = &self.limit else {
            return Ok(None);
        };
        match limit.slots.clone().try_acquire_owned() {
            Ok(permit) => Ok(Some(permit)),
            Err(_) => {
                warn!("Session rejected: limit of {} reached", limit.max);
                Err(RouteError::SessionLimit(limit.max))
            }
        }
    }

    /// Clone the entry out so no registry guard is held across an await
    /// or a close callback.
    fn entry(&self, session_id: &str) -> Result<Arc<SessionEntry>, RouteError> {
        self.sessions
            .get(session_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| RouteError::SessionNotFound(session_id.to_string()))
    }
}

impl SessionGateway for SessionRouter {
    async fn open(&self, scope: &str, request: RpcRequest) -> Result<Opened, RpcError> {
        let (session_id, response) = SessionRouter::open(self, scope, request).await?;
        Ok(Opened { session_id, response })
    }

    async fn route(&self, session_id: &str, request: RpcRequest) -> Result<Option<RpcResponse>, RpcError> {
        Ok(SessionRouter::route(self, session_id, request).await?)
    }

    fn close(&self, session_id: &str) -> Result<(), RpcError> {
        Ok(SessionRouter::close(self, session_id)?)
    }

    fn subscribe(&self, session_id: &str) -> Result<Subscription, RpcError> {
        Ok(SessionRouter::subscribe(self, session_id)?)
    }

    fn session_count(&self) -> usize {
        SessionRouter::session_count(self)
    }
}
