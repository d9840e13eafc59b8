//! Switchboard Server: scope resolution, tool dispatch and the session router.
//!
//! A session is bound to one [`ScopedServer`]: the tool view of its scope
//! plus a dispatcher that turns every invocation into a uniform envelope.
//! The [`SessionRouter`] owns the live sessions and implements the
//! transport's `SessionGateway`.

pub mod catalog;
pub mod channel;
pub mod dispatch;
pub mod error;
pub mod instance;
pub mod scope;
pub mod session;

pub use catalog::ToolCatalog;
pub use channel::SessionChannel;
pub use dispatch::{Dispatcher, failure_message};
pub use error::RouteError;
pub use instance::{SERVER_NAME, ScopedServer};
pub use scope::{ResolvedScope, Scope, ScopeResolver, Selection, Visibility};
pub use session::{SessionRouter, SessionState};
