//! Switchboard Transport Layer
//!
//! Streamable HTTP transport for the Switchboard gateway. The transport
//! handles:
//! - One route pair per scope (`/{scope}/mcp`, `/{scope}/mcp/{token}`)
//! - The shared API key gate (bearer header or path token)
//! - Session lifecycle over POST / GET (event stream) / DELETE
//! - The `/health` probe
//!
//! The transport is decoupled from session logic via the `SessionGateway`
//! trait, and from method handling via `RequestHandler`.

pub mod error;
pub mod handler;
pub mod server;

pub use error::TransportError;
pub use handler::{Opened, RequestHandler, SessionGateway, Subscription, handle_message};
pub use server::{ALL_SCOPE, TransportConfig, TransportServer, scope_path, status_for};
