//! Method name constants for every JSON-RPC method the gateway understands.
//!
//! Each constant is the exact string sent over the wire as the `method` field.

/// All gateway method names.
pub struct Methods;

impl Methods {
    // ── Lifecycle ───────────────────────────────────────────────────────
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";

    // ── Tools ───────────────────────────────────────────────────────────
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Type alias for method name strings.
pub type MethodName = &'static str;

/// All known method names, for validation.
pub const ALL_METHODS: &[MethodName] = &[
    Methods::INITIALIZE,
    Methods::INITIALIZED,
    Methods::PING,
    Methods::TOOLS_LIST,
    Methods::TOOLS_CALL,
];

/// Check if a method name is a known gateway method.
pub fn is_known_method(method: &str) -> bool {
    ALL_METHODS.contains(&method)
}

/// Whether a message with this method may arrive without a session identifier
/// and open a new session.
pub fn can_initiate_session(method: &str) -> bool {
    method == Methods::INITIALIZE
}

/// Protocol revision advertised in the `initialize` response.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// HTTP header carrying the session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";
