//! Switchboard protocol types
//!
//! JSON-RPC 2.0 envelopes, method names, error codes and tool descriptors
//! shared by the server and transport crates. This crate is the single
//! source of truth for everything that crosses the wire.

pub mod error;
pub mod jsonrpc;
pub mod methods;
pub mod tools;

pub use error::{RpcError, RpcErrorCode};
pub use jsonrpc::{
    HandlerResult, RequestId, RpcErrorResponse, RpcNotification, RpcRequest, RpcResponse,
    RpcSuccessResponse,
};
pub use methods::{MethodName, Methods, PROTOCOL_VERSION, SESSION_HEADER};
pub use tools::{
    CallToolParams, FieldSchema, FieldType, InputSchema, SchemaError, ToolCallResult, ToolContent,
    ToolDescriptor,
};
