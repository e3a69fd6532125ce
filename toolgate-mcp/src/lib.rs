// toolgate-mcp/src/lib.rs
// ============================================================================
// Module: Toolgate MCP Server
// Description: Agent-facing JSON-RPC and HTTP surfaces for the gateway.
// Purpose: Dispatch validated, authenticated tool invocations.
// Dependencies: toolgate-config, toolgate-core, axum, tokio
// ============================================================================

//! ## Overview
//! The server exposes the configured catalog over three surfaces: the agent
//! JSON-RPC dialect (`initialize`, `ping`, `tools/list`, `tools/call`) at
//! `/mcp` and `/mcp/{toolset}`, a REST catalog and invocation surface under
//! `/api`, and a newline-delimited stdio transport. Every surface routes
//! through the same pipeline: tool resolution, auth claim collection,
//! authorization, parameter parsing, invocation, and error classification.
//! Security posture: request bodies and headers are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod jsonrpc;
pub mod method;
pub mod pipeline;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use jsonrpc::JsonRpcError;
pub use jsonrpc::JsonRpcRequest;
pub use jsonrpc::JsonRpcResponse;
pub use method::handle_message;
pub use pipeline::CallError;
pub use pipeline::ServerState;
pub use server::McpServer;
pub use server::ServerError;
pub use server::ServerOptions;
