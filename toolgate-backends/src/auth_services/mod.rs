// toolgate-backends/src/auth_services/mod.rs
// ============================================================================
// Module: Auth Service Kinds
// Description: Built-in claim verifiers.
// Purpose: Group the shipped auth-service kinds under one namespace.
// Dependencies: toolgate-core
// ============================================================================

pub mod api_key;
