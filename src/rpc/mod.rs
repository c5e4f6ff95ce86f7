//! JSON-RPC 2.0 handling: response formatting, method registry, dispatch
//!
//! Provides protocol-level specifics surrounding validation, error mapping,
//! and routing of requests to registered method handlers.

pub mod codec;
pub mod dispatch;
