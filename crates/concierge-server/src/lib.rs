//! Concierge Server
//!
//! JSON-RPC 2.0 over stdio, one request per line, in front of the chat
//! orchestrator.

pub mod protocol;
mod server;

pub use server::{start_server, ChatServer, DEFAULT_CLIENT_KEY, EVICTION_INTERVAL};
