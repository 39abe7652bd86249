//! Taskhub Types - pure data type definitions
//!
//! This crate contains only data types with no async runtime dependencies,
//! shared between the server and any Rust client of the WebSocket protocol.

pub mod message;
pub mod task;

pub use message::*;
pub use task::*;
