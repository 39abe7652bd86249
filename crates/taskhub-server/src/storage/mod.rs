//! Storage layer
//!
//! Embedded SQLite via sqlx; the connection pool is the only shared state.

pub mod db;

pub use db::Database;
