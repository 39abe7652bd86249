//! HTTP handlers

pub mod health;
pub mod tasks;
pub mod ws;

pub use health::health;
