//! Shared types for the ordering platform
//!
//! Domain types, error codes and response envelopes used by both
//! `order-server` and `order-client`.

pub mod error;
pub mod inventory;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
