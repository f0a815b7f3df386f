//! Data models shared between order-server and its clients

pub mod role;

pub use role::{Role, UnknownRole};
