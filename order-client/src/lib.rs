//! Order Client - HTTP client, polling synchronizer and session context
//!
//! - [`OrderClient`]: typed calls to every order-server endpoint
//! - [`sync`]: one [`Poller`](sync::Poller) per view, emitting change-sets
//! - [`session`]: cart / table / last order, persisted through an injected store

pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod sync;

pub use config::{ClientConfig, PollIntervals};
pub use error::{ClientError, ClientResult};
pub use http::OrderClient;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionContext, SessionStore};
