//! Order lifecycle module
//!
//! - **machine**: pure transition rules, capability checks, overdue promotion
//! - **storage**: redb persistence for orders, counters, deduction queue, assignments
//! - **manager**: `OrdersManager`, the only writer of the order store
//! - **projections**: kitchen queue, customer tracker, server dashboard
//! - **sweep**: periodic overdue priority promotion
//!
//! ```text
//! HTTP handler → OrdersManager ─┬─ machine (validate + apply)
//!                               └─ storage (one write txn)
//!
//! HTTP handler → projections(storage snapshot)
//! ```

pub mod machine;
pub mod manager;
pub mod projections;
pub mod storage;
pub mod sweep;

// Re-exports
pub use machine::{Actor, TransitionError};
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use storage::{OrderStorage, StorageError};
pub use sweep::OverdueSweep;
