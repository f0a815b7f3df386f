//! Inventory module
//!
//! - **ledger**: `InventoryLedger` oracle trait and the redb `StockLedger`
//! - **admission**: advisory pre-placement availability and delay check
//! - **deduction**: background worker applying queued stock deductions

pub mod admission;
pub mod deduction;
pub mod ledger;

pub use admission::{Admission, AdmissionOutcome};
pub use deduction::DeductionWorker;
pub use ledger::{InventoryLedger, LedgerError, StockLedger};
