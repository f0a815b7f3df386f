//! redb-based storage layer for orders
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Canonical order records |
//! | `active_orders` | `order_id` | `()` | Non-terminal order index |
//! | `counters` | `name` | `u64` | Per-day order number counters |
//! | `pending_deductions` | `deduction_id` | `PendingDeduction` | Stock deduction queue |
//! | `deduction_dead_letter` | `deduction_id` | `DeadLetterEntry` | Permanently failed deductions |
//! | `table_assignments` | `staff_id` | `TableAssignment` | Server table assignments |
//!
//! # Atomicity
//!
//! Every state change of an order is a single write transaction: read, validate,
//! write, commit. redb serializes writers, so a transition decided against a
//! stale read can never be committed.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::{Deserialize, Serialize};
use shared::order::{Order, TableAssignment};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for tracking non-terminal orders: key = order_id, value = empty
const ACTIVE_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("active_orders");

/// Table for counters: key = "order_number:YYYYMMDD", value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Table for the stock deduction queue: key = deduction_id
const PENDING_DEDUCTIONS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("pending_deductions");

/// Table for dead letter queue: key = deduction_id
const DEAD_LETTER_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("deduction_dead_letter");

/// Table for table assignments: key = staff_id
const ASSIGNMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("table_assignments");

/// One line of a pending deduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub menu_item_id: String,
    pub quantity: u32,
    /// Already subtracted from the ledger; never applied twice
    #[serde(default)]
    pub applied: bool,
}

/// Stock deduction queue entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDeduction {
    pub deduction_id: String,
    pub order_id: String,
    pub lines: Vec<DeductionLine>,
    pub created_at: i64,
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Time of the last failed attempt, the backoff base
    #[serde(default)]
    pub last_attempt_at: Option<i64>,
}

impl PendingDeduction {
    /// Build a deduction for the given lines, merging duplicate menu items
    pub fn new(order_id: &str, items: impl IntoIterator<Item = (String, u32)>) -> Self {
        let mut lines: Vec<DeductionLine> = Vec::new();
        for (menu_item_id, quantity) in items {
            match lines.iter_mut().find(|l| l.menu_item_id == menu_item_id) {
                Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                None => lines.push(DeductionLine {
                    menu_item_id,
                    quantity,
                    applied: false,
                }),
            }
        }
        Self {
            deduction_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            lines,
            created_at: shared::util::now_millis(),
            retry_count: 0,
            last_error: None,
            last_attempt_at: None,
        }
    }

    pub fn is_fully_applied(&self) -> bool {
        self.lines.iter().all(|l| l.applied)
    }
}

/// Dead letter queue entry (permanently failed deductions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub deduction: PendingDeduction,
    pub failed_at: i64,
    pub last_error: String,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with an
    /// atomic root swap), so a crash never leaves a half-applied transition.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
            let _ = write_txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
            let _ = write_txn.open_table(DEAD_LETTER_TABLE)?;
            let _ = write_txn.open_table(ASSIGNMENTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Underlying database, shared with the stock ledger
    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Number ==========

    /// Increment and return the order counter of the given day (within transaction)
    pub fn next_order_number_txn(&self, txn: &WriteTransaction, day: &str) -> StorageResult<u64> {
        let key = format!("order_number:{day}");
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(key.as_str())?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(key.as_str(), next)?;
        Ok(next)
    }

    // ========== Orders ==========

    /// Store an order and keep the active index in sync with its status
    pub fn store_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        let mut active = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        if order.status.is_terminal() {
            active.remove(order.id.as_str())?;
        } else {
            active.insert(order.id.as_str(), ())?;
        }
        Ok(())
    }

    /// Get an order by ID (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all non-terminal orders
    ///
    /// Reads the index and the records from one snapshot.
    pub fn get_active_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in active.iter()? {
            let (key, _) = entry?;
            if let Some(value) = orders.get(key.value())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Orders completed at or after `since`
    ///
    /// Scans the whole order table.
    // TODO: index completions by day once the order table outgrows a full scan
    pub fn get_orders_completed_since(&self, since: i64) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.completed_at.is_some_and(|at| at >= since) {
                result.push(order);
            }
        }
        Ok(result)
    }

    /// IDs of all non-terminal orders
    pub fn get_active_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let mut ids = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    // ========== Pending Deduction Queue ==========

    /// Add a deduction to the queue (within transaction)
    pub fn queue_deduction_txn(
        &self,
        txn: &WriteTransaction,
        deduction: &PendingDeduction,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
        let value = serde_json::to_vec(deduction)?;
        table.insert(deduction.deduction_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get all pending deductions, oldest first
    pub fn get_pending_deductions(&self) -> StorageResult<Vec<PendingDeduction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_DEDUCTIONS_TABLE)?;

        let mut entries: Vec<PendingDeduction> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    /// Persist per-line progress and failure info of a queued deduction
    pub fn update_pending_deduction(&self, deduction: &PendingDeduction) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
            let exists = table.get(deduction.deduction_id.as_str())?.is_some();
            if exists {
                let value = serde_json::to_vec(deduction)?;
                table.insert(deduction.deduction_id.as_str(), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Remove a fully applied deduction from the queue
    pub fn complete_deduction(&self, deduction_id: &str) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
            table.remove(deduction_id)?;
        }
        txn.commit()?;
        tracing::debug!(deduction_id = %deduction_id, "Deduction completed");
        Ok(())
    }

    /// Move a deduction from the queue to the dead letter queue
    pub fn move_to_dead_letter(
        &self,
        deduction: &PendingDeduction,
        error: &str,
    ) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut pending_table = txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
            let mut dead_letter_table = txn.open_table(DEAD_LETTER_TABLE)?;

            let entry = DeadLetterEntry {
                deduction: deduction.clone(),
                failed_at: shared::util::now_millis(),
                last_error: error.to_string(),
            };
            let value = serde_json::to_vec(&entry)?;
            dead_letter_table.insert(deduction.deduction_id.as_str(), value.as_slice())?;
            pending_table.remove(deduction.deduction_id.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get all dead letter entries
    pub fn get_dead_letters(&self) -> StorageResult<Vec<DeadLetterEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEAD_LETTER_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    /// Move all dead letter entries back to the queue (reset retry count)
    ///
    /// Runs at startup so deductions that failed before a restart get another
    /// round. Lines already applied stay applied.
    pub fn recover_dead_letters(&self) -> StorageResult<usize> {
        let txn = self.begin_write()?;
        let count = {
            let mut pending_table = txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
            let mut dead_letter_table = txn.open_table(DEAD_LETTER_TABLE)?;

            let mut entries: Vec<DeadLetterEntry> = Vec::new();
            for result in dead_letter_table.iter()? {
                let (_key, value) = result?;
                entries.push(serde_json::from_slice(value.value())?);
            }

            for entry in &entries {
                let mut deduction = entry.deduction.clone();
                deduction.retry_count = 0;
                deduction.last_error = None;
                deduction.last_attempt_at = None;
                let value = serde_json::to_vec(&deduction)?;
                pending_table.insert(deduction.deduction_id.as_str(), value.as_slice())?;
                dead_letter_table.remove(deduction.deduction_id.as_str())?;
            }
            entries.len()
        };
        txn.commit()?;
        Ok(count)
    }

    // ========== Table Assignments ==========

    pub fn get_assignment(&self, staff_id: &str) -> StorageResult<Option<TableAssignment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ASSIGNMENTS_TABLE)?;
        match table.get(staff_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn store_assignment(&self, assignment: &TableAssignment) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(ASSIGNMENTS_TABLE)?;
            let value = serde_json::to_vec(assignment)?;
            table.insert(assignment.staff_id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let active_table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let pending_table = read_txn.open_table(PENDING_DEDUCTIONS_TABLE)?;
        let dead_letter_table = read_txn.open_table(DEAD_LETTER_TABLE)?;

        Ok(StorageStats {
            order_count: orders_table.len()?,
            active_order_count: active_table.len()?,
            pending_deduction_count: pending_table.len()?,
            dead_letter_count: dead_letter_table.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub order_count: u64,
    pub active_order_count: u64,
    pub pending_deduction_count: u64,
    pub dead_letter_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderItem, OrderStatus, Priority};

    fn test_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            order_number: "ORD-20250101-0001".to_string(),
            status: OrderStatus::Pending,
            priority: Priority::Normal,
            items: vec![OrderItem {
                menu_item_id: "soup".to_string(),
                quantity: 1,
                unit_price: 4.0,
                name: None,
            }],
            is_takeout: true,
            table_number: None,
            kitchen_notes: None,
            customer_id: None,
            customer_name: None,
            created_at: 1_000,
            confirmed_at: None,
            kitchen_started_at: None,
            ready_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            updated_at: 1_000,
            base_estimate_minutes: 20,
            preparation_minutes: 15,
            admission_delay_minutes: 0,
            status_history: Vec::new(),
        }
    }

    #[test]
    fn test_order_number_counter_is_per_day() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_order_number_txn(&txn, "20250101").unwrap(), 1);
        assert_eq!(storage.next_order_number_txn(&txn, "20250101").unwrap(), 2);
        assert_eq!(storage.next_order_number_txn(&txn, "20250102").unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_active_index_follows_status() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let mut order = test_order("o1");

        let txn = storage.begin_write().unwrap();
        storage.store_order_txn(&txn, &order).unwrap();
        txn.commit().unwrap();
        assert_eq!(storage.get_active_order_ids().unwrap(), vec!["o1"]);

        order.status = OrderStatus::Cancelled;
        let txn = storage.begin_write().unwrap();
        storage.store_order_txn(&txn, &order).unwrap();
        txn.commit().unwrap();

        assert!(storage.get_active_orders().unwrap().is_empty());
        let stored = storage.get_order("o1").unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_uncommitted_write_is_invisible() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.store_order_txn(&txn, &test_order("o1")).unwrap();
        drop(txn);
        assert!(storage.get_order("o1").unwrap().is_none());
    }

    #[test]
    fn test_pending_deduction_merges_duplicates() {
        let deduction = PendingDeduction::new(
            "o1",
            vec![
                ("fries".to_string(), 1),
                ("cola".to_string(), 2),
                ("fries".to_string(), 3),
            ],
        );
        assert_eq!(deduction.lines.len(), 2);
        assert_eq!(deduction.lines[0].quantity, 4);
        assert!(!deduction.is_fully_applied());
    }

    #[test]
    fn test_dead_letter_round_trip() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let mut deduction = PendingDeduction::new("o1", vec![("fries".to_string(), 1)]);

        let txn = storage.begin_write().unwrap();
        storage.queue_deduction_txn(&txn, &deduction).unwrap();
        txn.commit().unwrap();

        deduction.retry_count = 5;
        deduction.last_error = Some("ledger down".to_string());
        storage.update_pending_deduction(&deduction).unwrap();
        storage.move_to_dead_letter(&deduction, "ledger down").unwrap();

        assert!(storage.get_pending_deductions().unwrap().is_empty());
        let dead = storage.get_dead_letters().unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].deduction.retry_count, 5);

        assert_eq!(storage.recover_dead_letters().unwrap(), 1);
        let pending = storage.get_pending_deductions().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].retry_count, 0);
        assert!(storage.get_dead_letters().unwrap().is_empty());

        storage.complete_deduction(&pending[0].deduction_id).unwrap();
        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.pending_deduction_count, 0);
        assert_eq!(stats.dead_letter_count, 0);
    }

    #[test]
    fn test_assignments() {
        let storage = OrderStorage::open_in_memory().unwrap();
        assert!(storage.get_assignment("s1").unwrap().is_none());
        storage
            .store_assignment(&TableAssignment {
                staff_id: "s1".to_string(),
                tables: vec![1, 2],
                updated_at: 5,
            })
            .unwrap();
        assert_eq!(storage.get_assignment("s1").unwrap().unwrap().tables, vec![1, 2]);
    }
}
