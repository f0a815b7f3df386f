//! Inventory ledger
//!
//! [`InventoryLedger`] is the oracle admission consults and the deduction
//! worker decrements. [`StockLedger`] is the default implementation: one redb
//! table of [`StockLevel`] records sharing the order database file.

use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::inventory::{InventoryAlert, StockLevel, StockUpdate};
use thiserror::Error;

use crate::orders::StorageError;
use crate::utils::{AppError, ErrorCode};

/// Table for stock levels: key = menu_item_id, value = JSON-serialized StockLevel
const STOCK_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stock_levels");

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger has no record for this menu item
    #[error("Unknown menu item: {0}")]
    UnknownItem(String),

    #[error("Inventory ledger unreachable: {0}")]
    Unreachable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// The oracle itself failed, as opposed to answering "no such item"
    pub fn is_unreachable(&self) -> bool {
        !matches!(self, LedgerError::UnknownItem(_))
    }
}

macro_rules! impl_from_redb {
    ($($ty:ty),*) => {
        $(impl From<$ty> for LedgerError {
            fn from(err: $ty) -> Self {
                LedgerError::Storage(err.into())
            }
        })*
    };
}

impl_from_redb!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error
);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownItem(id) => AppError::with_message(
                ErrorCode::InventoryItemNotFound,
                format!("Inventory item {} not found", id),
            )
            .with_detail("menu_item_id", id),
            LedgerError::Unreachable(msg) => {
                AppError::with_message(ErrorCode::LedgerUnavailable, msg)
            }
            LedgerError::Storage(e) => {
                tracing::error!(error = %e, "Stock storage error");
                AppError::storage(e.to_string())
            }
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Queryable stock oracle
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Current stock record of one menu item
    async fn stock_level(&self, menu_item_id: &str) -> LedgerResult<StockLevel>;

    /// Subtract `quantity` from on-hand stock, returning the new record
    async fn deduct(&self, menu_item_id: &str, quantity: u32) -> LedgerResult<StockLevel>;
}

/// redb-backed stock table
#[derive(Clone)]
pub struct StockLedger {
    db: Arc<Database>,
}

impl std::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockLedger").finish_non_exhaustive()
    }
}

impl StockLedger {
    /// Open the stock table inside an existing database
    pub fn new(db: Arc<Database>) -> LedgerResult<Self> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(STOCK_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    /// Create or replace the stock record of a menu item
    pub fn set_level(&self, menu_item_id: &str, update: StockUpdate) -> LedgerResult<StockLevel> {
        let level = StockLevel {
            menu_item_id: menu_item_id.to_string(),
            name: update.name,
            on_hand: update.on_hand,
            low_stock_threshold: update.low_stock_threshold,
            updated_at: shared::util::now_millis(),
        };
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(STOCK_TABLE)?;
            let value = serde_json::to_vec(&level)?;
            table.insert(menu_item_id, value.as_slice())?;
        }
        txn.commit()?;
        tracing::info!(
            menu_item_id = %menu_item_id,
            on_hand = level.on_hand,
            threshold = level.low_stock_threshold,
            "Stock level set"
        );
        Ok(level)
    }

    pub fn get_level(&self, menu_item_id: &str) -> LedgerResult<Option<StockLevel>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        match table.get(menu_item_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All stock records, ordered by menu item id
    pub fn list(&self) -> LedgerResult<Vec<StockLevel>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        let mut levels = Vec::new();
        for entry in table.iter()? {
            let (_key, value) = entry?;
            levels.push(serde_json::from_slice(value.value())?);
        }
        Ok(levels)
    }

    /// Out-of-stock and low-stock alerts, most severe first
    pub fn alerts(&self) -> LedgerResult<Vec<InventoryAlert>> {
        let mut alerts: Vec<InventoryAlert> = self
            .list()?
            .iter()
            .filter_map(InventoryAlert::for_level)
            .collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.on_hand.cmp(&b.on_hand))
                .then_with(|| a.menu_item_id.cmp(&b.menu_item_id))
        });
        Ok(alerts)
    }
}

#[async_trait]
impl InventoryLedger for StockLedger {
    async fn stock_level(&self, menu_item_id: &str) -> LedgerResult<StockLevel> {
        self.get_level(menu_item_id)?
            .ok_or_else(|| LedgerError::UnknownItem(menu_item_id.to_string()))
    }

    /// Stock never goes below zero; an order admitted on stale stock clamps at zero
    async fn deduct(&self, menu_item_id: &str, quantity: u32) -> LedgerResult<StockLevel> {
        let txn = self.db.begin_write()?;
        let level = {
            let mut table = txn.open_table(STOCK_TABLE)?;
            let current: Option<StockLevel> = match table.get(menu_item_id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            let Some(mut level) = current else {
                return Err(LedgerError::UnknownItem(menu_item_id.to_string()));
            };
            if level.on_hand < quantity {
                tracing::warn!(
                    menu_item_id = %menu_item_id,
                    on_hand = level.on_hand,
                    requested = quantity,
                    "Deduction exceeds stock, clamping at zero"
                );
            }
            level.on_hand = level.on_hand.saturating_sub(quantity);
            level.updated_at = shared::util::now_millis();
            let value = serde_json::to_vec(&level)?;
            table.insert(menu_item_id, value.as_slice())?;
            level
        };
        txn.commit()?;
        Ok(level)
    }
}
