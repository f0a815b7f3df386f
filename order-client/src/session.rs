//! 会话上下文 - 购物车、选桌、最近订单
//!
//! [`Session`] 持有一份 [`SessionContext`]，由注入的 [`SessionStore`]
//! 读穿透加载、每次修改后写穿透保存。`last_order_id` 只是缓存，
//! 使用前必须通过 `GET /orders/{id}` 重新校验。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::order::{OrderItem, OrderTracker, PlaceOrderRequest};

use crate::{ClientResult, OrderClient};

/// Client-side session state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub cart: Vec<OrderItem>,
    #[serde(default)]
    pub selected_table: Option<u32>,
    #[serde(default)]
    pub takeout: bool,
    /// Not authoritative
    #[serde(default)]
    pub last_order_id: Option<String>,
}

impl SessionContext {
    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(|i| i.line_total()).sum()
    }

    /// Body for `POST /orders` from the current cart
    pub fn to_order_request(&self, kitchen_notes: Option<String>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            items: self.cart.clone(),
            is_takeout: self.takeout,
            table_number: if self.takeout { None } else { self.selected_table },
            kitchen_notes,
            customer_name: None,
        }
    }
}

/// Persistence of a [`SessionContext`]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<SessionContext>>;
    fn save(&self, context: &SessionContext) -> ClientResult<()>;
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_path: impl Into<PathBuf>, filename: &str) -> Self {
        Self {
            path: base_path.into().join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ClientResult<Option<SessionContext>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, context: &SessionContext) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(context)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// 内存存储 (测试 / 无持久化场景)
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<Option<SessionContext>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Option<SessionContext> {
        self.inner.lock().clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ClientResult<Option<SessionContext>> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, context: &SessionContext) -> ClientResult<()> {
        *self.inner.lock() = Some(context.clone());
        Ok(())
    }
}

/// Session context with write-through persistence
pub struct Session<S: SessionStore> {
    context: SessionContext,
    store: S,
}

impl<S: SessionStore> Session<S> {
    /// Load from `store`, starting empty when nothing was saved
    pub fn open(store: S) -> ClientResult<Self> {
        let context = store.load()?.unwrap_or_default();
        Ok(Self { context, store })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The in-memory context only changes once the store accepted the new one
    fn update(&mut self, f: impl FnOnce(&mut SessionContext)) -> ClientResult<()> {
        let mut next = self.context.clone();
        f(&mut next);
        self.store.save(&next)?;
        self.context = next;
        Ok(())
    }

    /// Add a line; an existing line for the same menu item grows instead
    pub fn add_to_cart(&mut self, item: OrderItem) -> ClientResult<()> {
        self.update(|ctx| {
            match ctx
                .cart
                .iter_mut()
                .find(|i| i.menu_item_id == item.menu_item_id)
            {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => ctx.cart.push(item),
            }
        })
    }

    pub fn remove_from_cart(&mut self, menu_item_id: &str) -> ClientResult<()> {
        self.update(|ctx| ctx.cart.retain(|i| i.menu_item_id != menu_item_id))
    }

    pub fn clear_cart(&mut self) -> ClientResult<()> {
        self.update(|ctx| ctx.cart.clear())
    }

    /// Seat at a table (leaves takeout mode)
    pub fn select_table(&mut self, table: u32) -> ClientResult<()> {
        self.update(|ctx| {
            ctx.selected_table = Some(table);
            ctx.takeout = false;
        })
    }

    /// Switch to takeout (clears the table)
    pub fn set_takeout(&mut self, takeout: bool) -> ClientResult<()> {
        self.update(|ctx| {
            ctx.takeout = takeout;
            if takeout {
                ctx.selected_table = None;
            }
        })
    }

    /// Remember a placed order and empty the cart
    pub fn record_order(&mut self, order_id: impl Into<String>) -> ClientResult<()> {
        let order_id = order_id.into();
        self.update(|ctx| {
            ctx.last_order_id = Some(order_id);
            ctx.cart.clear();
        })
    }

    /// Re-validate the cached order id against the server
    ///
    /// A 404 forgets the id. Other failures leave it cached and are returned.
    pub async fn revalidate_last_order(
        &mut self,
        client: &OrderClient,
    ) -> ClientResult<Option<OrderTracker>> {
        let Some(order_id) = self.context.last_order_id.clone() else {
            return Ok(None);
        };
        match client.get_order(&order_id).await {
            Ok(tracker) => Ok(Some(tracker)),
            Err(e) if e.is_not_found() => {
                tracing::info!(order_id = %order_id, "Cached order no longer exists, forgetting it");
                self.update(|ctx| ctx.last_order_id = None)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
