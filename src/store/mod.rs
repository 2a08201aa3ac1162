//! Inventory and order store contracts.
//!
//! [`Datastore`] covers the catalog reads/writes used by the inventory
//! editor and the order composer's load step. [`StoreTransaction`] is the
//! explicit unit of work for the commit protocol: the order header, its
//! line items, and the stock decrements are staged through one transaction
//! value and become durable only on `commit()`.
//!
//! The store is single-writer: one active editor/composer per backing
//! database. Neither backend implements row versioning; instead both
//! enforce a non-negative stock floor on decrement, so a stale stock
//! snapshot fails the commit rather than driving stock negative.

pub mod memory;
pub mod postgres;

use rust_decimal::Decimal;

use crate::executor::StoreError;
use crate::model::{CoffeeType, InventoryItem, ItemDraft, NewOrder, Order};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Catalog and order persistence contract.
pub trait Datastore {
    /// The unit-of-work type for this backend.
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    /// List every inventory item, in id order.
    fn list_items(&mut self) -> Result<Vec<InventoryItem>, StoreError>;

    /// List inventory items with stock > 0, in id order.
    fn list_in_stock(&mut self) -> Result<Vec<InventoryItem>, StoreError>;

    /// Fetch one item by id.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no such row exists.
    fn get_item(&mut self, id: i32) -> Result<InventoryItem, StoreError>;

    /// Insert a new item and return its assigned id.
    fn create_item(&mut self, draft: &ItemDraft) -> Result<i32, StoreError>;

    /// Overwrite an existing item's fields.
    fn update_item(&mut self, id: i32, draft: &ItemDraft) -> Result<(), StoreError>;

    /// Delete an item, cascading deletion of its historical order lines.
    ///
    /// The cascade destroys order-line history for the item; it replicates
    /// the source system's policy and is flagged in DESIGN.md.
    fn delete_item(&mut self, id: i32) -> Result<(), StoreError>;

    /// List coffee types, ordered by display name.
    fn list_types(&mut self) -> Result<Vec<CoffeeType>, StoreError>;

    /// Insert a new coffee type and return its assigned id.
    fn create_type(&mut self, name: &str) -> Result<i32, StoreError>;

    /// List placed orders, oldest first.
    fn list_orders(&mut self) -> Result<Vec<Order>, StoreError>;

    /// Open a unit of work for the order commit protocol.
    fn begin(&mut self) -> Result<Self::Tx<'_>, StoreError>;
}

/// One atomic unit of order-commit writes.
///
/// Dropping a transaction without calling `commit()` discards its staged
/// writes (the Postgres backend relies on the connection's transaction
/// state, the memory backend on its staging buffers).
pub trait StoreTransaction {
    /// Stage the order header; returns the id the order will have once
    /// committed.
    fn create_order(&mut self, order: &NewOrder) -> Result<i32, StoreError>;

    /// Stage one order line with its price snapshot.
    fn add_line_item(
        &mut self,
        order_id: i32,
        coffee_id: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<(), StoreError>;

    /// Stage a stock decrement.
    ///
    /// # Errors
    ///
    /// `StoreError::InsufficientStock` if the decrement would push the
    /// item's stock below zero; `StoreError::NotFound` if the item is gone.
    fn decrement_stock(&mut self, coffee_id: i32, amount: i32) -> Result<(), StoreError>;

    /// Make every staged write durable.
    fn commit(self) -> Result<(), StoreError>;

    /// Discard every staged write.
    fn rollback(self) -> Result<(), StoreError>;
}
