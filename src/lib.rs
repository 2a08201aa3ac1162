//! # Beancounter
//!
//! Inventory and order-management core for a small retail coffee business,
//! built on the `may` runtime and `may_postgres`.
//!
//! The interesting part is the order-composition and stock-reservation
//! workflow in [`composer`]: an in-memory working set over available
//! inventory, per-item quantity ceilings, derived totals, and a commit
//! protocol that writes the order header, its line items, and the stock
//! decrements as one transaction.

pub mod catalog;
pub mod composer;
pub mod config;
pub mod connection;
pub mod executor;
pub mod model;
pub mod schema;
pub mod store;
pub mod transaction;

pub use catalog::{CatalogEditor, CatalogError};
pub use composer::{
    Adjustment, ComposerError, ComposerEvent, OrderComposer, OrderReceipt, ValidationError,
};
pub use crate::config::StoreConfig;
pub use connection::{connect, ConnectionError};
pub use executor::{PostgresExecutor, StoreError, StoreExecutor};
pub use store::{Datastore, StoreTransaction};
pub use transaction::Transaction;
