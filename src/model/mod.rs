//! Domain records for the coffee catalog and order log.

mod inventory;
mod order;

pub use inventory::{CoffeeType, InventoryItem, ItemDraft};
pub use order::{NewOrder, Order, OrderLineItem, OrderStatus};
