//! In-process store backend.
//!
//! Implements the same contracts as the PostgreSQL backend over plain
//! vectors, with a staged-write transaction: `create_order`,
//! `add_line_item`, and `decrement_stock` accumulate in buffers and are
//! applied to the store only on `commit()`. Used by the unit and scenario
//! tests, and usable as a demo backend.

use rust_decimal::Decimal;

use crate::executor::StoreError;
use crate::model::{CoffeeType, InventoryItem, ItemDraft, NewOrder, Order, OrderLineItem};
use crate::store::{Datastore, StoreTransaction};

/// Volatile store with sequential id assignment.
#[derive(Debug, Default)]
pub struct MemoryStore {
    types: Vec<CoffeeType>,
    items: Vec<InventoryItem>,
    orders: Vec<Order>,
    lines: Vec<OrderLineItem>,
    next_type_id: i32,
    next_item_id: i32,
    next_order_id: i32,
    writes: u64,
    fail_op: Option<&'static str>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_type_id: 1,
            next_item_id: 1,
            next_order_id: 1,
            ..Self::default()
        }
    }

    /// Committed orders, in creation order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Committed order lines, in creation order.
    pub fn line_items(&self) -> &[OrderLineItem] {
        &self.lines
    }

    /// Number of durable writes applied so far (row inserts, updates,
    /// deletes, and stock decrements each count as one).
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Make the next operation with the given name fail once.
    /// Recognized names: `list_in_stock`, `create_order`, `add_line_item`,
    /// `decrement_stock`, `commit`.
    pub fn fail_next(&mut self, op: &'static str) {
        self.fail_op = Some(op);
    }

    fn trip(&mut self, op: &'static str) -> Result<(), StoreError> {
        if self.fail_op == Some(op) {
            self.fail_op = None;
            return Err(StoreError::Other(format!("injected failure: {op}")));
        }
        Ok(())
    }

    fn require_type(&self, id: i32) -> Result<CoffeeType, StoreError> {
        self.types
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "coffee_types",
                id,
            })
    }

    fn item_index(&self, id: i32) -> Result<usize, StoreError> {
        self.items
            .iter()
            .position(|i| i.id == id)
            .ok_or(StoreError::NotFound {
                entity: "coffee_inventory",
                id,
            })
    }
}

impl Datastore for MemoryStore {
    type Tx<'a> = MemoryTransaction<'a>
    where
        Self: 'a;

    fn list_items(&mut self) -> Result<Vec<InventoryItem>, StoreError> {
        Ok(self.items.clone())
    }

    fn list_in_stock(&mut self) -> Result<Vec<InventoryItem>, StoreError> {
        self.trip("list_in_stock")?;
        Ok(self
            .items
            .iter()
            .filter(|i| i.quantity_in_stock > 0)
            .cloned()
            .collect())
    }

    fn get_item(&mut self, id: i32) -> Result<InventoryItem, StoreError> {
        let idx = self.item_index(id)?;
        Ok(self.items[idx].clone())
    }

    fn create_item(&mut self, draft: &ItemDraft) -> Result<i32, StoreError> {
        let coffee_type = self.require_type(draft.coffee_type_id)?;
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.push(InventoryItem {
            id,
            name: draft.name.clone(),
            coffee_type,
            quantity_in_stock: draft.quantity_in_stock,
            price_per_kg: draft.price_per_kg,
            description: draft.description.clone(),
        });
        self.writes += 1;
        Ok(id)
    }

    fn update_item(&mut self, id: i32, draft: &ItemDraft) -> Result<(), StoreError> {
        let coffee_type = self.require_type(draft.coffee_type_id)?;
        let idx = self.item_index(id)?;
        let item = &mut self.items[idx];
        item.name = draft.name.clone();
        item.coffee_type = coffee_type;
        item.quantity_in_stock = draft.quantity_in_stock;
        item.price_per_kg = draft.price_per_kg;
        item.description = draft.description.clone();
        self.writes += 1;
        Ok(())
    }

    fn delete_item(&mut self, id: i32) -> Result<(), StoreError> {
        let idx = self.item_index(id)?;
        let cascaded = self.lines.iter().filter(|l| l.coffee_id == id).count();
        self.lines.retain(|l| l.coffee_id != id);
        self.items.remove(idx);
        self.writes += 1 + cascaded as u64;
        if cascaded > 0 {
            log::warn!("deleted item {id} and cascaded {cascaded} historical order lines");
        }
        Ok(())
    }

    fn list_types(&mut self) -> Result<Vec<CoffeeType>, StoreError> {
        let mut types = self.types.clone();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    fn create_type(&mut self, name: &str) -> Result<i32, StoreError> {
        if self.types.iter().any(|t| t.name == name) {
            return Err(StoreError::Query(format!(
                "duplicate coffee type name: {name}"
            )));
        }
        let id = self.next_type_id;
        self.next_type_id += 1;
        self.types.push(CoffeeType {
            id,
            name: name.to_string(),
        });
        self.writes += 1;
        Ok(id)
    }

    fn list_orders(&mut self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.clone())
    }

    fn begin(&mut self) -> Result<MemoryTransaction<'_>, StoreError> {
        Ok(MemoryTransaction {
            store: self,
            staged_orders: Vec::new(),
            staged_lines: Vec::new(),
            staged_decrements: Vec::new(),
        })
    }
}

/// Staged-write unit of work over a [`MemoryStore`].
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    staged_orders: Vec<Order>,
    staged_lines: Vec<OrderLineItem>,
    staged_decrements: Vec<(i32, i32)>,
}

impl MemoryTransaction<'_> {
    fn staged_decrement_for(&self, coffee_id: i32) -> i32 {
        self.staged_decrements
            .iter()
            .filter(|(id, _)| *id == coffee_id)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn create_order(&mut self, order: &NewOrder) -> Result<i32, StoreError> {
        self.store.trip("create_order")?;
        let id = self.store.next_order_id + self.staged_orders.len() as i32;
        self.staged_orders.push(Order {
            id,
            order_date: order.order_date,
            status: order.status,
            customer_name: order.customer_name.clone(),
            phone_number: order.phone_number.clone(),
            notes: order.notes.clone(),
            total_price: order.total_price,
        });
        Ok(id)
    }

    fn add_line_item(
        &mut self,
        order_id: i32,
        coffee_id: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<(), StoreError> {
        self.store.trip("add_line_item")?;
        self.store.item_index(coffee_id)?;
        if !self.staged_orders.iter().any(|o| o.id == order_id)
            && !self.store.orders.iter().any(|o| o.id == order_id)
        {
            return Err(StoreError::NotFound {
                entity: "orders",
                id: order_id,
            });
        }
        self.staged_lines.push(OrderLineItem {
            order_id,
            coffee_id,
            quantity,
            unit_price,
        });
        Ok(())
    }

    fn decrement_stock(&mut self, coffee_id: i32, amount: i32) -> Result<(), StoreError> {
        self.store.trip("decrement_stock")?;
        let idx = self.store.item_index(coffee_id)?;
        let available = self.store.items[idx].quantity_in_stock - self.staged_decrement_for(coffee_id);
        if amount > available {
            return Err(StoreError::InsufficientStock {
                coffee_id,
                requested: amount,
                available,
            });
        }
        self.staged_decrements.push((coffee_id, amount));
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let store = self.store;
        if store.fail_op == Some("commit") {
            store.fail_op = None;
            return Err(StoreError::Other("injected failure: commit".to_string()));
        }
        let writes = self.staged_orders.len() + self.staged_lines.len() + self.staged_decrements.len();
        store.next_order_id += self.staged_orders.len() as i32;
        store.orders.extend(self.staged_orders);
        store.lines.extend(self.staged_lines);
        for (coffee_id, amount) in self.staged_decrements {
            if let Ok(idx) = store.item_index(coffee_id) {
                store.items[idx].quantity_in_stock -= amount;
            }
        }
        store.writes += writes as u64;
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        // Staging buffers are dropped with self.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::model::OrderStatus;

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        let arabica = store.create_type("Arabica").unwrap();
        store
            .create_item(&ItemDraft {
                name: "House Blend".to_string(),
                coffee_type_id: arabica,
                quantity_in_stock: 5,
                price_per_kg: Decimal::new(1000, 2),
                description: None,
            })
            .unwrap();
        store
    }

    fn pending_order(name: &str, total: Decimal) -> NewOrder {
        NewOrder {
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            customer_name: name.to_string(),
            phone_number: None,
            notes: None,
            total_price: total,
        }
    }

    #[test]
    fn staged_writes_are_invisible_until_commit() {
        let mut store = seeded();
        let mut tx = store.begin().unwrap();
        let order_id = tx.create_order(&pending_order("Jane", Decimal::new(3000, 2))).unwrap();
        tx.add_line_item(order_id, 1, 3, Decimal::new(1000, 2)).unwrap();
        tx.decrement_stock(1, 3).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.line_items().len(), 1);
        assert_eq!(store.get_item(1).unwrap().quantity_in_stock, 2);
    }

    #[test]
    fn rollback_discards_everything() {
        let mut store = seeded();
        let before = store.write_count();
        let mut tx = store.begin().unwrap();
        let order_id = tx.create_order(&pending_order("Jane", Decimal::ZERO)).unwrap();
        tx.add_line_item(order_id, 1, 2, Decimal::new(1000, 2)).unwrap();
        tx.decrement_stock(1, 2).unwrap();
        tx.rollback().unwrap();

        assert!(store.orders().is_empty());
        assert!(store.line_items().is_empty());
        assert_eq!(store.get_item(1).unwrap().quantity_in_stock, 5);
        assert_eq!(store.write_count(), before);
    }

    #[test]
    fn decrement_enforces_the_stock_floor() {
        let mut store = seeded();
        let mut tx = store.begin().unwrap();
        tx.decrement_stock(1, 4).unwrap();
        let err = tx.decrement_stock(1, 2).unwrap_err();
        match err {
            StoreError::InsufficientStock {
                coffee_id,
                requested,
                available,
            } => {
                assert_eq!(coffee_id, 1);
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn delete_item_cascades_order_lines() {
        let mut store = seeded();
        let mut tx = store.begin().unwrap();
        let order_id = tx.create_order(&pending_order("Jane", Decimal::new(1000, 2))).unwrap();
        tx.add_line_item(order_id, 1, 1, Decimal::new(1000, 2)).unwrap();
        tx.decrement_stock(1, 1).unwrap();
        tx.commit().unwrap();

        store.delete_item(1).unwrap();
        assert!(store.line_items().is_empty(), "historical lines cascade");
        assert!(matches!(
            store.get_item(1),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn ids_are_not_reseeded_after_delete() {
        let mut store = seeded();
        store.delete_item(1).unwrap();
        let arabica = store.list_types().unwrap()[0].id;
        let id = store
            .create_item(&ItemDraft {
                name: "Dark Roast".to_string(),
                coffee_type_id: arabica,
                quantity_in_stock: 3,
                price_per_kg: Decimal::new(1200, 2),
                description: None,
            })
            .unwrap();
        assert_eq!(id, 2, "deleted ids are never reclaimed");
    }

    #[test]
    fn duplicate_type_name_is_rejected() {
        let mut store = seeded();
        assert!(matches!(
            store.create_type("Arabica"),
            Err(StoreError::Query(_))
        ));
    }
}
