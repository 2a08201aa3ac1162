//! PostgreSQL-backed store.
//!
//! Raw `$n`-parameterized statements through the executor trait. The
//! commit-protocol writes run on a [`Transaction`](crate::Transaction)
//! cloned off the store's connection, so they share its session and
//! become durable together.

use may_postgres::Client;
use rust_decimal::Decimal;

use crate::executor::{PostgresExecutor, StoreError, StoreExecutor};
use crate::model::{CoffeeType, InventoryItem, ItemDraft, NewOrder, Order};
use crate::store::{Datastore, StoreTransaction};
use crate::transaction::Transaction;

const ITEM_PROJECTION: &str = "SELECT i.coffee_id, i.coffee_name, i.coffee_type_id, t.type_name, \
     i.quantity_in_stock, i.price_per_kg, i.description \
     FROM coffee_inventory i \
     JOIN coffee_types t ON t.coffee_type_id = i.coffee_type_id";

/// Store backed by a live PostgreSQL connection.
pub struct PgStore {
    executor: PostgresExecutor,
}

impl PgStore {
    /// Wrap an established client connection.
    pub fn new(client: Client) -> Self {
        Self {
            executor: PostgresExecutor::new(client),
        }
    }

    /// Access the underlying executor (schema bootstrap, ad-hoc queries).
    pub fn executor(&self) -> &PostgresExecutor {
        &self.executor
    }

    fn fetch_items(&self, sql: &str) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = self.executor.query_all(sql, &[])?;
        rows.iter().map(InventoryItem::from_row).collect()
    }
}

impl Datastore for PgStore {
    type Tx<'a> = PgTransaction
    where
        Self: 'a;

    fn list_items(&mut self) -> Result<Vec<InventoryItem>, StoreError> {
        let sql = format!("{ITEM_PROJECTION} ORDER BY i.coffee_id");
        self.fetch_items(&sql)
    }

    fn list_in_stock(&mut self) -> Result<Vec<InventoryItem>, StoreError> {
        let sql = format!("{ITEM_PROJECTION} WHERE i.quantity_in_stock > 0 ORDER BY i.coffee_id");
        self.fetch_items(&sql)
    }

    fn get_item(&mut self, id: i32) -> Result<InventoryItem, StoreError> {
        let sql = format!("{ITEM_PROJECTION} WHERE i.coffee_id = $1");
        let rows = self.executor.query_all(&sql, &[&id])?;
        match rows.first() {
            Some(row) => InventoryItem::from_row(row),
            None => Err(StoreError::NotFound {
                entity: "coffee_inventory",
                id,
            }),
        }
    }

    fn create_item(&mut self, draft: &ItemDraft) -> Result<i32, StoreError> {
        let row = self.executor.query_one(
            "INSERT INTO coffee_inventory \
             (coffee_name, coffee_type_id, quantity_in_stock, price_per_kg, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING coffee_id",
            &[
                &draft.name,
                &draft.coffee_type_id,
                &draft.quantity_in_stock,
                &draft.price_per_kg,
                &draft.description,
            ],
        )?;
        let id: i32 = row
            .try_get(0)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        log::debug!("created inventory item {id}");
        Ok(id)
    }

    fn update_item(&mut self, id: i32, draft: &ItemDraft) -> Result<(), StoreError> {
        let affected = self.executor.execute(
            "UPDATE coffee_inventory SET coffee_name = $1, coffee_type_id = $2, \
             quantity_in_stock = $3, price_per_kg = $4, description = $5 \
             WHERE coffee_id = $6",
            &[
                &draft.name,
                &draft.coffee_type_id,
                &draft.quantity_in_stock,
                &draft.price_per_kg,
                &draft.description,
                &id,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "coffee_inventory",
                id,
            });
        }
        Ok(())
    }

    fn delete_item(&mut self, id: i32) -> Result<(), StoreError> {
        // The line-item cascade and the row deletion must land together.
        let tx = self.executor.begin()?;
        let deleted = tx
            .execute("DELETE FROM order_details WHERE coffee_id = $1", &[&id])
            .and_then(|lines| {
                let rows = tx.execute("DELETE FROM coffee_inventory WHERE coffee_id = $1", &[&id])?;
                Ok((lines, rows))
            });
        match deleted {
            Ok((_, 0)) => {
                tx.rollback()?;
                Err(StoreError::NotFound {
                    entity: "coffee_inventory",
                    id,
                })
            }
            Ok((lines, _)) => {
                tx.commit()?;
                if lines > 0 {
                    log::warn!("deleted item {id} and cascaded {lines} historical order lines");
                }
                Ok(())
            }
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    log::warn!("rollback after failed delete also failed: {rb}");
                }
                Err(e)
            }
        }
    }

    fn list_types(&mut self) -> Result<Vec<CoffeeType>, StoreError> {
        let rows = self.executor.query_all(
            "SELECT coffee_type_id, type_name FROM coffee_types ORDER BY type_name",
            &[],
        )?;
        rows.iter().map(CoffeeType::from_row).collect()
    }

    fn create_type(&mut self, name: &str) -> Result<i32, StoreError> {
        let row = self.executor.query_one(
            "INSERT INTO coffee_types (type_name) VALUES ($1) RETURNING coffee_type_id",
            &[&name],
        )?;
        row.try_get(0)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn list_orders(&mut self) -> Result<Vec<Order>, StoreError> {
        let rows = self.executor.query_all(
            "SELECT order_id, order_date, status_id, customer_name, phone_number, notes, \
             total_price FROM orders ORDER BY order_id",
            &[],
        )?;
        rows.iter().map(Order::from_row).collect()
    }

    fn begin(&mut self) -> Result<PgTransaction, StoreError> {
        Ok(PgTransaction {
            tx: self.executor.begin()?,
        })
    }
}

/// Unit of work over an open PostgreSQL transaction.
pub struct PgTransaction {
    tx: Transaction,
}

impl StoreTransaction for PgTransaction {
    fn create_order(&mut self, order: &NewOrder) -> Result<i32, StoreError> {
        let status_id = order.status.id();
        let row = self.tx.query_one(
            "INSERT INTO orders \
             (order_date, status_id, customer_name, phone_number, notes, total_price) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING order_id",
            &[
                &order.order_date,
                &status_id,
                &order.customer_name,
                &order.phone_number,
                &order.notes,
                &order.total_price,
            ],
        )?;
        row.try_get(0)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn add_line_item(
        &mut self,
        order_id: i32,
        coffee_id: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO order_details (order_id, coffee_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4)",
            &[&order_id, &coffee_id, &quantity, &unit_price],
        )?;
        Ok(())
    }

    fn decrement_stock(&mut self, coffee_id: i32, amount: i32) -> Result<(), StoreError> {
        // Guarded update: the non-negative floor is enforced here, not by a
        // version stamp. Zero rows affected means the row is gone or the
        // composer's stock snapshot is stale.
        let affected = self.tx.execute(
            "UPDATE coffee_inventory SET quantity_in_stock = quantity_in_stock - $1 \
             WHERE coffee_id = $2 AND quantity_in_stock >= $1",
            &[&amount, &coffee_id],
        )?;
        if affected == 0 {
            let rows = self.tx.query_all(
                "SELECT quantity_in_stock FROM coffee_inventory WHERE coffee_id = $1",
                &[&coffee_id],
            )?;
            return match rows.first() {
                Some(row) => {
                    let available: i32 = row
                        .try_get(0)
                        .map_err(|e| StoreError::Decode(e.to_string()))?;
                    Err(StoreError::InsufficientStock {
                        coffee_id,
                        requested: amount,
                        available,
                    })
                }
                None => Err(StoreError::NotFound {
                    entity: "coffee_inventory",
                    id: coffee_id,
                }),
            };
        }
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()
    }

    fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback()
    }
}
