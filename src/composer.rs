//! Order composition and stock reservation.
//!
//! The composer is an in-memory working set over the in-stock inventory:
//! each line carries a snapshot of the item (name, type, unit price) plus a
//! quantity ceiling equal to the stock level at load time. Quantity
//! mutations clamp to `[0, max]`, the total is always derived from current
//! quantities, and `submit()` runs the commit protocol (order header,
//! line items, stock decrements) inside one store transaction.
//!
//! The presentation layer drives the mutation operations and subscribes to
//! [`ComposerEvent`] notifications instead of binding to mutable fields.

use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rust_decimal::Decimal;
use std::fmt;

use crate::executor::StoreError;
use crate::model::{InventoryItem, NewOrder, OrderStatus};
use crate::store::{Datastore, StoreTransaction};

/// One selectable line in the composer's working set.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub coffee_id: i32,
    pub coffee_name: String,
    pub type_name: String,
    pub unit_price: Decimal,
    /// Stock ceiling, bound to the stock level at load time.
    pub max_quantity: i32,
    quantity: i32,
}

impl OrderLine {
    fn from_item(item: &InventoryItem) -> Self {
        Self {
            coffee_id: item.id,
            coffee_name: item.name.clone(),
            type_name: item.coffee_type.name.clone(),
            unit_price: item.price_per_kg,
            max_quantity: item.quantity_in_stock,
            quantity: 0,
        }
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Outcome of a quantity mutation. `StockLimitReached` is a soft signal
/// for the caller to report, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    Applied { item_id: i32, quantity: i32 },
    StockLimitReached { item_id: i32, max_quantity: i32 },
    UnknownItem { item_id: i32 },
}

/// State-change notification for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    SelectionChanged { total: Decimal },
    Cleared,
    Submitted { order_id: i32, total: Decimal },
}

/// Validation failures caught before any store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingCustomerName,
    EmptySelection,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingCustomerName => {
                write!(f, "Customer name is required")
            }
            ValidationError::EmptySelection => {
                write!(f, "Order must contain at least one item")
            }
        }
    }
}

/// Composer error type
#[derive(Debug)]
pub enum ComposerError {
    /// Store unreachable while loading the working set
    Load(StoreError),
    /// Submission rejected before any store write
    Validation(ValidationError),
    /// Persistence failure during the commit protocol
    Commit(StoreError),
}

impl fmt::Display for ComposerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposerError::Load(e) => {
                write!(f, "Error loading inventory: {e}")
            }
            ComposerError::Validation(e) => {
                write!(f, "{e}")
            }
            ComposerError::Commit(e) => {
                write!(f, "Error creating order: {e}")
            }
        }
    }
}

impl std::error::Error for ComposerError {}

/// Identity and total of a successfully committed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: i32,
    pub total: Decimal,
}

/// The order-composition state container.
pub struct OrderComposer {
    lines: Vec<OrderLine>,
    customer_name: String,
    phone_number: String,
    notes: String,
    subscribers: Vec<Sender<ComposerEvent>>,
}

impl OrderComposer {
    /// Build the working set from all inventory items with stock > 0.
    ///
    /// # Errors
    ///
    /// Returns `ComposerError::Load` if the store is unreachable; no
    /// composer is constructed in that case.
    pub fn load<D: Datastore>(store: &mut D) -> Result<Self, ComposerError> {
        let items = store.list_in_stock().map_err(ComposerError::Load)?;
        log::debug!("composer loaded {} in-stock items", items.len());
        Ok(Self {
            lines: items.iter().map(OrderLine::from_item).collect(),
            customer_name: String::new(),
            phone_number: String::new(),
            notes: String::new(),
            subscribers: Vec::new(),
        })
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&mut self) -> Receiver<ComposerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// The full working set, in load order.
    pub fn available(&self) -> &[OrderLine] {
        &self.lines
    }

    /// The derived selection: lines with quantity > 0, in load order.
    /// Recomputed on every call, never stored.
    pub fn selected(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .filter(|l| l.quantity > 0)
            .cloned()
            .collect()
    }

    /// Raise an item's quantity by one, clamped at its stock ceiling.
    pub fn increase(&mut self, item_id: i32) -> Adjustment {
        let Some(line) = self.lines.iter_mut().find(|l| l.coffee_id == item_id) else {
            return Adjustment::UnknownItem { item_id };
        };
        if line.quantity >= line.max_quantity {
            let max_quantity = line.max_quantity;
            log::warn!("stock limit reached for item {item_id} (max {max_quantity})");
            return Adjustment::StockLimitReached {
                item_id,
                max_quantity,
            };
        }
        line.quantity += 1;
        let quantity = line.quantity;
        self.notify_selection_changed();
        Adjustment::Applied { item_id, quantity }
    }

    /// Lower an item's quantity by one; a no-op at zero.
    pub fn decrease(&mut self, item_id: i32) -> Adjustment {
        let Some(line) = self.lines.iter_mut().find(|l| l.coffee_id == item_id) else {
            return Adjustment::UnknownItem { item_id };
        };
        if line.quantity > 0 {
            line.quantity -= 1;
            let quantity = line.quantity;
            self.notify_selection_changed();
            return Adjustment::Applied { item_id, quantity };
        }
        Adjustment::Applied {
            item_id,
            quantity: 0,
        }
    }

    /// Drop an item from the selection entirely. Idempotent.
    pub fn remove(&mut self, item_id: i32) -> Adjustment {
        let Some(line) = self.lines.iter_mut().find(|l| l.coffee_id == item_id) else {
            return Adjustment::UnknownItem { item_id };
        };
        if line.quantity != 0 {
            line.quantity = 0;
            self.notify_selection_changed();
        }
        Adjustment::Applied {
            item_id,
            quantity: 0,
        }
    }

    /// Reset every quantity to zero and clear the customer fields.
    ///
    /// Unconditional; any "are you sure?" confirmation belongs to the
    /// caller.
    pub fn clear_all(&mut self) {
        for line in &mut self.lines {
            line.quantity = 0;
        }
        self.customer_name.clear();
        self.phone_number.clear();
        self.notes.clear();
        self.emit(ComposerEvent::Cleared);
    }

    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    pub fn set_phone_number(&mut self, phone: impl Into<String>) {
        self.phone_number = phone.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Sum of quantity × unit price over the selection. Always derived
    /// from current quantities.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    /// The total rendered with two decimal places, e.g. `"30.00"`.
    pub fn formatted_total(&self) -> String {
        format!("{:.2}", self.total())
    }

    /// Run the commit protocol: order header, line items with price
    /// snapshots, stock decrements, all inside one store transaction.
    ///
    /// On success the session state is cleared and the new order's
    /// identity and total are returned.
    ///
    /// # Errors
    ///
    /// `ComposerError::Validation` (blank customer name or empty
    /// selection) before any store call; `ComposerError::Commit` if any
    /// step of the protocol fails, in which case the transaction is rolled
    /// back and the composer's state is left unchanged.
    pub fn submit<D: Datastore>(&mut self, store: &mut D) -> Result<OrderReceipt, ComposerError> {
        let customer_name = self.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(ComposerError::Validation(
                ValidationError::MissingCustomerName,
            ));
        }
        let selected = self.selected();
        if selected.is_empty() {
            return Err(ComposerError::Validation(ValidationError::EmptySelection));
        }

        let total = self.total();
        let header = NewOrder {
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            customer_name,
            phone_number: blank_to_none(&self.phone_number),
            notes: blank_to_none(&self.notes),
            total_price: total,
        };

        let mut tx = store.begin().map_err(ComposerError::Commit)?;
        let order_id = match stage_order(&mut tx, &header, &selected) {
            Ok(order_id) => order_id,
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    log::warn!("rollback after failed commit also failed: {rb}");
                }
                return Err(ComposerError::Commit(e));
            }
        };
        tx.commit().map_err(ComposerError::Commit)?;

        log::info!("order {order_id} created, total {total}");
        self.clear_all();
        self.emit(ComposerEvent::Submitted { order_id, total });
        Ok(OrderReceipt { order_id, total })
    }

    fn notify_selection_changed(&mut self) {
        let total = self.total();
        self.emit(ComposerEvent::SelectionChanged { total });
    }

    fn emit(&mut self, event: ComposerEvent) {
        // Disconnected receivers are pruned on the next emit.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

/// Stage every write of the commit protocol on an open transaction.
///
/// Line items are written in load order, each followed by its stock
/// decrement.
fn stage_order<T: StoreTransaction>(
    tx: &mut T,
    header: &NewOrder,
    selected: &[OrderLine],
) -> Result<i32, StoreError> {
    let order_id = tx.create_order(header)?;
    for line in selected {
        tx.add_line_item(order_id, line.coffee_id, line.quantity, line.unit_price)?;
        tx.decrement_stock(line.coffee_id, line.quantity)?;
    }
    Ok(order_id)
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
