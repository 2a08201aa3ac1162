//! Order log records.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::executor::StoreError;

/// Order lifecycle status, persisted as a smallint id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The smallint id stored in the `orders.status_id` column.
    pub fn id(self) -> i16 {
        match self {
            OrderStatus::Pending => 1,
            OrderStatus::Completed => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    /// Decode a stored status id.
    pub fn from_id(id: i16) -> Result<Self, StoreError> {
        match id {
            1 => Ok(OrderStatus::Pending),
            2 => Ok(OrderStatus::Completed),
            3 => Ok(OrderStatus::Cancelled),
            other => Err(StoreError::Decode(format!("unknown status id {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

/// A placed order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i32,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub total_price: Decimal,
}

impl Order {
    /// Decode from the projection `order_id, order_date, status_id,
    /// customer_name, phone_number, notes, total_price`.
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        let status_id: i16 = row.try_get(2).map_err(decode)?;
        Ok(Self {
            id: row.try_get(0).map_err(decode)?,
            order_date: row.try_get(1).map_err(decode)?,
            status: OrderStatus::from_id(status_id)?,
            customer_name: row.try_get(3).map_err(decode)?,
            phone_number: row.try_get(4).map_err(decode)?,
            notes: row.try_get(5).map_err(decode)?,
            total_price: row.try_get(6).map_err(decode)?,
        })
    }
}

/// Order header fields staged by the commit protocol before the store
/// assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub total_price: Decimal,
}

/// One line of a placed order.
///
/// `unit_price` is the price at the time of the order; later catalog price
/// changes never alter historical lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub order_id: i32,
    pub coffee_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
}

fn decode(err: may_postgres::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ids_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_id(status.id()).unwrap(), status);
        }
        assert!(OrderStatus::from_id(9).is_err());
    }

    #[test]
    fn status_names() {
        assert_eq!(OrderStatus::Pending.as_str(), "Pending");
        assert_eq!(OrderStatus::Cancelled.as_str(), "Cancelled");
    }
}
