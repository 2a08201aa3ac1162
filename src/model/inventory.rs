//! Catalog records: coffee types and inventory items.

use may_postgres::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::executor::StoreError;

/// A coffee variety (e.g. "Arabica"), referenced by inventory items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoffeeType {
    pub id: i32,
    pub name: String,
}

impl CoffeeType {
    /// Decode from the projection `coffee_type_id, type_name`.
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.try_get(0).map_err(decode)?,
            name: row.try_get(1).map_err(decode)?,
        })
    }
}

/// A purchasable catalog item with its live stock level.
///
/// `quantity_in_stock` never goes negative: both store backends refuse a
/// decrement below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i32,
    pub name: String,
    pub coffee_type: CoffeeType,
    pub quantity_in_stock: i32,
    pub price_per_kg: Decimal,
    pub description: Option<String>,
}

impl InventoryItem {
    /// Decode from the canonical joined projection:
    /// `coffee_id, coffee_name, coffee_type_id, type_name, quantity_in_stock,
    /// price_per_kg, description`.
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.try_get(0).map_err(decode)?,
            name: row.try_get(1).map_err(decode)?,
            coffee_type: CoffeeType {
                id: row.try_get(2).map_err(decode)?,
                name: row.try_get(3).map_err(decode)?,
            },
            quantity_in_stock: row.try_get(4).map_err(decode)?,
            price_per_kg: row.try_get(5).map_err(decode)?,
            description: row.try_get(6).map_err(decode)?,
        })
    }
}

/// Input fields for creating or updating an inventory item.
///
/// Field validation (non-empty name, positive quantity and price) lives in
/// [`CatalogEditor`](crate::catalog::CatalogEditor); referential checks
/// (the coffee type must exist) live in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub coffee_type_id: i32,
    pub quantity_in_stock: i32,
    pub price_per_kg: Decimal,
    pub description: Option<String>,
}

fn decode(err: may_postgres::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_equality_is_field_wise() {
        let arabica = CoffeeType {
            id: 1,
            name: "Arabica".to_string(),
        };
        let a = InventoryItem {
            id: 1,
            name: "House Blend".to_string(),
            coffee_type: arabica.clone(),
            quantity_in_stock: 5,
            price_per_kg: Decimal::new(1000, 2),
            description: None,
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.quantity_in_stock = 4;
        assert_ne!(a, b);
    }
}
