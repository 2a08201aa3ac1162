//! Catalog maintenance: validated CRUD over inventory items and coffee
//! types.
//!
//! Field validation happens here, before any store call; referential and
//! uniqueness checks are the store's job. Deleting an item cascades
//! deletion of its historical order lines. That is the source system's
//! policy, kept as-is and flagged in DESIGN.md.

use std::fmt;

use rust_decimal::Decimal;

use crate::executor::StoreError;
use crate::model::{CoffeeType, InventoryItem, ItemDraft};
use crate::store::Datastore;

/// Catalog error type
#[derive(Debug)]
pub enum CatalogError {
    /// A field failed validation; the message names the field and rule
    Invalid(String),
    /// Store-level failure
    Store(StoreError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Invalid(s) => {
                write!(f, "{s}")
            }
            CatalogError::Store(e) => {
                write!(f, "Store error: {e}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::Store(err)
    }
}

/// Validated catalog operations over any store backend.
pub struct CatalogEditor<'a, D: Datastore> {
    store: &'a mut D,
}

impl<'a, D: Datastore> CatalogEditor<'a, D> {
    pub fn new(store: &'a mut D) -> Self {
        Self { store }
    }

    /// All inventory items, in id order.
    pub fn refresh(&mut self) -> Result<Vec<InventoryItem>, CatalogError> {
        Ok(self.store.list_items()?)
    }

    /// Fetch one item by id.
    ///
    /// # Errors
    ///
    /// `CatalogError::Store(StoreError::NotFound)` if no such item exists.
    pub fn find_item(&mut self, id: i32) -> Result<InventoryItem, CatalogError> {
        Ok(self.store.get_item(id)?)
    }

    /// Validate and insert a new item; returns its assigned id.
    pub fn add_item(&mut self, draft: &ItemDraft) -> Result<i32, CatalogError> {
        validate_draft(draft)?;
        let id = self.store.create_item(draft)?;
        log::info!("catalog: added item {id} ({})", draft.name);
        Ok(id)
    }

    /// Validate and overwrite an existing item's fields.
    pub fn update_item(&mut self, id: i32, draft: &ItemDraft) -> Result<(), CatalogError> {
        validate_draft(draft)?;
        self.store.update_item(id, draft)?;
        log::info!("catalog: updated item {id}");
        Ok(())
    }

    /// Delete an item, cascading its historical order lines.
    pub fn delete_item(&mut self, id: i32) -> Result<(), CatalogError> {
        self.store.delete_item(id)?;
        log::info!("catalog: deleted item {id}");
        Ok(())
    }

    /// Coffee types, ordered by display name.
    pub fn coffee_types(&mut self) -> Result<Vec<CoffeeType>, CatalogError> {
        Ok(self.store.list_types()?)
    }

    /// Add a new coffee type; the name must be non-blank and unique.
    pub fn add_coffee_type(&mut self, name: &str) -> Result<i32, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::Invalid(
                "Please enter a coffee type name".to_string(),
            ));
        }
        let id = self.store.create_type(name)?;
        log::info!("catalog: added coffee type {id} ({name})");
        Ok(id)
    }
}

fn validate_draft(draft: &ItemDraft) -> Result<(), CatalogError> {
    if draft.name.trim().is_empty() {
        return Err(CatalogError::Invalid(
            "Please enter a coffee name".to_string(),
        ));
    }
    if draft.quantity_in_stock <= 0 {
        return Err(CatalogError::Invalid(
            "Please enter a valid quantity (positive number)".to_string(),
        ));
    }
    if draft.price_per_kg <= Decimal::ZERO {
        return Err(CatalogError::Invalid(
            "Please enter a valid price (positive number)".to_string(),
        ));
    }
    Ok(())
}
