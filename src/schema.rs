//! Schema bootstrap for the coffee store tables.
//!
//! Four tables: `coffee_types`, `coffee_inventory`, `orders`, and
//! `order_details`. All statements use `IF NOT EXISTS`, so calling
//! [`initialize_schema`] on an already-provisioned database is a no-op.

use sea_query::{
    ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement,
    PostgresQueryBuilder, Table, TableCreateStatement,
};

use crate::executor::{StoreError, StoreExecutor};

/// Create the `coffee_types` table
pub fn create_coffee_types_table() -> TableCreateStatement {
    Table::create()
        .table("coffee_types")
        .if_not_exists()
        .col(
            ColumnDef::new("coffee_type_id")
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new("type_name")
                .string()
                .string_len(100)
                .not_null()
                .unique_key(),
        )
        .to_owned()
}

/// Create the `coffee_inventory` table
pub fn create_inventory_table() -> TableCreateStatement {
    Table::create()
        .table("coffee_inventory")
        .if_not_exists()
        .col(
            ColumnDef::new("coffee_id")
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new("coffee_name")
                .string()
                .string_len(255)
                .not_null(),
        )
        .col(ColumnDef::new("coffee_type_id").integer().not_null())
        .col(ColumnDef::new("quantity_in_stock").integer().not_null())
        .col(ColumnDef::new("price_per_kg").decimal().not_null())
        .col(ColumnDef::new("description").text().null())
        .foreign_key(
            ForeignKey::create()
                .name("fk_coffee_inventory_type")
                .from("coffee_inventory", "coffee_type_id")
                .to("coffee_types", "coffee_type_id"),
        )
        .to_owned()
}

/// Create the `orders` table
pub fn create_orders_table() -> TableCreateStatement {
    Table::create()
        .table("orders")
        .if_not_exists()
        .col(
            ColumnDef::new("order_id")
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new("order_date")
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new("status_id").small_integer().not_null())
        .col(
            ColumnDef::new("customer_name")
                .string()
                .string_len(255)
                .not_null(),
        )
        .col(
            ColumnDef::new("phone_number")
                .string()
                .string_len(50)
                .null(),
        )
        .col(ColumnDef::new("notes").text().null())
        .col(ColumnDef::new("total_price").decimal().not_null())
        .to_owned()
}

/// Create the `order_details` table
///
/// Line items cascade with their order. The reference to
/// `coffee_inventory` carries no delete action; the catalog's (lossy)
/// line-item cascade on item deletion is performed explicitly by the store.
pub fn create_order_details_table() -> TableCreateStatement {
    Table::create()
        .table("order_details")
        .if_not_exists()
        .col(
            ColumnDef::new("order_detail_id")
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new("order_id").integer().not_null())
        .col(ColumnDef::new("coffee_id").integer().not_null())
        .col(ColumnDef::new("quantity").integer().not_null())
        .col(ColumnDef::new("unit_price").decimal().not_null())
        .foreign_key(
            ForeignKey::create()
                .name("fk_order_details_order")
                .from("order_details", "order_id")
                .to("orders", "order_id")
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_order_details_coffee")
                .from("order_details", "coffee_id")
                .to("coffee_inventory", "coffee_id"),
        )
        .to_owned()
}

/// Create index on `order_details.order_id` for line-item lookups
pub fn create_order_details_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_order_details_order_id")
        .table("order_details")
        .col(Expr::col("order_id"))
        .if_not_exists()
        .to_owned()
}

/// Initialize the store schema
///
/// Creates all four tables and the line-item index if they don't exist.
///
/// # Errors
///
/// Returns `StoreError` if any DDL statement fails.
pub fn initialize_schema<E: StoreExecutor>(executor: &E) -> Result<(), StoreError> {
    for table in [
        create_coffee_types_table(),
        create_inventory_table(),
        create_orders_table(),
        create_order_details_table(),
    ] {
        let sql = table.build(PostgresQueryBuilder);
        executor.execute(&sql, &[])?;
    }

    let sql = create_order_details_index().build(PostgresQueryBuilder);
    executor.execute(&sql, &[])?;

    log::info!("store schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_ddl_names_every_column() {
        let sql = create_inventory_table().build(PostgresQueryBuilder);
        for col in [
            "coffee_id",
            "coffee_name",
            "coffee_type_id",
            "quantity_in_stock",
            "price_per_kg",
            "description",
        ] {
            assert!(sql.contains(col), "missing column {col} in: {sql}");
        }
        assert!(sql.contains("IF NOT EXISTS"));
    }

    #[test]
    fn order_details_cascade_with_their_order() {
        let sql = create_order_details_table().build(PostgresQueryBuilder);
        assert!(sql.contains("ON DELETE CASCADE"), "{sql}");
    }
}
