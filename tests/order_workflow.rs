//! End-to-end order workflow against the in-process store backend:
//! catalog setup, composition with stock ceilings, commit, and the
//! resulting inventory state.

use beancounter::model::ItemDraft;
use beancounter::store::{Datastore, MemoryStore};
use beancounter::{Adjustment, CatalogEditor, ComposerError, OrderComposer, ValidationError};
use rust_decimal::Decimal;

fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    {
        let mut editor = CatalogEditor::new(&mut store);
        let arabica = editor.add_coffee_type("Arabica").unwrap();
        let robusta = editor.add_coffee_type("Robusta").unwrap();
        editor
            .add_item(&ItemDraft {
                name: "House Blend".to_string(),
                coffee_type_id: arabica,
                quantity_in_stock: 5,
                price_per_kg: Decimal::new(1000, 2),
                description: Some("daily driver".to_string()),
            })
            .unwrap();
        editor
            .add_item(&ItemDraft {
                name: "Dark Roast".to_string(),
                coffee_type_id: robusta,
                quantity_in_stock: 2,
                price_per_kg: Decimal::new(1550, 2),
                description: None,
            })
            .unwrap();
    }
    store
}

#[test]
fn browse_compose_submit_and_restock() {
    let mut store = seeded_store();

    let mut composer = OrderComposer::load(&mut store).unwrap();
    assert_eq!(composer.available().len(), 2);

    // 3 kg of House Blend, 2 kg of Dark Roast.
    for _ in 0..3 {
        assert!(matches!(composer.increase(1), Adjustment::Applied { .. }));
    }
    composer.increase(2);
    composer.increase(2);
    assert_eq!(
        composer.increase(2),
        Adjustment::StockLimitReached {
            item_id: 2,
            max_quantity: 2
        }
    );

    // 3 × 10.00 + 2 × 15.50
    assert_eq!(composer.formatted_total(), "61.00");

    composer.set_customer_name("Jane Doe");
    composer.set_phone_number("555-1234");
    let receipt = composer.submit(&mut store).unwrap();
    assert_eq!(receipt.total, Decimal::new(6100, 2));

    // Stock decremented per line, in load order.
    assert_eq!(store.get_item(1).unwrap().quantity_in_stock, 2);
    assert_eq!(store.get_item(2).unwrap().quantity_in_stock, 0);
    let lines = store.line_items();
    assert_eq!(lines.len(), 2);
    assert_eq!((lines[0].coffee_id, lines[0].quantity), (1, 3));
    assert_eq!((lines[1].coffee_id, lines[1].quantity), (2, 2));

    // A fresh composer no longer offers the sold-out roast.
    let composer = OrderComposer::load(&mut store).unwrap();
    let offered: Vec<i32> = composer.available().iter().map(|l| l.coffee_id).collect();
    assert_eq!(offered, vec![1]);

    // Restock through the catalog brings it back.
    {
        let mut editor = CatalogEditor::new(&mut store);
        let mut dark = editor.find_item(2).unwrap();
        let types = editor.coffee_types().unwrap();
        let robusta = types.iter().find(|t| t.name == "Robusta").unwrap().id;
        dark.quantity_in_stock = 4;
        editor
            .update_item(
                2,
                &ItemDraft {
                    name: dark.name.clone(),
                    coffee_type_id: robusta,
                    quantity_in_stock: dark.quantity_in_stock,
                    price_per_kg: dark.price_per_kg,
                    description: dark.description.clone(),
                },
            )
            .unwrap();
    }
    let composer = OrderComposer::load(&mut store).unwrap();
    assert_eq!(composer.available().len(), 2);
    assert_eq!(composer.available()[1].max_quantity, 4);
}

#[test]
fn price_changes_never_rewrite_order_history() {
    let mut store = seeded_store();

    let mut composer = OrderComposer::load(&mut store).unwrap();
    composer.increase(1);
    composer.set_customer_name("Jane Doe");
    let receipt = composer.submit(&mut store).unwrap();
    assert_eq!(receipt.total, Decimal::new(1000, 2));

    // Raise the catalog price after the sale.
    {
        let mut editor = CatalogEditor::new(&mut store);
        let item = editor.find_item(1).unwrap();
        editor
            .update_item(
                1,
                &ItemDraft {
                    name: item.name.clone(),
                    coffee_type_id: item.coffee_type.id,
                    quantity_in_stock: item.quantity_in_stock,
                    price_per_kg: Decimal::new(9900, 2),
                    description: item.description.clone(),
                },
            )
            .unwrap();
    }

    // The committed line still carries the snapshotted price.
    assert_eq!(store.line_items()[0].unit_price, Decimal::new(1000, 2));
    assert_eq!(store.orders()[0].total_price, Decimal::new(1000, 2));
}

#[test]
fn validation_failures_never_touch_the_store() {
    let mut store = seeded_store();
    let mut composer = OrderComposer::load(&mut store).unwrap();
    let writes_before = store.write_count();

    // No customer name.
    composer.increase(1);
    assert!(matches!(
        composer.submit(&mut store),
        Err(ComposerError::Validation(
            ValidationError::MissingCustomerName
        ))
    ));

    // No selection.
    composer.clear_all();
    composer.set_customer_name("Jane Doe");
    assert!(matches!(
        composer.submit(&mut store),
        Err(ComposerError::Validation(ValidationError::EmptySelection))
    ));

    assert_eq!(store.write_count(), writes_before);
    assert!(store.orders().is_empty());
    assert!(store.line_items().is_empty());
}

#[test]
fn two_orders_get_sequential_ids_and_independent_totals() {
    let mut store = seeded_store();

    let mut composer = OrderComposer::load(&mut store).unwrap();
    composer.increase(1);
    composer.set_customer_name("Jane Doe");
    let first = composer.submit(&mut store).unwrap();

    let mut composer = OrderComposer::load(&mut store).unwrap();
    composer.increase(2);
    composer.increase(2);
    composer.set_customer_name("John Roe");
    let second = composer.submit(&mut store).unwrap();

    assert_eq!(second.order_id, first.order_id + 1);
    assert_eq!(first.total, Decimal::new(1000, 2));
    assert_eq!(second.total, Decimal::new(3100, 2));

    let orders = store.list_orders().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].customer_name, "Jane Doe");
    assert_eq!(orders[1].customer_name, "John Roe");
}
