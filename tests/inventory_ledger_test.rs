//! Inventory ledger rules: create/update invariants, expiration band
//! filters, ordering, cascade to usage logs.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::{d, TestApp};
use pantry_api::entities::ExpirationStatus;
use pantry_api::errors::ServiceError;
use pantry_api::services::inventory::{CreateEntryInput, EntryFilter, UpdateEntryInput};
use pantry_api::services::usage::LogUsageInput;

#[tokio::test]
async fn create_entry_rejects_non_positive_quantity() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;

    let err = app
        .state
        .services
        .inventory
        .create_entry(CreateEntryInput {
            item_id: milk.id,
            quantity: 0,
            storage_location_id: fridge.id,
            purchase_date: Some(d(2024, 1, 1)),
            expiration_date: d(2024, 1, 10),
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Nothing was persisted.
    let entries = app
        .state
        .services
        .inventory
        .list_entries(EntryFilter::default(), d(2024, 1, 1))
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn create_entry_rejects_expiration_before_purchase() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;

    let err = app
        .state
        .services
        .inventory
        .create_entry(CreateEntryInput {
            item_id: milk.id,
            quantity: 1,
            storage_location_id: fridge.id,
            purchase_date: Some(d(2024, 1, 10)),
            expiration_date: d(2024, 1, 9),
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Same-day expiration is allowed.
    app.entry(milk.id, fridge.id, 1, d(2024, 1, 10), d(2024, 1, 10))
        .await;
}

#[tokio::test]
async fn purchase_date_defaults_to_today() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;

    let today = Utc::now().date_naive();
    let entry = app
        .state
        .services
        .inventory
        .create_entry(CreateEntryInput {
            item_id: milk.id,
            quantity: 1,
            storage_location_id: fridge.id,
            purchase_date: None,
            expiration_date: today + chrono::Duration::days(30),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(entry.purchase_date, today);
}

#[tokio::test]
async fn create_entry_rejects_unknown_references() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;

    let err = app
        .state
        .services
        .inventory
        .create_entry(CreateEntryInput {
            item_id: 999,
            quantity: 1,
            storage_location_id: fridge.id,
            purchase_date: Some(d(2024, 1, 1)),
            expiration_date: d(2024, 1, 10),
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidReference(_));

    let err = app
        .state
        .services
        .inventory
        .create_entry(CreateEntryInput {
            item_id: milk.id,
            quantity: 1,
            storage_location_id: 999,
            purchase_date: Some(d(2024, 1, 1)),
            expiration_date: d(2024, 1, 10),
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidReference(_));
}

#[tokio::test]
async fn update_entry_revalidates_dates_and_quantity() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;
    let entry = app
        .entry(milk.id, fridge.id, 3, d(2024, 1, 5), d(2024, 1, 15))
        .await;

    // Moving expiration before the stored purchase date fails.
    let err = app
        .state
        .services
        .inventory
        .update_entry(
            entry.id,
            UpdateEntryInput {
                expiration_date: Some(d(2024, 1, 4)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Zeroing quantity outside the usage transaction fails.
    let err = app
        .state
        .services
        .inventory
        .update_entry(
            entry.id,
            UpdateEntryInput {
                quantity: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // A consistent update goes through and leaves other fields alone.
    let updated = app
        .state
        .services
        .inventory
        .update_entry(
            entry.id,
            UpdateEntryInput {
                quantity: Some(5),
                notes: Some("restocked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.quantity, 5);
    assert_eq!(updated.notes.as_deref(), Some("restocked"));
    assert_eq!(updated.purchase_date, d(2024, 1, 5));
    assert_eq!(updated.expiration_date, d(2024, 1, 15));
}

#[tokio::test]
async fn band_filters_classify_against_the_given_day() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;
    let today = d(2024, 6, 15);

    let expired = app
        .entry(milk.id, fridge.id, 1, d(2024, 6, 1), d(2024, 6, 14))
        .await;
    let expires_today = app
        .entry(milk.id, fridge.id, 1, d(2024, 6, 1), today)
        .await;
    let window_edge = app
        .entry(milk.id, fridge.id, 1, d(2024, 6, 1), d(2024, 6, 22))
        .await;
    let fresh = app
        .entry(milk.id, fridge.id, 1, d(2024, 6, 1), d(2024, 6, 23))
        .await;
    // Depleted stock never shows up in a band.
    let depleted = app
        .entry(milk.id, fridge.id, 1, d(2024, 6, 1), d(2024, 6, 10))
        .await;
    app.state
        .services
        .usage
        .log_usage(LogUsageInput {
            inventory_entry_id: depleted.id,
            quantity_used: 1,
            usage_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let ids = |rows: Vec<(pantry_api::entities::inventory_entry::Model, _)>| {
        rows.into_iter().map(|(e, _)| e.id).collect::<Vec<_>>()
    };

    let expired_rows = app
        .state
        .services
        .inventory
        .list_entries(
            EntryFilter {
                status: Some(ExpirationStatus::Expired),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(ids(expired_rows), vec![expired.id]);

    let soon_rows = app
        .state
        .services
        .inventory
        .list_entries(
            EntryFilter {
                status: Some(ExpirationStatus::ExpiringSoon),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(ids(soon_rows), vec![expires_today.id, window_edge.id]);

    let fresh_rows = app
        .state
        .services
        .inventory
        .list_entries(
            EntryFilter {
                status: Some(ExpirationStatus::Fresh),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(ids(fresh_rows), vec![fresh.id]);
}

#[tokio::test]
async fn listing_orders_by_expiration_then_item_name() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;
    let butter = app.item("Butter", dairy.id, fridge.id, None).await;

    app.entry(milk.id, fridge.id, 1, d(2024, 1, 1), d(2024, 2, 1))
        .await;
    app.entry(butter.id, fridge.id, 1, d(2024, 1, 1), d(2024, 2, 1))
        .await;
    app.entry(milk.id, fridge.id, 1, d(2024, 1, 1), d(2024, 1, 20))
        .await;

    let rows = app
        .state
        .services
        .inventory
        .list_entries(EntryFilter::default(), d(2024, 1, 10))
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|(_, item)| item.name.as_str()).collect();
    assert_eq!(names, vec!["Milk", "Butter", "Milk"]);
    assert_eq!(rows[0].0.expiration_date, d(2024, 1, 20));
}

#[tokio::test]
async fn search_matches_item_name_or_entry_notes() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;
    let butter = app.item("Butter", dairy.id, fridge.id, None).await;

    app.entry(milk.id, fridge.id, 1, d(2024, 1, 1), d(2024, 2, 1))
        .await;
    app.state
        .services
        .inventory
        .create_entry(CreateEntryInput {
            item_id: butter.id,
            quantity: 1,
            storage_location_id: fridge.id,
            purchase_date: Some(d(2024, 1, 1)),
            expiration_date: d(2024, 2, 1),
            notes: Some("for milkshake night".to_string()),
        })
        .await
        .unwrap();

    let rows = app
        .state
        .services
        .inventory
        .list_entries(
            EntryFilter {
                search: Some("milk".to_string()),
                ..Default::default()
            },
            d(2024, 1, 10),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn deleting_entry_removes_its_usage_logs() {
    let app = TestApp::new().await;
    let fridge = app.location("Fridge").await;
    let dairy = app.category("Dairy").await;
    let milk = app.item("Milk", dairy.id, fridge.id, None).await;
    let entry = app
        .entry(milk.id, fridge.id, 3, d(2024, 1, 1), d(2024, 1, 10))
        .await;
    let other = app
        .entry(milk.id, fridge.id, 2, d(2024, 1, 2), d(2024, 1, 12))
        .await;

    app.state
        .services
        .usage
        .log_usage(LogUsageInput {
            inventory_entry_id: entry.id,
            quantity_used: 1,
            usage_date: None,
            notes: None,
        })
        .await
        .unwrap();
    app.state
        .services
        .usage
        .log_usage(LogUsageInput {
            inventory_entry_id: other.id,
            quantity_used: 1,
            usage_date: None,
            notes: None,
        })
        .await
        .unwrap();

    app.state
        .services
        .inventory
        .delete_entry(entry.id)
        .await
        .unwrap();

    assert_matches!(
        app.state.services.inventory.get_entry(entry.id).await,
        Err(ServiceError::NotFound(_))
    );
    let logs = app.state.services.usage.list_usage().await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].inventory_entry_id, other.id);
}
