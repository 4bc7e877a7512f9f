//! Aggregation queries behind the dashboard.

mod common;

use common::{d, TestApp};
use pantry_api::services::usage::LogUsageInput;

/// Seeds a small household: two locations, two categories, three
/// items, and a spread of ledger entries around 2024-06-15.
async fn seed(app: &TestApp) -> Seeded {
    let fridge = app.location("Fridge").await;
    let pantry = app.location("Pantry").await;
    let dairy = app.category("Dairy").await;
    let canned = app.category("Canned Goods").await;

    let milk = app.item("Milk", dairy.id, fridge.id, Some(2)).await;
    let yogurt = app.item("Yogurt", dairy.id, fridge.id, None).await;
    let beans = app.item("Beans", canned.id, pantry.id, Some(4)).await;

    // Milk: one expired entry, one expiring soon. Total 3, above
    // threshold 2.
    app.entry(milk.id, fridge.id, 1, d(2024, 6, 1), d(2024, 6, 10))
        .await;
    app.entry(milk.id, fridge.id, 2, d(2024, 6, 12), d(2024, 6, 18))
        .await;
    // Yogurt: fresh, and a depleted entry that should not count as
    // active anywhere.
    app.entry(yogurt.id, fridge.id, 4, d(2024, 6, 10), d(2024, 7, 10))
        .await;
    let depleted = app
        .entry(yogurt.id, fridge.id, 1, d(2024, 6, 1), d(2024, 6, 20))
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
    // Beans: total 3, below threshold 4.
    app.entry(beans.id, pantry.id, 3, d(2024, 6, 1), d(2025, 6, 1))
        .await;

    Seeded {
        fridge_id: fridge.id,
        pantry_id: pantry.id,
        milk_id: milk.id,
        beans_id: beans.id,
    }
}

struct Seeded {
    fridge_id: i32,
    pantry_id: i32,
    milk_id: i32,
    beans_id: i32,
}

#[tokio::test]
async fn totals_count_every_ledger_row() {
    let app = TestApp::new().await;
    seed(&app).await;

    // 1 + 2 + 4 + 0 (depleted) + 3
    let total = app
        .state
        .services
        .reports
        .total_quantity_on_hand()
        .await
        .unwrap();
    assert_eq!(total, 10);

    let unique = app
        .state
        .services
        .reports
        .unique_item_count()
        .await
        .unwrap();
    assert_eq!(unique, 3);
}

#[tokio::test]
async fn low_stock_report_lists_only_items_below_threshold() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;

    let report = app
        .state
        .services
        .reports
        .low_stock_report()
        .await
        .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].item.id, seeded.beans_id);
    assert_eq!(report[0].total_quantity, 3);
    assert_eq!(report[0].threshold, 4);
}

#[tokio::test]
async fn expiration_counts_skip_depleted_entries() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;
    let today = d(2024, 6, 15);

    let expired = app
        .state
        .services
        .reports
        .expired_count(today)
        .await
        .unwrap();
    assert_eq!(expired, 1);

    // Only the milk entry expiring on 06-18 is in the window; the
    // depleted yogurt entry at 06-20 is not.
    let soon = app
        .state
        .services
        .reports
        .expiring_soon_count(today, 7)
        .await
        .unwrap();
    assert_eq!(soon, 1);

    let rows = app
        .state
        .services
        .reports
        .expiring_soon(today, 7, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1.id, seeded.milk_id);
    assert_eq!(rows[0].0.expiration_date, d(2024, 6, 18));
}

#[tokio::test]
async fn location_summary_counts_active_entries_busiest_first() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;

    let summary = app
        .state
        .services
        .reports
        .location_summary()
        .await
        .unwrap();
    assert_eq!(summary.len(), 2);
    // Fridge holds 3 active entries (the depleted one dropped out),
    // pantry 1.
    assert_eq!(summary[0].location.id, seeded.fridge_id);
    assert_eq!(summary[0].active_entries, 3);
    assert_eq!(summary[1].location.id, seeded.pantry_id);
    assert_eq!(summary[1].active_entries, 1);
}

#[tokio::test]
async fn category_summary_counts_items_per_category() {
    let app = TestApp::new().await;
    seed(&app).await;

    let summary = app
        .state
        .services
        .reports
        .category_summary()
        .await
        .unwrap();
    let rows: Vec<(&str, u64)> = summary
        .iter()
        .map(|c| (c.category.name.as_str(), c.items))
        .collect();
    assert_eq!(rows, vec![("Canned Goods", 1), ("Dairy", 2)]);
}

#[tokio::test]
async fn dashboard_limit_truncates_lists_but_not_counts() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;
    let today = d(2024, 6, 15);

    // A second expiring-soon entry so the limit has something to cut.
    app.entry(seeded.milk_id, seeded.fridge_id, 1, d(2024, 6, 14), d(2024, 6, 21))
        .await;

    let dashboard = app
        .state
        .services
        .reports
        .dashboard(today, 7, Some(1))
        .await
        .unwrap();

    assert_eq!(dashboard.total_quantity_on_hand, 11);
    assert_eq!(dashboard.unique_item_count, 3);
    assert_eq!(dashboard.expiring_soon.len(), 1);
    assert_eq!(dashboard.expiring_soon_count, 2);
    assert_eq!(dashboard.expired_count, 1);
    assert_eq!(dashboard.low_stock.len(), 1);
    assert_eq!(dashboard.low_stock_count, 1);
    assert_eq!(dashboard.location_summary.len(), 2);
}
