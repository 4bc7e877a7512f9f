#![allow(dead_code)]

use chrono::NaiveDate;
use pantry_api::{
    config::AppConfig,
    entities::{category, inventory_entry, item, storage_location},
    events,
    services::{
        categories::CreateCategoryInput, inventory::CreateEntryInput, items::CreateItemInput,
        locations::CreateLocationInput,
    },
    AppState,
};

/// Harness wiring all services over a fresh in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", "test");
        // A single pooled connection keeps every query on the same
        // in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.auto_migrate = true;

        let (event_sender, event_task) = events::channel(64);
        let state = AppState::new(cfg, event_sender)
            .await
            .expect("failed to build app state");

        Self {
            state,
            _event_task: event_task,
        }
    }

    pub async fn location(&self, name: &str) -> storage_location::Model {
        self.state
            .services
            .locations
            .create_location(CreateLocationInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("failed to create location")
    }

    pub async fn category(&self, name: &str) -> category::Model {
        self.state
            .services
            .categories
            .create_category(CreateCategoryInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("failed to create category")
    }

    pub async fn item(
        &self,
        name: &str,
        category_id: i32,
        location_id: i32,
        threshold: Option<i32>,
    ) -> item::Model {
        self.state
            .services
            .items
            .create_item(CreateItemInput {
                name: name.to_string(),
                category_id,
                default_storage_location_id: location_id,
                preferred_store: None,
                typical_quantity_unit: None,
                low_stock_threshold: threshold,
            })
            .await
            .expect("failed to create item")
    }

    pub async fn entry(
        &self,
        item_id: i32,
        location_id: i32,
        quantity: i32,
        purchase: NaiveDate,
        expiration: NaiveDate,
    ) -> inventory_entry::Model {
        self.state
            .services
            .inventory
            .create_entry(CreateEntryInput {
                item_id,
                quantity,
                storage_location_id: location_id,
                purchase_date: Some(purchase),
                expiration_date: expiration,
                notes: None,
            })
            .await
            .expect("failed to create inventory entry")
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}
