//! Pantry API Library
//!
//! Core services for tracking perishable household inventory: reference
//! data (storage locations, categories), an item catalog, a
//! quantity-bearing inventory ledger with expiration windows, usage
//! logging that depletes stock, and the aggregation queries behind the
//! dashboard. A presentation layer (web UI or CLI) is expected to call
//! these services; none is provided here.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use std::sync::Arc;

/// All services, wired over one pool and one event channel.
#[derive(Clone)]
pub struct AppServices {
    pub locations: Arc<services::LocationService>,
    pub categories: Arc<services::CategoryService>,
    pub items: Arc<services::ItemService>,
    pub inventory: Arc<services::InventoryService>,
    pub usage: Arc<services::UsageService>,
    pub reports: Arc<services::ReportService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            locations: Arc::new(services::LocationService::new(
                db.clone(),
                event_sender.clone(),
            )),
            categories: Arc::new(services::CategoryService::new(
                db.clone(),
                event_sender.clone(),
            )),
            items: Arc::new(services::ItemService::new(db.clone(), event_sender.clone())),
            inventory: Arc::new(services::InventoryService::new(
                db.clone(),
                event_sender.clone(),
            )),
            usage: Arc::new(services::UsageService::new(db.clone(), event_sender)),
            reports: Arc::new(services::ReportService::new(db)),
        }
    }
}

/// Application state handed to the presentation layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    /// Connects to the database (running migrations when configured)
    /// and wires up all services.
    pub async fn new(config: AppConfig, event_sender: EventSender) -> Result<Self, ServiceError> {
        let db = Arc::new(db::establish_connection_from_app_config(&config).await?);
        let services = AppServices::new(db.clone(), event_sender.clone());
        Ok(Self {
            db,
            config,
            event_sender,
            services,
        })
    }
}

/// Installs a global tracing subscriber. `RUST_LOG` wins over the
/// configured level; repeated calls are a no-op.
pub fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
