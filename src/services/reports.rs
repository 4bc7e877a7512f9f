use crate::{
    db::DbPool,
    entities::{category, inventory_entry, item, storage_location},
    errors::ServiceError,
};
use chrono::{Duration, NaiveDate};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// One row of the low-stock report.
#[derive(Debug, Serialize)]
pub struct LowStockItem {
    pub item: item::Model,
    pub total_quantity: i64,
    pub threshold: i32,
}

#[derive(Debug, Serialize)]
pub struct LocationCount {
    pub location: storage_location::Model,
    pub active_entries: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: category::Model,
    pub items: u64,
}

/// Everything the dashboard shows, assembled in one call.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_quantity_on_hand: i64,
    pub unique_item_count: u64,
    pub expiring_soon: Vec<(inventory_entry::Model, item::Model)>,
    pub expiring_soon_count: u64,
    pub expired_count: u64,
    pub low_stock: Vec<LowStockItem>,
    pub low_stock_count: u64,
    pub location_summary: Vec<LocationCount>,
}

/// Read-side aggregations over the catalog and the ledger.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Sum of quantity over every ledger entry, depleted rows included.
    pub async fn total_quantity_on_hand(&self) -> Result<i64, ServiceError> {
        let entries = inventory_entry::Entity::find().all(&*self.db).await?;
        Ok(entries.iter().map(|e| i64::from(e.quantity)).sum())
    }

    /// Number of distinct items with at least one ledger entry.
    pub async fn unique_item_count(&self) -> Result<u64, ServiceError> {
        let item_ids: Vec<i32> = inventory_entry::Entity::find()
            .select_only()
            .column(inventory_entry::Column::ItemId)
            .into_tuple()
            .all(&*self.db)
            .await?;
        let distinct: HashSet<i32> = item_ids.into_iter().collect();
        Ok(distinct.len() as u64)
    }

    /// Items with a threshold whose totals fall below it, by name.
    #[instrument(skip(self))]
    pub async fn low_stock_report(&self) -> Result<Vec<LowStockItem>, ServiceError> {
        let db = &*self.db;
        let candidates = item::Entity::find()
            .filter(item::Column::LowStockThreshold.is_not_null())
            .order_by_asc(item::Column::Name)
            .all(db)
            .await?;

        let mut report = Vec::new();
        for candidate in candidates {
            let threshold = match candidate.low_stock_threshold {
                Some(threshold) => threshold,
                None => continue,
            };
            let entries = inventory_entry::Entity::find()
                .filter(inventory_entry::Column::ItemId.eq(candidate.id))
                .all(db)
                .await?;
            let total_quantity: i64 = entries.iter().map(|e| i64::from(e.quantity)).sum();
            if candidate.is_low_stock(total_quantity) {
                report.push(LowStockItem {
                    item: candidate,
                    total_quantity,
                    threshold,
                });
            }
        }
        Ok(report)
    }

    /// Active entries expiring within the window, soonest first.
    /// `limit` is a display concern; pass `None` for the full band.
    #[instrument(skip(self))]
    pub async fn expiring_soon(
        &self,
        today: NaiveDate,
        window: i64,
        limit: Option<u64>,
    ) -> Result<Vec<(inventory_entry::Model, item::Model)>, ServiceError> {
        let horizon = today + Duration::days(window);
        let rows = inventory_entry::Entity::find()
            .find_also_related(item::Entity)
            .filter(inventory_entry::Column::Quantity.gt(0))
            .filter(inventory_entry::Column::ExpirationDate.between(today, horizon))
            .order_by_asc(inventory_entry::Column::ExpirationDate)
            .order_by_asc(item::Column::Name)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(entry, item)| item.map(|item| (entry, item)))
            .collect())
    }

    pub async fn expiring_soon_count(
        &self,
        today: NaiveDate,
        window: i64,
    ) -> Result<u64, ServiceError> {
        let horizon = today + Duration::days(window);
        let count = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::Quantity.gt(0))
            .filter(inventory_entry::Column::ExpirationDate.between(today, horizon))
            .count(&*self.db)
            .await?;
        Ok(count)
    }

    /// Active entries already past their expiration date.
    pub async fn expired_count(&self, today: NaiveDate) -> Result<u64, ServiceError> {
        let count = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::Quantity.gt(0))
            .filter(inventory_entry::Column::ExpirationDate.lt(today))
            .count(&*self.db)
            .await?;
        Ok(count)
    }

    /// Per-location count of active entries, busiest location first.
    pub async fn location_summary(&self) -> Result<Vec<LocationCount>, ServiceError> {
        let db = &*self.db;
        let locations = storage_location::Entity::find()
            .order_by_asc(storage_location::Column::Name)
            .all(db)
            .await?;

        let mut counts = Vec::new();
        for location in locations {
            let active_entries = inventory_entry::Entity::find()
                .filter(inventory_entry::Column::StorageLocationId.eq(location.id))
                .filter(inventory_entry::Column::Quantity.gt(0))
                .count(db)
                .await?;
            counts.push(LocationCount {
                location,
                active_entries,
            });
        }
        counts.sort_by(|a, b| b.active_entries.cmp(&a.active_entries));
        Ok(counts)
    }

    /// Per-category item count, ordered by category name.
    pub async fn category_summary(&self) -> Result<Vec<CategoryCount>, ServiceError> {
        let db = &*self.db;
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?;

        let mut counts = Vec::new();
        for cat in categories {
            let items = item::Entity::find()
                .filter(item::Column::CategoryId.eq(cat.id))
                .count(db)
                .await?;
            counts.push(CategoryCount {
                category: cat,
                items,
            });
        }
        Ok(counts)
    }

    /// Assembles the dashboard. `limit` truncates the expiring-soon and
    /// low-stock lists for display; the counts always cover the full
    /// sets.
    #[instrument(skip(self))]
    pub async fn dashboard(
        &self,
        today: NaiveDate,
        window: i64,
        limit: Option<u64>,
    ) -> Result<DashboardSummary, ServiceError> {
        let total_quantity_on_hand = self.total_quantity_on_hand().await?;
        let unique_item_count = self.unique_item_count().await?;
        let expiring_soon = self.expiring_soon(today, window, limit).await?;
        let expiring_soon_count = self.expiring_soon_count(today, window).await?;
        let expired_count = self.expired_count(today).await?;
        let mut low_stock = self.low_stock_report().await?;
        let low_stock_count = low_stock.len() as u64;
        if let Some(limit) = limit {
            low_stock.truncate(limit as usize);
        }
        let location_summary = self.location_summary().await?;

        Ok(DashboardSummary {
            total_quantity_on_hand,
            unique_item_count,
            expiring_soon,
            expiring_soon_count,
            expired_count,
            low_stock,
            low_stock_count,
            location_summary,
        })
    }
}
