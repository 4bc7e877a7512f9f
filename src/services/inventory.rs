use crate::{
    db::DbPool,
    entities::{inventory_entry, item, storage_location, usage_log, ExpirationStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEntryInput {
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
    pub storage_location_id: i32,
    /// Defaults to today when omitted.
    pub purchase_date: Option<NaiveDate>,
    pub expiration_date: NaiveDate,
    pub notes: Option<String>,
}

/// Fields left as `None` are not touched. Quantity and date changes
/// re-run the create-time invariants; only the usage transaction may
/// take quantity to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEntryInput {
    pub item_id: Option<i32>,
    pub quantity: Option<i32>,
    pub storage_location_id: Option<i32>,
    pub purchase_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Filters for the ledger listing. Band filters classify against the
/// supplied `today` and only ever match entries with remaining stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Substring match against item name or entry notes.
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub storage_location_id: Option<i32>,
    pub status: Option<ExpirationStatus>,
    /// Days ahead counted as "expiring soon".
    pub expiring_window_days: i64,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            storage_location_id: None,
            status: None,
            expiring_window_days: crate::entities::DEFAULT_EXPIRING_SOON_DAYS,
        }
    }
}

/// Service for the inventory ledger.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds stock to the ledger. Fails fast on a non-positive quantity,
    /// an expiration date before the purchase date, or an unresolved
    /// reference; nothing is persisted on failure.
    #[instrument(skip(self, input), fields(item_id = input.item_id, quantity = input.quantity))]
    pub async fn create_entry(
        &self,
        input: CreateEntryInput,
    ) -> Result<inventory_entry::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let purchase_date = input.purchase_date.unwrap_or_else(|| Utc::now().date_naive());
        if input.expiration_date < purchase_date {
            return Err(ServiceError::validation(
                "Expiration date cannot be before purchase date",
            ));
        }

        self.ensure_item_exists(input.item_id).await?;
        self.ensure_location_exists(input.storage_location_id).await?;

        let entry = inventory_entry::ActiveModel {
            item_id: Set(input.item_id),
            quantity: Set(input.quantity),
            storage_location_id: Set(input.storage_location_id),
            purchase_date: Set(purchase_date),
            expiration_date: Set(input.expiration_date),
            notes: Set(input.notes),
            date_added: Set(Utc::now()),
            ..Default::default()
        };
        let entry = entry.insert(&*self.db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::EntryAdded {
                entry_id: entry.id,
                item_id: entry.item_id,
                quantity: entry.quantity,
            })
            .await;
        info!(
            entry_id = entry.id,
            item_id = entry.item_id,
            quantity = entry.quantity,
            "Added inventory entry"
        );
        Ok(entry)
    }

    /// Updates an entry, re-applying the quantity and date invariants
    /// for any field that changes.
    #[instrument(skip(self, input))]
    pub async fn update_entry(
        &self,
        id: i32,
        input: UpdateEntryInput,
    ) -> Result<inventory_entry::Model, ServiceError> {
        let entry = self.get_entry(id).await?;

        if let Some(quantity) = input.quantity {
            if quantity <= 0 {
                return Err(ServiceError::validation("Quantity must be greater than 0"));
            }
        }
        let purchase_date = input.purchase_date.unwrap_or(entry.purchase_date);
        let expiration_date = input.expiration_date.unwrap_or(entry.expiration_date);
        if expiration_date < purchase_date {
            return Err(ServiceError::validation(
                "Expiration date cannot be before purchase date",
            ));
        }
        if let Some(item_id) = input.item_id {
            self.ensure_item_exists(item_id).await?;
        }
        if let Some(location_id) = input.storage_location_id {
            self.ensure_location_exists(location_id).await?;
        }

        let mut active: inventory_entry::ActiveModel = entry.into();
        if let Some(item_id) = input.item_id {
            active.item_id = Set(item_id);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(location_id) = input.storage_location_id {
            active.storage_location_id = Set(location_id);
        }
        active.purchase_date = Set(purchase_date);
        active.expiration_date = Set(expiration_date);
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        let entry = active.update(&*self.db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::EntryUpdated(entry.id))
            .await;
        Ok(entry)
    }

    /// Removes an entry and its usage logs in one transaction. The
    /// owning item's total simply drops; no reconciliation is
    /// attempted.
    #[instrument(skip(self))]
    pub async fn delete_entry(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db;
        self.get_entry(id).await?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, entry_id = id, "Failed to start transaction for entry deletion");
            ServiceError::DatabaseError(e)
        })?;

        let logs_removed = usage_log::Entity::delete_many()
            .filter(usage_log::Column::InventoryEntryId.eq(id))
            .exec(&txn)
            .await?;
        inventory_entry::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::EntryDeleted {
                entry_id: id,
                logs_removed: logs_removed.rows_affected,
            })
            .await;
        info!(
            entry_id = id,
            logs_removed = logs_removed.rows_affected,
            "Deleted inventory entry"
        );
        Ok(())
    }

    pub async fn get_entry(&self, id: i32) -> Result<inventory_entry::Model, ServiceError> {
        inventory_entry::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Inventory entry {} not found", id)))
    }

    /// Ledger listing with its item, soonest expiration first, then
    /// item name. `today` anchors the band filters.
    #[instrument(skip(self, filter))]
    pub async fn list_entries(
        &self,
        filter: EntryFilter,
        today: NaiveDate,
    ) -> Result<Vec<(inventory_entry::Model, item::Model)>, ServiceError> {
        let mut query = inventory_entry::Entity::find().find_also_related(item::Entity);

        if let Some(search) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(item::Column::Name.contains(search))
                    .add(inventory_entry::Column::Notes.contains(search)),
            );
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        if let Some(location_id) = filter.storage_location_id {
            query = query.filter(inventory_entry::Column::StorageLocationId.eq(location_id));
        }
        if let Some(status) = filter.status {
            let horizon = today + Duration::days(filter.expiring_window_days);
            query = query.filter(inventory_entry::Column::Quantity.gt(0));
            query = match status {
                ExpirationStatus::ExpiringSoon => {
                    query.filter(inventory_entry::Column::ExpirationDate.between(today, horizon))
                }
                ExpirationStatus::Expired => {
                    query.filter(inventory_entry::Column::ExpirationDate.lt(today))
                }
                ExpirationStatus::Fresh => {
                    query.filter(inventory_entry::Column::ExpirationDate.gt(horizon))
                }
            };
        }

        let rows = query
            .order_by_asc(inventory_entry::Column::ExpirationDate)
            .order_by_asc(item::Column::Name)
            .all(&*self.db)
            .await?;

        // The item FK is non-nullable, so the left join always matches.
        Ok(rows
            .into_iter()
            .filter_map(|(entry, item)| item.map(|item| (entry, item)))
            .collect())
    }

    async fn ensure_item_exists(&self, id: i32) -> Result<(), ServiceError> {
        if item::Entity::find_by_id(id).one(&*self.db).await?.is_none() {
            return Err(ServiceError::InvalidReference(format!(
                "Item {} does not exist",
                id
            )));
        }
        Ok(())
    }

    async fn ensure_location_exists(&self, id: i32) -> Result<(), ServiceError> {
        if storage_location::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidReference(format!(
                "Storage location {} does not exist",
                id
            )));
        }
        Ok(())
    }
}
