use crate::{
    db::DbPool,
    entities::{category, inventory_entry, item, storage_location, usage_log},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub category_id: i32,
    pub default_storage_location_id: i32,
    pub preferred_store: Option<String>,
    /// Defaults to "unit" when omitted.
    pub typical_quantity_unit: Option<String>,
    #[validate(range(min = 1, message = "Low stock threshold must be greater than 0"))]
    pub low_stock_threshold: Option<i32>,
}

/// Fields left as `None` are not touched. The outer `Option` on
/// `low_stock_threshold` distinguishes "leave alone" (`None`) from
/// "clear the threshold" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub default_storage_location_id: Option<i32>,
    pub preferred_store: Option<String>,
    pub typical_quantity_unit: Option<String>,
    pub low_stock_threshold: Option<Option<i32>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Substring match against item name or preferred store.
    pub search: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ItemStockStatus {
    pub item_id: i32,
    pub total_quantity: i64,
    pub low_stock_threshold: Option<i32>,
    pub is_low_stock: bool,
}

/// Item plus everything its detail screen needs.
#[derive(Debug, Serialize)]
pub struct ItemDetail {
    pub item: item::Model,
    pub category: category::Model,
    pub default_storage_location: storage_location::Model,
    pub total_quantity: i64,
    pub is_low_stock: bool,
    /// Entries still holding stock, soonest expiration first.
    pub active_entries: Vec<inventory_entry::Model>,
    /// Last ten usage logs across all of the item's entries.
    pub recent_usage: Vec<usage_log::Model>,
}

/// Service for the item catalog.
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ItemService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an item. Both references must resolve to existing rows.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(&self, input: CreateItemInput) -> Result<item::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        self.ensure_category_exists(input.category_id).await?;
        self.ensure_location_exists(input.default_storage_location_id)
            .await?;

        let now = Utc::now();
        let item = item::ActiveModel {
            name: Set(input.name),
            category_id: Set(input.category_id),
            default_storage_location_id: Set(input.default_storage_location_id),
            preferred_store: Set(input.preferred_store),
            typical_quantity_unit: Set(input
                .typical_quantity_unit
                .unwrap_or_else(|| "unit".to_string())),
            low_stock_threshold: Set(input.low_stock_threshold),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let item = item.insert(&*self.db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::ItemCreated(item.id))
            .await;
        info!(item_id = item.id, name = %item.name, "Created item");
        Ok(item)
    }

    /// Updates an item, refreshing `updated_at`.
    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        id: i32,
        input: UpdateItemInput,
    ) -> Result<item::Model, ServiceError> {
        let item = self.get_item(id).await?;

        if let Some(name) = &input.name {
            if name.is_empty() {
                return Err(ServiceError::validation("Name is required"));
            }
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        if let Some(location_id) = input.default_storage_location_id {
            self.ensure_location_exists(location_id).await?;
        }
        if let Some(Some(threshold)) = input.low_stock_threshold {
            if threshold <= 0 {
                return Err(ServiceError::validation(
                    "Low stock threshold must be greater than 0",
                ));
            }
        }

        let mut active: item::ActiveModel = item.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(location_id) = input.default_storage_location_id {
            active.default_storage_location_id = Set(location_id);
        }
        if let Some(store) = input.preferred_store {
            active.preferred_store = Set(Some(store));
        }
        if let Some(unit) = input.typical_quantity_unit {
            active.typical_quantity_unit = Set(unit);
        }
        if let Some(threshold) = input.low_stock_threshold {
            active.low_stock_threshold = Set(threshold);
        }
        active.updated_at = Set(Utc::now());
        let item = active.update(&*self.db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::ItemUpdated(item.id))
            .await;
        Ok(item)
    }

    /// Deletes an item and, in the same transaction, every inventory
    /// entry it owns and every usage log under those entries. Hard
    /// delete; there is no undo.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db;
        self.get_item(id).await?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, item_id = id, "Failed to start transaction for item deletion");
            ServiceError::DatabaseError(e)
        })?;

        let entry_ids: Vec<i32> = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::ItemId.eq(id))
            .select_only()
            .column(inventory_entry::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        if !entry_ids.is_empty() {
            usage_log::Entity::delete_many()
                .filter(usage_log::Column::InventoryEntryId.is_in(entry_ids.clone()))
                .exec(&txn)
                .await?;
        }
        let removed = inventory_entry::Entity::delete_many()
            .filter(inventory_entry::Column::ItemId.eq(id))
            .exec(&txn)
            .await?;
        item::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ItemDeleted {
                item_id: id,
                entries_removed: removed.rows_affected,
            })
            .await;
        info!(
            item_id = id,
            entries_removed = removed.rows_affected,
            "Deleted item and its inventory"
        );
        Ok(())
    }

    pub async fn get_item(&self, id: i32) -> Result<item::Model, ServiceError> {
        item::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Item {} not found", id)))
    }

    /// Items ordered by name, optionally narrowed by category or a
    /// substring search across name and preferred store.
    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<item::Model>, ServiceError> {
        let mut query = item::Entity::find();
        if let Some(search) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(item::Column::Name.contains(search))
                    .add(item::Column::PreferredStore.contains(search)),
            );
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        let items = query.order_by_asc(item::Column::Name).all(&*self.db).await?;
        Ok(items)
    }

    /// Sum of quantity across all of the item's entries. Depleted
    /// entries stay in the ledger and contribute zero.
    pub async fn total_quantity(&self, item_id: i32) -> Result<i64, ServiceError> {
        self.get_item(item_id).await?;
        let entries = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::ItemId.eq(item_id))
            .all(&*self.db)
            .await?;
        Ok(entries.iter().map(|e| i64::from(e.quantity)).sum())
    }

    pub async fn stock_status(&self, item_id: i32) -> Result<ItemStockStatus, ServiceError> {
        let item = self.get_item(item_id).await?;
        let total_quantity = self.total_quantity(item_id).await?;
        Ok(ItemStockStatus {
            item_id,
            total_quantity,
            low_stock_threshold: item.low_stock_threshold,
            is_low_stock: item.is_low_stock(total_quantity),
        })
    }

    /// Everything the item detail screen shows.
    #[instrument(skip(self))]
    pub async fn item_detail(&self, item_id: i32) -> Result<ItemDetail, ServiceError> {
        let db = &*self.db;
        let item = self.get_item(item_id).await?;

        let category = category::Entity::find_by_id(item.category_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Category {} not found", item.category_id))
            })?;
        let default_storage_location =
            storage_location::Entity::find_by_id(item.default_storage_location_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidReference(format!(
                        "Storage location {} not found",
                        item.default_storage_location_id
                    ))
                })?;

        let all_entries = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::ItemId.eq(item_id))
            .order_by_asc(inventory_entry::Column::ExpirationDate)
            .all(db)
            .await?;
        let total_quantity: i64 = all_entries.iter().map(|e| i64::from(e.quantity)).sum();

        let entry_ids: Vec<i32> = all_entries.iter().map(|e| e.id).collect();
        let recent_usage = if entry_ids.is_empty() {
            Vec::new()
        } else {
            usage_log::Entity::find()
                .filter(usage_log::Column::InventoryEntryId.is_in(entry_ids))
                .order_by_desc(usage_log::Column::UsageDate)
                .order_by_desc(usage_log::Column::CreatedAt)
                .limit(10)
                .all(db)
                .await?
        };

        let is_low_stock = item.is_low_stock(total_quantity);
        let active_entries = all_entries.into_iter().filter(|e| e.is_active()).collect();

        Ok(ItemDetail {
            item,
            category,
            default_storage_location,
            total_quantity,
            is_low_stock,
            active_entries,
            recent_usage,
        })
    }

    async fn ensure_category_exists(&self, id: i32) -> Result<(), ServiceError> {
        if category::Entity::find_by_id(id).one(&*self.db).await?.is_none() {
            return Err(ServiceError::InvalidReference(format!(
                "Category {} does not exist",
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
