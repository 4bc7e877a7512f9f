use crate::{
    db::DbPool,
    entities::{inventory_entry, item, usage_log},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogUsageInput {
    pub inventory_entry_id: i32,
    #[validate(range(min = 1, message = "Quantity used must be greater than 0"))]
    pub quantity_used: i32,
    /// Defaults to today when omitted.
    pub usage_date: Option<NaiveDate>,
    /// What was made with this item.
    pub notes: Option<String>,
}

/// Result of a successful usage transaction: the persisted log and the
/// entry as it stands after the decrement.
#[derive(Debug, Serialize)]
pub struct LoggedUsage {
    pub log: usage_log::Model,
    pub entry: inventory_entry::Model,
}

/// Service for recording item usage.
///
/// `log_usage` is the one compound write in the system: the usage log
/// insert and the quantity decrement happen in a single database
/// transaction, so readers never see one without the other.
#[derive(Clone)]
pub struct UsageService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl UsageService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records usage against an entry and depletes its quantity.
    ///
    /// The requested amount is checked against the entry's quantity
    /// before the decrement; on `InsufficientQuantityError` the store is
    /// left untouched.
    #[instrument(skip(self, input), fields(entry_id = input.inventory_entry_id, quantity_used = input.quantity_used))]
    pub async fn log_usage(&self, input: LogUsageInput) -> Result<LoggedUsage, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for usage logging");
            ServiceError::DatabaseError(e)
        })?;

        let entry = inventory_entry::Entity::find_by_id(input.inventory_entry_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "Inventory entry {} not found",
                    input.inventory_entry_id
                ))
            })?;

        if input.quantity_used > entry.quantity {
            return Err(ServiceError::InsufficientQuantity {
                requested: input.quantity_used,
                available: entry.quantity,
            });
        }

        let log = usage_log::ActiveModel {
            inventory_entry_id: Set(entry.id),
            quantity_used: Set(input.quantity_used),
            usage_date: Set(input.usage_date.unwrap_or_else(|| Utc::now().date_naive())),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let log = log.insert(&txn).await?;

        let remaining = entry.quantity - input.quantity_used;
        let item_id = entry.item_id;
        let mut active: inventory_entry::ActiveModel = entry.into();
        active.quantity = Set(remaining);
        let entry = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::UsageLogged {
                entry_id: entry.id,
                quantity_used: log.quantity_used,
                remaining,
            })
            .await;
        if remaining == 0 {
            self.event_sender
                .send_or_log(Event::EntryDepleted {
                    entry_id: entry.id,
                    item_id,
                })
                .await;
        }
        self.notify_if_low_stock(item_id).await;

        info!(
            entry_id = entry.id,
            quantity_used = log.quantity_used,
            remaining,
            "Logged usage"
        );
        Ok(LoggedUsage { log, entry })
    }

    /// Entries eligible for a new usage log: only those still holding
    /// stock, with their items, soonest expiration first. Usage forms
    /// are built from this set so depleted entries are never offered.
    pub async fn loggable_entries(
        &self,
    ) -> Result<Vec<(inventory_entry::Model, item::Model)>, ServiceError> {
        let rows = inventory_entry::Entity::find()
            .find_also_related(item::Entity)
            .filter(inventory_entry::Column::Quantity.gt(0))
            .order_by_asc(inventory_entry::Column::ExpirationDate)
            .order_by_asc(item::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(entry, item)| item.map(|item| (entry, item)))
            .collect())
    }

    pub async fn get_usage_log(&self, id: i32) -> Result<usage_log::Model, ServiceError> {
        usage_log::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Usage log {} not found", id)))
    }

    /// All usage logs, most recent usage first.
    pub async fn list_usage(&self) -> Result<Vec<usage_log::Model>, ServiceError> {
        let logs = usage_log::Entity::find()
            .order_by_desc(usage_log::Column::UsageDate)
            .order_by_desc(usage_log::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(logs)
    }

    /// Usage history for one item across all of its entries.
    pub async fn usage_for_item(&self, item_id: i32) -> Result<Vec<usage_log::Model>, ServiceError> {
        let entry_ids: Vec<i32> = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::ItemId.eq(item_id))
            .select_only()
            .column(inventory_entry::Column::Id)
            .into_tuple()
            .all(&*self.db)
            .await?;
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }
        let logs = usage_log::Entity::find()
            .filter(usage_log::Column::InventoryEntryId.is_in(entry_ids))
            .order_by_desc(usage_log::Column::UsageDate)
            .order_by_desc(usage_log::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(logs)
    }

    /// Removes a usage log. The entry's quantity is not restored; the
    /// log is history, not a reservation.
    #[instrument(skip(self))]
    pub async fn delete_usage_log(&self, id: i32) -> Result<(), ServiceError> {
        self.get_usage_log(id).await?;
        usage_log::Entity::delete_by_id(id).exec(&*self.db).await?;
        info!(usage_log_id = id, "Deleted usage log");
        Ok(())
    }

    /// Runs after the usage transaction has committed; a failure here
    /// must not make a committed transaction look failed, so errors are
    /// logged and swallowed.
    async fn notify_if_low_stock(&self, item_id: i32) {
        if let Err(e) = self.check_low_stock(item_id).await {
            warn!(error = %e, item_id, "Skipping low-stock check after usage");
        }
    }

    async fn check_low_stock(&self, item_id: i32) -> Result<(), ServiceError> {
        let item = match item::Entity::find_by_id(item_id).one(&*self.db).await? {
            Some(item) => item,
            None => return Ok(()),
        };
        let threshold = match item.low_stock_threshold {
            Some(threshold) => threshold,
            None => return Ok(()),
        };
        let entries = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::ItemId.eq(item_id))
            .all(&*self.db)
            .await?;
        let total_quantity: i64 = entries.iter().map(|e| i64::from(e.quantity)).sum();
        if item.is_low_stock(total_quantity) {
            self.event_sender
                .send_or_log(Event::LowStock {
                    item_id,
                    total_quantity,
                    threshold,
                })
                .await;
        }
        Ok(())
    }
}
