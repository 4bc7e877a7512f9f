use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A type of food product tracked by the household.
///
/// Items own their inventory entries: deleting an item removes every
/// entry (and every usage log under those entries). The category and
/// default-location references are protect-on-delete in the other
/// direction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub name: String,
    pub category_id: i32,
    pub default_storage_location_id: i32,
    pub preferred_store: Option<String>,
    pub typical_quantity_unit: String,
    pub low_stock_threshold: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Whether `total_quantity` falls below the configured threshold.
    /// Items without a threshold are never low on stock.
    pub fn is_low_stock(&self, total_quantity: i64) -> bool {
        match self.low_stock_threshold {
            Some(threshold) => total_quantity < i64::from(threshold),
            None => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::storage_location::Entity",
        from = "Column::DefaultStorageLocationId",
        to = "super::storage_location::Column::Id"
    )]
    StorageLocation,
    #[sea_orm(has_many = "super::inventory_entry::Entity")]
    InventoryEntry,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::storage_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageLocation.def()
    }
}

impl Related<super::inventory_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
