use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of days ahead of expiration that counts as "expiring soon".
pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 7;

/// Expiration band of an inventory entry relative to a reference date.
///
/// The three bands are mutually exclusive and exhaustive for entries
/// that still hold stock; depleted entries are excluded from band
/// classification in read views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationStatus {
    Fresh,
    ExpiringSoon,
    Expired,
}

impl fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpirationStatus::Fresh => write!(f, "fresh"),
            ExpirationStatus::ExpiringSoon => write!(f, "expiring"),
            ExpirationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// A concrete batch of an item sitting in one storage location.
///
/// Quantity starts positive and only the usage transaction may take it
/// to zero; zero-quantity entries are kept as history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub storage_location_id: i32,
    pub purchase_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub notes: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl Model {
    /// Signed number of days between `today` and the expiration date.
    /// Negative once the entry has expired.
    pub fn days_until_expiration(&self, today: NaiveDate) -> i64 {
        (self.expiration_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.days_until_expiration(today) < 0
    }

    /// Expires within `window` days, today included.
    pub fn is_expiring_soon(&self, today: NaiveDate, window: i64) -> bool {
        let days = self.days_until_expiration(today);
        (0..=window).contains(&days)
    }

    pub fn expiration_status(&self, today: NaiveDate, window: i64) -> ExpirationStatus {
        let days = self.days_until_expiration(today);
        if days < 0 {
            ExpirationStatus::Expired
        } else if days <= window {
            ExpirationStatus::ExpiringSoon
        } else {
            ExpirationStatus::Fresh
        }
    }

    /// Active entries still hold stock and are eligible for usage
    /// logging and band classification.
    pub fn is_active(&self) -> bool {
        self.quantity > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::storage_location::Entity",
        from = "Column::StorageLocationId",
        to = "super::storage_location::Column::Id"
    )]
    StorageLocation,
    #[sea_orm(has_many = "super::usage_log::Entity")]
    UsageLog,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::storage_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageLocation.def()
    }
}

impl Related<super::usage_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
