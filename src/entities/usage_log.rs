use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record of stock being consumed from one inventory entry.
///
/// Created only through the usage transaction, which decrements the
/// parent entry's quantity in the same database transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub inventory_entry_id: i32,
    pub quantity_used: i32,
    pub usage_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_entry::Entity",
        from = "Column::InventoryEntryId",
        to = "super::inventory_entry::Column::Id"
    )]
    InventoryEntry,
}

impl Related<super::inventory_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
