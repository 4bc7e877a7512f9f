use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Physical storage area (pantry, fridge, freezer, ...).
///
/// Referenced by items (as their default location) and by inventory
/// entries; both references are protect-on-delete.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item::Entity")]
    Item,
    #[sea_orm(has_many = "super::inventory_entry::Entity")]
    InventoryEntry,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::inventory_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
