use crate::{
    db::DbPool,
    entities::{inventory_entry, item, storage_location},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
}

/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLocationInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Listing row for location overviews: the location plus how many
/// entries with remaining stock live there.
#[derive(Debug, Serialize)]
pub struct LocationSummary {
    pub location: storage_location::Model,
    pub active_entries: u64,
}

/// Service for managing storage locations (reference data).
#[derive(Clone)]
pub struct LocationService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl LocationService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a storage location. Names are unique across locations.
    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> Result<storage_location::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;
        self.ensure_name_free(&input.name, None).await?;

        let location = storage_location::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        };
        let location = location.insert(db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::LocationCreated(location.id))
            .await;
        info!(location_id = location.id, name = %location.name, "Created storage location");
        Ok(location)
    }

    #[instrument(skip(self))]
    pub async fn update_location(
        &self,
        id: i32,
        input: UpdateLocationInput,
    ) -> Result<storage_location::Model, ServiceError> {
        let db = &*self.db;
        let location = self.get_location(id).await?;

        if let Some(name) = &input.name {
            if name.is_empty() {
                return Err(ServiceError::validation("Name is required"));
            }
            if name != &location.name {
                self.ensure_name_free(name, Some(id)).await?;
            }
        }

        let mut active: storage_location::ActiveModel = location.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        let location = active.update(db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::LocationUpdated(location.id))
            .await;
        Ok(location)
    }

    /// Deletes a location. Protected: fails while any item names it as
    /// its default location or any inventory entry is stored there.
    #[instrument(skip(self))]
    pub async fn delete_location(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db;
        let location = self.get_location(id).await?;

        let referencing_items = item::Entity::find()
            .filter(item::Column::DefaultStorageLocationId.eq(id))
            .count(db)
            .await?;
        let referencing_entries = inventory_entry::Entity::find()
            .filter(inventory_entry::Column::StorageLocationId.eq(id))
            .count(db)
            .await?;
        if referencing_items > 0 || referencing_entries > 0 {
            return Err(ServiceError::ReferenceInUse(format!(
                "Storage location \"{}\" is referenced by {} item(s) and {} inventory entr(ies)",
                location.name, referencing_items, referencing_entries
            )));
        }

        storage_location::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::LocationDeleted(id))
            .await;
        info!(location_id = id, "Deleted storage location");
        Ok(())
    }

    pub async fn get_location(&self, id: i32) -> Result<storage_location::Model, ServiceError> {
        storage_location::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Storage location {} not found", id)))
    }

    /// All locations, ordered by name.
    pub async fn list_locations(&self) -> Result<Vec<storage_location::Model>, ServiceError> {
        let locations = storage_location::Entity::find()
            .order_by_asc(storage_location::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(locations)
    }

    /// Locations with their active-entry counts, for overview screens.
    pub async fn location_summaries(&self) -> Result<Vec<LocationSummary>, ServiceError> {
        let db = &*self.db;
        let mut summaries = Vec::new();
        for location in self.list_locations().await? {
            let active_entries = inventory_entry::Entity::find()
                .filter(inventory_entry::Column::StorageLocationId.eq(location.id))
                .filter(inventory_entry::Column::Quantity.gt(0))
                .count(db)
                .await?;
            summaries.push(LocationSummary {
                location,
                active_entries,
            });
        }
        Ok(summaries)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i32>) -> Result<(), ServiceError> {
        let mut query =
            storage_location::Entity::find().filter(storage_location::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(storage_location::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::DuplicateName(format!(
                "Storage location \"{}\" already exists",
                name
            )));
        }
        Ok(())
    }
}
