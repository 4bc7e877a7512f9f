use crate::{
    db::DbPool,
    entities::{category, item},
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
pub struct CreateCategoryInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
}

/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: category::Model,
    pub items: u64,
}

/// Service for managing item categories (reference data).
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a category. Names are unique across categories.
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        self.ensure_name_free(&input.name, None).await?;

        let category = category::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        };
        let category = category.insert(&*self.db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;
        info!(category_id = category.id, name = %category.name, "Created category");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: i32,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let category = self.get_category(id).await?;

        if let Some(name) = &input.name {
            if name.is_empty() {
                return Err(ServiceError::validation("Name is required"));
            }
            if name != &category.name {
                self.ensure_name_free(name, Some(id)).await?;
            }
        }

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        let category = active.update(&*self.db).await.map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category.id))
            .await;
        Ok(category)
    }

    /// Deletes a category. Protected: fails while any item references it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        let category = self.get_category(id).await?;

        let referencing_items = item::Entity::find()
            .filter(item::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if referencing_items > 0 {
            return Err(ServiceError::ReferenceInUse(format!(
                "Category \"{}\" is referenced by {} item(s)",
                category.name, referencing_items
            )));
        }

        category::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(ServiceError::db)?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(id))
            .await;
        info!(category_id = id, "Deleted category");
        Ok(())
    }

    pub async fn get_category(&self, id: i32) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Category {} not found", id)))
    }

    /// All categories, ordered by name.
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    /// Categories with their item counts, for overview screens.
    pub async fn category_summaries(&self) -> Result<Vec<CategorySummary>, ServiceError> {
        let mut summaries = Vec::new();
        for category in self.list_categories().await? {
            let items = item::Entity::find()
                .filter(item::Column::CategoryId.eq(category.id))
                .count(&*self.db)
                .await?;
            summaries.push(CategorySummary { category, items });
        }
        Ok(summaries)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i32>) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::DuplicateName(format!(
                "Category \"{}\" already exists",
                name
            )));
        }
        Ok(())
    }
}
