use sea_orm_migration::prelude::*;

/// Schema migrations for the pantry inventory tables.
///
/// Foreign keys carry the delete policy of the data model: restrict
/// (protect) from items and entries toward reference data, cascade down
/// the ownership chain item -> entry -> usage log. The service layer
/// enforces the same rules explicitly; the constraints are the backstop.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_storage_locations_table::Migration),
            Box::new(m20240101_000002_create_categories_table::Migration),
            Box::new(m20240101_000003_create_items_table::Migration),
            Box::new(m20240101_000004_create_inventory_entries_table::Migration),
            Box::new(m20240101_000005_create_usage_logs_table::Migration),
        ]
    }
}

mod m20240101_000001_create_storage_locations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_storage_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StorageLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StorageLocations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StorageLocations::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StorageLocations::Description).text().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StorageLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StorageLocations {
        Table,
        Id,
        Name,
        Description,
    }
}

mod m20240101_000002_create_categories_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Categories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
        Description,
    }
}

mod m20240101_000003_create_items_table {

    use super::m20240101_000001_create_storage_locations_table::StorageLocations;
    use super::m20240101_000002_create_categories_table::Categories;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::CategoryId).integer().not_null())
                        .col(
                            ColumnDef::new(Items::DefaultStorageLocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Items::PreferredStore).string().null())
                        .col(
                            ColumnDef::new(Items::TypicalQuantityUnit)
                                .string()
                                .not_null()
                                .default("unit"),
                        )
                        .col(ColumnDef::new(Items::LowStockThreshold).integer().null())
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_category_id")
                                .from(Items::Table, Items::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_default_storage_location_id")
                                .from(Items::Table, Items::DefaultStorageLocationId)
                                .to(StorageLocations::Table, StorageLocations::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_category_id")
                        .table(Items::Table)
                        .col(Items::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Items {
        Table,
        Id,
        Name,
        CategoryId,
        DefaultStorageLocationId,
        PreferredStore,
        TypicalQuantityUnit,
        LowStockThreshold,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_inventory_entries_table {

    use super::m20240101_000001_create_storage_locations_table::StorageLocations;
    use super::m20240101_000003_create_items_table::Items;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryEntries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryEntries::ItemId).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryEntries::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(InventoryEntries::StorageLocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryEntries::PurchaseDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryEntries::ExpirationDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryEntries::Notes).text().null())
                        .col(
                            ColumnDef::new(InventoryEntries::DateAdded)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_entries_item_id")
                                .from(InventoryEntries::Table, InventoryEntries::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_entries_storage_location_id")
                                .from(InventoryEntries::Table, InventoryEntries::StorageLocationId)
                                .to(StorageLocations::Table, StorageLocations::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_entries_item_id")
                        .table(InventoryEntries::Table)
                        .col(InventoryEntries::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_entries_expiration_date")
                        .table(InventoryEntries::Table)
                        .col(InventoryEntries::ExpirationDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryEntries {
        Table,
        Id,
        ItemId,
        Quantity,
        StorageLocationId,
        PurchaseDate,
        ExpirationDate,
        Notes,
        DateAdded,
    }
}

mod m20240101_000005_create_usage_logs_table {

    use super::m20240101_000004_create_inventory_entries_table::InventoryEntries;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_usage_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UsageLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UsageLogs::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(UsageLogs::InventoryEntryId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UsageLogs::QuantityUsed).integer().not_null())
                        .col(ColumnDef::new(UsageLogs::UsageDate).date().not_null())
                        .col(ColumnDef::new(UsageLogs::Notes).text().null())
                        .col(
                            ColumnDef::new(UsageLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_usage_logs_inventory_entry_id")
                                .from(UsageLogs::Table, UsageLogs::InventoryEntryId)
                                .to(InventoryEntries::Table, InventoryEntries::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_usage_logs_inventory_entry_id")
                        .table(UsageLogs::Table)
                        .col(UsageLogs::InventoryEntryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UsageLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum UsageLogs {
        Table,
        Id,
        InventoryEntryId,
        QuantityUsed,
        UsageDate,
        Notes,
        CreatedAt,
    }
}
