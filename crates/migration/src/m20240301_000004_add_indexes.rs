use sea_orm_migration::prelude::*;

/// Partial unique index: one active store per (owner, coordinates, name).
const UNIQ_ACTIVE_STORE: &str = "CREATE UNIQUE INDEX IF NOT EXISTS uniq_store_active_owner_location_name \
    ON store (user_id, latitude, longitude, name) WHERE status = 'EXISTS'";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Store listing: filter by (status, category), newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_store_status_category_created")
                    .table(Store::Table)
                    .col(Store::Status)
                    .col(Store::Category)
                    .col(Store::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_store_user")
                    .table(Store::Table)
                    .col(Store::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_store_image_store")
                    .table(StoreImage::Table)
                    .col(StoreImage::StoreId)
                    .to_owned(),
            )
            .await?;

        manager.get_connection().execute_unprepared(UNIQ_ACTIVE_STORE).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uniq_store_active_owner_location_name")
            .await?;
        manager
            .drop_index(Index::drop().name("idx_store_image_store").table(StoreImage::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_store_user").table(Store::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_store_status_category_created").table(Store::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Store { Table, UserId, Status, Category, CreatedAt }

#[derive(DeriveIden)]
enum StoreImage { Table, StoreId }
