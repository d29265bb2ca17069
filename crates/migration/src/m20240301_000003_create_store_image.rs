//! Create `store_image` table with FK to `store`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StoreImage::Table)
                    .if_not_exists()
                    .col(big_integer(StoreImage::Id).auto_increment().primary_key())
                    .col(big_integer(StoreImage::StoreId).not_null())
                    .col(string_len(StoreImage::ImageUrl, 1024).not_null())
                    .col(string_len(StoreImage::Status, 16).not_null())
                    .col(timestamp_with_time_zone(StoreImage::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_store_image_store")
                            .from(StoreImage::Table, StoreImage::StoreId)
                            .to(Store::Table, Store::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(StoreImage::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum StoreImage { Table, Id, StoreId, ImageUrl, Status, CreatedAt }

#[derive(DeriveIden)]
enum Store { Table, Id }
