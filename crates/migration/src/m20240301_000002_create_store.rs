//! Create `store` table with FK to `user`.
//!
//! Soft-deleted through `status` (`EXISTS` / `DELETED`); rows are never removed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Store::Table)
                    .if_not_exists()
                    .col(big_integer(Store::Id).auto_increment().primary_key())
                    .col(uuid(Store::UserId).not_null())
                    .col(string_len(Store::Name, 128).not_null())
                    .col(string_len(Store::Category, 64).not_null())
                    .col(double(Store::Latitude).not_null())
                    .col(double(Store::Longitude).not_null())
                    .col(ColumnDef::new(Store::AddressName).string_len(255).null())
                    .col(ColumnDef::new(Store::Body).text().null())
                    .col(ColumnDef::new(Store::Phone).string_len(32).null())
                    .col(ColumnDef::new(Store::Homepage).string_len(512).null())
                    .col(string_len(Store::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Store::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Store::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_store_user")
                            .from(Store::Table, Store::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Store::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Store {
    Table,
    Id,
    UserId,
    Name,
    Category,
    Latitude,
    Longitude,
    AddressName,
    Body,
    Phone,
    Homepage,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
