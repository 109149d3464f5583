//! Migration: create the user table.

use sea_orm::{DbBackend, EntityName};
use sea_orm_migration::prelude::*;

use crate::infra::db::{naming, IdPolicy};
use crate::infra::repositories::entities::user::{Column, Entity as UserEntity};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `user` table for the given backend.
///
/// Backends that generate UUIDs themselves get a `gen_random_uuid()`
/// column default; on the others the id is assigned before insert.
fn create_user_table(backend: DbBackend) -> TableCreateStatement {
    let table = UserEntity.table_name().to_string();

    let mut id = ColumnDef::new(Column::Id);
    id.uuid().not_null();
    if IdPolicy::for_backend(backend) == IdPolicy::Server {
        id.default(Expr::cust("gen_random_uuid()"));
    }

    Table::create()
        .table(UserEntity)
        .if_not_exists()
        .col(&mut id)
        .col(ColumnDef::new(Column::Email).string().not_null())
        .col(ColumnDef::new(Column::Name).string().not_null())
        .col(
            ColumnDef::new(Column::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .primary_key(
            Index::create()
                .name(naming::primary_key(&table))
                .col(Column::Id),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = UserEntity.table_name().to_string();

        manager
            .create_table(create_user_table(manager.get_database_backend()))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(naming::unique(&table, "email"))
                    .table(UserEntity)
                    .col(Column::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(naming::index(&table, "created_at"))
                    .table(UserEntity)
                    .col(Column::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserEntity).to_owned())
            .await
    }
}
