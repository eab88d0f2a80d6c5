//! Migration to create the menu_items table.
//!
//! `parent_id` is intentionally not a foreign key: orphaned and cyclic rows
//! are tolerated here and repaired when the tree is assembled.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MenuItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MenuItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MenuItems::TenantId).uuid().null())
                    .col(ColumnDef::new(MenuItems::ParentId).uuid().null())
                    .col(ColumnDef::new(MenuItems::Title).text().not_null())
                    .col(ColumnDef::new(MenuItems::Icon).text().null())
                    .col(
                        ColumnDef::new(MenuItems::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MenuItems::Permission).string_len(128).null())
                    .col(ColumnDef::new(MenuItems::Route).text().null())
                    .col(
                        ColumnDef::new(MenuItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MenuItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_items_tenant_id")
                            .from(MenuItems::Table, MenuItems::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_menu_items_tenant_order")
                    .table(MenuItems::Table)
                    .col(MenuItems::TenantId)
                    .col(MenuItems::SortOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_menu_items_tenant_order").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MenuItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MenuItems {
    Table,
    Id,
    TenantId,
    ParentId,
    Title,
    Icon,
    SortOrder,
    Permission,
    Route,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
