//! Migration to create the visits table used for visitor analytics.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Visits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Visits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Visits::TenantId).uuid().null())
                    .col(ColumnDef::new(Visits::Path).text().not_null())
                    .col(ColumnDef::new(Visits::Referrer).text().null())
                    .col(ColumnDef::new(Visits::UserAgent).text().null())
                    .col(
                        ColumnDef::new(Visits::VisitedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visits_tenant_id")
                            .from(Visits::Table, Visits::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visits_tenant_path")
                    .table(Visits::Table)
                    .col(Visits::TenantId)
                    .col(Visits::Path)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_visits_tenant_path").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Visits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Visits {
    Table,
    Id,
    TenantId,
    Path,
    Referrer,
    UserAgent,
    VisitedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
