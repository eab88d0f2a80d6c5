//! Database migrations for the journals platform.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_01_01_000001_create_tenants;
mod m2025_01_06_000100_create_users_and_roles;
mod m2025_01_06_000200_create_menu_items;
mod m2025_01_06_000300_create_announcements;
mod m2025_01_06_000400_create_visits;
mod m2025_01_06_000500_create_email_templates;
mod m2025_01_06_000600_create_submissions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_01_01_000001_create_tenants::Migration),
            Box::new(m2025_01_06_000100_create_users_and_roles::Migration),
            Box::new(m2025_01_06_000200_create_menu_items::Migration),
            Box::new(m2025_01_06_000300_create_announcements::Migration),
            Box::new(m2025_01_06_000400_create_visits::Migration),
            Box::new(m2025_01_06_000500_create_email_templates::Migration),
            Box::new(m2025_01_06_000600_create_submissions::Migration),
        ]
    }
}
