//! Database seeding functionality
//!
//! Seeds the default editorial roles and notification templates. Seeding is
//! idempotent: records that already exist are left as operators edited them.

pub mod defaults;

pub use defaults::{seed_defaults, seed_roles, seed_templates};
