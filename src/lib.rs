//! # Journals API Library
//!
//! Core of the multi-tenant journal platform: tenant resolution, tenant-scoped
//! repositories, the permission-filtered menu tree, the template merge engine,
//! and the HTTP surface built on them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod menu;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod templating;
pub mod tenancy;
pub mod workflow;
pub use migration;
