//! # Data Models
//!
//! SeaORM entities for the journals platform.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod announcement;
pub mod email_template;
pub mod menu_item;
pub mod role;
pub mod role_assignment;
pub mod role_permission;
pub mod submission;
pub mod tenant;
pub mod user;
pub mod visit;

pub use announcement::Entity as Announcement;
pub use email_template::Entity as EmailTemplate;
pub use menu_item::Entity as MenuItem;
pub use role::Entity as Role;
pub use role_assignment::Entity as RoleAssignment;
pub use role_permission::Entity as RolePermission;
pub use submission::Entity as Submission;
pub use tenant::Entity as Tenant;
pub use user::Entity as User;
pub use visit::Entity as Visit;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "journals".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
