//! # Repository Layer
//!
//! Repositories encapsulate SeaORM operations. Journal-owned entities go through
//! [`scoped::ScopedRepository`], which filters and stamps by the request's tenant.

pub mod announcement;
pub mod email_template;
pub mod menu;
pub mod role;
pub mod scoped;
pub mod submission;
pub mod tenant;
pub mod user;
pub mod visit;

pub use announcement::{AnnouncementRepository, NewAnnouncement};
pub use email_template::EmailTemplateRepository;
pub use menu::{MenuItemChanges, MenuItemRepository, NewMenuItem};
pub use role::{RoleRepository, RoleWithPermissions};
pub use scoped::{ScopedRepository, TenantScoped};
pub use submission::SubmissionRepository;
pub use tenant::{CreateTenantRequest, TenantRepository, UpdateTenantRequest};
pub use user::{CreateUserRequest, UserRepository};
pub use visit::{PathCount, VisitRepository, VisitStats};
