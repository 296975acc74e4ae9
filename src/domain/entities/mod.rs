pub mod plan;
pub mod tenant;
pub mod user;

pub use plan::Plan;
pub use tenant::{Tenant, TenantId};
pub use user::{AdministrativeUser, FilteredUser, LoginUserSchema};
