pub mod entities;

pub use entities::{AdministrativeUser, FilteredUser, LoginUserSchema, Plan, Tenant, TenantId};
