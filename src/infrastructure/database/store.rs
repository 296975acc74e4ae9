use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AdministrativeUser, Plan, Tenant, TenantId};
use crate::error::Result;

/// Tables the backend cannot operate without.
pub const REQUIRED_TABLES: [&str; 4] = ["users", "companies", "queues", "tickets"];

/// Name of the table that records applied migrations.
pub const MIGRATION_LEDGER: &str = "schema_migrations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Narrow contract over the relational/document store.
///
/// Callers follow a read-then-conditionally-write discipline: nothing here
/// upserts, and `update_user_tenant` touches only the tenant linkage.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn find_plan(&self, id: i32) -> Result<Option<Plan>>;
    async fn insert_plan(&self, plan: &Plan) -> Result<()>;

    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>>;
    async fn insert_tenant(&self, tenant: &Tenant) -> Result<()>;
    async fn list_tenants(&self) -> Result<Vec<Tenant>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AdministrativeUser>>;
    async fn insert_user(&self, user: &AdministrativeUser) -> Result<()>;
    async fn update_user_tenant(&self, user_id: Uuid, tenant_id: TenantId) -> Result<()>;

    async fn list_tables(&self) -> Result<Vec<String>>;
    /// Applied migrations ordered by name. Fails with a schema error when the
    /// ledger table does not exist.
    async fn list_applied_migrations(&self) -> Result<Vec<AppliedMigration>>;
}
