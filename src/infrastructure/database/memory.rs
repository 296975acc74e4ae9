//! In-process [`DataStore`] used by tests and local tooling.
//!
//! Behaves like the MongoDB store for the operations the bootstrapper and
//! diagnostics rely on: unique keys are enforced on insert, and the table
//! list drives schema/ledger introspection.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{AppliedMigration, DataStore, MIGRATION_LEDGER, REQUIRED_TABLES};
use crate::domain::{AdministrativeUser, Plan, Tenant, TenantId};
use crate::error::{AppError, Result};

pub struct InMemoryDataStore {
    plans: RwLock<BTreeMap<i32, Plan>>,
    tenants: RwLock<BTreeMap<TenantId, Tenant>>,
    users: RwLock<Vec<AdministrativeUser>>,
    tables: RwLock<BTreeSet<String>>,
    migrations: RwLock<Vec<AppliedMigration>>,
    failing_tables: RwLock<HashSet<String>>,
    unreachable: AtomicBool,
    writes: AtomicUsize,
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDataStore {
    /// Empty store with every table (including the migration ledger) present.
    pub fn new() -> Self {
        let mut tables: BTreeSet<String> = REQUIRED_TABLES.iter().map(|t| t.to_string()).collect();
        tables.insert("plans".to_string());
        tables.insert(MIGRATION_LEDGER.to_string());

        Self {
            plans: RwLock::new(BTreeMap::new()),
            tenants: RwLock::new(BTreeMap::new()),
            users: RwLock::new(Vec::new()),
            tables: RwLock::new(tables),
            migrations: RwLock::new(Vec::new()),
            failing_tables: RwLock::new(HashSet::new()),
            unreachable: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub async fn drop_table(&self, table: &str) {
        self.tables.write().await.remove(table);
    }

    pub async fn record_migration(&self, name: &str) {
        self.migrations.write().await.push(AppliedMigration {
            name: name.to_string(),
            applied_at: Some(chrono::Utc::now()),
        });
    }

    /// Make every subsequent write to `table` fail.
    pub async fn fail_writes_for(&self, table: &str) {
        self.failing_tables.write().await.insert(table.to_string());
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of successful inserts and updates so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn plans(&self) -> Vec<Plan> {
        self.plans.read().await.values().cloned().collect()
    }

    pub async fn users(&self) -> Vec<AdministrativeUser> {
        self.users.read().await.clone()
    }

    /// Seed a user directly, bypassing uniqueness checks and write counting.
    pub async fn put_user(&self, user: AdministrativeUser) {
        self.users.write().await.push(user);
    }

    pub async fn put_tenant(&self, tenant: Tenant) {
        self.tenants.write().await.insert(tenant.id, tenant);
    }

    pub async fn put_plan(&self, plan: Plan) {
        self.plans.write().await.insert(plan.id, plan);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::ConnectivityError(
                "in-memory store marked unreachable".to_string(),
            ));
        }
        Ok(())
    }

    async fn check_writable(&self, table: &str) -> Result<()> {
        self.check_reachable()?;
        if self.failing_tables.read().await.contains(table) {
            return Err(AppError::DatabaseError(format!("write to '{}' rejected", table)));
        }
        Ok(())
    }

    async fn check_table(&self, table: &str) -> Result<()> {
        if !self.tables.read().await.contains(table) {
            return Err(AppError::SchemaError(format!("table '{}' does not exist", table)));
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn ping(&self) -> Result<()> {
        self.check_reachable()
    }

    async fn find_plan(&self, id: i32) -> Result<Option<Plan>> {
        self.check_reachable()?;
        Ok(self.plans.read().await.get(&id).cloned())
    }

    async fn insert_plan(&self, plan: &Plan) -> Result<()> {
        self.check_writable("plans").await?;
        let mut plans = self.plans.write().await;
        if plans.contains_key(&plan.id) {
            return Err(AppError::DatabaseError(format!("duplicate plan id {}", plan.id)));
        }
        plans.insert(plan.id, plan.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>> {
        self.check_reachable()?;
        self.check_table("companies").await?;
        Ok(self.tenants.read().await.get(&id).cloned())
    }

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<()> {
        self.check_writable("companies").await?;
        self.check_table("companies").await?;
        let mut tenants = self.tenants.write().await;
        if tenants.contains_key(&tenant.id) {
            return Err(AppError::DatabaseError(format!("duplicate company id {}", tenant.id)));
        }
        tenants.insert(tenant.id, tenant.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        self.check_reachable()?;
        self.check_table("companies").await?;
        Ok(self.tenants.read().await.values().cloned().collect())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AdministrativeUser>> {
        self.check_reachable()?;
        self.check_table("users").await?;
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &AdministrativeUser) -> Result<()> {
        self.check_writable("users").await?;
        self.check_table("users").await?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::DatabaseError(format!("duplicate email {}", user.email)));
        }
        users.push(user.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_user_tenant(&self, user_id: Uuid, tenant_id: TenantId) -> Result<()> {
        self.check_writable("users").await?;
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::IdentityError(format!("User {} not found", user_id)))?;
        user.company_id = Some(tenant_id);
        user.updated_at = Some(chrono::Utc::now());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.check_reachable()?;
        Ok(self.tables.read().await.iter().cloned().collect())
    }

    async fn list_applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        self.check_reachable()?;
        self.check_table(MIGRATION_LEDGER).await.map_err(|_| {
            AppError::SchemaError(format!("migration ledger '{}' not found", MIGRATION_LEDGER))
        })?;
        let mut migrations = self.migrations.read().await.clone();
        migrations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(migrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_enforces_unique_plan_id() {
        let store = InMemoryDataStore::new();
        let plan = Plan::new(1, "Plano Individual", 1, 1, 3, 49.90);
        store.insert_plan(&plan).await.unwrap();
        assert!(store.insert_plan(&plan).await.is_err());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_ledger_is_schema_error() {
        let store = InMemoryDataStore::new();
        store.drop_table(MIGRATION_LEDGER).await;
        let err = store.list_applied_migrations().await.unwrap_err();
        assert!(matches!(err, AppError::SchemaError(_)));
    }

    #[tokio::test]
    async fn test_migrations_sorted_by_name() {
        let store = InMemoryDataStore::new();
        store.record_migration("20200904-b").await;
        store.record_migration("20200101-a").await;
        let names: Vec<String> = store
            .list_applied_migrations()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["20200101-a", "20200904-b"]);
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_every_call() {
        let store = InMemoryDataStore::new();
        store.set_unreachable(true);
        assert!(matches!(store.ping().await, Err(AppError::ConnectivityError(_))));
        assert!(store.list_tables().await.is_err());
        assert!(store.find_plan(1).await.is_err());
    }
}
