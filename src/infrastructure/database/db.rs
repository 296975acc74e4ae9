use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson_with_options, Bson, Document, SerializerOptions},
    options::{ClientOptions, FindOptions},
    Client, Collection, Database,
};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::store::{AppliedMigration, DataStore, MIGRATION_LEDGER};
use crate::config::DatabaseConfig;
use crate::domain::{AdministrativeUser, Plan, Tenant, TenantId};
use crate::error::{AppError, Result};

const PLANS: &str = "plans";
const COMPANIES: &str = "companies";
const USERS: &str = "users";

/// Encode a value the way `insert_one` stores it. Filters built with the
/// human-readable encoder do not match binary fields such as UUIDs.
fn stored_bson<T: serde::Serialize>(value: &T) -> Result<Bson> {
    let options = SerializerOptions::builder().human_readable(false).build();
    to_bson_with_options(value, options)
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode value: {}", e)))
}

fn user_filter(user_id: Uuid) -> Result<Document> {
    Ok(doc! {"id": stored_bson(&user_id)?})
}

/// MongoDB-backed [`DataStore`].
#[derive(Clone)]
pub struct DatabaseManager {
    pub client: Client,
    pub database: Database,
}

impl DatabaseManager {
    /// Build the client and confirm the server answers a ping within `timeout`.
    pub async fn new(config: &DatabaseConfig, timeout: Duration) -> Result<Self> {
        let manager = Self::open(config, timeout).await?;
        manager.ping().await?;

        info!("✅ Successfully connected to MongoDB!");
        Ok(manager)
    }

    /// Build the client without contacting the server. The driver connects on
    /// first use, so an unreachable database surfaces as per-call errors.
    pub async fn open(config: &DatabaseConfig, timeout: Duration) -> Result<Self> {
        info!(host = %config.host, port = config.port, database = %config.name, "🔄 Connecting to MongoDB...");

        let mut client_options = ClientOptions::parse(config.connection_uri())
            .await
            .map_err(|e| AppError::ConfigurationError(format!("Failed to parse MongoDB URI: {}", e)))?;
        client_options.connect_timeout = Some(timeout);
        client_options.server_selection_timeout = Some(timeout);
        client_options.app_name = Some("tenant-boot".to_string());

        let client = Client::with_options(client_options).map_err(|e| {
            AppError::ConnectivityError(format!("Failed to create MongoDB client: {}", e))
        })?;

        Ok(DatabaseManager {
            database: client.database(&config.name),
            client,
        })
    }

    fn plans(&self) -> Collection<Plan> {
        self.database.collection::<Plan>(PLANS)
    }

    fn companies(&self) -> Collection<Tenant> {
        self.database.collection::<Tenant>(COMPANIES)
    }

    fn users(&self) -> Collection<AdministrativeUser> {
        self.database.collection::<AdministrativeUser>(USERS)
    }
}

#[async_trait]
impl DataStore for DatabaseManager {
    async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await
            .map_err(|e| AppError::ConnectivityError(format!("Failed to ping MongoDB: {}", e)))?;
        Ok(())
    }

    async fn find_plan(&self, id: i32) -> Result<Option<Plan>> {
        self.plans()
            .find_one(doc! {"_id": id}, None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to find plan {}: {}", id, e)))
    }

    async fn insert_plan(&self, plan: &Plan) -> Result<()> {
        self.plans()
            .insert_one(plan, None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create plan {}: {}", plan.id, e)))?;
        Ok(())
    }

    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>> {
        self.companies()
            .find_one(doc! {"_id": id}, None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to find company {}: {}", id, e)))
    }

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<()> {
        self.companies()
            .insert_one(tenant, None)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create company {}: {}", tenant.id, e))
            })?;
        Ok(())
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        let cursor = self
            .companies()
            .find(None, options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list companies: {}", e)))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read companies: {}", e)))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AdministrativeUser>> {
        self.users()
            .find_one(doc! {"email": email}, None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to find user by email: {}", e)))
    }

    async fn insert_user(&self, user: &AdministrativeUser) -> Result<()> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create user: {}", e)))?;
        Ok(())
    }

    async fn update_user_tenant(&self, user_id: Uuid, tenant_id: TenantId) -> Result<()> {
        let now = stored_bson(&chrono::Utc::now())?;

        let result = self
            .users()
            .update_one(
                user_filter(user_id)?,
                doc! {"$set": {"company_id": tenant_id, "updated_at": now}},
                None,
            )
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update user: {}", e)))?;

        if result.matched_count == 0 {
            return Err(AppError::IdentityError(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = self
            .database
            .list_collection_names(None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list collections: {}", e)))?;
        names.sort();
        debug!(count = names.len(), "Listed collections");
        Ok(names)
    }

    async fn list_applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        if !self.list_tables().await?.iter().any(|t| t == MIGRATION_LEDGER) {
            return Err(AppError::SchemaError(format!(
                "migration ledger '{}' not found",
                MIGRATION_LEDGER
            )));
        }

        let options = FindOptions::builder().sort(doc! {"name": 1}).build();
        let cursor = self
            .database
            .collection::<AppliedMigration>(MIGRATION_LEDGER)
            .find(None, options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read migrations: {}", e)))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read migrations: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::to_raw_document_buf;

    #[test]
    fn test_user_filter_matches_stored_id() {
        let user = AdministrativeUser::new_super("Admin", "admin@admin.com", "hash".into(), 1);
        let stored = to_raw_document_buf(&user).unwrap().to_document().unwrap();

        let filter = user_filter(user.id).unwrap();
        assert_eq!(filter.get("id"), stored.get("id"));
        assert!(matches!(filter.get("id"), Some(Bson::Binary(_))));
    }

    #[test]
    fn test_stored_timestamp_matches_inserted_representation() {
        let user = AdministrativeUser::new_super("Admin", "admin@admin.com", "hash".into(), 1);
        let stored = to_raw_document_buf(&user).unwrap().to_document().unwrap();

        let updated_at = stored_bson(&user.updated_at.unwrap()).unwrap();
        assert_eq!(Some(&updated_at), stored.get("updated_at"));
    }
}
