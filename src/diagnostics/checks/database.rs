use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::bootstrap::{ADMIN_DEFAULT_PASSWORD, ADMIN_EMAIL};
use crate::diagnostics::check::{DiagnosticCheck, ProbeContext, ProbeResult, ShortCircuitPolicy, Tier};
use crate::error::AppError;
use crate::infrastructure::database::{MIGRATION_LEDGER, REQUIRED_TABLES};

const RUN_MIGRATIONS: &str = "Run the database migrations before starting the server";
const RUN_BOOTSTRAP: &str = "Start the server once so the bootstrap can seed and repair the default records";

/// Data-store connectivity. Attempted even with incomplete configuration so
/// the connection error itself is visible.
pub struct DatabaseConnectionCheck;

#[async_trait]
impl DiagnosticCheck for DatabaseConnectionCheck {
    fn name(&self) -> &'static str {
        "database-connection"
    }

    fn title(&self) -> &'static str {
        "Database connection"
    }

    fn tier(&self) -> Tier {
        Tier::Connectivity
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["environment"]
    }

    fn policy(&self) -> ShortCircuitPolicy {
        ShortCircuitPolicy::AttemptAnyway
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let summary = ctx.config.database.summary();
        match ctx.connect_store().await {
            Ok(_) => ProbeResult::pass(format!("Connected to {}", ctx.store_target()))
                .with_details(json!(summary)),
            Err(e) => ProbeResult::from_error("Database connection failed", &e)
                .with_details(json!(summary))
                .with_suggestion("Check DB_HOST, DB_PORT and credentials, and that the database server is running"),
        }
    }
}

pub struct SchemaCheck;

#[async_trait]
impl DiagnosticCheck for SchemaCheck {
    fn name(&self) -> &'static str {
        "database-schema"
    }

    fn title(&self) -> &'static str {
        "Database tables"
    }

    fn tier(&self) -> Tier {
        Tier::Schema
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["database-connection"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let tables = match ctx.store() {
            Ok(store) => store.list_tables().await,
            Err(e) => Err(e),
        };
        let tables = match tables {
            Ok(tables) => tables,
            Err(e) => return ProbeResult::from_error("Could not list tables", &e),
        };

        let missing: Vec<&str> = REQUIRED_TABLES
            .iter()
            .copied()
            .filter(|required| !tables.iter().any(|t| t == required))
            .collect();

        if missing.is_empty() {
            ProbeResult::pass(format!("All {} required tables exist", REQUIRED_TABLES.len()))
                .with_details(json!({ "tables": REQUIRED_TABLES }))
        } else {
            ProbeResult::fail(format!("Missing tables: {}", missing.join(", ")))
                .with_details(json!({ "missingTables": missing, "found": tables }))
                .with_suggestion(RUN_MIGRATIONS)
        }
    }
}

pub struct MigrationLedgerCheck;

#[async_trait]
impl DiagnosticCheck for MigrationLedgerCheck {
    fn name(&self) -> &'static str {
        "migration-ledger"
    }

    fn title(&self) -> &'static str {
        "Migrations"
    }

    fn tier(&self) -> Tier {
        Tier::Schema
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["database-connection"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let applied = match ctx.store() {
            Ok(store) => store.list_applied_migrations().await,
            Err(e) => Err(e),
        };

        match applied {
            Ok(applied) => {
                let latest: Vec<&str> = applied.iter().rev().take(3).map(|m| m.name.as_str()).collect();
                ProbeResult::pass(format!("{} migrations applied", applied.len()))
                    .with_details(json!({ "count": applied.len(), "latest": latest }))
            }
            Err(e @ AppError::SchemaError(_)) => {
                ProbeResult::from_error(format!("Migration ledger '{}' not found", MIGRATION_LEDGER), &e)
                    .with_suggestion(RUN_MIGRATIONS)
            }
            Err(e) => ProbeResult::from_error("Could not read the migration ledger", &e),
        }
    }
}

/// The seeded administrator exists and is linked to an existing tenant.
pub struct DefaultAdminCheck;

#[async_trait]
impl DiagnosticCheck for DefaultAdminCheck {
    fn name(&self) -> &'static str {
        "default-admin"
    }

    fn title(&self) -> &'static str {
        "Default admin user"
    }

    fn tier(&self) -> Tier {
        Tier::Identity
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["database-schema", "migration-ledger"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let store = match ctx.store() {
            Ok(store) => store,
            Err(e) => return ProbeResult::from_error("No database connection", &e),
        };

        let user = match store.find_user_by_email(ADMIN_EMAIL).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                let e = AppError::IdentityError(format!("no user with email {}", ADMIN_EMAIL));
                return ProbeResult::from_error("Default admin user not found", &e)
                    .with_suggestion(RUN_BOOTSTRAP);
            }
            Err(e) => return ProbeResult::from_error("Could not look up the default admin", &e),
        };

        let tenant = match user.company_id {
            Some(id) => match store.find_tenant(id).await {
                Ok(tenant) => tenant,
                Err(e) => return ProbeResult::from_error("Could not look up the admin's company", &e),
            },
            None => None,
        };

        let details = json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "profile": user.profile,
            "super": user.is_super,
            "companyId": user.company_id,
            "hasCompany": tenant.is_some(),
        });

        match tenant {
            Some(tenant) => ProbeResult::pass(format!("Admin found, linked to '{}'", tenant.name))
                .with_details(details),
            None => ProbeResult::fail("Admin user is not linked to an existing company")
                .with_details(details)
                .with_details(json!({ "kind": "identity" }))
                .with_suggestion(RUN_BOOTSTRAP),
        }
    }
}

/// The default password still verifies against the stored hash.
pub struct DefaultPasswordCheck;

#[async_trait]
impl DiagnosticCheck for DefaultPasswordCheck {
    fn name(&self) -> &'static str {
        "default-password"
    }

    fn title(&self) -> &'static str {
        "Default admin password"
    }

    fn tier(&self) -> Tier {
        Tier::Identity
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["database-schema", "migration-ledger"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let user = match ctx.store() {
            Ok(store) => store.find_user_by_email(ADMIN_EMAIL).await,
            Err(e) => Err(e),
        };
        let user = match user {
            Ok(Some(user)) => user,
            Ok(None) => {
                return ProbeResult::fail("Default admin user not found").with_suggestion(RUN_BOOTSTRAP)
            }
            Err(e) => return ProbeResult::from_error("Could not look up the default admin", &e),
        };

        let format = ctx.hasher.describe_format(&user.password_hash);
        let details = json!({ "hashFormat": format });

        // Argon2 is CPU-bound; off the runtime so the registry timeout can fire.
        let hasher = Arc::clone(&ctx.hasher);
        let stored_hash = user.password_hash;
        let verified = match tokio::task::spawn_blocking(move || {
            hasher.verify(ADMIN_DEFAULT_PASSWORD, &stored_hash)
        })
        .await
        {
            Ok(verified) => verified,
            Err(e) => {
                let e =
                    AppError::InternalServerError(format!("Password verification aborted: {}", e));
                return ProbeResult::from_error("Default password could not be verified", &e)
                    .with_details(details);
            }
        };

        match verified {
            Ok(true) => ProbeResult::pass("Default password is valid").with_details(details),
            Ok(false) => {
                let e = AppError::CredentialError("password does not match the stored hash".to_string());
                ProbeResult::from_error("Default password does not match", &e)
                    .with_details(details)
                    .with_suggestion("The admin password was changed; log in with the current password or reset it")
            }
            Err(e) => ProbeResult::from_error("Stored password hash could not be verified", &e)
                .with_details(details)
                .with_suggestion("Re-hash the admin password with the current hashing scheme"),
        }
    }
}
