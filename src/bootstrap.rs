//! Self-healing bootstrap of baseline reference data.
//!
//! Runs once per process, before session orchestration. Every step is a
//! read-by-key followed by an insert only when the row is absent; existing
//! rows are never overwritten, so operator edits survive restarts.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{AdministrativeUser, Plan, Tenant, TenantId};
use crate::error::Result;
use crate::infrastructure::database::DataStore;
use crate::infrastructure::password::PasswordHasher;

pub const DEFAULT_TENANT_ID: TenantId = 1;
pub const DEFAULT_TENANT_NAME: &str = "Empresa Admin";
pub const DEFAULT_PLAN_ID: i32 = 1;
pub const ADMIN_NAME: &str = "Admin";
pub const ADMIN_EMAIL: &str = "admin@admin.com";
pub const ADMIN_DEFAULT_PASSWORD: &str = "123456";

/// Canonical plan definitions: (id, name, users, connections, queues, value).
pub const CANONICAL_PLANS: [(i32, &str, u32, u32, u32, f64); 3] = [
    (1, "Plano Individual", 1, 1, 3, 49.90),
    (2, "Plano Plus", 5, 3, 10, 99.90),
    (3, "Plano Pro", 10, 10, 20, 199.90),
];

/// Far-future validity date for the default tenant.
pub fn default_tenant_due_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2093, 3, 14, 3, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "reason", rename_all = "snake_case")]
pub enum StepAction {
    Created,
    Unchanged,
    Repaired,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapStep {
    pub subject: String,
    pub action: StepAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapOutcome {
    pub steps: Vec<BootstrapStep>,
}

impl BootstrapOutcome {
    fn record(&mut self, subject: impl Into<String>, action: StepAction) {
        self.steps.push(BootstrapStep {
            subject: subject.into(),
            action,
        });
    }

    pub fn is_degraded(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.action, StepAction::Failed(_)))
    }

    pub fn count(&self, action: &StepAction) -> usize {
        self.steps
            .iter()
            .filter(|s| std::mem::discriminant(&s.action) == std::mem::discriminant(action))
            .count()
    }

    pub fn action_for(&self, subject: &str) -> Option<&StepAction> {
        self.steps
            .iter()
            .find(|s| s.subject == subject)
            .map(|s| &s.action)
    }
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} repaired, {} unchanged, {} failed",
            self.count(&StepAction::Created),
            self.count(&StepAction::Repaired),
            self.count(&StepAction::Unchanged),
            self.count(&StepAction::Failed(String::new()))
        )
    }
}

pub struct SelfHealingBootstrapper {
    store: Arc<dyn DataStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl SelfHealingBootstrapper {
    pub fn new(store: Arc<dyn DataStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Ensure plans, the default tenant and the administrator exist.
    ///
    /// Never fails: each step's error is logged and recorded in the outcome,
    /// and the remaining steps still run.
    pub async fn run(&self) -> BootstrapOutcome {
        info!("🩺 [Self-Healing] Checking baseline data...");
        let mut outcome = BootstrapOutcome::default();

        for (id, name, users, connections, queues, value) in CANONICAL_PLANS {
            let plan = Plan::new(id, name, users, connections, queues, value);
            let subject = format!("plan:{}", id);
            let action = settle(&subject, self.ensure_plan(&plan).await);
            if action == StepAction::Created {
                info!(plan_id = id, "✅ [Self-Healing] Plan '{}' created.", name);
            }
            outcome.record(subject, action);
        }

        let action = settle("tenant:default", self.ensure_default_tenant().await);
        if action == StepAction::Created {
            info!(tenant_id = DEFAULT_TENANT_ID, "✅ [Self-Healing] Default company created.");
        }
        outcome.record("tenant:default", action);

        let action = settle("user:admin", self.ensure_admin_user().await);
        match action {
            StepAction::Created => info!("✅ [Self-Healing] Admin user created."),
            StepAction::Repaired => info!("✅ [Self-Healing] Admin user relinked to default company."),
            _ => {}
        }
        outcome.record("user:admin", action);

        if outcome.is_degraded() {
            warn!(summary = %outcome, "⚠️ [Self-Healing] Bootstrap finished degraded");
        } else {
            info!(summary = %outcome, "✅ [Self-Healing] Bootstrap finished");
        }
        outcome
    }

    async fn ensure_plan(&self, plan: &Plan) -> Result<StepAction> {
        if self.store.find_plan(plan.id).await?.is_some() {
            return Ok(StepAction::Unchanged);
        }
        self.store.insert_plan(plan).await?;
        Ok(StepAction::Created)
    }

    async fn ensure_default_tenant(&self) -> Result<StepAction> {
        if self.store.find_tenant(DEFAULT_TENANT_ID).await?.is_some() {
            return Ok(StepAction::Unchanged);
        }
        let tenant = Tenant::new(
            DEFAULT_TENANT_ID,
            DEFAULT_TENANT_NAME,
            DEFAULT_PLAN_ID,
            default_tenant_due_date(),
        );
        self.store.insert_tenant(&tenant).await?;
        Ok(StepAction::Created)
    }

    async fn ensure_admin_user(&self) -> Result<StepAction> {
        match self.store.find_user_by_email(ADMIN_EMAIL).await? {
            None => {
                info!("🔍 [Self-Healing] Admin user missing. Creating...");
                let password_hash = self.hasher.hash(ADMIN_DEFAULT_PASSWORD)?;
                let user = AdministrativeUser::new_super(
                    ADMIN_NAME,
                    ADMIN_EMAIL,
                    password_hash,
                    DEFAULT_TENANT_ID,
                );
                self.store.insert_user(&user).await?;
                Ok(StepAction::Created)
            }
            Some(user) if user.company_id != Some(DEFAULT_TENANT_ID) => {
                warn!(
                    user_id = %user.id,
                    company_id = ?user.company_id,
                    "⚠️ [Self-Healing] Admin user orphaned. Linking to default company..."
                );
                self.store
                    .update_user_tenant(user.id, DEFAULT_TENANT_ID)
                    .await?;
                Ok(StepAction::Repaired)
            }
            // The password hash of an existing user is never reset here.
            Some(_) => Ok(StepAction::Unchanged),
        }
    }
}

fn settle(subject: &str, result: Result<StepAction>) -> StepAction {
    match result {
        Ok(action) => action,
        Err(e) => {
            error!(subject, error = %e, "❌ [Self-Healing] Step failed");
            StepAction::Failed(e.to_string())
        }
    }
}
