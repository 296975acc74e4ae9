use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::ConfigSnapshot;
use crate::error::{AppError, Result};
use crate::infrastructure::database::{DataStore, StoreConnector};
use crate::infrastructure::password::PasswordHasher;

pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Dependency rank of a check. A check may only depend on lower tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Tier {
    Configuration = 0,
    Connectivity = 1,
    Schema = 2,
    Identity = 3,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", *self as u8)
    }
}

/// What the registry does with a check whose prerequisites did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortCircuitPolicy {
    /// Report the check as not attempted.
    Skip,
    /// Run it anyway; the result is annotated with the failed prerequisites.
    AttemptAnyway,
}

/// Raw `{success, message, details}` produced by a single check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub success: bool,
    pub message: String,
    pub details: Option<Value>,
}

impl ProbeResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
        }
    }

    /// Failure carrying the error text and its taxonomy kind.
    pub fn from_error(message: impl Into<String>, err: &AppError) -> Self {
        Self::fail(message).with_details(json!({
            "error": err.to_string(),
            "kind": err.kind(),
        }))
    }

    pub fn with_details(mut self, details: Value) -> Self {
        match (&mut self.details, details) {
            (Some(Value::Object(existing)), Value::Object(extra)) => existing.extend(extra),
            (slot, details) => *slot = Some(details),
        }
        self
    }

    /// Attach a remediation hint, surfaced verbatim by the reporter.
    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        self.with_details(json!({ "suggestion": suggestion.into() }))
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("suggestion"))
            .and_then(Value::as_str)
    }
}

/// Everything a check may read. Checks never mutate state through it.
pub struct ProbeContext {
    pub config: Arc<ConfigSnapshot>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub http: reqwest::Client,
    pub frontend_url: String,
    pub backend_url: String,
    pub timeout: Duration,
    connector: Arc<dyn StoreConnector>,
    store: OnceCell<Arc<dyn DataStore>>,
}

impl ProbeContext {
    pub fn new(
        config: Arc<ConfigSnapshot>,
        connector: Arc<dyn StoreConnector>,
        hasher: Arc<dyn PasswordHasher>,
        frontend_url: Option<String>,
        backend_url: Option<String>,
    ) -> Result<Self> {
        let timeout = config.probe_timeout;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            hasher,
            http,
            frontend_url: frontend_url.unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            backend_url: backend_url.unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            timeout,
            connector,
            store: OnceCell::new(),
        })
    }

    /// Connect (once) and return the store handle.
    pub async fn connect_store(&self) -> Result<Arc<dyn DataStore>> {
        self.store
            .get_or_try_init(|| self.connector.connect())
            .await
            .map(Arc::clone)
    }

    /// Store handle established by an earlier successful connection.
    pub fn store(&self) -> Result<Arc<dyn DataStore>> {
        self.store.get().map(Arc::clone).ok_or_else(|| {
            AppError::ConnectivityError("no data-store connection has been established".to_string())
        })
    }

    pub fn store_target(&self) -> String {
        self.connector.describe()
    }
}

#[async_trait]
pub trait DiagnosticCheck: Send + Sync {
    /// Stable identifier, also used to declare prerequisites.
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn tier(&self) -> Tier;

    fn prerequisites(&self) -> &'static [&'static str] {
        &[]
    }

    fn policy(&self) -> ShortCircuitPolicy {
        ShortCircuitPolicy::Skip
    }

    /// True when running the check changes state outside this process.
    fn has_side_effect(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult;
}
