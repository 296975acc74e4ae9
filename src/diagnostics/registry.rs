//! Ordered check registry with declared prerequisites and explicit
//! short-circuit handling.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::check::{DiagnosticCheck, ProbeContext, ProbeResult, ShortCircuitPolicy, Tier};
use super::reporter::DiagnosticReport;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Not attempted because a prerequisite did not pass.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub title: &'static str,
    pub tier: Tier,
    pub status: CheckStatus,
    pub side_effect: bool,
    pub result: ProbeResult,
    pub duration_ms: u64,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

pub struct CheckRegistry {
    name: String,
    checks: Vec<Box<dyn DiagnosticCheck>>,
}

impl CheckRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Add a check. Its prerequisites must already be registered and sit in
    /// a strictly lower tier, so registration order is also a valid run order.
    pub fn register<C>(&mut self, check: C) -> Result<&mut Self>
    where
        C: DiagnosticCheck + 'static,
    {
        if self.checks.iter().any(|c| c.name() == check.name()) {
            return Err(AppError::ValidationError(format!(
                "check '{}' is already registered",
                check.name()
            )));
        }

        for prerequisite in check.prerequisites() {
            let registered = self
                .checks
                .iter()
                .find(|c| c.name() == *prerequisite)
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "check '{}' depends on unregistered check '{}'",
                        check.name(),
                        prerequisite
                    ))
                })?;

            if registered.tier() >= check.tier() {
                return Err(AppError::ValidationError(format!(
                    "check '{}' ({}) cannot depend on '{}' ({})",
                    check.name(),
                    check.tier(),
                    prerequisite,
                    registered.tier()
                )));
            }
        }

        self.checks.push(Box::new(check));
        Ok(self)
    }

    /// Run every check in registration order. Never fails: each check's
    /// error, timeout or skip becomes a result in the report.
    pub async fn run(&self, ctx: &ProbeContext) -> DiagnosticReport {
        info!(suite = %self.name, checks = self.checks.len(), "🔍 Running diagnostics");
        let started_at = Utc::now();
        let started = Instant::now();

        let mut statuses: HashMap<&'static str, CheckStatus> = HashMap::new();
        let mut outcomes = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let blocked: Vec<&'static str> = check
                .prerequisites()
                .iter()
                .copied()
                .filter(|p| statuses.get(p) != Some(&CheckStatus::Passed))
                .collect();

            let outcome = if !blocked.is_empty() && check.policy() == ShortCircuitPolicy::Skip {
                debug!(check = check.name(), blocked_by = ?blocked, "⏭️ Check not attempted");
                skipped(check.as_ref(), &blocked)
            } else {
                let mut outcome = execute(check.as_ref(), ctx).await;
                if !blocked.is_empty() {
                    outcome.result = outcome
                        .result
                        .with_details(json!({ "failedPrerequisites": blocked }));
                }
                outcome
            };

            match outcome.status {
                CheckStatus::Passed => info!(
                    check = outcome.name,
                    duration_ms = outcome.duration_ms,
                    "✅ {}",
                    outcome.result.message
                ),
                CheckStatus::Failed => warn!(
                    check = outcome.name,
                    duration_ms = outcome.duration_ms,
                    "❌ {}",
                    outcome.result.message
                ),
                CheckStatus::Skipped => {}
            }

            statuses.insert(outcome.name, outcome.status);
            outcomes.push(outcome);
        }

        DiagnosticReport::new(
            self.name.clone(),
            outcomes,
            started_at,
            started.elapsed().as_millis() as u64,
        )
    }
}

fn skipped(check: &dyn DiagnosticCheck, blocked: &[&'static str]) -> CheckOutcome {
    CheckOutcome {
        name: check.name(),
        title: check.title(),
        tier: check.tier(),
        status: CheckStatus::Skipped,
        side_effect: check.has_side_effect(),
        result: ProbeResult::fail(format!(
            "Not attempted: prerequisite {} did not pass",
            blocked.join(", ")
        ))
        .with_details(json!({ "failedPrerequisites": blocked })),
        duration_ms: 0,
    }
}

async fn execute(check: &dyn DiagnosticCheck, ctx: &ProbeContext) -> CheckOutcome {
    let started = Instant::now();
    let result = match timeout(ctx.timeout, check.run(ctx)).await {
        Ok(result) => result,
        Err(_) => ProbeResult::fail(format!(
            "{} timed out after {}s",
            check.title(),
            ctx.timeout.as_secs()
        ))
        .with_details(json!({ "kind": "connectivity" })),
    };

    CheckOutcome {
        name: check.name(),
        title: check.title(),
        tier: check.tier(),
        status: if result.success {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        },
        side_effect: check.has_side_effect(),
        result,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}
