use async_trait::async_trait;
use serde_json::json;

use crate::diagnostics::check::{DiagnosticCheck, ProbeContext, ProbeResult, Tier};

/// Required configuration presence.
pub struct EnvironmentCheck;

#[async_trait]
impl DiagnosticCheck for EnvironmentCheck {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn title(&self) -> &'static str {
        "Environment variables"
    }

    fn tier(&self) -> Tier {
        Tier::Configuration
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let missing = ctx.config.missing_required();
        let present = ctx.config.present_required();

        if missing.is_empty() {
            return ProbeResult::pass(format!("All {} required variables are set", present.len()))
                .with_details(json!({ "present": present }));
        }

        ProbeResult::fail(format!("Missing variables: {}", missing.join(", ")))
            .with_details(json!({ "missing": missing, "present": present }))
            .with_suggestion("Check your .env file")
    }
}
