use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

use super::registry::{CheckOutcome, CheckStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub check: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub pass_count: usize,
    pub total_count: usize,
    pub skipped_count: usize,
    pub suggestions: Vec<Suggestion>,
}

impl Aggregate {
    pub fn all_passed(&self) -> bool {
        self.pass_count == self.total_count
    }
}

pub struct DiagnosticReporter;

impl DiagnosticReporter {
    /// Summarize results in the order they were produced.
    ///
    /// Each failed check contributes one suggestion: its remediation hint
    /// verbatim when it has one, otherwise its failure message. Skipped checks
    /// count towards the total but contribute no suggestion.
    pub fn aggregate(outcomes: &[CheckOutcome]) -> Aggregate {
        let suggestions = outcomes
            .iter()
            .filter(|o| o.status == CheckStatus::Failed)
            .map(|o| Suggestion {
                check: o.name.to_string(),
                text: o
                    .result
                    .suggestion()
                    .map(str::to_string)
                    .unwrap_or_else(|| o.result.message.clone()),
            })
            .collect();

        Aggregate {
            pass_count: outcomes.iter().filter(|o| o.passed()).count(),
            total_count: outcomes.len(),
            skipped_count: outcomes
                .iter()
                .filter(|o| o.status == CheckStatus::Skipped)
                .count(),
            suggestions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    suite: String,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    outcomes: Vec<CheckOutcome>,
    summary: Aggregate,
}

impl DiagnosticReport {
    pub fn new(
        suite: String,
        outcomes: Vec<CheckOutcome>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        let summary = DiagnosticReporter::aggregate(&outcomes);
        Self {
            suite,
            started_at,
            duration_ms,
            outcomes,
            summary,
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn summary(&self) -> &Aggregate {
        &self.summary
    }

    /// 0 when every check passed, 1 when any failed or was not attempted.
    pub fn exit_code(&self) -> u8 {
        if self.summary.all_passed() {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Numbered, human-readable report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n🔍 Diagnostic Report ({})", self.suite);
        let _ = writeln!(out, "==========================================");

        for (i, outcome) in self.outcomes.iter().enumerate() {
            let icon = match outcome.status {
                CheckStatus::Passed => "✅",
                CheckStatus::Failed => "❌",
                CheckStatus::Skipped => "⏭️",
            };
            let side_effect = if outcome.side_effect { " [side effect]" } else { "" };
            let _ = writeln!(
                out,
                "{}. {} {}{}: {}",
                i + 1,
                icon,
                outcome.title,
                side_effect,
                outcome.result.message
            );
            if let Some(details) = &outcome.result.details {
                let _ = writeln!(out, "   {}", details);
            }
        }

        let _ = writeln!(out, "\n📊 Summary:");
        let _ = writeln!(
            out,
            "  Passed: {}/{}",
            self.summary.pass_count, self.summary.total_count
        );
        if self.summary.skipped_count > 0 {
            let _ = writeln!(out, "  Not attempted: {}", self.summary.skipped_count);
        }

        if !self.summary.suggestions.is_empty() {
            let _ = writeln!(out, "\n🔧 Suggestions:");
            for (i, suggestion) in self.summary.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. [{}] {}", i + 1, suggestion.check, suggestion.text);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::check::{ProbeResult, Tier};

    fn outcome(name: &'static str, status: CheckStatus, result: ProbeResult) -> CheckOutcome {
        CheckOutcome {
            name,
            title: name,
            tier: Tier::Configuration,
            status,
            side_effect: false,
            result,
            duration_ms: 1,
        }
    }

    fn sample() -> Vec<CheckOutcome> {
        vec![
            outcome("environment", CheckStatus::Passed, ProbeResult::pass("All variables set")),
            outcome(
                "migration-ledger",
                CheckStatus::Failed,
                ProbeResult::fail("Migration ledger missing").with_suggestion("Run database migrations"),
            ),
            outcome("backend-health", CheckStatus::Failed, ProbeResult::fail("Backend unreachable")),
            outcome("default-admin", CheckStatus::Skipped, ProbeResult::fail("Not attempted")),
        ]
    }

    #[test]
    fn test_aggregate_counts_and_suggestions() {
        let aggregate = DiagnosticReporter::aggregate(&sample());
        assert_eq!(aggregate.pass_count, 1);
        assert_eq!(aggregate.total_count, 4);
        assert_eq!(aggregate.skipped_count, 1);
        assert_eq!(
            aggregate.suggestions,
            vec![
                Suggestion {
                    check: "migration-ledger".into(),
                    text: "Run database migrations".into()
                },
                Suggestion {
                    check: "backend-health".into(),
                    text: "Backend unreachable".into()
                },
            ]
        );
    }

    #[test]
    fn test_render_is_numbered_in_registration_order() {
        let report = DiagnosticReport::new("database".into(), sample(), Utc::now(), 5);
        let text = report.render_text();

        let env = text.find("1. ✅ environment").unwrap();
        let ledger = text.find("2. ❌ migration-ledger").unwrap();
        let admin = text.find("4. ⏭️ default-admin").unwrap();
        assert!(env < ledger && ledger < admin);
        assert!(text.contains("Passed: 1/4"));
        assert!(text.contains("[migration-ledger] Run database migrations"));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_zero_only_when_everything_passed() {
        let report = DiagnosticReport::new(
            "deploy".into(),
            vec![outcome("a", CheckStatus::Passed, ProbeResult::pass("ok"))],
            Utc::now(),
            1,
        );
        assert_eq!(report.exit_code(), 0);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["passCount"], 1);
    }
}
