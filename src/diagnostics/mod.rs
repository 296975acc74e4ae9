//! Tiered diagnostic checks, their registry and the report they produce.

pub mod check;
pub mod checks;
pub mod registry;
pub mod reporter;
pub mod suites;

pub use check::{DiagnosticCheck, ProbeContext, ProbeResult, ShortCircuitPolicy, Tier};
pub use registry::{CheckOutcome, CheckRegistry, CheckStatus};
pub use reporter::{Aggregate, DiagnosticReport, DiagnosticReporter, Suggestion};
pub use suites::{build_suite, Suite};
