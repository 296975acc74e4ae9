//! Per-tenant communication sessions.
//!
//! The transport itself is an external collaborator behind
//! [`SessionTransport`]; this module owns only the startup barrier.

pub mod orchestrator;
pub mod transport;

pub use orchestrator::{SessionOrchestrator, SessionOutcome, SessionTask, SessionsSettled};
pub use transport::{SessionRegistry, SessionTransport};
