//! tenant-boot - startup orchestration and diagnostics for a multi-tenant
//! messaging backend.
//!
//! The server binary seeds baseline records, starts one transport session per
//! tenant behind an all-settle barrier and only then activates the background
//! queue. The `diagnose` binary runs tiered checks against the same store and
//! HTTP surface.

use std::sync::Arc;
use std::time::Instant;

pub mod bootstrap;
pub mod config;
pub mod cors;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod presentation;
pub mod queue;
pub mod sessions;
pub mod startup;
pub mod token;

pub use error::{AppError, Result};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::ConfigSnapshot>,
    pub store: Arc<dyn infrastructure::database::DataStore>,
    pub hasher: Arc<dyn infrastructure::password::PasswordHasher>,
    pub sessions: Arc<sessions::SessionRegistry>,
    pub started_at: Instant,
}
