#![allow(dead_code)]

// Shared fixtures for the integration tests
pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
