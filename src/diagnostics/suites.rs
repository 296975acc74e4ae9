use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

use super::checks::*;
use super::registry::CheckRegistry;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// Environment, connection, schema, migrations, default admin and password.
    Database,
    /// Frontend, health, login endpoint, CORS and a real login.
    Deploy,
    /// Both, database first.
    All,
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suite::Database => write!(f, "database"),
            Suite::Deploy => write!(f, "deploy"),
            Suite::All => write!(f, "all"),
        }
    }
}

fn register_database(registry: &mut CheckRegistry) -> Result<()> {
    registry
        .register(EnvironmentCheck)?
        .register(DatabaseConnectionCheck)?
        .register(SchemaCheck)?
        .register(MigrationLedgerCheck)?
        .register(DefaultAdminCheck)?
        .register(DefaultPasswordCheck)?;
    Ok(())
}

fn register_deploy(registry: &mut CheckRegistry) -> Result<()> {
    registry
        .register(TargetUrlsCheck)?
        .register(FrontendReachableCheck)?
        .register(BackendHealthCheck)?
        .register(LoginEndpointCheck)?
        .register(CorsPolicyCheck)?
        .register(LoginRoundtripCheck)?;
    Ok(())
}

pub fn build_suite(suite: Suite) -> Result<CheckRegistry> {
    let mut registry = CheckRegistry::new(suite.to_string());
    match suite {
        Suite::Database => register_database(&mut registry)?,
        Suite::Deploy => register_deploy(&mut registry)?,
        Suite::All => {
            register_database(&mut registry)?;
            register_deploy(&mut registry)?;
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suites_register_in_order() {
        assert_eq!(
            build_suite(Suite::Database).unwrap().names(),
            vec![
                "environment",
                "database-connection",
                "database-schema",
                "migration-ledger",
                "default-admin",
                "default-password"
            ]
        );
        assert_eq!(build_suite(Suite::Deploy).unwrap().len(), 6);
        assert_eq!(build_suite(Suite::All).unwrap().len(), 12);
    }
}
