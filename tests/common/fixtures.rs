use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tenant_boot::{
    bootstrap::SelfHealingBootstrapper,
    config::ConfigSnapshot,
    diagnostics::ProbeContext,
    infrastructure::{
        database::{ExistingStore, InMemoryDataStore},
        password::Argon2PasswordHasher,
    },
};

pub fn test_env() -> HashMap<String, String> {
    [
        ("DB_HOST", "localhost"),
        ("DB_PORT", "27017"),
        ("DB_NAME", "ticketing_test"),
        ("DB_USER", "app"),
        ("DB_PASS", "app-password"),
        ("JWT_SECRET", "test-jwt-secret"),
        ("JWT_REFRESH_SECRET", "test-jwt-refresh-secret"),
        ("FRONTEND_URL", "http://localhost:3000"),
        ("PASSWORD_HASH_COST", "1"),
        ("PASSWORD_HASH_MEMORY_KIB", "1024"),
        ("PROBE_TIMEOUT_SECS", "5"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Config from `test_env()` with keys overridden (`Some`) or removed (`None`).
pub fn test_config(overrides: &[(&str, Option<&str>)]) -> ConfigSnapshot {
    let mut env = test_env();
    for (key, value) in overrides {
        match value {
            Some(value) => env.insert(key.to_string(), value.to_string()),
            None => env.remove(*key),
        };
    }
    ConfigSnapshot::from_lookup(|key| env.get(key).cloned()).expect("test config should parse")
}

pub fn test_hasher() -> Arc<Argon2PasswordHasher> {
    Arc::new(Argon2PasswordHasher::new(&test_config(&[]).password_hash).expect("argon2 params"))
}

pub async fn seeded_store() -> Arc<InMemoryDataStore> {
    let store = Arc::new(InMemoryDataStore::new());
    store.record_migration("20200717133438-create-companies").await;
    store.record_migration("20200904070004-create-default-company").await;
    SelfHealingBootstrapper::new(store.clone(), test_hasher()).run().await;
    store
}

pub fn probe_context(
    config: ConfigSnapshot,
    store: Arc<InMemoryDataStore>,
    urls: Option<(String, String)>,
) -> ProbeContext {
    let (frontend, backend) = match urls {
        Some((frontend, backend)) => (Some(frontend), Some(backend)),
        None => (None, None),
    };
    ProbeContext::new(
        Arc::new(config),
        Arc::new(ExistingStore(store)),
        test_hasher(),
        frontend,
        backend,
    )
    .expect("probe context")
}

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(300);
