mod common;

use common::*;
use std::sync::Arc;
use tenant_boot::{
    bootstrap::{SelfHealingBootstrapper, StepAction, ADMIN_DEFAULT_PASSWORD, ADMIN_EMAIL},
    domain::AdministrativeUser,
    infrastructure::{
        database::{DataStore, InMemoryDataStore},
        password::PasswordHasher,
    },
};

#[tokio::test]
async fn test_empty_store_gets_baseline_records() {
    let store = Arc::new(InMemoryDataStore::new());
    let hasher = test_hasher();

    let outcome = SelfHealingBootstrapper::new(store.clone(), hasher.clone()).run().await;

    assert!(!outcome.is_degraded());
    assert_eq!(outcome.count(&StepAction::Created), 5);

    let plans = store.plans().await;
    assert_eq!(plans.len(), 3);
    let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Plano Individual", "Plano Plus", "Plano Pro"]);

    let tenants = store.list_tenants().await.unwrap();
    assert_eq!(tenants.len(), 1);
    assert_eq!(tenants[0].id, 1);
    assert_eq!(tenants[0].name, "Empresa Admin");
    assert_eq!(tenants[0].plan_id, 1);

    let users = store.users().await;
    assert_eq!(users.len(), 1);
    let admin = store.find_user_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
    assert_eq!(admin.company_id, Some(1));
    assert!(admin.is_super);
    assert_eq!(admin.profile, "admin");
    assert!(hasher.verify(ADMIN_DEFAULT_PASSWORD, &admin.password_hash).unwrap());
}

#[tokio::test]
async fn test_second_run_writes_nothing() {
    let store = Arc::new(InMemoryDataStore::new());
    let bootstrapper = SelfHealingBootstrapper::new(store.clone(), test_hasher());

    bootstrapper.run().await;
    let writes = store.write_count();
    let admin_before = store.users().await;

    let outcome = bootstrapper.run().await;

    assert_eq!(store.write_count(), writes);
    assert_eq!(outcome.count(&StepAction::Unchanged), 5);
    assert_eq!(store.plans().await.len(), 3);
    assert_eq!(store.list_tenants().await.unwrap().len(), 1);
    assert_eq!(store.users().await, admin_before);
}

#[tokio::test]
async fn test_orphaned_admin_is_relinked_only() {
    let store = Arc::new(InMemoryDataStore::new());
    let mut orphan = AdministrativeUser::new_super("Operator", ADMIN_EMAIL, "$argon2id$operator-set".into(), 42);
    orphan.profile = "admin".into();
    store.put_user(orphan.clone()).await;

    let outcome = SelfHealingBootstrapper::new(store.clone(), test_hasher()).run().await;

    assert_eq!(outcome.action_for("user:admin"), Some(&StepAction::Repaired));
    let users = store.users().await;
    assert_eq!(users.len(), 1);
    let repaired = &users[0];
    assert_eq!(repaired.company_id, Some(1));
    assert_eq!(repaired.name, orphan.name);
    assert_eq!(repaired.email, orphan.email);
    assert_eq!(repaired.password_hash, orphan.password_hash);
    assert_eq!(repaired.id, orphan.id);
}
