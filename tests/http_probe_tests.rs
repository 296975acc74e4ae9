mod common;

use axum::{response::Html, routing::get, Router};
use common::*;
use std::sync::Arc;
use std::time::Instant;
use tenant_boot::{
    config::ConfigSnapshot,
    diagnostics::{build_suite, CheckStatus, DiagnosticReport, Suite},
    infrastructure::database::InMemoryDataStore,
    presentation::create_router,
    sessions::SessionRegistry,
    AppState,
};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_frontend() -> String {
    serve(Router::new().route(
        "/",
        get(|| async { Html("<!DOCTYPE html><html><body><div id=\"root\"></div></body></html>") }),
    ))
    .await
}

async fn spawn_backend(config: ConfigSnapshot, store: Arc<InMemoryDataStore>) -> String {
    let state = AppState {
        config: Arc::new(config),
        store,
        hasher: test_hasher(),
        sessions: Arc::new(SessionRegistry::new()),
        started_at: Instant::now(),
    };
    serve(create_router(state)).await
}

async fn run_deploy(configured_origin: Option<&str>, store: Arc<InMemoryDataStore>) -> DiagnosticReport {
    let frontend = spawn_frontend().await;
    let origin = configured_origin.map(str::to_string).unwrap_or_else(|| format!("{}/", frontend));
    let config = test_config(&[("FRONTEND_URL", Some(origin.as_str()))]);
    let backend = spawn_backend(config.clone(), store.clone()).await;

    let ctx = probe_context(config, store, Some((frontend, backend)));
    build_suite(Suite::Deploy).unwrap().run(&ctx).await
}

#[tokio::test]
async fn test_deploy_suite_passes_against_live_server() {
    let report = run_deploy(None, seeded_store().await).await;

    assert!(report.outcomes().iter().all(|o| o.passed()), "{}", report.render_text());
    assert_eq!(report.summary().pass_count, 6);
    assert_eq!(report.exit_code(), 0);

    let health = report.outcome("backend-health").unwrap();
    assert!(health.result.details.as_ref().unwrap()["uptime"].is_u64());
    let roundtrip = report.outcome("login-roundtrip").unwrap();
    assert!(roundtrip.side_effect);
    assert_eq!(roundtrip.result.details.as_ref().unwrap()["user"]["profile"], "admin");
}

#[tokio::test]
async fn test_mismatched_origin_fails_cors_check() {
    let report = run_deploy(Some("https://somewhere-else.example.com"), seeded_store().await).await;

    let cors = report.outcome("cors-policy").unwrap();
    assert_eq!(cors.status, CheckStatus::Failed);
    assert_eq!(cors.result.details.as_ref().unwrap()["kind"], "policy");
    assert!(cors.result.suggestion().unwrap().starts_with("Set FRONTEND_URL="));
    assert_eq!(report.outcome("login-roundtrip").unwrap().status, CheckStatus::Passed);
}

#[tokio::test]
async fn test_roundtrip_fails_without_admin() {
    let report = run_deploy(None, Arc::new(InMemoryDataStore::new())).await;

    assert_eq!(report.outcome("login-endpoint").unwrap().status, CheckStatus::Passed);
    let roundtrip = report.outcome("login-roundtrip").unwrap();
    assert_eq!(roundtrip.status, CheckStatus::Failed);
    assert_eq!(roundtrip.result.details.as_ref().unwrap()["status"], 401);
    assert!(report
        .summary()
        .suggestions
        .iter()
        .any(|s| s.check == "login-roundtrip"));
}
