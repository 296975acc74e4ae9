pub mod auth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::cors::OriginPolicy;
use crate::AppState;

pub use auth::login_handler;
pub use health::health_handler;

pub fn create_router(state: AppState) -> Router {
    let cors = OriginPolicy::new(state.config.allowed_origins()).into_layer();

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/auth/login", post(login_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
