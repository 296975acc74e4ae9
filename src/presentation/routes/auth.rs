use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    domain::LoginUserSchema,
    error::{AppError, Result},
    token::{generate_jwt_token, parse_expiry},
    AppState,
};

pub const REFRESH_COOKIE: &str = "jrt";

fn invalid_credentials() -> AppError {
    AppError::AuthError("Invalid email or password".to_string())
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginUserSchema>,
) -> Result<impl IntoResponse> {
    let email = body.email.trim().to_lowercase();
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let hasher = Arc::clone(&state.hasher);
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&body.password, &stored_hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password verification aborted: {}", e)))?;

    match verified {
        Ok(true) => {}
        Ok(false) => {
            info!(email = %email, "🔒 Login rejected");
            return Err(invalid_credentials());
        }
        Err(e) => {
            warn!(email = %email, error = %e, "⚠️ Stored password hash could not be verified");
            return Err(invalid_credentials());
        }
    }

    let jwt = &state.config.jwt;
    let token = generate_jwt_token(&user, &jwt.secret, &jwt.expires_in)?;
    let refresh_token = generate_jwt_token(&user, &jwt.refresh_secret, &jwt.refresh_expires_in)?;
    let refresh_max_age = parse_expiry(&jwt.refresh_expires_in)?.num_seconds();

    let cookie = Cookie::build((REFRESH_COOKIE, refresh_token))
        .path("/")
        .max_age(time::Duration::seconds(refresh_max_age))
        .same_site(SameSite::Lax)
        .http_only(true);

    info!(user_id = %user.id, company_id = ?user.company_id, "🔑 Login succeeded");

    Ok((
        jar.add(cookie),
        Json(json!({
            "token": token,
            "user": user.filter_user()
        })),
    ))
}
