//! Cross-origin policy: exact origin matching after trailing-slash
//! normalization. No wildcards, no suffix or partial matches.

use axum::http::{header, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::error::{AppError, Result};

/// Strip a single trailing slash.
pub fn normalize_origin(origin: &str) -> &str {
    origin.strip_suffix('/').unwrap_or(origin)
}

pub fn origins_match(request_origin: &str, configured_origin: &str) -> bool {
    normalize_origin(request_origin) == normalize_origin(configured_origin)
}

#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|o| normalize_origin(o.as_ref()).to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Accept the origin or return an explicit, logged denial.
    ///
    /// Configured origins are stored already normalized, so only the request
    /// origin loses its trailing slash here.
    pub fn evaluate(&self, origin: &str) -> Result<()> {
        let origin_normalized = normalize_origin(origin);
        if self.allowed.iter().any(|allowed| allowed == origin_normalized) {
            return Ok(());
        }
        warn!(origin, allowed = ?self.allowed, "🚫 [CORS] Blocking request from origin");
        Err(AppError::PolicyError(format!(
            "origin '{}' is not allowed",
            origin
        )))
    }

    pub fn into_layer(self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
                match origin.to_str() {
                    Ok(origin) => self.evaluate(origin).is_ok(),
                    Err(_) => false,
                }
            }))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}
