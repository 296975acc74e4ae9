//! Deploy checks against a running frontend and backend.

use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};
use std::io::ErrorKind;
use url::Url;

use crate::bootstrap::{ADMIN_DEFAULT_PASSWORD, ADMIN_EMAIL};
use crate::cors::{normalize_origin, origins_match};
use crate::diagnostics::check::{DiagnosticCheck, ProbeContext, ProbeResult, Tier};
use crate::error::AppError;

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Why an HTTP request never produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestFailure {
    ConnectionRefused,
    DnsError,
    Timeout,
    Unknown,
}

impl RequestFailure {
    fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return RequestFailure::Timeout;
        }
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                match io.kind() {
                    ErrorKind::ConnectionRefused => return RequestFailure::ConnectionRefused,
                    ErrorKind::TimedOut => return RequestFailure::Timeout,
                    _ => {}
                }
            }
            if cause.to_string().contains("dns error") {
                return RequestFailure::DnsError;
            }
            source = cause.source();
        }
        RequestFailure::Unknown
    }

    fn as_str(self) -> &'static str {
        match self {
            RequestFailure::ConnectionRefused => "CONNECTION_REFUSED",
            RequestFailure::DnsError => "DNS_ERROR",
            RequestFailure::Timeout => "TIMEOUT",
            RequestFailure::Unknown => "UNKNOWN_ERROR",
        }
    }

    fn suggestion(self, url: &str) -> String {
        match self {
            RequestFailure::ConnectionRefused => {
                format!("Nothing is listening at {}; start the server or fix the port", url)
            }
            RequestFailure::DnsError => {
                format!("The host in {} does not resolve; check the URL", url)
            }
            RequestFailure::Timeout => format!("{} is taking too long to respond", url),
            RequestFailure::Unknown => format!("Check that {} is the right address", url),
        }
    }
}

fn request_failed(what: &str, url: &str, err: reqwest::Error) -> ProbeResult {
    let failure = RequestFailure::classify(&err);
    let err = AppError::from(err);
    ProbeResult::from_error(format!("{} failed", what), &err)
        .with_details(json!({ "url": url, "errorType": failure.as_str() }))
        .with_suggestion(failure.suggestion(url))
}

fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{}' is not a valid URL: {}", raw, e))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(format!("'{}' must be an http(s) URL with a host", raw)),
    }
}

pub struct TargetUrlsCheck;

#[async_trait]
impl DiagnosticCheck for TargetUrlsCheck {
    fn name(&self) -> &'static str {
        "target-urls"
    }

    fn title(&self) -> &'static str {
        "Target URLs"
    }

    fn tier(&self) -> Tier {
        Tier::Configuration
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let errors: Vec<String> = [&ctx.frontend_url, &ctx.backend_url]
            .into_iter()
            .filter_map(|raw| parse_http_url(raw).err())
            .collect();

        let details = json!({ "frontend": ctx.frontend_url, "backend": ctx.backend_url });
        if errors.is_empty() {
            ProbeResult::pass("Frontend and backend URLs are valid").with_details(details)
        } else {
            ProbeResult::fail(errors.join("; "))
                .with_details(details)
                .with_suggestion("Pass absolute URLs, e.g. diagnose https://app.example.com https://api.example.com")
        }
    }
}

pub struct FrontendReachableCheck;

#[async_trait]
impl DiagnosticCheck for FrontendReachableCheck {
    fn name(&self) -> &'static str {
        "frontend-reachable"
    }

    fn title(&self) -> &'static str {
        "Frontend accessible"
    }

    fn tier(&self) -> Tier {
        Tier::Connectivity
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["target-urls"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let url = ctx.frontend_url.as_str();
        let response = match ctx.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return request_failed("Frontend request", url, e)
                    .with_suggestion("Check that the frontend is deployed and the URL is correct")
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default().to_lowercase();
        let is_html = body.contains("<html") || body.contains("<!doctype html");
        let details = json!({ "url": url, "status": status.as_u16(), "html": is_html });

        if status == StatusCode::OK && is_html {
            ProbeResult::pass("Frontend is serving HTML").with_details(details)
        } else if status != StatusCode::OK {
            ProbeResult::fail(format!("Frontend returned {}", status)).with_details(details)
        } else {
            ProbeResult::fail("Frontend did not return an HTML document").with_details(details)
        }
    }
}

pub struct BackendHealthCheck;

#[async_trait]
impl DiagnosticCheck for BackendHealthCheck {
    fn name(&self) -> &'static str {
        "backend-health"
    }

    fn title(&self) -> &'static str {
        "Backend health"
    }

    fn tier(&self) -> Tier {
        Tier::Connectivity
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["target-urls"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let url = endpoint(&ctx.backend_url, "/api/health");
        let response = match ctx.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return request_failed("Health request", &url, e)
                    .with_suggestion("Check that the backend is running and reachable from here")
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return ProbeResult::fail(format!("Health endpoint returned {}", status))
                .with_details(json!({ "url": url, "status": status.as_u16() }));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return ProbeResult::fail(format!("Health endpoint did not return JSON: {}", e))
                    .with_details(json!({ "url": url }))
            }
        };

        if body.get("status").and_then(Value::as_str) == Some("healthy") {
            let uptime = body.get("uptime").cloned().unwrap_or(Value::Null);
            ProbeResult::pass(format!("Backend is healthy (uptime {}s)", uptime))
                .with_details(json!({ "url": url, "uptime": uptime, "sessions": body.get("sessions") }))
        } else {
            ProbeResult::fail("Backend reported an unhealthy status").with_details(json!({ "url": url, "body": body }))
        }
    }
}

/// Invalid credentials must be rejected with 401.
pub struct LoginEndpointCheck;

#[async_trait]
impl DiagnosticCheck for LoginEndpointCheck {
    fn name(&self) -> &'static str {
        "login-endpoint"
    }

    fn title(&self) -> &'static str {
        "Login endpoint"
    }

    fn tier(&self) -> Tier {
        Tier::Schema
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["backend-health"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let url = endpoint(&ctx.backend_url, "/auth/login");
        let response = ctx
            .http
            .post(&url)
            .json(&json!({ "email": "diagnostics@invalid.test", "password": "not-a-password" }))
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => {
                ProbeResult::pass("Login endpoint rejects invalid credentials")
            }
            Ok(response) => ProbeResult::fail(format!(
                "Expected 401 for invalid credentials, got {}",
                response.status()
            ))
            .with_details(json!({ "url": url, "status": response.status().as_u16() })),
            Err(e) => request_failed("Login request", &url, e),
        }
    }
}

/// Preflight from the frontend origin must be allowed with credentials.
pub struct CorsPolicyCheck;

#[async_trait]
impl DiagnosticCheck for CorsPolicyCheck {
    fn name(&self) -> &'static str {
        "cors-policy"
    }

    fn title(&self) -> &'static str {
        "CORS configuration"
    }

    fn tier(&self) -> Tier {
        Tier::Schema
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["backend-health"]
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let url = endpoint(&ctx.backend_url, "/auth/login");
        let origin = normalize_origin(&ctx.frontend_url);

        let response = ctx
            .http
            .request(Method::OPTIONS, &url)
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) => return request_failed("Preflight request", &url, e),
        };

        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let allow_origin = header_value(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        let allow_credentials = header_value(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
        let details = json!({
            "origin": origin,
            "allowOrigin": allow_origin,
            "allowCredentials": allow_credentials,
            "configuredOrigins": ctx.config.allowed_origins(),
        });

        match allow_origin {
            Some(allowed) if origins_match(&allowed, origin) => {
                if allow_credentials.as_deref() == Some("true") {
                    ProbeResult::pass(format!("Origin {} is allowed with credentials", origin))
                        .with_details(details)
                } else {
                    ProbeResult::fail("Origin is allowed but credentials are not")
                        .with_details(details)
                        .with_suggestion("Enable credentials in the backend CORS configuration")
                }
            }
            Some(allowed) => {
                let e = AppError::PolicyError(format!("backend allows '{}', not '{}'", allowed, origin));
                ProbeResult::from_error("CORS allow-origin does not match the frontend", &e)
                    .with_details(details)
                    .with_suggestion(format!("Set FRONTEND_URL={} on the backend", origin))
            }
            None => {
                let e = AppError::PolicyError(format!("origin '{}' was not allowed", origin));
                ProbeResult::from_error("Preflight response has no Access-Control-Allow-Origin", &e)
                    .with_details(details)
                    .with_suggestion(format!("Set FRONTEND_URL={} on the backend", origin))
            }
        }
    }
}

/// Real login with the default credentials. Counts against any login rate
/// limit on the target.
pub struct LoginRoundtripCheck;

#[async_trait]
impl DiagnosticCheck for LoginRoundtripCheck {
    fn name(&self) -> &'static str {
        "login-roundtrip"
    }

    fn title(&self) -> &'static str {
        "Default login"
    }

    fn tier(&self) -> Tier {
        Tier::Identity
    }

    fn prerequisites(&self) -> &'static [&'static str] {
        &["login-endpoint"]
    }

    fn has_side_effect(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &ProbeContext) -> ProbeResult {
        let url = endpoint(&ctx.backend_url, "/auth/login");
        let response = ctx
            .http
            .post(&url)
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_DEFAULT_PASSWORD }))
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) => return request_failed("Login request", &url, e),
        };

        let status = response.status();
        if status != StatusCode::OK {
            let e = AppError::CredentialError(format!("login returned {}", status));
            return ProbeResult::from_error(format!("Default login failed with {}", status), &e)
                .with_details(json!({ "url": url, "status": status.as_u16() }))
                .with_suggestion("Run the database diagnostics to check the default admin and its password");
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let has_token = body.get("token").and_then(Value::as_str).is_some_and(|t| !t.is_empty());
        let user = body.get("user").cloned().unwrap_or(Value::Null);

        if has_token {
            ProbeResult::pass("Default login succeeded").with_details(json!({
                "user": {
                    "id": user.get("id"),
                    "profile": user.get("profile"),
                    "companyId": user.get("companyId"),
                }
            }))
        } else {
            ProbeResult::fail("Login succeeded but no token was returned").with_details(json!({ "body": body }))
        }
    }
}
