//! Per-frontend request dispatch.
//!
//! # Responsibilities
//! - Redirect non-canonical paths (`.`/`..` segments, `//`) to their cleaned form
//! - Serve ACME HTTP-01 challenge files ahead of everything else
//! - Redirect plain HTTP to HTTPS on redirecting frontends
//! - Otherwise resolve the host and hand the request to the matching rule
//!
//! # Design Decisions
//! - Built once per frontend and shared by all of its listeners
//! - Paths are cleaned before ACME lookup, rule matching or auth
//! - Malformed or missing host → 400, no rule → 404

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::uri::Authority;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::routing::RuleTable;

/// Path prefix reserved for ACME HTTP-01 challenges.
pub const ACME_CHALLENGE_PREFIX: &str = "/.well-known/acme-challenge/";

/// What a frontend does with requests outside the ACME prefix.
#[derive(Debug)]
pub enum DispatchMode {
    /// Answer with `301` to the same host and path under `https`.
    RedirectToHttps,
    /// Forward through the first matching rule.
    Rules(RuleTable),
}

/// Immutable dispatch state of one frontend.
#[derive(Debug)]
pub struct Dispatch {
    acme: Option<ServeDir>,
    mode: DispatchMode,
}

impl Dispatch {
    pub fn new(acme: Option<ServeDir>, mode: DispatchMode) -> Self {
        Self { acme, mode }
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        let path = request.uri().path();
        if !path.starts_with('/') {
            return (StatusCode::BAD_REQUEST, "400 Bad Request").into_response();
        }
        let cleaned = clean_path(path);
        if cleaned != path {
            tracing::debug!(path = %path, cleaned = %cleaned, "Redirecting to cleaned path");
            return redirect_to_clean_path(&request, &cleaned);
        }

        if let Some(acme) = &self.acme {
            if request.uri().path().starts_with(ACME_CHALLENGE_PREFIX) {
                return serve_acme(acme, request).await;
            }
        }

        match &self.mode {
            DispatchMode::RedirectToHttps => redirect_to_https(&request),
            DispatchMode::Rules(rules) => {
                let Some(host) = request_host(&request) else {
                    tracing::warn!(uri = %request.uri(), "Missing or malformed Host header");
                    return (StatusCode::BAD_REQUEST, "400 Bad Request").into_response();
                };
                let path = request.uri().path().to_string();

                match rules.match_route(&host, &path) {
                    Some(rule) => {
                        tracing::debug!(
                            rule = rule.name(),
                            backend = %rule.target(),
                            host = %host,
                            path = %path,
                            "Rule matched"
                        );
                        rule.handle(request).await
                    }
                    None => {
                        tracing::warn!(host = %host, path = %path, "No rule matched");
                        (StatusCode::NOT_FOUND, "404 page not found").into_response()
                    }
                }
            }
        }
    }
}

/// Axum fallback handler wrapping [`Dispatch::handle`].
pub async fn dispatch_handler(State(dispatch): State<Arc<Dispatch>>, request: Request<Body>) -> Response {
    dispatch.handle(request).await
}

/// Hostname of the request with any port stripped.
///
/// Taken from the `Host` header, or from the URI authority when the header is
/// absent (HTTP/2). `None` when neither yields a valid authority.
pub fn request_host(request: &Request<Body>) -> Option<String> {
    let authority = match request.headers().get(header::HOST) {
        Some(value) => Authority::from_str(value.to_str().ok()?).ok()?,
        None => request.uri().authority()?.clone(),
    };
    if authority.as_str().contains('@') {
        return None;
    }
    let host = authority.host();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    Some(host.to_string())
}

/// Canonical form of an absolute request path.
///
/// Drops empty and `.` segments, resolves `..` against the previous segment
/// (never above the root) and keeps a trailing slash. Percent-encoded dots
/// (`%2e`) count as dots.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        if segment.is_empty() || is_dot(segment) {
            continue;
        }
        if is_dot_dot(segment) {
            segments.pop();
        } else {
            segments.push(segment);
        }
    }

    let mut cleaned = String::with_capacity(path.len());
    cleaned.push('/');
    cleaned.push_str(&segments.join("/"));
    if path.ends_with('/') && !segments.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

fn is_dot(segment: &str) -> bool {
    segment == "." || segment.eq_ignore_ascii_case("%2e")
}

fn is_dot_dot(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        ".." | ".%2e" | "%2e." | "%2e%2e"
    )
}

fn redirect_to_clean_path(request: &Request<Body>, cleaned: &str) -> Response {
    let location = match request.uri().query() {
        Some(query) => format!("{}?{}", cleaned, query),
        None => cleaned.to_string(),
    };
    match HeaderValue::from_str(&location) {
        Ok(location) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "400 Bad Request").into_response(),
    }
}

async fn serve_acme(acme: &ServeDir, request: Request<Body>) -> Response {
    match acme.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

fn redirect_to_https(request: &Request<Body>) -> Response {
    let Some(host) = request_host(request) else {
        return (StatusCode::BAD_REQUEST, "400 Bad Request").into_response();
    };
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match HeaderValue::from_str(&format!("https://{}{}", host, path)) {
        Ok(location) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "400 Bad Request").into_response(),
    }
}
