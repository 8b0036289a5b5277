//! HTTP Basic Authentication gate.
//!
//! # Responsibilities
//! - Parse credential files (`username:hash`, one line)
//! - Extract Basic credentials from the `Authorization` header (RFC 7617)
//! - Answer 401 with a `WWW-Authenticate` challenge on any mismatch
//!
//! # Design Decisions
//! - Implemented as a tower `Layer`, wrapping the route's forwarder at build time
//! - Credentials are read once; rotating a password requires a restart
//! - Password verification runs on the blocking pool

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::error::{GatewayError, Result};
use crate::security::password::verify_password;

/// A username and its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
}

impl Credential {
    /// Parse credential file content: exactly one `username:hash` line.
    pub fn parse(content: &str) -> std::result::Result<Self, &'static str> {
        let line = content.strip_suffix('\n').unwrap_or(content);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let fields: Vec<&str> = line.split(':').collect();
        let [username, password_hash] = fields.as_slice() else {
            return Err("expected a single `username:hash` line");
        };
        if username.is_empty() || password_hash.is_empty() {
            return Err("username and hash must not be empty");
        }

        Ok(Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    /// Read and parse a credential file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let credential_error = |reason: String| GatewayError::Credential {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| credential_error(e.to_string()))?;
        Self::parse(&content).map_err(|reason| credential_error(reason.to_string()))
    }
}

/// Layer that puts Basic Authentication in front of a service.
#[derive(Debug, Clone)]
pub struct BasicAuthLayer {
    credential: Arc<Credential>,
    challenge: HeaderValue,
}

impl BasicAuthLayer {
    pub fn new(realm: &str, credential: Credential) -> Result<Self> {
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
            .map_err(|_| GatewayError::InvalidRealm(realm.to_string()))?;
        Ok(Self {
            credential: Arc::new(credential),
            challenge,
        })
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuth {
            inner,
            credential: self.credential.clone(),
            challenge: self.challenge.clone(),
        }
    }
}

/// Service produced by [`BasicAuthLayer`].
#[derive(Debug, Clone)]
pub struct BasicAuth<S> {
    inner: S,
    credential: Arc<Credential>,
    challenge: HeaderValue,
}

impl<S> Service<Request<Body>> for BasicAuth<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, std::result::Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Infallible>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The ready service is the one that must handle the call.
        let ready = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, ready);
        let credential = self.credential.clone();
        let challenge = self.challenge.clone();

        Box::pin(async move {
            if authorize(&credential, req.headers()).await {
                inner.call(req).await
            } else {
                tracing::warn!(path = %req.uri().path(), "Basic authentication failed");
                Ok(unauthorized(challenge))
            }
        })
    }
}

/// Extract `(username, password)` from a Basic `Authorization` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

async fn authorize(credential: &Arc<Credential>, headers: &HeaderMap) -> bool {
    let Some((username, password)) = basic_credentials(headers) else {
        return false;
    };
    if username != credential.username {
        return false;
    }

    let credential = credential.clone();
    tokio::task::spawn_blocking(move || verify_password(&password, &credential.password_hash))
        .await
        .unwrap_or(false)
}

fn unauthorized(challenge: HeaderValue) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        "401 Unauthorized",
    )
        .into_response()
}
