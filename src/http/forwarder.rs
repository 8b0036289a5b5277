//! Request forwarding to a rule's backend.
//!
//! # Responsibilities
//! - Rewrite the request URI to the backend, keeping path and query
//! - Strip hop-by-hop headers, replace X-Forwarded-For/Host/Proto
//! - Rewrite absolute 3xx `Location` headers that point back at the backend
//! - Map backend connection failures to 502
//!
//! # Design Decisions
//! - One forwarder per rule; all of them share the frontend's pooled client
//! - Response bodies are streamed, never buffered
//! - Redirects to any other host are left untouched

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use axum::http::{Request, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tower::Service;
use url::Url;

use crate::error::{GatewayError, Result};

/// HTTP client type for forwarding requests.
pub type HttpClient = Client<HttpConnector, Body>;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const FORWARDED: HeaderName = HeaderName::from_static("forwarded");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    KEEP_ALIVE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Create the pooled client shared by all forwarders of a frontend.
pub fn http_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Reverse-proxy unit bound to one backend target.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    authority: Authority,
    backend_host: String,
    from_host: Option<String>,
    force_https: bool,
    forwarded_proto: &'static str,
}

impl Forwarder {
    /// `from_host` replaces the backend host in rewritten redirects; when
    /// `None` the inbound `Host` header is used instead.
    pub fn new(
        client: HttpClient,
        target: &Url,
        from_host: Option<String>,
        force_https: bool,
        tls: bool,
    ) -> Result<Self> {
        let invalid = || GatewayError::InvalidTarget(target.to_string());
        let backend_host = target.host_str().ok_or_else(invalid)?.to_string();
        let port = target.port_or_known_default().ok_or_else(invalid)?;
        let authority =
            Authority::from_str(&format!("{}:{}", backend_host, port)).map_err(|_| invalid())?;

        Ok(Self {
            client,
            authority,
            backend_host,
            from_host,
            force_https,
            forwarded_proto: if tls { "https" } else { "http" },
        })
    }

    /// Forward `request` to the backend and fix up the response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let inbound_host = request.headers().get(header::HOST).cloned();

        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        parts.uri = match Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
        {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build backend URI");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
            }
        };
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        set_forwarded_headers(
            &mut parts.headers,
            client_ip.map(|ip| ip.to_string()),
            inbound_host.as_ref(),
            self.forwarded_proto,
        );
        if let Ok(host) = HeaderValue::from_str(self.authority.as_str()) {
            parts.headers.insert(header::HOST, host);
        }

        tracing::debug!(backend = %self.authority, uri = %parts.uri, "Forwarding request");

        let response = match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(backend = %self.authority, error = %e, "Backend error");
                return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        if parts.status.is_redirection() {
            let public_host = self
                .from_host
                .clone()
                .or_else(|| inbound_host.and_then(|h| h.to_str().ok().map(String::from)));
            self.rewrite_redirect(&mut parts.headers, public_host.as_deref());
        }

        Response::from_parts(parts, Body::new(body))
    }

    fn rewrite_redirect(&self, headers: &mut HeaderMap, public_host: Option<&str>) {
        let Some(public_host) = public_host else {
            return;
        };
        let Some(location) = headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) else {
            return;
        };
        let Some(rewritten) =
            rewrite_location(location, &self.backend_host, public_host, self.force_https)
        else {
            return;
        };

        tracing::debug!(from = %location, to = %rewritten, "Rewriting redirect location");
        if let Ok(value) = HeaderValue::from_str(&rewritten) {
            headers.insert(header::LOCATION, value);
        }
    }
}

impl Service<Request<Body>> for Forwarder {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, std::result::Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.forward(request).await) })
    }
}

/// Rewrite a redirect `location` pointing at `backend_host` so it points at
/// `public_host` instead, upgrading `http` to `https` when `force_https` is set.
///
/// Returns `None` when the location must be left untouched: unparseable,
/// relative, or aimed at a different host.
pub fn rewrite_location(
    location: &str,
    backend_host: &str,
    public_host: &str,
    force_https: bool,
) -> Option<String> {
    let mut url = Url::parse(location).ok()?;
    if url.host_str() != Some(backend_host) {
        return None;
    }

    let public = Authority::from_str(public_host).ok()?;
    url.set_host(Some(public.host())).ok()?;
    url.set_port(public.port_u16()).ok()?;

    if force_https && url.scheme() == "http" {
        url.set_scheme("https").ok()?;
    }

    Some(url.to_string())
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named by `Connection` are hop-by-hop as well.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_str(name.trim()).ok())
        .collect();
    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn set_forwarded_headers(
    headers: &mut HeaderMap,
    client_ip: Option<String>,
    inbound_host: Option<&HeaderValue>,
    proto: &'static str,
) {
    // Client-supplied forwarding headers are never trusted.
    headers.remove(&X_FORWARDED_FOR);
    headers.remove(&X_FORWARDED_HOST);
    headers.remove(&X_FORWARDED_PROTO);
    headers.remove(&FORWARDED);

    if let Some(value) = client_ip.and_then(|ip| HeaderValue::from_str(&ip).ok()) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    if let Some(host) = inbound_host {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(proto));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_backend_redirect_with_https() {
        let rewritten = rewrite_location(
            "http://backend.internal/x",
            "backend.internal",
            "public.example",
            true,
        );
        assert_eq!(rewritten.as_deref(), Some("https://public.example/x"));
    }

    #[test]
    fn test_rewrite_keeps_scheme_without_force() {
        let rewritten = rewrite_location(
            "http://backend.internal:8080/login?next=%2F",
            "backend.internal",
            "public.example",
            false,
        );
        assert_eq!(rewritten.as_deref(), Some("http://public.example/login?next=%2F"));
    }

    #[test]
    fn test_rewrite_uses_public_port() {
        let rewritten = rewrite_location(
            "http://127.0.0.1:8080/x",
            "127.0.0.1",
            "public.example:8443",
            false,
        );
        assert_eq!(rewritten.as_deref(), Some("http://public.example:8443/x"));
    }

    #[test]
    fn test_foreign_and_relative_locations_untouched() {
        assert_eq!(
            rewrite_location("https://other.example/x", "backend.internal", "public.example", true),
            None
        );
        assert_eq!(rewrite_location("/x", "backend.internal", "public.example", true), None);
        assert_eq!(rewrite_location("::not a url", "backend.internal", "public.example", true), None);
    }

    #[test]
    fn test_forwarded_headers_replace_client_values() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
        headers.insert(FORWARDED, HeaderValue::from_static("for=evil"));
        let host = HeaderValue::from_static("public.example");

        set_forwarded_headers(&mut headers, Some("192.0.2.7".into()), Some(&host), "https");

        assert_eq!(headers.get_all(&X_FORWARDED_FOR).iter().count(), 1);
        assert_eq!(headers.get(&X_FORWARDED_FOR).unwrap(), "192.0.2.7");
        assert_eq!(headers.get(&X_FORWARDED_HOST).unwrap(), "public.example");
        assert_eq!(headers.get(&X_FORWARDED_PROTO).unwrap(), "https");
        assert!(headers.get(&FORWARDED).is_none());
    }

    #[test]
    fn test_forwarded_for_dropped_without_client_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));

        set_forwarded_headers(&mut headers, None, None, "http");

        assert!(headers.get(&X_FORWARDED_FOR).is_none());
        assert!(headers.get(&X_FORWARDED_HOST).is_none());
        assert_eq!(headers.get(&X_FORWARDED_PROTO).unwrap(), "http");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-secret"));
        headers.insert(KEEP_ALIVE, HeaderValue::from_static("timeout=5"));
        headers.insert("x-secret", HeaderValue::from_static("1"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        // Port 9 (discard) is closed on loopback in test environments.
        let target = Url::parse("http://127.0.0.1:9").unwrap();
        let forwarder = Forwarder::new(http_client(), &target, None, false, false).unwrap();
        let request = Request::builder()
            .uri("/x")
            .header(header::HOST, "public.example")
            .body(Body::empty())
            .unwrap();

        let response = forwarder.forward(request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
