//! Rule table: route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs into rules (matcher + backend URL + handler)
//! - Look up the first rule matching `(host, path)`
//! - Return matched rule or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in configuration order, first match wins
//! - Build fails on bad targets or credential files, never at request time

use std::convert::Infallible;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::util::BoxCloneSyncService;
use tower::{Layer, ServiceExt};
use url::Url;

use crate::config::{FrontendConfig, Protocol, RouteTarget};
use crate::error::{GatewayError, Result};
use crate::http::forwarder::{Forwarder, HttpClient};
use crate::routing::matcher::{Matcher, RuleMatcher};
use crate::security::auth::{BasicAuthLayer, Credential};

/// Handler bound to a rule: the forwarder, optionally behind the auth gate.
pub type RuleHandler = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Build the `http://host:port` URL of a backend target.
pub fn backend_url(target: &RouteTarget) -> std::result::Result<Url, url::ParseError> {
    let host = if target.host.contains(':') && !target.host.starts_with('[') {
        format!("[{}]", target.host)
    } else {
        target.host.clone()
    };
    Url::parse(&format!("http://{}:{}", host, target.port))
}

/// A compiled route.
pub struct Rule {
    name: String,
    matcher: RuleMatcher,
    target: Url,
    handler: RuleHandler,
}

impl Rule {
    pub fn new(name: impl Into<String>, matcher: RuleMatcher, target: Url, handler: RuleHandler) -> Self {
        Self {
            name: name.into(),
            matcher,
            target,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn matches(&self, host: &str, path: &str) -> bool {
        self.matcher.matches(host, path)
    }

    /// Run the bound handler for a matched request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        match self.handler.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("target", &self.target.as_str())
            .finish()
    }
}

/// Ordered, immutable rule table.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Wrap already compiled rules, keeping their order.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile the proxy routes of a frontend.
    pub fn build(frontend: &FrontendConfig, client: &HttpClient) -> Result<Self> {
        let tls = frontend.protocol == Protocol::Https;
        let mut rules = Vec::with_capacity(frontend.proxies.len());

        for route in &frontend.proxies {
            let target = backend_url(&route.to).map_err(|e| {
                GatewayError::InvalidTarget(format!("{}:{} ({})", route.to.host, route.to.port, e))
            })?;
            let from_host = route.from.host.clone().filter(|h| !h.is_empty());
            let forwarder = Forwarder::new(client.clone(), &target, from_host, frontend.force_https, tls)?;

            let handler = match &route.basic_auth {
                Some(auth) => {
                    let credential = Credential::from_file(&auth.credential_file)?;
                    let gate = BasicAuthLayer::new(&auth.realm, credential)?;
                    RuleHandler::new(gate.layer(forwarder))
                }
                None => RuleHandler::new(forwarder),
            };

            tracing::info!(
                route = %route.name,
                host = route.from.host.as_deref().unwrap_or("*"),
                path = route.from.path.as_deref().unwrap_or("*"),
                backend = %target,
                basic_auth = route.basic_auth.is_some(),
                "Route compiled"
            );

            rules.push(Rule::new(
                route.name.clone(),
                RuleMatcher::from_config(&route.from),
                target,
                handler,
            ));
        }

        Ok(Self { rules })
    }

    /// First rule accepting `(host, path)`.
    pub fn match_route(&self, host: &str, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(host, path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
