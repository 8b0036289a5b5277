//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host without port, path)
//!     → router.rs (rule lookup, in configuration order)
//!     → matcher.rs (evaluate host / path prefix conditions)
//!     → Return: matched Rule or None
//!
//! Rule Compilation (at startup):
//!     RouteConfig[]
//!     → matcher + backend URL per route
//!     → forwarder, wrapped by the Basic Auth gate when configured
//!     → Freeze as immutable RuleTable
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same rule
//! - First match wins (configuration order)

pub mod matcher;
pub mod router;

pub use router::{Rule, RuleTable};
