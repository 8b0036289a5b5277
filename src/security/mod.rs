//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on a protected rule:
//!     → auth.rs (parse Basic credentials, compare username)
//!     → password.rs (verify against the stored Argon2 hash)
//!     → Pass to the forwarder, or answer 401 with a challenge
//! ```
//!
//! # Design Decisions
//! - Fail closed: unparseable headers or stored hashes are rejected
//! - Hash verification runs on the blocking pool
//! - Credentials are read once, when the rule is compiled

pub mod auth;
pub mod password;

pub use auth::{BasicAuth, BasicAuthLayer, Credential};
pub use password::{hash_password, verify_password};
