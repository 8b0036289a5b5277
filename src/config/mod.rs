//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, resolve relative paths)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → one FrontendConfig handed to each frontend server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Validation separates syntactic (serde) from semantic checks
//! - Relative paths are resolved against the config file's directory

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AcmeChallengeConfig, BasicAuthConfig, FrontendConfig, GatewayConfig, Protocol, RouteConfig,
    RouteFrom, RouteTarget,
};
