//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EsrConfig (validated, immutable)
//!     → binary threads explicit values into each stage
//! ```
//!
//! # Design Decisions
//! - Library code never reads configuration; callers pass values in
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigResult};
pub use schema::{Blockchain, ConnectionConfig, EsrConfig, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
