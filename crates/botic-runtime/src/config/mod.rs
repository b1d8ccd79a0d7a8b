//! Configuration for a Botic process.
//!
//! Settings are layered with figment: built-in defaults, a `botic.toml`
//! file, `BOTIC_*` environment variables and programmatic overrides.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BoticConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;

pub use botic_framework::RouterConfig;
