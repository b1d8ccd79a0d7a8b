//! # Botic Runtime
//!
//! Process-level pieces around the router:
//! - [`Bot`], the orchestrator binding a transport to a [`CommandRouter`](botic_framework::CommandRouter)
//! - Layered configuration ([`ConfigLoader`])
//! - Logging setup ([`LoggingBuilder`])
//!
//! ```rust,ignore
//! use botic_runtime::{Bot, config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let router = CommandRouter::with_config(config.router);
//! Bot::new(transport, router).serve(CancellationToken::new()).await?;
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;

pub use bot::{Bot, BotStatus};
pub use config::{BoticConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

pub use tracing;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
