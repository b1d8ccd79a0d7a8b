//! # Botic
//!
//! A chat-bot command framework: messages arrive from a chat provider,
//! the ones addressed to the bot are split into a command name and input,
//! routed through an interceptor chain to a registered handler, and any
//! failure is answered in the originating conversation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────┐     ┌───────────────┐     ┌───────────┐
//! │  Transport  │────▶│ Bot  │────▶│ CommandRouter │────▶│  Command  │
//! │ (provider)  │◀────│      │     │ interceptors  │     │  handler  │
//! └─────────────┘     └──────┘     └───────────────┘     └───────────┘
//! ```
//!
//! - **Transport**: provider integration; normalizes messages and sends replies
//! - **Bot**: binds a transport to a router, turns outcomes into replies
//! - **CommandRouter**: command table, interceptor chain, help text
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use botic::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = CommandRouter::new().with(Command::new(
//!         "ping",
//!         "replies pong",
//!         |event: MessageEvent| async move {
//!             event.reply("pong").await;
//!             Ok(())
//!         },
//!     ));
//!
//!     let transport = ConsoleTransport::new("botic");
//!     Bot::new(transport, router).serve(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `botic.toml` configuration files
//! - `yaml-config`: `botic.yaml` configuration files
//! - `json-log`: JSON log output
//! - `console`: stdin/stdout transport

pub use botic_core as core;
pub use botic_framework as framework;
pub use botic_runtime as runtime;
pub use botic_transport as transport;

pub use botic_core::{
    AddressPrefix, CancellationToken, Command, DispatchError, EventError, Interceptor,
    MessageEvent, Transport, TransportError,
};
pub use botic_framework::{CommandRouter, RouterConfig, interceptor};
pub use botic_runtime::{Bot, BotStatus, BoticConfig, ConfigLoader, LoggingBuilder, logging};

/// Common imports for building a bot.
///
/// ```rust,ignore
/// use botic::prelude::*;
/// ```
pub mod prelude {
    pub use botic_runtime::{Bot, BotStatus, BoticConfig, ConfigLoader, logging};

    pub use botic_framework::{CommandRouter, RouterConfig, interceptor};

    pub use botic_core::{
        AddressPrefix, CancellationToken, Command, DispatchError, HandlerResult, Interceptor,
        MessageEvent, Rejected, Transport,
    };

    pub use botic_transport::MemoryTransport;
    #[cfg(feature = "console")]
    pub use botic_transport::ConsoleTransport;

    pub use botic_runtime::prelude::*;
}
