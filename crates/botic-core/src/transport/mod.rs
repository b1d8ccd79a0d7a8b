//! Transport contract for chat-provider integrations.
//!
//! A transport owns a provider connection, normalizes provider events into
//! [`MessageEvent`]s and delivers outbound text. The core only ever talks to
//! a provider through the [`Transport`] trait.
//!
//! # Dispatch contract
//!
//! Transports must invoke the registered message handler asynchronously per
//! message so that a slow handler never stalls ingestion. The [`Ingest`]
//! helper implements this: one task per event, with handler errors funneled
//! into a single error sink.

pub mod address;
pub mod ingest;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::command::BoxFuture;
use crate::error::{DispatchResult, EventError, TransportResult};
use crate::event::MessageEvent;

pub use address::AddressPrefix;
pub use ingest::Ingest;

/// Callback invoked for every normalized inbound event.
pub type MessageHandler =
    Arc<dyn Fn(MessageEvent) -> BoxFuture<'static, DispatchResult> + Send + Sync>;

/// Callback invoked when the message handler fails for an event.
pub type ErrorHandler = Arc<dyn Fn(EventError) -> BoxFuture<'static, ()> + Send + Sync>;

/// The capability a chat-provider integration implements.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes connectivity.
    ///
    /// Must return promptly. Ongoing ingestion continues on independent
    /// tasks until `cancel` fires.
    async fn connect(&self, cancel: CancellationToken) -> TransportResult<()>;

    /// Registers the message handler. Only the latest registration is active.
    fn on_message(&self, handler: MessageHandler);

    /// Registers the error handler. Only the latest registration is active.
    fn on_error(&self, handler: ErrorHandler);

    /// Returns the provider-level identifier of the bot account.
    fn bot_id(&self) -> String;

    /// Returns the display identifier used in help text and address detection.
    fn bot_name(&self) -> String;

    /// Delivers text to a conversation.
    ///
    /// Best effort: failures are logged by the transport, not returned.
    async fn send(&self, channel: &str, text: &str);

    /// Releases provider connection resources.
    async fn close(&self) -> TransportResult<()>;
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;
