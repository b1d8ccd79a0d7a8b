//! # Botic Core
//!
//! Data model and transport contract for the Botic chat-bot command framework.
//!
//! This crate holds the plain types every other layer builds on:
//!
//! - **Events**: the normalized inbound message ([`MessageEvent`])
//! - **Routes**: named commands and pre-dispatch hooks ([`Command`], [`Interceptor`])
//! - **Errors**: tagged routing outcomes ([`DispatchError`], [`EventError`])
//! - **Transport**: the provider contract ([`Transport`]) plus helpers for
//!   implementing it ([`AddressPrefix`], [`Ingest`])
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  MessageEvent  ┌──────────┐     ┌────────┐     ┌─────────┐
//! │  Transport  │───────────────▶│   Bot    │────▶│ Router │────▶│ Command │
//! │ (provider)  │◀───────────────│          │     │        │     │ handler │
//! └─────────────┘  send / error  └──────────┘     └────────┘     └─────────┘
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod transport;

pub use command::{BoxFuture, Command, EventFn, Interceptor};
pub use error::{
    BoxError, DispatchError, DispatchResult, EventError, HandlerResult, Rejected, TransportError,
    TransportResult,
};
pub use event::{MessageEvent, Payload};
pub use transport::{
    AddressPrefix, BoxedTransport, ErrorHandler, Ingest, MessageHandler, Transport,
};

pub use tokio_util::sync::CancellationToken;
