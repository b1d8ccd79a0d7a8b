//! # Botic Transport
//!
//! Ready-made [`Transport`](botic_core::Transport) implementations.
//!
//! - [`MemoryTransport`]: in-process transport for tests and wiring checks
//! - `ConsoleTransport` (feature `console`): stdin/stdout transport for
//!   trying a bot locally
//!
//! Provider transports live in their own crates and build on
//! [`Ingest`](botic_core::Ingest) and [`AddressPrefix`](botic_core::AddressPrefix)
//! the same way these do.

pub mod memory;

#[cfg(feature = "console")]
pub mod console;

pub use memory::{MemoryTransport, SentMessage};

#[cfg(feature = "console")]
pub use console::ConsoleTransport;
