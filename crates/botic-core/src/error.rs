//! Unified error types for the Botic core.
//!
//! Routing outcomes are classified by [`DispatchError`] so callers can branch
//! on the kind of failure instead of inspecting message text.

use thiserror::Error;

use crate::event::MessageEvent;

/// A type-erased error returned by handlers and interceptors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by command handlers and interceptors.
pub type HandlerResult = Result<(), BoxError>;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// The outcome of routing a single event that did not succeed.
///
/// Exactly one cause is reported per event. The rejected and failed kinds
/// display the underlying error's text unchanged.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An interceptor declined the message.
    #[error("{source}")]
    InterceptorRejected {
        /// The interceptor's error.
        source: BoxError,
    },

    /// No command matched and no help fallback was available.
    #[error("command not found: {text}")]
    CommandNotFound {
        /// The unmatched argument text.
        text: String,
    },

    /// The matched command's handler failed.
    #[error("{source}")]
    HandlerFailed {
        /// Name of the command that failed.
        command: String,
        /// The handler's error.
        source: BoxError,
    },
}

impl DispatchError {
    /// Creates a command-not-found error for the given text.
    pub fn not_found(text: impl Into<String>) -> Self {
        Self::CommandNotFound { text: text.into() }
    }

    /// Returns true if no command matched.
    pub fn is_command_not_found(&self) -> bool {
        matches!(self, Self::CommandNotFound { .. })
    }

    /// Returns true if an interceptor vetoed the message.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::InterceptorRejected { .. })
    }
}

/// Result type for dispatch operations.
pub type DispatchResult = Result<(), DispatchError>;

/// A dispatch error packaged with the event that produced it.
///
/// This is what transports hand to the registered error handler so that a
/// reply can be routed back to the originating conversation.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct EventError {
    /// The event whose handling failed.
    pub event: MessageEvent,
    /// The failure.
    #[source]
    pub error: DispatchError,
}

impl EventError {
    /// Wraps an error together with its event.
    pub fn new(event: MessageEvent, error: DispatchError) -> Self {
        Self { event, error }
    }
}

// =============================================================================
// Interceptor rejection
// =============================================================================

/// A plain veto returned by interceptors that refuse a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Rejected(pub String);

impl Rejected {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Creates a connection failure with the given reason.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
