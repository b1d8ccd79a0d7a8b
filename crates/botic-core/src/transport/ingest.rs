//! Task-per-message delivery for transport implementations.
//!
//! [`Ingest`] keeps the handlers registered through [`Transport::on_message`]
//! and [`Transport::on_error`](super::Transport::on_error), spawns one task
//! per inbound event and routes every handler failure through a channel into
//! a single error sink task.
//!
//! ```text
//! ingest loop ──deliver──▶ task(event) ──Err──▶ mpsc ──▶ sink ──▶ error handler
//!             ──deliver──▶ task(event) ──Ok
//! ```
//!
//! Cancelling the connect token stops new deliveries. Handlers already
//! running are never aborted: the sink waits for them and drains their
//! errors before it exits.
//!
//! [`Transport::on_message`]: super::Transport::on_message

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::{ErrorHandler, MessageHandler};
use crate::error::EventError;
use crate::event::MessageEvent;

#[derive(Default)]
struct Handlers {
    message: RwLock<Option<MessageHandler>>,
    error: RwLock<Option<ErrorHandler>>,
}

impl Handlers {
    async fn report(&self, err: EventError) {
        let handler = self.error.read().clone();
        match handler {
            Some(handler) => handler(err).await,
            None => warn!(
                channel = %err.event.channel,
                error = %err.error,
                "No error handler registered, dropping error"
            ),
        }
    }
}

/// Handler registry and per-message task spawner shared by transports.
pub struct Ingest {
    handlers: Arc<Handlers>,
    errors_tx: mpsc::UnboundedSender<EventError>,
    errors_rx: Mutex<Option<mpsc::UnboundedReceiver<EventError>>>,
    cancel: Mutex<CancellationToken>,
    tracker: TaskTracker,
    sink: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Ingest {
    fn default() -> Self {
        Self::new()
    }
}

impl Ingest {
    /// Creates an idle ingest with no handlers.
    pub fn new() -> Self {
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        Self {
            handlers: Arc::new(Handlers::default()),
            errors_tx,
            errors_rx: Mutex::new(Some(errors_rx)),
            cancel: Mutex::new(CancellationToken::new()),
            tracker: TaskTracker::new(),
            sink: Mutex::new(None),
        }
    }

    /// Replaces the active message handler.
    pub fn set_message_handler(&self, handler: MessageHandler) {
        *self.handlers.message.write() = Some(handler);
    }

    /// Replaces the active error handler.
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        *self.handlers.error.write() = Some(handler);
    }

    /// Returns true if a message handler is registered.
    pub fn has_message_handler(&self) -> bool {
        self.handlers.message.read().is_some()
    }

    /// Returns true once the connect token fired or [`shutdown`](Self::shutdown)
    /// was called. No further events are accepted.
    pub fn is_stopped(&self) -> bool {
        self.cancel.lock().is_cancelled()
    }

    /// Starts the error sink. Deliveries stop when `cancel` fires.
    ///
    /// Returns `false` if the sink was already started.
    pub fn start(&self, cancel: CancellationToken) -> bool {
        let Some(mut errors_rx) = self.errors_rx.lock().take() else {
            warn!("Ingest already started");
            return false;
        };

        let cancel = cancel.child_token();
        *self.cancel.lock() = cancel.clone();

        let handlers = Arc::clone(&self.handlers);
        let tracker = self.tracker.clone();
        let sink = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    next = errors_rx.recv() => {
                        let Some(err) = next else { break };
                        handlers.report(err).await;
                    }
                    _ = cancel.cancelled() => break,
                }
            }

            // In-flight handlers may still fail after cancellation.
            tracker.close();
            loop {
                tokio::select! {
                    biased;
                    Some(err) = errors_rx.recv() => handlers.report(err).await,
                    _ = tracker.wait() => break,
                }
            }
            while let Ok(err) = errors_rx.try_recv() {
                handlers.report(err).await;
            }
            debug!("Error sink stopped");
        });
        *self.sink.lock() = Some(sink);
        true
    }

    /// Hands `event` to the message handler on a new task.
    ///
    /// Returns `false` if ingestion was stopped or no message handler is
    /// registered; the event is dropped in that case.
    pub fn deliver(&self, event: MessageEvent) -> bool {
        if self.is_stopped() {
            debug!(channel = %event.channel, "Ingest stopped, dropping event");
            return false;
        }
        let handler = self.handlers.message.read().clone();
        let Some(handler) = handler else {
            warn!(channel = %event.channel, "No message handler registered, dropping event");
            return false;
        };

        let errors_tx = self.errors_tx.clone();
        self.tracker.spawn(async move {
            if let Err(error) = handler(event.clone()).await
                && errors_tx.send(EventError::new(event, error)).is_err()
            {
                debug!("Error sink closed, dropping error");
            }
        });
        true
    }

    /// Stops accepting events, waits for running handlers to finish and
    /// for the sink to report their errors.
    pub async fn shutdown(&self) {
        self.cancel.lock().cancel();
        let sink = self.sink.lock().take();
        match sink {
            Some(sink) => {
                if let Err(e) = sink.await {
                    warn!(error = %e, "Error sink task failed");
                }
            }
            None => {
                self.tracker.close();
                self.tracker.wait().await;
            }
        }
    }
}

impl std::fmt::Debug for Ingest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingest")
            .field("tasks", &self.tracker.len())
            .field("has_message_handler", &self.has_message_handler())
            .finish()
    }
}
