//! Line-based console transport.
//!
//! Every stdin line is one inbound message from a fixed channel and user.
//! Replies are printed to stdout as `[channel] text`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use botic_core::{
    AddressPrefix, CancellationToken, ErrorHandler, Ingest, MessageEvent, MessageHandler,
    Transport, TransportError, TransportResult,
};

/// Channel id used when none is configured.
pub const DEFAULT_CHANNEL: &str = "console";
/// User id used when none is configured.
pub const DEFAULT_USER: &str = "local";

/// A transport reading commands from stdin and replying on stdout.
pub struct ConsoleTransport {
    this: Weak<ConsoleTransport>,
    bot_name: String,
    prefix: AddressPrefix,
    channel: String,
    user: String,
    ingest: Ingest,
    reader: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ConsoleTransport {
    /// Creates a console transport addressed with `@bot_name`.
    pub fn new(bot_name: impl Into<String>) -> Arc<Self> {
        let bot_name = bot_name.into();
        let prefix = AddressPrefix::mention(format!("@{bot_name}"));
        Self::with_prefix(bot_name, prefix)
    }

    /// Creates a console transport with a custom address prefix.
    pub fn with_prefix(bot_name: impl Into<String>, prefix: AddressPrefix) -> Arc<Self> {
        Self::build(bot_name.into(), prefix, DEFAULT_CHANNEL.into(), DEFAULT_USER.into())
    }

    /// Returns a copy of this transport posting as `channel` and `user`.
    ///
    /// Must be called before [`connect`](Transport::connect).
    pub fn with_identity(
        self: Arc<Self>,
        channel: impl Into<String>,
        user: impl Into<String>,
    ) -> Arc<Self> {
        Self::build(
            self.bot_name.clone(),
            self.prefix.clone(),
            channel.into(),
            user.into(),
        )
    }

    fn build(bot_name: String, prefix: AddressPrefix, channel: String, user: String) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            bot_name,
            prefix,
            channel,
            user,
            ingest: Ingest::new(),
            reader: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    fn event_for(&self, line: &str) -> MessageEvent {
        let mut event =
            MessageEvent::new(line, self.channel.as_str(), self.user.as_str()).addressed(&self.prefix);
        if let Some(this) = self.this.upgrade() {
            event = event.with_transport(this);
        }
        event
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn connect(&self, cancel: CancellationToken) -> TransportResult<()> {
        if self.closed.load(Ordering::SeqCst) || self.ingest.is_stopped() {
            return Err(TransportError::ConnectionClosed {
                reason: "console was closed".into(),
            });
        }
        let mut reader = self.reader.lock();
        if reader.is_some() {
            return Ok(());
        }

        self.ingest.start(cancel.clone());
        let this = self.this.clone();
        *reader = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(line)) => {
                        let Some(transport) = this.upgrade() else { break };
                        if line.trim().is_empty() {
                            continue;
                        }
                        transport.ingest.deliver(transport.event_for(&line));
                    }
                    Ok(None) => {
                        debug!("Console input closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read console input");
                        break;
                    }
                }
            }
        }));
        info!(bot = %self.bot_name, channel = %self.channel, "Console transport connected");
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) {
        self.ingest.set_message_handler(handler);
    }

    fn on_error(&self, handler: ErrorHandler) {
        self.ingest.set_error_handler(handler);
    }

    fn bot_id(&self) -> String {
        self.bot_name.clone()
    }

    fn bot_name(&self) -> String {
        self.bot_name.clone()
    }

    async fn send(&self, channel: &str, text: &str) {
        let line = format!("[{channel}] {text}\n");
        let mut stdout = tokio::io::stdout();
        let written = match stdout.write_all(line.as_bytes()).await {
            Ok(()) => stdout.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let err = TransportError::SendFailed(e.to_string());
            warn!(channel, error = %err, "Console reply dropped");
        }
    }

    async fn close(&self) -> TransportResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let reader = self.reader.lock().take();
        if let Some(reader) = reader {
            reader.abort();
        }
        self.ingest.shutdown().await;
        info!(bot = %self.bot_name, "Console transport closed");
        Ok(())
    }
}

impl std::fmt::Debug for ConsoleTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleTransport")
            .field("bot_name", &self.bot_name)
            .field("channel", &self.channel)
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_for_line() {
        let console = ConsoleTransport::new("bot").with_identity("ops", "alice");

        let event = console.event_for("@bot deploy web");
        assert!(event.is_command);
        assert_eq!(event.args_text, "deploy web");
        assert_eq!(event.channel, "ops");
        assert_eq!(event.user, "alice");
        assert!(event.transport.is_some());

        assert!(!console.event_for("just chatting").is_command);
    }

    #[tokio::test]
    async fn test_closed_console_refuses_connect() {
        let console = ConsoleTransport::new("bot");
        tokio_test::assert_ok!(console.close().await);
        let err = tokio_test::assert_err!(console.connect(CancellationToken::new()).await);
        assert!(matches!(err, TransportError::ConnectionClosed { .. }));
    }
}
