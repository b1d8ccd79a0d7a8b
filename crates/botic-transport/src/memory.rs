//! In-memory transport.
//!
//! [`MemoryTransport`] has no provider behind it: tests inject raw text as if
//! it arrived from a chat, and every outbound message is recorded so it can
//! be asserted on. Inbound events go through the same [`Ingest`] path real
//! transports use, so handlers run on their own tasks.
//!
//! ```rust,ignore
//! let transport = MemoryTransport::new("opsbot");
//! transport.connect(CancellationToken::new()).await?;
//! transport.inject("C1", "alice", "@opsbot ping");
//!
//! let sent = transport.wait_for_sent(1, Duration::from_secs(1)).await;
//! assert_eq!(sent[0].text, "pong");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use botic_core::{
    AddressPrefix, CancellationToken, ErrorHandler, Ingest, MessageEvent, MessageHandler,
    Transport, TransportError, TransportResult,
};

/// A message recorded by [`MemoryTransport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Destination conversation.
    pub channel: String,
    /// Message text.
    pub text: String,
}

/// A transport backed by memory, for tests and local wiring.
pub struct MemoryTransport {
    this: Weak<MemoryTransport>,
    bot_id: String,
    bot_name: String,
    prefix: AddressPrefix,
    ingest: Ingest,
    sent: Mutex<Vec<SentMessage>>,
    sent_notify: Notify,
    connected: AtomicBool,
    closed: AtomicBool,
    connect_error: Mutex<Option<TransportError>>,
}

impl MemoryTransport {
    /// Creates a transport addressed with `@bot_name`.
    pub fn new(bot_name: impl Into<String>) -> Arc<Self> {
        let bot_name = bot_name.into();
        let prefix = AddressPrefix::mention(format!("@{bot_name}"));
        Self::with_prefix(bot_name, prefix)
    }

    /// Creates a transport with a custom address prefix.
    pub fn with_prefix(bot_name: impl Into<String>, prefix: AddressPrefix) -> Arc<Self> {
        let bot_name = bot_name.into();
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            bot_id: bot_name.clone(),
            bot_name,
            prefix,
            ingest: Ingest::new(),
            sent: Mutex::new(Vec::new()),
            sent_notify: Notify::new(),
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            connect_error: Mutex::new(None),
        })
    }

    /// Makes the next [`connect`](Transport::connect) call fail with `error`.
    pub fn fail_next_connect(&self, error: TransportError) {
        *self.connect_error.lock() = Some(error);
    }

    /// Returns true between a successful connect and close, as long as the
    /// connect token has not fired.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.ingest.is_stopped()
    }

    /// Returns true once [`close`](Transport::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Normalizes raw chat text and delivers it as if it came from a provider.
    ///
    /// Returns `false` if the transport is not connected or no message
    /// handler is registered.
    pub fn inject(&self, channel: &str, user: &str, text: &str) -> bool {
        let event = MessageEvent::new(text, channel, user).addressed(&self.prefix);
        self.deliver(event)
    }

    /// Delivers a pre-built event, attaching this transport to it.
    ///
    /// Returns `false` if the event was dropped.
    pub fn deliver(&self, event: MessageEvent) -> bool {
        match self.try_deliver(event) {
            Ok(delivered) => delivered,
            Err(e) => {
                warn!(error = %e, "Memory transport dropping event");
                false
            }
        }
    }

    /// Like [`deliver`](Self::deliver) but reports a disconnected transport
    /// as [`TransportError::NotConnected`].
    ///
    /// `Ok(false)` means no message handler is registered.
    pub fn try_deliver(&self, mut event: MessageEvent) -> TransportResult<bool> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if event.transport.is_none()
            && let Some(this) = self.this.upgrade()
        {
            event = event.with_transport(this);
        }
        Ok(self.ingest.deliver(event))
    }

    /// Returns every message sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Returns messages sent to `channel`.
    pub fn sent_to(&self, channel: &str) -> Vec<SentMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.channel == channel)
            .cloned()
            .collect()
    }

    /// Waits until at least `count` messages were sent or `within` elapses,
    /// then returns everything sent so far.
    pub async fn wait_for_sent(&self, count: usize, within: Duration) -> Vec<SentMessage> {
        let wait = async {
            loop {
                let mut notified = std::pin::pin!(self.sent_notify.notified());
                notified.as_mut().enable();
                if self.sent.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(within, wait).await.is_err() {
            debug!(count, "Timed out waiting for sent messages");
        }
        self.sent()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, cancel: CancellationToken) -> TransportResult<()> {
        let pending = self.connect_error.lock().take();
        if let Some(err) = pending {
            return Err(err);
        }
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed {
                reason: "transport was closed".into(),
            });
        }
        if self.ingest.is_stopped() {
            return Err(TransportError::ConnectionClosed {
                reason: "connection was cancelled".into(),
            });
        }
        if self.connected.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.ingest.start(cancel);
        info!(bot = %self.bot_name, "Memory transport connected");
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) {
        self.ingest.set_message_handler(handler);
    }

    fn on_error(&self, handler: ErrorHandler) {
        self.ingest.set_error_handler(handler);
    }

    fn bot_id(&self) -> String {
        self.bot_id.clone()
    }

    fn bot_name(&self) -> String {
        self.bot_name.clone()
    }

    async fn send(&self, channel: &str, text: &str) {
        self.sent.lock().push(SentMessage {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        self.sent_notify.notify_waiters();
    }

    async fn close(&self) -> TransportResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        self.ingest.shutdown().await;
        info!(bot = %self.bot_name, "Memory transport closed");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("bot_name", &self.bot_name)
            .field("prefix", &self.prefix)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botic_core::DispatchError;

    fn echo_handler() -> MessageHandler {
        Arc::new(|event: MessageEvent| {
            Box::pin(async move {
                if event.is_command {
                    event.reply(&format!("echo {}", event.args_text)).await;
                }
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_inject_requires_connection() {
        let transport = MemoryTransport::new("bot");
        transport.on_message(echo_handler());
        assert!(!transport.inject("C1", "U1", "@bot hi"));
        let err = tokio_test::assert_err!(
            transport.try_deliver(MessageEvent::command("hi", "C1", "U1"))
        );
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_inject_normalizes_and_replies() {
        let transport = MemoryTransport::new("bot");
        tokio_test::assert_ok!(transport.connect(CancellationToken::new()).await);
        transport.on_message(echo_handler());

        assert!(transport.inject("C1", "U1", "@bot hello there"));
        assert!(transport.inject("C2", "U1", "not for the bot"));

        let sent = transport.wait_for_sent(1, Duration::from_secs(1)).await;
        assert_eq!(
            sent,
            vec![SentMessage {
                channel: "C1".into(),
                text: "echo hello there".into(),
            }]
        );
        assert!(transport.sent_to("C2").is_empty());
    }

    #[tokio::test]
    async fn test_handler_errors_reach_error_handler() {
        let transport = MemoryTransport::with_prefix("bot", AddressPrefix::literal("!"));
        tokio_test::assert_ok!(transport.connect(CancellationToken::new()).await);
        transport.on_message(Arc::new(|event: MessageEvent| {
            Box::pin(async move { Err(DispatchError::not_found(event.args_text)) })
        }));
        transport.on_error(Arc::new(|err: botic_core::EventError| {
            Box::pin(async move {
                let text = err.error.to_string();
                err.event.reply(&text).await;
            })
        }));

        transport.inject("C7", "U1", "!nothing");
        let sent = transport.wait_for_sent(1, Duration::from_secs(1)).await;
        assert_eq!(sent[0].channel, "C7");
        assert_eq!(sent[0].text, "command not found: nothing");
    }

    #[tokio::test]
    async fn test_cancelled_token_disconnects() {
        let transport = MemoryTransport::new("bot");
        let cancel = CancellationToken::new();
        tokio_test::assert_ok!(transport.connect(cancel.clone()).await);
        transport.on_message(echo_handler());
        assert!(transport.is_connected());

        cancel.cancel();
        assert!(!transport.is_connected());
        assert!(!transport.inject("C1", "U1", "@bot hello"));
        let err = tokio_test::assert_err!(
            transport.try_deliver(MessageEvent::command("hello", "C1", "U1"))
        );
        assert!(matches!(err, TransportError::NotConnected));
        tokio_test::assert_err!(transport.connect(CancellationToken::new()).await);

        tokio_test::assert_ok!(transport.close().await);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_and_close() {
        let transport = MemoryTransport::new("bot");
        transport.fail_next_connect(TransportError::connection_failed("no route"));
        let err = tokio_test::assert_err!(transport.connect(CancellationToken::new()).await);
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
        assert!(!transport.is_connected());

        tokio_test::assert_ok!(transport.connect(CancellationToken::new()).await);
        assert!(transport.is_connected());
        tokio_test::assert_ok!(transport.close().await);
        assert!(transport.is_closed());
        assert!(!transport.inject("C1", "U1", "@bot ping"));
    }
}
