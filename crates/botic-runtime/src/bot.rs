//! The bot orchestrator.
//!
//! A [`Bot`] binds one [`Transport`] to one [`CommandRouter`]. Once
//! connected it receives every normalized message from the transport,
//! routes commands, answers unknown commands with the help text and sends
//! every other failure back to the originating channel.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use botic_core::{
    CancellationToken, DispatchResult, ErrorHandler, EventError, MessageEvent, MessageHandler,
    Transport, TransportResult,
};
use botic_framework::CommandRouter;

use crate::error::RuntimeResult;

/// Connection state of a [`Bot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    /// Not connected yet, or shut down.
    Disconnected,
    /// The transport connected and the bot's callbacks are registered.
    Connected,
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Binds a transport's inbound messages to a command router.
///
/// ```rust,ignore
/// let bot = Bot::new(transport, router);
/// bot.serve(CancellationToken::new()).await?;
/// ```
pub struct Bot {
    transport: Arc<dyn Transport>,
    router: CommandRouter,
    status: RwLock<BotStatus>,
    /// Serializes `run` so concurrent callers connect once.
    run_lock: Mutex<()>,
}

impl Bot {
    /// Creates a disconnected bot.
    pub fn new(transport: Arc<dyn Transport>, router: CommandRouter) -> Arc<Self> {
        Arc::new(Self {
            transport,
            router,
            status: RwLock::new(BotStatus::Disconnected),
            run_lock: Mutex::new(()),
        })
    }

    /// Returns the current connection state.
    pub fn status(&self) -> BotStatus {
        *self.status.read()
    }

    /// Returns the router commands are dispatched to.
    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Returns the transport this bot is bound to.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn set_status(&self, status: BotStatus) {
        let old_status = std::mem::replace(&mut *self.status.write(), status);
        debug!(
            bot = %self.transport.bot_name(),
            old_status = %old_status,
            new_status = %status,
            "Bot status changed"
        );
    }

    /// Connects the transport and registers this bot's callbacks.
    ///
    /// Returns the transport's connect error unchanged. The call returns as
    /// soon as the transport is connected; ingestion continues on the
    /// transport's own tasks until `cancel` fires. Concurrent calls connect
    /// once; the others return `Ok` after it.
    pub async fn run(self: &Arc<Self>, cancel: CancellationToken) -> TransportResult<()> {
        let _running = self.run_lock.lock().await;
        if self.status() == BotStatus::Connected {
            warn!(bot = %self.transport.bot_name(), "Bot already running");
            return Ok(());
        }

        self.transport.connect(cancel).await?;

        let this = Arc::downgrade(self);
        let on_message: MessageHandler = Arc::new(move |event| {
            let this = Weak::clone(&this);
            Box::pin(async move {
                match this.upgrade() {
                    Some(bot) => bot.on_message(event).await,
                    None => Ok(()),
                }
            })
        });
        self.transport.on_message(on_message);

        let this = Arc::downgrade(self);
        let on_error: ErrorHandler = Arc::new(move |error| {
            let this = Weak::clone(&this);
            Box::pin(async move {
                if let Some(bot) = this.upgrade() {
                    bot.on_error(error).await;
                }
            })
        });
        self.transport.on_error(on_error);

        self.set_status(BotStatus::Connected);
        info!(
            bot = %self.transport.bot_name(),
            commands = self.router.len(),
            "Bot connected"
        );
        Ok(())
    }

    /// Handles one inbound message.
    ///
    /// Non-command messages are ignored. An unknown command is answered
    /// with the router's help text instead of an error; every other
    /// routing error is returned for the transport's error sink.
    pub async fn on_message(&self, event: MessageEvent) -> DispatchResult {
        if !event.is_command {
            return Ok(());
        }

        let channel = event.channel.clone();
        match self.router.run(event).await {
            Err(err) if err.is_command_not_found() => {
                debug!(channel = %channel, error = %err, "Unknown command, replying with help");
                let help = self.router.help(&self.transport.bot_name());
                self.transport.send(&channel, &help).await;
                Ok(())
            }
            result => result,
        }
    }

    /// Sends the text of a failed event's error back to its channel.
    pub async fn on_error(&self, error: EventError) {
        info!(
            channel = %error.event.channel,
            user = %error.event.user,
            error = %error.error,
            "Replying with command error"
        );
        let text = error.error.to_string();
        self.transport.send(&error.event.channel, &text).await;
    }

    /// Closes the transport and marks the bot disconnected.
    pub async fn shutdown(&self) -> TransportResult<()> {
        let result = self.transport.close().await;
        self.set_status(BotStatus::Disconnected);
        result
    }

    /// Runs the bot until Ctrl+C or until `cancel` fires, then shuts down.
    pub async fn serve(self: &Arc<Self>, cancel: CancellationToken) -> RuntimeResult<()> {
        self.run(cancel.clone()).await?;
        info!(bot = %self.transport.bot_name(), "Bot is running. Press Ctrl+C to stop.");

        tokio::select! {
            _ = cancel.cancelled() => debug!("Cancellation requested"),
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => {
                    warn!(error = %e, "Failed to listen for Ctrl+C, waiting for cancellation");
                    cancel.cancelled().await;
                }
            },
        }

        cancel.cancel();
        self.shutdown().await?;
        info!(bot = %self.transport.bot_name(), "Bot stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("bot_name", &self.transport.bot_name())
            .field("router", &self.router)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use botic_core::{Command, TransportError};
    use botic_framework::interceptor;
    use botic_transport::{MemoryTransport, SentMessage};
    use tokio::sync::Notify;

    const WAIT: Duration = Duration::from_secs(2);

    fn ping_router() -> CommandRouter {
        CommandRouter::new()
            .with(Command::new("ping", "replies pong", |event: MessageEvent| async move {
                event.reply("pong").await;
                Ok(())
            }))
            .with(Command::new("fail", "always fails", |_event| async {
                Err("disk full".into())
            }))
    }

    #[tokio::test]
    async fn test_ping_and_unknown_command_help() {
        let transport = MemoryTransport::new("opsbot");
        let router = ping_router();
        let bot = Bot::new(transport.clone(), router.clone());
        tokio_test::assert_ok!(bot.run(CancellationToken::new()).await);

        assert!(transport.inject("C1", "U1", "@opsbot ping"));
        let sent = transport.wait_for_sent(1, WAIT).await;
        assert_eq!(sent[0].channel, "C1");
        assert_eq!(sent[0].text, "pong");

        assert!(transport.inject("C1", "U1", "@opsbot pingx"));
        let sent = transport.wait_for_sent(2, WAIT).await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].text, router.help("opsbot"));
    }

    #[tokio::test]
    async fn test_on_message_swallows_command_not_found() {
        let transport = MemoryTransport::new("opsbot");
        let router = ping_router();
        let bot = Bot::new(transport.clone(), router.clone());

        let event = MessageEvent::command("pingx", "C9", "U1");
        tokio_test::assert_ok!(bot.on_message(event).await);

        let sent = transport.sent_to("C9");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, router.help("opsbot"));
    }

    #[tokio::test]
    async fn test_handler_failure_is_replied() {
        let transport = MemoryTransport::new("opsbot");
        let bot = Bot::new(transport.clone(), ping_router());
        tokio_test::assert_ok!(bot.run(CancellationToken::new()).await);

        transport.inject("C2", "U1", "@opsbot fail now");
        let sent = transport.wait_for_sent(1, WAIT).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, "C2");
        assert_eq!(sent[0].text, "disk full");

        let err = tokio_test::assert_err!(
            bot.on_message(MessageEvent::command("fail", "C2", "U1")).await
        );
        assert!(!err.is_command_not_found());
    }

    #[tokio::test]
    async fn test_interceptor_rejection_is_replied() {
        let transport = MemoryTransport::new("opsbot");
        let router = ping_router().with_interceptor(interceptor::allow_users(["alice"]));
        let bot = Bot::new(transport.clone(), router);
        tokio_test::assert_ok!(bot.run(CancellationToken::new()).await);

        transport.inject("C3", "mallory", "@opsbot ping");
        let sent = transport.wait_for_sent(1, WAIT).await;
        assert_eq!(sent[0].text, "user mallory is not allowed to use this bot");
    }

    #[tokio::test]
    async fn test_non_command_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = CommandRouter::new().with(Command::new("ping", "", move |_event| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));
        let transport = MemoryTransport::new("opsbot");
        let bot = Bot::new(transport.clone(), router);

        tokio_test::assert_ok!(bot.on_message(MessageEvent::new("ping", "C1", "U1")).await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_connect_error_is_returned_unchanged() {
        let transport = MemoryTransport::new("opsbot");
        transport.fail_next_connect(TransportError::connection_failed("refused"));
        let bot = Bot::new(transport.clone(), ping_router());

        let err = tokio_test::assert_err!(bot.run(CancellationToken::new()).await);
        assert!(matches!(err, TransportError::ConnectionFailed { ref reason } if reason == "refused"));
        assert_eq!(bot.status(), BotStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_cancel_ends_ingestion_without_aborting_handlers() {
        let gate = Arc::new(Notify::new());
        let release = Arc::clone(&gate);
        let router = ping_router().with(Command::new(
            "slow",
            "waits for the gate",
            move |event: MessageEvent| {
                let gate = Arc::clone(&release);
                async move {
                    gate.notified().await;
                    event.reply("done").await;
                    Ok(())
                }
            },
        ));
        let transport = MemoryTransport::new("opsbot");
        let bot = Bot::new(transport.clone(), router);
        let cancel = CancellationToken::new();
        tokio_test::assert_ok!(bot.run(cancel.clone()).await);

        assert!(transport.inject("C1", "U1", "@opsbot slow"));
        cancel.cancel();
        assert!(!transport.is_connected());
        assert!(!transport.inject("C1", "U1", "@opsbot ping"));

        gate.notify_one();
        let closed = tokio::time::timeout(WAIT, bot.shutdown()).await;
        tokio_test::assert_ok!(tokio_test::assert_ok!(closed));
        assert_eq!(
            transport.sent(),
            vec![SentMessage {
                channel: "C1".into(),
                text: "done".into(),
            }]
        );
        assert_eq!(bot.status(), BotStatus::Disconnected);
    }

    struct CountingTransport {
        inner: Arc<MemoryTransport>,
        connects: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn connect(&self, cancel: CancellationToken) -> TransportResult<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.connect(cancel).await
        }

        fn on_message(&self, handler: MessageHandler) {
            self.inner.on_message(handler);
        }

        fn on_error(&self, handler: ErrorHandler) {
            self.inner.on_error(handler);
        }

        fn bot_id(&self) -> String {
            self.inner.bot_id()
        }

        fn bot_name(&self) -> String {
            self.inner.bot_name()
        }

        async fn send(&self, channel: &str, text: &str) {
            self.inner.send(channel, text).await;
        }

        async fn close(&self) -> TransportResult<()> {
            self.inner.close().await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_run_connects_once() {
        let transport = Arc::new(CountingTransport {
            inner: MemoryTransport::new("opsbot"),
            connects: AtomicUsize::new(0),
        });
        let bot = Bot::new(transport.clone(), ping_router());
        let cancel = CancellationToken::new();

        let runs: Vec<_> = (0..8)
            .map(|_| {
                let bot = Arc::clone(&bot);
                let cancel = cancel.clone();
                tokio::spawn(async move { bot.run(cancel).await })
            })
            .collect();
        for run in runs {
            tokio_test::assert_ok!(run.await.expect("run task panicked"));
        }

        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);
        assert_eq!(bot.status(), BotStatus::Connected);
    }

    #[tokio::test]
    async fn test_status_and_serve_shutdown() {
        let transport = MemoryTransport::new("opsbot");
        let bot = Bot::new(transport.clone(), ping_router());
        assert_eq!(bot.status(), BotStatus::Disconnected);

        let cancel = CancellationToken::new();
        tokio_test::assert_ok!(bot.run(cancel.clone()).await);
        assert_eq!(bot.status(), BotStatus::Connected);
        tokio_test::assert_ok!(bot.run(cancel.clone()).await);
        assert_eq!(bot.status(), BotStatus::Connected);

        cancel.cancel();
        tokio_test::assert_ok!(bot.serve(cancel).await);
        assert_eq!(bot.status(), BotStatus::Disconnected);
        assert!(transport.is_closed());
    }
}
