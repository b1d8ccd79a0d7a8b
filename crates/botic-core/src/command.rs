//! Commands and interceptors.
//!
//! Both wrap an async function taking a [`MessageEvent`] and returning a
//! [`HandlerResult`]. They are type-erased behind an `Arc` so routing tables
//! can be cloned cheaply and shared between concurrent dispatches.
//!
//! ```rust,ignore
//! use botic_core::{Command, Interceptor, MessageEvent};
//!
//! let ping = Command::new("ping", "replies pong", |event: MessageEvent| async move {
//!     event.reply("pong").await;
//!     Ok(())
//! });
//!
//! let audit = Interceptor::new(|event: MessageEvent| async move {
//!     tracing::info!(user = %event.user, "command received");
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HandlerResult;
use crate::event::MessageEvent;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased async function over a [`MessageEvent`].
pub type EventFn = Arc<dyn Fn(MessageEvent) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

fn erase<F, Fut>(f: F) -> EventFn
where
    F: Fn(MessageEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

// ============================================================================
// Command
// ============================================================================

/// A named, help-documented route.
///
/// The name is matched against the first whitespace-delimited token of the
/// event's argument text.
#[derive(Clone)]
pub struct Command {
    name: String,
    help: String,
    handler: EventFn,
}

impl Command {
    /// Creates a new command.
    pub fn new<F, Fut>(name: impl Into<String>, help: impl Into<String>, handler: F) -> Self
    where
        F: Fn(MessageEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            help: help.into(),
            handler: erase(handler),
        }
    }

    /// Returns the command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the one-line help string.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Invokes the handler.
    pub fn call(&self, event: MessageEvent) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(event)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish()
    }
}

// ============================================================================
// Interceptor
// ============================================================================

/// A pre-dispatch hook able to veto processing of a message.
///
/// Returning an error aborts routing of the event.
#[derive(Clone)]
pub struct Interceptor {
    inner: EventFn,
}

impl Interceptor {
    /// Creates an interceptor from an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(MessageEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self { inner: erase(f) }
    }

    /// Invokes the interceptor.
    pub fn call(&self, event: MessageEvent) -> BoxFuture<'static, HandlerResult> {
        (self.inner)(event)
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Interceptor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_command_call_runs_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let cmd = Command::new("count", "counts calls", move |_event| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert_eq!(cmd.name(), "count");
        assert_eq!(cmd.help(), "counts calls");
        tokio_test::assert_ok!(cmd.call(MessageEvent::command("count", "C", "U")).await);
        tokio_test::assert_ok!(cmd.clone().call(MessageEvent::default()).await);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_interceptor_error_is_returned() {
        let deny = Interceptor::new(|event: MessageEvent| async move {
            Err(format!("{} may not do that", event.user).into())
        });
        let err = tokio_test::assert_err!(deny.call(MessageEvent::new("x", "C", "mallory")).await);
        assert_eq!(err.to_string(), "mallory may not do that");
    }
}
