//! Built-in interceptors for cross-cutting concerns.
//!
//! ```rust,ignore
//! use botic_framework::{CommandRouter, interceptor};
//!
//! let router = CommandRouter::new()
//!     .with_interceptor(interceptor::log_messages())
//!     .with_interceptor(interceptor::allow_users(["U024BE7LH"]));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use botic_core::{Interceptor, MessageEvent, Rejected};

/// Logs every routed message at info level. Never rejects.
pub fn log_messages() -> Interceptor {
    Interceptor::new(|event: MessageEvent| async move {
        info!(
            user = %event.user,
            channel = %event.channel,
            text = %event.args_text,
            "Routing message"
        );
        Ok(())
    })
}

/// Rejects messages from senders not in `users`.
pub fn allow_users<I, S>(users: I) -> Interceptor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: Arc<HashSet<String>> = Arc::new(users.into_iter().map(Into::into).collect());
    Interceptor::new(move |event: MessageEvent| {
        let allowed = Arc::clone(&allowed);
        async move {
            if allowed.contains(&event.user) {
                return Ok(());
            }
            warn!(user = %event.user, channel = %event.channel, "Sender not allowed");
            Err(Rejected::new(format!("user {} is not allowed to use this bot", event.user)).into())
        }
    })
}

/// Rejects messages outside the given channels.
pub fn allow_channels<I, S>(channels: I) -> Interceptor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: Arc<HashSet<String>> = Arc::new(channels.into_iter().map(Into::into).collect());
    Interceptor::new(move |event: MessageEvent| {
        let allowed = Arc::clone(&allowed);
        async move {
            if allowed.contains(&event.channel) {
                Ok(())
            } else {
                Err(Rejected::new("commands are disabled in this channel").into())
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRouter;
    use botic_core::Command;

    fn router_with(interceptor: Interceptor) -> CommandRouter {
        CommandRouter::new()
            .with(Command::new("ping", "replies pong", |_event| async { Ok(()) }))
            .with_interceptor(interceptor)
    }

    #[tokio::test]
    async fn test_allow_users() {
        let router = router_with(allow_users(["alice", "bob"]));

        tokio_test::assert_ok!(router.run(MessageEvent::command("ping", "C1", "alice")).await);
        let err = tokio_test::assert_err!(
            router.run(MessageEvent::command("ping", "C1", "mallory")).await
        );
        assert!(err.is_rejected());
        assert_eq!(err.to_string(), "user mallory is not allowed to use this bot");
    }

    #[tokio::test]
    async fn test_allow_channels() {
        let router = router_with(allow_channels(vec!["ops".to_string()]));

        tokio_test::assert_ok!(router.run(MessageEvent::command("ping", "ops", "U")).await);
        let err =
            tokio_test::assert_err!(router.run(MessageEvent::command("ping", "random", "U")).await);
        assert!(err.is_rejected());
    }

    #[tokio::test]
    async fn test_log_messages_passes_through() {
        let router = router_with(log_messages());
        tokio_test::assert_ok!(router.run(MessageEvent::command("ping", "C1", "U1")).await);
    }
}
