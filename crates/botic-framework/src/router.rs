//! Command routing.
//!
//! A [`CommandRouter`] owns the command table and the interceptor chain. For
//! each event it:
//!
//! 1. Runs interceptors in registration order, stopping at the first error
//! 2. Resolves the first token of the argument text to a [`Command`],
//!    falling back to the help command when nothing matches
//! 3. Stores the remaining text in the event's `input_text` and calls the handler
//!
//! The router never logs or swallows the errors it returns; it only
//! classifies them as [`DispatchError`] kinds.
//!
//! # Sharing
//!
//! The table lives behind an `Arc`. Registration during setup goes through
//! copy-on-write, and clones taken afterwards (one per dispatch, or one per
//! tower service) read it without locking.
//!
//! ```rust,ignore
//! use botic_framework::{Command, CommandRouter};
//!
//! let router = CommandRouter::new()
//!     .with(Command::new("ping", "replies pong", |event| async move {
//!         event.reply("pong").await;
//!         Ok(())
//!     }));
//!
//! router.run(event).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tower::Service;
use tracing::{Instrument, debug, debug_span, trace, warn};

use crate::help;
use botic_core::{BoxFuture, Command, DispatchError, DispatchResult, Interceptor, MessageEvent};

/// Name of the command used when nothing else matches.
pub const DEFAULT_HELP_COMMAND: &str = "help";

// ============================================================================
// Configuration
// ============================================================================

/// Matching options for a [`CommandRouter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Name of the reserved fallback command.
    #[serde(default = "default_help_command")]
    pub help_command: String,

    /// Route unmatched text to the help command when it is registered.
    #[serde(default = "default_help_fallback")]
    pub help_fallback: bool,
}

fn default_help_command() -> String {
    DEFAULT_HELP_COMMAND.to_string()
}

fn default_help_fallback() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            help_command: default_help_command(),
            help_fallback: default_help_fallback(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[derive(Clone, Default)]
struct RouterInner {
    commands: BTreeMap<String, Command>,
    interceptors: Vec<Interceptor>,
    config: RouterConfig,
}

/// Matches argument text against registered commands and dispatches to them.
#[derive(Clone, Default)]
pub struct CommandRouter {
    inner: Arc<RouterInner>,
}

impl CommandRouter {
    /// Creates an empty router with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty router with the given configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                config,
                ..Default::default()
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut RouterInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Returns the router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    /// Inserts a command, replacing any command with the same name.
    pub fn add(&mut self, command: Command) {
        let name = command.name().to_string();
        if self.inner_mut().commands.insert(name.clone(), command).is_some() {
            warn!(command = %name, "Command registered twice, replacing previous handler");
        } else {
            trace!(command = %name, "Command registered");
        }
    }

    /// Inserts a command (builder pattern).
    pub fn with(mut self, command: Command) -> Self {
        self.add(command);
        self
    }

    /// Appends an interceptor to the chain.
    pub fn add_interceptor(&mut self, interceptor: Interceptor) {
        self.inner_mut().interceptors.push(interceptor);
    }

    /// Appends an interceptor to the chain (builder pattern).
    pub fn with_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.add_interceptor(interceptor);
        self
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.inner.commands.len()
    }

    /// Returns true if no command is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.commands.is_empty()
    }

    /// Returns true if a command with `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.commands.contains_key(name)
    }

    /// Returns the command registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.inner.commands.get(name)
    }

    /// Iterates over registered commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.inner.commands.values()
    }

    /// Returns the number of registered interceptors.
    pub fn interceptor_count(&self) -> usize {
        self.inner.interceptors.len()
    }

    /// Resolves argument text to a command and its input.
    ///
    /// The text is split at the first whitespace run. A known leading token
    /// yields that command with the rest as input. Otherwise the help command
    /// (if registered and enabled) receives the whole text.
    pub fn resolve(&self, args_text: &str) -> Option<(&Command, String)> {
        let (name, rest) = split_command(args_text);

        if !name.is_empty()
            && let Some(command) = self.inner.commands.get(name)
        {
            return Some((command, rest.to_string()));
        }

        let config = &self.inner.config;
        if !config.help_fallback {
            return None;
        }
        self.inner
            .commands
            .get(&config.help_command)
            .map(|help| (help, args_text.to_string()))
    }

    /// Routes a single event through the interceptors and the matched handler.
    pub async fn run(&self, event: MessageEvent) -> DispatchResult {
        let span = debug_span!("route", channel = %event.channel, user = %event.user);
        self.route(event).instrument(span).await
    }

    async fn route(&self, mut event: MessageEvent) -> DispatchResult {
        for (index, interceptor) in self.inner.interceptors.iter().enumerate() {
            if let Err(source) = interceptor.call(event.clone()).await {
                debug!(interceptor = index, "Interceptor rejected message");
                return Err(DispatchError::InterceptorRejected { source });
            }
        }

        let Some((command, input)) = self.resolve(&event.args_text) else {
            debug!(text = %event.args_text, "No command matched");
            return Err(DispatchError::not_found(event.args_text));
        };

        debug!(command = %command.name(), "Dispatching command");
        event.input_text = input;
        command
            .call(event)
            .await
            .map_err(|source| DispatchError::HandlerFailed {
                command: command.name().to_string(),
                source,
            })
    }

    /// Renders the usage text listing every command.
    pub fn help(&self, bot_id: &str) -> String {
        help::render(bot_id, self.commands())
    }
}

/// Splits text into the leading token and the remainder after the
/// separating whitespace run.
fn split_command(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (text, ""),
    }
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("commands", &self.inner.commands.keys().collect::<Vec<_>>())
            .field("interceptor_count", &self.inner.interceptors.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

/// Lets tower middleware (timeouts, concurrency limits) wrap the router.
impl Service<MessageEvent> for CommandRouter {
    type Response = ();
    type Error = DispatchError;
    type Future = BoxFuture<'static, DispatchResult>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: MessageEvent) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { router.run(event).await })
    }
}
