//! The normalized inbound message.
//!
//! A [`MessageEvent`] is built once by a transport when it decodes a provider
//! event. Everything is fixed at construction except `input_text`, which the
//! router fills in while matching.
//!
//! ```rust,ignore
//! use botic_core::{AddressPrefix, MessageEvent};
//!
//! let prefix = AddressPrefix::mention("<@U42>");
//! let event = MessageEvent::new("<@U42> deploy web", "C1", "U7").addressed(&prefix);
//!
//! assert!(event.is_command);
//! assert_eq!(event.args_text, "deploy web");
//! ```

use std::any::Any;
use std::sync::Arc;

use tracing::warn;

use crate::transport::{AddressPrefix, Transport};

/// Opaque provider-specific payload carried alongside an event.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A normalized inbound chat message.
#[derive(Clone, Default)]
pub struct MessageEvent {
    /// The full original text.
    pub full_text: String,
    /// Conversation/channel identifier replies are sent to.
    pub channel: String,
    /// Sender identifier.
    pub user: String,
    /// Whether the message addressed the bot.
    pub is_command: bool,
    /// Text following the bot-address prefix.
    pub args_text: String,
    /// Text remaining after the command name. Set by the router.
    pub input_text: String,
    /// Provider-specific event payload.
    pub event: Option<Payload>,
    /// The transport that produced this event.
    pub transport: Option<Arc<dyn Transport>>,
}

impl MessageEvent {
    /// Creates an event that does not (yet) address the bot.
    pub fn new(
        full_text: impl Into<String>,
        channel: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            full_text: full_text.into(),
            channel: channel.into(),
            user: user.into(),
            ..Default::default()
        }
    }

    /// Creates an event already marked as a command with the given argument text.
    pub fn command(
        args_text: impl Into<String>,
        channel: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        let args_text = args_text.into();
        Self {
            full_text: args_text.clone(),
            channel: channel.into(),
            user: user.into(),
            is_command: true,
            args_text,
            ..Default::default()
        }
    }

    /// Applies the bot-address detection to `full_text`.
    ///
    /// When the prefix is present the event becomes a command and the text
    /// after the prefix is stored in `args_text`. Otherwise the event is left
    /// unaddressed.
    pub fn addressed(mut self, prefix: &AddressPrefix) -> Self {
        match prefix.strip(&self.full_text) {
            Some(args) => {
                self.args_text = args.to_string();
                self.is_command = true;
            }
            None => {
                self.args_text.clear();
                self.is_command = false;
            }
        }
        self
    }

    /// Attaches the provider payload.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.event = Some(Arc::new(payload));
        self
    }

    /// Attaches the originating transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Returns the provider payload if it is of type `T`.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.event.as_deref()?.downcast_ref()
    }

    /// Sends `text` back to this event's conversation through its transport.
    pub async fn reply(&self, text: &str) {
        match &self.transport {
            Some(transport) => transport.send(&self.channel, text).await,
            None => warn!(channel = %self.channel, "Event has no transport, reply dropped"),
        }
    }
}

impl std::fmt::Debug for MessageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageEvent")
            .field("full_text", &self.full_text)
            .field("channel", &self.channel)
            .field("user", &self.user)
            .field("is_command", &self.is_command)
            .field("args_text", &self.args_text)
            .field("input_text", &self.input_text)
            .field("has_payload", &self.event.is_some())
            .finish()
    }
}
