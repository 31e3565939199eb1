//! Personal notifications rendered from templates.

use crate::marketplace::domain::UserId;
use crate::realtime::domain::{Channel, EventKind, OutboundEvent};
use minijinja::Environment;
use serde_json::{Map, Value};
use tracing::warn;

/// Kinds of personal notification pushed on `user_<id>` channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A bid was placed on the user's task.
    NewBid,
    /// The user's open task is nearing its deadline.
    DeadlineApproaching,
    /// A chat message was addressed to the user.
    NewMessage,
}

impl NotificationKind {
    /// Returns the wire name carried in the payload's `kind` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewBid => "new_bid",
            Self::DeadlineApproaching => "deadline_approaching",
            Self::NewMessage => "new_message",
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::NewBid => "New bid of {{ amount }} on \"{{ title }}\"",
            Self::DeadlineApproaching => {
                "\"{{ title }}\" is due {{ deadline }} and has {{ bid_count }} bid(s)"
            }
            Self::NewMessage => "New message on \"{{ title }}\"",
        }
    }
}

/// Builds a `notification` event for `recipient`.
///
/// `context` supplies template variables and is embedded in the payload.
/// A template failure is logged and the notification falls back to its
/// kind name.
#[must_use]
pub fn notification(
    recipient: UserId,
    kind: NotificationKind,
    context: Map<String, Value>,
) -> OutboundEvent {
    let message = Environment::new()
        .render_str(kind.template(), &context)
        .unwrap_or_else(|error| {
            warn!(kind = kind.as_str(), %error, "notification template failed to render");
            kind.as_str().to_owned()
        });
    let mut payload = context;
    payload.insert("kind".to_owned(), Value::String(kind.as_str().to_owned()));
    payload.insert("message".to_owned(), Value::String(message));
    OutboundEvent::new(
        Channel::User(recipient),
        EventKind::Notification,
        Value::Object(payload),
    )
}
