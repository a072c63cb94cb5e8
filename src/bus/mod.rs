// ABOUTME: Typed publish/subscribe bus relaying messages between extension contexts
// ABOUTME: Fire-and-forget delivery over a tokio broadcast channel, no business logic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Cross-Context Bus
//!
//! The background process, the popup and page overlays exchange the
//! messages defined by [`ExtensionMessage`]. The bus only relays: deciding
//! what a message means is the job of whoever subscribes.
//!
//! Delivery is at most once per subscriber per publish. A subscriber that
//! falls more than the channel capacity behind loses the oldest messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::constants::bus::EVENT_CHANNEL_CAPACITY;
use crate::models::{AuthState, Theme};

/// Message exchanged between extension contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionMessage {
    /// Another context changed the auth state
    AuthStateChange {
        /// New state
        #[serde(rename = "authState")]
        auth_state: AuthState,
    },
    /// The web app signed in and relayed its session
    SessionUpdate {
        /// Session object from the web app, carrying `user` or at least `{email}`
        session: Value,
        /// Bearer token for that session
        #[serde(rename = "jwtToken")]
        jwt_token: String,
    },
    /// The session is gone
    SessionClear,
    /// Request for a fresh token; answered with `{success, token?}`
    RefreshToken,
    /// Usage counters changed, listeners should re-fetch
    RefreshUsage,
    /// Theme preference changed
    ThemeChange {
        /// New theme
        theme: Theme,
    },
    /// A refresh produced a new token
    TokenRefreshed {
        /// The new token
        token: String,
    },
}

/// Discriminant of [`ExtensionMessage`], used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// `AUTH_STATE_CHANGE`
    AuthStateChange,
    /// `SESSION_UPDATE`
    SessionUpdate,
    /// `SESSION_CLEAR`
    SessionClear,
    /// `REFRESH_TOKEN`
    RefreshToken,
    /// `REFRESH_USAGE`
    RefreshUsage,
    /// `THEME_CHANGE`
    ThemeChange,
    /// `TOKEN_REFRESHED`
    TokenRefreshed,
}

impl EventType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthStateChange => "AUTH_STATE_CHANGE",
            Self::SessionUpdate => "SESSION_UPDATE",
            Self::SessionClear => "SESSION_CLEAR",
            Self::RefreshToken => "REFRESH_TOKEN",
            Self::RefreshUsage => "REFRESH_USAGE",
            Self::ThemeChange => "THEME_CHANGE",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ExtensionMessage {
    /// Discriminant of this message
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::AuthStateChange { .. } => EventType::AuthStateChange,
            Self::SessionUpdate { .. } => EventType::SessionUpdate,
            Self::SessionClear => EventType::SessionClear,
            Self::RefreshToken => EventType::RefreshToken,
            Self::RefreshUsage => EventType::RefreshUsage,
            Self::ThemeChange { .. } => EventType::ThemeChange,
            Self::TokenRefreshed { .. } => EventType::TokenRefreshed,
        }
    }
}

/// Broadcast bus shared by every component of the background process
#[derive(Debug, Clone)]
pub struct CrossContextBus {
    sender: broadcast::Sender<ExtensionMessage>,
}

impl Default for CrossContextBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossContextBus {
    /// Bus with the default channel capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    /// Bus whose subscribers may lag by at most `capacity` messages
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send to every current subscriber. Returns how many received it;
    /// zero subscribers is not an error.
    pub fn publish(&self, message: ExtensionMessage) -> usize {
        let event_type = message.event_type();
        match self.sender.send(message) {
            Ok(receivers) => {
                debug!(%event_type, receivers, "Published bus message");
                receivers
            }
            Err(_) => {
                debug!(%event_type, "Published bus message with no subscribers");
                0
            }
        }
    }

    /// Receive only messages of `event_type`
    #[must_use]
    pub fn subscribe(&self, event_type: EventType) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter: Some(event_type),
        }
    }

    /// Receive every message
    #[must_use]
    pub fn subscribe_all(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter: None,
        }
    }

    /// Run `handler` for each message of `event_type` on a spawned task.
    ///
    /// The task ends when the bus is dropped or the handle is aborted.
    pub fn subscribe_with<F>(&self, event_type: EventType, handler: F) -> JoinHandle<()>
    where
        F: Fn(ExtensionMessage) + Send + 'static,
    {
        let mut subscription = self.subscribe(event_type);
        tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                handler(message);
            }
        })
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving half of a bus subscription
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ExtensionMessage>,
    filter: Option<EventType>,
}

impl Subscription {
    /// Next matching message, or `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<ExtensionMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.matches(&message) => return Some(message),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Bus subscriber lagged, messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching message already queued, without waiting
    pub fn try_recv(&mut self) -> Option<ExtensionMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) if self.matches(&message) => return Some(message),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }

    fn matches(&self, message: &ExtensionMessage) -> bool {
        self.filter
            .is_none_or(|event_type| message.event_type() == event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format_uses_type_tag() {
        let message = ExtensionMessage::SessionUpdate {
            session: json!({"email": "reader@example.com"}),
            jwt_token: "tok".to_owned(),
        };
        let wire = serde_json::to_value(&message).unwrap();
        assert_eq!(wire["type"], "SESSION_UPDATE");
        assert_eq!(wire["jwtToken"], "tok");

        let parsed: ExtensionMessage =
            serde_json::from_value(json!({"type": "THEME_CHANGE", "theme": "dark"})).unwrap();
        assert_eq!(parsed, ExtensionMessage::ThemeChange { theme: Theme::Dark });

        let cleared: ExtensionMessage =
            serde_json::from_value(json!({"type": "SESSION_CLEAR"})).unwrap();
        assert_eq!(cleared.event_type(), EventType::SessionClear);
    }

    #[test]
    fn auth_state_change_normalizes_state() {
        let parsed: ExtensionMessage = serde_json::from_value(json!({
            "type": "AUTH_STATE_CHANGE",
            "authState": {"isLoggedIn": true, "token": "tok", "user": null}
        }))
        .unwrap();
        let ExtensionMessage::AuthStateChange { auth_state } = parsed else {
            panic!("wrong variant");
        };
        assert!(!auth_state.is_logged_in());
    }

    #[tokio::test]
    async fn filtered_subscription_skips_other_types() {
        let bus = CrossContextBus::new();
        let mut usage = bus.subscribe(EventType::RefreshUsage);
        let mut all = bus.subscribe_all();

        bus.publish(ExtensionMessage::SessionClear);
        bus.publish(ExtensionMessage::RefreshUsage);

        assert_eq!(usage.recv().await, Some(ExtensionMessage::RefreshUsage));
        assert_eq!(usage.try_recv(), None);
        assert_eq!(all.try_recv(), Some(ExtensionMessage::SessionClear));
        assert_eq!(all.try_recv(), Some(ExtensionMessage::RefreshUsage));
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = CrossContextBus::new();
        assert_eq!(bus.publish(ExtensionMessage::RefreshUsage), 0);
    }
}
