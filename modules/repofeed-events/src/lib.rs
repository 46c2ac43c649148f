//! In-process publish/subscribe for live API notifications.
//!
//! `EventBus` is a topic-keyed broker: each subscriber registers a filter
//! predicate and gets its own bounded channel, so a slow consumer only ever
//! loses its own oldest events. `NotificationDispatcher` turns domain
//! mutations into bus events.

pub mod bus;
pub mod notify;

pub use bus::{EventBus, Subscription, SubscriptionId, DEFAULT_SUBSCRIBER_BUFFER};
pub use notify::{CommentAdded, NotificationDispatcher, COMMENT_ADDED};
