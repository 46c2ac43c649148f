use std::sync::Arc;

use tracing::info;

use repofeed_common::Comment;

use crate::bus::{EventBus, Subscription};

/// Topic carrying every newly created comment.
pub const COMMENT_ADDED: &str = "commentAdded";

/// Snapshot of a freshly persisted comment. Shared by value across subscribers.
#[derive(Debug, Clone)]
pub struct CommentAdded {
    pub comment: Arc<Comment>,
}

/// Translates domain mutations into bus events.
#[derive(Clone)]
pub struct NotificationDispatcher {
    bus: EventBus<CommentAdded>,
}

impl NotificationDispatcher {
    pub fn new(bus: EventBus<CommentAdded>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus<CommentAdded> {
        &self.bus
    }

    /// Publish exactly once. Zero listeners is not an error.
    pub fn notify_comment_added(&self, comment: Comment) -> usize {
        let repository_name = comment.repository_name.clone();
        let comment_id = comment.id;
        let delivered = self.bus.publish(
            COMMENT_ADDED,
            CommentAdded {
                comment: Arc::new(comment),
            },
        );
        info!(
            repository = %repository_name,
            comment_id,
            delivered,
            "Comment notification published"
        );
        delivered
    }

    /// Live comments for a single repository.
    pub fn comment_added(&self, repo_full_name: &str) -> Subscription<CommentAdded> {
        let wanted = repo_full_name.to_string();
        self.bus.subscribe(COMMENT_ADDED, move |event: &CommentAdded| {
            event.comment.repository_name == wanted
        })
    }
}
