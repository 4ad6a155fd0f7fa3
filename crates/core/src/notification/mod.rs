//! In-app notifications.

use chrono::{DateTime, Utc};
use pennywise_shared::types::{NotificationId, UserId};
use pennywise_shared::AppResult;
use serde::{Deserialize, Serialize};

use crate::resource::{Resource, required_text};

/// Longest accepted message.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Message shown after a profile update.
pub const PROFILE_UPDATED: &str = "Your profile was updated";

/// Message shown after a password change.
pub const PASSWORD_CHANGED: &str = "Your password was changed";

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID.
    #[serde(rename = "notificationID")]
    pub id: NotificationId,
    /// Recipient.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Message text.
    pub message: String,
    /// Whether the recipient has seen it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Concurrency token.
    pub version: i32,
}

/// Writable notification fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    /// Message text.
    pub message: String,
    /// Read flag.
    pub is_read: bool,
}

impl Resource for Notification {
    type Id = NotificationId;
    type Draft = NotificationDraft;

    const KIND: &'static str = "Notification";

    fn id(&self) -> NotificationId {
        self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn validate(draft: NotificationDraft) -> AppResult<NotificationDraft> {
        Ok(NotificationDraft {
            message: required_text("message", &draft.message, MAX_MESSAGE_CHARS)?,
            is_read: draft.is_read,
        })
    }
}
