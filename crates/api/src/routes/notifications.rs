//! Notification routes.

use std::sync::Arc;

use serde::Deserialize;
use validator::Validate;

use super::resources::{Payload, ResourceRoute};
use crate::AppState;
use pennywise_core::ResourceStore;
use pennywise_core::notification::{Notification, NotificationDraft};
use pennywise_shared::AppResult;
use pennywise_shared::types::{NotificationId, UserId};

/// Request body for creating or updating a notification.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Notification ID (required on update).
    #[serde(rename = "notificationID")]
    pub id: Option<NotificationId>,
    /// Owner (admin create only).
    #[serde(rename = "userID")]
    pub user_id: Option<UserId>,
    /// Message text.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub message: String,
    /// Read flag; unread when omitted.
    #[serde(default)]
    pub is_read: bool,
    /// Expected concurrency token.
    pub version: Option<i32>,
}

impl Payload<Notification> for NotificationPayload {
    fn body_id(&self) -> Option<NotificationId> {
        self.id
    }

    fn body_owner(&self) -> Option<UserId> {
        self.user_id
    }

    fn body_version(&self) -> Option<i32> {
        self.version
    }

    fn into_draft(self) -> AppResult<NotificationDraft> {
        Ok(NotificationDraft {
            message: self.message,
            is_read: self.is_read,
        })
    }
}

impl ResourceRoute for Notification {
    const PATH: &'static str = "notifications";

    type Payload = NotificationPayload;

    fn store(state: &AppState) -> Arc<dyn ResourceStore<Self>> {
        Arc::clone(&state.notifications)
    }
}
