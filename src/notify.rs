//! User-facing failure notifications
//!
//! The error interceptor turns every failed request into a [`Notification`]
//! and hands it to a [`NotificationSink`] (toast queue, log, ...).

use crate::error::{ErrorKind, HttpError};
use backoffice_shared::ErrorBody;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status, `0` when no response was received
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: ErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status,
            request_id: None,
            raised_at: Utc::now(),
        }
    }

    /// Prefers the backend's `message` field, then the kind's default text.
    pub fn from_error(error: &HttpError) -> Self {
        let kind = error.kind();
        let message = error
            .body()
            .and_then(|body| serde_json::from_str::<ErrorBody>(body).ok())
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| kind.default_message().to_string());
        Self::new(kind, message, error.status())
    }

    pub fn with_request_id(mut self, id: Uuid) -> Self {
        self.request_id = Some(id);
        self
    }
}

pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

/// Writes each notification as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.kind {
            ErrorKind::ServerFailure | ErrorKind::NetworkFailure => tracing::error!(
                code = n.kind.error_code(),
                status = n.status,
                request_id = ?n.request_id,
                "{}",
                n.message
            ),
            _ => tracing::warn!(
                code = n.kind.error_code(),
                status = n.status,
                request_id = ?n.request_id,
                "{}",
                n.message
            ),
        }
    }
}

/// Keeps notifications in memory until the UI drains them. Clones share
/// the same queue.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries.borrow_mut().push(notification);
    }
}
