use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;
use crate::DEFAULT_TOAST_DURATION_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Success | Self::Warning | Self::Error => DEFAULT_TOAST_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibleToast {
    pub toast: ToastMessage,
    /// Auto-dismiss timer for this toast.
    pub timer: TimerId,
}

/// Single-slot transient message holder. A new message replaces the visible
/// one; nothing is queued.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationChannel {
    visible: Option<VisibleToast>,
}

impl NotificationChannel {
    pub fn visible(&self) -> Option<&ToastMessage> {
        self.visible.as_ref().map(|v| &v.toast)
    }

    pub fn timer(&self) -> Option<TimerId> {
        self.visible.as_ref().map(|v| v.timer)
    }

    /// Show `toast`, auto-dismissed by `timer`. Returns the timer of the toast
    /// it replaced, which the caller must cancel.
    pub fn show(&mut self, toast: ToastMessage, timer: TimerId) -> Option<TimerId> {
        self.visible
            .replace(VisibleToast { toast, timer })
            .map(|previous| previous.timer)
    }

    /// Dismiss the visible toast only if `timer` is its own auto-dismiss
    /// timer. Returns whether anything was dismissed.
    pub fn dismiss_if(&mut self, timer: TimerId) -> bool {
        if self.timer() == Some(timer) {
            self.visible = None;
            true
        } else {
            false
        }
    }

    /// Dismiss unconditionally, returning the timer to cancel.
    pub fn clear(&mut self) -> Option<TimerId> {
        self.visible.take().map(|v| v.timer)
    }
}
