//! Toast notifications
//!
//! Every user-triggered action reports its outcome as a short titled toast.
//! The [`Notifier`] collects them so a front end (or a test) can drain and
//! display them.

use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: &str, description: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            description: description.map(str::to_string),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(title: &str, description: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            description: description.map(str::to_string),
            variant: ToastVariant::Destructive,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

/// Shared, clonable toast queue.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<Vec<Toast>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, toast: Toast) {
        if toast.is_error() {
            tracing::warn!(title = %toast.title, description = ?toast.description, "toast");
        } else {
            tracing::info!(title = %toast.title, "toast");
        }
        self.lock().push(toast);
    }

    pub fn success(&self, title: &str, description: Option<&str>) {
        self.push(Toast::success(title, description));
    }

    pub fn error(&self, title: &str, description: Option<&str>) {
        self.push(Toast::error(title, description));
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.lock())
    }

    pub fn last(&self) -> Option<Toast> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock leaves the queue itself intact.
    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
