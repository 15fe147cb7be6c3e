//! Collaborators the store reports to: a notification sink for operation
//! outcomes and an appearance hook for the dark-mode flag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Sends notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => tracing::info!("{}", message),
            NoticeKind::Error => tracing::error!("{}", message),
        }
    }
}

/// Keeps the most recent notices for a status line.
#[derive(Debug)]
pub struct NoticeLog {
    notices: Mutex<VecDeque<Notice>>,
    capacity: usize,
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl NoticeLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notices: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn latest(&self) -> Option<Notice> {
        self.lock().back().cloned()
    }

    pub fn all(&self) -> Vec<Notice> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notice>> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NotificationSink for NoticeLog {
    fn notify(&self, kind: NoticeKind, message: &str) {
        tracing::debug!(?kind, "{}", message);
        let mut notices = self.lock();
        if notices.len() == self.capacity {
            notices.pop_front();
        }
        notices.push_back(Notice {
            kind,
            message: message.to_string(),
        });
    }
}

/// Presentation hook for the dark-mode flag.
pub trait Appearance: Send + Sync {
    fn apply_dark_mode(&self, enabled: bool);
}

/// No presentation attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAppearance;

impl Appearance for NoAppearance {
    fn apply_dark_mode(&self, _enabled: bool) {}
}

/// Dark-mode flag shared with a renderer that polls it every frame.
#[derive(Debug, Default, Clone)]
pub struct SharedTheme {
    dark: Arc<AtomicBool>,
}

impl SharedTheme {
    pub fn is_dark(&self) -> bool {
        self.dark.load(Ordering::Relaxed)
    }
}

impl Appearance for SharedTheme {
    fn apply_dark_mode(&self, enabled: bool) {
        self.dark.store(enabled, Ordering::Relaxed);
    }
}
