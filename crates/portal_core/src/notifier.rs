use std::fmt;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Presents one outcome message at a time. Calls are synchronous and nothing
/// is queued: a second call simply presents again.
pub trait Notifier: Send + Sync {
    fn show(&self, notice: &Notice);
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Error => error!(message = %notice.message, "notice"),
            kind => info!(%kind, message = %notice.message, "notice"),
        }
    }
}
