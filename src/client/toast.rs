//! Transient user notifications

use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

/// Notification queue drained by whatever renders them
#[derive(Debug, Default)]
pub struct Toaster {
    queue: RwLock<Vec<Toast>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, toast: Toast) {
        self.queue.write().await.push(toast);
    }

    pub async fn success(&self, title: &str, description: impl Into<String>) {
        self.push(Toast {
            title: title.to_string(),
            description: description.into(),
            variant: ToastVariant::Default,
        })
        .await;
    }

    pub async fn error(&self, title: &str, description: impl Into<String>) {
        self.push(Toast {
            title: title.to_string(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        })
        .await;
    }

    /// Take every pending toast, oldest first
    pub async fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.queue.write().await)
    }
}
