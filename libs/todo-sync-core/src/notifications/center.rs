use super::classify::{classify_failure, ErrorNotice, Failure};
use crate::config::NotificationConfig;
use crate::messages::{Catalog, MessageKey};
use crate::observability::record_notification;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::sync::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }

    const fn default_title_key(self) -> MessageKey {
        match self {
            Self::Success => MessageKey::TitleSuccess,
            Self::Error => MessageKey::TitleError,
            Self::Info => MessageKey::TitleInfo,
            Self::Warning => MessageKey::TitleWarning,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, time-ordered notification identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(String);

impl NotificationId {
    fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A notification before it has been assigned an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub message: String,
    pub title: Option<String>,
    /// Auto-dismiss delay; `None` (or zero) keeps it until dismissed
    pub duration: Option<Duration>,
}

impl NewNotification {
    pub fn new(kind: NotificationType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            title: None,
            duration: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A queued notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationType,
    pub message: String,
    pub title: Option<String>,
    pub duration: Option<Duration>,
    pub created_at: DateTime<Utc>,
}

struct Inner {
    config: NotificationConfig,
    catalog: Catalog,
    queue: Mutex<VecDeque<Notification>>,
    recent_errors: Cache<String, ()>,
    timers: DashMap<NotificationId, JoinHandle<()>>,
    updates: watch::Sender<Vec<Notification>>,
}

impl Inner {
    fn publish(&self, queue: &VecDeque<Notification>) {
        self.updates.send_replace(queue.iter().cloned().collect());
    }

    fn cancel_timer(&self, id: &NotificationId) {
        if let Some((_, handle)) = self.timers.remove(id) {
            handle.abort();
        }
    }

    fn remove(&self, id: &NotificationId) -> bool {
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|n| &n.id != id);
        let removed = queue.len() != before;
        if removed {
            self.publish(&queue);
        }
        removed
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
    }
}

/// Bounded queue of user notifications
///
/// Cloning yields another handle to the same queue. Construct one at
/// application start and pass it to every producer.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("config", &self.inner.config)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl NotificationCenter {
    /// Create a notification center
    #[must_use]
    pub fn new(config: NotificationConfig, catalog: Catalog) -> Self {
        let recent_errors = Cache::builder()
            .time_to_live(config.dedup_window())
            .build();
        let (updates, _) = watch::channel(Vec::new());

        Self {
            inner: Arc::new(Inner {
                config,
                catalog,
                queue: Mutex::new(VecDeque::new()),
                recent_errors,
                timers: DashMap::new(),
                updates,
            }),
        }
    }

    /// Create a notification center with default settings and English texts
    #[must_use]
    pub fn new_default() -> Self {
        Self::new(NotificationConfig::default(), Catalog::default())
    }

    #[must_use]
    pub fn config(&self) -> &NotificationConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.inner.catalog
    }

    /// Enqueue a notification and return its id
    ///
    /// An error whose message was shown within the de-dup window is not
    /// enqueued again; a fresh id is still returned. When the queue is full
    /// the oldest entry is evicted first.
    pub fn add(&self, notification: NewNotification) -> NotificationId {
        let id = NotificationId::generate();
        let kind = notification.kind;

        if kind == NotificationType::Error {
            let first = self
                .inner
                .recent_errors
                .entry(notification.message.clone())
                .or_insert(())
                .is_fresh();
            if !first {
                warn!(message = %notification.message, "Suppressing duplicate error notification");
                record_notification(kind.as_str(), true);
                return id;
            }
        }

        let duration = notification.duration.filter(|d| !d.is_zero());
        let entry = Notification {
            id: id.clone(),
            kind,
            message: notification.message,
            title: notification.title,
            duration,
            created_at: Utc::now(),
        };

        {
            let mut queue = self.inner.queue.lock();
            while queue.len() >= self.inner.config.max_notifications.max(1) {
                if let Some(evicted) = queue.pop_front() {
                    debug!(id = %evicted.id, "Evicting oldest notification");
                    self.inner.cancel_timer(&evicted.id);
                }
            }
            queue.push_back(entry);
            self.inner.publish(&queue);
        }
        record_notification(kind.as_str(), false);

        if let Some(duration) = duration {
            self.schedule_expiry(id.clone(), duration);
        }

        id
    }

    fn schedule_expiry(&self, id: NotificationId, duration: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%id, "No async runtime; notification will not auto-dismiss");
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer_id = id.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.timers.remove(&timer_id);
                if inner.remove(&timer_id) {
                    debug!(id = %timer_id, "Notification expired");
                }
            }
        });
        self.inner.timers.insert(id, handle);
    }

    /// Remove a notification; unknown ids are ignored
    pub fn remove(&self, id: &NotificationId) {
        self.inner.cancel_timer(id);
        self.inner.remove(id);
    }

    fn show(
        &self,
        kind: NotificationType,
        message: String,
        title: Option<&str>,
        duration: Option<Duration>,
        default_ms: u64,
    ) -> NotificationId {
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| self.inner.catalog.text(kind.default_title_key()).to_string());
        self.add(NewNotification {
            kind,
            message,
            title: Some(title),
            duration: Some(duration.unwrap_or(Duration::from_millis(default_ms))),
        })
    }

    /// Show a success message (default 3 s)
    pub fn show_success(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> NotificationId {
        let default_ms = self.inner.config.success_duration_ms;
        self.show(NotificationType::Success, message.into(), title, duration, default_ms)
    }

    /// Show an error message (default 5 s, de-duplicated)
    pub fn show_error(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> NotificationId {
        let default_ms = self.inner.config.error_duration_ms;
        self.show(NotificationType::Error, message.into(), title, duration, default_ms)
    }

    /// Show an informational message (default 4 s)
    pub fn show_info(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> NotificationId {
        let default_ms = self.inner.config.info_duration_ms;
        self.show(NotificationType::Info, message.into(), title, duration, default_ms)
    }

    /// Show a warning (default 4 s)
    pub fn show_warning(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> NotificationId {
        let default_ms = self.inner.config.warning_duration_ms;
        self.show(NotificationType::Warning, message.into(), title, duration, default_ms)
    }

    /// Classify a failure and show it as an error notification
    pub fn notify_failure<'a>(&self, failure: impl Into<Failure<'a>>) -> ErrorNotice {
        let notice = classify_failure(failure.into());
        self.show_error(notice.message.clone(), Some(&notice.title), None);
        notice
    }

    /// Snapshot of the queue, oldest first
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.queue.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Receive the queue contents every time they change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.updates.subscribe()
    }

    /// Cancel pending expiry timers and clear the queue
    pub fn shutdown(&self) {
        let ids: Vec<NotificationId> = self.inner.timers.iter().map(|e| e.key().clone()).collect();
        for id in &ids {
            self.inner.cancel_timer(id);
        }
        let mut queue = self.inner.queue.lock();
        queue.clear();
        self.inner.publish(&queue);
        self.inner.recent_errors.invalidate_all();
        debug!(cancelled_timers = ids.len(), "Notification center shut down");
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new_default()
    }
}
