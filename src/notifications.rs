//! Toast notification store.
//!
//! DESIGN
//! ======
//! The store owns the ordered list of visible notifications (insertion
//! order is display order) and, beside it, a map from notification id to
//! its pending dismissal timer. Both live in the store instance; dropping
//! the last clone of the store aborts every pending timer.
//!
//! The list is published through a `watch` channel, so subscribers always
//! read a complete snapshot. Each `add`/`dismiss` replaces the snapshot in
//! one step.
//!
//! Timers are tokio tasks on the caller's runtime. Outside a runtime a
//! notification is still added, but it stays until dismissed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;

pub const DEFAULT_DURATION_MS: u64 = 4000;

/// Presentation category of a notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub intent: Intent,
    /// Milliseconds until auto-dismiss; `Some(0)` stays until dismissed.
    pub duration: Option<u64>,
}

/// Parameters for [`NotificationStore::add`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewNotification {
    pub message: String,
    pub intent: Intent,
    /// `None` uses [`DEFAULT_DURATION_MS`].
    pub duration: Option<u64>,
}

impl NewNotification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = Some(duration_ms);
        self
    }
}

struct StoreInner {
    items: watch::Sender<Vec<Notification>>,
    timers: Mutex<HashMap<String, AbortHandle>>,
    fallback_seq: AtomicU64,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, timer) in timers.drain() {
            timer.abort();
        }
    }
}

/// Observable list of active notifications. Clones share the same list.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<StoreInner>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    #[must_use]
    pub fn new() -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(StoreInner {
                items,
                timers: Mutex::new(HashMap::new()),
                fallback_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Append a notification and return its id.
    pub fn add(&self, params: NewNotification) -> String {
        let requested = params.duration.unwrap_or(DEFAULT_DURATION_MS);
        let runtime = if requested > 0 {
            match Handle::try_current() {
                Ok(runtime) => Some(runtime),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        "no tokio runtime, notification will not auto-dismiss"
                    );
                    None
                }
            }
        } else {
            None
        };
        let duration = if runtime.is_some() { requested } else { 0 };
        let id = self.next_id();
        let notification = Notification {
            id: id.clone(),
            message: params.message,
            intent: params.intent,
            duration: Some(duration),
        };
        tracing::debug!(%id, intent = ?notification.intent, duration, "notification added");

        // Hold the timer map across the spawn so the timer cannot fire and
        // look itself up before it is registered.
        let mut timers = self.timers();
        self.inner.items.send_modify(|items| items.push(notification));
        if let Some(runtime) = runtime {
            let store = Arc::downgrade(&self.inner);
            let timer_id = id.clone();
            let task = runtime.spawn(async move {
                tokio::time::sleep(Duration::from_millis(duration)).await;
                expire(&store, &timer_id);
            });
            timers.insert(id.clone(), task.abort_handle());
        }
        id
    }

    /// Remove a notification and cancel its timer. Unknown ids are ignored.
    pub fn dismiss(&self, id: &str) {
        if let Some(timer) = self.timers().remove(id) {
            timer.abort();
        }
        self.remove(id);
    }

    pub fn notify_success(&self, message: impl Into<String>, duration: Option<u64>) -> String {
        self.add(NewNotification {
            message: message.into(),
            intent: Intent::Success,
            duration,
        })
    }

    pub fn notify_error(&self, message: impl Into<String>, duration: Option<u64>) -> String {
        self.add(NewNotification {
            message: message.into(),
            intent: Intent::Error,
            duration,
        })
    }

    /// Subscribe to list changes. The receiver starts at the current list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.items.subscribe()
    }

    /// Current list in display order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner.items.borrow().clone()
    }

    /// Number of dismissal timers still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers().len()
    }

    fn remove(&self, id: &str) {
        let removed = self.inner.items.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        });
        if removed {
            tracing::debug!(%id, "notification dismissed");
        }
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
        self.inner.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Random UUID from the OS source; time+counter base36 when unavailable.
    fn next_id(&self) -> String {
        let mut bytes = [0_u8; 16];
        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
            Err(error) => {
                tracing::debug!(%error, "os random source unavailable, using fallback id");
                let seq = self.inner.fallback_seq.fetch_add(1, Ordering::Relaxed);
                fallback_id(seq)
            }
        }
    }
}

/// Timer callback: forget the timer entry, then remove the notification.
fn expire(store: &Weak<StoreInner>, id: &str) {
    let Some(inner) = store.upgrade() else {
        return;
    };
    let store = NotificationStore { inner };
    store.timers().remove(id);
    store.remove(id);
}

/// Not collision-resistant; adequate for a handful of short-lived toasts.
fn fallback_id(seq: u64) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    format!("{}{}", to_base36(millis), to_base36(seq))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
#[path = "notifications_test.rs"]
mod tests;
