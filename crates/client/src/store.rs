//! Single-slot publish/subscribe store.
//!
//! One [`Store`] holds the most recently received value of one entity
//! type (job stats, server list) and fans change notification out to
//! subscribed listeners. Stores are explicit constructed instances,
//! cloned and passed to whoever needs them; there is no global registry.
//!
//! Notification semantics: every `set` replaces the slot first, then
//! invokes each listener registered at that moment exactly once, with no
//! payload — listeners re-pull via `get`. The listener list is copied
//! before the pass, so a listener may unsubscribe itself (or anyone
//! else) without disturbing the ongoing notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Listener = Arc<dyn Fn() + Send + Sync + 'static>;
type ListenerList = Arc<Mutex<Vec<(u64, Listener)>>>;

struct Inner<T> {
    value: Mutex<T>,
    listeners: ListenerList,
    next_id: AtomicU64,
}

/// Subscribable holder of the latest value of one entity type.
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Default> Store<T> {
    /// A store holding `T::default()` until the first `set`.
    pub fn new() -> Self {
        Self::with_value(T::default())
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Store<T> {
    pub fn with_value(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(value),
                listeners: Arc::new(Mutex::new(Vec::new())),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current value. Never blocks on I/O; the clone happens under a
    /// short-lived lock.
    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Replace the held value, then notify every listener.
    pub fn set(&self, value: T) {
        *self.inner.value.lock() = value;

        // Copy-on-notify: the lock is released before any listener runs.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Register a change listener. Every call yields an independent
    /// registration; subscribing the same closure twice means two
    /// notifications per `set`. The listener stays registered for the
    /// store's lifetime unless the returned [`Subscription`] is used to
    /// remove it.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.inner.listeners),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Registration token returned by [`Store::subscribe`]. Removing a
/// listener is explicit; dropping the token leaves it registered.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Vec<(u64, Listener)>>>,
}

impl Subscription {
    /// Remove exactly the listener this token was issued for. Calling it
    /// again (or after the store is gone) is harmless.
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
