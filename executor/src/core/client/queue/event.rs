use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::jobs::{JobEvent, ListenerId};

pub type JobEventListener = Box<dyn Fn(&JobEvent) + Send + Sync>;

type SharedListener = Arc<dyn Fn(&JobEvent) + Send + Sync>;

/// Registration table of queue wide event listeners.
#[derive(Default)]
pub struct JobEventBus {
    listeners: Mutex<BTreeMap<ListenerId, SharedListener>>,
    next_id: AtomicU64,
}

impl JobEventBus {
    pub fn subscribe(&self, listener: JobEventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).insert(id, Arc::from(listener));
        id
    }

    /// Returns whether a listener was registered under `id`.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).remove(&id).is_some()
    }

    /// Listeners run outside the lock, they may unsubscribe themselves.
    pub fn emit(&self, event: &JobEvent) {
        let listeners: Vec<SharedListener> =
            self.listeners.lock().unwrap_or_else(PoisonError::into_inner).values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
