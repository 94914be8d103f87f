use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};

use super::event::SubmissionEvent;

pub(crate) type ListenerId = u64;

/// Fan-out for a single submission. Every listener owns a bounded queue;
/// a full queue drops the event for that listener only.
pub(crate) struct EventBroadcaster {
    listeners: Mutex<HashMap<ListenerId, mpsc::Sender<SubmissionEvent>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl EventBroadcaster {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { listeners: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1), capacity }
    }

    pub(crate) fn listen(&self) -> (ListenerId, mpsc::Receiver<SubmissionEvent>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, tx);
        (id, rx)
    }

    /// Removes the listener and closes its queue. Returns `false` if it was
    /// already gone.
    pub(crate) fn unlisten(&self, id: ListenerId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Returns how many listeners received the event.
    pub(crate) fn publish(&self, event: &SubmissionEvent) -> usize {
        let listeners = self.lock();
        let mut delivered = 0;

        for (id, sender) in listeners.iter() {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    metrics::counter!("stream_events_dropped_total", "kind" => event.kind())
                        .increment(1);
                    tracing::debug!(listener = id, kind = event.kind(), "Listener queue full");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }

        delivered
    }

    pub(crate) fn close_all(&self) {
        self.lock().clear();
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ListenerId, mpsc::Sender<SubmissionEvent>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
