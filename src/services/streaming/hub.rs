use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::broadcaster::{EventBroadcaster, ListenerId};
use super::event::SubmissionEvent;

type Registry = HashMap<String, Arc<EventBroadcaster>>;

/// Registry of per-submission broadcasters. Lock order is always registry
/// first, then broadcaster.
#[derive(Clone)]
pub(crate) struct StreamHub {
    registry: Arc<Mutex<Registry>>,
    capacity: usize,
}

impl StreamHub {
    pub(crate) fn new(listener_capacity: usize) -> Self {
        Self { registry: Arc::new(Mutex::new(HashMap::new())), capacity: listener_capacity.max(1) }
    }

    pub(crate) fn register(&self, submission_id: &str) -> Subscription {
        let mut registry = lock(&self.registry);
        let broadcaster = registry
            .entry(submission_id.to_string())
            .or_insert_with(|| Arc::new(EventBroadcaster::new(self.capacity)))
            .clone();
        let (listener_id, receiver) = broadcaster.listen();
        drop(registry);

        Subscription {
            submission_id: submission_id.to_string(),
            listener_id,
            receiver,
            broadcaster,
            registry: self.registry.clone(),
            detached: false,
        }
    }

    /// Dropped silently when nobody has registered for the submission.
    pub(crate) fn publish(&self, submission_id: &str, event: SubmissionEvent) -> usize {
        let broadcaster = lock(&self.registry).get(submission_id).cloned();
        match broadcaster {
            Some(broadcaster) => broadcaster.publish(&event),
            None => 0,
        }
    }

    pub(crate) fn close(&self, submission_id: &str) {
        let removed = lock(&self.registry).remove(submission_id);
        if let Some(broadcaster) = removed {
            broadcaster.close_all();
        }
    }

    pub(crate) fn listener_count(&self, submission_id: &str) -> usize {
        lock(&self.registry)
            .get(submission_id)
            .map(|broadcaster| broadcaster.listener_count())
            .unwrap_or(0)
    }
}

/// One listener on one submission. Dropping it unregisters from the hub.
pub(crate) struct Subscription {
    submission_id: String,
    listener_id: ListenerId,
    receiver: mpsc::Receiver<SubmissionEvent>,
    broadcaster: Arc<EventBroadcaster>,
    registry: Arc<Mutex<Registry>>,
    detached: bool,
}

impl Subscription {
    /// `None` once the hub closed the submission or this listener detached.
    pub(crate) async fn recv(&mut self) -> Option<SubmissionEvent> {
        self.receiver.recv().await
    }

    pub(crate) fn unregister(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;

        let mut registry = lock(&self.registry);
        self.broadcaster.unlisten(self.listener_id);

        let is_current = registry
            .get(&self.submission_id)
            .is_some_and(|current| Arc::ptr_eq(current, &self.broadcaster));
        if is_current && self.broadcaster.listener_count() == 0 {
            registry.remove(&self.submission_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
