use crate::model::LAST_UPDATE_KEY;
use crate::store::Store;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};

/// Bound on undrained hints per view. Hints are lossy: dropping the oldest
/// is safe because any surviving hint triggers a full re-read of the named
/// collection.
const MAX_PENDING_HINTS: usize = 256;

/// A payload-free hint that the collection under `key` changed. Consumers
/// must re-read the collection through the store contract; the event never
/// carries a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
}

/// Post-commit change fanout across registered views.
///
/// Each view owns a queue of pending hints, drained by its next poll. A
/// publish stamps the `last-update` marker in the store, then enqueues one
/// hint per changed key (plus one for the marker key) into every queue
/// except the origin view's: a view never observes its own write as a
/// remote notification.
#[derive(Default)]
pub struct UpdateBus {
    queues: HashMap<String, VecDeque<ChangeEvent>>,
}

impl UpdateBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a view. Re-registering discards any pending hints.
    pub fn register(&mut self, view: &str) {
        self.queues.insert(view.to_string(), VecDeque::new());
    }

    pub fn unregister(&mut self, view: &str) -> bool {
        self.queues.remove(view).is_some()
    }

    pub fn is_registered(&self, view: &str) -> bool {
        self.queues.contains_key(view)
    }

    /// Publishes change hints for `keys`. Must run strictly after the
    /// collection writes have committed to the store.
    pub fn publish(
        &mut self,
        store: &mut dyn Store,
        origin: Option<&str>,
        keys: &[&str],
    ) -> anyhow::Result<()> {
        let marker = Utc::now().timestamp_millis().to_string();
        store.set_item(LAST_UPDATE_KEY, &marker)?;

        for (view, queue) in self.queues.iter_mut() {
            if origin == Some(view.as_str()) {
                continue;
            }
            for key in keys.iter().chain(std::iter::once(&LAST_UPDATE_KEY)) {
                if queue.len() == MAX_PENDING_HINTS {
                    queue.pop_front();
                }
                queue.push_back(ChangeEvent {
                    key: (*key).to_string(),
                });
            }
        }
        Ok(())
    }

    /// Drains every pending hint for `view`, oldest first. Unknown views
    /// drain empty.
    pub fn drain(&mut self, view: &str) -> Vec<ChangeEvent> {
        match self.queues.get_mut(view) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }
}
