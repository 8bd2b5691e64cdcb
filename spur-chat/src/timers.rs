//! Poll timers tracked by abort handle.

use std::collections::HashMap;

use tokio::task::AbortHandle;

pub type TimerId = u64;

/// Poll timers owned by one poller.
///
/// Every timer still tracked here is aborted when the set is dropped.
#[derive(Debug, Default)]
pub struct TimerSet {
    next_id: TimerId,
    handles: HashMap<TimerId, AbortHandle>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> TimerId {
        self.next_id += 1;
        self.next_id
    }

    pub fn track(&mut self, id: TimerId, handle: AbortHandle) {
        self.handles.insert(id, handle);
    }

    /// Stop tracking a timer that is finishing on its own.
    ///
    /// Returns false when the timer was already cancelled.
    pub fn release(&mut self, id: TimerId) -> bool {
        self.handles.remove(&id).is_some()
    }

    /// Abort and forget every tracked timer, returning how many there were
    pub fn cancel_all(&mut self) -> usize {
        let count = self.handles.len();
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
