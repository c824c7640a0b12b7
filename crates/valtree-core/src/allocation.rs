//! Per-parse record of heap allocations.
//!
//! Every object the deserializer creates is recorded here once, in creation
//! order, before it is used for anything else. The log holds the object's
//! originating reference; references added by containment belong to the
//! container. Draining the log therefore releases exactly what the parse
//! itself allocated, whether the parse finished or failed halfway down.

use crate::heap::HeapFactory;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct AllocationLog {
    entries: Vec<Value>,
}

impl AllocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly allocated heap value. Non-heap values are ignored.
    pub fn record(&mut self, value: Value) {
        if value.is_heap() {
            self.entries.push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Release one logged value now and forget it, so the final drain does not
    /// release it a second time. Returns `false` if the value was not logged.
    pub fn release_entry<H: HeapFactory + ?Sized>(&mut self, heap: &mut H, value: Value) -> bool {
        if !value.is_heap() {
            return false;
        }
        // The value being dropped is almost always the newest entry.
        match self.entries.iter().rposition(|entry| *entry == value) {
            Some(index) => {
                let entry = self.entries.remove(index);
                heap.decref(entry);
                true
            }
            None => false,
        }
    }

    /// Release every logged value once, in creation order.
    pub fn release_all<H: HeapFactory + ?Sized>(&mut self, heap: &mut H) {
        for entry in self.entries.drain(..) {
            heap.decref(entry);
        }
    }
}
