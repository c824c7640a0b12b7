//! Reference-counted storage for strings and containers.
//!
//! [`HeapFactory`] is the allocation interface the deserializer is written
//! against. [`RefHeap`] is the bundled implementation: a slab of
//! generation-checked slots that destroys an object when its count drops to
//! zero and releases the object's children in turn.
//!
//! `RefHeap` counts every allocation, destruction and stale-handle operation in
//! [`HeapStats`], which is what the leak tests assert on.

use crate::types::TypeId;
use crate::value::{ObjRef, Value};

/// Allocation and reference-count operations used while building values.
///
/// A freshly allocated object starts with one reference, owned by whoever
/// asked for it. [`push`](HeapFactory::push) stores a value without retaining
/// it; callers retain first when the container should co-own the child.
pub trait HeapFactory {
    fn new_string(&mut self, text: &str) -> ObjRef;

    /// Allocate an empty container with room for `len` elements.
    fn new_container(&mut self, len: usize, ty: TypeId) -> ObjRef;

    fn push(&mut self, container: ObjRef, value: Value);

    /// Add one reference. No-op for values without heap identity.
    fn incref(&mut self, value: &Value);

    /// Drop one reference, destroying the object when none remain.
    /// No-op for values without heap identity.
    fn decref(&mut self, value: Value);
}

/// A heap object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Str(String),
    Container { ty: TypeId, elems: Vec<Value> },
}

/// Lifetime counters for a [`RefHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
    pub allocated: u64,
    pub destroyed: u64,
    /// Operations on handles whose object was already destroyed.
    pub stale_handles: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    refs: u32,
    object: Option<Object>,
}

#[derive(Debug, Default)]
pub struct RefHeap {
    slots: Vec<Slot>,
    free: Vec<usize>,
    stats: HeapStats,
}

impl RefHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Number of objects currently alive.
    pub fn live_objects(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    /// Reference count of a live object, `None` for stale handles.
    pub fn refcount(&self, obj: ObjRef) -> Option<u32> {
        self.slot(obj).map(|s| s.refs)
    }

    pub fn get(&self, obj: ObjRef) -> Option<&Object> {
        self.slot(obj).and_then(|s| s.object.as_ref())
    }

    pub fn string(&self, obj: ObjRef) -> Option<&str> {
        match self.get(obj)? {
            Object::Str(s) => Some(s),
            Object::Container { .. } => None,
        }
    }

    pub fn elements(&self, obj: ObjRef) -> Option<&[Value]> {
        match self.get(obj)? {
            Object::Container { elems, .. } => Some(elems),
            Object::Str(_) => None,
        }
    }

    pub fn container_type(&self, obj: ObjRef) -> Option<TypeId> {
        match self.get(obj)? {
            Object::Container { ty, .. } => Some(*ty),
            Object::Str(_) => None,
        }
    }

    fn alloc(&mut self, object: Object) -> ObjRef {
        self.stats.allocated += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.refs = 1;
            slot.object = Some(object);
            return ObjRef {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            refs: 1,
            object: Some(object),
        });
        ObjRef {
            index,
            generation: 0,
        }
    }

    fn slot(&self, obj: ObjRef) -> Option<&Slot> {
        self.slots
            .get(obj.index)
            .filter(|s| s.generation == obj.generation && s.object.is_some())
    }

    fn slot_mut(&mut self, obj: ObjRef) -> Option<&mut Slot> {
        self.slots
            .get_mut(obj.index)
            .filter(|s| s.generation == obj.generation && s.object.is_some())
    }

    fn stale(&mut self, obj: ObjRef, op: &str) {
        self.stats.stale_handles += 1;
        tracing::warn!(index = obj.index, generation = obj.generation, op, "stale heap handle");
    }
}

impl HeapFactory for RefHeap {
    fn new_string(&mut self, text: &str) -> ObjRef {
        self.alloc(Object::Str(text.to_owned()))
    }

    fn new_container(&mut self, len: usize, ty: TypeId) -> ObjRef {
        self.alloc(Object::Container {
            ty,
            elems: Vec::with_capacity(len),
        })
    }

    fn push(&mut self, container: ObjRef, value: Value) {
        match self.slot_mut(container).and_then(|s| s.object.as_mut()) {
            Some(Object::Container { elems, .. }) => elems.push(value),
            Some(Object::Str(_)) => {
                tracing::warn!(index = container.index, "push onto a string object ignored");
            }
            None => self.stale(container, "push"),
        }
    }

    fn incref(&mut self, value: &Value) {
        let Some(obj) = value.as_obj() else {
            return;
        };
        match self.slot_mut(obj) {
            Some(slot) => slot.refs += 1,
            None => self.stale(obj, "incref"),
        }
    }

    fn decref(&mut self, value: Value) {
        // Children of destroyed containers go on a worklist so teardown depth
        // does not depend on nesting depth.
        let mut pending = vec![value];
        while let Some(value) = pending.pop() {
            let Some(obj) = value.as_obj() else {
                continue;
            };
            let Some(slot) = self.slot_mut(obj) else {
                self.stale(obj, "decref");
                continue;
            };
            slot.refs -= 1;
            if slot.refs > 0 {
                continue;
            }
            let object = slot.object.take();
            // A slot whose generation is exhausted is retired, never reused.
            if let Some(generation) = slot.generation.checked_add(1) {
                slot.generation = generation;
                self.free.push(obj.index);
            }
            self.stats.destroyed += 1;
            tracing::trace!(index = obj.index, "destroyed heap object");
            if let Some(Object::Container { elems, .. }) = object {
                pending.extend(elems);
            }
        }
    }
}
