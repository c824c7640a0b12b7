//! Runtime values produced by the reader.

/// Handle to an object in a [`HeapFactory`](crate::heap::HeapFactory).
///
/// The generation distinguishes a live object from an earlier occupant of the
/// same slot, so releasing a handle twice is detected instead of corrupting a
/// newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub index: usize,
    pub generation: u32,
}

/// A dynamically typed value.
///
/// `Str` and `Vector` are reference-counted heap handles; copying the enum does
/// not retain them. Ownership is tracked explicitly through
/// [`HeapFactory::incref`](crate::heap::HeapFactory::incref) and
/// [`HeapFactory::decref`](crate::heap::HeapFactory::decref).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Int(i64),
    Float(f64),
    Str(ObjRef),
    /// A vector, or a struct stored with the same container layout.
    Vector(ObjRef),
}

impl Value {
    /// The heap handle, if this value has heap identity.
    pub fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Str(obj) | Value::Vector(obj) => Some(*obj),
            Value::Nil | Value::Int(_) | Value::Float(_) => None,
        }
    }

    pub fn is_heap(&self) -> bool {
        self.as_obj().is_some()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}
