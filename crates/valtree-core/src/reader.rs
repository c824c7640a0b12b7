//! Entry points for reading a complete value from text.

use crate::deserializer::Deserializer;
use crate::error::ParseResult;
use crate::heap::HeapFactory;
use crate::types::{TypeId, TypeResolver};
use crate::value::Value;

/// Parse `text` as a single value of type `ty`.
///
/// On success the returned value owns exactly one reference, which the caller
/// must eventually release with [`HeapFactory::decref`]. On failure every
/// object allocated during the attempt has already been released.
pub fn parse_value<H, R>(heap: &mut H, types: &R, ty: TypeId, text: &str) -> ParseResult<Value>
where
    H: HeapFactory + ?Sized,
    R: TypeResolver + ?Sized,
{
    tracing::debug!(len = text.len(), ty = %ty, "parsing value");
    let mut de = Deserializer::new(text, heap, types)?;
    let value = de.parse_one(ty)?;
    de.retain(&value);
    Ok(value)
}

/// Parse `text` as a single value of type `ty`, reporting failure in-band.
///
/// Returns `(value, None)` on success and `(Value::Nil, Some(message))` on a
/// syntax error. Exactly one half of the pair is meaningful. Reference
/// ownership is as for [`parse_value`].
pub fn parse_text<H, R>(heap: &mut H, types: &R, ty: TypeId, text: &str) -> (Value, Option<String>)
where
    H: HeapFactory + ?Sized,
    R: TypeResolver + ?Sized,
{
    match parse_value(heap, types, ty, text) {
        Ok(value) => (value, None),
        Err(err) => {
            tracing::debug!(error = %err, "parse failed");
            (Value::Nil, Some(err.to_string()))
        }
    }
}
