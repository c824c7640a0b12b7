//! Encoder: heap values back into the text format the reader accepts.
//!
//! The output re-reads to an equal value when parsed against the type the
//! value was built with:
//!
//! - floats always carry a `.` or an exponent, so they never re-read as ints
//! - strings are quoted and escaped
//! - containers whose type is a struct are written `Name{...}`, others `[...]`
//!
//! # Example
//! ```
//! use valtree_core::{encode, parse_value, HeapFactory, RefHeap, TypeRegistry};
//!
//! let mut heap = RefHeap::new();
//! let mut types = TypeRegistry::new();
//! let ty = types.parse_type("[float]").unwrap();
//! let value = parse_value(&mut heap, &types, ty, "[1.5, -2.0]").unwrap();
//! assert_eq!(encode(&heap, &types, &value).unwrap(), "[1.5, -2.0]");
//! heap.decref(value);
//! ```

use crate::error::{Result, ValtreeError};
use crate::heap::{Object, RefHeap};
use crate::types::{Shape, TypeResolver};
use crate::value::Value;

/// Encode a value on a single line.
pub fn encode<R: TypeResolver + ?Sized>(heap: &RefHeap, types: &R, value: &Value) -> Result<String> {
    let mut out = String::new();
    Encoder {
        heap,
        types,
        pretty: false,
    }
    .value(value, 0, &mut out)?;
    Ok(out)
}

/// Encode a value with one container element per line, indented two spaces
/// per level. Line breaks act as the element separators.
pub fn encode_pretty<R: TypeResolver + ?Sized>(
    heap: &RefHeap,
    types: &R,
    value: &Value,
) -> Result<String> {
    let mut out = String::new();
    Encoder {
        heap,
        types,
        pretty: true,
    }
    .value(value, 0, &mut out)?;
    Ok(out)
}

struct Encoder<'a, R: ?Sized> {
    heap: &'a RefHeap,
    types: &'a R,
    pretty: bool,
}

impl<R: TypeResolver + ?Sized> Encoder<'_, R> {
    fn value(&self, value: &Value, depth: usize, out: &mut String) -> Result<()> {
        match value {
            Value::Nil => out.push_str("nil"),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&format_float(*f)?),
            Value::Str(obj) => match self.heap.get(*obj) {
                Some(Object::Str(s)) => encode_string(s, out),
                _ => return Err(stale(value)),
            },
            Value::Vector(obj) => match self.heap.get(*obj) {
                Some(Object::Container { ty, elems }) => {
                    let (open, close) = match self.types.describe(*ty) {
                        Shape::Struct(shape) => {
                            out.push_str(shape.name);
                            ('{', '}')
                        }
                        Shape::Vector(_) | Shape::Scalar => ('[', ']'),
                    };
                    self.elements(elems, open, close, depth, out)?;
                }
                _ => return Err(stale(value)),
            },
        }
        Ok(())
    }

    fn elements(
        &self,
        elems: &[Value],
        open: char,
        close: char,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        out.push(open);
        if elems.is_empty() {
            out.push(close);
            return Ok(());
        }
        if self.pretty {
            let indent = make_indent(depth + 1);
            for elem in elems {
                out.push('\n');
                out.push_str(&indent);
                self.value(elem, depth + 1, out)?;
            }
            out.push('\n');
            out.push_str(&make_indent(depth));
        } else {
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.value(elem, depth, out)?;
            }
        }
        out.push(close);
        Ok(())
    }
}

/// Shortest text that re-reads as the same float. `{:?}` always keeps a
/// fraction or exponent.
fn format_float(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(ValtreeError::Encode(format!(
            "non-finite float {f} has no text form"
        )));
    }
    Ok(format!("{f:?}"))
}

fn encode_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn make_indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn stale(value: &Value) -> ValtreeError {
    ValtreeError::Encode(format!("stale heap handle: {value:?}"))
}
