//! # valtree-core
//!
//! Schema-directed reader for a small textual value format: integers, floats,
//! strings, `nil`, vectors and positional structs.
//!
//! Text is read back into reference-counted heap values. The caller supplies
//! the expected type, which decides how nested containers are decoded. Every
//! object created during a parse is logged and released on the way out, so a
//! parse that fails at any depth leaks nothing.
//!
//! ## Quick start
//!
//! ```rust
//! use valtree_core::{parse_text, to_json, FieldDef, HeapFactory, RefHeap, TypeId, TypeRegistry};
//!
//! let mut types = TypeRegistry::new();
//! types
//!     .add_struct("Point", vec![FieldDef::required("x", TypeId::INT), FieldDef::required("y", TypeId::INT)])
//!     .unwrap();
//! let ty = types.parse_type("[Point]").unwrap();
//!
//! let mut heap = RefHeap::new();
//! let (value, error) = parse_text(&mut heap, &types, ty, "[Point{1, 2}, Point{3, 4}]");
//! assert!(error.is_none());
//! assert_eq!(
//!     to_json(&heap, &types, &value).unwrap().to_string(),
//!     r#"[{"x":1,"y":2},{"x":3,"y":4}]"#
//! );
//!
//! heap.decref(value);
//! assert_eq!(heap.live_objects(), 0);
//! ```
//!
//! ## Modules
//!
//! - [`reader`]: `parse_text` / `parse_value` entry points
//! - [`deserializer`]: the recursive-descent reader
//! - [`allocation`]: per-parse allocation log
//! - [`lexer`]: tokenizer
//! - [`heap`]: `HeapFactory` trait and the `RefHeap` implementation
//! - [`types`]: `TypeResolver` trait and the `TypeRegistry` implementation
//! - [`schema`]: JSON schema files for struct types
//! - [`encoder`]: heap value → text
//! - [`json`]: heap value ↔ `serde_json::Value`
//! - [`error`]: error types

pub mod allocation;
pub mod deserializer;
pub mod encoder;
pub mod error;
pub mod heap;
pub mod json;
pub mod lexer;
pub mod reader;
pub mod schema;
pub mod types;
pub mod value;

pub use allocation::AllocationLog;
pub use deserializer::Deserializer;
pub use encoder::{encode, encode_pretty};
pub use error::{ParseResult, Position, SyntaxError, ValtreeError};
pub use heap::{HeapFactory, HeapStats, Object, RefHeap};
pub use json::{from_json, to_json};
pub use reader::{parse_text, parse_value};
pub use schema::Schema;
pub use types::{FieldDef, Shape, StructShape, TypeId, TypeRegistry, TypeResolver};
pub use value::{ObjRef, Value};
