//! Conversion between heap values and `serde_json::Value`.
//!
//! Structs map to JSON objects keyed by field name; only the fields actually
//! present in the container are emitted. Vectors and untyped containers map to
//! arrays. Going the other way, a struct type accepts either form.

use serde_json::{Map, Number};

use crate::error::{Result, ValtreeError};
use crate::heap::{HeapFactory, Object, RefHeap};
use crate::types::{Shape, TypeId, TypeRegistry, TypeResolver};
use crate::value::Value;

/// Render a heap value as JSON. Non-finite floats become `null`.
pub fn to_json(heap: &RefHeap, types: &TypeRegistry, value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Nil => serde_json::Value::Null,
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Str(obj) => match heap.get(*obj) {
            Some(Object::Str(s)) => serde_json::Value::String(s.clone()),
            _ => return Err(stale(value)),
        },
        Value::Vector(obj) => match heap.get(*obj) {
            Some(Object::Container { ty, elems }) => match types.field_names(*ty) {
                Some(names) => {
                    let mut map = Map::new();
                    for (name, elem) in names.iter().zip(elems) {
                        map.insert(name.clone(), to_json(heap, types, elem)?);
                    }
                    serde_json::Value::Object(map)
                }
                None => serde_json::Value::Array(
                    elems
                        .iter()
                        .map(|elem| to_json(heap, types, elem))
                        .collect::<Result<_>>()?,
                ),
            },
            _ => return Err(stale(value)),
        },
    })
}

/// Build a heap value of type `ty` from JSON.
///
/// The result owns one reference. On error nothing stays allocated.
pub fn from_json(
    heap: &mut RefHeap,
    types: &TypeRegistry,
    ty: TypeId,
    json: &serde_json::Value,
) -> Result<Value> {
    use serde_json::Value as Json;

    match (types.describe(ty), json) {
        (_, Json::Null) => Ok(Value::Nil),
        (Shape::Scalar, Json::Number(n)) => scalar_number(types, ty, n),
        (Shape::Scalar, Json::String(s)) if ty == TypeId::ANY || ty == TypeId::STRING => {
            Ok(Value::Str(heap.new_string(s)))
        }
        (Shape::Vector(elem), Json::Array(items)) => {
            build_container(heap, types, ty, items.iter().map(|item| (elem, item)))
        }
        (Shape::Scalar, Json::Array(items)) if ty == TypeId::ANY => {
            build_container(heap, types, ty, items.iter().map(|item| (TypeId::ANY, item)))
        }
        (Shape::Struct(shape), Json::Array(items)) => {
            if items.len() > shape.fields.len() {
                return Err(ValtreeError::Convert(format!(
                    "{} has {} fields, got {} values",
                    shape.name,
                    shape.fields.len(),
                    items.len()
                )));
            }
            if items.len() < shape.required {
                return Err(missing_fields(shape.name, shape.required, items.len()));
            }
            build_container(heap, types, ty, shape.fields.iter().copied().zip(items))
        }
        (Shape::Struct(shape), Json::Object(map)) => {
            let names = types.field_names(ty).unwrap_or_default();
            if let Some(unknown) = map.keys().find(|k| !names.contains(*k)) {
                return Err(ValtreeError::Convert(format!(
                    "{} has no field named {unknown}",
                    shape.name
                )));
            }
            let present = names.iter().take_while(|n| map.contains_key(*n)).count();
            if present < map.len() {
                let gap = &names[present];
                return Err(ValtreeError::Convert(format!(
                    "{}: field {gap} is missing but later fields are given",
                    shape.name
                )));
            }
            if present < shape.required {
                return Err(missing_fields(shape.name, shape.required, present));
            }
            let items = names[..present].iter().map(|n| &map[n]);
            build_container(heap, types, ty, shape.fields.iter().copied().zip(items))
        }
        (_, other) => Err(ValtreeError::Convert(format!(
            "expected {}, found {}",
            types.type_name(ty),
            json_kind(other)
        ))),
    }
}

fn scalar_number(types: &TypeRegistry, ty: TypeId, n: &Number) -> Result<Value> {
    if ty == TypeId::FLOAT {
        if let Some(f) = n.as_f64() {
            return Ok(Value::Float(f));
        }
    } else if ty == TypeId::INT {
        if let Some(i) = n.as_i64() {
            return Ok(Value::Int(i));
        }
    } else if ty == TypeId::ANY {
        if let Some(i) = n.as_i64() {
            return Ok(Value::Int(i));
        }
        if let Some(f) = n.as_f64() {
            return Ok(Value::Float(f));
        }
    }
    Err(ValtreeError::Convert(format!(
        "expected {}, found number {n}",
        types.type_name(ty)
    )))
}

fn build_container<'j>(
    heap: &mut RefHeap,
    types: &TypeRegistry,
    ty: TypeId,
    items: impl ExactSizeIterator<Item = (TypeId, &'j serde_json::Value)>,
) -> Result<Value> {
    let mut elems = Vec::with_capacity(items.len());
    for (elem_ty, item) in items {
        match from_json(heap, types, elem_ty, item) {
            Ok(value) => elems.push(value),
            Err(err) => {
                for value in elems {
                    heap.decref(value);
                }
                return Err(err);
            }
        }
    }
    let container = heap.new_container(elems.len(), ty);
    // Each element's single reference moves into the container.
    for elem in elems {
        heap.push(container, elem);
    }
    Ok(Value::Vector(container))
}

fn missing_fields(name: &str, required: usize, found: usize) -> ValtreeError {
    ValtreeError::Convert(format!(
        "not enough fields for {name}: expected {required}, found {found}"
    ))
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn stale(value: &Value) -> ValtreeError {
    ValtreeError::Convert(format!("stale heap handle: {value:?}"))
}
