use serde_json::json;
use valtree_core::{
    from_json, parse_value, to_json, FieldDef, HeapFactory, RefHeap, TypeId, TypeRegistry,
    ValtreeError, Value,
};

fn registry() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    let tags = types.vector_of(TypeId::STRING).unwrap();
    types
        .add_struct(
            "Item",
            vec![
                FieldDef::required("id", TypeId::INT),
                FieldDef::required("name", TypeId::STRING),
                FieldDef::with_default("tags", tags),
                FieldDef::with_default("weight", TypeId::FLOAT),
            ],
        )
        .unwrap();
    types
}

/// Convert `json` to a heap value of type `ty` and straight back.
fn through_heap(json: serde_json::Value, ty: &str) -> serde_json::Value {
    let mut types = registry();
    let ty = types.parse_type(ty).unwrap();
    let mut heap = RefHeap::new();
    let value = from_json(&mut heap, &types, ty, &json).unwrap();
    let back = to_json(&heap, &types, &value).unwrap();
    heap.decref(value);
    assert_eq!(heap.live_objects(), 0);
    back
}

/// Expect a conversion error and check nothing leaked.
fn convert_err(json: serde_json::Value, ty: &str) -> String {
    let mut types = registry();
    let ty = types.parse_type(ty).unwrap();
    let mut heap = RefHeap::new();
    let err = from_json(&mut heap, &types, ty, &json).unwrap_err();
    assert_eq!(heap.live_objects(), 0, "leak after failed conversion of {json}");
    match err {
        ValtreeError::Convert(message) => message,
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

// ============================================================================
// to_json
// ============================================================================

#[test]
fn parsed_struct_to_object() {
    let mut types = registry();
    let ty = types.parse_type("[Item]").unwrap();
    let mut heap = RefHeap::new();
    let value = parse_value(
        &mut heap,
        &types,
        ty,
        r#"[Item{1, "bolt", ["m4"], 0.5}, Item{2, "nut"}]"#,
    )
    .unwrap();
    assert_eq!(
        to_json(&heap, &types, &value).unwrap(),
        json!([
            {"id": 1, "name": "bolt", "tags": ["m4"], "weight": 0.5},
            {"id": 2, "name": "nut"}
        ])
    );
    heap.decref(value);
}

#[test]
fn scalars_to_json() {
    let heap = RefHeap::new();
    let types = registry();
    assert_eq!(to_json(&heap, &types, &Value::Nil).unwrap(), json!(null));
    assert_eq!(to_json(&heap, &types, &Value::Int(-3)).unwrap(), json!(-3));
    assert_eq!(to_json(&heap, &types, &Value::Float(2.5)).unwrap(), json!(2.5));
    assert_eq!(to_json(&heap, &types, &Value::Float(f64::NAN)).unwrap(), json!(null));
}

// ============================================================================
// from_json
// ============================================================================

#[test]
fn struct_from_object_and_array() {
    let expected = json!({"id": 7, "name": "gear", "tags": []});
    assert_eq!(
        through_heap(json!({"name": "gear", "tags": [], "id": 7}), "Item"),
        expected
    );
    assert_eq!(through_heap(json!([7, "gear", []]), "Item"), expected);
}

#[test]
fn nested_vectors_from_json() {
    assert_eq!(
        through_heap(json!([[1, 2], [], null]), "[[int]]"),
        json!([[1, 2], [], null])
    );
}

#[test]
fn any_keeps_int_float_distinction() {
    assert_eq!(
        through_heap(json!([1, 1.0, "s", [null]]), "any"),
        json!([1, 1.0, "s", [null]])
    );
}

#[test]
fn float_accepts_integers() {
    assert_eq!(through_heap(json!([1, 2.5]), "[float]"), json!([1.0, 2.5]));
}

#[test]
fn int_rejects_fraction() {
    let message = convert_err(json!([1, 2.5]), "[int]");
    assert_eq!(message, "expected int, found number 2.5");
}

#[test]
fn bool_is_rejected() {
    let message = convert_err(json!(true), "any");
    assert_eq!(message, "expected any, found boolean");
}

#[test]
fn missing_required_field() {
    let message = convert_err(json!({"id": 1}), "Item");
    assert!(message.contains("not enough fields for Item"), "got: {message}");
}

#[test]
fn unknown_field() {
    let message = convert_err(json!({"id": 1, "name": "x", "colour": "red"}), "Item");
    assert_eq!(message, "Item has no field named colour");
}

#[test]
fn field_gap() {
    let message = convert_err(json!({"id": 1, "name": "x", "weight": 1.0}), "Item");
    assert!(message.contains("field tags is missing"), "got: {message}");
}

#[test]
fn too_many_positional_fields() {
    let message = convert_err(json!([1, "x", [], 1.0, "extra"]), "Item");
    assert!(message.contains("has 4 fields, got 5 values"), "got: {message}");
}

#[test]
fn late_failure_releases_earlier_elements() {
    let message = convert_err(json!([["a", "b"], ["c", 5]]), "[[string]]");
    assert_eq!(message, "expected string, found number 5");
}
