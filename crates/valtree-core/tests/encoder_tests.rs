use valtree_core::{
    encode, encode_pretty, parse_value, to_json, FieldDef, HeapFactory, RefHeap, TypeId,
    TypeRegistry, ValtreeError, Value,
};

fn registry() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types
        .add_struct(
            "Point",
            vec![
                FieldDef::required("x", TypeId::INT),
                FieldDef::required("y", TypeId::INT),
            ],
        )
        .unwrap();
    types
}

/// Parse `text` as `ty`, then encode the result.
fn reencode(text: &str, ty: &str) -> String {
    let mut types = registry();
    let ty = types.parse_type(ty).unwrap();
    let mut heap = RefHeap::new();
    let value = parse_value(&mut heap, &types, ty, text).unwrap();
    let out = encode(&heap, &types, &value).unwrap();
    heap.decref(value);
    out
}

/// Assert that parse → encode_pretty → parse reproduces the same tree.
fn assert_pretty_roundtrip(text: &str, ty: &str) -> String {
    let mut types = registry();
    let ty = types.parse_type(ty).unwrap();
    let mut heap = RefHeap::new();
    let first = parse_value(&mut heap, &types, ty, text).unwrap();
    let pretty = encode_pretty(&heap, &types, &first).unwrap();
    let second = parse_value(&mut heap, &types, ty, &pretty).unwrap();
    assert_eq!(
        to_json(&heap, &types, &first).unwrap(),
        to_json(&heap, &types, &second).unwrap(),
        "pretty roundtrip failed:\n  input:  {text}\n  pretty: {pretty}"
    );
    heap.decref(first);
    heap.decref(second);
    assert_eq!(heap.live_objects(), 0);
    pretty
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn encode_scalars() {
    let heap = RefHeap::new();
    let types = registry();
    assert_eq!(encode(&heap, &types, &Value::Nil).unwrap(), "nil");
    assert_eq!(encode(&heap, &types, &Value::Int(-5)).unwrap(), "-5");
    assert_eq!(encode(&heap, &types, &Value::Float(3.0)).unwrap(), "3.0");
    assert_eq!(encode(&heap, &types, &Value::Float(-0.5)).unwrap(), "-0.5");
    assert_eq!(encode(&heap, &types, &Value::Float(1e21)).unwrap(), "1e21");
}

#[test]
fn encode_string_escapes() {
    let mut heap = RefHeap::new();
    let types = registry();
    let s = Value::Str(heap.new_string("say \"hi\"\n\ttab\\\u{1}"));
    assert_eq!(
        encode(&heap, &types, &s).unwrap(),
        r#""say \"hi\"\n\ttab\\\x01""#
    );
}

#[test]
fn non_finite_float_is_rejected() {
    let heap = RefHeap::new();
    let types = registry();
    for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = encode(&heap, &types, &Value::Float(f)).unwrap_err();
        assert!(matches!(err, ValtreeError::Encode(_)), "got {err:?}");
    }
}

#[test]
fn stale_handle_is_rejected() {
    let mut heap = RefHeap::new();
    let types = registry();
    let s = Value::Str(heap.new_string("gone"));
    heap.decref(s);
    let err = encode(&heap, &types, &s).unwrap_err();
    assert!(err.to_string().contains("stale heap handle"), "got {err}");
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn encode_vectors() {
    assert_eq!(reencode("[1,2\n3]", "[int]"), "[1, 2, 3]");
    assert_eq!(reencode("[]", "[int]"), "[]");
    assert_eq!(reencode(r#"[["a"], [], nil]"#, "[[string]]"), r#"[["a"], [], nil]"#);
}

#[test]
fn encode_structs_by_name() {
    assert_eq!(reencode("Point{1, -2}", "Point"), "Point{1, -2}");
    assert_eq!(
        reencode("[Point{1, 2}, Point{3, 4, 5}]", "[Point]"),
        "[Point{1, 2}, Point{3, 4}]"
    );
}

#[test]
fn struct_typed_brackets_encode_as_struct() {
    let text = reencode("[1, 2]", "Point");
    assert_eq!(text, "Point{1, 2}");
    assert_eq!(reencode(&text, "Point"), text);
}

#[test]
fn short_struct_typed_brackets_never_reach_the_encoder() {
    let mut types = registry();
    let ty = types.parse_type("Point").unwrap();
    let mut heap = RefHeap::new();
    let err = parse_value(&mut heap, &types, ty, "[1]").unwrap_err();
    assert!(err.message.contains("expected 2, found 1"), "got: {err}");
    assert_eq!(heap.live_objects(), 0);
}

#[test]
fn pretty_layout() {
    let pretty = assert_pretty_roundtrip("[Point{1, 2}, []]", "any");
    assert_eq!(pretty, "[\n  Point{\n    1\n    2\n  }\n  []\n]");
}

#[test]
fn pretty_scalar_is_plain() {
    assert_eq!(assert_pretty_roundtrip("-7", "int"), "-7");
}

#[test]
fn pretty_roundtrips() {
    assert_pretty_roundtrip(r#"[["a", "b"], ["c"]]"#, "[[string]]");
    assert_pretty_roundtrip("[[Point{1, 2}], [], [Point{3, 4}]]", "[[Point]]");
    assert_pretty_roundtrip("[1.5, -2.25e-10, 0.0]", "[float]");
}
