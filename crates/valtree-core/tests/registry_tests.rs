use valtree_core::{
    FieldDef, Schema, Shape, StructShape, TypeId, TypeRegistry, TypeResolver, ValtreeError,
};

fn schema_err(result: Result<impl std::fmt::Debug, ValtreeError>) -> String {
    match result {
        Err(ValtreeError::Schema(message)) => message,
        other => panic!("expected a schema error, got {other:?}"),
    }
}

// ============================================================================
// Builtin and vector types
// ============================================================================

#[test]
fn builtin_types_are_scalars() {
    let mut types = TypeRegistry::new();
    for (expr, ty) in [
        ("any", TypeId::ANY),
        ("int", TypeId::INT),
        ("float", TypeId::FLOAT),
        ("string", TypeId::STRING),
    ] {
        assert_eq!(types.parse_type(expr).unwrap(), ty);
        assert_eq!(types.describe(ty), Shape::Scalar);
    }
}

#[test]
fn vector_types_are_interned() {
    let mut types = TypeRegistry::new();
    let a = types.parse_type("[[int]]").unwrap();
    let b = types.parse_type(" [ [int] ] ").unwrap();
    assert_eq!(a, b);
    let inner = types.vector_of(TypeId::INT).unwrap();
    assert_eq!(types.describe(a), Shape::Vector(inner));
    assert_eq!(types.describe(inner), Shape::Vector(TypeId::INT));
    assert_eq!(types.type_name(a), "[[int]]");
}

#[test]
fn unknown_handle_is_scalar() {
    let types = TypeRegistry::new();
    assert_eq!(types.describe(TypeId(999)), Shape::Scalar);
}

#[test]
fn parse_type_errors() {
    let mut types = TypeRegistry::new();
    assert!(schema_err(types.parse_type("Nope")).contains("unknown type: Nope"));
    assert!(schema_err(types.parse_type("[int")).contains("unbalanced"));
}

// ============================================================================
// Structs
// ============================================================================

#[test]
fn struct_shape_and_required_count() {
    let mut types = TypeRegistry::new();
    let ty = types
        .add_struct(
            "Sample",
            vec![
                FieldDef::required("a", TypeId::INT),
                FieldDef::required("b", TypeId::STRING),
                FieldDef::with_default("c", TypeId::FLOAT),
            ],
        )
        .unwrap();

    assert_eq!(types.resolve_struct("Sample"), Some((ty, 2)));
    assert_eq!(
        types.describe(ty),
        Shape::Struct(StructShape {
            name: "Sample",
            fields: &[TypeId::INT, TypeId::STRING, TypeId::FLOAT],
            required: 2,
        })
    );
    assert_eq!(
        types.field_names(ty).unwrap(),
        ["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert_eq!(types.type_name(ty), "Sample");
    assert_eq!(types.parse_type("Sample").unwrap(), ty);
}

#[test]
fn resolve_unknown_struct() {
    let types = TypeRegistry::new();
    assert_eq!(types.resolve_struct("Missing"), None);
    assert_eq!(types.resolve_struct("int"), None);
}

#[test]
fn defaults_must_trail() {
    let mut types = TypeRegistry::new();
    let message = schema_err(types.add_struct(
        "Bad",
        vec![
            FieldDef::with_default("a", TypeId::INT),
            FieldDef::required("b", TypeId::INT),
        ],
    ));
    assert!(message.contains("follows a field that does"), "got: {message}");
}

#[test]
fn duplicate_struct() {
    let mut types = TypeRegistry::new();
    types.add_struct("P", vec![]).unwrap();
    assert!(schema_err(types.add_struct("P", vec![])).contains("duplicate struct"));
}

#[test]
fn duplicate_field() {
    let mut types = TypeRegistry::new();
    let message = schema_err(types.add_struct(
        "P",
        vec![
            FieldDef::required("x", TypeId::INT),
            FieldDef::required("x", TypeId::INT),
        ],
    ));
    assert!(message.contains("duplicate field x"), "got: {message}");
}

#[test]
fn reserved_and_invalid_names() {
    let mut types = TypeRegistry::new();
    assert!(schema_err(types.declare_struct("int")).contains("reserved"));
    assert!(schema_err(types.declare_struct("nil")).contains("reserved"));
    assert!(schema_err(types.declare_struct("1abc")).contains("invalid struct name"));
    assert!(schema_err(types.declare_struct("")).contains("invalid struct name"));
}

#[test]
fn define_twice_fails() {
    let mut types = TypeRegistry::new();
    let ty = types.add_struct("P", vec![]).unwrap();
    assert!(schema_err(types.define_struct(ty, vec![])).contains("already defined"));
}

#[test]
fn define_non_struct_fails() {
    let mut types = TypeRegistry::new();
    assert!(schema_err(types.define_struct(TypeId::INT, vec![])).contains("not a struct"));
}

#[test]
fn declared_but_undefined() {
    let mut types = TypeRegistry::new();
    types.declare_struct("Later").unwrap();
    assert_eq!(types.undefined_structs(), vec!["Later"]);
}

// ============================================================================
// Schema files
// ============================================================================

const SCHEMA: &str = r#"{
  "structs": [
    { "name": "Line", "fields": [
        { "name": "from", "type": "Point" },
        { "name": "to", "type": "Point" },
        { "name": "tags", "type": "[string]", "default": true }
    ] },
    { "name": "Point", "fields": [
        { "name": "x", "type": "float" },
        { "name": "y", "type": "float" }
    ] }
  ]
}"#;

#[test]
fn schema_with_forward_reference() {
    let mut types = Schema::from_json(SCHEMA).unwrap().build_registry().unwrap();
    let (line, required) = types.resolve_struct("Line").unwrap();
    assert_eq!(required, 2);
    let point = types.parse_type("Point").unwrap();
    let tags = types.parse_type("[string]").unwrap();
    let Shape::Struct(shape) = types.describe(line) else {
        panic!("Line should be a struct");
    };
    assert_eq!(shape.fields, &[point, point, tags]);
    assert!(types.undefined_structs().is_empty());
}

#[test]
fn schema_unknown_field_type() {
    let schema = Schema::from_json(
        r#"{"structs":[{"name":"A","fields":[{"name":"b","type":"Nope"}]}]}"#,
    )
    .unwrap();
    let message = schema_err(schema.build_registry());
    assert_eq!(message, "struct A, field b: unknown type: Nope");
}

#[test]
fn schema_rejects_unknown_keys() {
    let err = Schema::from_json(r#"{"structs":[{"name":"A","feilds":[]}]}"#).unwrap_err();
    assert!(matches!(err, ValtreeError::Json(_)), "got {err:?}");
}

#[test]
fn empty_schema() {
    let types = Schema::from_json("{}").unwrap().build_registry().unwrap();
    assert_eq!(types.resolve_struct("Point"), None);
}

#[test]
fn schema_registers_into_existing_registry() {
    let mut types = TypeRegistry::new();
    types.add_struct("Extra", vec![]).unwrap();
    Schema::from_json(SCHEMA).unwrap().register(&mut types).unwrap();
    assert!(types.resolve_struct("Extra").is_some());
    assert!(types.resolve_struct("Point").is_some());
}
