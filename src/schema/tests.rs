//! Schema builder and transformer tests

use super::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn project_schema() -> Value {
    JsonSchema::new()
        .property("id", SchemaProperty::number())
        .property("name", SchemaProperty::string())
        .property(
            "coreMetrics",
            SchemaProperty::object([
                ("iceMatchCharacters", SchemaProperty::number()),
                ("iceMatchSegments", SchemaProperty::number()),
            ]),
        )
        .property("tags", SchemaProperty::array(SchemaProperty::string()))
        .property("createdAt", SchemaProperty::date_time())
        .to_json()
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn test_builders_are_nullable() {
    let schema = project_schema();

    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["id"]["type"], json!(["number", "null"]));
    assert_eq!(
        schema["properties"]["coreMetrics"]["type"],
        json!(["object", "null"])
    );
    assert_eq!(
        schema["properties"]["tags"]["items"]["type"],
        json!(["string", "null"])
    );
    assert_eq!(schema["properties"]["createdAt"]["format"], "date-time");
}

#[test]
fn test_required_property() {
    let schema = JsonSchema::new()
        .required_property("id", JsonType::String)
        .required_property("id", JsonType::String);

    assert_eq!(schema.required, vec!["id".to_string()]);
    assert!(!schema.get_property("id").unwrap().is_nullable());
    assert_eq!(schema.to_json()["properties"]["id"]["type"], "string");
}

#[test]
fn test_primary_type() {
    let prop = SchemaProperty::integer();
    assert_eq!(prop.json_type.primary_type(), Some(JsonType::Integer));
    assert!(prop.is_nullable());
    assert_eq!(JsonType::Integer.to_string(), "integer");
}

// ============================================================================
// Transformation
// ============================================================================

#[test]
fn test_transform_drops_undeclared_fields() {
    let schema = project_schema();
    let record = json!({"id": 1, "name": "Alpha", "internal": "x"});

    let out = Transformer::new(&schema).transform(&record).unwrap();

    assert_eq!(out, json!({"id": 1, "name": "Alpha"}));
}

#[test]
fn test_transform_nested_objects_and_arrays() {
    let schema = project_schema();
    let record = json!({
        "coreMetrics": {"iceMatchCharacters": "12", "extra": true},
        "tags": ["a", 7]
    });

    let out = Transformer::new(&schema).transform(&record).unwrap();

    assert_eq!(
        out,
        json!({"coreMetrics": {"iceMatchCharacters": 12}, "tags": ["a", "7"]})
    );
}

#[test]
fn test_transform_nulls_allowed_when_nullable() {
    let schema = project_schema();
    let out = Transformer::new(&schema)
        .transform(&json!({"id": null, "tags": null}))
        .unwrap();

    assert_eq!(out, json!({"id": null, "tags": null}));
}

#[test]
fn test_transform_rejects_null_for_required_type() {
    let schema = JsonSchema::new()
        .required_property("id", JsonType::String)
        .to_json();

    let err = Transformer::new(&schema)
        .transform(&json!({"id": null}))
        .unwrap_err();

    assert_eq!(err.path, "id");
    assert_eq!(err.expected, "string");
    assert_eq!(err.found, "null");
}

#[test]
fn test_transform_reports_nested_path() {
    let schema = project_schema();
    let err = Transformer::new(&schema)
        .transform(&json!({"coreMetrics": {"iceMatchSegments": "lots"}}))
        .unwrap_err();

    assert_eq!(err.path, "coreMetrics.iceMatchSegments");
    assert_eq!(
        err.to_string(),
        "field 'coreMetrics.iceMatchSegments' expected number|null, got string"
    );
}

#[test]
fn test_transform_normalizes_date_time() {
    let schema = project_schema();
    let out = Transformer::new(&schema)
        .transform(&json!({"createdAt": "2024-03-01T13:30:00.5+01:00"}))
        .unwrap();

    assert_eq!(out["createdAt"], "2024-03-01T12:30:00.500000Z");
}

#[test]
fn test_transform_rejects_bad_date_time() {
    let schema = project_schema();
    let err = Transformer::new(&schema)
        .transform(&json!({"createdAt": "not a date"}))
        .unwrap_err();

    assert_eq!(err.path, "createdAt");
}

#[test]
fn test_transform_without_fields() {
    let schema = project_schema();
    let out = Transformer::new(&schema)
        .without_fields(["name"])
        .transform(&json!({"id": 3, "name": "Hidden"}))
        .unwrap();

    assert_eq!(out, json!({"id": 3}));
}

#[test]
fn test_free_object_passes_through() {
    let schema = JsonSchema::new()
        .property("attributes", SchemaProperty::free_object())
        .to_json();
    let record = json!({"attributes": {"anything": [1, {"deep": true}]}});

    let out = Transformer::new(&schema).transform(&record).unwrap();

    assert_eq!(out, record);
}

#[test]
fn test_any_of() {
    let schema = json!({
        "type": "object",
        "properties": {
            "value": {"anyOf": [{"type": "integer"}, {"type": "array", "items": {"type": "string"}}]}
        }
    });

    let transformer = Transformer::new(&schema);
    assert_eq!(
        transformer.transform(&json!({"value": "5"})).unwrap(),
        json!({"value": 5})
    );
    assert_eq!(
        transformer.transform(&json!({"value": ["x"]})).unwrap(),
        json!({"value": ["x"]})
    );
    assert!(transformer.transform(&json!({"value": {}})).is_err());
}

#[test_case(json!("42"), json!(42) ; "integer string")]
#[test_case(json!(3.0), json!(3) ; "integral float")]
#[test_case(json!(-8), json!(-8) ; "negative integer")]
fn test_integer_coercion(input: Value, expected: Value) {
    let schema = json!({"type": "integer"});
    assert_eq!(Transformer::new(&schema).transform(&input).unwrap(), expected);
}

#[test_case(json!(3.5) ; "fractional")]
#[test_case(json!(true) ; "boolean")]
#[test_case(json!("4x") ; "junk string")]
fn test_integer_rejects(input: Value) {
    let schema = json!({"type": "integer"});
    assert!(Transformer::new(&schema).transform(&input).is_err());
}

#[test_case(json!("1.25"), json!(1.25) ; "float string")]
#[test_case(json!("10"), json!(10) ; "integer string")]
#[test_case(json!(2.5), json!(2.5) ; "float")]
fn test_number_coercion(input: Value, expected: Value) {
    let schema = json!({"type": "number"});
    assert_eq!(Transformer::new(&schema).transform(&input).unwrap(), expected);
}

#[test_case(json!("TRUE"), json!(true) ; "upper string")]
#[test_case(json!("false"), json!(false) ; "lower string")]
#[test_case(json!(true), json!(true) ; "native")]
fn test_boolean_coercion(input: Value, expected: Value) {
    let schema = json!({"type": "boolean"});
    assert_eq!(Transformer::new(&schema).transform(&input).unwrap(), expected);
}

#[test]
fn test_empty_schema_accepts_anything() {
    let schema = json!({});
    let record = json!({"a": [1, 2, {"b": null}]});
    assert_eq!(Transformer::new(&schema).transform(&record).unwrap(), record);
}
