use serde_json::json;
use specimen_core::{NumberCheck, SizeCheck, StringCheck, StringFormat, TypeKind, Value};

#[test]
fn serializes_checks_with_kind_tags() {
    let checks = vec![
        StringCheck::MinLength { value: 3 },
        StringCheck::Includes {
            value: "ab".to_string(),
            position: None,
        },
        StringCheck::Format {
            format: StringFormat::NanoId,
        },
    ];

    let json = serde_json::to_string_pretty(&checks).expect("serialize checks");
    let expected = r#"[
  {
    "kind": "min_length",
    "value": 3
  },
  {
    "kind": "includes",
    "value": "ab"
  },
  {
    "kind": "format",
    "format": "nanoid"
  }
]"#;
    assert_eq!(json, expected);
}

#[test]
fn number_checks_round_trip_from_json() {
    let parsed: Vec<NumberCheck> = serde_json::from_value(json!([
        { "kind": "min", "value": 1.5, "inclusive": false },
        { "kind": "multiple_of", "value": 0.5 },
        { "kind": "int" }
    ]))
    .expect("parse checks");
    assert_eq!(
        parsed,
        vec![
            NumberCheck::gt(1.5),
            NumberCheck::MultipleOf { value: 0.5 },
            NumberCheck::Int
        ]
    );

    let size: SizeCheck =
        serde_json::from_value(json!({ "kind": "exact", "value": 2 })).expect("parse size");
    assert_eq!(size, SizeCheck::Exact { value: 2 });
}

#[test]
fn kinds_serialize_in_snake_case() {
    let json = serde_json::to_value(TypeKind::DiscriminatedUnion).expect("serialize kind");
    assert_eq!(json, json!("discriminated_union"));
    assert_eq!(TypeKind::ALL.len(), 36);
}

#[test]
fn values_render_as_json_without_undefined_fields() {
    let value = Value::Object(
        [
            ("name".to_string(), Value::from("ada")),
            ("nickname".to_string(), Value::Undefined),
            ("score".to_string(), Value::BigInt(7)),
            (
                "tags".to_string(),
                Value::Frozen(Box::new(Value::Array(vec![Value::from(true)]))),
            ),
        ]
        .into_iter()
        .collect(),
    );

    assert_eq!(
        value.to_json(),
        json!({ "name": "ada", "score": 7, "tags": [true] })
    );
    assert_eq!(Value::Number(f64::NAN).to_json(), json!(null));
}
