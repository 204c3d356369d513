use specimen_core::{
    Error, NumberCheck, ObjectDef, Schema, SchemaDef, SizeCheck, StringCheck, TypeKind,
    UnknownKeys, Value, conforms,
};
use specimen_intersect::resolve;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn object(fields: Vec<(&str, Value)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

#[test]
fn disjoint_numeric_ranges_are_infeasible() {
    init_tracing();
    let a = Schema::number_with(vec![NumberCheck::gte(100.0)]);
    let b = Schema::number_with(vec![NumberCheck::lte(50.0)]);

    assert!(matches!(resolve(&a, &b), Err(Error::InfeasibleConstraint(_))));
    assert!(matches!(resolve(&b, &a), Err(Error::InfeasibleConstraint(_))));
}

#[test]
fn disjoint_string_lengths_are_infeasible() {
    let a = Schema::string_with(vec![StringCheck::MinLength { value: 10 }]);
    let b = Schema::string_with(vec![StringCheck::MaxLength { value: 5 }]);

    assert!(matches!(resolve(&a, &b), Err(Error::InfeasibleConstraint(_))));
}

#[test]
fn overlapping_numbers_keep_both_check_lists() {
    let a = Schema::number_with(vec![NumberCheck::gte(0.0), NumberCheck::MultipleOf { value: 4.0 }]);
    let b = Schema::number_with(vec![NumberCheck::lte(30.0), NumberCheck::MultipleOf { value: 6.0 }]);

    let merged = resolve(&a, &b).expect("overlapping ranges");
    assert!(conforms(&merged, &Value::Number(24.0)).is_ok());
    assert!(conforms(&merged, &Value::Number(12.0)).is_ok());
    assert!(conforms(&merged, &Value::Number(8.0)).is_err());
    assert!(conforms(&merged, &Value::Number(36.0)).is_err());
}

#[test]
fn multiples_without_representative_in_range_fail() {
    let a = Schema::number_with(vec![NumberCheck::gte(1.0), NumberCheck::lte(5.0)]);
    let b = Schema::number_with(vec![NumberCheck::MultipleOf { value: 7.0 }]);

    assert!(matches!(resolve(&a, &b), Err(Error::InfeasibleConstraint(_))));
}

#[test]
fn literals_intersect_by_value() {
    let hello = Schema::literal("hello");
    let world = Schema::literal("world");

    assert!(matches!(resolve(&hello, &world), Err(Error::ImpossibleType(_))));
    let same = resolve(&hello, &Schema::literal("hello")).expect("equal literals");
    assert_eq!(same.kind(), TypeKind::Literal);
    assert!(conforms(&same, &Value::from("hello")).is_ok());
}

#[test]
fn literal_is_filtered_by_primitive_checks() {
    let short = Schema::string_with(vec![StringCheck::MaxLength { value: 3 }]);

    let kept = resolve(&short, &Schema::literal("abc")).expect("fits");
    assert_eq!(kept.kind(), TypeKind::Literal);
    assert!(matches!(
        resolve(&Schema::literal("abcd"), &short),
        Err(Error::ImpossibleType(_))
    ));
    assert!(matches!(
        resolve(&Schema::literal("abc"), &Schema::number()),
        Err(Error::ImpossibleType(_))
    ));
}

#[test]
fn enums_keep_common_members() {
    let a = Schema::enumeration(["red", "green", "blue"]);
    let b = Schema::enumeration(["blue", "green", "black"]);

    let merged = resolve(&a, &b).expect("common members");
    let SchemaDef::Enum(def) = merged.def() else {
        panic!("expected enum, got {:?}", merged.kind());
    };
    assert_eq!(def.values, vec!["green".to_string(), "blue".to_string()]);

    let none = resolve(&a, &Schema::enumeration(["black"]));
    assert!(matches!(none, Err(Error::ImpossibleType(_))));
}

#[test]
fn disjoint_primitives_share_no_values() {
    assert!(matches!(
        resolve(&Schema::string(), &Schema::number()),
        Err(Error::ImpossibleType(_))
    ));
    assert!(matches!(
        resolve(&Schema::number(), &Schema::nan()),
        Err(Error::ImpossibleType(_))
    ));
}

#[test]
fn array_sizes_fold_and_can_conflict() {
    let min = Schema::array_with(Schema::string(), vec![SizeCheck::Min { value: 5 }]);
    let max = Schema::array_with(Schema::string(), vec![SizeCheck::Max { value: 2 }]);

    assert!(resolve(&min, &max).is_err());

    let upper = Schema::array_with(Schema::string(), vec![SizeCheck::Max { value: 8 }]);
    let merged = resolve(&min, &upper).expect("compatible sizes");
    let SchemaDef::Array(def) = merged.def() else {
        panic!("expected array");
    };
    assert_eq!(def.checks.len(), 2);
}

#[test]
fn never_absorbs_everything() {
    let merged = resolve(&Schema::string(), &Schema::never()).expect("never");
    assert_eq!(merged.kind(), TypeKind::Never);
}

#[test]
fn universal_acceptors_return_the_other_side() {
    let number = Schema::number_with(vec![NumberCheck::Int]);

    assert!(resolve(&Schema::any(), &number).expect("any").ptr_eq(&number));
    assert!(resolve(&number, &Schema::unknown()).expect("unknown").ptr_eq(&number));
}

#[test]
fn optional_intersection_keeps_the_absent_unit() {
    let a = Schema::date().optional();
    let b = Schema::date().optional();

    let merged = resolve(&a, &b).expect("optional dates");
    assert!(conforms(&merged, &Value::Undefined).is_ok());
    assert!(conforms(&merged, &Value::Date(chrono::Utc::now())).is_ok());
    assert!(conforms(&merged, &Value::Null).is_err());
}

#[test]
fn envelope_units_resolve_against_each_other() {
    let nullable = Schema::string().nullable();

    let null = resolve(&nullable, &Schema::null()).expect("null unit");
    assert_eq!(null.kind(), TypeKind::Null);

    let mixed = resolve(&nullable, &Schema::string().optional()).expect("plain string");
    assert!(conforms(&mixed, &Value::from("x")).is_ok());
    assert!(conforms(&mixed, &Value::Null).is_err());
    assert!(conforms(&mixed, &Value::Undefined).is_err());

    let only_absent = resolve(&Schema::string().optional(), &Schema::number().optional())
        .expect("both may be absent");
    assert_eq!(only_absent.kind(), TypeKind::Undefined);
}

#[test]
fn object_keys_are_merged_per_key() {
    let a = Schema::object(vec![
        ("id", Schema::number()),
        ("name", Schema::string_with(vec![StringCheck::MinLength { value: 2 }])),
    ]);
    let b = Schema::object(vec![
        ("name", Schema::string_with(vec![StringCheck::MaxLength { value: 4 }])),
        ("active", Schema::boolean()),
    ]);

    let merged = resolve(&a, &b).expect("objects merge");
    let SchemaDef::Object(def) = merged.def() else {
        panic!("expected object");
    };
    assert_eq!(def.shape.len(), 3);
    let valid = object(vec![
        ("id", Value::Number(1.0)),
        ("name", Value::from("ada")),
        ("active", Value::Bool(true)),
    ]);
    assert!(conforms(&merged, &valid).is_ok());
    assert!(conforms(&a, &valid).is_ok());
    assert!(conforms(&b, &valid).is_ok());
}

#[test]
fn conflicting_object_fields_fail() {
    let a = Schema::object(vec![("id", Schema::number())]);
    let b = Schema::object(vec![("id", Schema::string())]);

    assert!(matches!(resolve(&a, &b), Err(Error::ImpossibleType(_))));
}

#[test]
fn strict_objects_reject_foreign_required_keys() {
    let strict: Schema = ObjectDef::new(vec![("id", Schema::number())]).strict().into();
    let extra = Schema::object(vec![("id", Schema::number()), ("name", Schema::string())]);
    let optional_extra = Schema::object(vec![("note", Schema::string().optional())]);

    assert!(matches!(resolve(&strict, &extra), Err(Error::ImpossibleType(_))));

    let merged = resolve(&strict, &optional_extra).expect("optional key dropped");
    let SchemaDef::Object(def) = merged.def() else {
        panic!("expected object");
    };
    assert_eq!(def.unknown_keys, UnknownKeys::Strict);
    assert!(!def.shape.contains_key("note"));
}

#[test]
fn unknown_key_policies_combine_by_precedence() {
    let passthrough = || -> Schema { ObjectDef::new(Vec::<(&str, Schema)>::new()).passthrough().into() };
    let strip = Schema::object(Vec::<(&str, Schema)>::new());
    let caught: Schema = ObjectDef::new(Vec::<(&str, Schema)>::new())
        .catchall(Schema::number())
        .into();

    let both = resolve(&passthrough(), &passthrough()).expect("passthrough");
    let SchemaDef::Object(def) = both.def() else {
        panic!("expected object");
    };
    assert_eq!(def.unknown_keys, UnknownKeys::Passthrough);

    let with_catchall = resolve(&strip, &caught).expect("catchall");
    let SchemaDef::Object(def) = with_catchall.def() else {
        panic!("expected object");
    };
    assert_eq!(def.catchall.as_ref().map(Schema::kind), Some(TypeKind::Number));
}

#[test]
fn object_meets_record_value_type() {
    let object = Schema::object(vec![("a", Schema::number()), ("b", Schema::number().optional())]);
    let record = Schema::record(Schema::string(), Schema::number_with(vec![NumberCheck::gte(0.0)]));

    let merged = resolve(&object, &record).expect("object and record");
    assert!(conforms(&merged, &object_value(-1.0)).is_err());
    assert!(conforms(&merged, &object_value(2.0)).is_ok());
    let SchemaDef::Object(def) = merged.def() else {
        panic!("expected object");
    };
    assert!(def.catchall.is_some());
}

fn object_value(a: f64) -> Value {
    object(vec![("a", Value::Number(a))])
}

#[test]
fn tuples_resolve_position_wise_and_carry_rest() {
    let short = Schema::tuple_with(vec![Schema::string()], Some(Schema::number()), Vec::new());
    let long = Schema::tuple(vec![Schema::string(), Schema::number(), Schema::number()]);

    let merged = resolve(&short, &long).expect("rest covers extra positions");
    let SchemaDef::Tuple(def) = merged.def() else {
        panic!("expected tuple");
    };
    assert_eq!(def.items.len(), 3);
    assert!(def.rest.is_none());

    let closed = Schema::tuple(vec![Schema::string()]);
    assert!(matches!(resolve(&closed, &long), Err(Error::ImpossibleType(_))));
}

#[test]
fn tuple_meets_array_element_type() {
    let tuple = Schema::tuple(vec![Schema::string(), Schema::string()]);
    let bounded = Schema::array_with(
        Schema::string_with(vec![StringCheck::MinLength { value: 1 }]),
        vec![SizeCheck::Max { value: 1 }],
    );

    assert!(matches!(resolve(&tuple, &bounded), Err(Error::InfeasibleConstraint(_))));

    let array = Schema::array(Schema::string_with(vec![StringCheck::MinLength { value: 1 }]));
    let merged = resolve(&array, &tuple).expect("tuple and array");
    let pair = Value::Array(vec![Value::from("a"), Value::from("")]);
    assert!(conforms(&merged, &pair).is_err());
}

fn shape(kind: &str, extra: (&str, Schema)) -> Schema {
    Schema::object(vec![("type", Schema::literal(kind)), extra])
}

#[test]
fn discriminated_unions_match_branches_by_tag() {
    let a = Schema::discriminated_union(
        "type",
        vec![
            shape("circle", ("radius", Schema::number())),
            shape("square", ("side", Schema::number())),
        ],
    );
    let b = Schema::discriminated_union(
        "type",
        vec![
            shape("square", ("color", Schema::string())),
            shape("triangle", ("base", Schema::number())),
        ],
    );

    let merged = resolve(&a, &b).expect("square survives");
    let SchemaDef::DiscriminatedUnion(def) = merged.def() else {
        panic!("expected discriminated union");
    };
    assert_eq!(def.options.len(), 1);

    let c = Schema::discriminated_union("type", vec![shape("hexagon", ("n", Schema::number()))]);
    assert!(matches!(resolve(&a, &c), Err(Error::ImpossibleType(_))));
}

#[test]
fn discriminated_union_meets_plain_object() {
    let shapes = Schema::discriminated_union(
        "type",
        vec![
            shape("circle", ("radius", Schema::number())),
            shape("square", ("side", Schema::number())),
        ],
    );
    let squares = Schema::object(vec![("type", Schema::literal("square"))]);

    let merged = resolve(&squares, &shapes).expect("square branch");
    let SchemaDef::DiscriminatedUnion(def) = merged.def() else {
        panic!("expected discriminated union");
    };
    assert_eq!(def.options.len(), 1);

    let hexagons = Schema::object(vec![("type", Schema::literal("hexagon"))]);
    assert!(matches!(resolve(&shapes, &hexagons), Err(Error::ImpossibleType(_))));
}

#[test]
fn unions_keep_surviving_options() {
    let union = Schema::union(vec![Schema::string(), Schema::number(), Schema::boolean()]);
    let merged = resolve(&union, &Schema::number()).expect("number survives");
    assert_eq!(merged.kind(), TypeKind::Number);

    let two = Schema::union(vec![Schema::string(), Schema::number()]);
    let both = resolve(&union, &two).expect("two survive");
    let SchemaDef::Union(def) = both.def() else {
        panic!("expected union");
    };
    assert_eq!(def.options.len(), 2);

    assert!(resolve(&union, &Schema::date()).is_err());
}

#[test]
fn unions_drop_options_without_a_strategy() {
    let mixed = Schema::union(vec![
        Schema::string(),
        Schema::function(vec![], Schema::number()),
    ]);
    let merged = resolve(&mixed, &Schema::string()).expect("string survives");
    assert_eq!(merged.kind(), TypeKind::String);

    let refined = Schema::number().refine(|_| true, "always");
    let either = Schema::union(vec![refined.clone(), Schema::number()]);
    let merged = resolve(&Schema::number(), &either).expect("plain number survives");
    assert_eq!(merged.kind(), TypeKind::Number);

    let only_refined = Schema::union(vec![refined]);
    assert!(matches!(
        resolve(&only_refined, &Schema::number()),
        Err(Error::UnsupportedCombination { .. })
    ));
}

#[test]
fn discriminated_branches_without_a_strategy_are_dropped() {
    let shapes = Schema::discriminated_union(
        "type",
        vec![
            Schema::object(vec![
                ("type", Schema::literal("circle")),
                ("radius", Schema::number().refine(|_| true, "any radius")),
            ]),
            shape("square", ("side", Schema::number())),
        ],
    );
    let sized = Schema::object(vec![("radius", Schema::number()), ("side", Schema::number())]);

    let merged = resolve(&shapes, &sized).expect("square branch survives");
    let SchemaDef::DiscriminatedUnion(def) = merged.def() else {
        panic!("expected discriminated union");
    };
    assert_eq!(def.options.len(), 1);
}

#[test]
fn disjoint_catchalls_leave_no_room_for_extra_keys() {
    let words: Schema = ObjectDef::new(vec![("a", Schema::string())])
        .catchall(Schema::string())
        .into();
    let numbers: Schema = ObjectDef::new(vec![("a", Schema::string())])
        .catchall(Schema::number())
        .into();

    let merged = resolve(&words, &numbers).expect("objects without extra keys");
    let SchemaDef::Object(def) = merged.def() else {
        panic!("expected object");
    };
    assert_eq!(def.unknown_keys, UnknownKeys::Strict);
    assert!(def.catchall.is_none());

    let plain = object(vec![("a", Value::from("x"))]);
    assert!(conforms(&words, &plain).is_ok());
    assert!(conforms(&numbers, &plain).is_ok());
    assert!(conforms(&merged, &plain).is_ok());

    let open: Schema = ObjectDef::new(Vec::<(&str, Schema)>::new())
        .catchall(Schema::number())
        .into();
    let flags = Schema::record(Schema::string(), Schema::boolean());
    let merged = resolve(&open, &flags).expect("empty object meets record");
    let SchemaDef::Object(def) = merged.def() else {
        panic!("expected object");
    };
    assert_eq!(def.unknown_keys, UnknownKeys::Strict);
}

#[test]
fn opaque_kinds_have_no_general_strategy() {
    let refined = Schema::number().refine(|_| true, "always");

    assert!(matches!(
        resolve(&refined, &Schema::number()),
        Err(Error::UnsupportedCombination { .. })
    ));
    assert!(resolve(&refined, &refined).is_ok());
    assert!(resolve(&refined, &Schema::any()).is_ok());
}

fn category() -> Schema {
    Schema::object(vec![
        ("name", Schema::string()),
        ("children", Schema::array(Schema::lazy(category))),
    ])
}

fn tagged_category() -> Schema {
    Schema::object(vec![
        ("name", Schema::string_with(vec![StringCheck::MaxLength { value: 8 }])),
        ("children", Schema::array(Schema::lazy(tagged_category))),
    ])
}

#[test]
fn self_referential_schemas_resolve_lazily() {
    init_tracing();
    let merged = resolve(&category(), &tagged_category()).expect("recursive intersection");

    let leaf = object(vec![("name", Value::from("leaf")), ("children", Value::Array(vec![]))]);
    let root = object(vec![("name", Value::from("root")), ("children", Value::Array(vec![leaf]))]);
    assert!(conforms(&merged, &root).is_ok());

    let long_leaf = object(vec![
        ("name", Value::from("much too long")),
        ("children", Value::Array(vec![])),
    ]);
    let bad = object(vec![("name", Value::from("root")), ("children", Value::Array(vec![long_leaf]))]);
    assert!(conforms(&merged, &bad).is_err());
}

#[test]
fn resolution_is_commutative_up_to_representation() {
    let pairs = vec![
        (
            Schema::number_with(vec![NumberCheck::gte(1.0)]),
            Schema::number_with(vec![NumberCheck::lte(9.0)]),
        ),
        (Schema::string().optional(), Schema::literal("x")),
        (Schema::enumeration(["a", "b"]), Schema::string()),
        (
            Schema::object(vec![("a", Schema::number())]),
            Schema::object(vec![("b", Schema::string())]),
        ),
        (Schema::union(vec![Schema::string(), Schema::null()]), Schema::string().nullable()),
    ];
    let samples = [
        Value::Number(5.0),
        Value::Number(10.0),
        Value::from("x"),
        Value::from("a"),
        Value::from("c"),
        Value::Null,
        Value::Undefined,
        object(vec![("a", Value::Number(1.0)), ("b", Value::from("s"))]),
        object(vec![("a", Value::Number(1.0))]),
    ];

    for (a, b) in pairs {
        let ab = resolve(&a, &b).expect("a with b");
        let ba = resolve(&b, &a).expect("b with a");
        for sample in &samples {
            assert_eq!(
                conforms(&ab, sample).is_ok(),
                conforms(&ba, sample).is_ok(),
                "{sample:?} disagrees for {:?} / {:?}",
                a.kind(),
                b.kind()
            );
        }
    }
}
