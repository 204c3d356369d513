use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use specimen_core::{Error, NumberCheck, ObjectDef, Schema, SizeCheck, StringCheck, Value, conforms};
use specimen_generate::{Fixtures, GenerateOptions, GenerationEngine, GenerationError};
use specimen_intersect::resolve;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn assert_accepted_by_both(left: &Schema, right: &Schema, seed: u64) {
    let merged = resolve(left, right).expect("feasible intersection");
    let engine = GenerationEngine::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..200 {
        let value = engine.generate(&merged, &mut rng).expect("generate from intersection");
        assert!(conforms(left, &value).is_ok(), "left rejects {value:?}");
        assert!(conforms(right, &value).is_ok(), "right rejects {value:?}");
    }
}

#[test]
fn overlapping_numbers_generate_common_multiples() {
    init_tracing();
    let a = Schema::number_with(vec![NumberCheck::gte(0.0), NumberCheck::MultipleOf { value: 4.0 }]);
    let b = Schema::number_with(vec![NumberCheck::lte(30.0), NumberCheck::MultipleOf { value: 6.0 }]);
    assert_accepted_by_both(&a, &b, 1);

    let c = Schema::number_with(vec![NumberCheck::gt(0.5), NumberCheck::MultipleOf { value: 0.2 }]);
    let d = Schema::number_with(vec![NumberCheck::lt(3.0), NumberCheck::MultipleOf { value: 0.3 }]);
    assert_accepted_by_both(&c, &d, 2);
}

#[test]
fn strings_and_objects_generate_values_both_sides_accept() {
    let short = Schema::string_with(vec![StringCheck::MaxLength { value: 6 }]);
    let prefixed = Schema::string_with(vec![StringCheck::StartsWith {
        value: "id".to_string(),
    }]);
    assert_accepted_by_both(&short, &prefixed, 3);

    let user = Schema::object(vec![
        ("name", Schema::string()),
        ("age", Schema::number().optional()),
    ]);
    let named = Schema::object(vec![
        ("name", Schema::string_with(vec![StringCheck::MaxLength { value: 5 }])),
        ("admin", Schema::boolean()),
    ]);
    assert_accepted_by_both(&user, &named, 4);
}

#[test]
fn unions_and_envelopes_generate_values_both_sides_accept() {
    let loose = Schema::union(vec![Schema::string(), Schema::number(), Schema::boolean()]);
    let narrow = Schema::union(vec![Schema::number(), Schema::null()]);
    assert_accepted_by_both(&loose, &narrow, 5);

    let maybe = Schema::string().nullable();
    let either = Schema::union(vec![Schema::null(), Schema::literal("x")]);
    assert_accepted_by_both(&maybe, &either, 6);
}

#[test]
fn catchalls_and_opaque_union_options_generate_values_both_sides_accept() {
    let words: Schema = ObjectDef::new(vec![("a", Schema::string())])
        .catchall(Schema::string())
        .into();
    let numbers: Schema = ObjectDef::new(vec![("a", Schema::string())])
        .catchall(Schema::number())
        .into();
    let loose: Schema = ObjectDef::new(vec![("a", Schema::string())])
        .catchall(Schema::union(vec![Schema::string(), Schema::number()]))
        .into();
    assert_accepted_by_both(&words, &numbers, 9);
    assert_accepted_by_both(&words, &loose, 10);

    let mixed = Schema::union(vec![
        Schema::string(),
        Schema::function(vec![], Schema::number()),
    ]);
    let short = Schema::string_with(vec![StringCheck::MaxLength { value: 4 }]);
    assert_accepted_by_both(&mixed, &short, 11);
}

#[test]
fn optional_dates_yield_both_outcomes() {
    let a = Schema::date().optional();
    let b = Schema::date().optional();
    let mut fixtures = Fixtures::new(GenerateOptions::default(), Some(17));

    let mut absent = false;
    let mut present = false;
    for _ in 0..100 {
        match fixtures.generate_intersection(&a, &b).expect("optional dates") {
            Value::Undefined => absent = true,
            Value::Date(_) => present = true,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!(absent && present);
}

#[test]
fn literals_intersect_by_value() {
    let mut fixtures = Fixtures::new(GenerateOptions::default(), Some(3));
    let hello = Schema::literal("hello");

    for _ in 0..20 {
        let value = fixtures
            .generate_intersection(&hello, &Schema::literal("hello"))
            .expect("same literal");
        assert_eq!(value, Value::from("hello"));
    }

    let value = fixtures
        .generate_intersection(&Schema::string(), &hello)
        .expect("literal within string");
    assert_eq!(value, Value::from("hello"));

    let result = fixtures.generate_intersection(&hello, &Schema::literal("world"));
    assert!(matches!(result, Err(GenerationError::Schema(Error::ImpossibleType(_)))));
}

#[test]
fn conflicting_array_sizes_fail() {
    let at_least_five = Schema::array_with(Schema::string(), vec![SizeCheck::Min { value: 5 }]);
    let at_most_two = Schema::array_with(Schema::string(), vec![SizeCheck::Max { value: 2 }]);

    specimen_generate::seed(Some(1));
    let result = specimen_generate::generate_intersection(&at_least_five, &at_most_two);
    assert!(matches!(
        result,
        Err(GenerationError::Schema(Error::InfeasibleConstraint(_)))
    ));
}

fn category() -> Schema {
    Schema::object(vec![
        ("name", Schema::string()),
        ("children", Schema::array(Schema::lazy(category))),
    ])
}

fn short_category() -> Schema {
    Schema::object(vec![
        ("name", Schema::string_with(vec![StringCheck::MaxLength { value: 8 }])),
        ("children", Schema::array(Schema::lazy(short_category))),
    ])
}

#[test]
fn recursive_intersection_generates_finite_values() {
    init_tracing();
    for max_depth in 0..=4 {
        let options = GenerateOptions {
            max_depth,
            ..GenerateOptions::default()
        };
        let mut fixtures = Fixtures::new(options, Some(max_depth as u64));
        for _ in 0..30 {
            let value = fixtures
                .generate_intersection(&category(), &short_category())
                .expect("recursive intersection");
            assert!(conforms(&category(), &value).is_ok());
            assert!(conforms(&short_category(), &value).is_ok());
        }
    }
}

#[test]
fn intersection_nodes_generate_through_the_resolver() {
    let schema = Schema::intersection(
        Schema::number_with(vec![NumberCheck::gte(10.0)]),
        Schema::number_with(vec![NumberCheck::Int, NumberCheck::lte(12.0)]),
    );
    let mut fixtures = Fixtures::new(GenerateOptions::default(), Some(8));
    for _ in 0..50 {
        let value = fixtures.generate(&schema).expect("number");
        let number = value.as_f64().expect("a number");
        assert!([10.0, 11.0, 12.0].contains(&number));
    }
}
