use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use specimen_core::{Error, Schema, Value, conforms};
use specimen_generate::{GenerateOptions, GenerationEngine};

#[tokio::test]
async fn promises_settle_to_conforming_values() {
    let engine = GenerationEngine::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let schema = Schema::promise(Schema::enumeration(["queued", "done"]));

    let Value::Promise(deferred) = engine.generate(&schema, &mut rng).expect("promise") else {
        panic!("expected a promise");
    };
    assert!(!deferred.is_rejected());
    let settled = deferred.settle().await.expect("resolved");
    assert!(conforms(&Schema::enumeration(["queued", "done"]), &settled).is_ok());
}

#[tokio::test]
async fn impossible_inner_schema_rejects_on_settle() {
    let engine = GenerationEngine::default();
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let value = engine
        .generate(&Schema::promise(Schema::never()), &mut rng)
        .expect("generation itself succeeds");
    let Value::Promise(deferred) = value else {
        panic!("expected a promise");
    };
    assert!(deferred.is_rejected());
    assert!(matches!(deferred.settle().await, Err(Error::ImpossibleType(_))));
}

#[tokio::test]
async fn configured_delay_is_honoured() {
    let engine = GenerationEngine::new(GenerateOptions {
        promise_delay_ms: Some(20),
        ..GenerateOptions::default()
    });
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let Value::Promise(deferred) = engine
        .generate(&Schema::promise(Schema::boolean()), &mut rng)
        .expect("promise")
    else {
        panic!("expected a promise");
    };
    assert_eq!(deferred.delay(), Some(Duration::from_millis(20)));

    let started = Instant::now();
    let settled = deferred.settle().await.expect("resolved");
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert!(matches!(settled, Value::Bool(_)));
}
