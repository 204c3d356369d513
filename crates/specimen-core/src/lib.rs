//! Core contracts for specimen.
//!
//! This crate defines the schema node model, the folded constraint algebra,
//! generated values, and the conformance check shared by the resolver and the
//! generation engine.

pub mod algebra;
pub mod checks;
pub mod conformance;
pub mod error;
pub mod kind;
pub mod schema;
pub mod value;

pub use algebra::{
    BigIntBounds, Bound, Case, DateBounds, Inclusion, NumberBounds, SizeBounds,
    StringConstraints, fold_bigint, fold_date, fold_number, fold_size, fold_string,
};
pub use checks::{BigIntCheck, DateCheck, NumberCheck, SizeCheck, StringCheck, StringFormat};
pub use conformance::{
    BOOLEAN_TOKENS, ValueIssue, conforms, is_boolean_token, is_coercion, matches_format,
};
pub use error::{Error, Result};
pub use kind::{Specificity, TypeKind};
pub use schema::{
    ArrayDef, BigIntDef, BrandedDef, DateDef, DiscriminatedUnionDef, Effect, EffectsDef, EnumDef,
    FallbackDef, FunctionDef, IntersectionDef, Literal, MapDef, Mapper, NativeEnumDef,
    NativeValue, NumberDef, ObjectDef, PipelineDef, Predicate, RecordDef, Schema, SchemaDef,
    SchemaId, SetDef, StringDef, Thunk, TupleDef, UnionDef, Unit, UnknownKeys,
};
pub use value::{Deferred, FunctionValue, Value};
