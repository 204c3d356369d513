use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of schema node kinds understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    String,
    Number,
    NaN,
    BigInt,
    Boolean,
    Date,
    Symbol,
    Undefined,
    Null,
    Void,
    Any,
    Unknown,
    Never,
    Literal,
    Enum,
    NativeEnum,
    Array,
    Object,
    Tuple,
    Record,
    Map,
    Set,
    Union,
    DiscriminatedUnion,
    Intersection,
    Lazy,
    Effects,
    Pipeline,
    Function,
    Promise,
    Optional,
    Nullable,
    Default,
    Catch,
    Readonly,
    Branded,
}

/// Specificity tiers, lowest first. Intersection dispatch always puts the
/// operand with the higher tier on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    Universal,
    Advanced,
    Envelope,
    Composed,
    Homogeneous,
    FixedShape,
    Primitive,
    Enumerated,
    UnitLike,
    Uninhabited,
}

impl TypeKind {
    pub const ALL: [TypeKind; 36] = [
        TypeKind::String,
        TypeKind::Number,
        TypeKind::NaN,
        TypeKind::BigInt,
        TypeKind::Boolean,
        TypeKind::Date,
        TypeKind::Symbol,
        TypeKind::Undefined,
        TypeKind::Null,
        TypeKind::Void,
        TypeKind::Any,
        TypeKind::Unknown,
        TypeKind::Never,
        TypeKind::Literal,
        TypeKind::Enum,
        TypeKind::NativeEnum,
        TypeKind::Array,
        TypeKind::Object,
        TypeKind::Tuple,
        TypeKind::Record,
        TypeKind::Map,
        TypeKind::Set,
        TypeKind::Union,
        TypeKind::DiscriminatedUnion,
        TypeKind::Intersection,
        TypeKind::Lazy,
        TypeKind::Effects,
        TypeKind::Pipeline,
        TypeKind::Function,
        TypeKind::Promise,
        TypeKind::Optional,
        TypeKind::Nullable,
        TypeKind::Default,
        TypeKind::Catch,
        TypeKind::Readonly,
        TypeKind::Branded,
    ];

    pub fn specificity(self) -> Specificity {
        match self {
            TypeKind::Never => Specificity::Uninhabited,
            TypeKind::Literal
            | TypeKind::Null
            | TypeKind::Undefined
            | TypeKind::Void
            | TypeKind::NaN => Specificity::UnitLike,
            TypeKind::Enum | TypeKind::NativeEnum => Specificity::Enumerated,
            TypeKind::String
            | TypeKind::Number
            | TypeKind::BigInt
            | TypeKind::Boolean
            | TypeKind::Date
            | TypeKind::Symbol => Specificity::Primitive,
            TypeKind::Object | TypeKind::Tuple | TypeKind::DiscriminatedUnion => {
                Specificity::FixedShape
            }
            TypeKind::Array | TypeKind::Set | TypeKind::Map | TypeKind::Record => {
                Specificity::Homogeneous
            }
            TypeKind::Union | TypeKind::Lazy | TypeKind::Intersection | TypeKind::Pipeline => {
                Specificity::Composed
            }
            TypeKind::Optional
            | TypeKind::Nullable
            | TypeKind::Default
            | TypeKind::Catch
            | TypeKind::Readonly
            | TypeKind::Branded => Specificity::Envelope,
            TypeKind::Effects | TypeKind::Function | TypeKind::Promise => Specificity::Advanced,
            TypeKind::Any | TypeKind::Unknown => Specificity::Universal,
        }
    }

    /// Kinds that describe plain data. Two distinct data kinds with no
    /// unification rule share no values.
    pub fn is_data(self) -> bool {
        matches!(
            self.specificity(),
            Specificity::UnitLike
                | Specificity::Enumerated
                | Specificity::Primitive
                | Specificity::FixedShape
                | Specificity::Homogeneous
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Number => "number",
            TypeKind::NaN => "nan",
            TypeKind::BigInt => "bigint",
            TypeKind::Boolean => "boolean",
            TypeKind::Date => "date",
            TypeKind::Symbol => "symbol",
            TypeKind::Undefined => "undefined",
            TypeKind::Null => "null",
            TypeKind::Void => "void",
            TypeKind::Any => "any",
            TypeKind::Unknown => "unknown",
            TypeKind::Never => "never",
            TypeKind::Literal => "literal",
            TypeKind::Enum => "enum",
            TypeKind::NativeEnum => "native_enum",
            TypeKind::Array => "array",
            TypeKind::Object => "object",
            TypeKind::Tuple => "tuple",
            TypeKind::Record => "record",
            TypeKind::Map => "map",
            TypeKind::Set => "set",
            TypeKind::Union => "union",
            TypeKind::DiscriminatedUnion => "discriminated_union",
            TypeKind::Intersection => "intersection",
            TypeKind::Lazy => "lazy",
            TypeKind::Effects => "effects",
            TypeKind::Pipeline => "pipeline",
            TypeKind::Function => "function",
            TypeKind::Promise => "promise",
            TypeKind::Optional => "optional",
            TypeKind::Nullable => "nullable",
            TypeKind::Default => "default",
            TypeKind::Catch => "catch",
            TypeKind::Readonly => "readonly",
            TypeKind::Branded => "branded",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
