//! Schema node model.
//!
//! A [`Schema`] is a cheap, shareable handle over an immutable [`SchemaDef`].
//! Handles carry identity: two handles are the same node only when they point
//! at the same allocation, which is what plugin registration and cycle
//! detection key on.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::checks::{BigIntCheck, DateCheck, NumberCheck, SizeCheck, StringCheck};
use crate::error::Result;
use crate::kind::TypeKind;
use crate::value::Value;

/// Identity of a schema node allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

/// Shared handle to an immutable schema node.
#[derive(Clone)]
pub struct Schema(Arc<SchemaDef>);

/// One node of the structural type description.
#[derive(Debug, Clone)]
pub enum SchemaDef {
    String(StringDef),
    Number(NumberDef),
    NaN,
    BigInt(BigIntDef),
    Boolean,
    Date(DateDef),
    Symbol,
    Undefined,
    Null,
    Void,
    Any,
    Unknown,
    Never,
    Literal(Literal),
    Enum(EnumDef),
    NativeEnum(NativeEnumDef),
    Array(ArrayDef),
    Object(ObjectDef),
    Tuple(TupleDef),
    Record(RecordDef),
    Map(MapDef),
    Set(SetDef),
    Union(UnionDef),
    DiscriminatedUnion(DiscriminatedUnionDef),
    Intersection(IntersectionDef),
    Lazy(Thunk),
    Effects(EffectsDef),
    Pipeline(PipelineDef),
    Function(FunctionDef),
    Promise(Schema),
    Optional(Schema),
    Nullable(Schema),
    Default(FallbackDef),
    Catch(FallbackDef),
    Readonly(Schema),
    Branded(BrandedDef),
}

#[derive(Debug, Clone, Default)]
pub struct StringDef {
    pub checks: Vec<StringCheck>,
}

#[derive(Debug, Clone, Default)]
pub struct NumberDef {
    pub checks: Vec<NumberCheck>,
}

#[derive(Debug, Clone, Default)]
pub struct BigIntDef {
    pub checks: Vec<BigIntCheck>,
}

#[derive(Debug, Clone, Default)]
pub struct DateDef {
    pub checks: Vec<DateCheck>,
}

/// A single admissible value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    BigInt(i128),
    Boolean(bool),
    Null,
    Undefined,
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(value) => Value::String(value.clone()),
            Literal::Number(value) => Value::Number(*value),
            Literal::BigInt(value) => Value::BigInt(*value),
            Literal::Boolean(value) => Value::Bool(*value),
            Literal::Null => Value::Null,
            Literal::Undefined => Value::Undefined,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value.peel()) {
            (Literal::String(expected), Value::String(actual)) => expected == actual,
            (Literal::Number(expected), Value::Number(actual)) => expected == actual,
            (Literal::BigInt(expected), Value::BigInt(actual)) => expected == actual,
            (Literal::Boolean(expected), Value::Bool(actual)) => expected == actual,
            (Literal::Null, Value::Null) | (Literal::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub values: Vec<String>,
}

/// Member value of a native enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    String(String),
    Number(f64),
}

impl NativeValue {
    pub fn to_value(&self) -> Value {
        match self {
            NativeValue::String(value) => Value::String(value.clone()),
            NativeValue::Number(value) => Value::Number(*value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NativeEnumDef {
    pub entries: Vec<(String, NativeValue)>,
}

#[derive(Debug, Clone)]
pub struct ArrayDef {
    pub element: Schema,
    pub checks: Vec<SizeCheck>,
}

/// What an object does with keys its shape does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Accept and drop them.
    #[default]
    Strip,
    /// Reject them.
    Strict,
    /// Accept and keep them.
    Passthrough,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectDef {
    pub shape: BTreeMap<String, Schema>,
    pub unknown_keys: UnknownKeys,
    /// Schema every undeclared key must satisfy. Takes precedence over
    /// `unknown_keys` when present.
    pub catchall: Option<Schema>,
}

impl ObjectDef {
    pub fn new<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Self {
            shape: fields
                .into_iter()
                .map(|(key, schema)| (key.into(), schema))
                .collect(),
            unknown_keys: UnknownKeys::Strip,
            catchall: None,
        }
    }

    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    pub fn catchall(mut self, schema: Schema) -> Self {
        self.catchall = Some(schema);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TupleDef {
    pub items: Vec<Schema>,
    pub rest: Option<Schema>,
    /// Bounds on the total length, only meaningful alongside `rest`.
    pub checks: Vec<SizeCheck>,
}

#[derive(Debug, Clone)]
pub struct RecordDef {
    pub key: Schema,
    pub value: Schema,
}

#[derive(Debug, Clone)]
pub struct MapDef {
    pub key: Schema,
    pub value: Schema,
    pub checks: Vec<SizeCheck>,
}

#[derive(Debug, Clone)]
pub struct SetDef {
    pub element: Schema,
    pub checks: Vec<SizeCheck>,
}

#[derive(Debug, Clone)]
pub struct UnionDef {
    pub options: Vec<Schema>,
}

#[derive(Debug, Clone)]
pub struct DiscriminatedUnionDef {
    pub discriminator: String,
    /// Object schemas, each pinning `discriminator` to literal or enum values.
    pub options: Vec<Schema>,
}

#[derive(Debug, Clone)]
pub struct IntersectionDef {
    pub left: Schema,
    pub right: Schema,
}

#[derive(Debug, Clone)]
pub struct EffectsDef {
    pub inner: Schema,
    pub effect: Effect,
}

/// Custom behaviour layered over an inner schema.
#[derive(Clone)]
pub enum Effect {
    Refinement { check: Predicate, message: String },
    Transform(Mapper),
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Refinement { message, .. } => {
                f.debug_struct("Refinement").field("message", message).finish()
            }
            Effect::Transform(_) => f.write_str("Transform"),
        }
    }
}

/// Caller-supplied value predicate.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

/// Caller-supplied value transformation.
#[derive(Clone)]
pub struct Mapper(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Mapper {
    pub fn new(map: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(map))
    }

    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

/// Validate-then-transform chain: values enter `input`, whatever it yields is
/// checked by `output`.
#[derive(Debug, Clone)]
pub struct PipelineDef {
    pub input: Schema,
    pub output: Schema,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub args: Vec<Schema>,
    pub returns: Schema,
}

/// Inner schema plus the value substituted for missing input (default) or
/// for failed input (catch).
#[derive(Debug, Clone)]
pub struct FallbackDef {
    pub inner: Schema,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct BrandedDef {
    pub inner: Schema,
    pub brand: String,
}

/// Deferred schema, resolved on demand. Self-referential graphs are built by
/// capturing a handle to the enclosing schema inside the thunk.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn() -> Result<Schema> + Send + Sync>);

impl Thunk {
    pub fn new(resolve: impl Fn() -> Result<Schema> + Send + Sync + 'static) -> Self {
        Self(Arc::new(resolve))
    }

    pub fn force(&self) -> Result<Schema> {
        (self.0)()
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

/// The two unit values envelopes add to their inner type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Undefined,
    Null,
}

impl Unit {
    pub fn to_value(self) -> Value {
        match self {
            Unit::Undefined => Value::Undefined,
            Unit::Null => Value::Null,
        }
    }

    pub fn to_schema(self) -> Schema {
        match self {
            Unit::Undefined => Schema::undefined(),
            Unit::Null => Schema::null(),
        }
    }
}

const UNIT_PROBE_DEPTH: usize = 32;

impl SchemaDef {
    pub fn kind(&self) -> TypeKind {
        match self {
            SchemaDef::String(_) => TypeKind::String,
            SchemaDef::Number(_) => TypeKind::Number,
            SchemaDef::NaN => TypeKind::NaN,
            SchemaDef::BigInt(_) => TypeKind::BigInt,
            SchemaDef::Boolean => TypeKind::Boolean,
            SchemaDef::Date(_) => TypeKind::Date,
            SchemaDef::Symbol => TypeKind::Symbol,
            SchemaDef::Undefined => TypeKind::Undefined,
            SchemaDef::Null => TypeKind::Null,
            SchemaDef::Void => TypeKind::Void,
            SchemaDef::Any => TypeKind::Any,
            SchemaDef::Unknown => TypeKind::Unknown,
            SchemaDef::Never => TypeKind::Never,
            SchemaDef::Literal(_) => TypeKind::Literal,
            SchemaDef::Enum(_) => TypeKind::Enum,
            SchemaDef::NativeEnum(_) => TypeKind::NativeEnum,
            SchemaDef::Array(_) => TypeKind::Array,
            SchemaDef::Object(_) => TypeKind::Object,
            SchemaDef::Tuple(_) => TypeKind::Tuple,
            SchemaDef::Record(_) => TypeKind::Record,
            SchemaDef::Map(_) => TypeKind::Map,
            SchemaDef::Set(_) => TypeKind::Set,
            SchemaDef::Union(_) => TypeKind::Union,
            SchemaDef::DiscriminatedUnion(_) => TypeKind::DiscriminatedUnion,
            SchemaDef::Intersection(_) => TypeKind::Intersection,
            SchemaDef::Lazy(_) => TypeKind::Lazy,
            SchemaDef::Effects(_) => TypeKind::Effects,
            SchemaDef::Pipeline(_) => TypeKind::Pipeline,
            SchemaDef::Function(_) => TypeKind::Function,
            SchemaDef::Promise(_) => TypeKind::Promise,
            SchemaDef::Optional(_) => TypeKind::Optional,
            SchemaDef::Nullable(_) => TypeKind::Nullable,
            SchemaDef::Default(_) => TypeKind::Default,
            SchemaDef::Catch(_) => TypeKind::Catch,
            SchemaDef::Readonly(_) => TypeKind::Readonly,
            SchemaDef::Branded(_) => TypeKind::Branded,
        }
    }
}

impl Schema {
    pub fn new(def: SchemaDef) -> Self {
        Self(Arc::new(def))
    }

    pub fn def(&self) -> &SchemaDef {
        &self.0
    }

    pub fn kind(&self) -> TypeKind {
        self.0.kind()
    }

    pub fn id(&self) -> SchemaId {
        SchemaId(Arc::as_ptr(&self.0) as usize)
    }

    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The node under any envelopes and effects.
    pub fn core(&self) -> &Schema {
        match self.def() {
            SchemaDef::Optional(inner) | SchemaDef::Nullable(inner) | SchemaDef::Readonly(inner) => {
                inner.core()
            }
            SchemaDef::Default(fallback) | SchemaDef::Catch(fallback) => fallback.inner.core(),
            SchemaDef::Branded(branded) => branded.inner.core(),
            SchemaDef::Effects(effects) => effects.inner.core(),
            _ => self,
        }
    }

    /// Whether the unit value passes this schema without further context.
    pub fn accepts_unit(&self, unit: Unit) -> bool {
        self.accepts_unit_at(unit, 0)
    }

    fn accepts_unit_at(&self, unit: Unit, depth: usize) -> bool {
        if depth > UNIT_PROBE_DEPTH {
            return false;
        }
        let depth = depth + 1;
        match self.def() {
            SchemaDef::Any | SchemaDef::Unknown | SchemaDef::Catch(_) => true,
            SchemaDef::Undefined | SchemaDef::Void => unit == Unit::Undefined,
            SchemaDef::Null => unit == Unit::Null,
            SchemaDef::Literal(literal) => literal.matches(&unit.to_value()),
            SchemaDef::Optional(inner) => {
                unit == Unit::Undefined || inner.accepts_unit_at(unit, depth)
            }
            SchemaDef::Default(fallback) => {
                unit == Unit::Undefined || fallback.inner.accepts_unit_at(unit, depth)
            }
            SchemaDef::Nullable(inner) => unit == Unit::Null || inner.accepts_unit_at(unit, depth),
            SchemaDef::Union(union) => union
                .options
                .iter()
                .any(|option| option.accepts_unit_at(unit, depth)),
            SchemaDef::Readonly(inner) => inner.accepts_unit_at(unit, depth),
            SchemaDef::Branded(branded) => branded.inner.accepts_unit_at(unit, depth),
            SchemaDef::Effects(effects) => effects.inner.accepts_unit_at(unit, depth),
            SchemaDef::Pipeline(pipeline) => pipeline.input.accepts_unit_at(unit, depth),
            SchemaDef::Intersection(pair) => {
                pair.left.accepts_unit_at(unit, depth) && pair.right.accepts_unit_at(unit, depth)
            }
            SchemaDef::Lazy(thunk) => thunk
                .force()
                .map(|schema| schema.accepts_unit_at(unit, depth))
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl Deref for Schema {
    type Target = SchemaDef;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<SchemaDef> for Schema {
    fn from(def: SchemaDef) -> Self {
        Schema::new(def)
    }
}

impl From<ObjectDef> for Schema {
    fn from(def: ObjectDef) -> Self {
        Schema::new(SchemaDef::Object(def))
    }
}

// Constructors mirroring the usual schema-builder vocabulary.
impl Schema {
    pub fn string() -> Self {
        Self::string_with(Vec::new())
    }

    pub fn string_with(checks: Vec<StringCheck>) -> Self {
        Self::new(SchemaDef::String(StringDef { checks }))
    }

    pub fn number() -> Self {
        Self::number_with(Vec::new())
    }

    pub fn number_with(checks: Vec<NumberCheck>) -> Self {
        Self::new(SchemaDef::Number(NumberDef { checks }))
    }

    pub fn int() -> Self {
        Self::number_with(vec![NumberCheck::Int])
    }

    pub fn nan() -> Self {
        Self::new(SchemaDef::NaN)
    }

    pub fn bigint() -> Self {
        Self::bigint_with(Vec::new())
    }

    pub fn bigint_with(checks: Vec<BigIntCheck>) -> Self {
        Self::new(SchemaDef::BigInt(BigIntDef { checks }))
    }

    pub fn boolean() -> Self {
        Self::new(SchemaDef::Boolean)
    }

    pub fn date() -> Self {
        Self::date_with(Vec::new())
    }

    pub fn date_with(checks: Vec<DateCheck>) -> Self {
        Self::new(SchemaDef::Date(DateDef { checks }))
    }

    pub fn symbol() -> Self {
        Self::new(SchemaDef::Symbol)
    }

    pub fn undefined() -> Self {
        Self::new(SchemaDef::Undefined)
    }

    pub fn null() -> Self {
        Self::new(SchemaDef::Null)
    }

    pub fn void() -> Self {
        Self::new(SchemaDef::Void)
    }

    pub fn any() -> Self {
        Self::new(SchemaDef::Any)
    }

    pub fn unknown() -> Self {
        Self::new(SchemaDef::Unknown)
    }

    pub fn never() -> Self {
        Self::new(SchemaDef::Never)
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::new(SchemaDef::Literal(value.into()))
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(SchemaDef::Enum(EnumDef {
            values: values.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn native_enum(entries: Vec<(String, NativeValue)>) -> Self {
        Self::new(SchemaDef::NativeEnum(NativeEnumDef { entries }))
    }

    pub fn array(element: Schema) -> Self {
        Self::array_with(element, Vec::new())
    }

    pub fn array_with(element: Schema, checks: Vec<SizeCheck>) -> Self {
        Self::new(SchemaDef::Array(ArrayDef { element, checks }))
    }

    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        ObjectDef::new(fields).into()
    }

    pub fn tuple(items: Vec<Schema>) -> Self {
        Self::tuple_with(items, None, Vec::new())
    }

    pub fn tuple_with(items: Vec<Schema>, rest: Option<Schema>, checks: Vec<SizeCheck>) -> Self {
        Self::new(SchemaDef::Tuple(TupleDef {
            items,
            rest,
            checks,
        }))
    }

    pub fn record(key: Schema, value: Schema) -> Self {
        Self::new(SchemaDef::Record(RecordDef { key, value }))
    }

    pub fn map(key: Schema, value: Schema) -> Self {
        Self::map_with(key, value, Vec::new())
    }

    pub fn map_with(key: Schema, value: Schema, checks: Vec<SizeCheck>) -> Self {
        Self::new(SchemaDef::Map(MapDef { key, value, checks }))
    }

    pub fn set(element: Schema) -> Self {
        Self::set_with(element, Vec::new())
    }

    pub fn set_with(element: Schema, checks: Vec<SizeCheck>) -> Self {
        Self::new(SchemaDef::Set(SetDef { element, checks }))
    }

    pub fn union(options: Vec<Schema>) -> Self {
        Self::new(SchemaDef::Union(UnionDef { options }))
    }

    pub fn discriminated_union(discriminator: impl Into<String>, options: Vec<Schema>) -> Self {
        Self::new(SchemaDef::DiscriminatedUnion(DiscriminatedUnionDef {
            discriminator: discriminator.into(),
            options,
        }))
    }

    pub fn intersection(left: Schema, right: Schema) -> Self {
        Self::new(SchemaDef::Intersection(IntersectionDef { left, right }))
    }

    pub fn lazy(resolve: impl Fn() -> Schema + Send + Sync + 'static) -> Self {
        Self::new(SchemaDef::Lazy(Thunk::new(move || Ok(resolve()))))
    }

    pub fn deferred(thunk: Thunk) -> Self {
        Self::new(SchemaDef::Lazy(thunk))
    }

    pub fn pipeline(input: Schema, output: Schema) -> Self {
        Self::new(SchemaDef::Pipeline(PipelineDef { input, output }))
    }

    pub fn function(args: Vec<Schema>, returns: Schema) -> Self {
        Self::new(SchemaDef::Function(FunctionDef { args, returns }))
    }

    pub fn promise(inner: Schema) -> Self {
        Self::new(SchemaDef::Promise(inner))
    }

    pub fn refine(
        self,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self::new(SchemaDef::Effects(EffectsDef {
            inner: self,
            effect: Effect::Refinement {
                check: Predicate::new(check),
                message: message.into(),
            },
        }))
    }

    pub fn transform(self, map: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::new(SchemaDef::Effects(EffectsDef {
            inner: self,
            effect: Effect::Transform(Mapper::new(map)),
        }))
    }

    pub fn optional(self) -> Self {
        Self::new(SchemaDef::Optional(self))
    }

    pub fn nullable(self) -> Self {
        Self::new(SchemaDef::Nullable(self))
    }

    pub fn with_default(self, value: Value) -> Self {
        Self::new(SchemaDef::Default(FallbackDef { inner: self, value }))
    }

    pub fn with_catch(self, value: Value) -> Self {
        Self::new(SchemaDef::Catch(FallbackDef { inner: self, value }))
    }

    pub fn readonly(self) -> Self {
        Self::new(SchemaDef::Readonly(self))
    }

    pub fn brand(self, brand: impl Into<String>) -> Self {
        Self::new(SchemaDef::Branded(BrandedDef {
            inner: self,
            brand: brand.into(),
        }))
    }
}
