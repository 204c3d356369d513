use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use specimen_core::{Error, Result, Schema, SchemaId, Specificity, Thunk, TypeKind};
use tracing::{debug, trace};

use crate::{composed, scalars, shapes};

/// Nesting beyond this is treated as a malformed graph.
const MAX_RESOLVE_DEPTH: usize = 128;

/// Deferred nodes expanded eagerly before further expansion is postponed to
/// generation time.
const EAGER_LAZY_EXPANSIONS: usize = 8;

pub(crate) type Handler = fn(&mut Resolver, &Schema, &Schema) -> Result<Schema>;

static HANDLERS: LazyLock<HashMap<(TypeKind, TypeKind), Handler>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for left in TypeKind::ALL {
        for right in TypeKind::ALL {
            if let Some(handler) = handler_for(left, right) {
                table.insert((left, right), handler);
            }
        }
    }
    table
});

/// Unification rule for an ordered kind pair, if one exists. The left kind
/// is always at least as specific as the right one when looked up.
fn handler_for(left: TypeKind, right: TypeKind) -> Option<Handler> {
    use Specificity as S;
    use TypeKind as K;

    if left == K::Never {
        return Some(scalars::never);
    }
    if matches!(right, K::Any | K::Unknown) {
        return Some(scalars::keep_left);
    }
    match left {
        K::Union => return Some(composed::union),
        K::Lazy => return Some(composed::lazy),
        K::Intersection => return Some(composed::nested),
        K::Pipeline => return Some(composed::pipeline),
        _ => {}
    }
    if left.specificity() == S::Envelope {
        return Some(composed::envelope);
    }

    let handler: Handler = match (left, right) {
        (K::Promise, K::Promise) => composed::promise,
        (K::Function, K::Function) => composed::function,
        (K::Effects, K::Effects) => composed::effects,

        (l, r) if l.specificity() == S::UnitLike
            && matches!(r.specificity(), S::UnitLike | S::Enumerated | S::Primitive) =>
        {
            scalars::unit_like
        }
        (l, r) if l.specificity() == S::Enumerated
            && matches!(r.specificity(), S::Enumerated | S::Primitive) =>
        {
            scalars::enumerated
        }
        (K::String, K::String) => scalars::strings,
        (K::Number, K::Number) => scalars::numbers,
        (K::BigInt, K::BigInt) => scalars::bigints,
        (K::Date, K::Date) => scalars::dates,
        (K::Boolean, K::Boolean) | (K::Symbol, K::Symbol) => scalars::keep_left,

        (K::Object, K::Object) => shapes::objects,
        (K::Object, K::Record) => shapes::object_record,
        (K::Tuple, K::Tuple) => shapes::tuples,
        (K::Tuple, K::Array) => shapes::tuple_array,
        (K::DiscriminatedUnion, K::DiscriminatedUnion) => shapes::discriminated_pair,
        (K::DiscriminatedUnion, K::Object | K::Record) => shapes::discriminated_branches,
        (K::Array, K::Array) => shapes::arrays,
        (K::Set, K::Set) => shapes::sets,
        (K::Map, K::Map) => shapes::maps,
        (K::Record, K::Record) => shapes::records,
        _ => return None,
    };
    Some(handler)
}

/// Computes merged schemas accepting exactly the values both inputs accept.
#[derive(Debug, Default)]
pub struct Resolver {
    depth: usize,
    lazy_expansions: usize,
    active: HashSet<(SchemaId, SchemaId)>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, left: &Schema, right: &Schema) -> Result<Schema> {
        if self.depth >= MAX_RESOLVE_DEPTH {
            return Err(Error::invalid(format!(
                "intersection of {} with {} nests deeper than {MAX_RESOLVE_DEPTH} levels",
                left.kind(),
                right.kind()
            )));
        }
        self.depth += 1;
        let result = self.dispatch(left, right);
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, left: &Schema, right: &Schema) -> Result<Schema> {
        let (left, right) = if right.kind().specificity() > left.kind().specificity() {
            (right, left)
        } else {
            (left, right)
        };
        let (lk, rk) = (left.kind(), right.kind());

        if let Some(handler) = HANDLERS.get(&(lk, rk)) {
            trace!(left = %lk, right = %rk, depth = self.depth, "intersection handler");
            return handler(self, left, right);
        }
        if let Some(handler) = HANDLERS.get(&(rk, lk)) {
            trace!(left = %rk, right = %lk, depth = self.depth, "intersection handler (swapped)");
            return handler(self, right, left);
        }
        if lk.is_data() && rk.is_data() {
            return Err(Error::impossible(format!("{lk} and {rk} share no values")));
        }
        Err(Error::UnsupportedCombination {
            left: lk,
            right: rk,
        })
    }

    /// Forces a deferred operand, guarding against cycles. Pairs already being
    /// resolved, or expansions past the eager budget, come back as a fresh
    /// deferred node that resolves the pair when generation reaches it.
    pub(crate) fn expand_lazy(&mut self, lazy: &Schema, thunk: &Thunk, other: &Schema) -> Result<Schema> {
        let key = (lazy.id(), other.id());
        if self.active.contains(&key) || self.lazy_expansions >= EAGER_LAZY_EXPANSIONS {
            trace!(kind = %other.kind(), "postponing deferred intersection");
            let (lazy, other) = (lazy.clone(), other.clone());
            return Ok(Schema::deferred(Thunk::new(move || resolve(&lazy, &other))));
        }

        let forced = thunk.force()?;
        self.active.insert(key);
        self.lazy_expansions += 1;
        let result = self.resolve(&forced, other);
        self.lazy_expansions -= 1;
        self.active.remove(&key);
        result
    }
}

/// Merges two schemas into one accepting only values valid under both.
pub fn resolve(left: &Schema, right: &Schema) -> Result<Schema> {
    debug!(left = %left.kind(), right = %right.kind(), "resolving intersection");
    Resolver::new().resolve(left, right)
}
