//! Unions, deferred nodes, envelopes and the opaque kinds.

use specimen_core::{
    BrandedDef, Error, FunctionDef, Literal, PipelineDef, Result, Schema, SchemaDef, Unit,
};

use crate::resolver::Resolver;
use crate::scalars::mismatch;

/// Union ∩ x: every option that survives, flattened. Options that fail for
/// any reason are dropped; the first failure is reported only when none
/// survives.
pub(crate) fn union(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let SchemaDef::Union(def) = left.def() else {
        return Err(mismatch(left, right));
    };
    let mut options = Vec::new();
    let mut first_error = None;
    for option in &def.options {
        match resolver.resolve(option, right) {
            Ok(merged) => match merged.def() {
                SchemaDef::Union(nested) => options.extend(nested.options.iter().cloned()),
                _ => options.push(merged),
            },
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    match options.len() {
        0 => Err(first_error.unwrap_or_else(|| Error::impossible("union has no options"))),
        1 => Ok(options.remove(0)),
        _ => Ok(Schema::union(options)),
    }
}

pub(crate) fn lazy(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let SchemaDef::Lazy(thunk) = left.def() else {
        return Err(mismatch(left, right));
    };
    resolver.expand_lazy(left, thunk, right)
}

/// An intersection node resolves its own pair before meeting the other side.
pub(crate) fn nested(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let SchemaDef::Intersection(def) = left.def() else {
        return Err(mismatch(left, right));
    };
    let inner = resolver.resolve(&def.left, &def.right)?;
    resolver.resolve(&inner, right)
}

/// Pipelines accept what their input stage accepts, so only that stage
/// meets the other side.
pub(crate) fn pipeline(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let SchemaDef::Pipeline(def) = left.def() else {
        return Err(mismatch(left, right));
    };
    let input = resolver.resolve(&def.input, right)?;
    Ok(Schema::new(SchemaDef::Pipeline(PipelineDef {
        input,
        output: def.output.clone(),
    })))
}

/// The unit value a node is made of, if it is nothing but that unit.
fn unit_of(schema: &Schema) -> Option<Unit> {
    match schema.def() {
        SchemaDef::Undefined | SchemaDef::Void | SchemaDef::Literal(Literal::Undefined) => {
            Some(Unit::Undefined)
        }
        SchemaDef::Null | SchemaDef::Literal(Literal::Null) => Some(Unit::Null),
        _ => None,
    }
}

/// Envelope ∩ x.
///
/// If `x` is exactly the envelope's unit, the unit is the answer. Otherwise
/// the envelope is peeled, its inner type meets `x`, and the unit is kept as
/// an alternative only when `x` accepts it too.
pub(crate) fn envelope(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (inner, unit) = match left.def() {
        SchemaDef::Optional(inner) => (inner, Unit::Undefined),
        SchemaDef::Nullable(inner) => (inner, Unit::Null),
        SchemaDef::Default(fallback) => (&fallback.inner, Unit::Undefined),
        SchemaDef::Catch(fallback) => {
            return match resolver.resolve(&fallback.inner, right) {
                Err(Error::ImpossibleType(_) | Error::InfeasibleConstraint(_)) => Ok(right.clone()),
                other => other,
            };
        }
        SchemaDef::Readonly(inner) => return Ok(resolver.resolve(inner, right)?.readonly()),
        SchemaDef::Branded(def) => {
            let inner = resolver.resolve(&def.inner, right)?;
            return Ok(Schema::new(SchemaDef::Branded(BrandedDef {
                inner,
                brand: def.brand.clone(),
            })));
        }
        _ => return Err(mismatch(left, right)),
    };

    match unit_of(right) {
        Some(other) if other == unit => return Ok(unit.to_schema()),
        Some(_) => return resolver.resolve(inner, right),
        None => {}
    }

    let resolved = resolver.resolve(inner, right);
    match (resolved, right.accepts_unit(unit)) {
        (Ok(merged), true) => {
            if merged.accepts_unit(unit) {
                Ok(merged)
            } else {
                Ok(Schema::union(vec![merged, unit.to_schema()]))
            }
        }
        (Ok(merged), false) => Ok(merged),
        (Err(Error::ImpossibleType(_) | Error::InfeasibleConstraint(_)), true) => {
            Ok(unit.to_schema())
        }
        (Err(err), _) => Err(err),
    }
}

pub(crate) fn promise(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Promise(l), SchemaDef::Promise(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    Ok(Schema::promise(resolver.resolve(l, r)?))
}

pub(crate) fn function(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Function(l), SchemaDef::Function(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    if l.args.len() != r.args.len() {
        return Err(Error::UnsupportedCombination {
            left: left.kind(),
            right: right.kind(),
        });
    }
    let args = l
        .args
        .iter()
        .zip(&r.args)
        .map(|(la, ra)| resolver.resolve(la, ra))
        .collect::<Result<Vec<_>>>()?;
    let returns = resolver.resolve(&l.returns, &r.returns)?;
    Ok(Schema::new(SchemaDef::Function(FunctionDef { args, returns })))
}

/// Custom effects only unify with themselves.
pub(crate) fn effects(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    if left.ptr_eq(right) {
        Ok(left.clone())
    } else {
        Err(Error::UnsupportedCombination {
            left: left.kind(),
            right: right.kind(),
        })
    }
}
