use std::collections::{BTreeMap, HashSet};

use rand::{Rng, RngCore};
use specimen_core::{
    ArrayDef, Error, Literal, MapDef, NativeValue, ObjectDef, RecordDef, SchemaDef, SetDef,
    SizeCheck, TupleDef, Unit, UnknownKeys, Value, fold_size,
};
use tracing::warn;

use crate::engine::{GenerationContext, GenerationEngine};
use crate::errors::GenerationError;

const EXTRA_KEY_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Element count for a sized collection, with the folded minimum. Past the
/// depth limit only the minimum is produced.
fn draw_size(
    engine: &GenerationEngine,
    checks: &[SizeCheck],
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<(usize, usize), Error> {
    let bounds = fold_size(checks)?;
    if engine.past_depth(ctx) {
        return Ok((bounds.min, bounds.min));
    }
    let max = bounds
        .max
        .unwrap_or_else(|| bounds.min.max(engine.options().default_collection_max));
    Ok((rng.random_range(bounds.min..=max), bounds.min))
}

pub(crate) fn array(
    engine: &GenerationEngine,
    def: &ArrayDef,
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    let (count, _) = draw_size(engine, &def.checks, ctx, rng)?;
    let items = (0..count)
        .map(|_| engine.generate_value(&def.element, ctx.deeper(), rng))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(items))
}

pub(crate) fn set(
    engine: &GenerationEngine,
    def: &SetDef,
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    let (count, min) = draw_size(engine, &def.checks, ctx, rng)?;
    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(count);
    let mut collisions = 0;
    while members.len() < count {
        let member = engine.generate_value(&def.element, ctx.deeper(), rng)?;
        if seen.insert(member.identity_key()) {
            members.push(member);
            continue;
        }
        collisions += 1;
        if collisions >= engine.options().max_attempts {
            // A smaller set is still valid once the minimum is met.
            if members.len() >= min {
                break;
            }
            warn!(wanted = min, found = members.len(), "set sampling gave up");
            return Err(Error::infeasible(format!(
                "could not draw {min} distinct set members, found {}",
                members.len()
            ))
            .into());
        }
    }
    Ok(Value::Set(members))
}

pub(crate) fn map(
    engine: &GenerationEngine,
    def: &MapDef,
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    let (count, min) = draw_size(engine, &def.checks, ctx, rng)?;
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(count);
    let mut collisions = 0;
    while entries.len() < count {
        let key = engine.generate_value(&def.key, ctx.deeper(), rng)?;
        if !seen.insert(key.identity_key()) {
            collisions += 1;
            if collisions >= engine.options().max_attempts {
                if entries.len() >= min {
                    break;
                }
                warn!(wanted = min, found = entries.len(), "map key sampling gave up");
                return Err(Error::infeasible(format!(
                    "could not draw {min} distinct map keys, found {}",
                    entries.len()
                ))
                .into());
            }
            continue;
        }
        let value = engine.generate_value(&def.value, ctx.deeper(), rng)?;
        entries.push((key, value));
    }
    Ok(Value::Map(entries))
}

pub(crate) fn record(
    engine: &GenerationEngine,
    def: &RecordDef,
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    ensure_string_like_key(&def.key)?;
    let (count, _) = draw_size(engine, &[], ctx, rng)?;
    let mut fields = BTreeMap::new();
    for _ in 0..count {
        let key = match engine.generate_value(&def.key, ctx.deeper(), rng)?.peel() {
            Value::String(key) => key.clone(),
            Value::Number(key) => key.to_string(),
            other => {
                return Err(Error::invalid(format!(
                    "record key generated a {}",
                    other.type_name()
                ))
                .into());
            }
        };
        let value = engine.generate_value(&def.value, ctx.deeper(), rng)?;
        fields.insert(key, value);
    }
    Ok(Value::Object(fields))
}

fn ensure_string_like_key(key: &specimen_core::Schema) -> Result<(), Error> {
    match key.core().def() {
        SchemaDef::String(_) | SchemaDef::Number(_) | SchemaDef::Enum(_) => Ok(()),
        SchemaDef::Literal(Literal::String(_) | Literal::Number(_)) => Ok(()),
        SchemaDef::NativeEnum(def)
            if def
                .entries
                .iter()
                .all(|(_, member)| matches!(member, NativeValue::String(_))) =>
        {
            Ok(())
        }
        other => Err(Error::invalid(format!(
            "record keys must be string-like, found {}",
            other.kind()
        ))),
    }
}

pub(crate) fn tuple(
    engine: &GenerationEngine,
    def: &TupleDef,
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    let mut items = def
        .items
        .iter()
        .map(|item| engine.generate_value(item, ctx.deeper(), rng))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(rest) = &def.rest else {
        return Ok(Value::Array(items));
    };
    let fixed = items.len();
    let bounds = fold_size(&def.checks)?;
    if bounds.max.is_some_and(|max| max < fixed) {
        return Err(Error::infeasible(format!(
            "tuple has {fixed} fixed items but at most {:?} are allowed",
            bounds.max
        ))
        .into());
    }
    let min = bounds.min.max(fixed);
    let total = if engine.past_depth(ctx) {
        min
    } else {
        let max = bounds
            .max
            .unwrap_or(fixed + engine.options().default_collection_max)
            .max(min);
        rng.random_range(min..=max)
    };
    for _ in fixed..total {
        items.push(engine.generate_value(rest, ctx.deeper(), rng)?);
    }
    Ok(Value::Array(items))
}

/// Builds an object. Optional fields are kept on a coin flip (always left
/// out past the depth limit) and an undefined result never becomes a key.
pub(crate) fn object(
    engine: &GenerationEngine,
    def: &ObjectDef,
    ctx: GenerationContext,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    let mut fields = BTreeMap::new();
    for (key, field) in &def.shape {
        if field.accepts_unit(Unit::Undefined)
            && (engine.past_depth(ctx) || rng.random_bool(0.5))
        {
            continue;
        }
        let target = match field.def() {
            SchemaDef::Optional(inner) => inner,
            _ => field,
        };
        let value = engine.generate_value(target, ctx.deeper(), rng)?;
        if !value.is_undefined() {
            fields.insert(key.clone(), value);
        }
    }

    let extras = match (&def.catchall, def.unknown_keys) {
        (Some(_), _) | (None, UnknownKeys::Passthrough) if !engine.past_depth(ctx) => {
            rng.random_range(0..=engine.options().max_extra_keys)
        }
        _ => 0,
    };
    for _ in 0..extras {
        let key = extra_key(def, &fields, rng);
        let value = match &def.catchall {
            Some(catchall) => match engine.generate_value(catchall, ctx.deeper(), rng) {
                Ok(value) => value,
                // Extra keys are optional; an uninhabited catch-all allows none.
                Err(GenerationError::Schema(
                    Error::ImpossibleType(_) | Error::InfeasibleConstraint(_),
                )) => break,
                Err(err) => return Err(err),
            },
            None => engine.loose_value(ctx.deeper(), rng),
        };
        if !value.is_undefined() {
            fields.insert(key, value);
        }
    }
    Ok(Value::Object(fields))
}

/// A lowercase key that is neither declared nor already present.
fn extra_key(def: &ObjectDef, fields: &BTreeMap<String, Value>, rng: &mut dyn RngCore) -> String {
    let charset: Vec<char> = EXTRA_KEY_CHARSET.chars().collect();
    loop {
        let len = rng.random_range(3..=8);
        let key: String = (0..len)
            .map(|_| charset[rng.random_range(0..charset.len())])
            .collect();
        if !def.shape.contains_key(&key) && !fields.contains_key(&key) {
            return key;
        }
    }
}
