//! Unification of objects, records, tuples and homogeneous collections.

use std::collections::BTreeMap;

use specimen_core::{
    DiscriminatedUnionDef, Error, ObjectDef, RecordDef, Result, Schema, SchemaDef, SizeCheck,
    TypeKind, Unit, UnknownKeys, Value, conforms, fold_size,
};

use crate::resolver::Resolver;
use crate::scalars::mismatch;

/// How an object treats keys outside its shape.
#[derive(Clone)]
enum Extras {
    Strip,
    Strict,
    Passthrough,
    Catchall(Schema),
}

impl Extras {
    fn of(def: &ObjectDef) -> Self {
        match (&def.catchall, def.unknown_keys) {
            (Some(schema), _) => Extras::Catchall(schema.clone()),
            (None, UnknownKeys::Strip) => Extras::Strip,
            (None, UnknownKeys::Strict) => Extras::Strict,
            (None, UnknownKeys::Passthrough) => Extras::Passthrough,
        }
    }

    fn apply(self, shape: BTreeMap<String, Schema>) -> ObjectDef {
        let (unknown_keys, catchall) = match self {
            Extras::Strip => (UnknownKeys::Strip, None),
            Extras::Strict => (UnknownKeys::Strict, None),
            Extras::Passthrough => (UnknownKeys::Passthrough, None),
            Extras::Catchall(schema) => (UnknownKeys::Strip, Some(schema)),
        };
        ObjectDef {
            shape,
            unknown_keys,
            catchall,
        }
    }
}

/// Catch-all for keys both sides leave open. Disjoint catch-alls admit no
/// extra key at all, which is what strict expresses.
fn merge_catchall(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Extras> {
    match resolver.resolve(left, right) {
        Ok(merged) => Ok(Extras::Catchall(merged)),
        Err(Error::ImpossibleType(_) | Error::InfeasibleConstraint(_)) => Ok(Extras::Strict),
        Err(err) => Err(err),
    }
}

fn merge_extras(resolver: &mut Resolver, left: Extras, right: Extras) -> Result<Extras> {
    Ok(match (left, right) {
        (Extras::Strict, _) | (_, Extras::Strict) => Extras::Strict,
        (Extras::Catchall(l), Extras::Catchall(r)) => merge_catchall(resolver, &l, &r)?,
        (Extras::Catchall(schema), _) | (_, Extras::Catchall(schema)) => Extras::Catchall(schema),
        (Extras::Passthrough, _) | (_, Extras::Passthrough) => Extras::Passthrough,
        (Extras::Strip, Extras::Strip) => Extras::Strip,
    })
}

/// Resolves a field present on one side only against the other side's
/// treatment of unknown keys. `None` means the field must be dropped.
fn field_against_extras(
    resolver: &mut Resolver,
    key: &str,
    field: &Schema,
    extras: &Extras,
) -> Result<Option<Schema>> {
    match extras {
        Extras::Strip | Extras::Passthrough => Ok(Some(field.clone())),
        Extras::Catchall(catchall) => present_field(resolver, field, catchall).map(Some),
        Extras::Strict => {
            if field.accepts_unit(Unit::Undefined) {
                Ok(None)
            } else {
                Err(Error::impossible(format!(
                    "required key {key:?} is rejected by a strict object"
                )))
            }
        }
    }
}

/// Resolves a field against a schema that only constrains present keys,
/// keeping the field's optionality.
fn present_field(resolver: &mut Resolver, field: &Schema, other: &Schema) -> Result<Schema> {
    match field.def() {
        SchemaDef::Optional(inner) => Ok(resolver.resolve(inner, other)?.optional()),
        _ => resolver.resolve(field, other),
    }
}

fn merge_object_defs(
    resolver: &mut Resolver,
    left: &ObjectDef,
    right: &ObjectDef,
) -> Result<ObjectDef> {
    let (left_extras, right_extras) = (Extras::of(left), Extras::of(right));
    let mut shape = BTreeMap::new();

    for (key, field) in &left.shape {
        let merged = match right.shape.get(key) {
            Some(other) => Some(resolver.resolve(field, other)?),
            None => field_against_extras(resolver, key, field, &right_extras)?,
        };
        if let Some(merged) = merged {
            shape.insert(key.clone(), merged);
        }
    }
    for (key, field) in &right.shape {
        if left.shape.contains_key(key) {
            continue;
        }
        if let Some(merged) = field_against_extras(resolver, key, field, &left_extras)? {
            shape.insert(key.clone(), merged);
        }
    }

    let extras = merge_extras(resolver, left_extras, right_extras)?;
    Ok(extras.apply(shape))
}

pub(crate) fn objects(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Object(l), SchemaDef::Object(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    Ok(merge_object_defs(resolver, l, r)?.into())
}

fn key_is_unconstrained(key: &Schema) -> bool {
    match key.core().def() {
        SchemaDef::String(def) => def.checks.is_empty(),
        SchemaDef::Any | SchemaDef::Unknown => true,
        _ => false,
    }
}

fn merge_object_record(
    resolver: &mut Resolver,
    object: &ObjectDef,
    record: &RecordDef,
) -> Result<ObjectDef> {
    let mut shape = BTreeMap::new();
    for (key, field) in &object.shape {
        if conforms(&record.key, &Value::String(key.clone())).is_err() {
            if field.accepts_unit(Unit::Undefined) {
                continue;
            }
            return Err(Error::impossible(format!(
                "required key {key:?} is rejected by the record key schema"
            )));
        }
        shape.insert(key.clone(), present_field(resolver, field, &record.value)?);
    }

    let extras = match Extras::of(object) {
        Extras::Strict => Extras::Strict,
        _ if !key_is_unconstrained(&record.key) => Extras::Strict,
        Extras::Catchall(catchall) => merge_catchall(resolver, &catchall, &record.value)?,
        Extras::Strip | Extras::Passthrough => Extras::Catchall(record.value.clone()),
    };
    Ok(extras.apply(shape))
}

pub(crate) fn object_record(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Object(object), SchemaDef::Record(record)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    Ok(merge_object_record(resolver, object, record)?.into())
}

pub(crate) fn records(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Record(l), SchemaDef::Record(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let key = resolver.resolve(&l.key, &r.key)?;
    let value = resolver.resolve(&l.value, &r.value)?;
    Ok(Schema::record(key, value))
}

fn merged_sizes(left: &[SizeCheck], right: &[SizeCheck]) -> Result<Vec<SizeCheck>> {
    let checks = [left, right].concat();
    fold_size(&checks)?;
    Ok(checks)
}

pub(crate) fn arrays(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Array(l), SchemaDef::Array(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = merged_sizes(&l.checks, &r.checks)?;
    let element = resolver.resolve(&l.element, &r.element)?;
    Ok(Schema::array_with(element, checks))
}

pub(crate) fn sets(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Set(l), SchemaDef::Set(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = merged_sizes(&l.checks, &r.checks)?;
    let element = resolver.resolve(&l.element, &r.element)?;
    Ok(Schema::set_with(element, checks))
}

pub(crate) fn maps(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Map(l), SchemaDef::Map(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = merged_sizes(&l.checks, &r.checks)?;
    let key = resolver.resolve(&l.key, &r.key)?;
    let value = resolver.resolve(&l.value, &r.value)?;
    Ok(Schema::map_with(key, value, checks))
}

pub(crate) fn tuples(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Tuple(l), SchemaDef::Tuple(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };

    let (longer, shorter) = if l.items.len() >= r.items.len() { (l, r) } else { (r, l) };
    let mut items = Vec::with_capacity(longer.items.len());
    for (index, item) in longer.items.iter().enumerate() {
        let partner = match shorter.items.get(index) {
            Some(partner) => partner,
            None => shorter.rest.as_ref().ok_or_else(|| {
                Error::impossible(format!(
                    "tuple of {} items cannot match position {index} of a longer tuple",
                    shorter.items.len()
                ))
            })?,
        };
        items.push(resolver.resolve(item, partner)?);
    }

    let rest = match (&l.rest, &r.rest) {
        (Some(lr), Some(rr)) => Some(resolver.resolve(lr, rr)?),
        _ => None,
    };
    let checks = merged_sizes(&l.checks, &r.checks)?;
    check_tuple_length(items.len(), rest.is_some(), &checks)?;
    Ok(Schema::tuple_with(items, rest, checks))
}

pub(crate) fn tuple_array(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Tuple(tuple), SchemaDef::Array(array)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let items = tuple
        .items
        .iter()
        .map(|item| resolver.resolve(item, &array.element))
        .collect::<Result<Vec<_>>>()?;
    let rest = match &tuple.rest {
        Some(rest) => Some(resolver.resolve(rest, &array.element)?),
        None => None,
    };
    let checks = merged_sizes(&tuple.checks, &array.checks)?;
    check_tuple_length(items.len(), rest.is_some(), &checks)?;
    Ok(Schema::tuple_with(items, rest, checks))
}

fn check_tuple_length(fixed: usize, has_rest: bool, checks: &[SizeCheck]) -> Result<()> {
    let bounds = fold_size(checks)?;
    let fits = if has_rest {
        bounds.max.is_none_or(|max| max >= fixed)
    } else {
        bounds.contains(fixed)
    };
    if fits {
        Ok(())
    } else {
        Err(Error::infeasible(format!(
            "tuple of {fixed} fixed items violates length bounds {}..{}",
            bounds.min,
            bounds.max.map_or_else(|| "inf".to_string(), |max| max.to_string())
        )))
    }
}

/// Values a branch pins its discriminator to, when they are statically known.
fn discriminator_values(branch: &Schema, discriminator: &str) -> Option<Vec<Value>> {
    let SchemaDef::Object(def) = branch.core().def() else {
        return None;
    };
    let field = def.shape.get(discriminator)?;
    match field.core().def() {
        SchemaDef::Literal(literal) => Some(vec![literal.to_value()]),
        SchemaDef::Enum(def) => Some(def.values.iter().cloned().map(Value::String).collect()),
        SchemaDef::NativeEnum(def) => {
            Some(def.entries.iter().map(|(_, value)| value.to_value()).collect())
        }
        _ => None,
    }
}

fn share_value(left: &Option<Vec<Value>>, right: &Option<Vec<Value>>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => l.iter().any(|value| r.contains(value)),
        _ => true,
    }
}

pub(crate) fn discriminated_pair(resolver: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::DiscriminatedUnion(l), SchemaDef::DiscriminatedUnion(r)) =
        (left.def(), right.def())
    else {
        return Err(mismatch(left, right));
    };

    let same_tag = l.discriminator == r.discriminator;
    let mut options = Vec::new();
    let mut first_error = None;
    for lb in &l.options {
        let left_tags = discriminator_values(lb, &l.discriminator);
        for rb in &r.options {
            if same_tag && !share_value(&left_tags, &discriminator_values(rb, &r.discriminator)) {
                continue;
            }
            match resolver.resolve(lb, rb) {
                Ok(branch) => options.push(branch),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
    }

    if options.is_empty() {
        return Err(first_error.unwrap_or_else(|| {
            Error::impossible(format!(
                "no branches share a value for discriminator {:?}",
                l.discriminator
            ))
        }));
    }
    if same_tag {
        Ok(Schema::new(SchemaDef::DiscriminatedUnion(DiscriminatedUnionDef {
            discriminator: l.discriminator.clone(),
            options,
        })))
    } else {
        Ok(Schema::union(options))
    }
}

/// Discriminated union ∩ object-like: merge every branch, drop the ones that
/// become impossible.
pub(crate) fn discriminated_branches(
    resolver: &mut Resolver,
    left: &Schema,
    right: &Schema,
) -> Result<Schema> {
    let SchemaDef::DiscriminatedUnion(def) = left.def() else {
        return Err(mismatch(left, right));
    };
    if right.kind() == TypeKind::Object {
        let tags = discriminator_values(right, &def.discriminator);
        let any_match = def
            .options
            .iter()
            .any(|branch| share_value(&discriminator_values(branch, &def.discriminator), &tags));
        if !any_match {
            return Err(Error::impossible(format!(
                "object pins {:?} to a value no branch accepts",
                def.discriminator
            )));
        }
    }

    let mut options = Vec::new();
    let mut first_error = None;
    for branch in &def.options {
        match resolver.resolve(branch, right) {
            Ok(merged) => options.push(merged),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    if options.is_empty() {
        return Err(first_error.unwrap_or_else(|| {
            Error::impossible(format!(
                "no branch of the {:?} union survives the intersection",
                def.discriminator
            ))
        }));
    }
    Ok(Schema::new(SchemaDef::DiscriminatedUnion(DiscriminatedUnionDef {
        discriminator: def.discriminator.clone(),
        options,
    })))
}
