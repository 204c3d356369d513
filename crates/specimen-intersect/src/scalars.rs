//! Unification of unit-like, enumerated and primitive kinds.

use specimen_core::{
    EnumDef, Error, Literal, NativeEnumDef, Result, Schema, SchemaDef, Value, conforms,
    fold_bigint, fold_date, fold_number, fold_string,
};

use crate::resolver::Resolver;

pub(crate) fn never(_: &mut Resolver, left: &Schema, _: &Schema) -> Result<Schema> {
    Ok(left.clone())
}

pub(crate) fn keep_left(_: &mut Resolver, left: &Schema, _: &Schema) -> Result<Schema> {
    Ok(left.clone())
}

/// The single value a unit-like node admits.
fn unit_value(schema: &Schema) -> Option<Value> {
    match schema.def() {
        SchemaDef::Literal(literal) => Some(literal.to_value()),
        SchemaDef::Null => Some(Value::Null),
        SchemaDef::Undefined | SchemaDef::Void => Some(Value::Undefined),
        SchemaDef::NaN => Some(Value::Number(f64::NAN)),
        _ => None,
    }
}

/// Literal-like ∩ literal-like, enumerated or primitive: keep the unit when
/// the other side accepts it.
pub(crate) fn unit_like(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let value = unit_value(left).ok_or_else(|| Error::invalid("expected a unit-like node"))?;
    let accepted = match (left.def(), right.def()) {
        (SchemaDef::NaN, SchemaDef::NaN) => true,
        (_, SchemaDef::NaN) | (SchemaDef::NaN, _) => false,
        _ => conforms(right, &value).is_ok(),
    };
    if accepted {
        Ok(left.clone())
    } else {
        Err(Error::impossible(format!(
            "{} {} is not accepted by {}",
            left.kind(),
            describe(left),
            right.kind()
        )))
    }
}

fn describe(schema: &Schema) -> String {
    match schema.def() {
        SchemaDef::Literal(Literal::String(value)) => format!("{value:?}"),
        SchemaDef::Literal(literal) => format!("{literal:?}"),
        other => other.kind().to_string(),
    }
}

/// Enumerated ∩ enumerated or primitive: filter the members the other side
/// accepts, keeping the left node's representation.
pub(crate) fn enumerated(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    match left.def() {
        SchemaDef::Enum(def) => {
            let values: Vec<String> = def
                .values
                .iter()
                .filter(|member| conforms(right, &Value::String((*member).clone())).is_ok())
                .cloned()
                .collect();
            if values.is_empty() {
                return Err(Error::impossible(format!(
                    "no member of enum {:?} is accepted by {}",
                    def.values,
                    right.kind()
                )));
            }
            Ok(Schema::new(SchemaDef::Enum(EnumDef { values })))
        }
        SchemaDef::NativeEnum(def) => {
            let entries: Vec<_> = def
                .entries
                .iter()
                .filter(|(_, member)| conforms(right, &member.to_value()).is_ok())
                .cloned()
                .collect();
            if entries.is_empty() {
                return Err(Error::impossible(format!(
                    "no native enum member is accepted by {}",
                    right.kind()
                )));
            }
            Ok(Schema::new(SchemaDef::NativeEnum(NativeEnumDef { entries })))
        }
        other => Err(Error::invalid(format!(
            "expected an enumerated node, found {}",
            other.kind()
        ))),
    }
}

pub(crate) fn strings(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::String(l), SchemaDef::String(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = [l.checks.as_slice(), r.checks.as_slice()].concat();
    fold_string(&checks)?;
    Ok(Schema::string_with(checks))
}

pub(crate) fn numbers(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Number(l), SchemaDef::Number(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = [l.checks.as_slice(), r.checks.as_slice()].concat();
    fold_number(&checks)?;
    Ok(Schema::number_with(checks))
}

pub(crate) fn bigints(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::BigInt(l), SchemaDef::BigInt(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = [l.checks.as_slice(), r.checks.as_slice()].concat();
    fold_bigint(&checks)?;
    Ok(Schema::bigint_with(checks))
}

pub(crate) fn dates(_: &mut Resolver, left: &Schema, right: &Schema) -> Result<Schema> {
    let (SchemaDef::Date(l), SchemaDef::Date(r)) = (left.def(), right.def()) else {
        return Err(mismatch(left, right));
    };
    let checks = [l.checks.as_slice(), r.checks.as_slice()].concat();
    fold_date(&checks)?;
    Ok(Schema::date_with(checks))
}

pub(crate) fn mismatch(left: &Schema, right: &Schema) -> Error {
    Error::invalid(format!(
        "handler received unexpected pair {} with {}",
        left.kind(),
        right.kind()
    ))
}
