//! Structural conformance of values against schemas.
//!
//! This is the acceptance check generated values are held to: a value
//! conforms when parsing it with the schema would succeed. Transforms are
//! never run, so pipelines and effects are judged on their input side.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::algebra::{self, SizeBounds};
use crate::checks::{SizeCheck, StringCheck, StringFormat};
use crate::kind::TypeKind;
use crate::schema::{Effect, Schema, SchemaDef, UnknownKeys};
use crate::value::Value;

/// Strings a string-to-boolean coercion stage understands, with their
/// meaning.
pub const BOOLEAN_TOKENS: [(&str, bool); 10] = [
    ("true", true),
    ("false", false),
    ("1", true),
    ("0", false),
    ("yes", true),
    ("no", false),
    ("on", true),
    ("off", false),
    ("y", true),
    ("n", false),
];

const MAX_NESTING: usize = 256;

/// First place a value departs from its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValueIssue {
    pub path: String,
    pub message: String,
}

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$").ok()
});
static URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").ok()
});
static UUID_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").ok()
});
static CUID_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[cC][^\s-]{8,}$").ok());
static CUID2_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]+$").ok());
static ULID_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9A-HJKMNP-TV-Za-hjkmnp-tv-z]{26}$").ok());
static NANOID_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]{21}$").ok());
static EMOJI_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\p{Extended_Pictographic}|\p{Emoji_Component})+$").ok()
});
static DATETIME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$").ok()
});
static TIME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").ok());
static BASE64_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-zA-Z+/]{4})*(([0-9a-zA-Z+/]{2}==)|([0-9a-zA-Z+/]{3}=))?$").ok()
});

/// Checks `value` against `schema`, reporting the first departure.
pub fn conforms(schema: &Schema, value: &Value) -> Result<(), ValueIssue> {
    check(schema, value, "$", 0)
}

/// Whether `value` is one of the accepted spellings of a boolean.
pub fn is_boolean_token(value: &str) -> bool {
    BOOLEAN_TOKENS.iter().any(|(token, _)| *token == value)
}

/// Validates a string against a well-known format.
pub fn matches_format(format: StringFormat, value: &str) -> bool {
    match format {
        StringFormat::Email => {
            is_match(&EMAIL_RE, value) && !value.starts_with('.') && !value.contains("..")
        }
        StringFormat::Url => is_match(&URL_RE, value),
        StringFormat::Uuid => is_match(&UUID_RE, value) && uuid::Uuid::parse_str(value).is_ok(),
        StringFormat::Cuid => is_match(&CUID_RE, value),
        StringFormat::Cuid2 => is_match(&CUID2_RE, value),
        StringFormat::Ulid => is_match(&ULID_RE, value),
        StringFormat::NanoId => is_match(&NANOID_RE, value),
        StringFormat::Emoji => is_match(&EMOJI_RE, value),
        StringFormat::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
        StringFormat::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
        StringFormat::Datetime => {
            is_match(&DATETIME_RE, value) && DateTime::parse_from_rfc3339(value).is_ok()
        }
        StringFormat::Date => {
            value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        }
        StringFormat::Time => {
            is_match(&TIME_RE, value) && NaiveTime::parse_from_str(value, "%H:%M:%S%.f").is_ok()
        }
        StringFormat::Base64 => is_match(&BASE64_RE, value),
    }
}

fn check(schema: &Schema, value: &Value, path: &str, depth: usize) -> Result<(), ValueIssue> {
    if depth > MAX_NESTING {
        return Err(issue(path, "schema nesting too deep"));
    }
    let depth = depth + 1;
    let peeled = value.peel();
    match schema.def() {
        SchemaDef::String(def) => {
            let text = expect_kind(peeled.as_str(), path, TypeKind::String, peeled)?;
            check_string(&def.checks, text, path)
        }
        SchemaDef::Number(def) => {
            let number = expect_kind(peeled.as_f64(), path, TypeKind::Number, peeled)?;
            if number.is_nan() {
                return Err(issue(path, "expected number, received NaN"));
            }
            let bounds = algebra::fold_number(&def.checks)
                .map_err(|err| issue(path, err.to_string()))?;
            if bounds.contains(number) {
                Ok(())
            } else {
                Err(issue(path, format!("{number} is outside {bounds:?}")))
            }
        }
        SchemaDef::NaN => match peeled {
            Value::Number(number) if number.is_nan() => Ok(()),
            other => Err(mismatch(path, TypeKind::NaN, other)),
        },
        SchemaDef::BigInt(def) => match peeled {
            Value::BigInt(number) => {
                let bounds = algebra::fold_bigint(&def.checks)
                    .map_err(|err| issue(path, err.to_string()))?;
                if bounds.contains(*number) {
                    Ok(())
                } else {
                    Err(issue(path, format!("{number} is outside {bounds:?}")))
                }
            }
            other => Err(mismatch(path, TypeKind::BigInt, other)),
        },
        SchemaDef::Boolean => match peeled {
            Value::Bool(_) => Ok(()),
            other => Err(mismatch(path, TypeKind::Boolean, other)),
        },
        SchemaDef::Date(def) => match peeled {
            Value::Date(date) => {
                let bounds = algebra::fold_date(&def.checks)
                    .map_err(|err| issue(path, err.to_string()))?;
                let millis = date.timestamp_millis();
                let inside = bounds.min.is_none_or(|lo| millis >= lo)
                    && bounds.max.is_none_or(|hi| millis <= hi);
                if inside {
                    Ok(())
                } else {
                    Err(issue(path, format!("{date} is outside {bounds:?}")))
                }
            }
            other => Err(mismatch(path, TypeKind::Date, other)),
        },
        SchemaDef::Symbol => match peeled {
            Value::Symbol(_) => Ok(()),
            other => Err(mismatch(path, TypeKind::Symbol, other)),
        },
        SchemaDef::Undefined | SchemaDef::Void => match peeled {
            Value::Undefined => Ok(()),
            other => Err(mismatch(path, schema.kind(), other)),
        },
        SchemaDef::Null => match peeled {
            Value::Null => Ok(()),
            other => Err(mismatch(path, TypeKind::Null, other)),
        },
        SchemaDef::Any | SchemaDef::Unknown | SchemaDef::Catch(_) => Ok(()),
        SchemaDef::Never => Err(issue(path, "no value satisfies never")),
        SchemaDef::Literal(literal) => {
            if literal.matches(peeled) {
                Ok(())
            } else {
                Err(issue(path, format!("expected literal {literal:?}")))
            }
        }
        SchemaDef::Enum(def) => match peeled.as_str() {
            Some(text) if def.values.iter().any(|member| member == text) => Ok(()),
            _ => Err(issue(path, format!("expected one of {:?}", def.values))),
        },
        SchemaDef::NativeEnum(def) => {
            if def.entries.iter().any(|(_, member)| member.to_value() == *peeled) {
                Ok(())
            } else {
                Err(issue(path, "value is not a member of the native enum"))
            }
        }
        SchemaDef::Array(def) => {
            let items = expect_kind(peeled.as_array(), path, TypeKind::Array, peeled)?;
            check_size(&def.checks, items.len(), path)?;
            for (index, item) in items.iter().enumerate() {
                check(&def.element, item, &format!("{path}[{index}]"), depth)?;
            }
            Ok(())
        }
        SchemaDef::Object(def) => {
            let fields = expect_kind(peeled.as_object(), path, TypeKind::Object, peeled)?;
            for (key, field) in &def.shape {
                let present = fields.get(key).unwrap_or(&Value::Undefined);
                check(field, present, &format!("{path}.{key}"), depth)?;
            }
            for (key, extra) in fields {
                if def.shape.contains_key(key) {
                    continue;
                }
                match (&def.catchall, def.unknown_keys) {
                    (Some(catchall), _) => {
                        check(catchall, extra, &format!("{path}.{key}"), depth)?;
                    }
                    (None, UnknownKeys::Strict) => {
                        return Err(issue(path, format!("unrecognized key {key:?}")));
                    }
                    (None, _) => {}
                }
            }
            Ok(())
        }
        SchemaDef::Tuple(def) => {
            let items = expect_kind(peeled.as_array(), path, TypeKind::Tuple, peeled)?;
            if items.len() < def.items.len() {
                return Err(issue(
                    path,
                    format!("expected at least {} items, got {}", def.items.len(), items.len()),
                ));
            }
            if def.rest.is_none() && items.len() > def.items.len() {
                return Err(issue(
                    path,
                    format!("expected {} items, got {}", def.items.len(), items.len()),
                ));
            }
            check_size(&def.checks, items.len(), path)?;
            for (index, item) in items.iter().enumerate() {
                let slot = def.items.get(index).or(def.rest.as_ref());
                if let Some(slot) = slot {
                    check(slot, item, &format!("{path}[{index}]"), depth)?;
                }
            }
            Ok(())
        }
        SchemaDef::Record(def) => {
            let fields = expect_kind(peeled.as_object(), path, TypeKind::Record, peeled)?;
            for (key, field) in fields {
                let child = format!("{path}.{key}");
                check_record_key(&def.key, key, &child, depth)?;
                check(&def.value, field, &child, depth)?;
            }
            Ok(())
        }
        SchemaDef::Map(def) => match peeled {
            Value::Map(entries) => {
                check_size(&def.checks, entries.len(), path)?;
                let mut seen = HashSet::new();
                for (index, (key, entry)) in entries.iter().enumerate() {
                    if !seen.insert(key.identity_key()) {
                        return Err(issue(path, format!("duplicate map key at entry {index}")));
                    }
                    let child = format!("{path}<{index}>");
                    check(&def.key, key, &child, depth)?;
                    check(&def.value, entry, &child, depth)?;
                }
                Ok(())
            }
            other => Err(mismatch(path, TypeKind::Map, other)),
        },
        SchemaDef::Set(def) => match peeled {
            Value::Set(members) => {
                check_size(&def.checks, members.len(), path)?;
                let mut seen = HashSet::new();
                for (index, member) in members.iter().enumerate() {
                    if !seen.insert(member.identity_key()) {
                        return Err(issue(path, format!("duplicate set member at {index}")));
                    }
                    check(&def.element, member, &format!("{path}{{{index}}}"), depth)?;
                }
                Ok(())
            }
            other => Err(mismatch(path, TypeKind::Set, other)),
        },
        SchemaDef::Union(def) => check_any(&def.options, value, path, depth),
        SchemaDef::DiscriminatedUnion(def) => check_any(&def.options, value, path, depth),
        SchemaDef::Intersection(def) => {
            check(&def.left, value, path, depth)?;
            check(&def.right, value, path, depth)
        }
        SchemaDef::Lazy(thunk) => {
            let resolved = thunk.force().map_err(|err| issue(path, err.to_string()))?;
            check(&resolved, value, path, depth)
        }
        SchemaDef::Effects(def) => {
            check(&def.inner, value, path, depth)?;
            match &def.effect {
                Effect::Refinement { check, message } if !check.test(value) => {
                    Err(issue(path, message.clone()))
                }
                _ => Ok(()),
            }
        }
        SchemaDef::Pipeline(def) => {
            check(&def.input, value, path, depth)?;
            if is_coercion(&def.input, &def.output) {
                return match peeled.as_str() {
                    Some(token) if is_boolean_token(token) => Ok(()),
                    _ => Err(issue(path, "expected a boolean token")),
                };
            }
            Ok(())
        }
        SchemaDef::Function(_) => match peeled {
            Value::Function(_) => Ok(()),
            other => Err(mismatch(path, TypeKind::Function, other)),
        },
        SchemaDef::Promise(inner) => match peeled {
            Value::Promise(deferred) => match deferred.peek() {
                Ok(settled) => check(inner, settled, path, depth),
                Err(err) => Err(issue(path, format!("promise rejects: {err}"))),
            },
            other => Err(mismatch(path, TypeKind::Promise, other)),
        },
        SchemaDef::Optional(inner) => {
            if peeled.is_undefined() {
                Ok(())
            } else {
                check(inner, value, path, depth)
            }
        }
        SchemaDef::Default(def) => {
            if peeled.is_undefined() {
                Ok(())
            } else {
                check(&def.inner, value, path, depth)
            }
        }
        SchemaDef::Nullable(inner) => {
            if peeled.is_null() {
                Ok(())
            } else {
                check(inner, value, path, depth)
            }
        }
        SchemaDef::Readonly(inner) => check(inner, value, path, depth),
        SchemaDef::Branded(def) => check(&def.inner, value, path, depth),
    }
}

fn check_any(options: &[Schema], value: &Value, path: &str, depth: usize) -> Result<(), ValueIssue> {
    if options
        .iter()
        .any(|option| check(option, value, path, depth).is_ok())
    {
        Ok(())
    } else {
        Err(issue(path, "value matches no union option"))
    }
}

/// Record keys are strings, but number-keyed records store the number's
/// decimal spelling.
fn check_record_key(schema: &Schema, key: &str, path: &str, depth: usize) -> Result<(), ValueIssue> {
    let as_string = check(schema, &Value::String(key.to_string()), path, depth);
    match (as_string, key.parse::<f64>()) {
        (Err(_), Ok(number)) => check(schema, &Value::Number(number), path, depth),
        (result, _) => result,
    }
}

fn is_match(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

/// Whether a pipeline turns boolean tokens spelled as strings into booleans.
pub fn is_coercion(input: &Schema, output: &Schema) -> bool {
    input.core().kind() == TypeKind::String && output.core().kind() == TypeKind::Boolean
}

fn check_string(checks: &[StringCheck], text: &str, path: &str) -> Result<(), ValueIssue> {
    let length = algebra::char_len(text);
    for check in checks {
        let failure = match check {
            StringCheck::MinLength { value } if length < *value => {
                Some(format!("length {length} is below {value}"))
            }
            StringCheck::MaxLength { value } if length > *value => {
                Some(format!("length {length} is above {value}"))
            }
            StringCheck::Length { value } if length != *value => {
                Some(format!("length {length} is not {value}"))
            }
            StringCheck::Pattern { regex } => match Regex::new(regex) {
                Ok(compiled) if compiled.is_match(text) => None,
                Ok(_) => Some(format!("does not match {regex}")),
                Err(err) => Some(format!("invalid pattern {regex}: {err}")),
            },
            StringCheck::StartsWith { value } if !text.starts_with(value.as_str()) => {
                Some(format!("does not start with {value:?}"))
            }
            StringCheck::EndsWith { value } if !text.ends_with(value.as_str()) => {
                Some(format!("does not end with {value:?}"))
            }
            StringCheck::Includes { value, position } => {
                let tail: String = text.chars().skip(position.unwrap_or(0)).collect();
                (!tail.contains(value.as_str())).then(|| format!("does not include {value:?}"))
            }
            StringCheck::Format { format } if !matches_format(*format, text) => {
                Some(format!("is not a valid {}", format.as_str()))
            }
            _ => None,
        };
        if let Some(message) = failure {
            return Err(issue(path, message));
        }
    }
    Ok(())
}

fn check_size(checks: &[SizeCheck], size: usize, path: &str) -> Result<(), ValueIssue> {
    let bounds: SizeBounds =
        algebra::fold_size(checks).map_err(|err| issue(path, err.to_string()))?;
    if bounds.contains(size) {
        Ok(())
    } else {
        Err(issue(path, format!("size {size} is outside {bounds:?}")))
    }
}

fn expect_kind<T>(found: Option<T>, path: &str, kind: TypeKind, value: &Value) -> Result<T, ValueIssue> {
    found.ok_or_else(|| mismatch(path, kind, value))
}

fn mismatch(path: &str, kind: TypeKind, value: &Value) -> ValueIssue {
    issue(path, format!("expected {kind}, received {}", value.type_name()))
}

fn issue(path: &str, message: impl Into<String>) -> ValueIssue {
    ValueIssue {
        path: path.to_string(),
        message: message.into(),
    }
}
