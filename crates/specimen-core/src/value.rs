use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number};

use crate::error::{Error, Result};

/// A generated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Date(DateTime<Utc>),
    Symbol(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    Function(FunctionValue),
    Promise(Deferred),
    /// Readonly marker around a generated value.
    Frozen(Box<Value>),
}

/// Callable produced for function-typed schemas. It ignores its arguments and
/// returns the value drawn from the declared return type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    returns: Box<Value>,
}

impl FunctionValue {
    pub fn new(returns: Value) -> Self {
        Self {
            returns: Box::new(returns),
        }
    }

    pub fn call(&self, _args: &[Value]) -> Value {
        (*self.returns).clone()
    }
}

/// An already-computed outcome presented as a future.
///
/// The optional delay only exists for timing-sensitive tests; no real
/// asynchronous work ever happens behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred {
    outcome: std::result::Result<Box<Value>, Error>,
    delay: Option<Duration>,
}

impl Deferred {
    pub fn resolved(value: Value, delay: Option<Duration>) -> Self {
        Self {
            outcome: Ok(Box::new(value)),
            delay,
        }
    }

    pub fn rejected(error: Error, delay: Option<Duration>) -> Self {
        Self {
            outcome: Err(error),
            delay,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    pub fn peek(&self) -> std::result::Result<&Value, &Error> {
        self.outcome.as_deref()
    }

    /// Synchronous access to the outcome, ignoring the delay.
    pub fn into_result(self) -> Result<Value> {
        self.outcome.map(|value| *value)
    }

    /// Waits out the configured delay, then yields the outcome.
    pub async fn settle(self) -> Result<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.into_result()
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Function(_) => "function",
            Value::Promise(_) => "promise",
            Value::Frozen(inner) => inner.type_name(),
        }
    }

    /// Strips readonly markers.
    pub fn peel(&self) -> &Value {
        match self {
            Value::Frozen(inner) => inner.peel(),
            other => other,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Value::Frozen(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.peel(), Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.peel(), Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.peel() {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.peel() {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self.peel() {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self.peel() {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Structural key used to keep set members and map keys distinct.
    pub fn identity_key(&self) -> String {
        format!("{:?}", self.peel())
    }

    /// Renders the value as JSON for hosts that snapshot fixtures. Values JSON
    /// cannot express degrade to the nearest representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Number(value) => Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::BigInt(value) => match i64::try_from(*value) {
                Ok(small) => serde_json::Value::Number(small.into()),
                Err(_) => serde_json::Value::String(value.to_string()),
            },
            Value::String(value) => serde_json::Value::String(value.clone()),
            Value::Date(value) => {
                serde_json::Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Symbol(description) => {
                serde_json::Value::String(format!("Symbol({description})"))
            }
            Value::Array(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    if !value.is_undefined() {
                        map.insert(key.clone(), value.to_json());
                    }
                }
                serde_json::Value::Object(map)
            }
            Value::Map(entries) => serde_json::Value::Array(
                entries
                    .iter()
                    .map(|(key, value)| serde_json::Value::Array(vec![key.to_json(), value.to_json()]))
                    .collect(),
            ),
            Value::Function(_) => serde_json::Value::String("[function]".to_string()),
            Value::Promise(deferred) => match deferred.peek() {
                Ok(value) => value.to_json(),
                Err(_) => serde_json::Value::Null,
            },
            Value::Frozen(inner) => inner.to_json(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
