//! Validation checks attached to schema nodes.
//!
//! Checks are typed per value domain, so a node can only carry checks that
//! make sense for its kind and numeric bounds never mix domains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known string formats that replace free-form synthesis entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
    Cuid,
    Cuid2,
    Ulid,
    #[serde(rename = "nanoid")]
    NanoId,
    Emoji,
    Ipv4,
    Ipv6,
    Datetime,
    Date,
    Time,
    Base64,
}

impl StringFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
            StringFormat::Uuid => "uuid",
            StringFormat::Cuid => "cuid",
            StringFormat::Cuid2 => "cuid2",
            StringFormat::Ulid => "ulid",
            StringFormat::NanoId => "nanoid",
            StringFormat::Emoji => "emoji",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Datetime => "datetime",
            StringFormat::Date => "date",
            StringFormat::Time => "time",
            StringFormat::Base64 => "base64",
        }
    }
}

/// Checks valid on string nodes. Lengths count Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StringCheck {
    MinLength { value: usize },
    MaxLength { value: usize },
    Length { value: usize },
    Pattern { regex: String },
    StartsWith { value: String },
    EndsWith { value: String },
    Includes {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    ToUpperCase,
    ToLowerCase,
    Trim,
    Format { format: StringFormat },
}

/// Checks valid on floating point number nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumberCheck {
    Min { value: f64, inclusive: bool },
    Max { value: f64, inclusive: bool },
    MultipleOf { value: f64 },
    Int,
    Finite,
}

/// Checks valid on arbitrary-precision integer nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BigIntCheck {
    Min { value: i128, inclusive: bool },
    Max { value: i128, inclusive: bool },
    MultipleOf { value: i128 },
}

/// Checks valid on date nodes. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateCheck {
    Min { value: DateTime<Utc> },
    Max { value: DateTime<Utc> },
}

/// Size checks for arrays, sets, maps and tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeCheck {
    Min { value: usize },
    Max { value: usize },
    Exact { value: usize },
}

impl NumberCheck {
    pub fn gt(value: f64) -> Self {
        NumberCheck::Min {
            value,
            inclusive: false,
        }
    }

    pub fn gte(value: f64) -> Self {
        NumberCheck::Min {
            value,
            inclusive: true,
        }
    }

    pub fn lt(value: f64) -> Self {
        NumberCheck::Max {
            value,
            inclusive: false,
        }
    }

    pub fn lte(value: f64) -> Self {
        NumberCheck::Max {
            value,
            inclusive: true,
        }
    }
}

impl BigIntCheck {
    pub fn gte(value: i128) -> Self {
        BigIntCheck::Min {
            value,
            inclusive: true,
        }
    }

    pub fn lte(value: i128) -> Self {
        BigIntCheck::Max {
            value,
            inclusive: true,
        }
    }
}
