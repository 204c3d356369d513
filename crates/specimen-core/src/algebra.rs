//! Folding of check lists into effective bounds.
//!
//! Every generator and the intersection resolver reason about checks through
//! these folded forms. A fold either yields a non-empty value space or fails
//! with [`Error::InfeasibleConstraint`].

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::checks::{BigIntCheck, DateCheck, NumberCheck, SizeCheck, StringCheck, StringFormat};
use crate::error::{Error, Result};

/// Relative tolerance used when deciding whether a float quotient is whole.
pub const SNAP_TOLERANCE: f64 = 1e-9;

const MAX_DECIMALS: i32 = 12;

/// One end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound<T> {
    pub value: T,
    pub inclusive: bool,
}

/// Folded number checks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberBounds {
    pub min: Option<Bound<f64>>,
    pub max: Option<Bound<f64>>,
    pub multiple_of: Option<f64>,
    pub integer: bool,
    pub finite: bool,
}

impl NumberBounds {
    /// Grid every admissible value lies on, if any.
    pub fn step(&self) -> Option<f64> {
        match (self.multiple_of, self.integer) {
            (Some(multiple), true) => Some(lcm_f64(multiple, 1.0).unwrap_or(multiple)),
            (Some(multiple), false) => Some(multiple),
            (None, true) => Some(1.0),
            (None, false) => None,
        }
    }

    /// Closed range admissible values are drawn from. Missing sides extend
    /// `span` away from the present side, or from zero when both are missing.
    pub fn closed_range(&self, span: f64) -> (f64, f64) {
        let lo = self
            .min
            .map(|bound| if bound.inclusive { bound.value } else { next_up(bound.value) });
        let hi = self
            .max
            .map(|bound| if bound.inclusive { bound.value } else { next_down(bound.value) });
        match (lo, hi) {
            (Some(lo), Some(hi)) => (lo, hi),
            (Some(lo), None) => (lo, lo + span),
            (None, Some(hi)) => (hi - span, hi),
            (None, None) => (-span, span),
        }
    }

    /// Inclusive range of grid indices `k` such that `k * step` is admissible
    /// within the closed range derived from `span`.
    pub fn step_indices(&self, step: f64, span: f64) -> Option<(f64, f64)> {
        let (lo, hi) = self.closed_range(span);
        let first = match self.min {
            Some(bound) => first_index(bound.value, bound.inclusive, step),
            None => first_index(lo, true, step),
        };
        let last = match self.max {
            Some(bound) => last_index(bound.value, bound.inclusive, step),
            None => last_index(hi, true, step),
        };
        (first <= last).then_some((first, last))
    }

    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        if let Some(bound) = self.min {
            if value < bound.value || (!bound.inclusive && value == bound.value) {
                return false;
            }
        }
        if let Some(bound) = self.max {
            if value > bound.value || (!bound.inclusive && value == bound.value) {
                return false;
            }
        }
        if (self.integer || self.finite) && !value.is_finite() {
            return false;
        }
        if self.integer && value.fract() != 0.0 {
            return false;
        }
        match self.multiple_of {
            Some(step) => is_multiple_of(value, step),
            None => true,
        }
    }
}

/// Folded bigint checks. Exclusive bounds are normalized to inclusive ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BigIntBounds {
    pub min: Option<i128>,
    pub max: Option<i128>,
    pub multiple_of: Option<i128>,
}

impl BigIntBounds {
    /// Inclusive range with missing sides extended by `span`.
    pub fn closed_range(&self, span: i128) -> (i128, i128) {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => (lo, hi),
            (Some(lo), None) => (lo, lo.saturating_add(span)),
            (None, Some(hi)) => (hi.saturating_sub(span), hi),
            (None, None) => (-span, span),
        }
    }

    pub fn contains(&self, value: i128) -> bool {
        self.min.is_none_or(|lo| value >= lo)
            && self.max.is_none_or(|hi| value <= hi)
            && self.multiple_of.is_none_or(|step| value.rem_euclid(step) == 0)
    }
}

/// Folded date checks, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateBounds {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Folded size checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeBounds {
    pub min: usize,
    pub max: Option<usize>,
}

impl SizeBounds {
    pub fn contains(&self, size: usize) -> bool {
        size >= self.min && self.max.is_none_or(|max| size <= max)
    }
}

/// Case normalization a string schema applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Upper,
    Lower,
}

impl Case {
    pub fn apply(self, value: &str) -> String {
        match self {
            Case::Upper => value.to_uppercase(),
            Case::Lower => value.to_lowercase(),
        }
    }
}

/// Required substring, optionally anchored at or after a char position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    pub value: String,
    pub position: Option<usize>,
}

/// Folded string checks.
#[derive(Debug, Clone, Default)]
pub struct StringConstraints {
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub includes: Vec<Inclusion>,
    pub patterns: Vec<Regex>,
    pub case: Option<Case>,
    pub trim: bool,
    pub format: Option<StringFormat>,
}

impl StringConstraints {
    /// Segments placed left to right after the prefix: each inclusion with the
    /// char offset it starts at. Inclusions already carried by an affix are
    /// skipped.
    pub fn layout(&self) -> Vec<(usize, &str)> {
        let mut cursor = self.prefix.as_deref().map_or(0, char_len);
        let mut segments = Vec::new();
        for inclusion in &self.includes {
            if inclusion.position.is_none() && self.affix_contains(&inclusion.value) {
                continue;
            }
            let start = inclusion.position.map_or(cursor, |position| position.max(cursor));
            segments.push((start, inclusion.value.as_str()));
            cursor = start + char_len(&inclusion.value);
        }
        segments
    }

    /// Shortest length able to hold the prefix, every laid-out inclusion and
    /// the suffix. With nothing laid out in between, the suffix may reuse the
    /// tail of the prefix.
    pub fn required_length(&self) -> usize {
        let prefix = self.prefix.as_deref().map_or(0, char_len);
        let suffix = self.suffix.as_deref().map_or(0, char_len);
        match self.layout().last() {
            Some((start, value)) => start + char_len(value) + suffix,
            None => {
                let shared = match (&self.prefix, &self.suffix) {
                    (Some(prefix), Some(suffix)) => affix_overlap(prefix, suffix),
                    _ => 0,
                };
                prefix + suffix - shared
            }
        }
    }

    fn affix_contains(&self, needle: &str) -> bool {
        self.prefix.as_deref().is_some_and(|prefix| prefix.contains(needle))
            || self.suffix.as_deref().is_some_and(|suffix| suffix.contains(needle))
    }
}

/// Longest run of chars that ends `prefix` and starts `suffix`.
fn affix_overlap(prefix: &str, suffix: &str) -> usize {
    let prefix: Vec<char> = prefix.chars().collect();
    let suffix: Vec<char> = suffix.chars().collect();
    (1..=prefix.len().min(suffix.len()))
        .rev()
        .find(|&shared| prefix[prefix.len() - shared..] == suffix[..shared])
        .unwrap_or(0)
}

pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn fold_number(checks: &[NumberCheck]) -> Result<NumberBounds> {
    let mut bounds = NumberBounds::default();
    for check in checks {
        match check {
            NumberCheck::Min { value, inclusive } => {
                if value.is_nan() {
                    return Err(Error::invalid("number lower bound is NaN"));
                }
                bounds.min = Some(tighter_lower(bounds.min, *value, *inclusive));
            }
            NumberCheck::Max { value, inclusive } => {
                if value.is_nan() {
                    return Err(Error::invalid("number upper bound is NaN"));
                }
                bounds.max = Some(tighter_upper(bounds.max, *value, *inclusive));
            }
            NumberCheck::MultipleOf { value } => {
                if !value.is_finite() || *value <= 0.0 {
                    return Err(Error::invalid(format!(
                        "multipleOf must be a positive finite number, got {value}"
                    )));
                }
                bounds.multiple_of = Some(match bounds.multiple_of {
                    Some(current) => lcm_f64(current, *value).ok_or_else(|| {
                        Error::invalid(format!(
                            "common multiple of {current} and {value} is not representable"
                        ))
                    })?,
                    None => *value,
                });
            }
            NumberCheck::Int => bounds.integer = true,
            NumberCheck::Finite => bounds.finite = true,
        }
    }

    if let (Some(multiple), true) = (bounds.multiple_of, bounds.integer) {
        if lcm_f64(multiple, 1.0).is_none() {
            return Err(Error::invalid(format!(
                "no integer multiple of {multiple} is representable"
            )));
        }
    }

    if let (Some(lo), Some(hi)) = (bounds.min, bounds.max) {
        let empty = lo.value > hi.value
            || (lo.value == hi.value && !(lo.inclusive && hi.inclusive));
        if empty {
            return Err(Error::infeasible(format!(
                "number range is empty: {} {} .. {} {}",
                if lo.inclusive { ">=" } else { ">" },
                lo.value,
                if hi.inclusive { "<=" } else { "<" },
                hi.value
            )));
        }
        if let Some(step) = bounds.step() {
            let first = first_index(lo.value, lo.inclusive, step);
            let last = last_index(hi.value, hi.inclusive, step);
            if first > last {
                return Err(Error::infeasible(format!(
                    "no multiple of {step} between {} and {}",
                    lo.value, hi.value
                )));
            }
        }
    }
    Ok(bounds)
}

fn tighter_lower(current: Option<Bound<f64>>, value: f64, inclusive: bool) -> Bound<f64> {
    match current {
        Some(bound) if bound.value > value => bound,
        Some(bound) if bound.value == value => Bound {
            value,
            inclusive: bound.inclusive && inclusive,
        },
        _ => Bound { value, inclusive },
    }
}

fn tighter_upper(current: Option<Bound<f64>>, value: f64, inclusive: bool) -> Bound<f64> {
    match current {
        Some(bound) if bound.value < value => bound,
        Some(bound) if bound.value == value => Bound {
            value,
            inclusive: bound.inclusive && inclusive,
        },
        _ => Bound { value, inclusive },
    }
}

pub fn fold_bigint(checks: &[BigIntCheck]) -> Result<BigIntBounds> {
    let mut bounds = BigIntBounds::default();
    for check in checks {
        match check {
            BigIntCheck::Min { value, inclusive } => {
                let value = if *inclusive { *value } else { value.saturating_add(1) };
                bounds.min = Some(bounds.min.map_or(value, |current| current.max(value)));
            }
            BigIntCheck::Max { value, inclusive } => {
                let value = if *inclusive { *value } else { value.saturating_sub(1) };
                bounds.max = Some(bounds.max.map_or(value, |current| current.min(value)));
            }
            BigIntCheck::MultipleOf { value } => {
                if *value == 0 {
                    return Err(Error::invalid("bigint multipleOf must be non-zero"));
                }
                let value = value.unsigned_abs() as i128;
                bounds.multiple_of = Some(match bounds.multiple_of {
                    Some(current) => lcm_i128(current, value),
                    None => value,
                });
            }
        }
    }

    if let (Some(lo), Some(hi)) = (bounds.min, bounds.max) {
        if lo > hi {
            return Err(Error::infeasible(format!("bigint range is empty: {lo} .. {hi}")));
        }
        if let Some(step) = bounds.multiple_of {
            let first = ceil_div(lo, step);
            let last = hi.div_euclid(step);
            if first > last {
                return Err(Error::infeasible(format!(
                    "no multiple of {step} between {lo} and {hi}"
                )));
            }
        }
    }
    Ok(bounds)
}

pub fn fold_date(checks: &[DateCheck]) -> Result<DateBounds> {
    let mut bounds = DateBounds::default();
    for check in checks {
        match check {
            DateCheck::Min { value } => {
                let millis = value.timestamp_millis();
                bounds.min = Some(bounds.min.map_or(millis, |current| current.max(millis)));
            }
            DateCheck::Max { value } => {
                let millis = value.timestamp_millis();
                bounds.max = Some(bounds.max.map_or(millis, |current| current.min(millis)));
            }
        }
    }
    if let (Some(lo), Some(hi)) = (bounds.min, bounds.max) {
        if lo > hi {
            return Err(Error::infeasible(format!(
                "date range is empty: {} .. {}",
                format_millis(lo),
                format_millis(hi)
            )));
        }
    }
    Ok(bounds)
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |date| date.to_rfc3339())
}

pub fn fold_size(checks: &[SizeCheck]) -> Result<SizeBounds> {
    let mut bounds = SizeBounds::default();
    for check in checks {
        match *check {
            SizeCheck::Min { value } => bounds.min = bounds.min.max(value),
            SizeCheck::Max { value } => {
                bounds.max = Some(bounds.max.map_or(value, |current| current.min(value)));
            }
            SizeCheck::Exact { value } => {
                bounds.min = bounds.min.max(value);
                bounds.max = Some(bounds.max.map_or(value, |current| current.min(value)));
            }
        }
    }
    if let Some(max) = bounds.max {
        if bounds.min > max {
            return Err(Error::infeasible(format!(
                "size range is empty: min {} > max {max}",
                bounds.min
            )));
        }
    }
    Ok(bounds)
}

pub fn fold_string(checks: &[StringCheck]) -> Result<StringConstraints> {
    let mut folded = StringConstraints::default();
    for check in checks {
        match check {
            StringCheck::MinLength { value } => folded.min_length = folded.min_length.max(*value),
            StringCheck::MaxLength { value } => {
                folded.max_length = Some(folded.max_length.map_or(*value, |max| max.min(*value)));
            }
            StringCheck::Length { value } => {
                folded.min_length = folded.min_length.max(*value);
                folded.max_length = Some(folded.max_length.map_or(*value, |max| max.min(*value)));
            }
            StringCheck::Pattern { regex } => {
                let compiled = Regex::new(regex)
                    .map_err(|err| Error::invalid(format!("invalid pattern {regex:?}: {err}")))?;
                folded.patterns.push(compiled);
            }
            StringCheck::StartsWith { value } => {
                folded.prefix = Some(merge_prefix(folded.prefix.take(), value)?);
            }
            StringCheck::EndsWith { value } => {
                folded.suffix = Some(merge_suffix(folded.suffix.take(), value)?);
            }
            StringCheck::Includes { value, position } => {
                let inclusion = Inclusion {
                    value: value.clone(),
                    position: *position,
                };
                if !folded.includes.contains(&inclusion) {
                    folded.includes.push(inclusion);
                }
            }
            StringCheck::ToUpperCase => folded.case = Some(merge_case(folded.case, Case::Upper)?),
            StringCheck::ToLowerCase => folded.case = Some(merge_case(folded.case, Case::Lower)?),
            StringCheck::Trim => folded.trim = true,
            StringCheck::Format { format } => match folded.format {
                Some(existing) if existing != *format => {
                    return Err(Error::infeasible(format!(
                        "string cannot be both {} and {}",
                        existing.as_str(),
                        format.as_str()
                    )));
                }
                _ => folded.format = Some(*format),
            },
        }
    }

    if let Some(max) = folded.max_length {
        if folded.min_length > max {
            return Err(Error::infeasible(format!(
                "string length range is empty: min {} > max {max}",
                folded.min_length
            )));
        }
    }

    if let Some(case) = folded.case {
        let fixed = folded
            .prefix
            .iter()
            .chain(folded.suffix.iter())
            .chain(folded.includes.iter().map(|inclusion| &inclusion.value));
        for affix in fixed {
            if case.apply(affix) != *affix {
                return Err(Error::infeasible(format!(
                    "required text {affix:?} does not survive {case:?} case conversion"
                )));
            }
        }
    }

    if let Some(max) = folded.max_length {
        let required = folded.required_length();
        if required > max {
            return Err(Error::infeasible(format!(
                "required text needs {required} chars but max length is {max}"
            )));
        }
    }
    Ok(folded)
}

fn merge_prefix(current: Option<String>, value: &str) -> Result<String> {
    match current {
        None => Ok(value.to_string()),
        Some(existing) if existing.starts_with(value) => Ok(existing),
        Some(existing) if value.starts_with(existing.as_str()) => Ok(value.to_string()),
        Some(existing) => Err(Error::infeasible(format!(
            "conflicting prefixes {existing:?} and {value:?}"
        ))),
    }
}

fn merge_suffix(current: Option<String>, value: &str) -> Result<String> {
    match current {
        None => Ok(value.to_string()),
        Some(existing) if existing.ends_with(value) => Ok(existing),
        Some(existing) if value.ends_with(existing.as_str()) => Ok(value.to_string()),
        Some(existing) => Err(Error::infeasible(format!(
            "conflicting suffixes {existing:?} and {value:?}"
        ))),
    }
}

fn merge_case(current: Option<Case>, case: Case) -> Result<Case> {
    match current {
        Some(existing) if existing != case => Err(Error::infeasible(
            "string cannot be converted to both upper and lower case",
        )),
        _ => Ok(case),
    }
}

/// Rounds `value` to the nearest integer when it is within tolerance of it.
pub fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= SNAP_TOLERANCE * value.abs().max(1.0) {
        rounded
    } else {
        value
    }
}

/// Smallest grid index whose multiple satisfies the lower bound.
pub fn first_index(lower: f64, inclusive: bool, step: f64) -> f64 {
    let quotient = snap(lower / step);
    let index = quotient.ceil();
    if !inclusive && index == quotient {
        index + 1.0
    } else {
        index
    }
}

/// Largest grid index whose multiple satisfies the upper bound.
pub fn last_index(upper: f64, inclusive: bool, step: f64) -> f64 {
    let quotient = snap(upper / step);
    let index = quotient.floor();
    if !inclusive && index == quotient {
        index - 1.0
    } else {
        index
    }
}

/// Float-safe divisibility test.
pub fn is_multiple_of(value: f64, step: f64) -> bool {
    let quotient = value / step;
    quotient.is_finite() && snap(quotient) == quotient.round()
}

pub fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a
}

pub fn lcm_i128(a: i128, b: i128) -> i128 {
    let (a, b) = (a.unsigned_abs(), b.unsigned_abs());
    if a == 0 || b == 0 {
        return 0;
    }
    let lcm = a / gcd_u128(a, b) * b;
    i128::try_from(lcm).unwrap_or(i128::MAX)
}

/// Least common multiple of two positive decimals, computed on values scaled
/// to integers by their decimal places. `None` when the scaled values do not
/// fit an integer.
pub fn lcm_f64(a: f64, b: f64) -> Option<f64> {
    let decimals = decimal_places(a).max(decimal_places(b));
    let scale = 10f64.powi(decimals);
    let (sa, sb) = ((a * scale).round(), (b * scale).round());
    if sa <= 0.0 || sb <= 0.0 || sa > u64::MAX as f64 || sb > u64::MAX as f64 {
        return None;
    }
    let (ia, ib) = (sa as u128, sb as u128);
    let lcm = ia / gcd_u128(ia, ib) * ib;
    Some(lcm as f64 / scale)
}

fn decimal_places(value: f64) -> i32 {
    let mut scaled = value;
    for places in 0..MAX_DECIMALS {
        if (scaled - scaled.round()).abs() <= SNAP_TOLERANCE * scaled.abs().max(1.0) {
            return places;
        }
        scaled *= 10.0;
    }
    MAX_DECIMALS
}

fn ceil_div(value: i128, step: i128) -> i128 {
    let floor = value.div_euclid(step);
    if value.rem_euclid(step) == 0 { floor } else { floor + 1 }
}

/// Smallest float strictly greater than `value`.
pub fn next_up(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1);
    }
    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Largest float strictly less than `value`.
pub fn next_down(value: f64) -> f64 {
    -next_up(-value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_wins_on_equal_lower_bounds() {
        let bounds = fold_number(&[NumberCheck::gte(3.0), NumberCheck::gt(3.0)]).expect("fold");
        assert_eq!(
            bounds.min,
            Some(Bound {
                value: 3.0,
                inclusive: false
            })
        );
    }

    #[test]
    fn crossing_number_bounds_are_infeasible() {
        let result = fold_number(&[NumberCheck::gte(10.0), NumberCheck::lte(5.0)]);
        assert!(matches!(result, Err(Error::InfeasibleConstraint(_))));
    }

    #[test]
    fn touching_exclusive_bounds_are_infeasible() {
        let result = fold_number(&[NumberCheck::gte(5.0), NumberCheck::lt(5.0)]);
        assert!(matches!(result, Err(Error::InfeasibleConstraint(_))));
    }

    #[test]
    fn zero_multiple_is_invalid() {
        let result = fold_number(&[NumberCheck::MultipleOf { value: 0.0 }]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn multiples_combine_by_lcm() {
        let bounds = fold_number(&[
            NumberCheck::MultipleOf { value: 4.0 },
            NumberCheck::MultipleOf { value: 6.0 },
        ])
        .expect("fold");
        assert_eq!(bounds.multiple_of, Some(12.0));
    }

    #[test]
    fn decimal_multiples_combine_by_scaled_lcm() {
        assert!((lcm_f64(0.1, 0.25).expect("lcm") - 0.5).abs() < 1e-12);
        assert!((lcm_f64(0.5, 1.0).expect("lcm") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_integer_in_open_unit_interval() {
        let result = fold_number(&[NumberCheck::Int, NumberCheck::gt(0.0), NumberCheck::lt(1.0)]);
        assert!(matches!(result, Err(Error::InfeasibleConstraint(_))));
    }

    #[test]
    fn step_indices_respect_exclusive_bounds() {
        let bounds = fold_number(&[
            NumberCheck::MultipleOf { value: 5.0 },
            NumberCheck::gt(10.0),
            NumberCheck::lte(20.0),
        ])
        .expect("fold");
        assert_eq!(bounds.step_indices(5.0, 100.0), Some((3.0, 4.0)));
    }

    #[test]
    fn float_neighbours_are_strict() {
        assert!(next_up(1.0) > 1.0);
        assert!(next_down(1.0) < 1.0);
        assert!(next_up(0.0) > 0.0);
        assert!(next_down(0.0) < 0.0);
        assert!(next_up(-1.0) > -1.0);
    }

    #[test]
    fn bigint_exclusive_bounds_normalize() {
        let bounds = fold_bigint(&[
            BigIntCheck::Min {
                value: 1,
                inclusive: false,
            },
            BigIntCheck::lte(3),
        ])
        .expect("fold");
        assert_eq!(bounds.min, Some(2));
        assert_eq!(bounds.max, Some(3));
        assert!(fold_bigint(&[BigIntCheck::gte(5), BigIntCheck::lte(4)]).is_err());
    }

    #[test]
    fn exact_size_pins_both_ends() {
        let bounds = fold_size(&[SizeCheck::Exact { value: 3 }]).expect("fold");
        assert_eq!(bounds.min, 3);
        assert_eq!(bounds.max, Some(3));
        assert!(fold_size(&[SizeCheck::Min { value: 5 }, SizeCheck::Max { value: 2 }]).is_err());
    }

    #[test]
    fn longest_compatible_prefix_wins() {
        let folded = fold_string(&[
            StringCheck::StartsWith {
                value: "ab".to_string(),
            },
            StringCheck::StartsWith {
                value: "abc".to_string(),
            },
        ])
        .expect("fold");
        assert_eq!(folded.prefix.as_deref(), Some("abc"));
    }

    #[test]
    fn incompatible_prefixes_are_infeasible() {
        let result = fold_string(&[
            StringCheck::StartsWith {
                value: "ab".to_string(),
            },
            StringCheck::StartsWith {
                value: "x".to_string(),
            },
        ]);
        assert!(matches!(result, Err(Error::InfeasibleConstraint(_))));
    }

    #[test]
    fn affixes_must_survive_case_conversion() {
        let result = fold_string(&[
            StringCheck::ToUpperCase,
            StringCheck::StartsWith {
                value: "ab".to_string(),
            },
        ]);
        assert!(matches!(result, Err(Error::InfeasibleConstraint(_))));
    }

    #[test]
    fn affixes_longer_than_max_length_are_infeasible() {
        let result = fold_string(&[
            StringCheck::StartsWith {
                value: "hello".to_string(),
            },
            StringCheck::EndsWith {
                value: "world".to_string(),
            },
            StringCheck::MaxLength { value: 8 },
        ]);
        assert!(matches!(result, Err(Error::InfeasibleConstraint(_))));
    }

    #[test]
    fn overlapping_affixes_share_characters() {
        let folded = fold_string(&[
            StringCheck::StartsWith {
                value: "ab".to_string(),
            },
            StringCheck::EndsWith {
                value: "b".to_string(),
            },
            StringCheck::Length { value: 2 },
        ])
        .expect("\"ab\" satisfies every check");
        assert_eq!(folded.required_length(), 2);

        let chained = fold_string(&[
            StringCheck::StartsWith {
                value: "abc".to_string(),
            },
            StringCheck::EndsWith {
                value: "cde".to_string(),
            },
        ])
        .expect("fold");
        assert_eq!(chained.required_length(), 5);
        assert_eq!(affix_overlap("ab", "xy"), 0);
    }

    #[test]
    fn unrepresentable_common_multiple_is_invalid() {
        assert_eq!(lcm_f64(1e10, 1e-12), None);
        let result = fold_number(&[
            NumberCheck::MultipleOf { value: 1e10 },
            NumberCheck::MultipleOf { value: 1e-12 },
        ]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn positioned_inclusion_is_laid_out_after_prefix() {
        let folded = fold_string(&[
            StringCheck::StartsWith {
                value: "id-".to_string(),
            },
            StringCheck::Includes {
                value: "x".to_string(),
                position: Some(5),
            },
        ])
        .expect("fold");
        assert_eq!(folded.layout(), vec![(5, "x")]);
        assert_eq!(folded.required_length(), 6);
    }
}
