use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use rand_regex::Regex as RandRegex;
use specimen_core::algebra::{char_len, snap};
use specimen_core::{
    BigIntDef, DateDef, Error, NumberDef, Schema, StringConstraints, StringDef, Value, conforms,
    fold_bigint, fold_date, fold_number, fold_string,
};
use tracing::warn;

use crate::errors::GenerationError;
use crate::generators::formats;
use crate::model::GenerateOptions;

pub(crate) const DEFAULT_CHARSET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 2000-01-01T00:00:00Z. Centre of the window drawn from when a date has no
/// bounds.
const DATE_ANCHOR_MS: i64 = 946_684_800_000;
/// Roughly ten years.
const DATE_SPAN_MS: i64 = 315_576_000_000;

pub(crate) fn number(
    def: &NumberDef,
    options: &GenerateOptions,
    rng: &mut dyn RngCore,
) -> Result<f64, Error> {
    let bounds = fold_number(&def.checks)?;
    let (lo, hi) = bounds.closed_range(options.numeric_span);
    let (lo, hi) = (lo.max(f64::MIN), hi.min(f64::MAX));

    let Some(step) = bounds.step() else {
        if lo > hi {
            return Err(Error::infeasible(format!("number range {lo}..={hi} is empty")));
        }
        let t: f64 = rng.random();
        let value = (lo * (1.0 - t) + hi * t).clamp(lo, hi);
        return Ok(value);
    };

    let (first, last) = bounds
        .step_indices(step, options.numeric_span)
        .ok_or_else(|| {
            Error::infeasible(format!("no multiple of {step} lies within {lo}..={hi}"))
        })?;
    let index = rng.random_range(first as i64..=last as i64);
    let candidate = snap(index as f64 * step);
    if bounds.contains(candidate) {
        return Ok(candidate);
    }
    let clamped = candidate.clamp(lo, hi);
    if bounds.contains(clamped) {
        Ok(clamped)
    } else {
        Err(Error::infeasible(format!(
            "multiple {candidate} of {step} drifted outside {lo}..={hi}"
        )))
    }
}

pub(crate) fn bigint(
    def: &BigIntDef,
    options: &GenerateOptions,
    rng: &mut dyn RngCore,
) -> Result<i128, Error> {
    let bounds = fold_bigint(&def.checks)?;
    let (lo, hi) = bounds.closed_range(options.numeric_span as i128);
    let step = bounds.multiple_of.unwrap_or(1).abs().max(1);
    let first = ceil_div(lo, step);
    let last = hi.div_euclid(step);
    if first > last {
        return Err(Error::infeasible(format!(
            "no multiple of {step} lies within {lo}..={hi}"
        )));
    }
    let index = rng.random_range(first..=last);
    index
        .checked_mul(step)
        .ok_or_else(|| Error::infeasible(format!("{index} * {step} overflows")))
}

pub(crate) fn date(def: &DateDef, rng: &mut dyn RngCore) -> Result<DateTime<Utc>, Error> {
    let bounds = fold_date(&def.checks)?;
    let (lo, hi) = match (bounds.min, bounds.max) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo.saturating_add(DATE_SPAN_MS)),
        (None, Some(hi)) => (hi.saturating_sub(DATE_SPAN_MS), hi),
        (None, None) => (DATE_ANCHOR_MS - DATE_SPAN_MS, DATE_ANCHOR_MS + DATE_SPAN_MS),
    };
    let lo = lo.max(DateTime::<Utc>::MIN_UTC.timestamp_millis());
    let hi = hi.min(DateTime::<Utc>::MAX_UTC.timestamp_millis());
    let millis = rng.random_range(lo..=hi);
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::invalid(format!("{millis}ms is not a representable date")))
}

/// Draws strings until one passes every check on `schema`.
///
/// A dedicated format wins over everything else, then patterns, then free
/// alphanumeric text with the required affixes spliced in.
pub(crate) fn string(
    schema: &Schema,
    def: &StringDef,
    options: &GenerateOptions,
    rng: &mut dyn RngCore,
) -> Result<String, GenerationError> {
    let folded = fold_string(&def.checks)?;
    let samplers = if folded.format.is_none() && !folded.patterns.is_empty() {
        compile_patterns(&folded, options)?
    } else {
        Vec::new()
    };

    for attempt in 0..options.max_attempts.max(1) {
        let candidate = match (folded.format, samplers.is_empty()) {
            (Some(format), _) => formats::generate(format, rng),
            (None, false) => {
                let sampler = &samplers[attempt as usize % samplers.len()];
                patch(&folded, rng.sample(sampler))
            }
            (None, true) => free_text(&folded, options, rng),
        };
        let candidate = match folded.case {
            Some(case) => case.apply(&candidate),
            None => candidate,
        };
        if conforms(schema, &Value::String(candidate.clone())).is_ok() {
            return Ok(candidate);
        }
    }

    warn!(
        attempts = options.max_attempts,
        format = ?folded.format,
        patterns = folded.patterns.len(),
        "string sampling gave up"
    );
    Err(Error::infeasible(format!(
        "no string satisfying every check found in {} attempts",
        options.max_attempts
    ))
    .into())
}

fn compile_patterns(
    folded: &StringConstraints,
    options: &GenerateOptions,
) -> Result<Vec<RandRegex>, Error> {
    let max_repeat = folded
        .max_length
        .unwrap_or(options.default_string_max)
        .max(1)
        .min(u32::MAX as usize) as u32;
    folded
        .patterns
        .iter()
        .map(|pattern| {
            RandRegex::compile(unanchored(pattern.as_str()), max_repeat).map_err(|err| {
                Error::invalid(format!("pattern {} cannot be sampled: {err}", pattern.as_str()))
            })
        })
        .collect()
}

/// Strips a leading `^` and an unescaped trailing `$`; sampling always
/// produces the whole match.
fn unanchored(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(body) if !body.ends_with('\\') => body,
        _ => pattern,
    }
}

/// Writes missing affixes over the ends of a pattern sample, so a sample of
/// the right shape usually keeps matching.
fn patch(folded: &StringConstraints, sample: String) -> String {
    let mut chars: Vec<char> = sample.chars().collect();
    if let Some(prefix) = &folded.prefix {
        if !sample.starts_with(prefix.as_str()) {
            overlay(&mut chars, 0, prefix);
        }
    }
    if let Some(suffix) = &folded.suffix {
        if !sample.ends_with(suffix.as_str()) {
            let start = chars.len().saturating_sub(char_len(suffix));
            overlay(&mut chars, start, suffix);
        }
    }
    chars.into_iter().collect()
}

/// Replaces chars from `start` on with `text`, growing the buffer as needed.
fn overlay(chars: &mut Vec<char>, start: usize, text: &str) {
    for (offset, ch) in text.chars().enumerate() {
        match chars.get_mut(start + offset) {
            Some(slot) => *slot = ch,
            None => chars.push(ch),
        }
    }
}

fn free_text(
    folded: &StringConstraints,
    options: &GenerateOptions,
    rng: &mut dyn RngCore,
) -> String {
    let min = folded.min_length.max(folded.required_length());
    let max = folded
        .max_length
        .unwrap_or_else(|| min.max(options.default_string_max))
        .max(min);
    let len = rng.random_range(min..=max);

    let charset: Vec<char> = DEFAULT_CHARSET.chars().collect();
    let mut chars: Vec<char> = (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())])
        .collect();

    if let Some(prefix) = &folded.prefix {
        overlay(&mut chars, 0, prefix);
    }
    for (start, text) in folded.layout() {
        overlay(&mut chars, start, text);
    }
    if let Some(suffix) = &folded.suffix {
        overlay(&mut chars, len - char_len(suffix), suffix);
    }
    chars.into_iter().collect()
}

fn ceil_div(value: i128, step: i128) -> i128 {
    let floor = value.div_euclid(step);
    if value.rem_euclid(step) == 0 { floor } else { floor + 1 }
}
