//! Duration strings in the `15s` / `1m30s` / `250ms` form.
//!
//! A duration is an optional sign followed by one or more decimal numbers,
//! each with an optional fraction and a mandatory unit: `ns`, `us` (or
//! `µs`/`μs`), `ms`, `s`, `m`, `h`. The lone string `0` is also accepted.
//! Negative values parse but are rejected, since a negative timeout has
//! no meaning here.

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationParseError {
    input: String,
    kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ErrorKind {
    Invalid,
    MissingUnit,
    UnknownUnit(String),
    Negative,
    Overflow,
}

impl fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Invalid => write!(f, "time: invalid duration {:?}", self.input),
            ErrorKind::MissingUnit => {
                write!(f, "time: missing unit in duration {:?}", self.input)
            }
            ErrorKind::UnknownUnit(unit) => write!(
                f,
                "time: unknown unit {unit:?} in duration {:?}",
                self.input
            ),
            ErrorKind::Negative => write!(f, "time: negative duration {:?}", self.input),
            ErrorKind::Overflow => write!(f, "time: invalid duration {:?}", self.input),
        }
    }
}

impl std::error::Error for DurationParseError {}

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("\u{b5}s", 1_000),
    ("\u{3bc}s", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
];

pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let err = |kind| DurationParseError {
        input: input.to_string(),
        kind,
    };

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(err(ErrorKind::Invalid));
    }

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err(ErrorKind::Invalid));
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map_or(rest.len(), |(i, _)| i);
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        if unit.is_empty() {
            return Err(err(ErrorKind::MissingUnit));
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| err(ErrorKind::UnknownUnit(unit.to_string())))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err(ErrorKind::Overflow))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| err(ErrorKind::Overflow))?;

        // fraction digits beyond nanosecond precision are truncated
        let mut place = scale;
        for digit in frac_part.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            nanos += u128::from(digit - b'0') * place;
        }

        total_nanos = total_nanos
            .checked_add(nanos)
            .ok_or_else(|| err(ErrorKind::Overflow))?;
    }

    if negative && total_nanos > 0 {
        return Err(err(ErrorKind::Negative));
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).map_err(|_| err(ErrorKind::Overflow))?;
    // remainder is always below 1e9
    let subsec = (total_nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec))
}
