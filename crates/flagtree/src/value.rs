//! Typed storage cells that flags bind to.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A user-defined value kind.
///
/// Implementors are stored as [`Value::Custom`] and read back through
/// [`Value::custom_ref`].
pub trait CustomValue: fmt::Debug + Any {
    /// Update the value from its textual form.
    fn set(&mut self, raw: &str) -> Result<(), ValueError>;

    /// Boolean values never consume a separate argument token.
    fn is_boolean(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Discriminant of a [`Value`], as exposed in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    Bool,
    BoolList,
    Int,
    Uint,
    Float,
    String,
    StringList,
    Duration,
    Custom,
}

/// The storage cell owned by one flag.
///
/// List variants append on every `set`; scalar variants are overwritten, so
/// repeated flags accumulate or take the last occurrence depending only on
/// the variant.
#[derive(Debug)]
pub enum Value {
    Bool(bool),
    BoolList(Vec<bool>),
    /// Signed integer range-checked to `bits` width.
    Int { bits: u32, value: i64 },
    /// Unsigned integer range-checked to `bits` width.
    Uint { bits: u32, value: u64 },
    Float(f64),
    String(String),
    StringList(Vec<String>),
    Duration(Duration),
    Custom(Box<dyn CustomValue>),
}

impl Value {
    pub fn int(bits: u32) -> Self {
        Self::Int {
            bits: bits.clamp(1, 64),
            value: 0,
        }
    }

    pub fn uint(bits: u32) -> Self {
        Self::Uint {
            bits: bits.clamp(1, 64),
            value: 0,
        }
    }

    pub fn custom(value: impl CustomValue) -> Self {
        Self::Custom(Box::new(value))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::BoolList(_) => ValueKind::BoolList,
            Self::Int { .. } => ValueKind::Int,
            Self::Uint { .. } => ValueKind::Uint,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::StringList(_) => ValueKind::StringList,
            Self::Duration(_) => ValueKind::Duration,
            Self::Custom(_) => ValueKind::Custom,
        }
    }

    /// Whether the flag is set by its mere presence (`-v`, `--verbose`).
    pub fn is_boolean(&self) -> bool {
        match self {
            Self::Bool(_) | Self::BoolList(_) => true,
            Self::Custom(c) => c.is_boolean(),
            _ => false,
        }
    }

    /// Whether repeated occurrences accumulate.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::BoolList(_) | Self::StringList(_))
    }

    /// Update the value from its textual form. On error the value is unchanged.
    pub fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        match self {
            Self::Bool(b) => *b = parse_bool(raw)?,
            Self::BoolList(list) => list.push(parse_bool(raw)?),
            Self::Int { bits, value } => *value = parse_signed(raw, *bits)?,
            Self::Uint { bits, value } => *value = parse_unsigned(raw, *bits)?,
            Self::Float(f) => {
                *f = raw
                    .parse()
                    .map_err(|_| ValueError::InvalidFloat(raw.to_string()))?
            }
            Self::String(s) => *s = raw.to_string(),
            Self::StringList(list) => list.push(raw.to_string()),
            Self::Duration(d) => *d = parse_duration(raw)?,
            Self::Custom(c) => c.set(raw)?,
        }
        Ok(())
    }

    /// Borrow a custom value as its concrete type.
    pub fn custom_ref<T: CustomValue>(&self) -> Option<&T> {
        match self {
            Self::Custom(c) => c.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::BoolList(list) => write!(f, "{list:?}"),
            Self::Int { value, .. } => write!(f, "{value}"),
            Self::Uint { value, .. } => write!(f, "{value}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::StringList(list) => write!(f, "{list:?}"),
            Self::Duration(d) => write!(f, "{d:?}"),
            Self::Custom(c) => write!(f, "{c:?}"),
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::InvalidBool(raw.to_string())),
    }
}

/// Split an optional base prefix: `0x`, `0o`, `0b`, or a leading `0` for octal.
fn split_radix(digits: &str) -> (u32, &str) {
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(body) = digits.strip_prefix(prefix) {
            return (radix, body);
        }
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return (8, &digits[1..]);
    }
    (10, digits)
}

fn parse_magnitude(raw: &str, digits: &str, bits: u32) -> Result<u128, ValueError> {
    let (radix, body) = split_radix(digits);
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return Err(ValueError::InvalidInt(raw.to_string()));
    }
    // All digits are valid, so a failure here can only be overflow.
    u128::from_str_radix(body, radix).map_err(|_| ValueError::OutOfRange {
        value: raw.to_string(),
        bits,
    })
}

fn parse_signed(raw: &str, bits: u32) -> Result<i64, ValueError> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let magnitude = parse_magnitude(raw, digits, bits)?;
    let limit = 1u128 << (bits - 1);
    let in_range = if negative {
        magnitude <= limit
    } else {
        magnitude < limit
    };
    if !in_range {
        return Err(ValueError::OutOfRange {
            value: raw.to_string(),
            bits,
        });
    }
    let value = if negative {
        -(magnitude as i128)
    } else {
        magnitude as i128
    };
    Ok(value as i64)
}

fn parse_unsigned(raw: &str, bits: u32) -> Result<u64, ValueError> {
    let magnitude = parse_magnitude(raw, raw, bits)?;
    if magnitude >= 1u128 << bits {
        return Err(ValueError::OutOfRange {
            value: raw.to_string(),
            bits,
        });
    }
    Ok(magnitude as u64)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => return None,
    })
}

/// Parse durations such as `300ms`, `1m30s` or `1.5h`.
pub(crate) fn parse_duration(raw: &str) -> Result<Duration, ValueError> {
    let invalid = || ValueError::InvalidDuration(raw.to_string());

    let s = raw.strip_prefix('+').unwrap_or(raw);
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() || s.starts_with('-') {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_len);

        let (frac_part, after) = match after.strip_prefix('.') {
            Some(frac) => {
                let frac_len = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
                frac.split_at(frac_len)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(invalid)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;

        // Digits past nanosecond precision cannot change the result.
        let frac_part = &frac_part[..frac_part.len().min(18)];
        if !frac_part.is_empty() {
            let frac: u128 = frac_part.parse().map_err(|_| invalid())?;
            let denom = 10u128.pow(frac_part.len() as u32);
            nanos = nanos
                .checked_add(frac * scale / denom)
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = after;
    }

    let secs = u64::try_from(total / 1_000_000_000).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % 1_000_000_000) as u32))
}
