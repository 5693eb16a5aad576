//! Dotted-key access to the loaded configuration document.
//!
//! # Lookup rules
//! - Keys are dotted paths into nested YAML mappings (`fiber.idleTimeout`).
//! - Every path segment matches case-insensitively.
//! - A missing key, or a value that cannot be cast to the requested type,
//!   yields the type's zero value (`""`, `false`, `0`, zero duration).
//!
//! Callers that need a non-zero default check [`ConfigStore::is_set`] first,
//! or use the `*_or` accessors.

use std::time::Duration;

use serde_yaml::Value;

/// Immutable view over a parsed YAML configuration document.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    root: Value,
}

impl ConfigStore {
    /// Wrap an already parsed document. A null document behaves as empty.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        let root: Value = serde_yaml::from_str(source)?;
        Ok(Self::new(root))
    }

    /// Raw value at `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in key.split('.') {
            let mapping = current.as_mapping()?;
            current = mapping.iter().find_map(|(k, v)| {
                k.as_str()
                    .filter(|name| name.eq_ignore_ascii_case(segment))
                    .map(|_| v)
            })?;
        }
        Some(current)
    }

    /// Whether `key` is present with a non-null value.
    pub fn is_set(&self, key: &str) -> bool {
        matches!(self.get(key), Some(value) if !value.is_null())
    }

    pub fn get_string(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => parse_bool(s).unwrap_or(false),
            _ => false,
        }
    }

    pub fn get_u64(&self, key: &str) -> u64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Bool(b)) => u64::from(*b),
            _ => 0,
        }
    }

    pub fn get_u32(&self, key: &str) -> u32 {
        u32::try_from(self.get_u64(key)).unwrap_or(0)
    }

    pub fn get_usize(&self, key: &str) -> usize {
        usize::try_from(self.get_u64(key)).unwrap_or(0)
    }

    /// Durations accept Go-style strings (`"1h30m"`, `"250ms"`). Bare numbers
    /// and unit-less numeric strings are nanoseconds.
    pub fn get_duration(&self, key: &str) -> Duration {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .map(Duration::from_nanos)
                .unwrap_or_default(),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.contains(|c: char| "nsuµμmh".contains(c)) {
                    parse_go_duration(s).unwrap_or_default()
                } else {
                    s.parse().map(Duration::from_nanos).unwrap_or_default()
                }
            }
            _ => Duration::ZERO,
        }
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        if self.is_set(key) {
            self.get_string(key)
        } else {
            default.to_string()
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        if self.is_set(key) {
            self.get_bool(key)
        } else {
            default
        }
    }

    pub fn u32_or(&self, key: &str, default: u32) -> u32 {
        if self.is_set(key) {
            self.get_u32(key)
        } else {
            default
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        if self.is_set(key) {
            self.get_u64(key)
        } else {
            default
        }
    }

    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        if self.is_set(key) {
            self.get_usize(key)
        } else {
            default
        }
    }

    pub fn duration_or(&self, key: &str, default: Duration) -> Duration {
        if self.is_set(key) {
            self.get_duration(key)
        } else {
            default
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a Go duration string such as `"300ms"`, `"1.5h"` or `"2h45m"`.
///
/// Valid units are `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`. Negative values are
/// rejected since they have no `Duration` representation.
pub fn parse_go_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return None,
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        total = total.checked_add(whole.checked_mul(scale)?)?;

        // Digits past 18 cannot change the nanosecond result.
        let fraction = &fraction[..fraction.len().min(18)];
        if !fraction.is_empty() {
            let digits: u128 = fraction.parse().ok()?;
            let divisor = 10u128.pow(fraction.len() as u32);
            total = total.checked_add(digits * scale / divisor)?;
        }
    }

    u64::try_from(total).ok().map(Duration::from_nanos)
}
