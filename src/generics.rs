//! Testbench generics and their canonical string encoding.
//!
//! The encoded form is `name:value` tokens joined with `", "` in insertion
//! order, e.g. `width:8, enable:True`. The backend interprets the text, so
//! the spelling of every value type is fixed here:
//!
//! - strings are emitted as-is;
//! - integers in base 10 without leading zeros;
//! - booleans as `True` / `False`;
//! - reals in shortest round-trip form, always with a fractional part
//!   (`1.0`, `0.25`); NaN and infinities have no canonical form.
use crate::error::{HarnessError, Result};
use serde::Serialize;
use std::fmt;

const TOKEN_SEPARATOR: &str = ", ";
const NAME_SEPARATOR: &str = ":";

/// One generic value.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    Str(String),
    Int(i128),
    Bool(bool),
    Real(f64),
}

impl GenericValue {
    /// Wrap any value through its `Display` form.
    pub fn from_display(value: &impl fmt::Display) -> Self {
        GenericValue::Str(value.to_string())
    }

    /// Convert a JSON value; `null`, arrays, and objects are rejected.
    pub fn from_json(name: &str, value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        match value {
            Value::String(text) => Ok(GenericValue::Str(text.clone())),
            Value::Bool(flag) => Ok(GenericValue::Bool(*flag)),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Ok(GenericValue::Int(int.into()))
                } else if let Some(uint) = number.as_u64() {
                    Ok(GenericValue::Int(uint.into()))
                } else if let Some(real) = number.as_f64() {
                    Ok(GenericValue::Real(real))
                } else {
                    Err(HarnessError::encoding(name, format!("unsupported number {number}")))
                }
            }
            Value::Null => Err(HarnessError::encoding(name, "null has no string form")),
            Value::Array(_) => Err(HarnessError::encoding(name, "arrays have no string form")),
            Value::Object(_) => Err(HarnessError::encoding(name, "objects have no string form")),
        }
    }

    /// Render the canonical text for this value.
    pub fn stringify(&self, name: &str) -> Result<String> {
        match self {
            GenericValue::Str(text) => Ok(text.clone()),
            GenericValue::Int(int) => Ok(int.to_string()),
            GenericValue::Bool(true) => Ok("True".to_string()),
            GenericValue::Bool(false) => Ok("False".to_string()),
            GenericValue::Real(real) if !real.is_finite() => Err(HarnessError::encoding(
                name,
                format!("{real} has no canonical string form"),
            )),
            // Shortest round-trip digits; large and small magnitudes use an
            // exponent, and the mantissa always carries a fraction (`1.0e300`).
            GenericValue::Real(real) => {
                let text = format!("{real:?}");
                let (mantissa, exponent) = match text.split_once('e') {
                    Some((mantissa, exponent)) => (mantissa, Some(exponent)),
                    None => (text.as_str(), None),
                };
                let fraction = if mantissa.contains('.') { "" } else { ".0" };
                Ok(match exponent {
                    Some(exponent) => format!("{mantissa}{fraction}e{exponent}"),
                    None => format!("{mantissa}{fraction}"),
                })
            }
        }
    }
}

impl From<&str> for GenericValue {
    fn from(value: &str) -> Self {
        GenericValue::Str(value.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(value: String) -> Self {
        GenericValue::Str(value)
    }
}

impl From<bool> for GenericValue {
    fn from(value: bool) -> Self {
        GenericValue::Bool(value)
    }
}

impl From<f64> for GenericValue {
    fn from(value: f64) -> Self {
        GenericValue::Real(value)
    }
}

macro_rules! int_generic {
    ($($ty:ty),*) => {
        $(impl From<$ty> for GenericValue {
            fn from(value: $ty) -> Self {
                GenericValue::Int(value.into())
            }
        })*
    };
}

int_generic!(i8, i16, i32, i64, u8, u16, u32, u64);

/// How names and values containing `,` or `:` are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelimiterPolicy {
    /// Emit text unchanged; compatible with existing backends.
    #[default]
    Verbatim,
    /// Fail with an encoding error instead of emitting ambiguous text.
    Reject,
}

/// Ordered generic configuration; names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericConfig {
    entries: Vec<(String, GenericValue)>,
}

impl GenericConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ordered pairs, rejecting repeated names.
    pub fn from_pairs<N, V, I>(pairs: I) -> Result<Self>
    where
        N: Into<String>,
        V: Into<GenericValue>,
        I: IntoIterator<Item = (N, V)>,
    {
        let mut config = Self::new();
        for (name, value) in pairs {
            let name = name.into();
            if config.get(&name).is_some() {
                return Err(HarnessError::DuplicateGeneric { name });
            }
            config.entries.push((name, value.into()));
        }
        Ok(config)
    }

    /// Build from ordered JSON pairs as read from a run configuration.
    pub fn from_json_pairs(pairs: &[(String, serde_json::Value)]) -> Result<Self> {
        let mut values = Vec::with_capacity(pairs.len());
        for (name, value) in pairs {
            values.push((name.clone(), GenericValue::from_json(name, value)?));
        }
        Self::from_pairs(values)
    }

    /// Set `name`; an existing name keeps its position.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<GenericValue>,
    ) -> Option<GenericValue> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&GenericValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GenericValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode with the wire-compatible [`DelimiterPolicy::Verbatim`].
    pub fn encode(&self) -> Result<EncodedGeneric> {
        encode(self, DelimiterPolicy::Verbatim)
    }
}

/// Canonical encoded generic string.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EncodedGeneric(String);

impl EncodedGeneric {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedGeneric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize `config` into `name:value, name:value` form.
pub fn encode(config: &GenericConfig, policy: DelimiterPolicy) -> Result<EncodedGeneric> {
    let mut tokens = Vec::with_capacity(config.len());
    for (name, value) in config.iter() {
        let text = value.stringify(name)?;
        if policy == DelimiterPolicy::Reject {
            check_delimiters(name, name, "name")?;
            check_delimiters(name, &text, "value")?;
        }
        tokens.push(format!("{name}{NAME_SEPARATOR}{text}"));
    }
    Ok(EncodedGeneric(tokens.join(TOKEN_SEPARATOR)))
}

fn check_delimiters(name: &str, text: &str, what: &str) -> Result<()> {
    if text.contains([',', ':']) {
        return Err(HarnessError::encoding(
            name,
            format!("{what} {text:?} contains a ',' or ':' delimiter"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "generics_tests.rs"]
mod tests;
