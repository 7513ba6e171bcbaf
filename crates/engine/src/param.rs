//! Parameter identity, values, and roles.
//!
//! A `ParamKey` uniquely identifies one named slot of the data sheet. Keys are
//! fixed at process start; display order is registration order, never key order.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Unique identifier for a sheet parameter.
///
/// Used as graph nodes in the dependency graph and as map keys in `Sheet`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamKey(&'static str);

impl ParamKey {
    /// Create a new ParamKey.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The stable wire name of this parameter.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a parameter is user-writable or derived.
///
/// Immutable once the parameter is registered; enforced at the write boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Input,
    Computed,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Input => "input",
            Role::Computed => "computed",
        }
    }
}

/// Current value of a parameter.
///
/// Equality is exact (`Eq`), including numbers — the cascade recompute prunes
/// on value equality, so numbers are held as `OrderedFloat`, never raw `f64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Number(OrderedFloat<f64>),
    Text(String),
}

impl ParamValue {
    pub fn number(n: f64) -> Self {
        ParamValue::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        ParamValue::Text(s.into())
    }

    /// Numeric view. Integers widen to f64; text does not coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(n.into_inner()),
            ParamValue::Integer(i) => Some(*i as f64),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn raw_display(&self) -> String {
        match self {
            ParamValue::Integer(i) => format!("{}", i),
            ParamValue::Number(n) => {
                let n = n.into_inner();
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", n as i64)
                } else {
                    format!("{:.2}", n)
                }
            }
            ParamValue::Text(s) => s.clone(),
        }
    }
}

/// Declared type of a parameter, with its allowed-value constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    /// Value must be one of the declared set.
    Enum { allowed: Vec<ParamValue> },
    /// Numeric value, optionally bounded (inclusive).
    Number { min: Option<f64>, max: Option<f64> },
    /// Free text.
    Text,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Enum { .. } => "enum",
            ValueType::Number { .. } => "number",
            ValueType::Text => "text",
        }
    }

    /// Check a proposed value against this type. Returns the rejection message
    /// on failure; the registry wraps it into a `ValidationError`.
    pub fn check(&self, value: &ParamValue) -> Result<(), String> {
        match self {
            ValueType::Enum { allowed } => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    Err(format!(
                        "value {} is not in the allowed set",
                        value.raw_display()
                    ))
                }
            }
            ValueType::Number { min, max } => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| format!("expected a number, got {}", value.raw_display()))?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("value {} is below the minimum {}", n, min));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("value {} is above the maximum {}", n, max));
                    }
                }
                Ok(())
            }
            ValueType::Text => match value {
                ParamValue::Text(_) => Ok(()),
                other => Err(format!("expected text, got {}", other.raw_display())),
            },
        }
    }
}
