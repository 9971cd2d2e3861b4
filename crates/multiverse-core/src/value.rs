//! Option values of decisions.
//!
//! Options are opaque to the generator: they are spliced into the generated
//! code as text. [`OptionValue`] keeps the JSON value the author wrote so that
//! numbers, strings and nested lists each render the way the author expects.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One option of a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValue(Value);

impl OptionValue {
    /// Wrap a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Create a numeric option from a float.
    ///
    /// Non-finite values cannot be represented in JSON and fall back to
    /// their textual form.
    pub fn from_f64(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(|n| Self(Value::Number(n)))
            .unwrap_or_else(|| Self(Value::String(value.to_string())))
    }

    /// The underlying JSON value.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Numeric interpretation of the option, if it has one.
    ///
    /// Strings holding a number (`"0"`, `"2.5"`) count as numeric, so
    /// conditions compare `b == 0` the same way whether the author quoted
    /// the option or not.
    pub fn as_number(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_finite(s),
            _ => None,
        }
    }
}

/// Numeric reading of `text`. Spellings of NaN and infinity stay text, so an
/// option named `nan` compares by name.
pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl fmt::Display for OptionValue {
    /// Top-level strings are emitted raw; anything nested is rendered as a
    /// JSON-like literal with `", "` separators.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write_nested(f, other),
        }
    }
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_nested(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(map) => {
            f.write_str("{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key:?}: ")?;
                write_nested(f, item)?;
            }
            f.write_str("}")
        }
        Value::String(s) => write!(f, "{s:?}"),
        other => write!(f, "{other}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_scalars() {
        assert_eq!(OptionValue::new(json!(2)).to_string(), "2");
        assert_eq!(OptionValue::new(json!(2.5)).to_string(), "2.5");
        assert_eq!(OptionValue::new(json!("lognormal")).to_string(), "lognormal");
        assert_eq!(OptionValue::new(json!(true)).to_string(), "true");
    }

    #[test]
    fn test_display_nested() {
        assert_eq!(OptionValue::new(json!([1, 2])).to_string(), "[1, 2]");
        assert_eq!(
            OptionValue::new(json!(["a", [1, 2.5]])).to_string(),
            r#"["a", [1, 2.5]]"#
        );
    }

    #[test]
    fn test_as_number() {
        assert_eq!(OptionValue::new(json!(1.5)).as_number(), Some(1.5));
        assert_eq!(OptionValue::new(json!("3")).as_number(), Some(3.0));
        assert_eq!(OptionValue::new(json!("if")).as_number(), None);
        assert_eq!(OptionValue::new(json!([1])).as_number(), None);
        assert_eq!(OptionValue::new(json!("nan")).as_number(), None);
        assert_eq!(OptionValue::new(json!("-inf")).as_number(), None);
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(OptionValue::from_f64(0.25).to_string(), "0.25");
        assert_eq!(OptionValue::from_f64(f64::NAN).to_string(), "NaN");
    }
}
