use std::fmt;

use crate::error::EvalError;
use crate::property::AttributeValue;

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// Boolean coercion: booleans pass through, any non-zero number
    /// (negative included) is true, strings do not coerce.
    pub fn to_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Str(s) => Err(EvalError::TypeCoercionError {
                value: format!("'{s}'"),
                target: "boolean".into(),
            }),
        }
    }

    /// Numeric coercion: strings are parsed, booleans do not coerce.
    pub fn to_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Str(s) => s.trim().parse().map_err(|_| EvalError::TypeCoercionError {
                value: format!("'{s}'"),
                target: "number".into(),
            }),
            Value::Bool(b) => Err(EvalError::TypeCoercionError {
                value: b.to_string(),
                target: "number".into(),
            }),
        }
    }

    /// Name of the value type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<&AttributeValue> for Value {
    /// Dates and durations become their number of seconds; lists become
    /// their display form.
    fn from(v: &AttributeValue) -> Self {
        match v {
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Number(n) => Value::Number(*n),
            AttributeValue::Integer(i) => Value::Number(*i as f64),
            AttributeValue::Date(t) => Value::Number(*t as f64),
            AttributeValue::Duration(d) => Value::Number(*d as f64),
            AttributeValue::Text(s) => Value::Str(s.clone()),
            AttributeValue::References(_) | AttributeValue::Intervals(_) => {
                Value::Str(v.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_coercion() {
        assert_eq!(Value::Number(0.0).to_bool(), Ok(false));
        assert_eq!(Value::Number(-5.0).to_bool(), Ok(true));
        assert_eq!(Value::Number(0.25).to_bool(), Ok(true));
        assert!(matches!(
            Value::from("yes").to_bool(),
            Err(EvalError::TypeCoercionError { .. })
        ));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(Value::from(" 42 ").to_number(), Ok(42.0));
        assert!(Value::from("abc").to_number().is_err());
        assert!(Value::Bool(true).to_number().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::from("x").to_string(), "x");
    }

    #[test]
    fn test_from_attribute_value() {
        assert_eq!(Value::from(&AttributeValue::Integer(7)), Value::Number(7.0));
        assert_eq!(
            Value::from(&AttributeValue::References(vec!["a".into(), "b".into()])),
            Value::from("a, b")
        );
    }
}
