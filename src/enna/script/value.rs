//! Runtime values of the built-in interpreter
//!
//! Values follow Python conventions where templates can observe them: `str()` of a float
//! always shows a fractional part (`1.0`), booleans print as `True`/`False`, `None` is falsy,
//! `True == 1`, and `and`/`or` return operands rather than booleans.

use super::EvalError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// A numeric view of a value (bools count as ints)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Integer view for indexes and counts
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The key a value maps to in a dict (dict keys are strings)
    pub fn key(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Items produced by iterating over the value
    pub fn iterate(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(items) => Ok(items.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Map(map) => Ok(map.keys().cloned().map(Value::Str).collect()),
            other => Err(EvalError::Type(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Python `==`
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => return a == b,
            (Some(a), Some(b)) => return a.as_f64() == b.as_f64(),
            _ => {}
        }
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.py_eq(w)))
            }
            _ => self == other,
        }
    }

    /// Python ordering; `TypeError` between unrelated types
    pub fn py_cmp(&self, other: &Value, op: &str) -> Result<Ordering, EvalError> {
        match (self.as_number(), other.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => return Ok(a.cmp(&b)),
            (Some(a), Some(b)) => {
                return a
                    .as_f64()
                    .partial_cmp(&b.as_f64())
                    .ok_or_else(|| EvalError::Value("cannot order NaN".to_string()))
            }
            _ => {}
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.py_eq(y) {
                        return x.py_cmp(y, op);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(EvalError::Type(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op,
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Python `repr()`
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Map(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", quote(k), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            other => other.to_string(),
        }
    }
}

fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

/// Python's shortest float repr: `1.0`, `0.1`, `1e+20`, `1.5e-05`
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return python_exponent(&format!("{:e}", f));
    }
    if f == f.trunc() {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Rewrite Rust's `1.5e-5` exponent form as Python's `1.5e-05`
pub fn python_exponent(rust: &str) -> String {
    match rust.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => rust.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::List(_) | Value::Map(_) => f.write_str(&self.repr()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::None, "None")]
    #[case(Value::Bool(true), "True")]
    #[case(Value::Int(-3), "-3")]
    #[case(Value::Float(1.0), "1.0")]
    #[case(Value::Float(0.1), "0.1")]
    #[case(Value::Float(2.5e-5), "2.5e-05")]
    #[case(Value::Float(1e20), "1e+20")]
    #[case(Value::str("it's"), "it's")]
    #[case(Value::from(vec!["a", "b"]), "['a', 'b']")]
    fn test_display(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_repr_quotes() {
        assert_eq!(Value::str("it's").repr(), "\"it's\"");
        assert_eq!(Value::str("a\nb").repr(), "'a\\nb'");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::from(vec![1i64]).is_truthy());
    }

    #[test]
    fn test_numeric_equality_across_types() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::str("1").py_eq(&Value::Int(1)));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            Value::Int(1).py_cmp(&Value::Float(1.5), "<"),
            Ok(Ordering::Less)
        );
        assert_eq!(
            Value::from(vec![1i64, 2]).py_cmp(&Value::from(vec![1i64, 3]), "<"),
            Ok(Ordering::Less)
        );
        let err = Value::str("a").py_cmp(&Value::Int(1), "<").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'<' not supported between instances of 'str' and 'int'"
        );
    }

    #[test]
    fn test_iterate() {
        assert_eq!(
            Value::str("ab").iterate().unwrap(),
            vec![Value::str("a"), Value::str("b")]
        );
        assert!(Value::Int(3).iterate().is_err());
    }
}
