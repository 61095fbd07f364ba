//! Built-in functions and methods

use super::format;
use super::interpreter::binary;
use super::syntax::BinaryOp;
use super::{EvalError, Value};
use std::cmp::Ordering;

/// Longest list `range()` will build
pub const MAX_RANGE_LEN: i128 = 10_000_000;

/// Longest string or list that repetition, padding or replacement will build
pub const MAX_SEQUENCE_LEN: usize = 10_000_000;

const FUNCTIONS: &[&str] = &[
    "abs", "all", "any", "bool", "enumerate", "float", "int", "len", "list", "max", "min",
    "range", "repr", "reversed", "round", "sorted", "str", "sum", "zip",
];

const MUTATING: &[&str] = &[
    "append", "clear", "extend", "insert", "pop", "remove", "reverse", "sort", "update",
];

pub fn is_builtin(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/// Methods that modify a list or dict receiver
pub fn is_mutating(method: &str) -> bool {
    MUTATING.contains(&method)
}

/// Positional and keyword arguments of one call
struct Arguments<'a> {
    function: &'a str,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl<'a> Arguments<'a> {
    fn new(function: &'a str, positional: Vec<Value>, keywords: Vec<(String, Value)>) -> Self {
        Self {
            function,
            positional,
            keywords,
        }
    }

    fn keyword(&mut self, name: &str) -> Option<Value> {
        let index = self.keywords.iter().position(|(k, _)| k == name)?;
        Some(self.keywords.remove(index).1)
    }

    /// Reject leftover keywords and positional counts outside `min..=max`
    fn check(&self, min: usize, max: usize) -> Result<(), EvalError> {
        if let Some((name, _)) = self.keywords.first() {
            return Err(EvalError::Type(format!(
                "{}() got an unexpected keyword argument '{}'",
                self.function, name
            )));
        }
        let given = self.positional.len();
        if given < min || given > max {
            let expected = if min == max {
                format!("{}", min)
            } else if max == usize::MAX {
                format!("at least {}", min)
            } else {
                format!("from {} to {}", min, max)
            };
            return Err(EvalError::Type(format!(
                "{}() takes {} argument{} ({} given)",
                self.function,
                expected,
                if max == 1 { "" } else { "s" },
                given
            )));
        }
        Ok(())
    }

    fn take(&mut self) -> Value {
        if self.positional.is_empty() {
            Value::None
        } else {
            self.positional.remove(0)
        }
    }

    fn take_optional(&mut self) -> Option<Value> {
        (!self.positional.is_empty()).then(|| self.positional.remove(0))
    }
}

fn int_argument(value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| {
        EvalError::Type(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn str_argument<'v>(value: &'v Value, function: &str) -> Result<&'v str, EvalError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::Type(format!(
            "{}() argument must be str, not {}",
            function,
            other.type_name()
        ))),
    }
}

pub fn call_function(
    name: &str,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let mut args = Arguments::new(name, positional, keywords);
    match name {
        "len" => {
            args.check(1, 1)?;
            len(&args.take())
        }
        "str" => {
            args.check(0, 1)?;
            Ok(Value::Str(
                args.take_optional().map(|v| v.to_string()).unwrap_or_default(),
            ))
        }
        "repr" => {
            args.check(1, 1)?;
            Ok(Value::Str(args.take().repr()))
        }
        "int" => {
            args.check(0, 1)?;
            args.take_optional().map_or(Ok(Value::Int(0)), |v| to_int(&v))
        }
        "float" => {
            args.check(0, 1)?;
            args.take_optional()
                .map_or(Ok(Value::Float(0.0)), |v| to_float(&v))
        }
        "bool" => {
            args.check(0, 1)?;
            Ok(Value::Bool(
                args.take_optional().is_some_and(|v| v.is_truthy()),
            ))
        }
        "abs" => {
            args.check(1, 1)?;
            abs(args.take())
        }
        "min" | "max" => {
            args.check(1, usize::MAX)?;
            let items = if args.positional.len() == 1 {
                args.take().iterate()?
            } else {
                std::mem::take(&mut args.positional)
            };
            extremum(name, items)
        }
        "sum" => {
            let start = args.keyword("start");
            args.check(1, 2)?;
            let items = args.take().iterate()?;
            let start = start.or_else(|| args.take_optional()).unwrap_or(Value::Int(0));
            items
                .into_iter()
                .try_fold(start, |total, item| binary(BinaryOp::Add, total, item))
        }
        "round" => {
            let ndigits = args.keyword("ndigits");
            args.check(1, 2)?;
            let value = args.take();
            let ndigits = ndigits.or_else(|| args.take_optional());
            round(&value, ndigits)
        }
        "range" => {
            args.check(1, 3)?;
            let bounds = args
                .positional
                .iter()
                .map(int_argument)
                .collect::<Result<Vec<_>, _>>()?;
            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => (0, 0, 1),
            };
            range(start, stop, step)
        }
        "enumerate" => {
            let start = args.keyword("start");
            args.check(1, 2)?;
            let items = args.take().iterate()?;
            let start = match start.or_else(|| args.take_optional()) {
                Some(value) => int_argument(&value)?,
                None => 0,
            };
            Ok(Value::List(
                items
                    .into_iter()
                    .zip(start..)
                    .map(|(item, i)| Value::List(vec![Value::Int(i), item]))
                    .collect(),
            ))
        }
        "zip" => {
            args.check(0, usize::MAX)?;
            let columns = args
                .positional
                .iter()
                .map(Value::iterate)
                .collect::<Result<Vec<_>, _>>()?;
            let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
            Ok(Value::List(
                (0..rows)
                    .map(|row| Value::List(columns.iter().map(|c| c[row].clone()).collect()))
                    .collect(),
            ))
        }
        "sorted" => {
            let reverse = args.keyword("reverse").is_some_and(|v| v.is_truthy());
            args.check(1, 1)?;
            let mut items = args.take().iterate()?;
            sort_values(&mut items, reverse)?;
            Ok(Value::List(items))
        }
        "reversed" => {
            args.check(1, 1)?;
            let mut items = args.take().iterate()?;
            items.reverse();
            Ok(Value::List(items))
        }
        "list" => {
            args.check(0, 1)?;
            match args.take_optional() {
                Some(value) => value.iterate().map(Value::List),
                None => Ok(Value::List(Vec::new())),
            }
        }
        "any" => {
            args.check(1, 1)?;
            Ok(Value::Bool(args.take().iterate()?.iter().any(Value::is_truthy)))
        }
        "all" => {
            args.check(1, 1)?;
            Ok(Value::Bool(args.take().iterate()?.iter().all(Value::is_truthy)))
        }
        _ => Err(EvalError::Name(name.to_string())),
    }
}

fn len(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(EvalError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(n as i64))
}

pub fn to_int(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) if f.is_nan() => Err(EvalError::Value(
            "cannot convert float NaN to integer".to_string(),
        )),
        Value::Float(f) if f.is_infinite() => Err(EvalError::Value(
            "cannot convert float infinity to integer".to_string(),
        )),
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s.trim().replace('_', "").parse::<i64>().map(Value::Int).map_err(|_| {
            EvalError::Value(format!(
                "invalid literal for int() with base 10: {}",
                value.repr()
            ))
        }),
        other => Err(EvalError::Type(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

pub fn to_float(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            EvalError::Value(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => other
            .as_number()
            .map(|n| Value::Float(n.as_f64()))
            .ok_or_else(|| {
                EvalError::Type(format!(
                    "float() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ))
            }),
    }
}

fn abs(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Value("integer overflow".to_string())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(EvalError::Type(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn extremum(name: &str, items: Vec<Value>) -> Result<Value, EvalError> {
    let wanted = if name == "max" {
        Ordering::Greater
    } else {
        Ordering::Less
    };
    let mut items = items.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| EvalError::Value(format!("{}() arg is an empty sequence", name)))?;
    for item in items {
        if item.py_cmp(&best, if name == "max" { ">" } else { "<" })? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}

fn round(value: &Value, ndigits: Option<Value>) -> Result<Value, EvalError> {
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(n) => Some(int_argument(&n)?),
    };
    match (value, ndigits) {
        (Value::Float(f), None) => to_int(&Value::Float(round_half_even(*f))),
        (Value::Float(f), Some(n)) => {
            let factor = 10f64.powi(n as i32);
            Ok(Value::Float(round_half_even(f * factor) / factor))
        }
        (Value::Int(_) | Value::Bool(_), None) => to_int(value),
        (Value::Int(i), Some(n)) if n < 0 => {
            let factor = 10f64.powi(-n as i32);
            Ok(Value::Int((round_half_even(*i as f64 / factor) * factor) as i64))
        }
        (Value::Int(_) | Value::Bool(_), Some(_)) => to_int(value),
        (other, _) => Err(EvalError::Type(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

fn range(start: i64, stop: i64, step: i64) -> Result<Value, EvalError> {
    if step == 0 {
        return Err(EvalError::Value(
            "range() arg 3 must not be zero".to_string(),
        ));
    }
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let count = if step > 0 {
        (stop - start + step - 1).div_euclid(step).max(0)
    } else {
        (start - stop - step - 1).div_euclid(-step).max(0)
    };
    if count > MAX_RANGE_LEN {
        return Err(EvalError::Value(format!(
            "range() of {} items exceeds the limit of {}",
            count, MAX_RANGE_LEN
        )));
    }
    Ok(Value::List(
        (0..count)
            .map(|i| Value::Int((start + i * step) as i64))
            .collect(),
    ))
}

fn sort_values(items: &mut [Value], reverse: bool) -> Result<(), EvalError> {
    let mut failure = None;
    items.sort_by(|a, b| {
        let (a, b) = if reverse { (b, a) } else { (a, b) };
        a.py_cmp(b, "<").unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    failure.map_or(Ok(()), Err)
}

/// `len` when it is within [`MAX_SEQUENCE_LEN`]; `None` stands for an overflowed length
pub fn bounded_len(len: Option<usize>) -> Result<usize, EvalError> {
    match len {
        Some(len) if len <= MAX_SEQUENCE_LEN => Ok(len),
        _ => Err(EvalError::Memory(format!(
            "result would exceed {} items",
            MAX_SEQUENCE_LEN
        ))),
    }
}

/// Length of `unit` items repeated `count` times
pub fn repeated_len(unit: usize, count: i64) -> Result<usize, EvalError> {
    let count = usize::try_from(count.max(0)).ok();
    bounded_len(count.and_then(|count| unit.checked_mul(count)))
}

fn no_attribute(type_name: &str, method: &str) -> EvalError {
    EvalError::Attribute(format!(
        "'{}' object has no attribute '{}'",
        type_name, method
    ))
}

/// Call a method without modifying the receiver
///
/// Mutating methods run on a copy, so `xs.pop()` inside an expression returns the element
/// while `xs` itself stays unchanged.
pub fn call_method(
    receiver: &Value,
    method: &str,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    if is_mutating(method) && matches!(receiver, Value::List(_) | Value::Map(_)) {
        let mut copy = receiver.clone();
        return call_method_mut(&mut copy, method, positional, keywords);
    }
    let args = Arguments::new(method, positional, keywords);
    match receiver {
        Value::Str(s) => string_method(s, method, args),
        Value::List(items) => list_method(items, method, args),
        Value::Map(map) => dict_method(receiver, map, method, args),
        other => Err(no_attribute(other.type_name(), method)),
    }
}

/// Call a method that may modify `receiver` in place
pub fn call_method_mut(
    receiver: &mut Value,
    method: &str,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let mut args = Arguments::new(method, positional, keywords);
    match receiver {
        Value::List(items) => match method {
            "append" => {
                args.check(1, 1)?;
                items.push(args.take());
                Ok(Value::None)
            }
            "extend" => {
                args.check(1, 1)?;
                items.extend(args.take().iterate()?);
                Ok(Value::None)
            }
            "insert" => {
                args.check(2, 2)?;
                let index = int_argument(&args.take())?;
                let len = items.len() as i64;
                let index = if index < 0 { (index + len).max(0) } else { index.min(len) };
                items.insert(index as usize, args.take());
                Ok(Value::None)
            }
            "pop" => {
                args.check(0, 1)?;
                if items.is_empty() {
                    return Err(EvalError::Index("pop from empty list".to_string()));
                }
                let index = match args.take_optional() {
                    Some(value) => int_argument(&value)?,
                    None => -1,
                };
                let len = items.len() as i64;
                let index = if index < 0 { index + len } else { index };
                if !(0..len).contains(&index) {
                    return Err(EvalError::Index("pop index out of range".to_string()));
                }
                Ok(items.remove(index as usize))
            }
            "remove" => {
                args.check(1, 1)?;
                let target = args.take();
                let index = items
                    .iter()
                    .position(|item| item.py_eq(&target))
                    .ok_or_else(|| {
                        EvalError::Value("list.remove(x): x not in list".to_string())
                    })?;
                items.remove(index);
                Ok(Value::None)
            }
            "clear" => {
                args.check(0, 0)?;
                items.clear();
                Ok(Value::None)
            }
            "sort" => {
                let reverse = args.keyword("reverse").is_some_and(|v| v.is_truthy());
                args.check(0, 0)?;
                sort_values(items, reverse)?;
                Ok(Value::None)
            }
            "reverse" => {
                args.check(0, 0)?;
                items.reverse();
                Ok(Value::None)
            }
            _ => Err(no_attribute("list", method)),
        },
        Value::Map(map) => match method {
            "pop" => {
                args.check(1, 2)?;
                let key = args.take();
                match (map.remove(&key.key()), args.take_optional()) {
                    (Some(value), _) => Ok(value),
                    (None, Some(default)) => Ok(default),
                    (None, None) => Err(EvalError::Key(key.repr())),
                }
            }
            "update" => {
                let keywords = std::mem::take(&mut args.keywords);
                args.check(0, 1)?;
                if let Some(other) = args.take_optional() {
                    match other {
                        Value::Map(other) => map.extend(other),
                        other => {
                            return Err(EvalError::Type(format!(
                                "'{}' object is not a mapping",
                                other.type_name()
                            )))
                        }
                    }
                }
                for (key, value) in keywords {
                    map.insert(key, value);
                }
                Ok(Value::None)
            }
            "clear" => {
                args.check(0, 0)?;
                map.clear();
                Ok(Value::None)
            }
            _ => Err(no_attribute("dict", method)),
        },
        other => Err(no_attribute(other.type_name(), method)),
    }
}

fn string_method(s: &str, method: &str, mut args: Arguments) -> Result<Value, EvalError> {
    let text = |value: String| Ok(Value::Str(value));
    match method {
        "upper" => {
            args.check(0, 0)?;
            text(s.to_uppercase())
        }
        "lower" => {
            args.check(0, 0)?;
            text(s.to_lowercase())
        }
        "title" => {
            args.check(0, 0)?;
            text(title_case(s))
        }
        "capitalize" => {
            args.check(0, 0)?;
            let mut chars = s.chars();
            text(match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            })
        }
        "strip" | "lstrip" | "rstrip" => {
            args.check(0, 1)?;
            let chars = match args.take_optional() {
                None | Some(Value::None) => None,
                Some(value) => Some(str_argument(&value, method)?.to_string()),
            };
            let matches = |c: char| match &chars {
                Some(set) => set.contains(c),
                None => c.is_whitespace(),
            };
            text(match method {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            }
            .to_string())
        }
        "split" => {
            let sep = args.keyword("sep");
            args.check(0, 1)?;
            let parts: Vec<Value> = match sep.or_else(|| args.take_optional()) {
                None | Some(Value::None) => s.split_whitespace().map(Value::from).collect(),
                Some(value) => {
                    let sep = str_argument(&value, method)?;
                    if sep.is_empty() {
                        return Err(EvalError::Value("empty separator".to_string()));
                    }
                    s.split(sep).map(Value::from).collect()
                }
            };
            Ok(Value::List(parts))
        }
        "join" => {
            args.check(1, 1)?;
            let parts = args
                .take()
                .iterate()?
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Str(part) => Ok(part),
                    other => Err(EvalError::Type(format!(
                        "sequence item {}: expected str instance, {} found",
                        i,
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            text(parts.join(s))
        }
        "replace" => {
            args.check(2, 2)?;
            let old = args.take();
            let new = args.take();
            let (old, new) = (str_argument(&old, method)?, str_argument(&new, method)?);
            let hits = if old.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(old).count()
            };
            let kept = s.len() - if old.is_empty() { 0 } else { hits * old.len() };
            bounded_len(hits.checked_mul(new.len()).and_then(|added| added.checked_add(kept)))?;
            text(s.replace(old, new))
        }
        "startswith" | "endswith" => {
            args.check(1, 1)?;
            let affix = args.take();
            let affix = str_argument(&affix, method)?;
            Ok(Value::Bool(if method == "startswith" {
                s.starts_with(affix)
            } else {
                s.ends_with(affix)
            }))
        }
        "count" => {
            args.check(1, 1)?;
            let needle = args.take();
            let needle = str_argument(&needle, method)?;
            let count = if needle.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(needle).count()
            };
            Ok(Value::Int(count as i64))
        }
        "find" => {
            args.check(1, 1)?;
            let needle = args.take();
            let needle = str_argument(&needle, method)?;
            Ok(Value::Int(match s.find(needle) {
                Some(byte) => s[..byte].chars().count() as i64,
                None => -1,
            }))
        }
        "isdigit" => {
            args.check(0, 0)?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
        }
        "isalpha" => {
            args.check(0, 0)?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic)))
        }
        "zfill" => {
            args.check(1, 1)?;
            let width = bounded_len(usize::try_from(int_argument(&args.take())?.max(0)).ok())?;
            let len = s.chars().count();
            if len >= width {
                return text(s.to_string());
            }
            let (sign, digits) = match s.chars().next() {
                Some(c @ ('+' | '-')) => (c.to_string(), &s[1..]),
                _ => (String::new(), s),
            };
            text(format!("{}{}{}", sign, "0".repeat(width - len), digits))
        }
        "ljust" | "rjust" | "center" => {
            args.check(1, 2)?;
            let width = int_argument(&args.take())?;
            let fill = match args.take_optional() {
                Some(value) => {
                    let fill = str_argument(&value, method)?;
                    let mut chars = fill.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(EvalError::Type(
                                "The fill character must be exactly one character long"
                                    .to_string(),
                            ))
                        }
                    }
                }
                None => ' ',
            };
            let align = match method {
                "ljust" => '<',
                "rjust" => '>',
                _ => '^',
            };
            let spec = format!("{}{}{}", fill, align, width.max(0));
            text(format::format_value(&Value::Str(s.to_string()), &spec)?)
        }
        "format" => {
            let Arguments {
                positional,
                keywords,
                ..
            } = args;
            let mut next = 0usize;
            let rendered = format::render(s, &mut |field: &str| {
                if field.is_empty() {
                    let value = positional.get(next).cloned();
                    next += 1;
                    value.ok_or_else(|| {
                        EvalError::Index(format!(
                            "Replacement index {} out of range for positional args tuple",
                            next - 1
                        ))
                    })
                } else if let Ok(index) = field.parse::<usize>() {
                    positional.get(index).cloned().ok_or_else(|| {
                        EvalError::Index(format!(
                            "Replacement index {} out of range for positional args tuple",
                            index
                        ))
                    })
                } else {
                    keywords
                        .iter()
                        .find(|(name, _)| name == field)
                        .map(|(_, value)| value.clone())
                        .ok_or_else(|| EvalError::Key(format!("'{}'", field)))
                }
            })?;
            text(rendered)
        }
        _ => Err(no_attribute("str", method)),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_is_letter = false;
    for c in s.chars() {
        if previous_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }
    out
}

fn list_method(items: &[Value], method: &str, mut args: Arguments) -> Result<Value, EvalError> {
    match method {
        "index" => {
            args.check(1, 1)?;
            let target = args.take();
            items
                .iter()
                .position(|item| item.py_eq(&target))
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| EvalError::Value(format!("{} is not in list", target.repr())))
        }
        "count" => {
            args.check(1, 1)?;
            let target = args.take();
            Ok(Value::Int(
                items.iter().filter(|item| item.py_eq(&target)).count() as i64,
            ))
        }
        "copy" => {
            args.check(0, 0)?;
            Ok(Value::List(items.to_vec()))
        }
        _ => Err(no_attribute("list", method)),
    }
}

fn dict_method(
    receiver: &Value,
    map: &std::collections::BTreeMap<String, Value>,
    method: &str,
    mut args: Arguments,
) -> Result<Value, EvalError> {
    match method {
        "get" => {
            args.check(1, 2)?;
            let key = args.take();
            Ok(map
                .get(&key.key())
                .cloned()
                .or_else(|| args.take_optional())
                .unwrap_or(Value::None))
        }
        "keys" => {
            args.check(0, 0)?;
            Ok(Value::List(map.keys().cloned().map(Value::Str).collect()))
        }
        "values" => {
            args.check(0, 0)?;
            Ok(Value::List(map.values().cloned().collect()))
        }
        "items" => {
            args.check(0, 0)?;
            Ok(Value::List(
                map.iter()
                    .map(|(k, v)| Value::List(vec![Value::Str(k.clone()), v.clone()]))
                    .collect(),
            ))
        }
        "copy" => {
            args.check(0, 0)?;
            Ok(receiver.clone())
        }
        _ => Err(no_attribute("dict", method)),
    }
}
