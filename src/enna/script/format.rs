//! Replacement fields and the format-spec mini-language
//!
//! [`render`] walks a template such as `"case.{script_index:0>3}"`, hands each field's text
//! to a resolver and formats the result with [`format_value`]. The resolver decides what a
//! field means: f-strings evaluate it as an expression, `str.format` looks it up among the
//! call's arguments.
//!
//! Supported spec: `[[fill]align][sign][0][width][,|_][.precision][type]` with types
//! `d f F e E g G % s x X o b`.

use super::builtins::bounded_len;
use super::value::python_exponent;
use super::{EvalError, Value};

struct Field {
    expression: String,
    conversion: Option<char>,
    spec: String,
}

pub fn render(
    template: &str,
    resolve: &mut dyn FnMut(&str) -> Result<Value, EvalError>,
) -> Result<String, EvalError> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        match (chars[i], chars.get(i + 1).copied()) {
            ('{', Some('{')) => {
                out.push('{');
                i += 2;
            }
            ('}', Some('}')) => {
                out.push('}');
                i += 2;
            }
            ('{', _) => {
                let (field, next) = split_field(&chars, i + 1)?;
                out.push_str(&format_field(field, resolve)?);
                i = next;
            }
            ('}', _) => {
                return Err(EvalError::Value(
                    "Single '}' encountered in format string".to_string(),
                ))
            }
            (c, _) => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Scan a field starting after its `{`; returns the field and the index past its `}`
fn split_field(chars: &[char], start: usize) -> Result<(Field, usize), EvalError> {
    let mut expression = String::new();
    let mut conversion = None;
    let mut spec = String::new();
    let mut in_spec = false;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];

        if in_spec {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok((Field { expression, conversion, spec }, i + 1)),
                '}' => depth -= 1,
                _ => {}
            }
            spec.push(c);
            i += 1;
            continue;
        }

        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            expression.push(c);
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '}' if depth > 0 => depth -= 1,
            '}' => return Ok((Field { expression, conversion, spec }, i + 1)),
            '!' if depth == 0 && chars.get(i + 1) != Some(&'=') => {
                conversion = chars.get(i + 1).copied();
                i += 2;
                match chars.get(i).copied() {
                    Some(':') => {
                        in_spec = true;
                        i += 1;
                    }
                    Some('}') => {}
                    _ => {
                        return Err(EvalError::Value(
                            "expected ':' after conversion specifier".to_string(),
                        ))
                    }
                }
                continue;
            }
            ':' if depth == 0 => {
                in_spec = true;
                i += 1;
                continue;
            }
            _ => {}
        }
        expression.push(c);
        i += 1;
    }

    Err(EvalError::Value(
        "expected '}' before end of string".to_string(),
    ))
}

fn format_field(
    field: Field,
    resolve: &mut dyn FnMut(&str) -> Result<Value, EvalError>,
) -> Result<String, EvalError> {
    let value = resolve(&field.expression)?;
    let value = match field.conversion {
        None => value,
        Some('s') => Value::Str(value.to_string()),
        Some('r') | Some('a') => Value::Str(value.repr()),
        Some(other) => {
            return Err(EvalError::Value(format!(
                "Unknown conversion specifier {}",
                other
            )))
        }
    };
    let spec = if field.spec.contains('{') {
        render(&field.spec, resolve)?
    } else {
        field.spec
    };
    format_value(&value, &spec)
}

#[derive(Debug, Default, PartialEq)]
struct FormatSpec {
    fill: Option<char>,
    align: Option<char>,
    sign: Option<char>,
    zero: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(spec: &str) -> Result<Self, EvalError> {
        let invalid = || EvalError::Value("Invalid format specifier".to_string());
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec::default();
        let mut i = 0;

        let is_align = |c: Option<&char>| matches!(c, Some(&('<' | '>' | '^' | '=')));
        if is_align(chars.get(1)) {
            parsed.fill = Some(chars[0]);
            parsed.align = Some(chars[1]);
            i = 2;
        } else if is_align(chars.first()) {
            parsed.align = Some(chars[0]);
            i = 1;
        }

        if let Some(&(c @ ('+' | '-' | ' '))) = chars.get(i) {
            parsed.sign = Some(c);
            i += 1;
        }

        if chars.get(i) == Some(&'0') {
            parsed.zero = true;
            i += 1;
        }

        let width_start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > width_start {
            let digits: String = chars[width_start..i].iter().collect();
            parsed.width = bounded_len(digits.parse().ok())?;
        }

        if let Some(&(c @ (',' | '_'))) = chars.get(i) {
            parsed.grouping = Some(c);
            i += 1;
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == start {
                return Err(EvalError::Value(
                    "Format specifier missing precision".to_string(),
                ));
            }
            let digits: String = chars[start..i].iter().collect();
            parsed.precision = Some(bounded_len(digits.parse().ok())?);
        }

        if let Some(&c) = chars.get(i) {
            parsed.kind = Some(c);
            i += 1;
        }

        if i != chars.len() {
            return Err(invalid());
        }
        Ok(parsed)
    }
}

/// Format a single value against a format spec
pub fn format_value(value: &Value, spec: &str) -> Result<String, EvalError> {
    if spec.is_empty() {
        return Ok(value.to_string());
    }
    let spec = FormatSpec::parse(spec)?;

    let value = match value {
        Value::Bool(b) if spec.kind != Some('s') => Value::Int(*b as i64),
        Value::List(_) | Value::Map(_) | Value::None => {
            return Err(EvalError::Type(format!(
                "unsupported format string passed to {}.__format__",
                value.type_name()
            )))
        }
        other => other.clone(),
    };

    let unknown = |kind: char| {
        EvalError::Value(format!(
            "Unknown format code '{}' for object of type '{}'",
            kind,
            value.type_name()
        ))
    };

    let numeric = !matches!(value, Value::Str(_));
    let body = match (spec.kind, &value) {
        (None, Value::Str(s)) | (Some('s'), Value::Str(s)) => match spec.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        },
        (None, Value::Int(i)) | (Some('d'), Value::Int(i)) => group(&i.to_string(), spec.grouping),
        (None, Value::Float(f)) => match spec.precision {
            Some(p) => general(*f, p),
            None => group(&value.to_string(), spec.grouping),
        },
        (Some(kind @ ('f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%')), Value::Int(_) | Value::Float(_)) => {
            let x = value.as_number().map_or(0.0, |n| n.as_f64());
            let precision = spec.precision.unwrap_or(6);
            let body = match kind {
                'f' | 'F' => group(&format!("{:.*}", precision, x), spec.grouping),
                'e' | 'E' => python_exponent(&format!("{:.*e}", precision, x)),
                'g' | 'G' => general(x, precision),
                _ => format!("{}%", group(&format!("{:.*}", precision, x * 100.0), spec.grouping)),
            };
            if kind.is_ascii_uppercase() {
                body.to_uppercase()
            } else {
                body
            }
        }
        (Some(kind @ ('x' | 'X' | 'o' | 'b')), Value::Int(i)) => {
            let magnitude = i.unsigned_abs();
            let digits = match kind {
                'x' => format!("{:x}", magnitude),
                'X' => format!("{:X}", magnitude),
                'o' => format!("{:o}", magnitude),
                _ => format!("{:b}", magnitude),
            };
            if *i < 0 {
                format!("-{}", digits)
            } else {
                digits
            }
        }
        (Some(kind), _) => return Err(unknown(kind)),
        (None, _) => value.to_string(),
    };

    let body = match spec.sign {
        Some(sign @ ('+' | ' ')) if numeric && !body.starts_with('-') => format!("{}{}", sign, body),
        _ => body,
    };

    Ok(pad(body, &spec, numeric))
}

fn pad(body: String, spec: &FormatSpec, numeric: bool) -> String {
    let len = body.chars().count();
    if len >= spec.width {
        return body;
    }
    let (fill, align) = match (spec.fill, spec.align, spec.zero) {
        (fill, Some(align), _) => (fill.unwrap_or(' '), align),
        (_, None, true) => ('0', if numeric { '=' } else { '<' }),
        (_, None, false) => (' ', if numeric { '>' } else { '<' }),
    };
    let padding = spec.width - len;
    let repeat = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();

    match align {
        '<' => format!("{}{}", body, repeat(padding)),
        '^' => format!("{}{}{}", repeat(padding / 2), body, repeat(padding - padding / 2)),
        '=' => {
            let sign_len = if body.starts_with(['+', '-', ' ']) { 1 } else { 0 };
            let (sign, digits) = body.split_at(sign_len);
            format!("{}{}{}", sign, repeat(padding), digits)
        }
        _ => format!("{}{}", repeat(padding), body),
    }
}

/// Insert a thousands separator into the integer part of a formatted number
fn group(number: &str, separator: Option<char>) -> String {
    let Some(separator) = separator else {
        return number.to_string();
    };
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let split = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (integer, tail) = rest.split_at(split);

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    format!("{}{}{}", sign, grouped, tail)
}

/// The `g` presentation: `precision` significant digits, trailing zeros removed
fn general(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return super::value::format_float(x);
    }
    if x == 0.0 {
        return "0".to_string();
    }
    let precision = precision.max(1);
    let exponent = x.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= precision as i32 {
        let formatted = format!("{:.*e}", precision - 1, x);
        match formatted.split_once('e') {
            Some((mantissa, exp)) => {
                python_exponent(&format!("{}e{}", strip_zeros(mantissa), exp))
            }
            None => formatted,
        }
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, x))
    }
}

fn strip_zeros(number: &str) -> String {
    if number.contains('.') {
        number
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Int(7), "0>3", "007")]
    #[case(Value::Int(42), "05", "00042")]
    #[case(Value::Int(-42), "05", "-0042")]
    #[case(Value::Int(1234567), ",", "1,234,567")]
    #[case(Value::Int(5), "+", "+5")]
    #[case(Value::Int(255), "x", "ff")]
    #[case(Value::Float(3.14159), ".2f", "3.14")]
    #[case(Value::Float(3.14159), "8.3f", "   3.142")]
    #[case(Value::Float(0.256), ".1%", "25.6%")]
    #[case(Value::Float(1234.5), "e", "1.234500e+03")]
    #[case(Value::Float(3.14159), ".3", "3.14")]
    #[case(Value::Int(3), ".2f", "3.00")]
    #[case(Value::str("ab"), "<4", "ab  ")]
    #[case(Value::str("ab"), "*^6", "**ab**")]
    #[case(Value::str("abcdef"), ".3", "abc")]
    #[case(Value::Bool(true), ">3", "  1")]
    fn test_format_value(#[case] value: Value, #[case] spec: &str, #[case] expected: &str) {
        assert_eq!(format_value(&value, spec).unwrap(), expected);
    }

    #[test]
    fn test_format_code_mismatch() {
        let err = format_value(&Value::Float(1.5), "d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown format code 'd' for object of type 'float'"
        );
        assert!(format_value(&Value::str("x"), "f").is_err());
        assert!(format_value(&Value::Int(1), "5.").is_err());
    }

    #[rstest]
    #[case(Value::Int(1), ">99999999999999")]
    #[case(Value::Int(1), "099999999999")]
    #[case(Value::str("x"), "*^10000001")]
    #[case(Value::Float(1.0), ".99999999999f")]
    fn test_width_and_precision_past_limit(#[case] value: Value, #[case] spec: &str) {
        let err = format_value(&value, spec).unwrap_err();
        assert_eq!(err.type_name(), "MemoryError");
    }

    #[test]
    fn test_width_too_long_to_parse() {
        let err = format_value(&Value::Int(1), ">999999999999999999999999").unwrap_err();
        assert_eq!(err.type_name(), "MemoryError");
    }

    fn lookup(field: &str) -> Result<Value, EvalError> {
        match field {
            "script_index" => Ok(Value::Int(4)),
            "name" => Ok(Value::str("run")),
            "width" => Ok(Value::Int(6)),
            other => Err(EvalError::Name(other.to_string())),
        }
    }

    #[test]
    fn test_render_fields() {
        let out = render("case.{script_index:0>3}.py", &mut lookup).unwrap();
        assert_eq!(out, "case.004.py");
        let out = render("{name!r} {{literal}}", &mut lookup).unwrap();
        assert_eq!(out, "'run' {literal}");
    }

    #[test]
    fn test_nested_spec() {
        let out = render("[{name:>{width}}]", &mut lookup).unwrap();
        assert_eq!(out, "[   run]");
    }

    #[test]
    fn test_render_errors() {
        assert!(render("{name", &mut lookup).is_err());
        assert!(render("a } b", &mut lookup).is_err());
        assert_eq!(
            render("{missing}", &mut lookup),
            Err(EvalError::Name("missing".to_string()))
        );
    }

    #[test]
    fn test_field_text_is_raw_expression() {
        let mut seen = Vec::new();
        let mut record = |field: &str| -> Result<Value, EvalError> {
            seen.push(field.to_string());
            Ok(Value::Int(0))
        };
        render("{d['a:b']}{x != 1}{ {'k': 1} }", &mut record).unwrap();
        assert_eq!(seen, vec!["d['a:b']", "x != 1", " {'k': 1} "]);
    }
}
