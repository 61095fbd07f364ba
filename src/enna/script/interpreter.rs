//! Tree-walking evaluation of the script language

use super::builtins;
use super::format;
use super::grammar::{self, split_statements};
use super::syntax::{BinaryOp, CompareOp, Expr, Stmt, Target, UnaryOp};
use super::value::Number;
use super::{EvalError, Scope, ScriptEvaluator, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The built-in [`ScriptEvaluator`]
#[derive(Debug, Default, Clone, Copy)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn eval(&self, expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::FString(body) => {
                format::render(body, &mut |field| self.eval_expr(field, scope)).map(Value::Str)
            }
            Expr::Name(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::Name(name.clone())),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Dict(pairs) => {
                let mut map = BTreeMap::new();
                for (key, value) in pairs {
                    map.insert(self.eval(key, scope)?.key(), self.eval(value, scope)?);
                }
                Ok(Value::Map(map))
            }
            Expr::ListComp {
                element,
                target,
                iter,
                conditions,
            } => {
                let mut out = Vec::new();
                'items: for item in self.eval(iter, scope)?.iterate()? {
                    let mut inner = scope.clone();
                    bind(target, item, &mut inner)?;
                    for condition in conditions {
                        if !self.eval(condition, &inner)?.is_truthy() {
                            continue 'items;
                        }
                    }
                    out.push(self.eval(element, &inner)?);
                }
                Ok(Value::List(out))
            }
            Expr::Attr(target, name) => attribute(&self.eval(target, scope)?, name),
            Expr::Index(target, index) => {
                subscript(&self.eval(target, scope)?, &self.eval(index, scope)?)
            }
            Expr::Slice(target, start, stop) => {
                let target = self.eval(target, scope)?;
                let start = self.slice_bound(start.as_deref(), scope)?;
                let stop = self.slice_bound(stop.as_deref(), scope)?;
                slice(&target, start, stop)
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => match callee.as_ref() {
                Expr::Attr(receiver, method) => {
                    let receiver = self.eval(receiver, scope)?;
                    let (args, kwargs) = self.eval_arguments(args, kwargs, scope)?;
                    builtins::call_method(&receiver, method, args, kwargs)
                }
                Expr::Name(name) if !scope.contains(name) => {
                    if !builtins::is_builtin(name) {
                        return Err(EvalError::Name(name.clone()));
                    }
                    let (args, kwargs) = self.eval_arguments(args, kwargs, scope)?;
                    builtins::call_function(name, args, kwargs)
                }
                other => Err(EvalError::Type(format!(
                    "'{}' object is not callable",
                    self.eval(other, scope)?.type_name()
                ))),
            },
            Expr::Unary(op, operand) => unary(*op, self.eval(operand, scope)?),
            Expr::Binary(lhs, op, rhs) => {
                binary(*op, self.eval(lhs, scope)?, self.eval(rhs, scope)?)
            }
            Expr::Compare(first, rest) => {
                let mut lhs = self.eval(first, scope)?;
                for (op, rhs) in rest {
                    let rhs = self.eval(rhs, scope)?;
                    if !compare(*op, &lhs, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
            Expr::Not(operand) => Ok(Value::Bool(!self.eval(operand, scope)?.is_truthy())),
            Expr::And(lhs, rhs) => {
                let lhs = self.eval(lhs, scope)?;
                if lhs.is_truthy() {
                    self.eval(rhs, scope)
                } else {
                    Ok(lhs)
                }
            }
            Expr::Or(lhs, rhs) => {
                let lhs = self.eval(lhs, scope)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(rhs, scope)
                }
            }
            Expr::IfElse {
                then,
                condition,
                otherwise,
            } => {
                if self.eval(condition, scope)?.is_truthy() {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
        }
    }

    pub fn exec(&self, stmt: &Stmt, scope: &mut Scope) -> Result<(), EvalError> {
        match stmt {
            Stmt::Pass => Ok(()),
            Stmt::Assign(targets, value) => {
                let value = self.eval(value, scope)?;
                for target in targets {
                    bind(target, value.clone(), scope)?;
                }
                Ok(())
            }
            Stmt::AugAssign(name, op, value) => {
                let current = scope
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::Name(name.clone()))?;
                let updated = binary(*op, current, self.eval(value, scope)?)?;
                scope.set(name.clone(), updated);
                Ok(())
            }
            Stmt::Expr(expr) => {
                if let Some((name, method, args, kwargs)) = in_place_call(expr) {
                    if scope
                        .get(name)
                        .is_some_and(|v| matches!(v, Value::List(_) | Value::Map(_)))
                    {
                        let (args, kwargs) = self.eval_arguments(args, kwargs, scope)?;
                        if let Some(receiver) = scope.get_mut(name) {
                            builtins::call_method_mut(receiver, method, args, kwargs)?;
                        }
                        return Ok(());
                    }
                }
                self.eval(expr, scope).map(|_| ())
            }
        }
    }

    fn eval_arguments(
        &self,
        args: &[Expr],
        kwargs: &[(String, Expr)],
        scope: &Scope,
    ) -> Result<(Vec<Value>, Vec<(String, Value)>), EvalError> {
        let args = args
            .iter()
            .map(|arg| self.eval(arg, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let kwargs = kwargs
            .iter()
            .map(|(name, value)| -> Result<(String, Value), EvalError> {
                Ok((name.clone(), self.eval(value, scope)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((args, kwargs))
    }

    fn slice_bound(&self, bound: Option<&Expr>, scope: &Scope) -> Result<Option<i64>, EvalError> {
        match bound {
            None => Ok(None),
            Some(expr) => match self.eval(expr, scope)? {
                Value::None => Ok(None),
                value => value.as_int().map(Some).ok_or_else(|| {
                    EvalError::Type("slice indices must be integers or None".to_string())
                }),
            },
        }
    }
}

impl ScriptEvaluator for Interpreter {
    fn eval_expr(&self, text: &str, scope: &Scope) -> Result<Value, EvalError> {
        self.eval(&grammar::parse_expression(text)?, scope)
    }

    fn exec_stmt(&self, text: &str, scope: &mut Scope) -> Result<(), EvalError> {
        // every statement must parse before any of them runs
        let statements = split_statements(text)
            .iter()
            .map(|statement| grammar::parse_statement(statement))
            .collect::<Result<Vec<_>, _>>()?;
        for statement in &statements {
            self.exec(statement, scope)?;
        }
        Ok(())
    }

    fn eval_for_snapshots(&self, header: &str, scope: &Scope) -> Result<Vec<Scope>, EvalError> {
        let header = grammar::parse_for_header(header)?;
        self.eval(&header.iter, scope)?
            .iterate()?
            .into_iter()
            .map(|item| -> Result<Scope, EvalError> {
                let mut snapshot = scope.clone();
                bind(&header.target, item, &mut snapshot)?;
                Ok(snapshot)
            })
            .collect()
    }

    fn format_template(&self, template: &str, scope: &Scope) -> Result<String, EvalError> {
        format::render(template, &mut |field| self.eval_expr(field, scope))
    }
}

/// `name.method(...)` in statement position, which may update `name` in place
fn in_place_call(expr: &Expr) -> Option<(&str, &str, &[Expr], &[(String, Expr)])> {
    let Expr::Call {
        callee,
        args,
        kwargs,
    } = expr
    else {
        return None;
    };
    let Expr::Attr(receiver, method) = callee.as_ref() else {
        return None;
    };
    let Expr::Name(name) = receiver.as_ref() else {
        return None;
    };
    builtins::is_mutating(method).then_some((
        name.as_str(),
        method.as_str(),
        args.as_slice(),
        kwargs.as_slice(),
    ))
}

pub fn bind(target: &Target, value: Value, scope: &mut Scope) -> Result<(), EvalError> {
    match target {
        Target::Name(name) => {
            scope.set(name.clone(), value);
            Ok(())
        }
        Target::Tuple(targets) => {
            let items = value.iterate().map_err(|_| {
                EvalError::Type(format!(
                    "cannot unpack non-iterable {} object",
                    value.type_name()
                ))
            })?;
            match items.len().cmp(&targets.len()) {
                Ordering::Greater => Err(EvalError::Value(format!(
                    "too many values to unpack (expected {})",
                    targets.len()
                ))),
                Ordering::Less => Err(EvalError::Value(format!(
                    "not enough values to unpack (expected {}, got {})",
                    targets.len(),
                    items.len()
                ))),
                Ordering::Equal => {
                    for (target, item) in targets.iter().zip(items) {
                        bind(target, item, scope)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

/// `d.key` reads dict entries; nothing else has attributes
fn attribute(value: &Value, name: &str) -> Result<Value, EvalError> {
    match value {
        Value::Map(map) if map.contains_key(name) => Ok(map[name].clone()),
        other => Err(EvalError::Attribute(format!(
            "'{}' object has no attribute '{}'",
            other.type_name(),
            name
        ))),
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalError> {
    let int_index = |what: &str| {
        index.as_int().ok_or_else(|| {
            EvalError::Type(format!(
                "{} indices must be integers or slices, not {}",
                what,
                index.type_name()
            ))
        })
    };
    match target {
        Value::List(items) => normalize_index(int_index("list")?, items.len())
            .map(|i| items[i].clone())
            .ok_or_else(|| EvalError::Index("list index out of range".to_string())),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            normalize_index(int_index("string")?, chars.len())
                .map(|i| Value::Str(chars[i].to_string()))
                .ok_or_else(|| EvalError::Index("string index out of range".to_string()))
        }
        Value::Map(map) => map
            .get(&index.key())
            .cloned()
            .ok_or_else(|| EvalError::Key(index.repr())),
        other => Err(EvalError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn slice_range(start: Option<i64>, stop: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let clamp = |i: i64| {
        let i = if i < 0 { i + len } else { i };
        i.clamp(0, len)
    };
    let start = start.map_or(0, clamp);
    let stop = stop.map_or(len, clamp).max(start);
    (start as usize, stop as usize)
}

fn slice(target: &Value, start: Option<i64>, stop: Option<i64>) -> Result<Value, EvalError> {
    match target {
        Value::List(items) => {
            let (start, stop) = slice_range(start, stop, items.len());
            Ok(Value::List(items[start..stop].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, stop) = slice_range(start, stop, chars.len());
            Ok(Value::Str(chars[start..stop].iter().collect()))
        }
        other => Err(EvalError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    let symbol = match op {
        UnaryOp::Neg => "-",
        UnaryOp::Pos => "+",
    };
    match (op, operand.as_number()) {
        (UnaryOp::Neg, Some(Number::Int(i))) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Value("integer overflow".to_string())),
        (UnaryOp::Neg, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(f))) => Ok(Value::Float(f)),
        (_, None) => Err(EvalError::Type(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        ))),
    }
}

/// Arithmetic with Python semantics (floor division and modulo round toward negative infinity)
pub fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => int_arithmetic(op, x, y),
            _ => float_arithmetic(op, a.as_f64(), b.as_f64()),
        };
    }

    match (op, &lhs, &rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s))
            if n.as_int().is_some() =>
        {
            let count = n.as_int().unwrap_or(0);
            builtins::repeated_len(s.len(), count)?;
            Ok(Value::Str(s.repeat(count.max(0) as usize)))
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if n.as_int().is_some() =>
        {
            let count = n.as_int().unwrap_or(0);
            let count = match builtins::repeated_len(items.len(), count)? {
                0 => 0,
                _ => count as usize,
            };
            Ok(Value::List(
                std::iter::repeat(items.iter().cloned())
                    .take(count)
                    .flatten()
                    .collect(),
            ))
        }
        _ => Err(EvalError::Type(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn int_arithmetic(op: BinaryOp, x: i64, y: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::Value("integer overflow".to_string());
    let modulo_by_zero =
        || EvalError::ZeroDivision("integer division or modulo by zero".to_string());

    match op {
        BinaryOp::Add => x.checked_add(y).map(Value::Int).ok_or_else(overflow),
        BinaryOp::Sub => x.checked_sub(y).map(Value::Int).ok_or_else(overflow),
        BinaryOp::Mul => x.checked_mul(y).map(Value::Int).ok_or_else(overflow),
        BinaryOp::Div if y == 0 => Err(EvalError::ZeroDivision("division by zero".to_string())),
        BinaryOp::Div => Ok(Value::Float(x as f64 / y as f64)),
        BinaryOp::FloorDiv if y == 0 => Err(modulo_by_zero()),
        BinaryOp::FloorDiv => {
            let quotient = x.checked_div(y).ok_or_else(overflow)?;
            if x % y != 0 && ((x < 0) != (y < 0)) {
                Ok(Value::Int(quotient - 1))
            } else {
                Ok(Value::Int(quotient))
            }
        }
        BinaryOp::Mod if y == 0 => Err(modulo_by_zero()),
        BinaryOp::Mod => {
            let remainder = x.checked_rem(y).ok_or_else(overflow)?;
            if remainder != 0 && ((remainder < 0) != (y < 0)) {
                Ok(Value::Int(remainder + y))
            } else {
                Ok(Value::Int(remainder))
            }
        }
        BinaryOp::Pow if y >= 0 => u32::try_from(y)
            .ok()
            .and_then(|exponent| x.checked_pow(exponent))
            .map(Value::Int)
            .ok_or_else(overflow),
        BinaryOp::Pow => float_arithmetic(op, x as f64, y as f64),
    }
}

fn float_arithmetic(op: BinaryOp, x: f64, y: f64) -> Result<Value, EvalError> {
    let zero = |message: &str| Err(EvalError::ZeroDivision(message.to_string()));
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div if y == 0.0 => return zero("float division by zero"),
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv if y == 0.0 => return zero("float floor division by zero"),
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod if y == 0.0 => return zero("float modulo"),
        BinaryOp::Mod => {
            let remainder = x % y;
            if remainder != 0.0 && ((remainder < 0.0) != (y < 0.0)) {
                remainder + y
            } else {
                remainder
            }
        }
        BinaryOp::Pow if x == 0.0 && y < 0.0 => {
            return zero("0.0 cannot be raised to a negative power")
        }
        BinaryOp::Pow => x.powf(y),
    };
    Ok(Value::Float(result))
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    let symbol = op.symbol();
    match op {
        CompareOp::Eq => Ok(lhs.py_eq(rhs)),
        CompareOp::Ne => Ok(!lhs.py_eq(rhs)),
        CompareOp::Lt => Ok(lhs.py_cmp(rhs, symbol)? == Ordering::Less),
        CompareOp::Le => Ok(lhs.py_cmp(rhs, symbol)? != Ordering::Greater),
        CompareOp::Gt => Ok(lhs.py_cmp(rhs, symbol)? == Ordering::Greater),
        CompareOp::Ge => Ok(lhs.py_cmp(rhs, symbol)? != Ordering::Less),
        CompareOp::In => contains(rhs, lhs),
        CompareOp::NotIn => contains(rhs, lhs).map(|found| !found),
        CompareOp::Is => Ok(identical(lhs, rhs)),
        CompareOp::IsNot => Ok(!identical(lhs, rhs)),
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::List(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(needle.as_str())),
            other => Err(EvalError::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Map(map) => Ok(map.contains_key(&item.key())),
        other => Err(EvalError::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Values have no identity here; `is` holds for equal singletons, ints and strings
fn identical(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn eval(text: &str) -> Result<Value, EvalError> {
        let scope: Scope = [
            ("xs", Value::from(vec![1i64, 2, 3])),
            ("name", Value::str("World")),
            ("n", Value::Int(7)),
        ]
        .into_iter()
        .collect();
        Interpreter.eval_expr(text, &scope)
    }

    #[rstest]
    #[case("1 + 2 * 3", "7")]
    #[case("2 ** 3 ** 2", "512")]
    #[case("7 / 2", "3.5")]
    #[case("-7 // 2", "-4")]
    #[case("7 // -2", "-4")]
    #[case("-7 % 3", "2")]
    #[case("2 ** -1", "0.5")]
    #[case("'ab' * 2", "abab")]
    #[case("xs + [4]", "[1, 2, 3, 4]")]
    #[case("xs[-1]", "3")]
    #[case("xs[1:]", "[2, 3]")]
    #[case("name[:3]", "Wor")]
    #[case("1 < n <= 7", "True")]
    #[case("2 in xs and 'or' in name", "True")]
    #[case("4 not in xs", "True")]
    #[case("0 or 'fallback'", "fallback")]
    #[case("n and None", "None")]
    #[case("'odd' if n % 2 else 'even'", "odd")]
    #[case("[x * x for x in xs if x != 2]", "[1, 9]")]
    #[case("{'a': 1, 'b': n}['b']", "7")]
    #[case("{'a': 1}.a", "1")]
    #[case("f'Hello {name}!'", "Hello World!")]
    #[case("f'{n:03d}'", "007")]
    #[case("None is None", "True")]
    fn test_expressions(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(eval(text).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("missing", "NameError")]
    #[case("1 / 0", "ZeroDivisionError")]
    #[case("1 // 0", "ZeroDivisionError")]
    #[case("xs[5]", "IndexError")]
    #[case("{'a': 1}['b']", "KeyError")]
    #[case("name.missing", "AttributeError")]
    #[case("'a' + 1", "TypeError")]
    #[case("int('x')", "ValueError")]
    #[case("1 +", "SyntaxError")]
    #[case("n()", "TypeError")]
    fn test_error_kinds(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(eval(text).unwrap_err().type_name(), expected);
    }

    #[rstest]
    #[case("'ab' * 2 ** 62")]
    #[case("2 ** 62 * 'ab'")]
    #[case("'x' * 10000001")]
    #[case("xs * 2 ** 40")]
    #[case("[0] * 10000001")]
    fn test_repetition_past_limit(#[case] text: &str) {
        assert_eq!(eval(text).unwrap_err().type_name(), "MemoryError");
    }

    #[rstest]
    #[case("'ab' * -3", "")]
    #[case("xs * -1", "[]")]
    #[case("[] * 2 ** 62", "[]")]
    #[case("'' * 2 ** 62", "")]
    #[case("'x' * 10000000 == 'x' * 10000000", "True")]
    fn test_repetition_edge_counts(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(eval(text).unwrap().to_string(), expected);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            eval("'a' + 1").unwrap_err().to_string(),
            "unsupported operand type(s) for +: 'str' and 'int'"
        );
        assert_eq!(eval("{'a': 1}['b']").unwrap_err().to_string(), "'b'");
        assert_eq!(
            eval("1 / 0").unwrap_err().to_string(),
            "division by zero"
        );
    }

    #[test]
    fn test_exec_statements() {
        let mut scope = Scope::new();
        Interpreter
            .exec_stmt("a = 1\nb, c = 2, 3; total = a + b + c\ntotal += 10", &mut scope)
            .unwrap();
        assert_eq!(scope.get("total"), Some(&Value::Int(16)));
    }

    #[test]
    fn test_exec_in_place_methods() {
        let mut scope = Scope::new();
        let source = "xs = []\nxs.append(1)\nxs.extend([2, 3])\nd = {}\nd.update({'k': 1})";
        Interpreter.exec_stmt(source, &mut scope).unwrap();
        assert_eq!(scope.get("xs"), Some(&Value::from(vec![1i64, 2, 3])));
        assert_eq!(
            Interpreter.eval_expr("d['k']", &scope).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_exec_parses_everything_first() {
        let mut scope = Scope::new();
        let err = Interpreter
            .exec_stmt("a = 1\nb = (", &mut scope)
            .unwrap_err();
        assert_eq!(err.type_name(), "SyntaxError");
        assert!(!scope.contains("a"));
    }

    #[test]
    fn test_exec_stops_at_first_failure() {
        let mut scope = Scope::new();
        let err = Interpreter
            .exec_stmt("a = 1\nb = a / 0\nc = 3", &mut scope)
            .unwrap_err();
        assert_eq!(err.type_name(), "ZeroDivisionError");
        assert!(scope.contains("a"));
        assert!(!scope.contains("c"));
    }

    #[test]
    fn test_for_snapshots_are_independent() {
        let scope: Scope = [("base", 10i64)].into_iter().collect();
        let snapshots = Interpreter
            .eval_for_snapshots("i, c in enumerate('ab')", &scope)
            .unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].get("i"), Some(&Value::Int(1)));
        assert_eq!(snapshots[1].get("c"), Some(&Value::str("b")));
        assert_eq!(snapshots[0].get("base"), Some(&Value::Int(10)));
        assert!(!scope.contains("i"));
    }

    #[test]
    fn test_unpack_mismatch() {
        let err = Interpreter
            .eval_for_snapshots("a, b in [[1, 2, 3]]", &Scope::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "too many values to unpack (expected 2)");
    }

    #[test]
    fn test_condition_and_template() {
        let scope: Scope = [("script_index", 3i64)].into_iter().collect();
        assert!(Interpreter.eval_condition("script_index > 2", &scope).unwrap());
        assert_eq!(
            Interpreter
                .format_template("case.{script_index:0>3}.py", &scope)
                .unwrap(),
            "case.003.py"
        );
    }
}
