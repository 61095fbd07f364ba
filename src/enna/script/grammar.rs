//! Parsers for expressions, statements and FOR headers
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr        = or_test ("if" or_test "else" expr)?
//! or_test     = and_test ("or" and_test)*
//! and_test    = not_test ("and" not_test)*
//! not_test    = "not" not_test | comparison
//! comparison  = sum (compare_op sum)*
//! sum         = product (("+" | "-") product)*
//! product     = unary (("*" | "/" | "//" | "%") unary)*
//! unary       = ("-" | "+") unary | power
//! power       = primary ("**" unary)?
//! primary     = atom ("." ident | "[" subscript "]" | "(" arguments ")")*
//! ```
//!
//! Statements are split on newlines and `;` by [`split_statements`] before parsing, so the
//! parsers here never see more than one statement.

use super::syntax::{BinaryOp, CompareOp, Expr, ForHeader, Stmt, Target, UnaryOp};
use super::{EvalError, Value};
use chumsky::error::SimpleReason;
use chumsky::prelude::*;

type ParserError = Simple<char>;

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "for", "True", "False", "None", "pass",
    "lambda",
];

enum Argument {
    Positional(Expr),
    Keyword(String, Expr),
}

enum Postfix {
    Attr(String),
    Index(Expr),
    Slice(Option<Expr>, Option<Expr>),
    Call(Vec<Argument>),
}

impl Postfix {
    fn apply(self, target: Expr) -> Expr {
        let target = Box::new(target);
        match self {
            Postfix::Attr(name) => Expr::Attr(target, name),
            Postfix::Index(index) => Expr::Index(target, Box::new(index)),
            Postfix::Slice(start, stop) => {
                Expr::Slice(target, start.map(Box::new), stop.map(Box::new))
            }
            Postfix::Call(arguments) => {
                let mut args = Vec::new();
                let mut kwargs = Vec::new();
                for argument in arguments {
                    match argument {
                        Argument::Positional(expr) => args.push(expr),
                        Argument::Keyword(name, expr) => kwargs.push((name, expr)),
                    }
                }
                Expr::Call {
                    callee: target,
                    args,
                    kwargs,
                }
            }
        }
    }
}

fn identifier() -> impl Parser<char, String, Error = ParserError> + Clone {
    text::ident().try_map(|name: String, span| {
        if KEYWORDS.contains(&name.as_str()) {
            Err(Simple::custom(span, format!("'{}' is a reserved word", name)))
        } else {
            Ok(name)
        }
    })
}

fn string_literal() -> impl Parser<char, String, Error = ParserError> + Clone {
    let body = |quote: char| {
        let escape = just('\\').ignore_then(any()).map(|c: char| match c {
            'n' => "\n".to_string(),
            't' => "\t".to_string(),
            'r' => "\r".to_string(),
            '0' => "\0".to_string(),
            '\\' | '\'' | '"' => c.to_string(),
            other => format!("\\{}", other),
        });
        filter(move |c: &char| *c != quote && *c != '\\' && *c != '\n')
            .map(|c: char| c.to_string())
            .or(escape)
            .repeated()
            .delimited_by(just(quote), just(quote))
            .map(|parts: Vec<String>| parts.concat())
    };
    body('\'').or(body('"'))
}

fn number() -> impl Parser<char, Expr, Error = ParserError> + Clone {
    text::digits(10)
        .then(just('.').ignore_then(text::digits(10).or_not()).or_not())
        .then(
            one_of("eE")
                .ignore_then(one_of("+-").or_not())
                .then(text::digits(10))
                .or_not(),
        )
        .try_map(
            |((whole, fraction), exponent): (
                (String, Option<Option<String>>),
                Option<(Option<char>, String)>,
            ),
             span| {
                if fraction.is_none() && exponent.is_none() {
                    return whole
                        .parse::<i64>()
                        .map(|i| Expr::Literal(Value::Int(i)))
                        .map_err(|_| Simple::custom(span, "integer literal is too large"));
                }
                let mut literal = whole;
                literal.push('.');
                match fraction.flatten() {
                    Some(digits) => literal.push_str(&digits),
                    None => literal.push('0'),
                }
                if let Some((sign, digits)) = exponent {
                    literal.push('e');
                    if let Some(sign) = sign {
                        literal.push(sign);
                    }
                    literal.push_str(&digits);
                }
                literal
                    .parse::<f64>()
                    .map(|f| Expr::Literal(Value::Float(f)))
                    .map_err(|_| Simple::custom(span, "invalid float literal"))
            },
        )
}

/// `x`, `a, b` or `(a, (b, c))`
fn target_list() -> impl Parser<char, Target, Error = ParserError> + Clone {
    let single = recursive(|target| {
        identifier()
            .map(Target::Name)
            .or(target
                .separated_by(just(','))
                .at_least(1)
                .allow_trailing()
                .delimited_by(just('('), just(')'))
                .map(Target::Tuple))
            .padded()
    });
    single
        .separated_by(just(','))
        .at_least(1)
        .allow_trailing()
        .map(|mut targets: Vec<Target>| {
            if targets.len() == 1 {
                targets.remove(0)
            } else {
                Target::Tuple(targets)
            }
        })
}

pub fn expression() -> impl Parser<char, Expr, Error = ParserError> + Clone {
    recursive(|expr| {
        let constant = choice((
            text::keyword("True").to(Expr::Literal(Value::Bool(true))),
            text::keyword("False").to(Expr::Literal(Value::Bool(false))),
            text::keyword("None").to(Expr::Literal(Value::None)),
        ));

        let fstring = one_of("fF")
            .ignore_then(string_literal())
            .map(Expr::FString);

        let items = expr
            .clone()
            .separated_by(just(','))
            .allow_trailing()
            .padded();

        let comprehension = expr
            .clone()
            .then_ignore(text::keyword("for").padded())
            .then(target_list())
            .then_ignore(text::keyword("in").padded())
            .then(expr.clone())
            .then(
                text::keyword("if")
                    .padded()
                    .ignore_then(expr.clone())
                    .repeated(),
            )
            .map(|(((element, target), iter), conditions)| Expr::ListComp {
                element: Box::new(element),
                target,
                iter: Box::new(iter),
                conditions,
            });

        let list = comprehension
            .or(items.clone().map(Expr::List))
            .padded()
            .delimited_by(just('['), just(']'));

        let dict = expr
            .clone()
            .then_ignore(just(':').padded())
            .then(expr.clone())
            .separated_by(just(','))
            .allow_trailing()
            .padded()
            .delimited_by(just('{'), just('}'))
            .map(Expr::Dict);

        // `(x)` groups, `(x,)` and `(a, b)` are tuples
        let parenthesized = expr
            .clone()
            .then(
                just(',')
                    .padded()
                    .ignore_then(items.clone())
                    .or_not(),
            )
            .map(|(first, rest)| match rest {
                None => first,
                Some(rest) => Expr::List(std::iter::once(first).chain(rest).collect()),
            })
            .or(empty().padded().to(Expr::List(Vec::new())))
            .delimited_by(just('('), just(')'));

        let atom = choice((
            number(),
            fstring,
            string_literal().map(|s| Expr::Literal(Value::Str(s))),
            constant,
            identifier().map(Expr::Name),
            list,
            dict,
            parenthesized,
        ))
        .padded();

        let argument = identifier()
            .padded()
            .then_ignore(just('='))
            .then(expr.clone())
            .map(|(name, value)| Argument::Keyword(name, value))
            .or(expr.clone().map(Argument::Positional));

        let subscript = expr
            .clone()
            .or_not()
            .then(just(':').padded().ignore_then(expr.clone().or_not()).or_not())
            .try_map(|(first, second), span| match (first, second) {
                (Some(index), None) => Ok(Postfix::Index(index)),
                (start, Some(stop)) => Ok(Postfix::Slice(start, stop)),
                (None, None) => Err(Simple::custom(span, "empty subscript")),
            })
            .padded()
            .delimited_by(just('['), just(']'));

        let postfix = choice((
            just('.')
                .padded()
                .ignore_then(identifier())
                .map(Postfix::Attr),
            subscript,
            argument
                .separated_by(just(','))
                .allow_trailing()
                .padded()
                .delimited_by(just('('), just(')'))
                .map(Postfix::Call),
        ))
        .padded();

        let primary = atom
            .then(postfix.repeated())
            .foldl(|target, op| op.apply(target))
            .boxed();

        let unary = recursive(|unary| {
            let power = primary
                .clone()
                .then(just("**").padded().ignore_then(unary.clone()).or_not())
                .map(|(base, exponent)| match exponent {
                    Some(exponent) => {
                        Expr::Binary(Box::new(base), BinaryOp::Pow, Box::new(exponent))
                    }
                    None => base,
                });

            just('-')
                .to(UnaryOp::Neg)
                .or(just('+').to(UnaryOp::Pos))
                .padded()
                .then(unary)
                .map(|(op, operand)| Expr::Unary(op, Box::new(operand)))
                .or(power)
        })
        .boxed();

        let product = unary
            .clone()
            .then(
                choice((
                    just("//").to(BinaryOp::FloorDiv),
                    just('*').to(BinaryOp::Mul),
                    just('/').to(BinaryOp::Div),
                    just('%').to(BinaryOp::Mod),
                ))
                .padded()
                .then(unary)
                .repeated(),
            )
            .foldl(|lhs, (op, rhs)| Expr::Binary(Box::new(lhs), op, Box::new(rhs)))
            .boxed();

        let sum = product
            .clone()
            .then(
                just('+')
                    .to(BinaryOp::Add)
                    .or(just('-').to(BinaryOp::Sub))
                    .padded()
                    .then(product)
                    .repeated(),
            )
            .foldl(|lhs, (op, rhs)| Expr::Binary(Box::new(lhs), op, Box::new(rhs)))
            .boxed();

        let compare_op = choice((
            just("==").to(CompareOp::Eq),
            just("!=").to(CompareOp::Ne),
            just("<=").to(CompareOp::Le),
            just(">=").to(CompareOp::Ge),
            just('<').to(CompareOp::Lt),
            just('>').to(CompareOp::Gt),
            text::keyword("not")
                .padded()
                .then(text::keyword("in"))
                .to(CompareOp::NotIn),
            text::keyword("in").to(CompareOp::In),
            text::keyword("is")
                .padded()
                .then(text::keyword("not"))
                .to(CompareOp::IsNot),
            text::keyword("is").to(CompareOp::Is),
        ))
        .padded();

        let comparison = sum
            .clone()
            .then(compare_op.then(sum).repeated())
            .map(|(first, rest)| {
                if rest.is_empty() {
                    first
                } else {
                    Expr::Compare(Box::new(first), rest)
                }
            });

        let not_test = recursive(|not_test| {
            text::keyword("not")
                .padded()
                .ignore_then(not_test)
                .map(|operand| Expr::Not(Box::new(operand)))
                .or(comparison)
        })
        .boxed();

        let and_test = not_test
            .clone()
            .then(text::keyword("and").padded().ignore_then(not_test).repeated())
            .foldl(|lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)))
            .boxed();

        let or_test = and_test
            .clone()
            .then(text::keyword("or").padded().ignore_then(and_test).repeated())
            .foldl(|lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)))
            .boxed();

        or_test
            .clone()
            .then(
                text::keyword("if")
                    .padded()
                    .ignore_then(or_test)
                    .then_ignore(text::keyword("else").padded())
                    .then(expr)
                    .or_not(),
            )
            .map(|(then, branch)| match branch {
                Some((condition, otherwise)) => Expr::IfElse {
                    then: Box::new(then),
                    condition: Box::new(condition),
                    otherwise: Box::new(otherwise),
                },
                None => then,
            })
    })
}

/// `a` or the tuple `a, b, c`
fn expression_list() -> impl Parser<char, Expr, Error = ParserError> + Clone {
    expression()
        .then(just(',').padded().ignore_then(expression()).repeated())
        .then(just(',').padded().or_not())
        .map(|((first, rest), trailing)| {
            if rest.is_empty() && trailing.is_none() {
                first
            } else {
                Expr::List(std::iter::once(first).chain(rest).collect())
            }
        })
}

pub fn statement() -> impl Parser<char, Stmt, Error = ParserError> {
    let pass = text::keyword("pass").to(Stmt::Pass);

    let aug_assign = identifier()
        .padded()
        .then(choice((
            just("+=").to(BinaryOp::Add),
            just("-=").to(BinaryOp::Sub),
            just("*=").to(BinaryOp::Mul),
            just("/=").to(BinaryOp::Div),
            just("//=").to(BinaryOp::FloorDiv),
            just("%=").to(BinaryOp::Mod),
        )))
        .then(expression_list())
        .map(|((name, op), value)| Stmt::AugAssign(name, op, value));

    let assign = target_list()
        .then_ignore(just('='))
        .repeated()
        .at_least(1)
        .then(expression_list())
        .map(|(targets, value)| Stmt::Assign(targets, value));

    choice((pass, aug_assign, assign, expression_list().map(Stmt::Expr)))
        .padded()
        .then_ignore(end())
}

pub fn for_header() -> impl Parser<char, ForHeader, Error = ParserError> {
    target_list()
        .then_ignore(text::keyword("in").padded())
        .then(expression_list())
        .padded()
        .then_ignore(end())
        .map(|(target, iter)| ForHeader { target, iter })
}

pub fn parse_expression(text: &str) -> Result<Expr, EvalError> {
    expression()
        .padded()
        .then_ignore(end())
        .parse(text)
        .map_err(syntax_error)
}

pub fn parse_statement(text: &str) -> Result<Stmt, EvalError> {
    statement().parse(text).map_err(syntax_error)
}

pub fn parse_for_header(text: &str) -> Result<ForHeader, EvalError> {
    for_header().parse(text).map_err(syntax_error)
}

fn syntax_error(errors: Vec<ParserError>) -> EvalError {
    let Some(error) = errors.into_iter().next() else {
        return EvalError::Syntax("invalid syntax".to_string());
    };
    let column = error.span().start + 1;
    let message = match error.reason() {
        SimpleReason::Custom(message) => format!("{} at column {}", message, column),
        SimpleReason::Unclosed { delimiter, .. } => {
            format!("'{}' was never closed", delimiter)
        }
        SimpleReason::Unexpected => match error.found() {
            Some(found) => format!("invalid syntax: unexpected '{}' at column {}", found, column),
            None => "invalid syntax: unexpected end of input".to_string(),
        },
    };
    EvalError::Syntax(message)
}

/// Split a block of statements on newlines and `;`, dropping comments and blank pieces
///
/// Separators inside string literals or brackets do not split, so a list literal may span
/// several lines.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut in_comment = false;

    let mut flush = |current: &mut String| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            statements.push(trimmed.to_string());
        }
        current.clear();
    };

    for c in text.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                if depth == 0 {
                    flush(&mut current);
                } else {
                    current.push(c);
                }
            }
            continue;
        }
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '#' => in_comment = true,
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '\n' | ';' if depth == 0 => flush(&mut current),
            c => current.push(c),
        }
    }
    flush(&mut current);
    statements
}
