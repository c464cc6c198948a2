//! Parser for condition expressions, built from `nom` combinators.
//!
//! Precedence, loosest first: `||`, `&&`, comparisons (non-associative),
//! `+ -`, `* /`, unary `! not -`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, satisfy},
    combinator::{cut, map, not, opt, peek, recognize, value, verify},
    error::{ErrorKind, ParseError},
    multi::{fold_many0, many0_count},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
    IResult, Parser,
};
use thiserror::Error;

/// Deepest nesting of parentheses and unary operators accepted.
pub const MAX_DEPTH: usize = 64;

/// Words that can never name a variable.
const RESERVED: [&str; 5] = ["true", "false", "and", "or", "not"];

/// Binary operators, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed expression tree. Variables are indices into the variable list
/// the program was compiled against.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Var(usize),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Why an expression failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{message} at offset {offset}")]
    Syntax { message: String, offset: usize },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reason {
    Unexpected,
    TooDeep,
    ChainedComparison,
    UnknownVariable(String),
}

/// Parser error: where parsing stopped and why.
#[derive(Debug)]
struct Fault<'a> {
    input: &'a str,
    reason: Reason,
}

impl<'a> Fault<'a> {
    fn fatal(input: &'a str, reason: Reason) -> nom::Err<Self> {
        nom::Err::Failure(Self { input, reason })
    }

    fn into_compile_error(self, source: &str) -> CompileError {
        let rest = self.input.trim_start();
        let offset = source.len() - rest.len();
        let message = match self.reason {
            Reason::UnknownVariable(name) => return CompileError::UnknownVariable(name),
            Reason::TooDeep => "expression nested too deeply".to_string(),
            Reason::ChainedComparison => "chained comparison needs parentheses".to_string(),
            Reason::Unexpected => match rest.chars().next() {
                Some(ch) => format!("unexpected character '{ch}'"),
                None => "unexpected end of expression".to_string(),
            },
        };
        CompileError::Syntax { message, offset }
    }
}

impl<'a> ParseError<&'a str> for Fault<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self {
            input,
            reason: Reason::Unexpected,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, Fault<'a>>;

/// Variables in scope and the current nesting depth.
#[derive(Clone, Copy)]
struct Scope<'v> {
    variables: &'v [String],
    depth: usize,
}

/// Parse `source`, binding identifiers to positions in `variables`.
pub fn parse(source: &str, variables: &[String]) -> Result<Expr, CompileError> {
    let scope = Scope {
        variables,
        depth: 0,
    };
    let fault = match terminated(|i| or_expr(i, scope), multispace0)(source) {
        Ok(("", expr)) => return Ok(expr),
        Ok((rest, _)) => Fault::from_error_kind(rest, ErrorKind::Eof),
        Err(nom::Err::Error(fault) | nom::Err::Failure(fault)) => fault,
        Err(nom::Err::Incomplete(_)) => Fault::from_error_kind("", ErrorKind::Eof),
    };
    Err(fault.into_compile_error(source))
}

// =============================================================================
// Tokens
// =============================================================================

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: Parser<&'a str, O, Fault<'a>>,
{
    preceded(multispace0, inner)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `word` not followed by another identifier character.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    verify(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |word: &str| !RESERVED.contains(&word),
    )(input)
}

fn number(input: &str) -> PResult<'_, f64> {
    preceded(peek(satisfy(|c| c.is_ascii_digit() || c == '.')), double)(input)
}

fn or_op(input: &str) -> PResult<'_, &str> {
    ws(alt((tag("||"), keyword("or"))))(input)
}

fn and_op(input: &str) -> PResult<'_, &str> {
    ws(alt((tag("&&"), keyword("and"))))(input)
}

fn not_op(input: &str) -> PResult<'_, &str> {
    ws(alt((terminated(tag("!"), not(char('='))), keyword("not"))))(input)
}

fn cmp_op(input: &str) -> PResult<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, char('<')),
        value(BinaryOp::Gt, char('>')),
    )))(input)
}

fn add_op(input: &str) -> PResult<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    )))(input)
}

fn mul_op(input: &str) -> PResult<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
    )))(input)
}

// =============================================================================
// Grammar
// =============================================================================

fn or_expr<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    let (input, first) = and_expr(input, scope)?;
    fold_many0(
        preceded(or_op, cut(move |i| and_expr(i, scope))),
        move || first.clone(),
        |lhs, rhs| binary(BinaryOp::Or, lhs, rhs),
    )(input)
}

fn and_expr<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    let (input, first) = comparison(input, scope)?;
    fold_many0(
        preceded(and_op, cut(move |i| comparison(i, scope))),
        move || first.clone(),
        |lhs, rhs| binary(BinaryOp::And, lhs, rhs),
    )(input)
}

fn comparison<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    let (input, lhs) = additive(input, scope)?;
    let (input, rest) = opt(pair(cmp_op, cut(move |i| additive(i, scope))))(input)?;
    let Some((op, rhs)) = rest else {
        return Ok((input, lhs));
    };
    if cmp_op(input).is_ok() {
        return Err(Fault::fatal(input, Reason::ChainedComparison));
    }
    Ok((input, binary(op, lhs, rhs)))
}

fn additive<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    let (input, first) = multiplicative(input, scope)?;
    fold_many0(
        pair(add_op, cut(move |i| multiplicative(i, scope))),
        move || first.clone(),
        |lhs, (op, rhs)| binary(op, lhs, rhs),
    )(input)
}

fn multiplicative<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    let (input, first) = unary(input, scope)?;
    fold_many0(
        pair(mul_op, cut(move |i| unary(i, scope))),
        move || first.clone(),
        |lhs, (op, rhs)| binary(op, lhs, rhs),
    )(input)
}

/// Every parenthesized group and unary operator passes through here once,
/// so this is where nesting is bounded.
fn unary<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    if scope.depth >= MAX_DEPTH {
        return Err(Fault::fatal(input, Reason::TooDeep));
    }
    let scope = Scope {
        depth: scope.depth + 1,
        ..scope
    };
    alt((
        map(preceded(not_op, cut(move |i| unary(i, scope))), |e| {
            Expr::Not(Box::new(e))
        }),
        map(preceded(ws(char('-')), cut(move |i| unary(i, scope))), |e| {
            Expr::Neg(Box::new(e))
        }),
        move |i| primary(i, scope),
    ))(input)
}

fn primary<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    preceded(
        multispace0,
        alt((
            value(Expr::Bool(true), keyword("true")),
            value(Expr::Bool(false), keyword("false")),
            move |i| variable(i, scope),
            map(number, Expr::Number),
            delimited(
                char('('),
                cut(move |i| or_expr(i, scope)),
                cut(ws(char(')'))),
            ),
        )),
    )(input)
}

fn variable<'a>(input: &'a str, scope: Scope<'_>) -> PResult<'a, Expr> {
    let (rest, name) = identifier(input)?;
    match scope.variables.iter().position(|var| var == name) {
        Some(index) => Ok((rest, Expr::Var(index))),
        None => Err(Fault::fatal(
            input,
            Reason::UnknownVariable(name.to_string()),
        )),
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
