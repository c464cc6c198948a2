//! Three-valued evaluation of parsed expressions.
//!
//! A missing reading propagates as [`Value::Missing`] through arithmetic,
//! comparisons and negation. `&&` and `||` follow Kleene logic so a known
//! operand can still decide the result.

use super::parser::{BinaryOp, Expr};
use crate::telemetry::Reading;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Missing,
}

impl Value {
    /// Boolean view of the value; numbers are true when non-zero.
    pub fn truth(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Num(n) => Some(n != 0.0),
            Self::Missing => None,
        }
    }

    fn num(self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Reading> for Value {
    fn from(reading: Reading) -> Self {
        match reading {
            Reading::Value(v) => Self::Num(v),
            Reading::Missing => Self::Missing,
        }
    }
}

impl From<Option<bool>> for Value {
    fn from(truth: Option<bool>) -> Self {
        truth.map_or(Self::Missing, Self::Bool)
    }
}

/// Evaluate `expr` with variable `i` bound to `values[i]`.
pub fn evaluate(expr: &Expr, values: &[Reading]) -> Value {
    match expr {
        Expr::Number(n) => Value::Num(*n),
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Var(index) => values
            .get(*index)
            .copied()
            .map_or(Value::Missing, Value::from),
        Expr::Not(inner) => evaluate(inner, values).truth().map(|b| !b).into(),
        Expr::Neg(inner) => evaluate(inner, values)
            .num()
            .map_or(Value::Missing, |n| Value::Num(-n)),
        Expr::Binary { op, lhs, rhs } => binary(*op, lhs, rhs, values),
    }
}

fn binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, values: &[Reading]) -> Value {
    match op {
        BinaryOp::Or => {
            let left = evaluate(lhs, values).truth();
            if left == Some(true) {
                return Value::Bool(true);
            }
            match (left, evaluate(rhs, values).truth()) {
                (_, Some(true)) => Value::Bool(true),
                (Some(false), Some(false)) => Value::Bool(false),
                _ => Value::Missing,
            }
        }
        BinaryOp::And => {
            let left = evaluate(lhs, values).truth();
            if left == Some(false) {
                return Value::Bool(false);
            }
            match (left, evaluate(rhs, values).truth()) {
                (_, Some(false)) => Value::Bool(false),
                (Some(true), Some(true)) => Value::Bool(true),
                _ => Value::Missing,
            }
        }
        _ => {
            let left = evaluate(lhs, values);
            let right = evaluate(rhs, values);
            apply(op, left, right)
        }
    }
}

fn apply(op: BinaryOp, left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Num(a), Value::Num(b)) => match op {
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::Ne => Value::Bool(a != b),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Le => Value::Bool(a <= b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::Ge => Value::Bool(a >= b),
            BinaryOp::Add => finite(a + b),
            BinaryOp::Sub => finite(a - b),
            BinaryOp::Mul => finite(a * b),
            BinaryOp::Div if b == 0.0 => Value::Missing,
            BinaryOp::Div => finite(a / b),
            BinaryOp::Or | BinaryOp::And => Value::Missing,
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::Ne => Value::Bool(a != b),
            _ => Value::Missing,
        },
        _ => Value::Missing,
    }
}

fn finite(n: f64) -> Value {
    if n.is_finite() {
        Value::Num(n)
    } else {
        Value::Missing
    }
}
