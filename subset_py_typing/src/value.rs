//! Sample values for numeric operand probing.
//!
//! Numeric binops are typed by actually evaluating the operation once over
//! representative operand values, then classifying the result. A known
//! literal supplies its own value; an unknown number contributes a default
//! sample of its kind. The arithmetic here follows Python: `bool` behaves
//! as 0 or 1, `/` always produces a float, and `//` floors toward negative
//! infinity.

use crate::error::{CheckResult, TypeCheckError};
use crate::lattice::{ConstValue, NumKind, Type};
use subset_py_typing_parser::ast::BinOpKind;

/// A concrete number used while probing a numeric operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => *i as f64,
            Value::Float(x) => *x,
        }
    }

    /// Integral view with `bool` as 0 or 1. `None` for floats.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            Value::Float(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(b) => !*b,
            Value::Int(i) => *i == 0,
            Value::Float(x) => *x == 0.0,
        }
    }
}

impl From<ConstValue> for Value {
    fn from(v: ConstValue) -> Value {
        match v {
            ConstValue::Bool(b) => Value::Bool(b),
            ConstValue::Int(i) => Value::Int(i),
            ConstValue::Float(x) => Value::Float(x),
        }
    }
}

/// Representative value for a numeric type: the literal when there is one,
/// otherwise the zero of its kind. `None` for anything non-numeric.
pub fn sample_value(ty: &Type) -> Option<Value> {
    match ty {
        Type::Num { value: Some(v), .. } => Some(Value::from(*v)),
        Type::Num { kind, value: None } => Some(match kind {
            NumKind::Bool => Value::Bool(false),
            NumKind::Int => Value::Int(0),
            NumKind::Float => Value::Float(0.0),
        }),
        _ => None,
    }
}

/// Type of a probe result, carrying the result as a literal. Callers drop
/// the literal again when either operand was not a known literal.
pub fn classify_value(value: Value) -> Type {
    match value {
        Value::Bool(b) => Type::bool_lit(b),
        Value::Int(i) => Type::int_lit(i),
        Value::Float(x) => Type::float_lit(x),
    }
}

/// Evaluates one arithmetic operation over sample values, with Python's
/// numeric semantics. Only `+ - * / //` are evaluable; the caller rejects
/// other operators before probing.
pub fn eval_arith(op: BinOpKind, left: Value, right: Value) -> CheckResult<Value> {
    match op {
        BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mult => {
            match (left.as_int(), right.as_int()) {
                (Some(a), Some(b)) => Ok(Value::Int(match op {
                    BinOpKind::Add => a.wrapping_add(b),
                    BinOpKind::Sub => a.wrapping_sub(b),
                    _ => a.wrapping_mul(b),
                })),
                _ => {
                    let a = left.as_f64();
                    let b = right.as_f64();
                    Ok(Value::Float(match op {
                        BinOpKind::Add => a + b,
                        BinOpKind::Sub => a - b,
                        _ => a * b,
                    }))
                }
            }
        }
        BinOpKind::Div => {
            if right.is_zero() {
                return Err(TypeCheckError::invalid("division by zero"));
            }
            Ok(Value::Float(left.as_f64() / right.as_f64()))
        }
        BinOpKind::FloorDiv => {
            if right.is_zero() {
                return Err(TypeCheckError::invalid("division by zero"));
            }
            match (left.as_int(), right.as_int()) {
                (Some(a), Some(b)) => Ok(Value::Int(floor_div(a, b))),
                _ => Ok(Value::Float((left.as_f64() / right.as_f64()).floor())),
            }
        }
        BinOpKind::Mod | BinOpKind::Pow => Err(TypeCheckError::invalid(format!(
            "operator {op} is not evaluable"
        ))),
    }
}

/// Integer division flooring toward negative infinity, as Python's `//`.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

// ==================== Tests ====================
