//! Binary operator semantics over the lattice.
//!
//! Dispatch is by operand family, first match wins: sequence repetition,
//! sequence concatenation, string concatenation, tensor arithmetic, then
//! numeric probing. Everything else is a `TypeError` naming the operator
//! and both operand types.

use subset_py_typing_parser::ast::BinOpKind;

use crate::error::{CheckResult, TypeCheckError};
use crate::ext::arith;
use crate::lattice::ops::elem_summary;
use crate::lattice::{join, ConstValue, NumKind, SeqElems, SeqKind, Type};
use crate::value::{classify_value, eval_arith, sample_value, Value};

/// Result type of `left op right`.
pub fn binop_type(op: BinOpKind, left: &Type, right: &Type) -> CheckResult<Type> {
    match (left, right) {
        (Type::Unknown, _) | (_, Type::Unknown) => Ok(Type::Unknown),

        (Type::Seq { kind, elems }, Type::Num { kind: count_kind, value })
        | (Type::Num { kind: count_kind, value }, Type::Seq { kind, elems }) => {
            repeat_seq(op, *kind, elems, *count_kind, *value, left, right)
        }

        (
            Type::Seq {
                kind: lk,
                elems: le,
            },
            Type::Seq {
                kind: rk,
                elems: re,
            },
        ) => concat_seq(op, *lk, le, *rk, re, left, right),

        (Type::Str { value: lv }, Type::Str { value: rv }) => {
            let value = match (lv, rv) {
                (Some(a), Some(b)) => Some(format!("{a}{b}")),
                _ => None,
            };
            Ok(Type::Str { value })
        }

        _ if left.is_tensor() || right.is_tensor() => arith::tensor_arith(op, left, right),

        (Type::Num { .. }, Type::Num { .. }) => probe_nums(op, left, right),

        _ => Err(type_error(op, left, right)),
    }
}

fn type_error(op: BinOpKind, left: &Type, right: &Type) -> TypeCheckError {
    TypeCheckError::op(op, left.to_string(), right.to_string())
}

/// `seq * n` (either operand order): only integer multiplication repeats.
/// A known count repeats a fixed sequence positionally (emptying it when
/// the count is not positive), an unknown count keeps only the joined
/// element type.
fn repeat_seq(
    op: BinOpKind,
    kind: SeqKind,
    elems: &SeqElems,
    count_kind: NumKind,
    count: Option<ConstValue>,
    left: &Type,
    right: &Type,
) -> CheckResult<Type> {
    if op != BinOpKind::Mult || count_kind == NumKind::Float {
        return Err(type_error(op, left, right));
    }
    let count = count.and_then(|v| v.as_i64());
    let elems = match (elems, count) {
        // A known non-positive count empties the sequence whether or not
        // its length was known.
        (_, Some(n)) if n <= 0 => SeqElems::Fixed(Vec::new()),
        (SeqElems::Fixed(es), Some(n)) => {
            let n = n as usize;
            let mut out = Vec::with_capacity(es.len().saturating_mul(n));
            for _ in 0..n {
                out.extend(es.iter().cloned());
            }
            SeqElems::Fixed(out)
        }
        (SeqElems::Fixed(_), None) => SeqElems::Uniform(Box::new(elem_summary(elems)?)),
        (SeqElems::Uniform(e), _) => SeqElems::Uniform(e.clone()),
    };
    Ok(Type::Seq { kind, elems })
}

/// `seq + seq`: same kind only. Two fixed tuples concatenate exactly;
/// every other combination keeps only the joined element type.
fn concat_seq(
    op: BinOpKind,
    lk: SeqKind,
    le: &SeqElems,
    rk: SeqKind,
    re: &SeqElems,
    left: &Type,
    right: &Type,
) -> CheckResult<Type> {
    if op != BinOpKind::Add || lk != rk {
        return Err(type_error(op, left, right));
    }
    let elems = match (le, re) {
        (SeqElems::Fixed(a), SeqElems::Fixed(b)) if lk == SeqKind::Tuple => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            SeqElems::Fixed(out)
        }
        _ => {
            let lhs = elem_summary(le)?;
            let rhs = elem_summary(re)?;
            SeqElems::Uniform(Box::new(join(&lhs, &rhs)?))
        }
    };
    Ok(Type::Seq { kind: lk, elems })
}

/// `num op num`: evaluate once over sample values and classify the result.
/// The result carries a literal only when both operands did and no divisor
/// was substituted.
fn probe_nums(op: BinOpKind, left: &Type, right: &Type) -> CheckResult<Type> {
    if matches!(op, BinOpKind::Mod | BinOpKind::Pow) {
        return Err(type_error(op, left, right));
    }
    let (Some(l), Some(r)) = (sample_value(left), sample_value(right)) else {
        return Err(type_error(op, left, right));
    };
    let mut known = left.num_value().is_some() && right.num_value().is_some();
    let r = if matches!(op, BinOpKind::Div | BinOpKind::FloorDiv) && r.is_zero() {
        // A zero divisor would abort the probe; 1 keeps it total and the
        // forced-unknown literal keeps it honest.
        known = false;
        match right.num_kind() {
            Some(NumKind::Float) => Value::Float(1.0),
            _ => Value::Int(1),
        }
    } else {
        r
    };
    let result = classify_value(eval_arith(op, l, r)?);
    Ok(if known { result } else { result.without_value() })
}

// ==================== Tests ====================
