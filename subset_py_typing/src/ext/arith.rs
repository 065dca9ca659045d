//! Tensor arithmetic contract: dtype promotion and shape broadcasting for
//! binary operations with a tensor on either side.

use subset_py_typing_parser::ast::BinOpKind;

use crate::error::{CheckResult, TypeCheckError};
use crate::lattice::{Dtype, NumKind, TensorKind, Type};

/// One side of a tensor operation, reduced to what promotion needs.
enum Operand<'a> {
    Tensor {
        kind: TensorKind,
        dtype: Option<Dtype>,
        shape: Option<&'a [usize]>,
    },
    Scalar(NumKind),
}

fn operand(ty: &Type) -> Option<Operand<'_>> {
    match ty {
        Type::Tensor { kind, dtype, shape } => Some(Operand::Tensor {
            kind: *kind,
            dtype: *dtype,
            shape: shape.as_deref(),
        }),
        Type::Num { kind, .. } => Some(Operand::Scalar(*kind)),
        _ => None,
    }
}

/// Dtype a scalar operand contributes to promotion. Floats land on the
/// family's default float so `x / 255.0` keeps a float32 torch tensor at
/// float32.
fn scalar_dtype(kind: NumKind, family: TensorKind) -> Dtype {
    match kind {
        NumKind::Bool => Dtype::Bool,
        NumKind::Int => Dtype::Int64,
        NumKind::Float => family.default_float(),
    }
}

/// Result type of `left op right` where at least one side is a tensor.
///
/// The result family is the tensor operand's, the left one when both sides
/// are tensors. Dtypes promote upward (bool below ints below floats, wider
/// beats narrower) and true division lifts an integral result to the
/// family's default float. Shapes broadcast right-aligned; a scalar operand
/// leaves the tensor's shape untouched.
pub fn tensor_arith(op: BinOpKind, left: &Type, right: &Type) -> CheckResult<Type> {
    let (kind, dtype, shape) = combine(left, right)
        .ok_or_else(|| TypeCheckError::op(op, left.to_string(), right.to_string()))?;
    let dtype = match (op, dtype) {
        (BinOpKind::Div, Some(d)) if d.is_integral() => Some(kind.default_float()),
        (_, d) => d,
    };
    Ok(Type::Tensor { kind, dtype, shape })
}

/// Result type of a comparison with a tensor on either side: a bool tensor
/// over the broadcast shape.
pub fn tensor_compare(
    op: impl std::fmt::Display,
    left: &Type,
    right: &Type,
) -> CheckResult<Type> {
    let (kind, _, shape) = combine(left, right)
        .ok_or_else(|| TypeCheckError::op(op, left.to_string(), right.to_string()))?;
    Ok(Type::Tensor {
        kind,
        dtype: Some(Dtype::Bool),
        shape,
    })
}

type Combined = (TensorKind, Option<Dtype>, Option<Vec<usize>>);

/// Family, promoted dtype and broadcast shape for one tensor operation.
/// `None` when the operands do not combine (non-numeric partner, or shapes
/// that fail to broadcast).
fn combine(left: &Type, right: &Type) -> Option<Combined> {
    let (l, r) = (operand(left)?, operand(right)?);
    match (l, r) {
        (
            Operand::Tensor {
                kind,
                dtype: dl,
                shape: sl,
            },
            Operand::Tensor {
                kind: _,
                dtype: dr,
                shape: sr,
            },
        ) => {
            let dtype = match (dl, dr) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
            let shape = match (sl, sr) {
                (Some(a), Some(b)) => Some(broadcast(a, b)?),
                _ => None,
            };
            Some((kind, dtype, shape))
        }
        (
            Operand::Tensor { kind, dtype, shape },
            Operand::Scalar(num),
        )
        | (
            Operand::Scalar(num),
            Operand::Tensor { kind, dtype, shape },
        ) => {
            let dtype = dtype.map(|d| d.max(scalar_dtype(num, kind)));
            Some((kind, dtype, shape.map(<[usize]>::to_vec)))
        }
        (Operand::Scalar(_), Operand::Scalar(_)) => None,
    }
}

/// Right-aligned shape broadcasting: trailing dimensions must be equal or 1.
fn broadcast(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let len = a.len().max(b.len());
    let mut out = vec![0; len];
    for i in 0..len {
        let da = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let db = if i < b.len() { b[b.len() - 1 - i] } else { 1 };
        out[len - 1 - i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return None;
        };
    }
    Some(out)
}

// ==================== Tests ====================
