//! Typing rules for the framework functions that show up in model forward
//! passes: chainer-style `F.*` ops, `torch.*` ops and numpy constructors.

use crate::error::{CheckResult, TypeCheckError};
use crate::ext::{CallTypes, OpRegistry};
use crate::lattice::{Dtype, SeqElems, TensorKind, Type};

pub fn register(registry: &mut OpRegistry) {
    registry.register("F.relu", relu);
    registry.register("torch.relu", relu);
    registry.register("F.sigmoid", sigmoid);
    registry.register("torch.sigmoid", sigmoid);
    registry.register("torch.tanh", sigmoid);
    registry.register("F.dropout", dropout);
    registry.register("torch.flatten", flatten);
    registry.register("F.max_pooling_2d", pool2d);
    registry.register("F.average_pooling_2d", pool2d);
    registry.register("F.softmax_cross_entropy", softmax_cross_entropy);
    registry.register("np.zeros", filled);
    registry.register("np.ones", filled);
}

// ==================== Shared helpers ====================

enum Promote {
    Keep,
    FloatOut,
}

/// Elementwise op over one tensor argument: family and shape survive,
/// dtype optionally promotes to the family float.
fn elementwise(call: &CallTypes, arg: &Type, promote: Promote) -> CheckResult<Type> {
    match arg {
        Type::Tensor { kind, dtype, shape } => {
            let dtype = match promote {
                Promote::Keep => *dtype,
                Promote::FloatOut => dtype.map(|d| {
                    if d.is_integral() {
                        kind.default_float()
                    } else {
                        d
                    }
                }),
            };
            Ok(Type::Tensor {
                kind: *kind,
                dtype,
                shape: shape.clone(),
            })
        }
        Type::Unknown => Ok(Type::Unknown),
        t => Err(TypeCheckError::invalid(format!(
            "{}(): expected a tensor, got {t}",
            call.callee
        ))),
    }
}

/// Known integer carried by a numeric type, if any.
fn int_literal(ty: &Type) -> Option<i64> {
    ty.num_value().and_then(|v| v.as_i64())
}

// ==================== Activations ====================

fn relu(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    elementwise(call, &call.args[0], Promote::Keep)
}

fn sigmoid(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    elementwise(call, &call.args[0], Promote::FloatOut)
}

/// `F.dropout(x)`, optionally with a ratio. Identity on the type.
fn dropout(call: &CallTypes) -> CheckResult<Type> {
    if call.args.is_empty() || call.args.len() > 2 {
        return Err(TypeCheckError::arity(
            call.callee.clone(),
            1,
            call.args.len(),
        ));
    }
    elementwise(call, &call.args[0], Promote::Keep)
}

// ==================== Reshaping ====================

/// `torch.flatten(x, start_dim=k)`: collapses dimensions `k..` into one.
fn flatten(call: &CallTypes) -> CheckResult<Type> {
    if call.args.is_empty() || call.args.len() > 2 {
        return Err(TypeCheckError::arity(
            call.callee.clone(),
            1,
            call.args.len(),
        ));
    }
    let start_ty = call.arg(1).or_else(|| call.kwarg("start_dim"));
    match &call.args[0] {
        Type::Tensor { kind, dtype, shape } => {
            let shape = match shape {
                Some(dims) => flattened_shape(dims, start_ty)?,
                None => None,
            };
            Ok(Type::Tensor {
                kind: *kind,
                dtype: *dtype,
                shape,
            })
        }
        Type::Unknown => Ok(Type::Unknown),
        t => Err(TypeCheckError::invalid(format!(
            "torch.flatten(): expected a tensor, got {t}"
        ))),
    }
}

fn flattened_shape(dims: &[usize], start_ty: Option<&Type>) -> CheckResult<Option<Vec<usize>>> {
    let start = match start_ty {
        None => 0,
        Some(t) => match int_literal(t) {
            Some(s) => s,
            // Unknown start dimension: the result shape is unknowable.
            None => return Ok(None),
        },
    };
    let ndim = dims.len() as i64;
    let start = if start < 0 { start + ndim } else { start };
    if start < 0 || (start >= ndim && ndim > 0) {
        return Err(TypeCheckError::invalid(format!(
            "torch.flatten(): start_dim out of range for {ndim} dimensions"
        )));
    }
    let start = start as usize;
    let mut out = dims[..start].to_vec();
    out.push(dims[start..].iter().product());
    Ok(Some(out))
}

// ==================== Pooling ====================

/// 2-d pooling over `(N, C, H, W)`: `H' = (H - k) / s + 1` with floor
/// division, stride defaulting to the kernel size.
fn pool2d(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(2)?;
    let ksize = int_literal(&call.args[1]);
    let stride = match call.kwarg("stride") {
        Some(t) => int_literal(t),
        None => ksize,
    };
    match &call.args[0] {
        Type::Tensor { kind, dtype, shape } => {
            let shape = match (shape, ksize, stride) {
                (Some(dims), Some(k), Some(s)) => Some(pooled_shape(&call.callee, dims, k, s)?),
                _ => None,
            };
            Ok(Type::Tensor {
                kind: *kind,
                dtype: *dtype,
                shape,
            })
        }
        Type::Unknown => Ok(Type::Unknown),
        t => Err(TypeCheckError::invalid(format!(
            "{}(): expected a tensor, got {t}",
            call.callee
        ))),
    }
}

fn pooled_shape(callee: &str, dims: &[usize], k: i64, s: i64) -> CheckResult<Vec<usize>> {
    if dims.len() != 4 {
        return Err(TypeCheckError::invalid(format!(
            "{callee}(): expected a 4-dimensional input, got {} dimensions",
            dims.len()
        )));
    }
    if k <= 0 || s <= 0 {
        return Err(TypeCheckError::invalid(format!(
            "{callee}(): kernel size and stride must be positive"
        )));
    }
    let (k, s) = (k as usize, s as usize);
    let mut out = dims.to_vec();
    for dim in &mut out[2..] {
        if *dim < k {
            return Err(TypeCheckError::invalid(format!(
                "{callee}(): pooling window of size {k} exceeds input dimension {dim}"
            )));
        }
        *dim = (*dim - k) / s + 1;
    }
    Ok(out)
}

// ==================== Losses ====================

/// `F.softmax_cross_entropy(x, t)`: a scalar float32 loss in the family of
/// the prediction tensor.
fn softmax_cross_entropy(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(2)?;
    let kind = match &call.args[0] {
        Type::Tensor { kind, .. } => *kind,
        Type::Unknown => TensorKind::Ndarray,
        t => {
            return Err(TypeCheckError::invalid(format!(
                "{}(): expected a tensor, got {t}",
                call.callee
            )))
        }
    };
    Ok(Type::Tensor {
        kind,
        dtype: Some(Dtype::Float32),
        shape: Some(vec![]),
    })
}

// ==================== Constructors ====================

/// `np.zeros(shape)` / `np.ones(shape)`: float64 ndarray, shaped when the
/// shape argument is a literal.
fn filled(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    let shape = shape_literal(&call.args[0])?;
    Ok(Type::Tensor {
        kind: TensorKind::Ndarray,
        dtype: Some(Dtype::Float64),
        shape,
    })
}

/// Reads a shape argument: a single int or a tuple/list of ints. Unknown
/// components degrade to an unknown shape rather than failing.
fn shape_literal(ty: &Type) -> CheckResult<Option<Vec<usize>>> {
    let as_dim = |t: &Type| -> CheckResult<Option<usize>> {
        match int_literal(t) {
            Some(d) if d < 0 => Err(TypeCheckError::invalid(
                "negative dimensions are not allowed",
            )),
            Some(d) => Ok(Some(d as usize)),
            None if t.is_num() || t.is_unknown() => Ok(None),
            None => Err(TypeCheckError::invalid(format!(
                "expected a sequence of integers or a single integer, got {t}"
            ))),
        }
    };
    match ty {
        Type::Num { .. } => Ok(as_dim(ty)?.map(|d| vec![d])),
        Type::Seq { elems, .. } => match elems {
            SeqElems::Fixed(elems) => {
                let mut dims = Vec::with_capacity(elems.len());
                for elem in elems {
                    match as_dim(elem)? {
                        Some(d) => dims.push(d),
                        None => return Ok(None),
                    }
                }
                Ok(Some(dims))
            }
            SeqElems::Uniform(elem) => {
                as_dim(elem)?;
                Ok(None)
            }
        },
        Type::Unknown => Ok(None),
        t => Err(TypeCheckError::invalid(format!(
            "expected a sequence of integers or a single integer, got {t}"
        ))),
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: Vec<Type>) -> CallTypes {
        CallTypes::new(name, args)
    }

    #[test]
    fn relu_passes_the_tensor_through() {
        let t = Type::torch_tensor(Dtype::Float32, vec![1, 4096]);
        assert_eq!(relu(&call("torch.relu", vec![t.clone()])).unwrap(), t);
        let i = Type::ndarray_shaped(Dtype::Int64, vec![3]);
        assert_eq!(relu(&call("F.relu", vec![i.clone()])).unwrap(), i);
        assert_eq!(relu(&call("F.relu", vec![Type::Unknown])).unwrap(), Type::Unknown);
        assert!(relu(&call("F.relu", vec![Type::int()])).is_err());
    }

    #[test]
    fn sigmoid_promotes_integral_dtypes() {
        let i = Type::ndarray_shaped(Dtype::Int64, vec![3]);
        assert_eq!(
            sigmoid(&call("F.sigmoid", vec![i])).unwrap(),
            Type::ndarray_shaped(Dtype::Float64, vec![3])
        );
        let t = Type::torch_tensor(Dtype::Int32, vec![3]);
        assert_eq!(
            sigmoid(&call("torch.sigmoid", vec![t])).unwrap(),
            Type::torch_tensor(Dtype::Float32, vec![3])
        );
        let f = Type::torch_tensor(Dtype::Float16, vec![3]);
        assert_eq!(sigmoid(&call("torch.tanh", vec![f.clone()])).unwrap(), f);
    }

    #[test]
    fn dropout_is_identity_on_the_type() {
        let t = Type::ndarray_shaped(Dtype::Float32, vec![1, 1000]);
        assert_eq!(dropout(&call("F.dropout", vec![t.clone()])).unwrap(), t);
        assert_eq!(
            dropout(&call("F.dropout", vec![t.clone(), Type::float_lit(0.5)])).unwrap(),
            t
        );
        assert!(dropout(&call("F.dropout", vec![])).is_err());
    }

    #[test]
    fn flatten_collapses_trailing_dimensions() {
        let t = Type::torch_tensor(Dtype::Float32, vec![1, 256, 6, 6]);
        let flat = flatten(
            &call("torch.flatten", vec![t.clone()])
                .with_kwargs(vec![("start_dim".into(), Type::int_lit(1))]),
        )
        .unwrap();
        assert_eq!(flat, Type::torch_tensor(Dtype::Float32, vec![1, 9216]));

        // Positional start_dim behaves the same.
        let flat = flatten(&call("torch.flatten", vec![t.clone(), Type::int_lit(1)])).unwrap();
        assert_eq!(flat, Type::torch_tensor(Dtype::Float32, vec![1, 9216]));

        // Default start_dim flattens everything.
        let flat = flatten(&call("torch.flatten", vec![t.clone()])).unwrap();
        assert_eq!(flat, Type::torch_tensor(Dtype::Float32, vec![9216]));

        // Negative start_dim counts from the back.
        let flat = flatten(&call("torch.flatten", vec![t.clone(), Type::int_lit(-2)])).unwrap();
        assert_eq!(flat, Type::torch_tensor(Dtype::Float32, vec![1, 256, 36]));
    }

    #[test]
    fn flatten_with_unknown_start_loses_the_shape() {
        let t = Type::torch_tensor(Dtype::Float32, vec![1, 256, 6, 6]);
        let flat = flatten(&call("torch.flatten", vec![t, Type::int()])).unwrap();
        assert_eq!(
            flat,
            Type::tensor(TensorKind::Torch, Some(Dtype::Float32), None)
        );
    }

    #[test]
    fn flatten_rejects_out_of_range_start() {
        let t = Type::torch_tensor(Dtype::Float32, vec![2, 3]);
        assert!(flatten(&call("torch.flatten", vec![t, Type::int_lit(2)])).is_err());
    }

    #[test]
    fn pooling_floors_spatial_dimensions() {
        let x = Type::ndarray_shaped(Dtype::Float32, vec![1, 3, 28, 28]);
        let pooled = pool2d(&call("F.max_pooling_2d", vec![x.clone(), Type::int_lit(2)])).unwrap();
        assert_eq!(pooled, Type::ndarray_shaped(Dtype::Float32, vec![1, 3, 14, 14]));

        let pooled = pool2d(
            &call("F.average_pooling_2d", vec![x.clone(), Type::int_lit(3)])
                .with_kwargs(vec![("stride".into(), Type::int_lit(2))]),
        )
        .unwrap();
        assert_eq!(pooled, Type::ndarray_shaped(Dtype::Float32, vec![1, 3, 13, 13]));
    }

    #[test]
    fn pooling_needs_four_dimensions() {
        let x = Type::ndarray_shaped(Dtype::Float32, vec![28, 28]);
        assert!(pool2d(&call("F.max_pooling_2d", vec![x, Type::int_lit(2)])).is_err());
    }

    #[test]
    fn pooling_with_unknown_kernel_loses_the_shape() {
        let x = Type::ndarray_shaped(Dtype::Float32, vec![1, 3, 28, 28]);
        let pooled = pool2d(&call("F.max_pooling_2d", vec![x, Type::int()])).unwrap();
        assert_eq!(
            pooled,
            Type::tensor(TensorKind::Ndarray, Some(Dtype::Float32), None)
        );
    }

    #[test]
    fn softmax_cross_entropy_is_a_scalar_loss() {
        let x = Type::ndarray_shaped(Dtype::Float32, vec![32, 10]);
        let t = Type::ndarray_shaped(Dtype::Int32, vec![32]);
        assert_eq!(
            softmax_cross_entropy(&call("F.softmax_cross_entropy", vec![x, t])).unwrap(),
            Type::ndarray_shaped(Dtype::Float32, vec![])
        );
    }

    #[test]
    fn np_constructors_build_shaped_float64_arrays() {
        let shape = Type::tuple_of(vec![Type::int_lit(2), Type::int_lit(3)]);
        assert_eq!(
            filled(&call("np.zeros", vec![shape])).unwrap(),
            Type::ndarray_shaped(Dtype::Float64, vec![2, 3])
        );
        assert_eq!(
            filled(&call("np.ones", vec![Type::int_lit(4)])).unwrap(),
            Type::ndarray_shaped(Dtype::Float64, vec![4])
        );
        assert_eq!(
            filled(&call("np.zeros", vec![Type::tuple_of(vec![Type::int(), Type::int_lit(3)])]))
                .unwrap(),
            Type::ndarray(Dtype::Float64)
        );
        assert!(filled(&call("np.zeros", vec![Type::int_lit(-1)])).is_err());
        assert!(filled(&call("np.zeros", vec![Type::string()])).is_err());
    }
}
