//! Typing rules for the handful of Python builtins model code leans on.

use crate::error::{CheckResult, TypeCheckError};
use crate::ext::{CallTypes, OpRegistry};
use crate::lattice::{ConstValue, NumKind, SeqElems, Type};

pub fn register(registry: &mut OpRegistry) {
    registry.register("abs", abs);
    registry.register("len", len);
    registry.register("float", float);
    registry.register("int", int);
    registry.register("range", range);
}

/// `abs(x)`: kind preserving for numbers (bools count as ints, like
/// Python), literal folding, shape preserving for tensors.
fn abs(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    match &call.args[0] {
        Type::Num { kind, value } => {
            let kind = (*kind).max(NumKind::Int);
            let value = value.map(|v| match v {
                ConstValue::Bool(b) => ConstValue::Int(i64::from(b)),
                ConstValue::Int(i) => ConstValue::Int(i.wrapping_abs()),
                ConstValue::Float(x) => ConstValue::Float(x.abs()),
            });
            Ok(Type::Num { kind, value })
        }
        t @ Type::Tensor { .. } => Ok(t.clone()),
        Type::Unknown => Ok(Type::Unknown),
        t => Err(TypeCheckError::invalid(format!(
            "bad operand type for abs(): {t}"
        ))),
    }
}

/// `len(x)`: literal length for fixed sequences, known strings and tensors
/// with a known leading dimension, plain `int` otherwise.
fn len(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    match &call.args[0] {
        Type::Seq { elems, .. } => Ok(match elems {
            SeqElems::Fixed(elems) => Type::int_lit(elems.len() as i64),
            SeqElems::Uniform(_) => Type::int(),
        }),
        Type::Str { value } => Ok(match value {
            Some(s) => Type::int_lit(s.chars().count() as i64),
            None => Type::int(),
        }),
        Type::Tensor { shape, .. } => match shape {
            Some(shape) if shape.is_empty() => {
                Err(TypeCheckError::invalid("len() of unsized object"))
            }
            Some(shape) => Ok(Type::int_lit(shape[0] as i64)),
            None => Ok(Type::int()),
        },
        Type::Unknown => Ok(Type::int()),
        t => Err(TypeCheckError::invalid(format!(
            "object of type {t} has no len()"
        ))),
    }
}

/// `float(x)`: numeric conversion with literal folding; known numeric
/// strings parse, unknown strings stay unknown floats.
fn float(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    match &call.args[0] {
        Type::Num { value, .. } => Ok(Type::Num {
            kind: NumKind::Float,
            value: value.map(|v| ConstValue::Float(v.as_f64())),
        }),
        Type::Str { value } => Ok(Type::Num {
            kind: NumKind::Float,
            value: value
                .as_ref()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .map(ConstValue::Float),
        }),
        Type::Unknown => Ok(Type::float()),
        t => Err(TypeCheckError::invalid(format!(
            "float() argument must be a string or a number, not {t}"
        ))),
    }
}

/// `int(x)`: truncating conversion with literal folding.
fn int(call: &CallTypes) -> CheckResult<Type> {
    call.expect_args(1)?;
    match &call.args[0] {
        Type::Num { value, .. } => Ok(Type::Num {
            kind: NumKind::Int,
            value: value.map(|v| match v {
                ConstValue::Bool(b) => ConstValue::Int(i64::from(b)),
                ConstValue::Int(i) => ConstValue::Int(i),
                ConstValue::Float(x) => ConstValue::Int(x.trunc() as i64),
            }),
        }),
        Type::Str { value } => Ok(Type::Num {
            kind: NumKind::Int,
            value: value
                .as_ref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .map(ConstValue::Int),
        }),
        Type::Unknown => Ok(Type::int()),
        t => Err(TypeCheckError::invalid(format!(
            "int() argument must be a string or a number, not {t}"
        ))),
    }
}

/// `range(...)`: one to three integer arguments, always an `int list`.
fn range(call: &CallTypes) -> CheckResult<Type> {
    if call.args.is_empty() {
        return Err(TypeCheckError::invalid(
            "range expected at least 1 argument, got 0",
        ));
    }
    if call.args.len() > 3 {
        return Err(TypeCheckError::invalid(format!(
            "range expected at most 3 arguments, got {}",
            call.args.len()
        )));
    }
    for arg in &call.args {
        let ok = matches!(
            arg,
            Type::Num {
                kind: NumKind::Bool | NumKind::Int,
                ..
            } | Type::Unknown
        );
        if !ok {
            return Err(TypeCheckError::invalid(format!(
                "{arg} object cannot be interpreted as an integer"
            )));
        }
    }
    Ok(Type::list_of(Type::int()))
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Dtype;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: Vec<Type>) -> CallTypes {
        CallTypes::new(name, args)
    }

    #[test]
    fn abs_preserves_kind_and_folds_literals() {
        assert_eq!(abs(&call("abs", vec![Type::int_lit(-3)])).unwrap(), Type::int_lit(3));
        assert_eq!(
            abs(&call("abs", vec![Type::float_lit(-1.5)])).unwrap(),
            Type::float_lit(1.5)
        );
        assert_eq!(abs(&call("abs", vec![Type::int()])).unwrap(), Type::int());
        assert_eq!(abs(&call("abs", vec![Type::bool_lit(true)])).unwrap(), Type::int_lit(1));
        let t = Type::torch_tensor(Dtype::Float32, vec![2, 3]);
        assert_eq!(abs(&call("abs", vec![t.clone()])).unwrap(), t);
        assert!(abs(&call("abs", vec![Type::string()])).is_err());
    }

    #[test]
    fn abs_checks_arity() {
        let err = abs(&call("abs", vec![])).unwrap_err();
        assert_eq!(err.to_string(), "abs() takes 1 arguments but 0 were given");
    }

    #[test]
    fn len_knows_fixed_lengths() {
        assert_eq!(
            len(&call("len", vec![Type::tuple_of(vec![Type::int(), Type::string()])])).unwrap(),
            Type::int_lit(2)
        );
        assert_eq!(
            len(&call("len", vec![Type::list_of(Type::int())])).unwrap(),
            Type::int()
        );
        assert_eq!(
            len(&call("len", vec![Type::string_lit("abc")])).unwrap(),
            Type::int_lit(3)
        );
        assert_eq!(
            len(&call("len", vec![Type::ndarray_shaped(Dtype::Float64, vec![7, 2])])).unwrap(),
            Type::int_lit(7)
        );
        assert!(len(&call("len", vec![Type::int()])).is_err());
    }

    #[test]
    fn float_and_int_convert_literals() {
        assert_eq!(
            float(&call("float", vec![Type::int_lit(3)])).unwrap(),
            Type::float_lit(3.0)
        );
        assert_eq!(
            float(&call("float", vec![Type::string_lit("1.5")])).unwrap(),
            Type::float_lit(1.5)
        );
        assert_eq!(
            float(&call("float", vec![Type::string()])).unwrap(),
            Type::float()
        );
        assert_eq!(
            int(&call("int", vec![Type::float_lit(-1.9)])).unwrap(),
            Type::int_lit(-1)
        );
        assert_eq!(
            int(&call("int", vec![Type::bool_lit(true)])).unwrap(),
            Type::int_lit(1)
        );
        assert!(int(&call("int", vec![Type::None])).is_err());
    }

    #[test]
    fn range_is_an_int_list() {
        assert_eq!(
            range(&call("range", vec![Type::int_lit(10)])).unwrap(),
            Type::list_of(Type::int())
        );
        assert_eq!(
            range(&call("range", vec![Type::int(), Type::int(), Type::int()])).unwrap(),
            Type::list_of(Type::int())
        );
        assert!(range(&call("range", vec![])).is_err());
        assert!(range(&call("range", vec![Type::float()])).is_err());
        assert!(range(&call("range", vec![Type::int(); 4])).is_err());
    }
}
