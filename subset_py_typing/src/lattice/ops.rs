//! Lattice operators: `join` merges what two control paths know about a
//! value, `accepts` decides whether an argument fits a parameter slot.

use crate::error::{CheckResult, TypeCheckError};
use crate::lattice::types::{SeqElems, Type};

// ==================== Join ====================

/// Least upper bound of two types.
///
/// `Unknown` absorbs everything. Types from different structural families
/// join to `Unknown` rather than erroring, with one exception: a list can
/// never be reconciled with a tuple, so mismatched sequence kinds are an
/// [`TypeCheckError::Incompatible`].
///
/// ```text
/// join(int 3, int 3)        = int 3
/// join(int 3, int 4)        = int
/// join(int, float)          = float
/// join((int, str), [int])   = error
/// join([int, int], [int])   = int list
/// join(int, string)         = Any
/// ```
pub fn join(a: &Type, b: &Type) -> CheckResult<Type> {
    match (a, b) {
        (Type::Unknown, _) | (_, Type::Unknown) => Ok(Type::Unknown),

        (Type::None, Type::None) => Ok(Type::None),

        (
            Type::Num {
                kind: ka,
                value: va,
            },
            Type::Num {
                kind: kb,
                value: vb,
            },
        ) => {
            let kind = (*ka).max(*kb);
            let value = match (va, vb) {
                (Some(x), Some(y)) if ka == kb && x == y => Some(*x),
                _ => None,
            };
            Ok(Type::Num { kind, value })
        }

        (Type::Str { value: va }, Type::Str { value: vb }) => {
            let value = match (va, vb) {
                (Some(x), Some(y)) if x == y => Some(x.clone()),
                _ => None,
            };
            Ok(Type::Str { value })
        }

        (
            Type::Seq {
                kind: ka,
                elems: ea,
            },
            Type::Seq {
                kind: kb,
                elems: eb,
            },
        ) => {
            if ka != kb {
                return Err(TypeCheckError::incompatible(a.to_string(), b.to_string()));
            }
            let elems = match (ea, eb) {
                (SeqElems::Fixed(xs), SeqElems::Fixed(ys)) if xs.len() == ys.len() => {
                    let joined = xs
                        .iter()
                        .zip(ys.iter())
                        .map(|(x, y)| join(x, y))
                        .collect::<CheckResult<Vec<_>>>()?;
                    SeqElems::Fixed(joined)
                }
                _ => {
                    let lhs = elem_summary(ea)?;
                    let rhs = elem_summary(eb)?;
                    SeqElems::Uniform(Box::new(join(&lhs, &rhs)?))
                }
            };
            Ok(Type::Seq { kind: *ka, elems })
        }

        (
            Type::Tensor {
                kind: ka,
                dtype: da,
                shape: sa,
            },
            Type::Tensor {
                kind: kb,
                dtype: db,
                shape: sb,
            },
        ) => {
            if ka != kb {
                return Ok(Type::Unknown);
            }
            Ok(Type::Tensor {
                kind: *ka,
                dtype: if da == db { *da } else { None },
                shape: if sa == sb { sa.clone() } else { None },
            })
        }

        (
            Type::Arrow {
                params: pa,
                ret: ra,
            },
            Type::Arrow {
                params: pb,
                ret: rb,
            },
        ) => {
            if pa.len() != pb.len() {
                return Ok(Type::Unknown);
            }
            let params = pa
                .iter()
                .zip(pb.iter())
                .map(|(x, y)| join(x, y))
                .collect::<CheckResult<Vec<_>>>()?;
            Ok(Type::arrow(params, join(ra, rb)?))
        }

        (Type::Instance { class: ca }, Type::Instance { class: cb }) => {
            if ca == cb {
                Ok(a.clone())
            } else {
                Ok(Type::Unknown)
            }
        }

        _ => Ok(Type::Unknown),
    }
}

/// Joins every type produced by `iter`. An empty iterator yields `Unknown`.
pub fn join_all<'a, I>(iter: I) -> CheckResult<Type>
where
    I: IntoIterator<Item = &'a Type>,
{
    let mut iter = iter.into_iter();
    let first = match iter.next() {
        Some(t) => t.clone(),
        Option::None => return Ok(Type::Unknown),
    };
    iter.try_fold(first, |acc, t| join(&acc, t))
}

/// Single element type summarizing `elems`, for collapsing a fixed sequence
/// into a uniform one. An empty fixed sequence summarizes to `Unknown`.
pub(crate) fn elem_summary(elems: &SeqElems) -> CheckResult<Type> {
    match elems {
        SeqElems::Fixed(types) => join_all(types),
        SeqElems::Uniform(elem) => Ok((**elem).clone()),
    }
}

// ==================== Acceptance ====================

/// Whether `arg` fits a parameter slot declared as `param`.
///
/// This is looser than equality: `Unknown` on either side matches anything,
/// and numbers widen (`bool` fits an `int` slot, `int` fits a `float` slot).
/// Literal refinements never matter here.
pub fn accepts(param: &Type, arg: &Type) -> bool {
    match (param, arg) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,

        (Type::Num { kind: kp, .. }, Type::Num { kind: ka, .. }) => ka <= kp,

        (Type::Str { .. }, Type::Str { .. }) => true,

        (
            Type::Seq {
                kind: kp,
                elems: ep,
            },
            Type::Seq {
                kind: ka,
                elems: ea,
            },
        ) => {
            if kp != ka {
                return false;
            }
            match (ep, ea) {
                (SeqElems::Fixed(ps), SeqElems::Fixed(xs)) => {
                    ps.len() == xs.len() && ps.iter().zip(xs.iter()).all(|(p, x)| accepts(p, x))
                }
                (SeqElems::Uniform(p), SeqElems::Fixed(xs)) => xs.iter().all(|x| accepts(p, x)),
                (SeqElems::Uniform(p), SeqElems::Uniform(x)) => accepts(p, x),
                // A fixed-arity slot cannot be satisfied by a sequence of
                // unknown length.
                (SeqElems::Fixed(_), SeqElems::Uniform(_)) => false,
            }
        }

        (
            Type::Tensor {
                kind: kp,
                dtype: dp,
                shape: sp,
            },
            Type::Tensor {
                kind: ka,
                dtype: da,
                shape: sa,
            },
        ) => {
            kp == ka
                && (dp.is_none() || da.is_none() || dp == da)
                && (sp.is_none() || sa.is_none() || sp == sa)
        }

        (
            Type::Arrow {
                params: pp,
                ret: rp,
            },
            Type::Arrow {
                params: pa,
                ret: ra,
            },
        ) => {
            pp.len() == pa.len()
                && pp.iter().zip(pa.iter()).all(|(p, a)| accepts(p, a))
                && accepts(rp, ra)
        }

        (Type::Instance { class: cp }, Type::Instance { class: ca }) => cp == ca,

        (Type::None, Type::None) => true,

        _ => false,
    }
}

// ==================== Tests ====================
