//! Type representation for the inference lattice.
//!
//! A [`Type`] describes what the checker knows about a value: at minimum its
//! structural family (number, string, sequence, tensor, callable, instance),
//! and where the source made it possible, refinements on top of that
//! (a literal value for numbers and strings, per-position element types for
//! sequences, dtype and shape for tensors). `Unknown` sits at the top of the
//! lattice and absorbs everything it meets.

use std::fmt;

use serde::{Deserialize, Serialize};

// ==================== Scalar kinds ====================

/// Numeric family, ordered by width: `Bool < Int < Float`.
///
/// The derived `Ord` follows declaration order, which is exactly the
/// widening order used by [`join`](super::join) and
/// [`accepts`](super::accepts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NumKind {
    Bool,
    Int,
    Float,
}

impl fmt::Display for NumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumKind::Bool => write!(f, "bool"),
            NumKind::Int => write!(f, "int"),
            NumKind::Float => write!(f, "float"),
        }
    }
}

/// A known literal value attached to a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ConstValue {
    /// Numeric kind this literal belongs to.
    pub fn kind(&self) -> NumKind {
        match self {
            ConstValue::Bool(_) => NumKind::Bool,
            ConstValue::Int(_) => NumKind::Int,
            ConstValue::Float(_) => NumKind::Float,
        }
    }

    /// The literal as an `f64`, with `bool` mapping to 0.0 or 1.0.
    pub fn as_f64(&self) -> f64 {
        match self {
            ConstValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ConstValue::Int(i) => *i as f64,
            ConstValue::Float(x) => *x,
        }
    }

    /// The literal as an `i64`, if it is integral (`bool` counts as 0 or 1).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConstValue::Bool(b) => Some(i64::from(*b)),
            ConstValue::Int(i) => Some(*i),
            ConstValue::Float(_) => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(true) => write!(f, "True"),
            ConstValue::Bool(false) => write!(f, "False"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Float(x) => write!(f, "{x:?}"),
        }
    }
}

// ==================== Sequence shape ====================

/// Which concrete sequence family a `Seq` type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeqKind {
    List,
    Tuple,
}

impl fmt::Display for SeqKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqKind::List => write!(f, "list"),
            SeqKind::Tuple => write!(f, "tuple"),
        }
    }
}

/// Element information for a sequence type.
///
/// `Fixed` keeps one type per position and therefore a known length, which
/// is what literal displays and destructuring need. `Uniform` keeps a single
/// element type and forgets the length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeqElems {
    Fixed(Vec<Type>),
    Uniform(Box<Type>),
}

// ==================== Tensors ====================

/// Tensor backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TensorKind {
    Ndarray,
    Torch,
}

impl TensorKind {
    /// Default floating dtype for this family, used when a type rule has to
    /// promote an integral tensor (true division, for instance).
    pub fn default_float(&self) -> Dtype {
        match self {
            TensorKind::Ndarray => Dtype::Float64,
            TensorKind::Torch => Dtype::Float32,
        }
    }
}

impl fmt::Display for TensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorKind::Ndarray => write!(f, "ndarray"),
            TensorKind::Torch => write!(f, "torch.Tensor"),
        }
    }
}

/// Element dtype of a tensor, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dtype {
    Bool,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
}

impl Dtype {
    pub fn is_float(&self) -> bool {
        matches!(self, Dtype::Float16 | Dtype::Float32 | Dtype::Float64)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Dtype::Bool | Dtype::Int32 | Dtype::Int64)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Bool => write!(f, "bool"),
            Dtype::Int32 => write!(f, "int32"),
            Dtype::Int64 => write!(f, "int64"),
            Dtype::Float16 => write!(f, "float16"),
            Dtype::Float32 => write!(f, "float32"),
            Dtype::Float64 => write!(f, "float64"),
        }
    }
}

// ==================== The lattice ====================

/// A point in the inference lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// `bool`, `int` or `float`, optionally refined with a literal value.
    Num {
        kind: NumKind,
        value: Option<ConstValue>,
    },
    /// `str`, optionally refined with a literal value.
    Str { value: Option<String> },
    /// A list or tuple with fixed or uniform element information.
    Seq { kind: SeqKind, elems: SeqElems },
    /// An n-dimensional array. `dtype` and `shape` are independent
    /// refinements and either may be missing.
    Tensor {
        kind: TensorKind,
        dtype: Option<Dtype>,
        shape: Option<Vec<usize>>,
    },
    /// A callable with positional parameter types and a result type.
    Arrow { params: Vec<Type>, ret: Box<Type> },
    /// An instance of a user-declared model class.
    Instance { class: String },
    /// Python's `None`.
    None,
    /// Top of the lattice: nothing is known.
    Unknown,
}

impl Type {
    // ---- constructors ----

    pub fn int() -> Type {
        Type::Num {
            kind: NumKind::Int,
            value: None,
        }
    }

    pub fn int_lit(value: i64) -> Type {
        Type::Num {
            kind: NumKind::Int,
            value: Some(ConstValue::Int(value)),
        }
    }

    pub fn float() -> Type {
        Type::Num {
            kind: NumKind::Float,
            value: None,
        }
    }

    pub fn float_lit(value: f64) -> Type {
        Type::Num {
            kind: NumKind::Float,
            value: Some(ConstValue::Float(value)),
        }
    }

    pub fn boolean() -> Type {
        Type::Num {
            kind: NumKind::Bool,
            value: None,
        }
    }

    pub fn bool_lit(value: bool) -> Type {
        Type::Num {
            kind: NumKind::Bool,
            value: Some(ConstValue::Bool(value)),
        }
    }

    pub fn num(kind: NumKind) -> Type {
        Type::Num { kind, value: None }
    }

    pub fn string() -> Type {
        Type::Str { value: None }
    }

    pub fn string_lit(value: impl Into<String>) -> Type {
        Type::Str {
            value: Some(value.into()),
        }
    }

    /// A list with a uniform element type and unknown length.
    pub fn list_of(elem: Type) -> Type {
        Type::Seq {
            kind: SeqKind::List,
            elems: SeqElems::Uniform(Box::new(elem)),
        }
    }

    /// A list literal with one type per position.
    pub fn fixed_list(elems: Vec<Type>) -> Type {
        Type::Seq {
            kind: SeqKind::List,
            elems: SeqElems::Fixed(elems),
        }
    }

    /// A tuple literal with one type per position.
    pub fn tuple_of(elems: Vec<Type>) -> Type {
        Type::Seq {
            kind: SeqKind::Tuple,
            elems: SeqElems::Fixed(elems),
        }
    }

    /// A tuple with a uniform element type and unknown length.
    pub fn uniform_tuple(elem: Type) -> Type {
        Type::Seq {
            kind: SeqKind::Tuple,
            elems: SeqElems::Uniform(Box::new(elem)),
        }
    }

    pub fn tensor(kind: TensorKind, dtype: Option<Dtype>, shape: Option<Vec<usize>>) -> Type {
        Type::Tensor { kind, dtype, shape }
    }

    pub fn ndarray(dtype: Dtype) -> Type {
        Type::Tensor {
            kind: TensorKind::Ndarray,
            dtype: Some(dtype),
            shape: None,
        }
    }

    pub fn ndarray_shaped(dtype: Dtype, shape: Vec<usize>) -> Type {
        Type::Tensor {
            kind: TensorKind::Ndarray,
            dtype: Some(dtype),
            shape: Some(shape),
        }
    }

    pub fn torch_tensor(dtype: Dtype, shape: Vec<usize>) -> Type {
        Type::Tensor {
            kind: TensorKind::Torch,
            dtype: Some(dtype),
            shape: Some(shape),
        }
    }

    pub fn arrow(params: Vec<Type>, ret: Type) -> Type {
        Type::Arrow {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn instance(class: impl Into<String>) -> Type {
        Type::Instance {
            class: class.into(),
        }
    }

    // ---- predicates ----

    pub fn is_num(&self) -> bool {
        matches!(self, Type::Num { .. })
    }

    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Type::Num {
                kind: NumKind::Int,
                ..
            }
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            Type::Num {
                kind: NumKind::Float,
                ..
            }
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(
            self,
            Type::Num {
                kind: NumKind::Bool,
                ..
            }
        )
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Type::Str { .. })
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Type::Seq { .. })
    }

    pub fn is_tuple(&self) -> bool {
        matches!(
            self,
            Type::Seq {
                kind: SeqKind::Tuple,
                ..
            }
        )
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Type::Tensor { .. })
    }

    pub fn is_arrow(&self) -> bool {
        matches!(self, Type::Arrow { .. })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Type::None)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    // ---- accessors ----

    /// The numeric literal carried by this type, if any.
    pub fn num_value(&self) -> Option<ConstValue> {
        match self {
            Type::Num { value, .. } => *value,
            _ => None,
        }
    }

    /// The numeric kind, if this is a number.
    pub fn num_kind(&self) -> Option<NumKind> {
        match self {
            Type::Num { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Per-position element types, if this is a fixed-length sequence.
    pub fn fixed_elems(&self) -> Option<&[Type]> {
        match self {
            Type::Seq {
                elems: SeqElems::Fixed(elems),
                ..
            } => Some(elems),
            _ => None,
        }
    }

    /// The same type with any literal refinement removed. Structural
    /// refinements (sequence elements, tensor dtype and shape) are kept.
    pub fn without_value(&self) -> Type {
        match self {
            Type::Num { kind, .. } => Type::Num {
                kind: *kind,
                value: None,
            },
            Type::Str { .. } => Type::Str { value: None },
            other => other.clone(),
        }
    }
}

fn fmt_shape(f: &mut fmt::Formatter<'_>, shape: &[usize]) -> fmt::Result {
    write!(f, "(")?;
    for (i, dim) in shape.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{dim}")?;
    }
    if shape.len() == 1 {
        write!(f, ",")?;
    }
    write!(f, ")")
}

impl fmt::Display for Type {
    /// Renders the type the way diagnostics and test assertions expect it.
    ///
    /// ```text
    /// int            float          bool           string
    /// [int, float]   (int, string)  (float,)       int list
    /// ndarray(float32)              torch.Tensor(float32, (1, 256, 6, 6))
    /// int -> int -> float           class MLP      NoneType       Any
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Num { kind, .. } => write!(f, "{kind}"),
            Type::Str { .. } => write!(f, "string"),
            Type::Seq { kind, elems } => match elems {
                SeqElems::Fixed(elems) => match kind {
                    SeqKind::List => {
                        write!(f, "[")?;
                        for (i, t) in elems.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{t}")?;
                        }
                        write!(f, "]")
                    }
                    SeqKind::Tuple => {
                        write!(f, "(")?;
                        for (i, t) in elems.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{t}")?;
                        }
                        if elems.len() == 1 {
                            write!(f, ",")?;
                        }
                        write!(f, ")")
                    }
                },
                SeqElems::Uniform(elem) => write!(f, "{elem} {kind}"),
            },
            Type::Tensor { kind, dtype, shape } => match (dtype, shape) {
                (Some(dtype), Some(shape)) => {
                    write!(f, "{kind}({dtype}, ")?;
                    fmt_shape(f, shape)?;
                    write!(f, ")")
                }
                (Some(dtype), None) => write!(f, "{kind}({dtype})"),
                // A shape with no dtype is not worth rendering refined.
                (None, _) => write!(f, "{kind}"),
            },
            Type::Arrow { params, ret } => {
                if params.is_empty() {
                    write!(f, "() -> {ret}")
                } else {
                    for p in params {
                        write!(f, "{p} -> ")?;
                    }
                    write!(f, "{ret}")
                }
            }
            Type::Instance { class } => write!(f, "class {class}"),
            Type::None => write!(f, "NoneType"),
            Type::Unknown => write!(f, "Any"),
        }
    }
}

// ==================== Tests ====================
