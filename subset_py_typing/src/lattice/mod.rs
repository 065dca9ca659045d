//! The type lattice: the set of inferable types with `Unknown` as top,
//! plus the join/acceptance operators over them.

pub mod ops;
pub mod types;

pub use ops::{accepts, join, join_all};
pub use types::{ConstValue, Dtype, NumKind, SeqElems, SeqKind, TensorKind, Type};
