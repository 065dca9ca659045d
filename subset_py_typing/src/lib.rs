//! Static type inference for the Python subset that neural-network model
//! code is written in.
//!
//! One run takes a parsed function definition plus positional argument
//! types, walks the body once (twice through loop bodies), and produces a
//! table mapping every statement and expression node to an inferred
//! [`Type`]. Types track literals, per-position sequence elements and
//! tensor dtype/shape where the source makes them knowable, and degrade to
//! `Any` where it does not. Framework calls (`F.relu`, `torch.flatten`,
//! `np.zeros`, ...) resolve through a registry of type rules instead of
//! any inspection of live objects.

// Trace and diagnostic output travels in the run result, never straight
// to the console.
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

// Lattice and operator semantics
pub mod binop;
pub mod lattice;
pub mod value;

// Inference engine
pub mod checker;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod table;

// Extension points: operator registry, model attributes, tensor arithmetic
pub mod ext;

// Inline-fixture helpers and assertion-table generation
pub mod testtools;

pub use checker::{InferOptions, Inference, TypeChecker};
pub use error::{CheckResult, TypeCheckError};
pub use ext::{CallTypes, ModelInfo, OpRegistry, TypeRule, DEFAULT_REGISTRY};
pub use lattice::{
    accepts, join, join_all, ConstValue, Dtype, NumKind, SeqElems, SeqKind, TensorKind, Type,
};
pub use table::{NodeTable, TypeTable};

// Parser surface callers need alongside the engine
pub use subset_py_typing_parser::{ast, parse_module};

/// Parses `source` and infers its first top-level function definition with
/// the default operator registry.
///
/// When `model` is given, an `Instance` of its class is prepended to the
/// argument types for `self`, and `self.<attr>` resolves through its
/// attribute table.
///
/// ```
/// use subset_py_typing::{infer_source, InferOptions, Type};
///
/// let source = "def f(x):\n    y = abs(x)\n    x = x + 1.3\n    return x\n";
/// let (_module, inference) =
///     infer_source(source, &[Type::int()], None, InferOptions::default())?;
/// assert_eq!(inference.return_type, Type::float());
/// assert_eq!(inference.table.rendered(10), Some("float".to_string()));
/// # Ok::<(), subset_py_typing::TypeCheckError>(())
/// ```
pub fn infer_source(
    source: &str,
    args: &[Type],
    model: Option<&ModelInfo>,
    options: InferOptions,
) -> CheckResult<(ast::Module, Inference)> {
    let mut module = parse_module(source)?;
    let mut full_args = Vec::with_capacity(args.len() + 1);
    if let Some(model) = model {
        full_args.push(Type::instance(model.class()));
    }
    full_args.extend(args.iter().cloned());
    let inference =
        TypeChecker::new(&DEFAULT_REGISTRY, model, options).check_module(&mut module, &full_args)?;
    Ok((module, inference))
}
