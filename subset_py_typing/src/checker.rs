//! The inference engine: walks one function definition and records a type
//! for every statement and expression node.
//!
//! A checker value is built per run, consumed by [`TypeChecker::check_module`],
//! and never reused. All state (environment, tables, diagnostics, trace)
//! lives in the run; the only shared collaborator is the read-only operator
//! registry handed in by the caller.

use subset_py_typing_parser::ast::{
    CmpOpKind, Expr, ExprKind, Keyword, Literal, Module, Stmt, StmtKind, UnaryOpKind,
};

use crate::binop::binop_type;
use crate::diagnostics::{Diagnostic, Reporter};
use crate::env::{merge_branches, TypeEnv};
use crate::error::{CheckResult, TypeCheckError};
use crate::ext::{arith, CallTypes, ModelInfo, OpRegistry};
use crate::lattice::{accepts, join, join_all, ConstValue, NumKind, SeqElems, Type};
use crate::table::{NodeTable, TypeTable};

// ==================== Run configuration and output ====================

/// Per-run options threaded into the entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferOptions {
    /// Collect a step-by-step trace of the walk in the run output.
    pub trace: bool,
}

/// Everything one successful run produces.
#[derive(Debug)]
pub struct Inference {
    /// Node id to inferred type.
    pub table: TypeTable,
    /// Node numbering companion data (linenos, coverage).
    pub nodes: NodeTable,
    /// The function's inferred return type.
    pub return_type: Type,
    /// Non-fatal findings (precision given up, approximations taken).
    pub diagnostics: Vec<Diagnostic>,
    /// Trace lines, empty unless requested via [`InferOptions`].
    pub trace: Vec<String>,
}

// ==================== The checker ====================

/// One inference run over one function definition.
pub struct TypeChecker<'a> {
    registry: &'a OpRegistry,
    model: Option<&'a ModelInfo>,
    env: TypeEnv,
    table: TypeTable,
    returns: Option<Type>,
    reporter: Reporter,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        registry: &'a OpRegistry,
        model: Option<&'a ModelInfo>,
        options: InferOptions,
    ) -> TypeChecker<'a> {
        TypeChecker {
            registry,
            model,
            env: TypeEnv::new(),
            table: TypeTable::new(),
            returns: None,
            reporter: Reporter::new(options.trace),
        }
    }

    /// Numbers the module's nodes, then infers its first top-level function
    /// definition against the given positional argument types.
    ///
    /// Any failure aborts the run; there is no partial type table.
    pub fn check_module(mut self, module: &mut Module, args: &[Type]) -> CheckResult<Inference> {
        let nodes = NodeTable::build(module);
        let entry = module
            .body
            .iter()
            .find(|stmt| matches!(stmt.kind, StmtKind::FunctionDef { .. }))
            .ok_or_else(|| {
                TypeCheckError::unsupported("module without a function definition")
            })?;
        let return_type = self.check_function(entry, args)?;
        let (diagnostics, trace) = self.reporter.into_parts();
        Ok(Inference {
            table: self.table,
            nodes,
            return_type,
            diagnostics,
            trace,
        })
    }

    fn check_function(&mut self, stmt: &Stmt, args: &[Type]) -> CheckResult<Type> {
        let StmtKind::FunctionDef { name, params, body } = &stmt.kind else {
            return Err(TypeCheckError::unsupported(
                "inference entry must be a function definition",
            ));
        };
        if params.len() != args.len() {
            return Err(
                TypeCheckError::arity(name.clone(), params.len(), args.len())
                    .at_line(stmt.line),
            );
        }
        for (param, ty) in params.iter().zip(args) {
            if self.reporter.is_tracing() {
                self.reporter.trace(format!("param {}: {ty}", param.name));
            }
            self.env.bind(param.name.clone(), ty.clone());
        }
        self.check_suite(body)?;
        let return_type = self.returns.take().unwrap_or(Type::None);
        self.table
            .record(stmt.id, Type::arrow(args.to_vec(), return_type.clone()));
        Ok(return_type)
    }

    fn check_suite(&mut self, body: &[Stmt]) -> CheckResult<()> {
        for stmt in body {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    // ==================== Statements ====================

    fn check_stmt(&mut self, stmt: &Stmt) -> CheckResult<()> {
        self.stmt_rule(stmt).map_err(|e| e.at_line(stmt.line))
    }

    fn stmt_rule(&mut self, stmt: &Stmt) -> CheckResult<()> {
        if self.reporter.is_tracing() {
            self.reporter
                .trace(format!("stmt {} (line {})", stmt.id, stmt.line));
        }
        match &stmt.kind {
            StmtKind::FunctionDef { .. } => {
                Err(TypeCheckError::unsupported("nested function definition"))
            }

            StmtKind::Assign { target, value } => {
                let value_ty = self.check_expr(value)?;
                self.bind_target(target, &value_ty)?;
                self.table.record(stmt.id, Type::None);
                Ok(())
            }

            StmtKind::AugAssign { target, op, value } => {
                let ExprKind::Name(name) = &target.kind else {
                    return Err(TypeCheckError::unsupported("augmented assignment target"));
                };
                let current = self
                    .env
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| TypeCheckError::unbound(name.clone()))?;
                let value_ty = self.check_expr(value)?;
                let result = binop_type(*op, &current, &value_ty)?;
                self.table.record(target.id, result.clone());
                self.env.bind(name.clone(), result);
                self.table.record(stmt.id, Type::None);
                Ok(())
            }

            StmtKind::Return { value } => {
                let ty = match value {
                    Some(expr) => self.check_expr(expr)?,
                    None => Type::None,
                };
                self.table.record(stmt.id, ty.clone());
                self.returns = Some(match self.returns.take() {
                    Some(prev) => join(&prev, &ty)?,
                    None => ty,
                });
                Ok(())
            }

            StmtKind::If { test, body, orelse } => {
                self.check_expr(test)?;
                let pre = self.env.clone();
                self.check_suite(body)?;
                let then_env = std::mem::replace(&mut self.env, pre.clone());
                self.check_suite(orelse)?;
                let else_env = std::mem::take(&mut self.env);
                let (merged, notes) = merge_branches(&pre, &then_env, &else_env);
                for note in notes {
                    self.reporter.warn(Some(stmt.line), note);
                }
                self.env = merged;
                self.table.record(stmt.id, Type::None);
                Ok(())
            }

            StmtKind::For { target, iter, body } => {
                let iter_ty = self.check_expr(iter)?;
                let elem = element_type(&iter_ty)?;
                // Two passes: the second re-infers the body under the
                // post-first-pass environment and overwrites table entries,
                // so loop-carried variables see feedback from the body.
                for _ in 0..2 {
                    self.bind_target(target, &elem)?;
                    self.check_suite(body)?;
                }
                self.table.record(stmt.id, Type::None);
                Ok(())
            }

            StmtKind::While { test, body } => {
                self.check_expr(test)?;
                for _ in 0..2 {
                    self.check_suite(body)?;
                }
                self.table.record(stmt.id, Type::None);
                Ok(())
            }

            StmtKind::Expr { value } => {
                let ty = self.check_expr(value)?;
                self.table.record(stmt.id, ty);
                Ok(())
            }

            StmtKind::Pass => {
                self.table.record(stmt.id, Type::None);
                Ok(())
            }
        }
    }

    /// Binds an assignment (or `for`) target to `value_ty`, recording types
    /// on the target nodes. Destructuring needs a fixed sequence of
    /// matching arity and recurses per position.
    fn bind_target(&mut self, target: &Expr, value_ty: &Type) -> CheckResult<()> {
        match &target.kind {
            ExprKind::Name(name) => {
                self.table.record(target.id, value_ty.clone());
                self.env.bind(name.clone(), value_ty.clone());
                Ok(())
            }
            ExprKind::Tuple { elems } | ExprKind::List { elems } => {
                let positions = match value_ty.fixed_elems() {
                    Some(positions) if positions.len() == elems.len() => positions.to_vec(),
                    _ => {
                        return Err(TypeCheckError::invalid(format!(
                            "cannot unpack {value_ty} into {} targets",
                            elems.len()
                        ))
                        .at_line(target.line))
                    }
                };
                self.table.record(target.id, value_ty.clone());
                for (elem, ty) in elems.iter().zip(&positions) {
                    self.bind_target(elem, ty)?;
                }
                Ok(())
            }
            _ => Err(TypeCheckError::unsupported("assignment target").at_line(target.line)),
        }
    }

    // ==================== Expressions ====================

    fn check_expr(&mut self, expr: &Expr) -> CheckResult<Type> {
        let ty = self
            .expr_rule(expr)
            .map_err(|e| e.at_line(expr.line))?;
        if self.reporter.is_tracing() {
            self.reporter.trace(format!("expr {}: {ty}", expr.id));
        }
        self.table.record(expr.id, ty.clone());
        Ok(ty)
    }

    fn expr_rule(&mut self, expr: &Expr) -> CheckResult<Type> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_type(lit)),

            ExprKind::Name(name) => self
                .env
                .lookup(name)
                .cloned()
                .ok_or_else(|| TypeCheckError::unbound(name.clone())),

            ExprKind::Tuple { elems } => {
                let types = self.check_exprs(elems)?;
                Ok(Type::tuple_of(types))
            }

            ExprKind::List { elems } => {
                let types = self.check_exprs(elems)?;
                Ok(Type::fixed_list(types))
            }

            ExprKind::BinOp { op, left, right } => {
                let lt = self.check_expr(left)?;
                let rt = self.check_expr(right)?;
                binop_type(*op, &lt, &rt)
            }

            ExprKind::UnaryOp { op, operand } => {
                let ty = self.check_expr(operand)?;
                unary_type(*op, &ty)
            }

            ExprKind::Compare { op, left, right } => {
                let lt = self.check_expr(left)?;
                let rt = self.check_expr(right)?;
                compare_type(*op, &lt, &rt)
            }

            ExprKind::Attribute { value, attr } => {
                // A dotted path rooted at an unbound name is an external
                // namespace; plain loads from it have no registered type.
                if let Some(path) = self.qualified_path(expr) {
                    return Err(TypeCheckError::not_implemented(path));
                }
                let value_ty = self.check_expr(value)?;
                self.attribute_type(&value_ty, attr)
            }

            ExprKind::Subscript { value, index } => {
                let value_ty = self.check_expr(value)?;
                let index_ty = self.check_expr(index)?;
                subscript_type(&value_ty, &index_ty)
            }

            ExprKind::Call {
                func,
                args,
                keywords,
            } => self.check_call(func, args, keywords),
        }
    }

    fn check_exprs(&mut self, exprs: &[Expr]) -> CheckResult<Vec<Type>> {
        exprs.iter().map(|e| self.check_expr(e)).collect()
    }

    /// Attribute access on an already-typed value.
    fn attribute_type(&mut self, value_ty: &Type, attr: &str) -> CheckResult<Type> {
        match value_ty {
            Type::Instance { class } => {
                let found = self
                    .model
                    .filter(|m| m.class() == class)
                    .and_then(|m| m.attr(attr));
                match found {
                    Some(ty) => Ok(ty.clone()),
                    None => Err(TypeCheckError::missing_attribute(class.clone(), attr)),
                }
            }
            Type::Tensor { kind, shape, .. } => match attr {
                "shape" => Ok(match shape {
                    Some(dims) => Type::tuple_of(
                        dims.iter().map(|d| Type::int_lit(*d as i64)).collect(),
                    ),
                    None => Type::uniform_tuple(Type::int()),
                }),
                "ndim" => Ok(match shape {
                    Some(dims) => Type::int_lit(dims.len() as i64),
                    None => Type::int(),
                }),
                _ => Err(TypeCheckError::missing_attribute(kind.to_string(), attr)),
            },
            Type::Unknown => Ok(Type::Unknown),
            other => Err(TypeCheckError::missing_attribute(other.to_string(), attr)),
        }
    }

    // ==================== Calls ====================

    fn check_call(
        &mut self,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
    ) -> CheckResult<Type> {
        let arg_types = self.check_exprs(args)?;
        let mut kw_types = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            kw_types.push((keyword.name.clone(), self.check_expr(&keyword.value)?));
        }

        if let Some(path) = self.qualified_path(func) {
            return self.apply_rule(path, func, arg_types, kw_types);
        }

        let callee_ty = self.check_expr(func)?;
        match callee_ty {
            Type::Arrow { params, ret } => {
                let label = callee_label(func);
                if let Some((name, _)) = kw_types.first() {
                    return Err(TypeCheckError::invalid(format!(
                        "{label}() got an unexpected keyword argument '{name}'"
                    )));
                }
                if params.len() != arg_types.len() {
                    return Err(TypeCheckError::arity(
                        label,
                        params.len(),
                        arg_types.len(),
                    ));
                }
                for (i, (param, arg)) in params.iter().zip(&arg_types).enumerate() {
                    if !accepts(param, arg) {
                        return Err(TypeCheckError::invalid(format!(
                            "{label}() argument {} expects {param}, got {arg}",
                            i + 1
                        )));
                    }
                }
                Ok(*ret)
            }
            Type::Unknown => Ok(Type::Unknown),
            other => Err(TypeCheckError::invalid(format!(
                "{other} object is not callable"
            ))),
        }
    }

    /// Dispatches a qualified external call through the registry and
    /// records the callee path nodes: the callee itself gets a synthesized
    /// arrow, interior path nodes read as `Unknown`.
    fn apply_rule(
        &mut self,
        path: String,
        func: &Expr,
        arg_types: Vec<Type>,
        kw_types: Vec<(String, Type)>,
    ) -> CheckResult<Type> {
        let Some(rule) = self.registry.lookup(&path) else {
            return Err(TypeCheckError::not_implemented(path));
        };
        let call = CallTypes::new(path, arg_types.clone()).with_kwargs(kw_types);
        let result = rule(&call).map_err(|e| e.at_line(func.line))?;
        self.table
            .record(func.id, Type::arrow(arg_types, result.clone()));
        if let ExprKind::Attribute { value, .. } = &func.kind {
            self.record_namespace_path(value);
        }
        Ok(result)
    }

    fn record_namespace_path(&mut self, expr: &Expr) {
        self.table.record(expr.id, Type::Unknown);
        if let ExprKind::Attribute { value, .. } = &expr.kind {
            self.record_namespace_path(value);
        }
    }

    /// The dotted path of `expr` when it is a bare name or attribute chain
    /// rooted at a name with no local binding, i.e. an external namespace.
    fn qualified_path(&self, expr: &Expr) -> Option<String> {
        fn collect<'e>(
            checker: &TypeChecker<'_>,
            expr: &'e Expr,
            parts: &mut Vec<&'e str>,
        ) -> bool {
            match &expr.kind {
                ExprKind::Name(name) if !checker.env.contains(name) => {
                    parts.push(name);
                    true
                }
                ExprKind::Attribute { value, attr } => {
                    if collect(checker, value, parts) {
                        parts.push(attr);
                        true
                    } else {
                        false
                    }
                }
                _ => false,
            }
        }
        let mut parts = Vec::new();
        if collect(self, expr, &mut parts) {
            Some(parts.join("."))
        } else {
            None
        }
    }
}

// ==================== Pure helper rules ====================

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(i) => Type::int_lit(*i),
        Literal::Float(x) => Type::float_lit(*x),
        Literal::Str(s) => Type::string_lit(s.clone()),
        Literal::Bool(b) => Type::bool_lit(*b),
        Literal::None => Type::None,
    }
}

/// Unary operator result. Sign operators promote bools to ints the way
/// Python does (`-True == -1`); `not` always yields a bool, folding known
/// operands by truthiness.
fn unary_type(op: UnaryOpKind, ty: &Type) -> CheckResult<Type> {
    match op {
        UnaryOpKind::Not => {
            let value = match ty {
                Type::Num { value: Some(v), .. } => Some(v.as_f64() == 0.0),
                Type::Str { value: Some(s) } => Some(s.is_empty()),
                Type::None => Some(true),
                _ => None,
            };
            Ok(Type::Num {
                kind: NumKind::Bool,
                value: value.map(ConstValue::Bool),
            })
        }
        UnaryOpKind::Minus | UnaryOpKind::Plus => match ty {
            Type::Num { kind, value } => {
                let negate = op == UnaryOpKind::Minus;
                let value = value.map(|v| {
                    let v = match v {
                        ConstValue::Bool(b) => ConstValue::Int(i64::from(b)),
                        other => other,
                    };
                    match (negate, v) {
                        (true, ConstValue::Int(i)) => ConstValue::Int(i.wrapping_neg()),
                        (true, ConstValue::Float(x)) => ConstValue::Float(-x),
                        (_, v) => v,
                    }
                });
                Ok(Type::Num {
                    kind: (*kind).max(NumKind::Int),
                    value,
                })
            }
            Type::Tensor { .. } | Type::Unknown => Ok(ty.clone()),
            other => Err(TypeCheckError::invalid(format!(
                "bad operand type for unary {op}: {other}"
            ))),
        },
    }
}

/// Comparison result: always a bool, folding known numeric and string
/// operands; tensor comparisons produce a bool tensor over the broadcast
/// shape.
fn compare_type(op: CmpOpKind, left: &Type, right: &Type) -> CheckResult<Type> {
    if left.is_tensor() || right.is_tensor() {
        return arith::tensor_compare(op, left, right);
    }
    let value = match (left, right) {
        (Type::Num { value: Some(a), .. }, Type::Num { value: Some(b), .. }) => {
            Some(fold_cmp(op, a.as_f64(), b.as_f64()))
        }
        (Type::Str { value: Some(a) }, Type::Str { value: Some(b) }) => Some(fold_cmp(op, a, b)),
        _ => None,
    };
    Ok(Type::Num {
        kind: NumKind::Bool,
        value: value.map(ConstValue::Bool),
    })
}

fn fold_cmp<T: PartialOrd>(op: CmpOpKind, a: T, b: T) -> bool {
    match op {
        CmpOpKind::Eq => a == b,
        CmpOpKind::NotEq => a != b,
        CmpOpKind::Lt => a < b,
        CmpOpKind::LtE => a <= b,
        CmpOpKind::Gt => a > b,
        CmpOpKind::GtE => a >= b,
    }
}

/// Subscript result for `value[index]`.
fn subscript_type(value_ty: &Type, index_ty: &Type) -> CheckResult<Type> {
    match value_ty {
        Type::Seq { kind, elems } => {
            check_index(kind, index_ty)?;
            match elems {
                SeqElems::Fixed(positions) => match int_index(index_ty) {
                    Some(i) => {
                        let len = positions.len() as i64;
                        let i = if i < 0 { i + len } else { i };
                        if i < 0 || i >= len {
                            Err(TypeCheckError::invalid(format!("{kind} index out of range")))
                        } else {
                            Ok(positions[i as usize].clone())
                        }
                    }
                    None => join_all(positions.iter()),
                },
                SeqElems::Uniform(elem) => Ok((**elem).clone()),
            }
        }
        Type::Str { .. } => {
            check_index(&"string", index_ty)?;
            Ok(Type::string())
        }
        Type::Tensor { kind, dtype, shape } => {
            check_index(kind, index_ty)?;
            match shape {
                Some(dims) if dims.is_empty() => Err(TypeCheckError::invalid(format!(
                    "cannot index a 0-dimensional {kind}"
                ))),
                Some(dims) => Ok(Type::Tensor {
                    kind: *kind,
                    dtype: *dtype,
                    shape: Some(dims[1..].to_vec()),
                }),
                None => Ok(value_ty.clone()),
            }
        }
        Type::Unknown => Ok(Type::Unknown),
        other => Err(TypeCheckError::invalid(format!(
            "{other} object is not subscriptable"
        ))),
    }
}

/// Indices must be integral (or unknown).
fn check_index(container: &dyn std::fmt::Display, index_ty: &Type) -> CheckResult<()> {
    let ok = matches!(
        index_ty,
        Type::Num {
            kind: NumKind::Bool | NumKind::Int,
            ..
        } | Type::Unknown
    );
    if ok {
        Ok(())
    } else {
        Err(TypeCheckError::invalid(format!(
            "{container} indices must be integers, not {index_ty}"
        )))
    }
}

fn int_index(index_ty: &Type) -> Option<i64> {
    index_ty.num_value().and_then(|v| v.as_i64())
}

/// Element type seen by a `for` target iterating over `iter_ty`.
fn element_type(iter_ty: &Type) -> CheckResult<Type> {
    match iter_ty {
        Type::Seq { elems, .. } => match elems {
            SeqElems::Fixed(positions) => join_all(positions.iter()),
            SeqElems::Uniform(elem) => Ok((**elem).clone()),
        },
        Type::Str { .. } => Ok(Type::string()),
        Type::Tensor { kind, dtype, shape } => match shape {
            Some(dims) if dims.is_empty() => Err(TypeCheckError::invalid(format!(
                "iteration over a 0-dimensional {kind}"
            ))),
            Some(dims) => Ok(Type::Tensor {
                kind: *kind,
                dtype: *dtype,
                shape: Some(dims[1..].to_vec()),
            }),
            None => Ok(iter_ty.clone()),
        },
        Type::Unknown => Ok(Type::Unknown),
        other => Err(TypeCheckError::invalid(format!(
            "{other} object is not iterable"
        ))),
    }
}

/// Human-readable label for a callee in error messages.
fn callee_label(func: &Expr) -> String {
    match &func.kind {
        ExprKind::Name(name) => name.clone(),
        ExprKind::Attribute { value, attr } => format!("{}.{attr}", callee_label(value)),
        _ => "<callable>".to_string(),
    }
}

// ==================== Tests ====================
