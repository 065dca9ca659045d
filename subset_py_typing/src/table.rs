//! Node identity and the inferred-type table.
//!
//! Every statement, expression and parameter gets a small integer id in one
//! deterministic pre-order pass (a node before its children, children in
//! grammar order). The id is stamped into the AST node itself and is the
//! only key the type table ever uses, so nothing downstream depends on
//! object identity. Ids are a per-run debugging aid, not content hashes.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value as Json};
use subset_py_typing_parser::ast::{Expr, ExprKind, Module, NodeId, Param, Stmt, StmtKind};

use crate::lattice::Type;

// ==================== Node table ====================

/// Companion data produced while numbering a module: how many ids were
/// assigned, each node's source line, and which ids the checker is
/// expected to type (statements and expressions; the module root and bare
/// parameters stay untyped).
#[derive(Debug, Clone)]
pub struct NodeTable {
    len: usize,
    linenos: BTreeMap<NodeId, usize>,
    checkable: BTreeSet<NodeId>,
}

impl NodeTable {
    /// Numbers every node of `module` in pre-order, starting at 0 with the
    /// module root, and records the companion tables.
    pub fn build(module: &mut Module) -> NodeTable {
        let mut stamper = Stamper::default();
        stamper.module(module);
        NodeTable {
            len: stamper.next,
            linenos: stamper.linenos,
            checkable: stamper.checkable,
        }
    }

    /// Total number of ids assigned.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Source line of a numbered node. The module root has no line.
    pub fn line(&self, id: NodeId) -> Option<usize> {
        self.linenos.get(&id).copied()
    }

    /// Ids the checker is expected to record a type for, ascending.
    pub fn checkable(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.checkable.iter().copied()
    }

    /// Checkable ids that `table` has no entry for, ascending. Empty means
    /// full coverage.
    pub fn missing(&self, table: &TypeTable) -> Vec<NodeId> {
        self.checkable
            .iter()
            .copied()
            .filter(|id| !table.contains(*id))
            .collect()
    }
}

#[derive(Default)]
struct Stamper {
    next: NodeId,
    linenos: BTreeMap<NodeId, usize>,
    checkable: BTreeSet<NodeId>,
}

impl Stamper {
    fn stamp(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        id
    }

    fn module(&mut self, module: &mut Module) {
        module.id = self.stamp();
        for stmt in &mut module.body {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        stmt.id = self.stamp();
        self.linenos.insert(stmt.id, stmt.line);
        self.checkable.insert(stmt.id);
        match &mut stmt.kind {
            StmtKind::FunctionDef { params, body, .. } => {
                for param in params {
                    self.param(param);
                }
                for stmt in body {
                    self.stmt(stmt);
                }
            }
            StmtKind::Assign { target, value } => {
                self.expr(target);
                self.expr(value);
            }
            StmtKind::AugAssign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            StmtKind::Return { value } => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            StmtKind::If { test, body, orelse } => {
                self.expr(test);
                for stmt in body {
                    self.stmt(stmt);
                }
                for stmt in orelse {
                    self.stmt(stmt);
                }
            }
            StmtKind::For { target, iter, body } => {
                self.expr(target);
                self.expr(iter);
                for stmt in body {
                    self.stmt(stmt);
                }
            }
            StmtKind::While { test, body } => {
                self.expr(test);
                for stmt in body {
                    self.stmt(stmt);
                }
            }
            StmtKind::Expr { value } => self.expr(value),
            StmtKind::Pass => {}
        }
    }

    fn param(&mut self, param: &mut Param) {
        param.id = self.stamp();
        self.linenos.insert(param.id, param.line);
    }

    fn expr(&mut self, expr: &mut Expr) {
        expr.id = self.stamp();
        self.linenos.insert(expr.id, expr.line);
        self.checkable.insert(expr.id);
        match &mut expr.kind {
            ExprKind::Literal(_) | ExprKind::Name(_) => {}
            ExprKind::Attribute { value, .. } => self.expr(value),
            ExprKind::Subscript { value, index } => {
                self.expr(value);
                self.expr(index);
            }
            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                self.expr(func);
                for arg in args {
                    self.expr(arg);
                }
                for keyword in keywords {
                    self.expr(&mut keyword.value);
                }
            }
            ExprKind::BinOp { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::UnaryOp { operand, .. } => self.expr(operand),
            ExprKind::Compare { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Tuple { elems } | ExprKind::List { elems } => {
                for elem in elems {
                    self.expr(elem);
                }
            }
        }
    }
}

// ==================== Type table ====================

/// The inference result proper: node id to inferred type, writes replacing
/// earlier entries for the same id.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: BTreeMap<NodeId, Type>,
}

impl TypeTable {
    pub fn new() -> TypeTable {
        TypeTable::default()
    }

    /// Records `ty` for `id`. A second write for the same id overwrites,
    /// which is what the two-pass loop approximation relies on.
    pub fn record(&mut self, id: NodeId, ty: Type) {
        self.entries.insert(id, ty);
    }

    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Type)> {
        self.entries.iter().map(|(id, ty)| (*id, ty))
    }

    /// Rendered form of an entry, if present.
    pub fn rendered(&self, id: NodeId) -> Option<String> {
        self.entries.get(&id).map(Type::to_string)
    }

    /// JSON object keyed by id with rendered type strings, the export
    /// format shared with external tooling.
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        for (id, ty) in &self.entries {
            map.insert(id.to_string(), Json::String(ty.to_string()));
        }
        Json::Object(map)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use subset_py_typing_parser::parse_module;

    fn module(source: &str) -> Module {
        parse_module(source).unwrap()
    }

    #[test]
    fn numbering_is_preorder_with_children_in_grammar_order() {
        let mut m = module("def f(x):\n    y = abs(x)\n    x = x + 1.3\n    return x\n");
        let nodes = NodeTable::build(&mut m);

        assert_eq!(m.id, 0);
        let StmtKind::FunctionDef { params, body, .. } = &m.body[0].kind else {
            panic!("expected a function definition");
        };
        assert_eq!(m.body[0].id, 1);
        assert_eq!(params[0].id, 2);

        // y = abs(x)
        assert_eq!(body[0].id, 3);
        let StmtKind::Assign { target, value } = &body[0].kind else {
            panic!("expected an assignment");
        };
        assert_eq!(target.id, 4);
        assert_eq!(value.id, 5);
        let ExprKind::Call { func, args, .. } = &value.kind else {
            panic!("expected a call");
        };
        assert_eq!(func.id, 6);
        assert_eq!(args[0].id, 7);

        // x = x + 1.3
        assert_eq!(body[1].id, 8);
        let StmtKind::Assign { target, value } = &body[1].kind else {
            panic!("expected an assignment");
        };
        assert_eq!(target.id, 9);
        assert_eq!(value.id, 10);
        let ExprKind::BinOp { left, right, .. } = &value.kind else {
            panic!("expected a binop");
        };
        assert_eq!(left.id, 11);
        assert_eq!(right.id, 12);

        // return x
        assert_eq!(body[2].id, 13);
        let StmtKind::Return { value: Some(value) } = &body[2].kind else {
            panic!("expected a return with a value");
        };
        assert_eq!(value.id, 14);

        assert_eq!(nodes.len(), 15);
    }

    #[test]
    fn linenos_follow_the_source() {
        let mut m = module("def f(x):\n    y = abs(x)\n    return y\n");
        let nodes = NodeTable::build(&mut m);
        assert_eq!(nodes.line(1), Some(1));
        assert_eq!(nodes.line(2), Some(1));
        assert_eq!(nodes.line(3), Some(2));
        assert_eq!(nodes.line(8), Some(3), "the return statement sits on line 3");
        assert_eq!(nodes.line(0), None, "the module root has no line");
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let src = "def f(a, b):\n    c = a + b\n    return c\n";
        let mut m1 = module(src);
        let mut m2 = module(src);
        let n1 = NodeTable::build(&mut m1);
        let n2 = NodeTable::build(&mut m2);
        assert_eq!(n1.len(), n2.len());
        assert_eq!(
            n1.checkable().collect::<Vec<_>>(),
            n2.checkable().collect::<Vec<_>>()
        );
        assert_eq!(m1.body[0].id, m2.body[0].id);
    }

    #[test]
    fn params_and_module_root_are_not_checkable() {
        let mut m = module("def f(x):\n    return x\n");
        let nodes = NodeTable::build(&mut m);
        let checkable: Vec<_> = nodes.checkable().collect();
        assert!(!checkable.contains(&0), "module root is not checkable");
        assert!(!checkable.contains(&2), "parameters are not checkable");
        assert!(checkable.contains(&1));
        assert!(checkable.contains(&3));
        assert!(checkable.contains(&4));
    }

    #[test]
    fn missing_reports_uncovered_checkable_ids() {
        let mut m = module("def f(x):\n    return x\n");
        let nodes = NodeTable::build(&mut m);
        let mut table = TypeTable::new();
        table.record(1, Type::arrow(vec![Type::int()], Type::int()));
        table.record(3, Type::int());
        assert_eq!(nodes.missing(&table), vec![4]);
        table.record(4, Type::int());
        assert!(nodes.missing(&table).is_empty());
    }

    #[test]
    fn type_table_overwrites_and_exports() {
        let mut table = TypeTable::new();
        table.record(4, Type::int());
        table.record(4, Type::float());
        assert_eq!(table.rendered(4), Some("float".to_string()));
        assert_eq!(table.len(), 1);
        table.record(9, Type::torch_tensor(crate::lattice::Dtype::Float32, vec![1, 9216]));
        let json = table.to_json();
        assert_eq!(json["4"], "float");
        assert_eq!(json["9"], "torch.Tensor(float32, (1, 9216))");
    }
}
