//! Integration tests for the Python-subset parser.

use pretty_assertions::assert_eq;
use subset_py_typing_parser::{
    parse_module, BinOpKind, CmpOpKind, Expr, ExprKind, Literal, Module, ParseError, Stmt,
    StmtKind, UnaryOpKind,
};

fn parse_ok(source: &str) -> Module {
    match parse_module(source) {
        Ok(module) => module,
        Err(errors) => panic!("parse failed:\n{}", errors),
    }
}

fn parse_err(source: &str) -> ParseError {
    match parse_module(source) {
        Ok(_) => panic!("expected a parse error"),
        Err(errors) => errors.first().expect("at least one error").clone(),
    }
}

/// Parse a single simple statement.
fn stmt(source: &str) -> Stmt {
    let mut module = parse_ok(source);
    assert_eq!(module.body.len(), 1, "expected one statement");
    module.body.remove(0)
}

/// Parse `x = <source>` and return the value expression.
fn expr(source: &str) -> Expr {
    match stmt(&format!("x = {}", source)).kind {
        StmtKind::Assign { value, .. } => value,
        other => panic!("expected assignment, got {:?}", other),
    }
}

// ==================== Literals and Atoms ====================

#[test]
fn literal_atoms() {
    assert_eq!(expr("42").kind, ExprKind::Literal(Literal::Int(42)));
    assert_eq!(expr("1.3").kind, ExprKind::Literal(Literal::Float(1.3)));
    assert_eq!(
        expr("\"hi\"").kind,
        ExprKind::Literal(Literal::Str("hi".into()))
    );
    assert_eq!(
        expr("'hi'").kind,
        ExprKind::Literal(Literal::Str("hi".into()))
    );
    assert_eq!(expr("True").kind, ExprKind::Literal(Literal::Bool(true)));
    assert_eq!(expr("None").kind, ExprKind::Literal(Literal::None));
    assert_eq!(expr("y").kind, ExprKind::Name("y".into()));
}

#[test]
fn tuple_and_list_displays() {
    match expr("(1, 2)").kind {
        ExprKind::Tuple { elems } => assert_eq!(elems.len(), 2),
        other => panic!("expected tuple, got {:?}", other),
    }
    match expr("(1,)").kind {
        ExprKind::Tuple { elems } => assert_eq!(elems.len(), 1),
        other => panic!("expected one-element tuple, got {:?}", other),
    }
    match expr("()").kind {
        ExprKind::Tuple { elems } => assert!(elems.is_empty()),
        other => panic!("expected empty tuple, got {:?}", other),
    }
    match expr("[1, 2, 3]").kind {
        ExprKind::List { elems } => assert_eq!(elems.len(), 3),
        other => panic!("expected list, got {:?}", other),
    }
    match expr("[]").kind {
        ExprKind::List { elems } => assert!(elems.is_empty()),
        other => panic!("expected empty list, got {:?}", other),
    }
}

#[test]
fn grouping_parens_add_no_node() {
    assert_eq!(expr("(y)").kind, ExprKind::Name("y".into()));
}

// ==================== Operators ====================

#[test]
fn arithmetic_precedence() {
    match expr("a + b * c").kind {
        ExprKind::BinOp { op, right, .. } => {
            assert_eq!(op, BinOpKind::Add);
            assert!(matches!(
                right.kind,
                ExprKind::BinOp {
                    op: BinOpKind::Mult,
                    ..
                }
            ));
        }
        other => panic!("expected binop, got {:?}", other),
    }
}

#[test]
fn floor_div_and_mod() {
    assert!(matches!(
        expr("a // b").kind,
        ExprKind::BinOp {
            op: BinOpKind::FloorDiv,
            ..
        }
    ));
    assert!(matches!(
        expr("a % b").kind,
        ExprKind::BinOp {
            op: BinOpKind::Mod,
            ..
        }
    ));
}

#[test]
fn unary_minus_binds_looser_than_power() {
    // -x ** 2 parses as -(x ** 2)
    match expr("-x ** 2").kind {
        ExprKind::UnaryOp { op, operand } => {
            assert_eq!(op, UnaryOpKind::Minus);
            assert!(matches!(
                operand.kind,
                ExprKind::BinOp {
                    op: BinOpKind::Pow,
                    ..
                }
            ));
        }
        other => panic!("expected unary op, got {:?}", other),
    }
}

#[test]
fn power_accepts_signed_exponent() {
    match expr("2 ** -1").kind {
        ExprKind::BinOp { op, right, .. } => {
            assert_eq!(op, BinOpKind::Pow);
            assert!(matches!(right.kind, ExprKind::UnaryOp { .. }));
        }
        other => panic!("expected power, got {:?}", other),
    }
}

#[test]
fn comparisons() {
    match expr("a < b").kind {
        ExprKind::Compare { op, .. } => assert_eq!(op, CmpOpKind::Lt),
        other => panic!("expected comparison, got {:?}", other),
    }
    match expr("not flag").kind {
        ExprKind::UnaryOp { op, .. } => assert_eq!(op, UnaryOpKind::Not),
        other => panic!("expected not, got {:?}", other),
    }
}

#[test]
fn chained_comparison_is_unsupported() {
    let e = parse_err("x = 1 < y < 2\n");
    assert!(matches!(e, ParseError::Unsupported { .. }));
}

// ==================== Calls, Attributes, Subscripts ====================

#[test]
fn call_with_positional_and_keyword_args() {
    match expr("torch.flatten(h, start_dim=1)").kind {
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            assert!(matches!(func.kind, ExprKind::Attribute { .. }));
            assert_eq!(args.len(), 1);
            assert_eq!(keywords.len(), 1);
            assert_eq!(keywords[0].name, "start_dim");
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn keyword_argument_is_not_a_comparison() {
    match expr("f(x == 1)").kind {
        ExprKind::Call { args, keywords, .. } => {
            assert_eq!(args.len(), 1);
            assert!(keywords.is_empty());
            assert!(matches!(args[0].kind, ExprKind::Compare { .. }));
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn positional_after_keyword_is_rejected() {
    let e = parse_err("x = f(a=1, b)\n");
    assert!(matches!(e, ParseError::Unsupported { .. }));
}

#[test]
fn attribute_chains_and_subscripts() {
    match expr("self.l1.W").kind {
        ExprKind::Attribute { value, attr } => {
            assert_eq!(attr, "W");
            assert!(matches!(value.kind, ExprKind::Attribute { .. }));
        }
        other => panic!("expected attribute, got {:?}", other),
    }
    match expr("xs[0]").kind {
        ExprKind::Subscript { index, .. } => {
            assert_eq!(index.kind, ExprKind::Literal(Literal::Int(0)));
        }
        other => panic!("expected subscript, got {:?}", other),
    }
}

#[test]
fn slices_are_unsupported() {
    let e = parse_err("x = xs[1:2]\n");
    assert!(matches!(e, ParseError::Unsupported { .. }));
}

// ==================== Statements ====================

#[test]
fn simple_and_destructuring_assignment() {
    match stmt("x = 1\n").kind {
        StmtKind::Assign { target, .. } => assert_eq!(target.kind, ExprKind::Name("x".into())),
        other => panic!("expected assign, got {:?}", other),
    }
    match stmt("a, b = t\n").kind {
        StmtKind::Assign { target, .. } => {
            assert!(matches!(target.kind, ExprKind::Tuple { .. }))
        }
        other => panic!("expected assign, got {:?}", other),
    }
}

#[test]
fn augmented_assignment() {
    match stmt("x += 1\n").kind {
        StmtKind::AugAssign { op, .. } => assert_eq!(op, BinOpKind::Add),
        other => panic!("expected augmented assign, got {:?}", other),
    }
}

#[test]
fn chained_assignment_is_unsupported() {
    let e = parse_err("a = b = 1\n");
    assert!(matches!(e, ParseError::Unsupported { .. }));
}

#[test]
fn assignment_to_literal_is_rejected() {
    let e = parse_err("1 = x\n");
    assert!(matches!(e, ParseError::Unsupported { .. }));
}

#[test]
fn return_with_and_without_value() {
    let module = parse_ok("def f(x):\n    return\n");
    let module2 = parse_ok("def f(x):\n    return x, 1\n");
    for (m, want_value) in [(&module, false), (&module2, true)] {
        match &m.body[0].kind {
            StmtKind::FunctionDef { body, .. } => match &body[0].kind {
                StmtKind::Return { value } => assert_eq!(value.is_some(), want_value),
                other => panic!("expected return, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }
}

#[test]
fn function_def_with_params() {
    match &parse_ok("def forward(self, x):\n    pass\n").body[0].kind {
        StmtKind::FunctionDef { name, params, body } => {
            assert_eq!(name, "forward");
            let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["self", "x"]);
            assert!(matches!(body[0].kind, StmtKind::Pass));
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn inline_suite_with_semicolons() {
    let module = parse_ok("def f(x): y = abs(x); x = x + 1.3; return x");
    match &module.body[0].kind {
        StmtKind::FunctionDef { body, .. } => {
            assert_eq!(body.len(), 3);
            assert!(matches!(body[0].kind, StmtKind::Assign { .. }));
            assert!(matches!(body[1].kind, StmtKind::Assign { .. }));
            assert!(matches!(body[2].kind, StmtKind::Return { .. }));
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn default_parameter_values_are_unsupported() {
    let e = parse_err("def f(x=1):\n    pass\n");
    assert!(matches!(e, ParseError::Unsupported { .. }));
}

// ==================== Control Flow ====================

#[test]
fn elif_normalizes_to_nested_if() {
    let source = "\
def f(x):
    if x > 0:
        y = 1
    elif x < 0:
        y = 2
    else:
        y = 3
    return y
";
    let module = parse_ok(source);
    match &module.body[0].kind {
        StmtKind::FunctionDef { body, .. } => match &body[0].kind {
            StmtKind::If { orelse, .. } => {
                assert_eq!(orelse.len(), 1);
                match &orelse[0].kind {
                    StmtKind::If { orelse: inner, .. } => assert_eq!(inner.len(), 1),
                    other => panic!("expected nested if, got {:?}", other),
                }
            }
            other => panic!("expected if, got {:?}", other),
        },
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn for_and_while_loops() {
    let module = parse_ok("for i in range(3):\n    x = i\nwhile x > 0:\n    x = x - 1\n");
    assert_eq!(module.body.len(), 2);
    assert!(matches!(module.body[0].kind, StmtKind::For { .. }));
    assert!(matches!(module.body[1].kind, StmtKind::While { .. }));
}

#[test]
fn destructuring_for_target() {
    match &parse_ok("for a, b in pairs:\n    pass\n").body[0].kind {
        StmtKind::For { target, .. } => assert!(matches!(target.kind, ExprKind::Tuple { .. })),
        other => panic!("expected for, got {:?}", other),
    }
}

// ==================== Layout and Lines ====================

#[test]
fn statement_lines_are_recorded() {
    let module = parse_ok("def f(x):\n    y = 1\n    return y\n");
    assert_eq!(module.body[0].line, 1);
    match &module.body[0].kind {
        StmtKind::FunctionDef { body, .. } => {
            assert_eq!(body[0].line, 2);
            assert_eq!(body[1].line, 3);
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn multiline_call_arguments_join_lines() {
    let module = parse_ok("x = f(a,\n      b,\n      c)\n");
    match &module.body[0].kind {
        StmtKind::Assign { value, .. } => match &value.kind {
            ExprKind::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("expected call, got {:?}", other),
        },
        other => panic!("expected assign, got {:?}", other),
    }
}

#[test]
fn bad_dedent_is_reported_with_line() {
    let e = parse_err("if a:\n    pass\n  x = 1\n");
    assert!(matches!(e, ParseError::BadIndent { .. }));
    assert_eq!(e.line(), 3);
}

// ==================== Out-of-subset Constructs ====================

#[test]
fn reserved_words_are_rejected() {
    assert!(matches!(
        parse_err("import numpy\n"),
        ParseError::ReservedWord { .. }
    ));
    assert!(matches!(
        parse_err("x = a and b\n"),
        ParseError::ReservedWord { .. }
    ));
    assert!(matches!(
        parse_err("class A:\n    pass\n"),
        ParseError::ReservedWord { .. }
    ));
}

#[test]
fn recovery_collects_multiple_errors() {
    let errors = match parse_module("x = \ny = 1\nz = ]\n") {
        Ok(_) => panic!("expected errors"),
        Err(errors) => errors,
    };
    assert!(errors.len() >= 2);
}
