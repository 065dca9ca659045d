//! Helpers for inference tests: inline fixtures and regenerating their
//! literal assertion tables.

use subset_py_typing_parser::ast::Module;

use crate::checker::{InferOptions, Inference};
use crate::error::CheckResult;
use crate::ext::ModelInfo;
use crate::infer_source;
use crate::lattice::Type;

/// Strips the common leading indentation of a source block so fixtures can
/// be written inline in raw strings. Leading and trailing blank lines are
/// dropped and the result always ends with a newline, so the first code
/// line is line 1.
pub fn dedent(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::new();
    for line in &lines {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&line[indent..]);
            out.push('\n');
        }
    }
    let mut result = out.trim_matches('\n').to_string();
    result.push('\n');
    result
}

/// Dedents, parses and infers `source` with the default registry. When a
/// model is given its instance type is prepended for `self`.
pub fn infer_types(
    source: &str,
    args: &[Type],
    model: Option<&ModelInfo>,
) -> CheckResult<(Module, Inference)> {
    infer_source(&dedent(source), args, model, InferOptions::default())
}

/// Renders the type table as ready-to-paste `assert_eq!` lines, ascending
/// by node id and annotated with source lines. Fixture tests are kept in
/// sync by regenerating their assertion blocks with this.
pub fn assertion_block(inference: &Inference) -> String {
    let mut out = String::new();
    for (id, ty) in inference.table.iter() {
        match inference.nodes.line(id) {
            Some(line) => out.push_str(&format!(
                "assert_eq!(ty(&inf, {id}), \"{ty}\"); // line {line}\n"
            )),
            None => out.push_str(&format!("assert_eq!(ty(&inf, {id}), \"{ty}\");\n")),
        }
    }
    out
}

// ==================== Tests ====================
