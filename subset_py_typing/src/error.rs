//! Failure taxonomy for one inference run.
//!
//! Every variant aborts the run at the point of detection; there is no
//! partial recovery. The one policy exception is the branch merge, which may
//! degrade an incompatible join to `Any` and records a diagnostic instead of
//! failing (see `checker`).

use subset_py_typing_parser::ParseErrors;
use thiserror::Error;

/// Errors raised while inferring one function body.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeCheckError {
    /// Operator or operation not defined for the given operand types.
    #[error("unsupported operand types for {op}: {left} and {right}")]
    Op {
        op: String,
        left: String,
        right: String,
    },

    /// A more general operation mismatch with a free-form description.
    #[error("{message}")]
    Invalid { message: String },

    #[error("name '{name}' is not defined")]
    UnboundName { name: String },

    #[error("'{class_name}' object has no attribute '{attr}'")]
    MissingAttribute { class_name: String, attr: String },

    #[error("{callee}() takes {expected} arguments but {given} were given")]
    Arity {
        callee: String,
        expected: usize,
        given: usize,
    },

    /// Join of structurally incompatible lattice elements.
    #[error("cannot join {left} with {right}")]
    Incompatible { left: String, right: String },

    /// Call to a callable with no registered type rule.
    #[error("no type rule registered for '{callee}'")]
    NotImplemented { callee: String },

    /// Construct outside the modeled subset.
    #[error("{construct} is not supported")]
    Unsupported { construct: String },

    /// Source could not be parsed at all.
    #[error("parse failed: {message}")]
    Parse { message: String },

    /// A failure wrapped with the source line where it surfaced.
    #[error("line {line}: {inner}")]
    Located {
        line: usize,
        inner: Box<TypeCheckError>,
    },
}

impl TypeCheckError {
    pub fn op(op: impl std::fmt::Display, left: impl Into<String>, right: impl Into<String>) -> Self {
        TypeCheckError::Op {
            op: op.to_string(),
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        TypeCheckError::Invalid {
            message: message.into(),
        }
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        TypeCheckError::UnboundName { name: name.into() }
    }

    pub fn missing_attribute(class_name: impl Into<String>, attr: impl Into<String>) -> Self {
        TypeCheckError::MissingAttribute {
            class_name: class_name.into(),
            attr: attr.into(),
        }
    }

    pub fn arity(callee: impl Into<String>, expected: usize, given: usize) -> Self {
        TypeCheckError::Arity {
            callee: callee.into(),
            expected,
            given,
        }
    }

    pub fn incompatible(left: impl Into<String>, right: impl Into<String>) -> Self {
        TypeCheckError::Incompatible {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn not_implemented(callee: impl Into<String>) -> Self {
        TypeCheckError::NotImplemented {
            callee: callee.into(),
        }
    }

    pub fn unsupported(construct: impl Into<String>) -> Self {
        TypeCheckError::Unsupported {
            construct: construct.into(),
        }
    }

    /// Attach a source line, unless one is already attached.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            TypeCheckError::Located { .. } => self,
            other => TypeCheckError::Located {
                line,
                inner: Box::new(other),
            },
        }
    }

    /// The failure itself, with any location wrapper removed.
    pub fn inner(&self) -> &TypeCheckError {
        match self {
            TypeCheckError::Located { inner, .. } => inner.inner(),
            other => other,
        }
    }

    /// The attached source line, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            TypeCheckError::Located { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<ParseErrors> for TypeCheckError {
    fn from(errors: ParseErrors) -> Self {
        TypeCheckError::Parse {
            message: errors.to_string(),
        }
    }
}

/// Result alias for inference operations.
pub type CheckResult<T> = Result<T, TypeCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_the_host_language() {
        let e = TypeCheckError::op("+", "int list", "string");
        assert_eq!(
            e.to_string(),
            "unsupported operand types for +: int list and string"
        );
        let e = TypeCheckError::missing_attribute("MLP", "missing_submodule");
        assert_eq!(
            e.to_string(),
            "'MLP' object has no attribute 'missing_submodule'"
        );
        let e = TypeCheckError::arity("forward", 2, 1);
        assert_eq!(e.to_string(), "forward() takes 2 arguments but 1 were given");
    }

    #[test]
    fn located_wraps_once_and_unwraps() {
        let e = TypeCheckError::unbound("h").at_line(4).at_line(9);
        assert_eq!(e.line(), Some(4));
        assert_eq!(e.inner(), &TypeCheckError::unbound("h"));
        assert_eq!(e.to_string(), "line 4: name 'h' is not defined");
    }
}
