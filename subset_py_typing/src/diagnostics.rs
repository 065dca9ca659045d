//! Non-fatal findings and the optional inference trace.
//!
//! Tracing is not ambient state: the reporter is created per run from the
//! caller's options, carried by the checker, and surrendered with the
//! result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Weight of a finding. `Note` is informational, `Warning` marks a place
/// where inference deliberately gave up precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Note,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One non-fatal finding produced during inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line}): {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Collects diagnostics and, when enabled, a step-by-step trace of the
/// walk. Owned by one checker run.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    trace: Option<Vec<String>>,
}

impl Reporter {
    pub fn new(trace_enabled: bool) -> Reporter {
        Reporter {
            diagnostics: Vec::new(),
            trace: trace_enabled.then(Vec::new),
        }
    }

    pub fn note(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Note,
            line,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            line,
            message: message.into(),
        });
    }

    /// Whether trace lines are being kept. Callers can skip building
    /// expensive messages when this is off.
    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Appends one trace line when tracing is on, a no-op otherwise.
    pub fn trace(&mut self, message: impl Into<String>) {
        if let Some(trace) = &mut self.trace {
            trace.push(message.into());
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the reporter, yielding the diagnostics and the trace
    /// (empty when tracing was off).
    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<String>) {
        (self.diagnostics, self.trace.unwrap_or_default())
    }
}

// ==================== Tests ====================
