//! Findings about a problem that do not stop its evaluation.
//!
//! A reserve zone without member devices, a transformer whose tap range
//! reaches zero or a branch with zero series impedance all evaluate, but they
//! explain violation values that would otherwise look wrong. Each finding
//! names the element it concerns by uid.
//!
//! ```
//! use gridscore_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.warn("reserve", "prz_1", "zone has no member devices");
//! diag.error("branch", "acl_3", "zero series impedance");
//!
//! assert!(diag.has_errors());
//! assert_eq!(diag.count(Severity::Warning), 1);
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Evaluated, but some values depend on a degenerate input
    Warning,
    /// Evaluated, but some values are not finite
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Element class, e.g. "reserve", "branch", "transformer", "contingency"
    pub category: &'static str,
    /// Uid of the element
    pub entity: String,
    pub message: String,
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}] {}: {}",
            self.severity, self.category, self.entity, self.message
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, category: &'static str, entity: &str, message: &str) {
        self.issues.push(DiagnosticIssue {
            severity,
            category,
            entity: entity.to_string(),
            message: message.to_string(),
        });
    }

    pub fn warn(&mut self, category: &'static str, entity: &str, message: &str) {
        self.push(Severity::Warning, category, entity, message);
    }

    pub fn error(&mut self, category: &'static str, entity: &str, message: &str) {
        self.push(Severity::Error, category, entity, message);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}, {}",
            plural(self.count(Severity::Error), "error"),
            plural(self.count(Severity::Warning), "warning")
        )?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}
