//! Unified error types for gridscore
//!
//! Evaluation itself never fails on a bad solution: every constraint check
//! produces a violation magnitude instead. [`GridError`] covers the things
//! that stop an evaluation before it starts, such as unreadable input files,
//! malformed JSON/TOML, or a solution whose matrices do not match the
//! problem's entity counts.
//!
//! # Example
//!
//! ```ignore
//! use gridscore_core::{GridError, GridResult};
//!
//! fn score(problem_path: &str, solution_path: &str) -> GridResult<f64> {
//!     let problem = Problem::load(problem_path)?;
//!     let solution = Solution::load(solution_path, problem.num_t())?;
//!     let evaluation = SolutionEvaluator::new(&problem, &solution, EvalConfig::default())?.run()?;
//!     Ok(evaluation.objective())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all gridscore operations.
#[derive(Error, Debug)]
pub enum GridError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// A matrix or per-interval vector whose dimensions disagree with the problem
    #[error("Shape error: {0}")]
    Shape(String),

    /// An entity reference outside the dense index range
    #[error("Index error: {0}")]
    Index(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GridError.
pub type GridResult<T> = Result<T, GridError>;

impl GridError {
    /// Build a shape error for `what` given expected and actual `(rows, cols)`.
    pub fn shape(what: &str, expected: (usize, usize), actual: (usize, usize)) -> Self {
        GridError::Shape(format!(
            "{what}: expected {}x{}, found {}x{}",
            expected.0, expected.1, actual.0, actual.1
        ))
    }

    /// Build an index error for a reference `index` into a table of `len` entries.
    pub fn index(what: &str, index: usize, len: usize) -> Self {
        GridError::Index(format!("{what}: index {index} out of range 0..{len}"))
    }
}

// Conversion from string-like types for convenience
impl From<String> for GridError {
    fn from(s: String) -> Self {
        GridError::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        GridError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Parse(err.to_string())
    }
}

// TOML parsing errors
impl From<toml::de::Error> for GridError {
    fn from(err: toml::de::Error) -> Self {
        GridError::Config(err.to_string())
    }
}
