//! Boolean condition expressions over named dataref values.
//!
//! Expressions are compiled once when a profile is loaded and evaluated
//! every tick against the latest readings.
//!
//! ```
//! use bravo::expr::Program;
//! use bravo::telemetry::Reading;
//!
//! let vars = vec!["volts".to_string(), "gear".to_string()];
//! let program = Program::compile("volts > 20 && gear >= 0.99", &vars).unwrap();
//! assert!(program.evaluate(&[Reading::Value(24.0), Reading::Value(1.0)]));
//! assert!(!program.evaluate(&[Reading::Missing, Reading::Value(1.0)]));
//! ```

pub mod eval;
pub mod parser;

pub use eval::Value;
pub use parser::CompileError;

use crate::telemetry::Reading;
use parser::Expr;

/// A compiled condition expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    source: String,
    variables: Vec<String>,
    expr: Expr,
}

impl Program {
    /// Parse `source` against the given variable names.
    ///
    /// Identifiers not listed in `variables` are rejected here rather than
    /// at evaluation time.
    pub fn compile(source: &str, variables: &[String]) -> Result<Self, CompileError> {
        let expr = parser::parse(source, variables)?;
        Ok(Self {
            source: source.to_string(),
            variables: variables.to_vec(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluate to a three-valued result.
    pub fn value(&self, values: &[Reading]) -> Value {
        eval::evaluate(&self.expr, values)
    }

    /// Evaluate with `values[i]` bound to `variables()[i]`.
    ///
    /// Unknown results (missing readings, type errors, division by zero)
    /// are `false`.
    pub fn evaluate(&self, values: &[Reading]) -> bool {
        self.value(values).truth().unwrap_or(false)
    }
}
