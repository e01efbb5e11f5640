//! Engine error types.
//!
//! Only input-completeness and shape problems are intentional engine
//! errors; numeric failures (division by zero, domain errors) follow
//! IEEE-754 semantics in the evaluator and are never caught here.

use std::collections::BTreeSet;

use thiserror::Error;

use secundus_core::{EvalError, ParseError};

/// Errors surfaced by the quantity engine.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// After dependency resolution and default injection, the bound names
    /// still do not cover the expression's free variables.
    #[error("missing symbols: {}", format_names(.0))]
    MissingSymbols(BTreeSet<String>),

    /// Two series bound in the same call disagree on sample count.
    #[error("length mismatch for '{name}': expected {expected} samples, found {found}")]
    LengthMismatch {
        /// The binding whose series length disagrees.
        name: String,
        /// The sample count established by the first series seen.
        expected: usize,
        /// The offending length.
        found: usize,
    },

    /// The expression could not be parsed at construction.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A compiled evaluator was missing a variable; indicates an engine
    /// invariant violation rather than a caller mistake.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

fn format_names(names: &BTreeSet<String>) -> String {
    names
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
