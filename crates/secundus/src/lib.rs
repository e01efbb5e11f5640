//! # secundus
//!
//! Derived ("secondary") physical quantities with first-order Gaussian
//! error propagation, for turning raw lab measurements and their
//! uncertainties into a result and its combined uncertainty without
//! hand-deriving partial derivatives.
//!
//! A [`Quantity`] is built from a formula; calling [`Quantity::eval`] with
//! bound inputs returns the central value and, when any input carries
//! uncertainty, one combined error per uncertainty column via
//! `sqrt(Σ (∂f/∂v · σ_v)²)`. Inputs may be scalars or per-sample series,
//! and quantities can depend on other quantities, resolved recursively.
//!
//! ## Quick Start
//!
//! ```
//! use secundus::{bindings, Quantity};
//!
//! // kinetic energy E = m*v^2/2, m known to ±0.01
//! let energy: Quantity = Quantity::parse("m*v^2/2").unwrap();
//! let result = energy
//!     .eval(&bindings! { m => (1.40, 0.01), v => (2.50, 0.05) })
//!     .unwrap();
//!
//! assert_eq!(result.scalar(), Some(1.40 * 2.50_f64.powi(2) / 2.0));
//! assert!(result.error().is_some());
//!
//! // and the propagation formula for the lab report:
//! let formula = energy.error_formula(&["m", "v"]);
//! assert!(formula.starts_with("sqrt("));
//! ```
//!
//! ## Error model
//!
//! Uncertainties are treated as independent and combined in quadrature;
//! correlations and higher-order terms are out of scope. A component with
//! zero magnitude is excluded from the sum, not treated as unknown.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod binding;
mod cache;
mod error;
mod propagate;
#[cfg(test)]
mod proptests;
mod quantity;

pub use binding::{Binding, Bindings, Value};
pub use error::Error;
pub use quantity::{Evaluation, Quantity, QuantityBuilder, SymbolTree};

pub use secundus_core as core;
