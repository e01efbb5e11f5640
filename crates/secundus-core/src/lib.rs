//! # secundus-core
//!
//! Symbolic expression backend for the secundus error-propagation engine.
//!
//! This crate provides:
//! - Arena-allocated expression storage with hash-consing
//! - A recursive-descent parser for infix formulas
//! - Free-symbol extraction
//! - Symbolic differentiation with identity folding
//! - Compilation of expressions into flat evaluation tapes generic over
//!   any [`num_traits::Float`]
//!
//! ## Design Principles
//!
//! - **Data-Oriented Design**: expressions stored contiguously in an arena,
//!   evaluation runs over a postorder tape with no pointer chasing
//! - **Hash-Consing**: every structurally unique expression stored exactly
//!   once, so structural equality is an integer compare
//!
//! ## Quick Start
//!
//! ```
//! use secundus_core::{compile, diff, parse, ExprArena};
//!
//! let mut arena = ExprArena::new();
//! let expr = parse(&mut arena, "a*b + c").unwrap();
//!
//! let a = arena.symbol_id("a").unwrap();
//! let d = diff(&mut arena, expr, a);
//!
//! let order = ["a".to_string(), "b".to_string(), "c".to_string()];
//! let df = compile(&arena, d, &order).unwrap();
//! assert_eq!(df.eval(&[1.0, 4.0, 9.0]), 4.0); // d(a*b + c)/da = b
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod compile;
pub mod diff;
pub mod display;
pub mod expr;
pub mod parse;
pub mod symbols;

pub use arena::ExprArena;
pub use compile::{compile, CompiledExpr, EvalError};
pub use diff::diff;
pub use display::render;
pub use expr::{ExprHandle, ExprNode, Func, SymbolId};
pub use parse::{parse, ParseError};
pub use symbols::{free_symbol_names, free_symbols};
