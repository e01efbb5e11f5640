//! Expression node types.
//!
//! This module defines the node enum stored in the arena together with the
//! lightweight handle type used to reference interned nodes.

use std::fmt;

use smallvec::SmallVec;

/// Unique identifier for a symbolic variable.
pub type SymbolId = u32;

/// A handle to an expression in the arena.
///
/// A 32-bit index that can be copied freely. Thanks to hash-consing, two
/// handles from the same arena are equal if and only if they reference
/// structurally identical expressions.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprHandle(u32);

impl ExprHandle {
    /// Creates a handle from a raw arena index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self.0)
    }
}

/// A builtin unary function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl Func {
    /// The name this function is written with in source expressions.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Log10 => "log10",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
        }
    }

    /// Looks a function up by its source name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "exp" => Func::Exp,
            "ln" => Func::Ln,
            "log10" => Func::Log10,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            _ => return None,
        })
    }

    /// Applies the function numerically.
    pub fn apply<T: num_traits::Float>(self, x: T) -> T {
        match self {
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Asin => x.asin(),
            Func::Acos => x.acos(),
            Func::Atan => x.atan(),
            Func::Sinh => x.sinh(),
            Func::Cosh => x.cosh(),
            Func::Tanh => x.tanh(),
            Func::Exp => x.exp(),
            Func::Ln => x.ln(),
            Func::Log10 => x.log10(),
            Func::Sqrt => x.sqrt(),
            Func::Abs => x.abs(),
        }
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An expression node stored in the arena.
///
/// Floating-point literals are stored as raw bits so that nodes remain
/// `Eq + Hash` for hash-consing; use [`ExprNode::number`] to read them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Atoms ===
    /// A 64-bit integer literal.
    Integer(i64),

    /// A floating-point literal, stored as its IEEE-754 bit pattern.
    Float(u64),

    /// A symbolic variable.
    Symbol(SymbolId),

    // === Compound expressions ===
    /// Sum of expressions: a + b + c + ...
    ///
    /// Invariant: at least 2 arguments.
    Add(SmallVec<[ExprHandle; 4]>),

    /// Product of expressions: a * b * c * ...
    ///
    /// Invariant: at least 2 arguments.
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Power expression: base^exp.
    Pow {
        /// The base of the power.
        base: ExprHandle,
        /// The exponent.
        exp: ExprHandle,
    },

    /// Negation: -expr.
    Neg(ExprHandle),

    /// Division: numerator / denominator.
    Div {
        /// The numerator.
        num: ExprHandle,
        /// The denominator.
        den: ExprHandle,
    },

    /// A builtin unary function application: f(arg).
    Function {
        /// The function.
        func: Func,
        /// The argument.
        arg: ExprHandle,
    },
}

impl ExprNode {
    /// Returns true if this node is an atom (no children).
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            ExprNode::Integer(_) | ExprNode::Float(_) | ExprNode::Symbol(_)
        )
    }

    /// Returns the numeric value of a literal node, if this is one.
    #[must_use]
    pub fn number(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            ExprNode::Integer(n) => Some(*n as f64),
            ExprNode::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Returns true if this is a numeric literal equal to `value`.
    #[must_use]
    pub fn is_number(&self, value: f64) -> bool {
        self.number() == Some(value)
    }

    /// Returns the children of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Integer(_) | ExprNode::Float(_) | ExprNode::Symbol(_) => SmallVec::new(),
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Pow { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Neg(arg) | ExprNode::Function { arg, .. } => smallvec::smallvec![*arg],
            ExprNode::Div { num, den } => smallvec::smallvec![*num, *den],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_have_no_children() {
        assert!(ExprNode::Integer(42).is_atom());
        assert!(ExprNode::Symbol(0).is_atom());
        assert!(ExprNode::Integer(42).children().is_empty());
        assert!(!ExprNode::Neg(ExprHandle::new(0)).is_atom());
    }

    #[test]
    fn literal_values_round_trip() {
        assert_eq!(ExprNode::Integer(7).number(), Some(7.0));
        assert_eq!(ExprNode::Float(0.5f64.to_bits()).number(), Some(0.5));
        assert_eq!(ExprNode::Symbol(3).number(), None);
        assert!(ExprNode::Integer(0).is_number(0.0));
        assert!(!ExprNode::Integer(1).is_number(0.0));
    }

    #[test]
    fn function_names_round_trip() {
        for func in [Func::Sin, Func::Exp, Func::Log10, Func::Abs] {
            assert_eq!(Func::from_name(func.name()), Some(func));
        }
        assert_eq!(Func::from_name("gamma"), None);
    }

    #[test]
    fn handle_is_four_bytes() {
        assert_eq!(std::mem::size_of::<ExprHandle>(), 4);
    }
}
