//! Symbolic differentiation.
//!
//! Standard rules: linearity, product rule, quotient rule, power rule
//! (with the general `f^g` case rewritten through `exp`/`ln`), and the
//! chain rule through every builtin function. Results are built with the
//! arena's folding constructors so the usual 0/1 noise collapses away.

use crate::arena::ExprArena;
use crate::expr::{ExprHandle, ExprNode, Func, SymbolId};

/// Computes `d(expr)/d(var)`, interning the result into the arena.
pub fn diff(arena: &mut ExprArena, expr: ExprHandle, var: SymbolId) -> ExprHandle {
    let node = arena.get(expr).clone();
    match node {
        ExprNode::Integer(_) | ExprNode::Float(_) => arena.integer(0),
        ExprNode::Symbol(id) => arena.integer(i64::from(id == var)),

        ExprNode::Add(args) => {
            let terms: Vec<ExprHandle> = args.iter().map(|&a| diff(arena, a, var)).collect();
            arena.add_folded(terms)
        }

        ExprNode::Mul(args) => {
            // product rule over n factors
            let mut terms = Vec::with_capacity(args.len());
            for i in 0..args.len() {
                let di = diff(arena, args[i], var);
                let mut factors: Vec<ExprHandle> = Vec::with_capacity(args.len());
                for (j, &a) in args.iter().enumerate() {
                    factors.push(if i == j { di } else { a });
                }
                terms.push(arena.mul_folded(factors));
            }
            arena.add_folded(terms)
        }

        ExprNode::Neg(arg) => {
            let d = diff(arena, arg, var);
            arena.neg_folded(d)
        }

        ExprNode::Div { num, den } => {
            let du = diff(arena, num, var);
            let dv = diff(arena, den, var);
            // constant denominator: (u/c)' = u'/c
            if arena.number_of(dv) == Some(0.0) {
                return arena.div_folded(du, den);
            }
            // (u/v)' = (u'v - uv') / v^2
            let lhs = arena.mul_folded([du, den]);
            let rhs = arena.mul_folded([num, dv]);
            let neg_rhs = arena.neg_folded(rhs);
            let numerator = arena.add_folded([lhs, neg_rhs]);
            let two = arena.integer(2);
            let den_sq = arena.pow_folded(den, two);
            arena.div_folded(numerator, den_sq)
        }

        ExprNode::Pow { base, exp } => diff_pow(arena, base, exp, var),

        ExprNode::Function { func, arg } => {
            let outer = func_derivative(arena, func, arg);
            let inner = diff(arena, arg, var);
            arena.mul_folded([outer, inner])
        }
    }
}

fn diff_pow(arena: &mut ExprArena, base: ExprHandle, exp: ExprHandle, var: SymbolId) -> ExprHandle {
    if let Some(c) = arena.number_of(exp) {
        // power rule: (f^c)' = c * f^(c-1) * f'
        let df = diff(arena, base, var);
        let coeff = arena.number(c);
        let new_exp = arena.number(c - 1.0);
        let pow = arena.pow_folded(base, new_exp);
        return arena.mul_folded([coeff, pow, df]);
    }

    // general case: (f^g)' = f^g * (g' * ln(f) + g * f'/f)
    let df = diff(arena, base, var);
    let dg = diff(arena, exp, var);
    let ln_f = arena.func(Func::Ln, base);
    let term1 = arena.mul_folded([dg, ln_f]);
    let df_over_f = arena.div_folded(df, base);
    let term2 = arena.mul_folded([exp, df_over_f]);
    let bracket = arena.add_folded([term1, term2]);
    let f_pow_g = arena.pow(base, exp);
    arena.mul_folded([f_pow_g, bracket])
}

/// The derivative of `func` with respect to its argument, evaluated at `arg`.
fn func_derivative(arena: &mut ExprArena, func: Func, arg: ExprHandle) -> ExprHandle {
    match func {
        Func::Sin => arena.func(Func::Cos, arg),
        Func::Cos => {
            let sin = arena.func(Func::Sin, arg);
            arena.neg_folded(sin)
        }
        Func::Tan => {
            // 1/cos^2
            let cos = arena.func(Func::Cos, arg);
            let two = arena.integer(2);
            let cos_sq = arena.pow(cos, two);
            let one = arena.integer(1);
            arena.div(one, cos_sq)
        }
        Func::Asin | Func::Acos => {
            // ±1/sqrt(1 - x^2)
            let one = arena.integer(1);
            let two = arena.integer(2);
            let sq = arena.pow(arg, two);
            let neg_sq = arena.neg(sq);
            let inside = arena.add(smallvec::smallvec![one, neg_sq]);
            let root = arena.func(Func::Sqrt, inside);
            let d = arena.div(one, root);
            if func == Func::Acos {
                arena.neg_folded(d)
            } else {
                d
            }
        }
        Func::Atan => {
            // 1/(1 + x^2)
            let one = arena.integer(1);
            let two = arena.integer(2);
            let sq = arena.pow(arg, two);
            let inside = arena.add(smallvec::smallvec![one, sq]);
            arena.div(one, inside)
        }
        Func::Sinh => arena.func(Func::Cosh, arg),
        Func::Cosh => arena.func(Func::Sinh, arg),
        Func::Tanh => {
            // 1/cosh^2
            let cosh = arena.func(Func::Cosh, arg);
            let two = arena.integer(2);
            let cosh_sq = arena.pow(cosh, two);
            let one = arena.integer(1);
            arena.div(one, cosh_sq)
        }
        Func::Exp => arena.func(Func::Exp, arg),
        Func::Ln => {
            let one = arena.integer(1);
            arena.div(one, arg)
        }
        Func::Log10 => {
            // 1/(x * ln(10))
            let ten = arena.integer(10);
            let ln10 = arena.func(Func::Ln, ten);
            let den = arena.mul(smallvec::smallvec![arg, ln10]);
            let one = arena.integer(1);
            arena.div(one, den)
        }
        Func::Sqrt => {
            // 1/(2 * sqrt(x))
            let root = arena.func(Func::Sqrt, arg);
            let two = arena.integer(2);
            let den = arena.mul(smallvec::smallvec![two, root]);
            let one = arena.integer(1);
            arena.div(one, den)
        }
        Func::Abs => {
            // x/abs(x); undefined at zero, matching the numeric story
            let abs = arena.func(Func::Abs, arg);
            arena.div(arg, abs)
        }
    }
}
