//! Infix rendering of expressions.
//!
//! Precedence-aware: parentheses are emitted only where re-parsing the
//! output would otherwise change the tree shape.

use crate::arena::ExprArena;
use crate::expr::{ExprHandle, ExprNode};

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_NEG: u8 = 3;
const PREC_POW: u8 = 4;
const PREC_ATOM: u8 = 5;

fn precedence(node: &ExprNode) -> u8 {
    match node {
        ExprNode::Add(_) => PREC_ADD,
        ExprNode::Mul(_) | ExprNode::Div { .. } => PREC_MUL,
        ExprNode::Neg(_) => PREC_NEG,
        ExprNode::Pow { .. } => PREC_POW,
        ExprNode::Integer(n) if *n < 0 => PREC_NEG,
        ExprNode::Float(bits) if f64::from_bits(*bits) < 0.0 => PREC_NEG,
        _ => PREC_ATOM,
    }
}

fn write_child(arena: &ExprArena, out: &mut String, child: ExprHandle, min_prec: u8) {
    let needs_parens = precedence(arena.get(child)) < min_prec;
    if needs_parens {
        out.push('(');
    }
    write_expr(arena, out, child);
    if needs_parens {
        out.push(')');
    }
}

fn write_expr(arena: &ExprArena, out: &mut String, expr: ExprHandle) {
    match arena.get(expr) {
        ExprNode::Integer(n) => out.push_str(&n.to_string()),
        ExprNode::Float(bits) => out.push_str(&f64::from_bits(*bits).to_string()),
        ExprNode::Symbol(id) => out.push_str(arena.symbol_name(*id).unwrap_or("?")),
        ExprNode::Add(args) => {
            for (i, &arg) in args.iter().enumerate() {
                if i == 0 {
                    write_child(arena, out, arg, PREC_ADD);
                } else if let ExprNode::Neg(inner) = arena.get(arg) {
                    out.push_str(" - ");
                    write_child(arena, out, *inner, PREC_MUL);
                } else {
                    out.push_str(" + ");
                    write_child(arena, out, arg, PREC_ADD);
                }
            }
        }
        ExprNode::Mul(args) => {
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push('*');
                }
                write_child(arena, out, arg, PREC_MUL + u8::from(i > 0));
            }
        }
        ExprNode::Div { num, den } => {
            write_child(arena, out, *num, PREC_MUL);
            out.push('/');
            write_child(arena, out, *den, PREC_MUL + 1);
        }
        ExprNode::Neg(arg) => {
            out.push('-');
            write_child(arena, out, *arg, PREC_NEG + 1);
        }
        ExprNode::Pow { base, exp } => {
            write_child(arena, out, *base, PREC_POW + 1);
            out.push('^');
            write_child(arena, out, *exp, PREC_POW);
        }
        ExprNode::Function { func, arg } => {
            out.push_str(func.name());
            out.push('(');
            write_expr(arena, out, *arg);
            out.push(')');
        }
    }
}

/// Renders an expression as infix source text.
#[must_use]
pub fn render(arena: &ExprArena, expr: ExprHandle) -> String {
    let mut out = String::new();
    write_expr(arena, &mut out, expr);
    out
}
