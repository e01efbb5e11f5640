//! Compilation of expressions into flat evaluation tapes.
//!
//! An expression DAG is flattened once into a postorder instruction tape;
//! evaluation then runs the tape over an explicit value stack with no arena
//! access and no recursion. The variable order fixed at compile time is the
//! positional argument order of [`CompiledExpr::eval`].

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::arena::ExprArena;
use crate::expr::{ExprHandle, ExprNode, Func, SymbolId};

/// Errors surfaced while compiling or evaluating an expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The expression references a variable the caller did not bind.
    #[error("unbound variable '{0}'")]
    UnboundVariable(String),
}

/// One tape instruction. Operands are consumed from the value stack.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Instr {
    /// Push a constant.
    Const(f64),
    /// Push the argument at the given position.
    Load(u32),
    /// Pop `n` values, push their sum.
    Add(u32),
    /// Pop `n` values, push their product.
    Mul(u32),
    /// Pop base and exponent, push `base^exp`.
    Pow,
    /// Negate the top of the stack.
    Neg,
    /// Pop numerator and denominator, push their quotient.
    Div,
    /// Apply a builtin function to the top of the stack.
    Call(Func),
}

/// A compiled expression: a postorder tape plus its argument order.
#[derive(Clone, Debug)]
pub struct CompiledExpr {
    tape: Vec<Instr>,
    vars: Vec<String>,
    max_stack: usize,
}

impl CompiledExpr {
    /// The positional argument order this tape was compiled with.
    #[must_use]
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Evaluates the tape with positional arguments in compile order.
    ///
    /// Division by zero and domain errors follow IEEE-754 semantics
    /// (infinities and NaN propagate; nothing is caught here).
    ///
    /// # Panics
    ///
    /// Panics if `args.len()` differs from `self.vars().len()`.
    pub fn eval<T: num_traits::Float>(&self, args: &[T]) -> T {
        assert_eq!(
            args.len(),
            self.vars.len(),
            "expected {} arguments, got {}",
            self.vars.len(),
            args.len()
        );

        let mut stack: Vec<T> = Vec::with_capacity(self.max_stack);
        for instr in &self.tape {
            match *instr {
                Instr::Const(c) => stack.push(T::from(c).unwrap_or_else(T::nan)),
                Instr::Load(i) => stack.push(args[i as usize]),
                Instr::Add(n) => {
                    let split = stack.len() - n as usize;
                    let sum = stack[split..]
                        .iter()
                        .fold(T::zero(), |acc, &v| acc + v);
                    stack.truncate(split);
                    stack.push(sum);
                }
                Instr::Mul(n) => {
                    let split = stack.len() - n as usize;
                    let product = stack[split..]
                        .iter()
                        .fold(T::one(), |acc, &v| acc * v);
                    stack.truncate(split);
                    stack.push(product);
                }
                Instr::Pow => {
                    let exp = stack.pop().unwrap_or_else(T::nan);
                    let base = stack.pop().unwrap_or_else(T::nan);
                    stack.push(base.powf(exp));
                }
                Instr::Neg => {
                    let v = stack.pop().unwrap_or_else(T::nan);
                    stack.push(-v);
                }
                Instr::Div => {
                    let den = stack.pop().unwrap_or_else(T::nan);
                    let num = stack.pop().unwrap_or_else(T::nan);
                    stack.push(num / den);
                }
                Instr::Call(func) => {
                    let v = stack.pop().unwrap_or_else(T::nan);
                    stack.push(func.apply(v));
                }
            }
        }

        stack.pop().unwrap_or_else(T::nan)
    }

    /// Evaluates with named arguments instead of positional ones.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnboundVariable`] if a compiled-in variable is
    /// missing from `args`.
    pub fn eval_named<T: num_traits::Float>(
        &self,
        args: &FxHashMap<&str, T>,
    ) -> Result<T, EvalError> {
        let mut positional = Vec::with_capacity(self.vars.len());
        for var in &self.vars {
            let value = args
                .get(var.as_str())
                .ok_or_else(|| EvalError::UnboundVariable(var.clone()))?;
            positional.push(*value);
        }
        Ok(self.eval(&positional))
    }
}

/// Compiles an expression against a fixed variable order.
///
/// Every free symbol of `expr` must appear in `vars`; extra names in `vars`
/// are allowed (their argument slots are simply never read), which lets one
/// order serve a whole family of derivatives.
///
/// # Errors
///
/// Returns [`EvalError::UnboundVariable`] if the expression uses a symbol
/// absent from `vars`.
pub fn compile(
    arena: &ExprArena,
    expr: ExprHandle,
    vars: &[String],
) -> Result<CompiledExpr, EvalError> {
    let mut slots: FxHashMap<SymbolId, u32> = FxHashMap::default();
    for (i, name) in vars.iter().enumerate() {
        if let Some(id) = arena.symbol_id(name) {
            #[allow(clippy::cast_possible_truncation)]
            slots.insert(id, i as u32);
        }
    }

    let mut tape = Vec::new();
    emit(arena, expr, &slots, &mut tape)?;

    let max_stack = simulate_stack_depth(&tape);
    Ok(CompiledExpr {
        tape,
        vars: vars.to_vec(),
        max_stack,
    })
}

fn emit(
    arena: &ExprArena,
    expr: ExprHandle,
    slots: &FxHashMap<SymbolId, u32>,
    tape: &mut Vec<Instr>,
) -> Result<(), EvalError> {
    match arena.get(expr) {
        ExprNode::Integer(n) => {
            #[allow(clippy::cast_precision_loss)]
            tape.push(Instr::Const(*n as f64));
        }
        ExprNode::Float(bits) => tape.push(Instr::Const(f64::from_bits(*bits))),
        ExprNode::Symbol(id) => {
            let slot = slots.get(id).copied().ok_or_else(|| {
                EvalError::UnboundVariable(arena.symbol_name(*id).unwrap_or("?").to_string())
            })?;
            tape.push(Instr::Load(slot));
        }
        ExprNode::Add(args) => {
            for &arg in args {
                emit(arena, arg, slots, tape)?;
            }
            #[allow(clippy::cast_possible_truncation)]
            tape.push(Instr::Add(args.len() as u32));
        }
        ExprNode::Mul(args) => {
            for &arg in args {
                emit(arena, arg, slots, tape)?;
            }
            #[allow(clippy::cast_possible_truncation)]
            tape.push(Instr::Mul(args.len() as u32));
        }
        ExprNode::Pow { base, exp } => {
            emit(arena, *base, slots, tape)?;
            emit(arena, *exp, slots, tape)?;
            tape.push(Instr::Pow);
        }
        ExprNode::Neg(arg) => {
            emit(arena, *arg, slots, tape)?;
            tape.push(Instr::Neg);
        }
        ExprNode::Div { num, den } => {
            emit(arena, *num, slots, tape)?;
            emit(arena, *den, slots, tape)?;
            tape.push(Instr::Div);
        }
        ExprNode::Function { func, arg } => {
            emit(arena, *arg, slots, tape)?;
            tape.push(Instr::Call(*func));
        }
    }
    Ok(())
}

/// Computes the peak stack depth of a tape so `eval` can pre-allocate.
fn simulate_stack_depth(tape: &[Instr]) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    for instr in tape {
        match *instr {
            Instr::Const(_) | Instr::Load(_) => depth += 1,
            Instr::Add(n) | Instr::Mul(n) => depth = depth - n as usize + 1,
            Instr::Pow | Instr::Div => depth -= 1,
            Instr::Neg | Instr::Call(_) => {}
        }
        max = max.max(depth);
    }
    max
}
