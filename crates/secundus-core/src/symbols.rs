//! Free-symbol extraction.
//!
//! A single iterative walk over the hash-consed DAG. Shared subexpressions
//! are visited once thanks to the visited set over handles.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::arena::ExprArena;
use crate::expr::{ExprHandle, ExprNode, SymbolId};

/// Returns the set of symbol IDs the expression depends on.
#[must_use]
pub fn free_symbols(arena: &ExprArena, expr: ExprHandle) -> FxHashSet<SymbolId> {
    let mut found = FxHashSet::default();
    let mut visited: FxHashSet<ExprHandle> = FxHashSet::default();
    let mut stack = vec![expr];

    while let Some(handle) = stack.pop() {
        if !visited.insert(handle) {
            continue;
        }
        let node = arena.get(handle);
        if let ExprNode::Symbol(id) = node {
            found.insert(*id);
        } else {
            stack.extend(node.children());
        }
    }

    found
}

/// Returns the free variable names in sorted order.
///
/// The sorted order doubles as the canonical argument order when the
/// expression is compiled.
#[must_use]
pub fn free_symbol_names(arena: &ExprArena, expr: ExprHandle) -> BTreeSet<String> {
    free_symbols(arena, expr)
        .into_iter()
        .filter_map(|id| arena.symbol_name(id).map(str::to_string))
        .collect()
}
