//! Two-level derivative cache.
//!
//! Level one maps a variable name to its compiled partial derivative and
//! lives for the quantity's lifetime (derivatives of a fixed expression are
//! time-invariant). Level two is a small move-to-front LRU keyed by the
//! exact ordered tuple of names requested in one batch, so repeated calls
//! with the same error-bearing variable set skip even the map assembly.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use secundus_core::{compile, diff, CompiledExpr, ExprArena, ExprHandle};

use crate::error::Error;

/// Capacity of the batch LRU.
const BATCH_CAPACITY: usize = 32;

/// A batch of compiled partial derivatives, keyed by variable name.
pub(crate) type DerivativeBatch = FxHashMap<String, Arc<CompiledExpr>>;

/// Per-quantity derivative cache. Mutated lazily; access is synchronized by
/// the owning quantity's lock.
#[derive(Debug, Default)]
pub(crate) struct DerivativeCache {
    per_var: FxHashMap<String, Arc<CompiledExpr>>,
    /// Most recently used batch first.
    batches: Vec<(Vec<String>, DerivativeBatch)>,
}

impl DerivativeCache {
    /// Returns the compiled `d(expr)/d(name)`, creating and memoizing it on
    /// first use. New derivative nodes are interned into `arena`; the tape
    /// is compiled against `order`, the quantity's full argument order.
    pub(crate) fn derivative(
        &mut self,
        arena: &mut ExprArena,
        expr: ExprHandle,
        name: &str,
        order: &[String],
    ) -> Result<Arc<CompiledExpr>, Error> {
        if let Some(compiled) = self.per_var.get(name) {
            return Ok(Arc::clone(compiled));
        }

        let symbol = arena.intern_symbol(name);
        let derived = diff(arena, expr, symbol);
        let compiled = Arc::new(compile(arena, derived, order)?);
        self.per_var.insert(name.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Returns the derivative batch for an ordered tuple of names.
    pub(crate) fn batch(
        &mut self,
        arena: &mut ExprArena,
        expr: ExprHandle,
        names: &[String],
        order: &[String],
    ) -> Result<DerivativeBatch, Error> {
        if let Some(pos) = self.batches.iter().position(|(key, _)| key == names) {
            let entry = self.batches.remove(pos);
            self.batches.insert(0, entry);
            return Ok(self.batches[0].1.clone());
        }

        let mut batch = DerivativeBatch::default();
        for name in names {
            let compiled = self.derivative(arena, expr, name, order)?;
            batch.insert(name.clone(), compiled);
        }

        self.batches.insert(0, (names.to_vec(), batch.clone()));
        self.batches.truncate(BATCH_CAPACITY);
        Ok(batch)
    }

    #[cfg(test)]
    pub(crate) fn cached_variables(&self) -> usize {
        self.per_var.len()
    }

    #[cfg(test)]
    pub(crate) fn cached_batches(&self) -> usize {
        self.batches.len()
    }
}
