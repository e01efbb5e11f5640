//! The quantity facade.
//!
//! A [`Quantity`] is the long-lived unit of the engine: a parsed formula,
//! its free-variable set, optional dependency quantities and defaults, and
//! the lazily populated derivative caches. Evaluation runs:
//!
//! 1. dependency resolution (declaration order, recursing through shared
//!    sub-quantities)
//! 2. default injection
//! 3. completeness check over the free-variable set
//! 4. scalar/series classification and central-value computation
//! 5. per-column quadrature of error contributions
//!
//! Dependency graphs must be acyclic; a cycle is a contract violation and
//! recurses without bound.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use num_traits::Float;
use parking_lot::Mutex;

use secundus_core::{
    compile, diff, free_symbol_names, parse, render, CompiledExpr, ExprArena, ExprHandle, Func,
};

use crate::binding::{Binding, Bindings, Value};
use crate::cache::DerivativeCache;
use crate::error::Error;
use crate::propagate::{error_columns, quadrature};

/// The free-variable tree of a quantity: each name maps to the recursively
/// expanded tree of the dependency bound to it (empty for leaves).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTree(pub BTreeMap<String, SymbolTree>);

impl SymbolTree {
    /// Returns true if this node has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The result of evaluating a quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation<T> {
    /// The central value, scalar or per-sample.
    pub central: Value<T>,
    /// One combined error per uncertainty column, shaped like the inputs.
    pub errors: Vec<Value<T>>,
    /// Full results for every dependency that was computed rather than
    /// supplied directly. Empty when nothing was resolved.
    pub dependencies: BTreeMap<String, Evaluation<T>>,
}

impl<T: Copy> Evaluation<T> {
    /// The central value if it is a scalar.
    #[must_use]
    pub fn scalar(&self) -> Option<T> {
        match self.central {
            Value::Scalar(v) => Some(v),
            Value::Series(_) => None,
        }
    }

    /// The central values if they are a series.
    #[must_use]
    pub fn series(&self) -> Option<&[T]> {
        match &self.central {
            Value::Scalar(_) => None,
            Value::Series(values) => Some(values),
        }
    }

    /// The first (usually only) combined error column.
    #[must_use]
    pub fn error(&self) -> Option<&Value<T>> {
        self.errors.first()
    }

    /// Repackages this result as a binding, so a parent quantity can
    /// substitute it for one of its own variables. The combined errors
    /// become the binding's error components.
    #[must_use]
    pub fn to_binding(&self) -> Binding<T> {
        Binding {
            central: self.central.clone(),
            errors: self.errors.iter().cloned().collect(),
        }
    }
}

/// Mutable state shared by evaluation paths: the arena grows when new
/// derivatives are interned, and both derivative caches fill lazily.
#[derive(Debug)]
struct CacheState {
    arena: ExprArena,
    derivatives: DerivativeCache,
}

/// A derived quantity: a formula over measured variables, with optional
/// dependency quantities and default bindings.
///
/// Immutable after construction except for its caches, which grow
/// monotonically and are guarded by a lock, so a `Quantity` can be shared
/// across threads behind an [`Arc`].
#[derive(Debug)]
pub struct Quantity<T: Float = f64> {
    source: String,
    expr: ExprHandle,
    /// Sorted free-variable names; doubles as the positional argument
    /// order of every compiled tape.
    order: Vec<String>,
    symbols: BTreeSet<String>,
    dependencies: Vec<(String, Arc<Quantity<T>>)>,
    defaults: Vec<(String, Binding<T>)>,
    compiled: CompiledExpr,
    caches: Mutex<CacheState>,
}

/// Builder for quantities with dependencies or defaults.
#[derive(Debug)]
pub struct QuantityBuilder<T: Float = f64> {
    source: String,
    dependencies: Vec<(String, Arc<Quantity<T>>)>,
    defaults: Vec<(String, Binding<T>)>,
}

impl<T: Float> QuantityBuilder<T> {
    /// Declares `name` as computed by `quantity` when not bound directly.
    ///
    /// Declaration order is resolution order. Dependencies whose names do
    /// not occur in the expression are dropped at build time.
    #[must_use]
    pub fn dependency(mut self, name: impl Into<String>, quantity: &Arc<Quantity<T>>) -> Self {
        self.dependencies.push((name.into(), Arc::clone(quantity)));
        self
    }

    /// Sets a default binding for `name`, used when the caller supplies
    /// nothing and no dependency resolves it. Defaults may carry errors.
    #[must_use]
    pub fn default_value(mut self, name: impl Into<String>, binding: impl Into<Binding<T>>) -> Self {
        self.defaults.push((name.into(), binding.into()));
        self
    }

    /// Parses the expression and assembles the quantity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the expression is malformed. This is the
    /// only way construction can fail.
    pub fn build(self) -> Result<Quantity<T>, Error> {
        let mut arena = ExprArena::new();
        let expr = parse(&mut arena, &self.source)?;
        let symbols = free_symbol_names(&arena, expr);
        let order: Vec<String> = symbols.iter().cloned().collect();
        let compiled = compile(&arena, expr, &order)?;

        let dependencies = self
            .dependencies
            .into_iter()
            .filter(|(name, _)| symbols.contains(name))
            .collect();

        Ok(Quantity {
            source: self.source,
            expr,
            order,
            symbols,
            dependencies,
            defaults: self.defaults,
            compiled,
            caches: Mutex::new(CacheState {
                arena,
                derivatives: DerivativeCache::default(),
            }),
        })
    }
}

impl<T: Float> Quantity<T> {
    /// Starts building a quantity from an expression.
    #[must_use]
    pub fn builder(expression: impl Into<String>) -> QuantityBuilder<T> {
        QuantityBuilder {
            source: expression.into(),
            dependencies: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Parses a plain quantity with no dependencies or defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the expression is malformed.
    pub fn parse(expression: impl Into<String>) -> Result<Self, Error> {
        Self::builder(expression).build()
    }

    /// The source expression this quantity was built from.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.source
    }

    /// The free-variable tree: every variable name mapped to the tree of
    /// the dependency bound to it, empty for leaves.
    #[must_use]
    pub fn free_symbols(&self) -> SymbolTree {
        SymbolTree(
            self.symbols
                .iter()
                .map(|name| {
                    let subtree = self
                        .dependencies
                        .iter()
                        .find(|(dep_name, _)| dep_name == name)
                        .map_or_else(SymbolTree::default, |(_, dep)| dep.free_symbols());
                    (name.clone(), subtree)
                })
                .collect(),
        )
    }

    /// Renders the symbolic propagation formula
    /// `sqrt(Σ (∂f/∂v · Delta_v)²)` over the named variables, for lab
    /// reports and documentation. Purely symbolic, nothing is evaluated.
    #[must_use]
    pub fn error_formula(&self, variables: &[&str]) -> String {
        let mut caches = self.caches.lock();
        let arena = &mut caches.arena;

        let mut terms = Vec::with_capacity(variables.len());
        for name in variables {
            let symbol = arena.intern_symbol(name);
            let derivative = diff(arena, self.expr, symbol);
            let delta = arena.symbol(&format!("Delta_{name}"));
            let product = arena.mul_folded([derivative, delta]);
            let two = arena.integer(2);
            terms.push(arena.pow_folded(product, two));
        }
        let sum = arena.add_folded(terms);
        let root = arena.func(Func::Sqrt, sum);
        render(arena, root)
    }

    /// Evaluates the quantity against the given bindings.
    ///
    /// Bindings for names outside the free-variable set are ignored by this
    /// quantity but passed through to dependencies, which may consume them.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingSymbols`] if, after dependency resolution and
    ///   default injection, free variables remain unbound.
    /// - [`Error::LengthMismatch`] if two series disagree on sample count.
    pub fn eval(&self, bindings: &Bindings<T>) -> Result<Evaluation<T>, Error> {
        let mut bound = bindings.clone();
        let mut dependencies = BTreeMap::new();

        // 1. dependency resolution; a direct binding wins and the
        //    dependency is never invoked
        for (name, dep) in &self.dependencies {
            if bound.contains(name) {
                continue;
            }
            let result = dep.eval(&bound)?;
            bound.insert(name.clone(), result.to_binding());
            dependencies.insert(name.clone(), result);
        }

        // 2. default injection, never overriding
        for (name, default) in &self.defaults {
            if !bound.contains(name) {
                bound.insert(name.clone(), default.clone());
            }
        }

        // 3. completeness check and scope filter, in argument order
        let mut missing = BTreeSet::new();
        let mut scoped: Vec<(&str, &Binding<T>)> = Vec::with_capacity(self.order.len());
        for name in &self.order {
            match bound.get(name) {
                Some(binding) => scoped.push((name.as_str(), binding)),
                None => {
                    missing.insert(name.clone());
                }
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingSymbols(missing));
        }

        // 4. shared sample count over every series slot (strict policy)
        let samples = common_sample_count(&scoped)?;
        let central_is_series = scoped.iter().any(|(_, binding)| binding.central.is_series());

        let central = match if central_is_series { samples } else { None } {
            Some(count) => {
                let mut out = Vec::with_capacity(count);
                let mut row = vec![T::zero(); scoped.len()];
                for index in 0..count {
                    fill_row(&mut row, &scoped, index);
                    out.push(self.compiled.eval(&row));
                }
                Value::Series(out)
            }
            None => {
                let mut row = vec![T::zero(); scoped.len()];
                fill_row(&mut row, &scoped, 0);
                Value::Scalar(self.compiled.eval(&row))
            }
        };

        // 5. error propagation, one combined error per column
        let columns = error_columns(&scoped);
        if columns.is_empty() {
            return Ok(Evaluation {
                central,
                errors: Vec::new(),
                dependencies,
            });
        }

        let mut caches = self.caches.lock();
        let CacheState { arena, derivatives } = &mut *caches;

        // the first column's variable set keys the batch cache; later
        // columns fetch any extra derivatives on demand
        let first_names: Vec<String> = columns[0]
            .entries
            .iter()
            .map(|(index, _)| self.order[*index].clone())
            .collect();
        let mut batch = derivatives.batch(arena, self.expr, &first_names, &self.order)?;

        let mut combined = Vec::with_capacity(columns.len());
        for column in &columns {
            for (index, _) in &column.entries {
                let name = &self.order[*index];
                if !batch.contains_key(name) {
                    let compiled = derivatives.derivative(arena, self.expr, name, &self.order)?;
                    batch.insert(name.clone(), compiled);
                }
            }

            let column_is_series = central_is_series
                || column.entries.iter().any(|(_, slot)| slot.is_series());

            let value = match if column_is_series { samples } else { None } {
                Some(count) => {
                    let mut out = Vec::with_capacity(count);
                    let mut row = vec![T::zero(); scoped.len()];
                    for sample in 0..count {
                        fill_row(&mut row, &scoped, sample);
                        let errors: Vec<(&str, T)> = column
                            .entries
                            .iter()
                            .map(|(index, slot)| (scoped[*index].0, slot.at(sample)))
                            .collect();
                        out.push(quadrature(&batch, &row, &errors));
                    }
                    Value::Series(out)
                }
                None => {
                    let mut row = vec![T::zero(); scoped.len()];
                    fill_row(&mut row, &scoped, 0);
                    let errors: Vec<(&str, T)> = column
                        .entries
                        .iter()
                        .map(|(index, slot)| (scoped[*index].0, slot.at(0)))
                        .collect();
                    Value::Scalar(quadrature(&batch, &row, &errors))
                }
            };
            combined.push(value);
        }

        Ok(Evaluation {
            central,
            errors: combined,
            dependencies,
        })
    }
}

impl<T: Float> fmt::Display for Quantity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Fills `row` with each scoped binding's central value at `index`.
fn fill_row<T: Float>(row: &mut [T], scoped: &[(&str, &Binding<T>)], index: usize) {
    for (slot, (_, binding)) in row.iter_mut().zip(scoped) {
        *slot = binding.central.at(index);
    }
}

/// Validates that every series slot shares one sample count and returns it,
/// or `None` when everything is scalar.
fn common_sample_count<T: Copy>(scoped: &[(&str, &Binding<T>)]) -> Result<Option<usize>, Error> {
    let mut samples: Option<usize> = None;
    for (name, binding) in scoped {
        for slot in binding.slots() {
            if let Some(len) = slot.len() {
                match samples {
                    None => samples = Some(len),
                    Some(expected) if expected != len => {
                        return Err(Error::LengthMismatch {
                            name: (*name).to_string(),
                            expected,
                            found: len,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn scalar_evaluation_matches_direct_arithmetic() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let result = x.eval(&bindings! { a => 1.2, b => 7.9, c => 10.0 }).unwrap();
        assert_eq!(result.scalar(), Some(1.2 * 7.9 + 10.0));
        assert!(result.errors.is_empty());
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn quadrature_formula_for_product_plus_term() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let (a0, sa) = (1.7, 0.2);
        let (b0, sb) = (2.9, 0.3);
        let (c0, sc) = (4.1, 0.5);
        let result = x
            .eval(&bindings! { a => (a0, sa), b => (b0, sb), c => (c0, sc) })
            .unwrap();

        let expected = ((sa * b0).powi(2) + (sb * a0).powi(2) + sc.powi(2)).sqrt();
        assert_eq!(result.scalar(), Some(a0 * b0 + c0));
        assert_eq!(result.errors.len(), 1);
        match result.error().unwrap() {
            Value::Scalar(err) => assert!(close(*err, expected)),
            Value::Series(_) => panic!("expected scalar error"),
        }
    }

    #[test]
    fn zero_uncertainty_components_are_excluded_not_missing() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let result = x
            .eval(&bindings! { a => (1.0, 0.0), b => (1.0, 0.0), c => (1.0, 5.0) })
            .unwrap();
        assert_eq!(result.error(), Some(&Value::Scalar(5.0)));
    }

    #[test]
    fn missing_symbols_carries_the_difference() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let err = x.eval(&bindings! { u => 1.0 }).unwrap_err();
        let expected: BTreeSet<String> =
            ["a", "b", "c"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(err, Error::MissingSymbols(expected));
    }

    #[test]
    fn extra_bindings_are_silently_discarded() {
        let x: Quantity = Quantity::parse("a + b").unwrap();
        let result = x
            .eval(&bindings! { a => 1.0, b => 2.0, unrelated => 99.0 })
            .unwrap();
        assert_eq!(result.scalar(), Some(3.0));
    }

    #[test]
    fn free_symbols_on_a_leaf() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let tree = x.free_symbols();
        let names: Vec<&String> = tree.0.keys().collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(tree.0.values().all(SymbolTree::is_empty));
    }

    #[test]
    fn dependency_chaining_produces_value_and_report() {
        let x = Arc::new(Quantity::parse("b").unwrap());
        let y: Quantity = Quantity::builder("a + x").dependency("x", &x).build().unwrap();

        let result = y.eval(&bindings! { a => 1.0, b => 2.0 }).unwrap();
        assert_eq!(result.scalar(), Some(3.0));
        assert_eq!(result.dependencies.len(), 1);
        assert_eq!(result.dependencies["x"].scalar(), Some(2.0));
        assert!(result.dependencies["x"].errors.is_empty());
    }

    #[test]
    fn dependency_uncertainty_propagates_through_the_parent() {
        let x = Arc::new(Quantity::parse("b").unwrap());
        let y: Quantity = Quantity::builder("a + x").dependency("x", &x).build().unwrap();

        let (a0, sa) = (0.4, 0.05);
        let (b0, sb) = (1.9, 0.3);
        let result = y
            .eval(&bindings! { a => (a0, sa), b => (b0, sb) })
            .unwrap();

        assert_eq!(result.scalar(), Some(a0 + b0));
        // dy = sqrt(sa^2 + sb^2): x's own error re-enters via d(a + x)/dx = 1
        match result.error().unwrap() {
            Value::Scalar(err) => assert!(close(*err, (sa * sa + sb * sb).sqrt())),
            Value::Series(_) => panic!("expected scalar error"),
        }
        // the report carries x's full result
        let dep = &result.dependencies["x"];
        assert_eq!(dep.scalar(), Some(b0));
        assert_eq!(dep.error(), Some(&Value::Scalar(sb)));
    }

    #[test]
    fn direct_binding_wins_over_dependency() {
        let x = Arc::new(Quantity::parse("b").unwrap());
        let y: Quantity = Quantity::builder("a + x").dependency("x", &x).build().unwrap();

        let result = y.eval(&bindings! { a => 1.0, x => 1.0 }).unwrap();
        assert_eq!(result.scalar(), Some(2.0));
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn undeclared_dependency_names_are_dropped_at_build() {
        let unused = Arc::new(Quantity::parse("q").unwrap());
        let y: Quantity = Quantity::builder("a + b")
            .dependency("zz", &unused)
            .build()
            .unwrap();
        let result = y.eval(&bindings! { a => 1.0, b => 1.0 }).unwrap();
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn nested_dependencies_resolve_recursively() {
        let inner = Arc::new(Quantity::parse("c").unwrap());
        let middle = Arc::new(
            Quantity::builder("2*m").dependency("m", &inner).build().unwrap(),
        );
        // middle = 2*m with m = c; outer = middle + 1
        let outer: Quantity = Quantity::builder("mid + 1")
            .dependency("mid", &middle)
            .build()
            .unwrap();

        // `mid` depends on `m`, but middle's expression uses `m`, which is
        // resolved from `c` through inner
        let result = outer.eval(&bindings! { c => 3.0 }).unwrap();
        assert_eq!(result.scalar(), Some(7.0));
        let mid = &result.dependencies["mid"];
        assert_eq!(mid.scalar(), Some(6.0));
        assert_eq!(mid.dependencies["m"].scalar(), Some(3.0));
    }

    #[test]
    fn free_symbols_expands_dependencies() {
        let x = Arc::new(Quantity::parse("b").unwrap());
        let y: Quantity = Quantity::builder("a + x").dependency("x", &x).build().unwrap();

        let tree = y.free_symbols();
        assert!(tree.0["a"].is_empty());
        assert_eq!(tree.0["x"].0.len(), 1);
        assert!(tree.0["x"].0["b"].is_empty());
    }

    #[test]
    fn defaults_fill_missing_bindings_with_their_errors() {
        let y: Quantity = Quantity::builder("a + b")
            .default_value("a", (1.0, 2.0))
            .build()
            .unwrap();

        let result = y.eval(&bindings! { b => 1.0 }).unwrap();
        assert_eq!(result.scalar(), Some(2.0));
        assert_eq!(result.error(), Some(&Value::Scalar(2.0)));
    }

    #[test]
    fn defaults_never_override_explicit_bindings() {
        let y: Quantity = Quantity::builder("a + b")
            .default_value("a", (1.0, 2.0))
            .build()
            .unwrap();

        let result = y.eval(&bindings! { a => 5.0, b => 1.0 }).unwrap();
        assert_eq!(result.scalar(), Some(6.0));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn series_central_values_evaluate_per_sample() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let result = x
            .eval(&bindings! { a => vec![1.0, 2.0, 3.0], b => 2.0, c => 10.0 })
            .unwrap();
        assert_eq!(result.series(), Some(&[12.0, 14.0, 16.0][..]));
    }

    #[test]
    fn series_errors_evaluate_per_sample() {
        let x: Quantity = Quantity::parse("a*b").unwrap();
        let result = x
            .eval(&bindings! {
                a => (vec![1.0, 2.0], vec![0.1, 0.2]),
                b => (3.0, 0.0),
            })
            .unwrap();

        assert_eq!(result.series(), Some(&[3.0, 6.0][..]));
        match result.error().unwrap() {
            Value::Series(errors) => {
                // b's error is zero, so only a contributes: |da*b|
                assert!(close(errors[0], 0.3));
                assert!(close(errors[1], 0.6));
            }
            Value::Scalar(_) => panic!("expected per-sample errors"),
        }
    }

    #[test]
    fn scalar_central_with_series_error_keeps_central_scalar() {
        let x: Quantity = Quantity::parse("a + b").unwrap();
        let result = x
            .eval(&bindings! {
                a => Binding::with_errors(
                    Value::Scalar(1.0),
                    [Value::Series(vec![0.1, 0.2])],
                ),
                b => 2.0,
            })
            .unwrap();

        assert_eq!(result.scalar(), Some(3.0));
        assert_eq!(
            result.error(),
            Some(&Value::Series(vec![0.1, 0.2]))
        );
    }

    #[test]
    fn ragged_series_lengths_are_rejected() {
        let x: Quantity = Quantity::parse("a + b").unwrap();
        let err = x
            .eval(&bindings! { a => vec![1.0, 2.0], b => vec![1.0, 2.0, 3.0] })
            .unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                name: "b".to_string(),
                expected: 2,
                found: 3,
            }
        );
    }

    #[test]
    fn multiple_error_columns_combine_independently() {
        let x: Quantity = Quantity::parse("a + b").unwrap();
        let result = x
            .eval(&bindings! { a => (1.0, 0.3, 0.7), b => (2.0, 0.4) })
            .unwrap();

        assert_eq!(result.scalar(), Some(3.0));
        assert_eq!(result.errors.len(), 2);
        match (&result.errors[0], &result.errors[1]) {
            (Value::Scalar(stat), Value::Scalar(sys)) => {
                assert!(close(*stat, (0.3f64.powi(2) + 0.4f64.powi(2)).sqrt()));
                // b has no second component and does not contribute
                assert!(close(*sys, 0.7));
            }
            _ => panic!("expected scalar errors"),
        }
    }

    #[test]
    fn zero_first_column_magnitudes_still_get_derivatives() {
        // a's first-column magnitude is zero; its derivative is still in
        // the batch and ready when column two needs it
        let x: Quantity = Quantity::parse("a*b").unwrap();
        let result = x
            .eval(&bindings! { a => (2.0, 0.0, 0.5), b => (3.0, 0.1) })
            .unwrap();

        assert_eq!(result.errors.len(), 2);
        match (&result.errors[0], &result.errors[1]) {
            (Value::Scalar(first), Value::Scalar(second)) => {
                // column 1: only b contributes (a's magnitude is zero)
                assert!(close(*first, 0.2));
                // column 2: only a has a component; d/da = b = 3
                assert!(close(*second, 1.5));
            }
            _ => panic!("expected scalar errors"),
        }
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let x: Quantity = Quantity::parse("sqrt(a^2 + b^2)").unwrap();
        let input = bindings! { a => (3.0, 0.1), b => (4.0, 0.2) };
        let first = x.eval(&input).unwrap();
        let second = x.eval(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn error_formula_renders_the_propagation_expression() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let formula = x.error_formula(&["a", "b", "c"]);
        assert_eq!(
            formula,
            "sqrt((b*Delta_a)^2 + (a*Delta_b)^2 + Delta_c^2)"
        );
    }

    #[test]
    fn error_formula_drops_vanishing_terms() {
        let x: Quantity = Quantity::parse("a + b").unwrap();
        assert_eq!(x.error_formula(&["q"]), "sqrt(0)");
        assert_eq!(x.error_formula(&["a"]), "sqrt(Delta_a^2)");
    }

    #[test]
    fn construction_rejects_malformed_expressions() {
        let result: Result<Quantity, Error> = Quantity::parse("a + * b");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn display_shows_the_source_expression() {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        assert_eq!(x.to_string(), "a*b + c");
        assert_eq!(x.expression(), "a*b + c");
    }

    #[test]
    fn works_with_f32_output() {
        let x: Quantity<f32> = Quantity::parse("a*b").unwrap();
        let result = x.eval(&bindings! { a => 2.0f32, b => 4.0f32 }).unwrap();
        assert_eq!(result.scalar(), Some(8.0f32));
    }

    #[test]
    fn quantities_are_shareable_across_threads() {
        let x = Arc::new(Quantity::parse("a*b + c").unwrap());
        let mut handles = Vec::new();
        for i in 0..4 {
            let x = Arc::clone(&x);
            handles.push(std::thread::spawn(move || {
                let v = f64::from(i);
                x.eval(&bindings! { a => (v, 0.1), b => (2.0, 0.2), c => 1.0 })
                    .unwrap()
                    .scalar()
                    .unwrap()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let expected = (i as f64) * 2.0 + 1.0;
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
