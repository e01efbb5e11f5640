//! Quadrature combination of error contributions.
//!
//! First-order Gaussian propagation for independent inputs:
//! `σ_f = sqrt(Σ (∂f/∂v · σ_v)²)` over the error-bearing variables.
//! Components with zero (or negative) magnitude are excluded from the sum:
//! a declared-but-zero uncertainty contributes nothing and is not treated
//! as unknown.

use num_traits::Float;

use crate::binding::{Binding, Value};
use crate::cache::DerivativeBatch;

/// One error column: for each contributing variable, its argument-order
/// index into the scoped bindings and the uncertainty slot.
pub(crate) struct ErrorColumn<'a, T> {
    pub(crate) entries: Vec<(usize, &'a Value<T>)>,
}

/// Splits the scoped bindings into error columns.
///
/// The number of columns is the maximum component count over all bindings;
/// column `k` collects, from every binding with more than `k` components,
/// its `k`-th error slot.
pub(crate) fn error_columns<'a, T: Copy>(
    scoped: &[(&'a str, &'a Binding<T>)],
) -> Vec<ErrorColumn<'a, T>> {
    let columns = scoped
        .iter()
        .map(|(_, binding)| binding.errors.len())
        .max()
        .unwrap_or(0);

    (0..columns)
        .map(|k| ErrorColumn {
            entries: scoped
                .iter()
                .enumerate()
                .filter_map(|(i, (_, binding))| binding.errors.get(k).map(|slot| (i, slot)))
                .collect(),
        })
        .collect()
}

/// Combines one column's contributions at a single sample point.
///
/// `values` holds the central values in the quantity's argument order and
/// is what the cached derivative tapes are evaluated against. `errors`
/// pairs each contributing variable name with its scalar magnitude at this
/// sample.
pub(crate) fn quadrature<T: Float>(
    derivatives: &DerivativeBatch,
    values: &[T],
    errors: &[(&str, T)],
) -> T {
    let mut sum = T::zero();
    for (name, magnitude) in errors {
        if *magnitude <= T::zero() {
            continue;
        }
        if let Some(derivative) = derivatives.get(*name) {
            let term = derivative.eval(values) * *magnitude;
            sum = sum + term * term;
        }
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Bindings;
    use crate::cache::DerivativeCache;
    use secundus_core::{parse, ExprArena};

    fn batch_for(expr_src: &str, names: &[&str]) -> DerivativeBatch {
        let mut arena = ExprArena::new();
        let expr = parse(&mut arena, expr_src).unwrap();
        let order: Vec<String> = secundus_core::free_symbol_names(&arena, expr)
            .into_iter()
            .collect();
        let names: Vec<String> = names.iter().map(|n| (*n).to_string()).collect();
        DerivativeCache::default()
            .batch(&mut arena, expr, &names, &order)
            .unwrap()
    }

    #[test]
    fn textbook_product_formula() {
        // f = a*b + c at a0=2, b0=3, c0=5
        let batch = batch_for("a*b + c", &["a", "b", "c"]);
        let values = [2.0, 3.0, 5.0]; // sorted order a, b, c
        let errors = [("a", 0.1), ("b", 0.2), ("c", 0.3)];
        let expected = ((0.1f64 * 3.0).powi(2) + (0.2 * 2.0).powi(2) + 0.3f64.powi(2)).sqrt();
        assert!((quadrature(&batch, &values, &errors) - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_magnitudes_are_excluded() {
        let batch = batch_for("a*b + c", &["a", "b", "c"]);
        let values = [1.0, 1.0, 1.0];
        let errors = [("a", 0.0), ("b", 0.0), ("c", 5.0)];
        assert_eq!(quadrature(&batch, &values, &errors), 5.0);
    }

    #[test]
    fn missing_derivative_contributes_nothing() {
        let batch = batch_for("a*b + c", &["a"]);
        let values = [1.0, 1.0, 1.0];
        let errors = [("a", 2.0), ("c", 3.0)];
        // only a's derivative is in the batch
        assert_eq!(quadrature(&batch, &values, &errors), 2.0);
    }

    #[test]
    fn columns_follow_component_counts() {
        let bindings: Bindings<f64> = crate::bindings! {
            a => (1.0, 0.1, 0.2),
            b => (2.0, 0.3),
            c => 3.0,
        };
        let scoped: Vec<(&str, &crate::binding::Binding<f64>)> = bindings.iter().collect();
        let columns = error_columns(&scoped);

        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].entries.len(), 2); // a and b
        assert_eq!(columns[1].entries.len(), 1); // a only
        assert_eq!(columns[1].entries[0].0, 0);
    }

    #[test]
    fn no_errors_means_no_columns() {
        let bindings: Bindings<f64> = crate::bindings! { a => 1.0, b => 2.0 };
        let scoped: Vec<(&str, &crate::binding::Binding<f64>)> = bindings.iter().collect();
        assert!(error_columns(&scoped).is_empty());
    }
}
