//! Property-based tests for the propagation engine.

use std::sync::Arc;

use proptest::prelude::*;

use crate::{bindings, Quantity, Value};

// Strategy for central values away from zero denominators
fn central() -> impl Strategy<Value = f64> {
    0.1f64..10.0
}

// Strategy for uncertainty magnitudes, including exact zero
fn magnitude() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.001f64..1.0]
}

fn scalar(result: &crate::Evaluation<f64>) -> f64 {
    result.scalar().expect("scalar result")
}

fn scalar_error(result: &crate::Evaluation<f64>) -> f64 {
    match result.error().expect("error column") {
        Value::Scalar(err) => *err,
        Value::Series(_) => panic!("expected scalar error"),
    }
}

proptest! {
    #[test]
    fn central_value_matches_direct_arithmetic(
        a in central(), b in central(), c in central()
    ) {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let result = x.eval(&bindings! { a => a, b => b, c => c }).unwrap();
        prop_assert_eq!(scalar(&result), a * b + c);
    }

    #[test]
    fn quadrature_matches_the_closed_form(
        a in central(), b in central(), c in central(),
        sa in magnitude(), sb in magnitude(), sc in magnitude()
    ) {
        let x: Quantity = Quantity::parse("a*b + c").unwrap();
        let result = x
            .eval(&bindings! { a => (a, sa), b => (b, sb), c => (c, sc) })
            .unwrap();

        let expected = ((sa * b).powi(2) + (sb * a).powi(2) + sc.powi(2)).sqrt();
        prop_assert!((scalar_error(&result) - expected).abs() < 1e-12);
        prop_assert_eq!(scalar(&result), a * b + c);
    }

    #[test]
    fn dependency_chain_matches_flat_quadrature(
        a in central(), b in central(),
        sa in magnitude(), sb in magnitude()
    ) {
        // y = a + x with x = b: same numbers as evaluating a + b directly
        let x = Arc::new(Quantity::parse("b").unwrap());
        let y: Quantity = Quantity::builder("a + x").dependency("x", &x).build().unwrap();
        let chained = y.eval(&bindings! { a => (a, sa), b => (b, sb) }).unwrap();

        let flat: Quantity = Quantity::parse("a + b").unwrap();
        let direct = flat.eval(&bindings! { a => (a, sa), b => (b, sb) }).unwrap();

        prop_assert_eq!(scalar(&chained), scalar(&direct));
        prop_assert!((scalar_error(&chained) - scalar_error(&direct)).abs() < 1e-12);
    }

    #[test]
    fn series_evaluation_agrees_with_scalar_evaluation(
        samples in prop::collection::vec(central(), 1..8),
        b in central(), sb in magnitude()
    ) {
        let x: Quantity = Quantity::parse("a*b").unwrap();
        let vectorized = x
            .eval(&bindings! { a => samples.clone(), b => (b, sb) })
            .unwrap();

        let series = vectorized.series().expect("series result").to_vec();
        prop_assert_eq!(series.len(), samples.len());

        for (i, &a) in samples.iter().enumerate() {
            let single = x.eval(&bindings! { a => a, b => (b, sb) }).unwrap();
            prop_assert_eq!(series[i], scalar(&single));
            match vectorized.error().expect("error column") {
                Value::Series(errors) => {
                    prop_assert_eq!(errors[i], scalar_error(&single));
                }
                Value::Scalar(_) => prop_assert!(false, "expected per-sample errors"),
            }
        }
    }

    #[test]
    fn errors_scale_linearly_in_a_single_component(
        a in central(), b in central(), sa in 0.001f64..1.0
    ) {
        let x: Quantity = Quantity::parse("a*b").unwrap();
        let one = x.eval(&bindings! { a => (a, sa), b => b }).unwrap();
        let two = x.eval(&bindings! { a => (a, 2.0 * sa), b => b }).unwrap();
        prop_assert!((scalar_error(&two) - 2.0 * scalar_error(&one)).abs() < 1e-12);
    }
}
