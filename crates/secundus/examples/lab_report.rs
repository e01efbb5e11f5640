//! Lab-course examples using secundus
//!
//! Run with: cargo run --example lab_report

use std::sync::Arc;

use secundus::{bindings, Quantity, Value};

fn print_result(label: &str, result: &secundus::Evaluation<f64>) {
    match (&result.central, result.error()) {
        (Value::Scalar(v), Some(Value::Scalar(e))) => {
            println!("  {label} = {v:.5} ± {e:.5}");
        }
        (Value::Scalar(v), None) => println!("  {label} = {v:.5}"),
        (central, _) => println!("  {label} = {central:?}"),
    }
}

fn main() {
    example_1_pendulum();
    example_2_density_chain();
    example_3_sample_series();
}

/// Example 1: gravitational acceleration from a pendulum period
fn example_1_pendulum() {
    println!("── pendulum: g = 4*pi^2*l/T^2 ──");

    let g: Quantity = Quantity::builder("4*pi^2*l/T^2")
        .default_value("pi", std::f64::consts::PI)
        .build()
        .unwrap();

    // l = 0.995 m ± 2 mm, T = 2.003 s ± 5 ms
    let result = g
        .eval(&bindings! { l => (0.995, 0.002), T => (2.003, 0.005) })
        .unwrap();
    print_result("g", &result);

    println!("  propagation: {}", g.error_formula(&["l", "T"]));
}

/// Example 2: density from mass and a volume computed as a dependency
fn example_2_density_chain() {
    println!("── density: rho = m/V with V = 4/3*pi*r^3 ──");

    let volume = Arc::new(
        Quantity::builder("4/3*pi*r^3")
            .default_value("pi", std::f64::consts::PI)
            .build()
            .unwrap(),
    );
    let density: Quantity = Quantity::builder("m/V")
        .dependency("V", &volume)
        .build()
        .unwrap();

    // the sphere radius carries the dominant uncertainty
    let result = density
        .eval(&bindings! { m => (0.2534, 0.0002), r => (0.0181, 0.0001) })
        .unwrap();
    print_result("rho", &result);

    if let Some(v) = result.dependencies.get("V") {
        print_result("computed V", v);
    }
}

/// Example 3: a measurement series propagated per sample
fn example_3_sample_series() {
    println!("── Ohm's law per sample: R = U/I ──");

    let resistance: Quantity = Quantity::parse("U/I").unwrap();
    let result = resistance
        .eval(&bindings! {
            U => (vec![1.02, 2.04, 2.98], vec![0.01, 0.01, 0.02]),
            I => (0.101, 0.002),
        })
        .unwrap();

    if let (Some(values), Some(Value::Series(errors))) = (result.series(), result.error()) {
        for (v, e) in values.iter().zip(errors) {
            println!("  R = {v:.4} ± {e:.4}");
        }
    }
}
