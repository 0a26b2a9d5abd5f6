//! Test helpers for the co2-leakage workspace.
//!
//! - [`generators`]: synthetic surfaces (constant, explicit rows, plume discs)
//!   and containment tables built from [`ContainmentRecord`]s
//! - [`fixtures`]: ready-made containment tables with known maxima
//! - [`assert_approx_eq!`]: tolerance comparison for `f64` results
//!
//! Pull it in as a dev-dependency (`test-utils = { path = "../test-utils" }`)
//! and import what the test needs:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures, plume_disc_surface};
//! ```

pub mod fixtures;
pub mod generators;

pub use generators::*;

/// Assert that two floats differ by at most `epsilon`.
///
/// NaN on either side always fails.
///
/// ```ignore
/// assert_approx_eq!(summed_mass, 0.006, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $epsilon:expr) => {{
        let (actual, expected, epsilon): (f64, f64, f64) =
            ($actual as f64, $expected as f64, $epsilon as f64);
        let diff = (actual - expected).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: {} ≈ {}\n    actual: {:?}\n  expected: {:?}\n      diff: {:?} (epsilon {:?})",
                stringify!($actual),
                stringify!($expected),
                actual,
                expected,
                diff,
                epsilon
            );
        }
    }};
}
