//! Shared numeric kernels used by the forward model and profile builder.

use num_complex::Complex64;

/// Numerically stable complex division.
///
/// Branches on the relative magnitude of the denominator's real and imaginary
/// parts (Smith's algorithm) so that widely scaled components do not suffer
/// catastrophic cancellation, which the naive textbook formula does.
#[inline]
pub fn stable_div(numerator: Complex64, denominator: Complex64) -> Complex64 {
    if denominator.re.abs() >= denominator.im.abs() {
        let ratio = denominator.im / denominator.re;
        let scale = 1.0 / (denominator.re + denominator.im * ratio);
        Complex64::new(
            (numerator.re + numerator.im * ratio) * scale,
            (numerator.im - numerator.re * ratio) * scale,
        )
    } else {
        let ratio = denominator.re / denominator.im;
        let scale = 1.0 / (denominator.re * ratio + denominator.im);
        Complex64::new(
            (numerator.re * ratio + numerator.im) * scale,
            (numerator.im * ratio - numerator.re) * scale,
        )
    }
}

/// Error function via the Abramowitz and Stegun 7.1.26 rational approximation.
///
/// Maximum absolute error 1.5e-7, which is far below the SLD-profile grid
/// resolution this crate uses it for.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let polynomial = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - polynomial * (-x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::{erf, stable_div};
    use num_complex::Complex64;

    fn assert_close(label: &str, expected: f64, actual: f64, tolerance: f64) {
        assert!(
            (expected - actual).abs() <= tolerance,
            "{label} expected={expected:.15e} actual={actual:.15e} tolerance={tolerance:.1e}"
        );
    }

    #[test]
    fn stable_division_matches_naive_formula_on_benign_inputs() {
        let numerator = Complex64::new(3.5, -1.25);
        let denominator = Complex64::new(-0.75, 2.0);

        let stable = stable_div(numerator, denominator);
        let naive = numerator / denominator;

        assert_close("re", naive.re, stable.re, 1.0e-14);
        assert_close("im", naive.im, stable.im, 1.0e-14);
    }

    #[test]
    fn stable_division_survives_extreme_component_scales() {
        // The naive formula overflows the intermediate |denominator|^2 here.
        let numerator = Complex64::new(1.0e300, 1.0e300);
        let denominator = Complex64::new(2.0e300, 1.0e-300);

        let quotient = stable_div(numerator, denominator);
        assert!(quotient.re.is_finite() && quotient.im.is_finite());
        assert_close("re", 0.5, quotient.re, 1.0e-12);
        assert_close("im", 0.5, quotient.im, 1.0e-12);
    }

    #[test]
    fn stable_division_branches_on_dominant_imaginary_denominator() {
        let numerator = Complex64::new(1.0, 0.0);
        let denominator = Complex64::new(1.0e-200, 4.0);

        let quotient = stable_div(numerator, denominator);
        assert_close("re", 0.0, quotient.re, 1.0e-12);
        assert_close("im", -0.25, quotient.im, 1.0e-12);
    }

    #[test]
    fn erf_matches_reference_values() {
        assert_close("erf(0)", 0.0, erf(0.0), 1.0e-15);
        assert_close("erf(0.5)", 0.520499877813, erf(0.5), 2.0e-7);
        assert_close("erf(1)", 0.842700792950, erf(1.0), 2.0e-7);
        assert_close("erf(2)", 0.995322265019, erf(2.0), 2.0e-7);
        assert_close("erf(6)", 1.0, erf(6.0), 1.0e-9);
    }

    #[test]
    fn erf_is_odd() {
        for x in [0.1, 0.7, 1.3, 2.9] {
            assert_close("odd symmetry", -erf(x), erf(-x), 1.0e-15);
        }
    }
}
