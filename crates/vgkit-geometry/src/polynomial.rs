//! Polynomial evaluation, interpolation, and numeric integration.
//!
//! The integrators exist to compute Bezier arc lengths: the speed function
//! `sqrt(x'(t)^2 + y'(t)^2)` of a curve segment is represented as a
//! [`SqrtPolynomial`] and integrated over the parameter range. They are
//! invoked per segment per render when markers or arc-length attributes are
//! present, so the iteration caps below double as a performance bound.

/// Trailing coefficients at or below this magnitude are trimmed away.
const COEFFICIENT_TOLERANCE: f64 = 1e-9;

/// Relative tolerance for successive integration estimates.
const INTEGRATION_TOLERANCE: f64 = 1e-7;

/// Hard cap on trapezoid refinements; guarantees termination on
/// degenerate (zero-length) geometry.
const MAX_REFINEMENTS: usize = 20;

/// Number of successive estimates fed to Richardson extrapolation.
const EXTRAPOLATION_POINTS: usize = 5;

/// A real-valued function of one variable, integrable over an interval.
pub trait RealFunction {
    /// Evaluate the function at `t`.
    fn evaluate(&self, t: f64) -> f64;

    /// Adaptive Simpson integration over `[min, max]`.
    ///
    /// Doubles the sample count each iteration (up to 20 iterations) and
    /// stops when successive estimates agree to a relative 1e-7.
    fn simpson(&self, min: f64, max: f64) -> f64
    where
        Self: Sized,
    {
        let mut trapezoid = 0.0;
        let mut prev_trapezoid = 0.0;
        let mut result = 0.0;
        let mut prev_result = 0.0;

        for iteration in 0..MAX_REFINEMENTS {
            trapezoid = refine_trapezoid(self, min, max, iteration, trapezoid);
            result = (4.0 * trapezoid - prev_trapezoid) / 3.0;

            if iteration >= EXTRAPOLATION_POINTS {
                let converged = (result - prev_result).abs()
                    < INTEGRATION_TOLERANCE * prev_result.abs()
                    || (result == 0.0 && prev_result == 0.0);
                if converged {
                    return result;
                }
            }

            prev_result = result;
            prev_trapezoid = trapezoid;
        }

        result
    }

    /// Romberg integration over `[min, max]`.
    ///
    /// Trapezoid refinement with Richardson extrapolation: successive
    /// estimates are extrapolated to zero step size with Neville
    /// interpolation, whose error estimate drives the stop condition.
    fn romberg(&self, min: f64, max: f64) -> f64
    where
        Self: Sized,
    {
        let mut estimates = [0.0f64; MAX_REFINEMENTS];
        let mut step_sizes = [0.0f64; MAX_REFINEMENTS + 1];
        step_sizes[0] = 1.0;

        let mut trapezoid = 0.0;
        for iteration in 0..MAX_REFINEMENTS {
            trapezoid = refine_trapezoid(self, min, max, iteration, trapezoid);
            estimates[iteration] = trapezoid;

            if iteration + 1 >= EXTRAPOLATION_POINTS {
                let offset = iteration + 1 - EXTRAPOLATION_POINTS;
                let (value, error) = interpolate(
                    &step_sizes[..MAX_REFINEMENTS],
                    &estimates,
                    EXTRAPOLATION_POINTS,
                    offset,
                    0.0,
                );
                if error.abs() <= INTEGRATION_TOLERANCE * value.abs() {
                    return value;
                }
            }

            // Each refinement halves the step, so h^2 shrinks by 4.
            step_sizes[iteration + 1] = 0.25 * step_sizes[iteration];
        }

        estimates[MAX_REFINEMENTS - 1]
    }
}

/// One step of iterative trapezoid refinement.
///
/// `iteration` 0 evaluates the endpoints; each subsequent iteration adds
/// the midpoints between existing samples, doubling the sample count.
fn refine_trapezoid<F: RealFunction>(
    function: &F,
    min: f64,
    max: f64,
    iteration: usize,
    previous: f64,
) -> f64 {
    if iteration == 0 {
        return 0.5 * (max - min) * (function.evaluate(min) + function.evaluate(max));
    }

    let points = 1usize << (iteration - 1);
    let spacing = (max - min) / points as f64;
    let mut x = min + 0.5 * spacing;
    let mut sum = 0.0;
    for _ in 0..points {
        sum += function.evaluate(x);
        x += spacing;
    }

    0.5 * (previous + (max - min) * sum / points as f64)
}

/// Neville's algorithm polynomial interpolation.
///
/// Interpolates the `n` samples `(xs[offset..], ys[offset..])` at `x` and
/// returns `(estimate, error_estimate)`. Coincident x-samples make further
/// refinement impossible; that degenerate case yields `(0.0, 0.0)` rather
/// than an error, and callers must not treat the zeros as a precise answer.
pub fn interpolate(xs: &[f64], ys: &[f64], n: usize, offset: usize, x: f64) -> (f64, f64) {
    if n == 0 || offset + n > xs.len() || offset + n > ys.len() {
        return (0.0, 0.0);
    }

    let xa = &xs[offset..offset + n];
    let ya = &ys[offset..offset + n];

    let mut c = ya.to_vec();
    let mut d = ya.to_vec();

    // Start from the sample nearest to x.
    let mut nearest = 0usize;
    let mut distance = (x - xa[0]).abs();
    for (i, &xi) in xa.iter().enumerate().skip(1) {
        let candidate = (x - xi).abs();
        if candidate < distance {
            nearest = i;
            distance = candidate;
        }
    }

    let mut y = ya[nearest];
    let mut dy = 0.0;
    let mut k = nearest;

    for m in 1..n {
        for i in 0..(n - m) {
            let ho = xa[i] - x;
            let hp = xa[i + m] - x;
            let w = c[i + 1] - d[i];
            let den = ho - hp;
            if den == 0.0 {
                return (0.0, 0.0);
            }
            let den = w / den;
            d[i] = hp * den;
            c[i] = ho * den;
        }

        if 2 * k < n - m {
            dy = c[k];
        } else {
            dy = d[k - 1];
            k -= 1;
        }
        y += dy;
    }

    (y, dy)
}

/// A polynomial in one variable, stored as coefficients low-to-high degree.
///
/// Immutable after construction. Trailing near-zero coefficients are
/// trimmed at construction time, so `degree` reflects the effective degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Build a polynomial from coefficients, trimming trailing terms with
    /// magnitude at or below 1e-9.
    pub fn new(coefficients: &[f64]) -> Self {
        let mut coefficients = coefficients.to_vec();
        while coefficients
            .last()
            .is_some_and(|c| c.abs() <= COEFFICIENT_TOLERANCE)
        {
            coefficients.pop();
        }
        Self { coefficients }
    }

    /// Effective degree after trimming. The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// The trimmed coefficient array, low-to-high degree.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl RealFunction for Polynomial {
    /// Horner's-method evaluation, O(degree).
    fn evaluate(&self, t: f64) -> f64 {
        let mut result = 0.0;
        for &c in self.coefficients.iter().rev() {
            result = result * t + c;
        }
        result
    }
}

/// Evaluates the square root of a base polynomial.
///
/// Round-off can push the base fractionally below zero near curve
/// endpoints; those values clamp to zero before the root.
#[derive(Debug, Clone, PartialEq)]
pub struct SqrtPolynomial {
    base: Polynomial,
}

impl SqrtPolynomial {
    pub fn new(coefficients: &[f64]) -> Self {
        Self {
            base: Polynomial::new(coefficients),
        }
    }

    /// The underlying polynomial.
    pub fn base(&self) -> &Polynomial {
        &self.base
    }
}

impl From<Polynomial> for SqrtPolynomial {
    fn from(base: Polynomial) -> Self {
        Self { base }
    }
}

impl RealFunction for SqrtPolynomial {
    fn evaluate(&self, t: f64) -> f64 {
        self.base.evaluate(t).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_constant_term() {
        let p = Polynomial::new(&[3.5, 2.0, 1.0]);
        assert_eq!(p.evaluate(0.0), 3.5);
    }

    #[test]
    fn test_evaluate_horner() {
        // 1 + 2t + 3t^2 at t=2 -> 17
        let p = Polynomial::new(&[1.0, 2.0, 3.0]);
        assert_eq!(p.evaluate(2.0), 17.0);
    }

    #[test]
    fn test_trailing_coefficients_trimmed() {
        let p = Polynomial::new(&[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(p.degree(), 1);
        assert_eq!(p.coefficients(), &[1.0, 2.0]);

        let p = Polynomial::new(&[1.0, 2.0, 1e-10]);
        assert_eq!(p.degree(), 1);
    }

    #[test]
    fn test_zero_polynomial() {
        let p = Polynomial::new(&[0.0, 0.0]);
        assert_eq!(p.degree(), 0);
        assert_eq!(p.evaluate(123.0), 0.0);
    }

    #[test]
    fn test_sqrt_polynomial() {
        let p = SqrtPolynomial::new(&[4.0]);
        assert_eq!(p.evaluate(1.0), 2.0);

        // sqrt(t^2) == |t|
        let p = SqrtPolynomial::new(&[0.0, 0.0, 1.0]);
        assert!((p.evaluate(3.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sqrt_clamps_roundoff() {
        let p = SqrtPolynomial::new(&[-1.0]);
        assert_eq!(p.evaluate(0.0), 0.0);
    }

    #[test]
    fn test_integrate_constant() {
        let p = Polynomial::new(&[7.0]);
        assert!((p.romberg(1.0, 4.0) - 21.0).abs() < 1e-6);
        assert!((p.simpson(1.0, 4.0) - 21.0).abs() < 1e-6);
    }

    #[test]
    fn test_integrate_zero() {
        let p = Polynomial::new(&[0.0]);
        assert_eq!(p.romberg(0.0, 1.0), 0.0);
        assert_eq!(p.simpson(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_integrate_quadratic() {
        // Integral of 3t^2 over [0,1] is exactly 1.
        let p = Polynomial::new(&[0.0, 0.0, 3.0]);
        assert!((p.romberg(0.0, 1.0) - 1.0).abs() < 1e-6);
        assert!((p.simpson(0.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_integrate_sqrt() {
        // Integral of sqrt(t) over [0,1] is 2/3.
        let p = SqrtPolynomial::new(&[0.0, 1.0]);
        assert!((p.romberg(0.0, 1.0) - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_interpolate_linear_exact() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0, 3.0, 5.0];
        let (value, _error) = interpolate(&xs, &ys, 3, 0, 0.5);
        assert!((value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_offset_window() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 4.0, 9.0];
        // Window [1..4] interpolates t^2 exactly.
        let (value, _error) = interpolate(&xs, &ys, 3, 1, 2.5);
        assert!((value - 6.25).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_degenerate_samples() {
        let xs = [1.0, 1.0, 2.0];
        let ys = [5.0, 5.0, 7.0];
        assert_eq!(interpolate(&xs, &ys, 3, 0, 1.5), (0.0, 0.0));
    }

    #[test]
    fn test_interpolate_empty() {
        assert_eq!(interpolate(&[], &[], 0, 0, 1.0), (0.0, 0.0));
    }
}
