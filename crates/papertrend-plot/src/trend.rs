//! Trendline models
//!
//! Both fits take x and y as parallel slices. LOWESS returns fitted values
//! at the input x positions, sorted by x.

/// `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares. `None` with fewer than two points or constant x.
pub fn ols(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (sxy, sxx) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
    if sxx <= f64::EPSILON * n as f64 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        n,
    })
}

/// Share of points in each local window.
pub const LOWESS_FRAC: f64 = 1.0;

/// Robustifying passes after the initial fit.
pub const LOWESS_ITERATIONS: usize = 3;

fn tricube(d: f64) -> f64 {
    if d < 1.0 {
        let t = 1.0 - d * d * d;
        t * t * t
    } else {
        0.0
    }
}

fn bisquare(u: f64) -> f64 {
    if u.abs() < 1.0 {
        let t = 1.0 - u * u;
        t * t
    } else {
        0.0
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Weighted local linear fit at `x[i]` over `x[left..right]`.
fn local_fit(x: &[f64], y: &[f64], robust: &[f64], i: usize, left: usize, right: usize) -> f64 {
    let xi = x[i];
    let radius = (xi - x[left]).max(x[right - 1] - xi);

    let weights: Vec<f64> = (left..right)
        .map(|j| {
            let d = if radius > 0.0 { (x[j] - xi).abs() / radius } else { 0.0 };
            tricube(d) * robust[j]
        })
        .collect();
    let sum_w: f64 = weights.iter().sum();
    if sum_w <= 1e-12 {
        return y[i];
    }

    let (mut mean_x, mut mean_y) = (0.0, 0.0);
    for (w, j) in weights.iter().zip(left..right) {
        mean_x += w * x[j];
        mean_y += w * y[j];
    }
    mean_x /= sum_w;
    mean_y /= sum_w;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (w, j) in weights.iter().zip(left..right) {
        let dx = x[j] - mean_x;
        sxy += w * dx * (y[j] - mean_y);
        sxx += w * dx * dx;
    }

    let span = x[right - 1] - x[left];
    if sxx > 1e-12 * span * span * sum_w {
        mean_y + sxy / sxx * (xi - mean_x)
    } else {
        mean_y
    }
}

/// Locally weighted regression with tricube distance weights and bisquare
/// robustness weights. Returns `(x, fitted)` pairs sorted by x.
pub fn lowess(xs: &[f64], ys: &[f64], frac: f64, iterations: usize) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let x: Vec<f64> = points.iter().map(|p| p.0).collect();
    let y: Vec<f64> = points.iter().map(|p| p.1).collect();
    let k = ((frac * n as f64 + 1e-10) as usize).clamp(1, n);

    let mut robust = vec![1.0; n];
    let mut fitted = vec![0.0; n];

    for pass in 0..=iterations {
        let (mut left, mut right) = (0, k);
        for i in 0..n {
            // slide the k-point window while it gets closer to x[i]
            while right < n && x[i] - x[left] > x[right] - x[i] {
                left += 1;
                right += 1;
            }
            fitted[i] = local_fit(&x, &y, &robust, i, left, right);
        }

        if pass == iterations {
            break;
        }
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(y, f)| y - f).collect();
        let scale = median(&mut residuals.iter().map(|r| r.abs()).collect::<Vec<_>>());
        if scale <= 0.0 {
            break;
        }
        for (w, r) in robust.iter_mut().zip(&residuals) {
            *w = bisquare(r / (6.0 * scale));
        }
    }

    x.into_iter().zip(fitted).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} vs {b}");
    }

    #[test]
    fn ols_recovers_exact_line() {
        let xs: Vec<f64> = (0..20).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.5 * x - 2.0).collect();
        let fit = ols(&xs, &ys).unwrap();
        assert_close(fit.slope, 3.5, 1e-9);
        assert_close(fit.intercept, -2.0, 1e-9);
        assert_close(fit.predict(100.0), 348.0, 1e-6);
        assert_eq!(fit.n, 20);
    }

    #[test]
    fn ols_needs_spread_in_x() {
        assert!(ols(&[1.0], &[2.0]).is_none());
        assert!(ols(&[4.0, 4.0, 4.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(ols(&[], &[]).is_none());
    }

    #[test]
    fn ols_on_noisy_symmetric_data() {
        let fit = ols(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 2.0, 3.0]).unwrap();
        assert_close(fit.slope, 0.6, 1e-9);
        assert_close(fit.intercept, 1.1, 1e-9);
    }

    #[test]
    fn lowess_reproduces_linear_data() {
        let xs: Vec<f64> = (0..15).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let fitted = lowess(&xs, &ys, LOWESS_FRAC, LOWESS_ITERATIONS);
        assert_eq!(fitted.len(), 15);
        for (x, y) in fitted {
            assert_close(y, 2.0 * x + 1.0, 1e-9);
        }
    }

    #[test]
    fn lowess_output_is_sorted_by_x() {
        let fitted = lowess(&[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0], 1.0, 0);
        let xs: Vec<f64> = fitted.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn lowess_robust_passes_discount_outlier() {
        let xs: Vec<f64> = (0..10).map(f64::from).collect();
        let mut ys = xs.clone();
        ys[5] = 100.0;
        let fitted = lowess(&xs, &ys, LOWESS_FRAC, LOWESS_ITERATIONS);
        assert_close(fitted[2].1, 2.0, 0.5);
        assert_close(fitted[8].1, 8.0, 0.5);
    }

    #[test]
    fn lowess_handles_degenerate_inputs() {
        assert!(lowess(&[], &[], 1.0, 3).is_empty());
        assert_eq!(lowess(&[5.0], &[7.0], 1.0, 3), vec![(5.0, 7.0)]);
        let flat = lowess(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0], 1.0, 0);
        for (_, y) in flat {
            assert_close(y, 2.0, 1e-9);
        }
    }
}
