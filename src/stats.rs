//! # Stats
//!
//! $$
//! \hat\sigma^2=\frac{1}{n-1}\sum_{i=1}^n (x_i-\bar x)^2
//! $$
//!
//! Sample estimators shared by the indicator, risk and portfolio modules.
//! Every estimator returns `0.0` on inputs too short to define it, and every
//! ratio goes through [`safe_ratio`].

use std::cmp::Ordering;

use statrs::statistics::Statistics;

/// Denominators at or below this magnitude are treated as zero.
pub const ZERO_TOLERANCE: f64 = 1e-15;

/// `num / den`, or `0.0` when the denominator is zero or not finite.
pub fn safe_ratio(num: f64, den: f64) -> f64 {
  if !den.is_finite() || den.abs() <= ZERO_TOLERANCE || !num.is_finite() {
    0.0
  } else {
    num / den
  }
}

pub fn mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().mean()
  }
}

/// Unbiased (n-1) variance.
pub fn sample_variance(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    0.0
  } else {
    xs.iter().variance().max(0.0)
  }
}

pub fn sample_std(xs: &[f64]) -> f64 {
  sample_variance(xs).sqrt()
}

/// Unbiased (n-1) covariance over the common prefix of `x` and `y`.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len().min(y.len());
  if n < 2 {
    0.0
  } else {
    x[..n].iter().covariance(y[..n].iter())
  }
}

/// Root mean square.
pub fn rms(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().quadratic_mean()
  }
}

/// Percentile `q` in `[0, 100]` with linear interpolation between order statistics.
pub fn percentile(xs: &[f64], q: f64) -> f64 {
  if xs.is_empty() {
    return 0.0;
  }

  let mut sorted = xs.to_vec();
  sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

  let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
  let lo = rank.floor() as usize;
  let hi = rank.ceil() as usize;
  let frac = rank - lo as f64;
  sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn central_moments(xs: &[f64]) -> (f64, f64, f64) {
  let m = mean(xs);
  let mut m2 = 0.0;
  let mut m3 = 0.0;
  let mut m4 = 0.0;
  for &x in xs {
    let d = x - m;
    let d2 = d * d;
    m2 += d2;
    m3 += d2 * d;
    m4 += d2 * d2;
  }
  (m2, m3, m4)
}

/// Adjusted Fisher-Pearson skewness (G1).
pub fn skewness(xs: &[f64]) -> f64 {
  let n = xs.len() as f64;
  if xs.len() < 3 {
    return 0.0;
  }

  let (m2, m3, _) = central_moments(xs);
  let (m2, m3) = (m2 / n, m3 / n);
  if m2 <= ZERO_TOLERANCE {
    return 0.0;
  }

  let g1 = m3 / m2.powf(1.5);
  (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

/// Bias-corrected excess kurtosis (G2).
pub fn excess_kurtosis(xs: &[f64]) -> f64 {
  let n = xs.len() as f64;
  if xs.len() < 4 {
    return 0.0;
  }

  let (m2, _, m4) = central_moments(xs);
  if m2 <= ZERO_TOLERANCE {
    return 0.0;
  }

  let numer = n * (n + 1.0) * (n - 1.0) * m4;
  let denom = (n - 2.0) * (n - 3.0) * m2 * m2;
  let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
  numer / denom - adj
}

/// Simple returns `x[t] / x[t-1] - 1`; a zero previous value yields `0.0`.
pub fn pct_change(xs: &[f64]) -> Vec<f64> {
  xs.windows(2)
    .map(|w| safe_ratio(w[1] - w[0], w[0]))
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn safe_ratio_guards_zero_and_non_finite_denominators() {
    assert_eq!(safe_ratio(1.0, 0.0), 0.0);
    assert_eq!(safe_ratio(1.0, f64::NAN), 0.0);
    assert_eq!(safe_ratio(3.0, 2.0), 1.5);
  }

  #[test]
  fn sample_estimators_match_reference_values() {
    let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert_abs_diff_eq!(mean(&xs), 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(sample_variance(&xs), 32.0 / 7.0, epsilon = 1e-12);
    assert_abs_diff_eq!(sample_covariance(&xs, &xs), 32.0 / 7.0, epsilon = 1e-12);
  }

  #[test]
  fn short_inputs_resolve_to_zero() {
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(sample_std(&[1.0]), 0.0);
    assert_eq!(skewness(&[1.0, 2.0]), 0.0);
    assert_eq!(excess_kurtosis(&[1.0, 2.0, 3.0]), 0.0);
    assert_eq!(percentile(&[], 5.0), 0.0);
  }

  #[test]
  fn percentile_interpolates_linearly() {
    let xs = [4.0, 1.0, 3.0, 2.0, 5.0];
    assert_abs_diff_eq!(percentile(&xs, 5.0), 1.2, epsilon = 1e-12);
    assert_abs_diff_eq!(percentile(&xs, 50.0), 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(percentile(&xs, 100.0), 5.0, epsilon = 1e-12);
  }

  #[test]
  fn symmetric_sample_has_zero_skew() {
    let xs = [-2.0, -1.0, 0.0, 1.0, 2.0];
    assert_abs_diff_eq!(skewness(&xs), 0.0, epsilon = 1e-12);
    // G2 of a discrete uniform on five points
    assert_abs_diff_eq!(excess_kurtosis(&xs), -1.2, epsilon = 1e-12);
  }

  #[test]
  fn pct_change_is_one_shorter() {
    let r = pct_change(&[10.0, 11.0, 9.9]);
    assert_eq!(r.len(), 2);
    assert_abs_diff_eq!(r[0], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(r[1], -0.1, epsilon = 1e-12);
  }
}
