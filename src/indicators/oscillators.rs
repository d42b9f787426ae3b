//! # Oscillators
//!
//! $$
//! \text{RSI}_t = 100 - \frac{100}{1+\overline{G}_t/\overline{L}_t},\qquad
//! \%K_t = 100\,\frac{C_t-\min L}{\max H-\min L}
//! $$
//!
//! RSI averages the last `period` price changes (simple mean, not Wilder
//! smoothing). With no losses in the window RSI is 100; a window with neither
//! gains nor losses has no defined RSI and is left missing.

use super::moving_average::sma_of;
use super::window::ensure_len;
use super::window::ensure_same_len;
use super::Column;
use crate::error::Result;
use crate::stats::ZERO_TOLERANCE;

/// Relative Strength Index.
pub fn rsi(closes: &[f64], period: usize) -> Result<Column> {
  ensure_len("RSI", period, 1)?;
  ensure_len("RSI", closes.len(), period + 1)?;

  let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
  let mut out = vec![None; closes.len()];

  for t in period..closes.len() {
    // deltas[t - 1] is the change into row t
    let window = &deltas[t - period..t];
    let gain = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let loss = -window.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    out[t] = if loss <= ZERO_TOLERANCE {
      if gain <= ZERO_TOLERANCE {
        None
      } else {
        Some(100.0)
      }
    } else {
      let rs = gain / loss;
      Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
    };
  }

  Ok(out)
}

/// `x[t] - x[t - period]`.
pub fn momentum(values: &[f64], period: usize) -> Result<Column> {
  ensure_len("Momentum", period, 1)?;
  ensure_len("Momentum", values.len(), period + 1)?;

  Ok(
    (0..values.len())
      .map(|t| (t >= period).then(|| values[t] - values[t - period]))
      .collect(),
  )
}

/// Stochastic oscillator lines.
#[derive(Clone, Debug, PartialEq)]
pub struct Stochastic {
  /// %K.
  pub k: Column,
  /// %D, the simple average of %K.
  pub d: Column,
}

/// Stochastic oscillator over `k_period` highs/lows, smoothed over `d_period`.
///
/// A window whose high equals its low leaves %K missing.
pub fn stochastic(
  high: &[f64],
  low: &[f64],
  close: &[f64],
  k_period: usize,
  d_period: usize,
) -> Result<Stochastic> {
  ensure_same_len("Stochastic", &[high.len(), low.len(), close.len()])?;
  ensure_len("Stochastic", k_period, 1)?;
  ensure_len("Stochastic", d_period, 1)?;
  ensure_len("Stochastic", close.len(), k_period + d_period - 1)?;

  let mut k = vec![None; close.len()];
  for t in (k_period - 1)..close.len() {
    let lo = low[t + 1 - k_period..=t]
      .iter()
      .copied()
      .fold(f64::INFINITY, f64::min);
    let hi = high[t + 1 - k_period..=t]
      .iter()
      .copied()
      .fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;
    if range > ZERO_TOLERANCE {
      k[t] = Some(100.0 * (close[t] - lo) / range);
    }
  }

  let d = sma_of(&k, d_period);
  Ok(Stochastic { k, d })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::AnalyticsError;

  #[test]
  fn rsi_is_bounded() {
    let closes: Vec<f64> = (0..120)
      .map(|i| 50.0 + 10.0 * ((i as f64) * 0.37).sin() + (i % 5) as f64)
      .collect();
    let out = rsi(&closes, 14).unwrap();

    assert!(out[..14].iter().all(Option::is_none));
    for v in out.iter().flatten() {
      assert!((0.0..=100.0).contains(v), "rsi out of range: {v}");
    }
  }

  #[test]
  fn rsi_of_constant_prices_is_missing() {
    let out = rsi(&[10.0; 30], 14).unwrap();
    assert!(out.iter().all(Option::is_none));
  }

  #[test]
  fn rsi_without_losses_is_100() {
    let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
    let out = rsi(&closes, 14).unwrap();
    assert_eq!(out[19], Some(100.0));
  }

  #[test]
  fn rsi_matches_hand_computed_value() {
    // changes: +2, -1, +2, -1 -> gain 1.0, loss 0.5 -> RS 2
    let out = rsi(&[10.0, 12.0, 11.0, 13.0, 12.0], 4).unwrap();
    assert_abs_diff_eq!(out[4].unwrap(), 100.0 - 100.0 / 3.0, epsilon = 1e-12);
  }

  #[test]
  fn rsi_needs_period_plus_one_rows() {
    let err = rsi(&[1.0; 14], 14).unwrap_err();
    assert!(matches!(
      err,
      AnalyticsError::InsufficientData { required: 15, .. }
    ));
  }

  #[test]
  fn momentum_differences_over_period() {
    let out = momentum(&[1.0, 2.0, 4.0, 8.0], 2).unwrap();
    assert_eq!(out, vec![None, None, Some(3.0), Some(6.0)]);
  }

  #[test]
  fn stochastic_k_and_d() {
    let high = [10.0, 11.0, 12.0, 13.0];
    let low = [8.0, 9.0, 10.0, 11.0];
    let close = [9.0, 10.0, 12.0, 11.0];
    let st = stochastic(&high, &low, &close, 2, 2).unwrap();

    assert_eq!(st.k[0], None);
    assert_abs_diff_eq!(st.k[1].unwrap(), 100.0 * (10.0 - 8.0) / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(st.k[2].unwrap(), 100.0 * (12.0 - 9.0) / 3.0, epsilon = 1e-12);
    assert_eq!(st.d[1], None);
    assert_abs_diff_eq!(
      st.d[2].unwrap(),
      (st.k[1].unwrap() + st.k[2].unwrap()) / 2.0,
      epsilon = 1e-12
    );
  }

  #[test]
  fn stochastic_rejects_mismatched_inputs() {
    let err = stochastic(&[1.0, 2.0], &[1.0], &[1.0, 2.0], 1, 1).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidData(_)));
  }
}
