//! # Volatility
//!
//! $$
//! TR_t = \max(H_t-L_t,\ |H_t-C_{t-1}|,\ |L_t-C_{t-1}|)
//! $$
//!

use super::moving_average::sma_of;
use super::window::ensure_len;
use super::window::ensure_same_len;
use super::window::rolling;
use super::Column;
use crate::error::Result;
use crate::stats;

/// True range; the first row has no previous close and uses `high - low`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
  (0..high.len().min(low.len()).min(close.len()))
    .map(|t| {
      let hl = high[t] - low[t];
      if t == 0 {
        hl
      } else {
        let prev = close[t - 1];
        hl.max((high[t] - prev).abs()).max((low[t] - prev).abs())
      }
    })
    .collect()
}

/// Average True Range as a rolling mean of [`true_range`].
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Column> {
  ensure_same_len("ATR", &[high.len(), low.len(), close.len()])?;
  ensure_len("ATR", close.len(), period)?;

  let tr: Column = true_range(high, low, close).into_iter().map(Some).collect();
  Ok(sma_of(&tr, period))
}

/// Rolling sample standard deviation of simple returns.
pub fn return_volatility(closes: &[f64], period: usize) -> Result<Column> {
  ensure_len("Volatility", period, 1)?;
  ensure_len("Volatility", closes.len(), period + 1)?;

  let mut returns: Column = Vec::with_capacity(closes.len());
  returns.push(None);
  returns.extend(stats::pct_change(closes).into_iter().map(Some));
  Ok(rolling(&returns, period, |w| Some(stats::sample_std(w))))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn true_range_uses_gaps_from_previous_close() {
    let tr = true_range(&[10.0, 15.0], &[9.0, 14.0], &[9.5, 14.5]);
    assert_abs_diff_eq!(tr[0], 1.0);
    assert_abs_diff_eq!(tr[1], 5.5);
  }

  #[test]
  fn atr_averages_true_range() {
    let high = [10.0, 11.0, 12.0];
    let low = [9.0, 10.0, 11.0];
    let close = [9.5, 10.5, 11.5];
    let out = atr(&high, &low, &close, 2).unwrap();
    assert_eq!(out[0], None);
    assert_abs_diff_eq!(out[1].unwrap(), 1.25, epsilon = 1e-12);
    assert_abs_diff_eq!(out[2].unwrap(), 1.5, epsilon = 1e-12);
  }

  #[test]
  fn constant_prices_have_zero_volatility() {
    let out = return_volatility(&[5.0; 20], 14).unwrap();
    assert!(out[..14].iter().all(Option::is_none));
    assert_eq!(out[14], Some(0.0));
  }
}
