//! # Moving Averages
//!
//! $$
//! \text{EMA}_t = \alpha x_t + (1-\alpha)\,\text{EMA}_{t-1},\qquad \alpha=\frac{2}{s+1}
//! $$
//!
//! The EMA is seeded with the first observation and carries no bias
//! adjustment, so it is defined from the first row onward.

use super::defined;
use super::window::ensure_len;
use super::window::rolling;
use super::Column;
use crate::error::Result;
use crate::stats;

/// Simple moving average over a trailing window.
pub fn sma(values: &[f64], window: usize) -> Result<Column> {
  ensure_len("SMA", values.len(), window)?;
  Ok(sma_of(&defined(values), window))
}

/// Simple moving average of a column that may contain missing values.
pub fn sma_of(values: &[Option<f64>], window: usize) -> Column {
  rolling(values, window, |w| Some(stats::mean(w)))
}

/// Rolling sample standard deviation.
pub fn rolling_std(values: &[f64], window: usize) -> Result<Column> {
  ensure_len("rolling std", values.len(), window)?;
  Ok(rolling(&defined(values), window, |w| Some(stats::sample_std(w))))
}

/// Exponential moving average with span `span`.
pub fn ema(values: &[f64], span: usize) -> Result<Column> {
  ensure_len("EMA", values.len(), 1)?;
  ensure_len("EMA", span, 1)?;
  Ok(ema_of(&defined(values), span))
}

/// EMA of a column; the recurrence starts at the first defined value and a
/// missing input leaves the state untouched.
pub fn ema_of(values: &[Option<f64>], span: usize) -> Column {
  let alpha = 2.0 / (span as f64 + 1.0);
  let mut state: Option<f64> = None;

  values
    .iter()
    .map(|v| match (*v, state) {
      (Some(x), None) => {
        state = Some(x);
        state
      }
      (Some(x), Some(prev)) => {
        state = Some(prev + alpha * (x - prev));
        state
      }
      (None, _) => None,
    })
    .collect()
}
