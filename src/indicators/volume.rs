//! # Volume
//!
//! $$
//! OBV_t = \sum_{s\le t}\operatorname{sign}(C_s-C_{s-1})\,V_s,\qquad
//! PVT_t = \sum_{s\le t}\frac{C_s-C_{s-1}}{C_{s-1}}\,V_s
//! $$
//!
//! The first row has no previous close, so both series are missing there and
//! accumulate from the second row.

use super::moving_average::sma;
use super::window::ensure_same_len;
use super::Column;
use crate::error::Result;
use crate::stats::safe_ratio;

fn cumulative<F>(closes: &[f64], volumes: &[f64], step: F) -> Column
where
  F: Fn(f64, f64) -> f64,
{
  let mut acc = 0.0;
  let mut out = vec![None; closes.len()];
  for t in 1..closes.len() {
    acc += step(closes[t - 1], closes[t]) * volumes[t];
    out[t] = Some(acc);
  }
  out
}

/// On-Balance Volume.
pub fn obv(closes: &[f64], volumes: &[f64]) -> Result<Column> {
  ensure_same_len("OBV", &[closes.len(), volumes.len()])?;
  Ok(cumulative(closes, volumes, |prev, cur| {
    if cur > prev {
      1.0
    } else if cur < prev {
      -1.0
    } else {
      0.0
    }
  }))
}

/// Price-Volume Trend.
pub fn pvt(closes: &[f64], volumes: &[f64]) -> Result<Column> {
  ensure_same_len("PVT", &[closes.len(), volumes.len()])?;
  Ok(cumulative(closes, volumes, |prev, cur| safe_ratio(cur - prev, prev)))
}

/// Simple moving average of volume.
pub fn volume_ma(volumes: &[f64], period: usize) -> Result<Column> {
  sma(volumes, period)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn obv_signs_volume_by_direction() {
    let out = obv(&[10.0, 11.0, 11.0, 10.0], &[100.0, 200.0, 300.0, 400.0]).unwrap();
    assert_eq!(out, vec![None, Some(200.0), Some(200.0), Some(-200.0)]);
  }

  #[test]
  fn pvt_accumulates_return_weighted_volume() {
    let out = pvt(&[10.0, 11.0, 9.9], &[100.0, 100.0, 200.0]).unwrap();
    assert_abs_diff_eq!(out[1].unwrap(), 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out[2].unwrap(), 10.0 - 20.0, epsilon = 1e-9);
  }

  #[test]
  fn first_row_has_no_previous_close() {
    assert_eq!(obv(&[10.0], &[100.0]).unwrap(), vec![None]);
    assert_eq!(pvt(&[10.0, 10.0], &[100.0, 50.0]).unwrap(), vec![None, Some(0.0)]);
    assert!(obv(&[], &[]).unwrap().is_empty());
  }
}
