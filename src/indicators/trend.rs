//! # Trend
//!
//! $$
//! \text{MACD}_t = \text{EMA}_{12}(C)_t - \text{EMA}_{26}(C)_t,\qquad
//! B^{\pm}_t = \text{SMA}_{n}(C)_t \pm k\,\sigma_n(C)_t
//! $$
//!

use super::moving_average::ema;
use super::moving_average::ema_of;
use super::moving_average::rolling_std;
use super::moving_average::sma;
use super::window::ensure_len;
use super::Column;
use crate::error::Result;

/// MACD line, its signal line and the histogram between them.
#[derive(Clone, Debug, PartialEq)]
pub struct Macd {
  pub macd: Column,
  pub signal: Column,
  pub histogram: Column,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Result<Macd> {
  ensure_len("MACD", signal, 1)?;
  ensure_len("MACD", closes.len(), slow.max(fast))?;

  let fast_ema = ema(closes, fast)?;
  let slow_ema = ema(closes, slow)?;
  let line: Column = fast_ema
    .iter()
    .zip(slow_ema.iter())
    .map(|(f, s)| Some((*f)? - (*s)?))
    .collect();
  let signal_line = ema_of(&line, signal);
  let histogram = line
    .iter()
    .zip(signal_line.iter())
    .map(|(m, s)| Some((*m)? - (*s)?))
    .collect();

  Ok(Macd {
    macd: line,
    signal: signal_line,
    histogram,
  })
}

/// Bollinger upper, middle and lower bands.
#[derive(Clone, Debug, PartialEq)]
pub struct BollingerBands {
  pub upper: Column,
  pub middle: Column,
  pub lower: Column,
}

pub fn bollinger_bands(closes: &[f64], period: usize, k: f64) -> Result<BollingerBands> {
  ensure_len("Bollinger", closes.len(), period)?;

  let middle = sma(closes, period)?;
  let sd = rolling_std(closes, period)?;
  let band = |sign: f64| -> Column {
    middle
      .iter()
      .zip(sd.iter())
      .map(|(m, s)| Some((*m)? + sign * k * (*s)?))
      .collect()
  };
  let upper = band(1.0);
  let lower = band(-1.0);

  Ok(BollingerBands {
    upper,
    middle,
    lower,
  })
}
