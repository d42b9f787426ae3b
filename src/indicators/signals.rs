//! # Signals
//!
//! $$
//! s_{\text{overall}} = \operatorname{sign}\Big(\sum_i s_i\Big),\qquad s_i\in\{-1,0,1\}
//! $$
//!
//! Discrete per-indicator votes taken on the latest row of an indicator frame.
//! A vote whose inputs are missing is neutral.

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

/// RSI band inside which momentum is considered healthy.
pub const RSI_LOWER: f64 = 30.0;
pub const RSI_UPPER: f64 = 70.0;

/// Discrete trading vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
  Sell,
  #[default]
  Neutral,
  Buy,
}

impl Signal {
  pub fn value(self) -> i8 {
    match self {
      Signal::Sell => -1,
      Signal::Neutral => 0,
      Signal::Buy => 1,
    }
  }

  /// Sign of an aggregated vote.
  pub fn from_sum(sum: i32) -> Self {
    match sum.signum() {
      1 => Signal::Buy,
      -1 => Signal::Sell,
      _ => Signal::Neutral,
    }
  }

  fn binary(condition: Option<bool>) -> Self {
    match condition {
      Some(true) => Signal::Buy,
      Some(false) => Signal::Sell,
      None => Signal::Neutral,
    }
  }
}

impl Display for Signal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Signal::Sell => write!(f, "sell"),
      Signal::Neutral => write!(f, "neutral"),
      Signal::Buy => write!(f, "buy"),
    }
  }
}

/// Latest-row inputs of the signal rules.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatestIndicators {
  pub close: Option<f64>,
  pub volume: Option<f64>,
  pub rsi: Option<f64>,
  pub macd: Option<f64>,
  pub macd_signal: Option<f64>,
  pub bb_upper: Option<f64>,
  pub bb_lower: Option<f64>,
  pub sma_short: Option<f64>,
  pub sma_medium: Option<f64>,
  pub volume_ma: Option<f64>,
  pub stoch_k: Option<f64>,
  pub stoch_d: Option<f64>,
}

fn gt(a: Option<f64>, b: Option<f64>) -> Option<bool> {
  Some(a? > b?)
}

/// Per-indicator votes and their aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSignals {
  pub rsi: Signal,
  pub macd: Signal,
  pub bollinger: Signal,
  pub moving_average: Signal,
  pub volume: Signal,
  pub stochastic: Signal,
  pub overall: Signal,
}

impl IndicatorSignals {
  pub fn from_latest(v: &LatestIndicators) -> Self {
    let rsi = Signal::binary(v.rsi.map(|r| (RSI_LOWER..=RSI_UPPER).contains(&r)));
    let macd = Signal::binary(gt(v.macd, v.macd_signal));
    let bollinger = match (v.close, v.bb_lower, v.bb_upper) {
      (Some(c), Some(lo), _) if c < lo => Signal::Buy,
      (Some(c), _, Some(hi)) if c > hi => Signal::Sell,
      _ => Signal::Neutral,
    };
    let moving_average = Signal::binary(gt(v.sma_short, v.sma_medium));
    let volume = Signal::binary(gt(v.volume, v.volume_ma));
    let stochastic = Signal::binary(gt(v.stoch_k, v.stoch_d));

    let sum: i32 = [rsi, macd, bollinger, moving_average, volume, stochastic]
      .iter()
      .map(|s| s.value() as i32)
      .sum();

    Self {
      rsi,
      macd,
      bollinger,
      moving_average,
      volume,
      stochastic,
      overall: Signal::from_sum(sum),
    }
  }
}
