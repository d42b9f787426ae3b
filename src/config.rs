//! # Configuration
//!
//! $$
//! \theta = (n_s, n_m, n_l, \mathbf{w}, r_f, c, \tau)
//! $$
//!
//! One immutable parameter set handed to every component at construction.
//! Every field has a default, so partial JSON documents are valid overrides.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Trailing-window lengths for the short/medium/long moving-average family.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
  pub short: usize,
  pub medium: usize,
  pub long: usize,
}

impl Default for WindowConfig {
  fn default() -> Self {
    Self {
      short: 14,
      medium: 50,
      long: 200,
    }
  }
}

/// Periods of the individual indicators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
  pub rsi_period: usize,
  pub macd_fast: usize,
  pub macd_slow: usize,
  pub macd_signal: usize,
  pub bollinger_period: usize,
  /// Band width in standard deviations.
  pub bollinger_k: f64,
  pub momentum_period: usize,
  pub stochastic_k: usize,
  pub stochastic_d: usize,
  pub atr_period: usize,
  pub volatility_period: usize,
  pub volume_ma_period: usize,
}

impl Default for IndicatorParams {
  fn default() -> Self {
    Self {
      rsi_period: 14,
      macd_fast: 12,
      macd_slow: 26,
      macd_signal: 9,
      bollinger_period: 20,
      bollinger_k: 2.0,
      momentum_period: 14,
      stochastic_k: 14,
      stochastic_d: 3,
      atr_period: 14,
      volatility_period: 14,
      volume_ma_period: 14,
    }
  }
}

/// Weights of the four binary components of the recommendation score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
  pub rsi: f64,
  pub macd: f64,
  pub trend: f64,
  pub volume: f64,
}

impl Default for ScoreWeights {
  fn default() -> Self {
    Self {
      rsi: 0.3,
      macd: 0.3,
      trend: 0.2,
      volume: 0.2,
    }
  }
}

impl ScoreWeights {
  fn total(&self) -> f64 {
    self.rsi + self.macd + self.trend + self.volume
  }
}

/// Top-level weights of the composite technical/volume/trend/volatility score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
  pub technical: f64,
  pub volume: f64,
  pub trend: f64,
  pub volatility: f64,
}

impl Default for CompositeWeights {
  fn default() -> Self {
    Self {
      technical: 0.4,
      volume: 0.2,
      trend: 0.2,
      volatility: 0.2,
    }
  }
}

impl CompositeWeights {
  fn total(&self) -> f64 {
    self.technical + self.volume + self.trend + self.volatility
  }
}

/// Inputs of the return-based risk statistics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
  /// Annualized risk-free rate.
  pub risk_free_rate: f64,
  /// Confidence level of VaR/CVaR.
  pub var_confidence: f64,
  /// Trading days per year used for annualization.
  pub trading_days: usize,
}

impl Default for RiskConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: 0.02,
      var_confidence: 0.95,
      trading_days: 252,
    }
  }
}

impl RiskConfig {
  /// Risk-free rate per trading day.
  pub fn daily_risk_free(&self) -> f64 {
    self.risk_free_rate / self.trading_days as f64
  }

  /// `sqrt(trading_days)`, the daily-to-annual volatility multiplier.
  pub fn annualization(&self) -> f64 {
    (self.trading_days as f64).sqrt()
  }
}

/// Portfolio optimizer, frontier sampling and rebalancing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
  pub min_weight: f64,
  pub max_weight: f64,
  /// Iteration cap of the solver.
  pub max_iters: u64,
  /// Simplex standard-deviation tolerance of the solver.
  pub tolerance: f64,
  pub frontier_samples: usize,
  /// Seed of the frontier sampler; `None` draws from entropy.
  pub frontier_seed: Option<u64>,
  pub rebalance_threshold: f64,
  /// Benchmark symbol for portfolio beta; the first asset when `None`.
  pub benchmark: Option<String>,
}

impl Default for PortfolioConfig {
  fn default() -> Self {
    Self {
      min_weight: 0.0,
      max_weight: 1.0,
      max_iters: 5000,
      tolerance: 1e-10,
      frontier_samples: 1000,
      frontier_seed: None,
      rebalance_threshold: 0.05,
      benchmark: None,
    }
  }
}

/// Complete configuration of the analytics pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
  pub windows: WindowConfig,
  pub indicators: IndicatorParams,
  pub score_weights: ScoreWeights,
  pub composite_weights: CompositeWeights,
  pub risk: RiskConfig,
  pub portfolio: PortfolioConfig,
}

impl AnalyticsConfig {
  /// Parse and validate a JSON document.
  pub fn from_json_str(s: &str) -> Result<Self> {
    let config: Self = serde_json::from_str(s)?;
    config.validate()?;
    Ok(config)
  }

  /// Read, parse and validate a JSON file.
  pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let raw = fs::read_to_string(path)?;
    Self::from_json_str(&raw)
  }

  /// Longest trailing window any indicator needs.
  pub fn required_history(&self) -> usize {
    let p = &self.indicators;
    [
      self.windows.short,
      self.windows.medium,
      self.windows.long,
      p.rsi_period + 1,
      p.bollinger_period,
      p.momentum_period + 1,
      p.stochastic_k + p.stochastic_d - 1,
      p.atr_period,
      p.volatility_period + 1,
      p.volume_ma_period,
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
  }

  pub fn validate(&self) -> Result<()> {
    let w = &self.windows;
    let p = &self.indicators;
    let periods = [
      ("windows.short", w.short),
      ("windows.medium", w.medium),
      ("windows.long", w.long),
      ("indicators.rsi_period", p.rsi_period),
      ("indicators.macd_fast", p.macd_fast),
      ("indicators.macd_slow", p.macd_slow),
      ("indicators.macd_signal", p.macd_signal),
      ("indicators.bollinger_period", p.bollinger_period),
      ("indicators.momentum_period", p.momentum_period),
      ("indicators.stochastic_k", p.stochastic_k),
      ("indicators.stochastic_d", p.stochastic_d),
      ("indicators.atr_period", p.atr_period),
      ("indicators.volatility_period", p.volatility_period),
      ("indicators.volume_ma_period", p.volume_ma_period),
      ("risk.trading_days", self.risk.trading_days),
    ];
    if let Some((name, _)) = periods.iter().find(|(_, v)| *v == 0) {
      return Err(AnalyticsError::InvalidConfig(format!("{name} must be positive")));
    }

    if (self.score_weights.total() - 1.0).abs() > 1e-9 {
      return Err(AnalyticsError::InvalidConfig(format!(
        "score weights must sum to 1, got {}",
        self.score_weights.total()
      )));
    }
    if (self.composite_weights.total() - 1.0).abs() > 1e-9 {
      return Err(AnalyticsError::InvalidConfig(format!(
        "composite weights must sum to 1, got {}",
        self.composite_weights.total()
      )));
    }

    let c = self.risk.var_confidence;
    if !(c > 0.0 && c < 1.0) {
      return Err(AnalyticsError::InvalidConfig(format!(
        "var_confidence must be in (0, 1), got {c}"
      )));
    }

    let pf = &self.portfolio;
    if !(0.0..=1.0).contains(&pf.min_weight)
      || !(0.0..=1.0).contains(&pf.max_weight)
      || pf.min_weight > pf.max_weight
    {
      return Err(AnalyticsError::InvalidConfig(format!(
        "weight bounds [{}, {}] must satisfy 0 <= min <= max <= 1",
        pf.min_weight, pf.max_weight
      )));
    }
    if pf.rebalance_threshold < 0.0 {
      return Err(AnalyticsError::InvalidConfig(
        "rebalance_threshold must be non-negative".into(),
      ));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    let config = AnalyticsConfig::default();
    config.validate().unwrap();
    assert_eq!(config.required_history(), 200);
    assert!((config.risk.daily_risk_free() - 0.02 / 252.0).abs() < 1e-15);
  }

  #[test]
  fn partial_json_overrides_keep_other_defaults() {
    let config = AnalyticsConfig::from_json_str(
      r#"{ "windows": { "long": 100 }, "portfolio": { "rebalance_threshold": 0.1 } }"#,
    )
    .unwrap();

    assert_eq!(config.windows.long, 100);
    assert_eq!(config.windows.short, 14);
    assert_eq!(config.portfolio.rebalance_threshold, 0.1);
    assert_eq!(config.portfolio.frontier_samples, 1000);
  }

  #[test]
  fn rejects_score_weights_not_summing_to_one() {
    let err = AnalyticsConfig::from_json_str(r#"{ "score_weights": { "rsi": 0.9 } }"#).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidConfig(_)));
  }

  #[test]
  fn rejects_inverted_weight_bounds() {
    let mut config = AnalyticsConfig::default();
    config.portfolio.min_weight = 0.6;
    config.portfolio.max_weight = 0.4;
    assert!(config.validate().is_err());
  }
}
