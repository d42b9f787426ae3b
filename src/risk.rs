//! # Risk Analyzer
//!
//! $$
//! SR = \sqrt{252}\,\frac{\overline{r - r_f}}{\sigma(r - r_f)},\qquad
//! MDD = \min_t\left(\frac{P_t}{\max_{s\le t} P_s} - 1\right)
//! $$
//!
//! Return-based risk statistics of a single price series, optionally relative
//! to a benchmark series.

pub mod rating;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::RiskConfig;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::series::PriceSeries;
use crate::stats;
use crate::stats::safe_ratio;

pub use rating::RiskRating;

/// Trading days in a week and in a month, for multi-day VaR.
pub const WEEK: usize = 5;
pub const MONTH: usize = 21;

/// Largest peak-to-trough decline of a price path.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drawdown {
  /// Non-positive fraction, `0.0` for a path that never declines.
  pub max_drawdown: f64,
  pub peak: usize,
  pub trough: usize,
}

impl Drawdown {
  /// Observations between peak and trough.
  pub fn length(&self) -> usize {
    self.trough - self.peak
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
  /// Annualized.
  pub volatility: f64,
  pub sharpe_ratio: f64,
  pub sortino_ratio: f64,
  pub var_95: f64,
  pub cvar_95: f64,
  pub max_drawdown: f64,
  /// Calendar days from the peak preceding the deepest trough to that trough.
  pub drawdown_duration: i64,
  pub beta: Option<f64>,
  pub alpha: Option<f64>,
  pub information_ratio: Option<f64>,
  pub skewness: f64,
  pub kurtosis: f64,
  pub daily_var_95: f64,
  pub weekly_var_95: f64,
  pub monthly_var_95: f64,
}

impl RiskMetrics {
  pub fn rating(&self) -> RiskRating {
    RiskRating::rate(self.volatility, self.sharpe_ratio, self.max_drawdown)
  }
}

/// Sums of every complete trailing window of `returns`.
pub fn rolling_sum(returns: &[f64], window: usize) -> Vec<f64> {
  if window == 0 {
    return Vec::new();
  }
  returns.windows(window).map(|w| w.iter().sum()).collect()
}

/// Closes of `series` and `benchmark` on the dates both carry.
pub fn align_closes(series: &PriceSeries, benchmark: &PriceSeries) -> (Vec<f64>, Vec<f64>) {
  let bench: HashMap<NaiveDate, f64> = benchmark.records().iter().map(|r| (r.date, r.close)).collect();
  series
    .records()
    .iter()
    .filter_map(|r| bench.get(&r.date).map(|&b| (r.close, b)))
    .unzip()
}

#[derive(Clone, Debug, Default)]
pub struct RiskAnalyzer {
  config: RiskConfig,
}

impl RiskAnalyzer {
  pub fn new(config: RiskConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &RiskConfig {
    &self.config
  }

  fn excess(&self, returns: &[f64]) -> Vec<f64> {
    let rf = self.config.daily_risk_free();
    returns.iter().map(|r| r - rf).collect()
  }

  /// Daily simple returns.
  pub fn returns(&self, prices: &[f64]) -> Vec<f64> {
    stats::pct_change(prices)
  }

  pub fn volatility(&self, returns: &[f64], annualize: bool) -> f64 {
    let vol = stats::sample_std(returns);
    if annualize {
      vol * self.config.annualization()
    } else {
      vol
    }
  }

  pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
    let excess = self.excess(returns);
    self.config.annualization() * safe_ratio(stats::mean(&excess), stats::sample_std(&excess))
  }

  /// Downside deviation is the RMS of the negative excess returns.
  pub fn sortino_ratio(&self, returns: &[f64]) -> f64 {
    let excess = self.excess(returns);
    let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    self.config.annualization() * safe_ratio(stats::mean(&excess), stats::rms(&downside))
  }

  /// Deepest decline from the running maximum. The trough is the first index
  /// of the minimum and the peak the first maximum at or before it.
  pub fn max_drawdown(&self, prices: &[f64]) -> Drawdown {
    let mut worst = Drawdown::default();
    if prices.is_empty() {
      return worst;
    }

    let mut running_max = f64::NEG_INFINITY;
    for (t, &p) in prices.iter().enumerate() {
      running_max = running_max.max(p);
      let dd = safe_ratio(p, running_max) - 1.0;
      if dd < worst.max_drawdown {
        worst.max_drawdown = dd;
        worst.trough = t;
      }
    }

    worst.peak = prices[..=worst.trough]
      .iter()
      .enumerate()
      .fold(0, |best, (i, &v)| if v > prices[best] { i } else { best });
    worst
  }

  /// Max drawdown of a dated series with its duration in calendar days.
  pub fn max_drawdown_dated(&self, series: &PriceSeries) -> (f64, i64) {
    let dd = self.max_drawdown(&series.closes());
    let records = series.records();
    let duration = match (records.get(dd.peak), records.get(dd.trough)) {
      (Some(peak), Some(trough)) => (trough.date - peak.date).num_days(),
      _ => 0,
    };
    (dd.max_drawdown, duration)
  }

  /// Empirical VaR at `confidence`, a lower-tail return quantile.
  pub fn var(&self, returns: &[f64], confidence: f64) -> f64 {
    stats::percentile(returns, (1.0 - confidence) * 100.0)
  }

  /// Mean of the returns at or below the VaR.
  pub fn cvar(&self, returns: &[f64], confidence: f64) -> f64 {
    let var = self.var(returns, confidence);
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    stats::mean(&tail)
  }

  pub fn beta(&self, returns: &[f64], market: &[f64]) -> f64 {
    safe_ratio(stats::sample_covariance(returns, market), stats::sample_variance(market))
  }

  /// Jensen's alpha on daily returns.
  pub fn alpha(&self, returns: &[f64], market: &[f64]) -> f64 {
    let rf = self.config.daily_risk_free();
    let beta = self.beta(returns, market);
    stats::mean(returns) - (rf + beta * (stats::mean(market) - rf))
  }

  pub fn information_ratio(&self, returns: &[f64], benchmark: &[f64]) -> f64 {
    let active: Vec<f64> = returns.iter().zip(benchmark).map(|(r, b)| r - b).collect();
    self.config.annualization() * safe_ratio(stats::mean(&active), stats::sample_std(&active))
  }

  /// Full metric set of `series`; benchmark-relative fields are filled only
  /// when `benchmark` is given and use the dates both series share.
  pub fn analyze(&self, series: &PriceSeries, benchmark: Option<&PriceSeries>) -> Result<RiskMetrics> {
    if series.is_empty() {
      return Err(AnalyticsError::Risk(format!(
        "no price history for {}",
        series.symbol()
      )));
    }

    let confidence = self.config.var_confidence;
    let returns = self.returns(&series.closes());
    let (max_drawdown, drawdown_duration) = self.max_drawdown_dated(series);

    let (beta, alpha, information_ratio) = match benchmark {
      Some(bench) => {
        let (own, market) = align_closes(series, bench);
        let (own, market) = (self.returns(&own), self.returns(&market));
        (
          Some(self.beta(&own, &market)),
          Some(self.alpha(&own, &market)),
          Some(self.information_ratio(&own, &market)),
        )
      }
      None => (None, None, None),
    };

    let var_95 = self.var(&returns, confidence);
    let metrics = RiskMetrics {
      volatility: self.volatility(&returns, true),
      sharpe_ratio: self.sharpe_ratio(&returns),
      sortino_ratio: self.sortino_ratio(&returns),
      var_95,
      cvar_95: self.cvar(&returns, confidence),
      max_drawdown,
      drawdown_duration,
      beta,
      alpha,
      information_ratio,
      skewness: stats::skewness(&returns),
      kurtosis: stats::excess_kurtosis(&returns),
      daily_var_95: var_95,
      weekly_var_95: self.var(&rolling_sum(&returns, WEEK), confidence),
      monthly_var_95: self.var(&rolling_sum(&returns, MONTH), confidence),
    };

    debug!(
      symbol = series.symbol(),
      volatility = metrics.volatility,
      sharpe = metrics.sharpe_ratio,
      "computed risk metrics"
    );
    Ok(metrics)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::series::tests::day;
  use crate::series::tests::record;
  use crate::series::tests::series_from_closes;

  fn zero_rf() -> RiskAnalyzer {
    RiskAnalyzer::new(RiskConfig {
      risk_free_rate: 0.0,
      ..RiskConfig::default()
    })
  }

  #[test]
  fn increasing_prices_have_no_drawdown() {
    let analyzer = RiskAnalyzer::default();
    let series = series_from_closes("UP", &[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(analyzer.max_drawdown_dated(&series), (0.0, 0));
  }

  #[test]
  fn drawdown_duration_counts_calendar_days_from_peak() {
    let analyzer = RiskAnalyzer::default();
    let records = vec![
      record(0, 100.0, 1),
      record(1, 120.0, 1),
      record(4, 90.0, 1),
      record(8, 60.0, 1),
      record(9, 130.0, 1),
    ];
    let series = PriceSeries::new("DD", records);

    let (mdd, duration) = analyzer.max_drawdown_dated(&series);
    assert_abs_diff_eq!(mdd, -0.5, epsilon = 1e-12);
    assert_eq!(duration, 7);

    let dd = analyzer.max_drawdown(&series.closes());
    assert_eq!((dd.peak, dd.trough, dd.length()), (1, 3, 2));
  }

  #[test]
  fn constant_returns_have_zero_ratios() {
    let analyzer = zero_rf();
    let returns = [0.25; 30];
    assert_eq!(analyzer.sharpe_ratio(&returns), 0.0);
    assert_eq!(analyzer.sortino_ratio(&returns), 0.0);
    assert_eq!(analyzer.volatility(&returns, true), 0.0);
  }

  #[test]
  fn sortino_uses_rms_of_negative_excess() {
    let analyzer = zero_rf();
    let returns = [0.02, -0.01, 0.03, -0.02];
    let expected = 252f64.sqrt() * 0.005 / ((0.0001 + 0.0004) / 2.0f64).sqrt();
    assert_abs_diff_eq!(analyzer.sortino_ratio(&returns), expected, epsilon = 1e-9);
  }

  #[test]
  fn var_and_cvar_read_the_lower_tail() {
    let analyzer = RiskAnalyzer::default();
    let returns: Vec<f64> = (0..100).map(|i| (i as f64 - 50.0) / 1000.0).collect();
    let var = analyzer.var(&returns, 0.95);
    assert_abs_diff_eq!(var, -0.04505, epsilon = 1e-9);
    assert!(analyzer.cvar(&returns, 0.95) <= var);
  }

  #[test]
  fn beta_of_scaled_market_is_the_scale() {
    let analyzer = zero_rf();
    let market = [0.01, -0.02, 0.015, 0.0, -0.005];
    let returns: Vec<f64> = market.iter().map(|m| 2.0 * m).collect();

    assert_abs_diff_eq!(analyzer.beta(&returns, &market), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
      analyzer.alpha(&returns, &market),
      stats::mean(&returns) - 2.0 * stats::mean(&market),
      epsilon = 1e-12
    );
    assert_eq!(analyzer.beta(&returns, &[0.0; 5]), 0.0);
  }

  #[test]
  fn analyze_aligns_benchmark_by_date() {
    let analyzer = RiskAnalyzer::default();
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + ((i as f64) * 0.7).sin() * 3.0).collect();
    let series = series_from_closes("AAA", &closes);
    let bench = series.between(day(10), day(39));

    let with = analyzer.analyze(&series, Some(&bench)).unwrap();
    let without = analyzer.analyze(&series, None).unwrap();

    assert_abs_diff_eq!(with.beta.unwrap(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(with.information_ratio.unwrap(), 0.0, epsilon = 1e-9);
    assert!(without.beta.is_none() && without.alpha.is_none());
    assert_eq!(with.volatility, without.volatility);
  }

  #[test]
  fn analyze_rejects_empty_series() {
    let err = RiskAnalyzer::default()
      .analyze(&PriceSeries::new("NONE", vec![]), None)
      .unwrap_err();
    assert!(matches!(err, AnalyticsError::Risk(_)));
  }

  #[test]
  fn single_point_resolves_to_neutral_metrics() {
    let metrics = RiskAnalyzer::default()
      .analyze(&series_from_closes("ONE", &[10.0]), None)
      .unwrap();
    assert_eq!(metrics.volatility, 0.0);
    assert_eq!(metrics.sharpe_ratio, 0.0);
    assert_eq!(metrics.max_drawdown, 0.0);
    assert_eq!(metrics.weekly_var_95, 0.0);
  }

  #[test]
  fn rolling_sum_only_keeps_complete_windows() {
    assert_eq!(rolling_sum(&[1.0, 2.0, 3.0], 2), vec![3.0, 5.0]);
    assert!(rolling_sum(&[1.0], 5).is_empty());
  }
}
