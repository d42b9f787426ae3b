//! # Portfolio Performance
//!
//! $$
//! R_{\text{total}} = \prod_t (1 + r_t) - 1,\qquad
//! R_{\text{ann}} = (1 + R_{\text{total}})^{252/T} - 1
//! $$
//!
//! Rebalancing trades and the realized track record of fixed weights.

use std::collections::BTreeMap;

use chrono::Datelike;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use super::data::ReturnsMatrix;
use super::optimizer::PortfolioAllocation;
use super::optimizer::PortfolioOptimizer;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::series::PriceSeries;
use crate::stats;
use crate::stats::safe_ratio;

/// Weight changes whose magnitude strictly exceeds `threshold`.
///
/// Symbols held in `current` but absent from `target` are closed out.
pub fn rebalance(
  current: &BTreeMap<String, f64>,
  target: &BTreeMap<String, f64>,
  threshold: f64,
) -> BTreeMap<String, f64> {
  target
    .keys()
    .chain(current.keys())
    .filter_map(|symbol| {
      let diff = target.get(symbol).copied().unwrap_or(0.0) - current.get(symbol).copied().unwrap_or(0.0);
      (diff.abs() > threshold).then(|| (symbol.clone(), diff))
    })
    .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPerformance {
  pub total_return: f64,
  pub annualized_return: f64,
  pub volatility: f64,
  pub sharpe_ratio: f64,
  /// Largest fall of the cumulative-return curve below its running peak.
  pub max_drawdown: f64,
  pub var_95: f64,
  pub best_month: f64,
  pub worst_month: f64,
  pub periods: usize,
}

/// `max(cummax(cumsum(r)) - cumsum(r))`, non-negative.
pub fn cumulative_drawdown(returns: &[f64]) -> f64 {
  let mut cum = 0.0;
  let mut peak = f64::NEG_INFINITY;
  let mut worst: f64 = 0.0;
  for r in returns {
    cum += r;
    peak = peak.max(cum);
    worst = worst.max(peak - cum);
  }
  worst
}

/// Sum of returns per calendar month, in date order.
pub fn monthly_sums(dates: &[NaiveDate], returns: &[f64]) -> Vec<f64> {
  let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
  for (d, r) in dates.iter().zip(returns) {
    *months.entry((d.year(), d.month())).or_insert(0.0) += r;
  }
  months.into_values().collect()
}

impl PortfolioOptimizer {
  /// Trades moving `current` to `target` using the configured threshold.
  pub fn rebalance(
    &self,
    current: &BTreeMap<String, f64>,
    target: &PortfolioAllocation,
  ) -> BTreeMap<String, f64> {
    let target: BTreeMap<String, f64> = target.weights.iter().cloned().collect();
    rebalance(current, &target, self.config().rebalance_threshold)
  }

  /// Track record of `weights` held over `[start, end]`.
  ///
  /// Weighted symbols without a series are skipped with a warning; the
  /// remaining series are joined on the dates they share.
  pub fn historical_performance(
    &self,
    weights: &[(String, f64)],
    series: &[PriceSeries],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PortfolioPerformance> {
    let mut held = Vec::with_capacity(weights.len());
    let mut w = Vec::with_capacity(weights.len());
    for (symbol, weight) in weights {
      match series.iter().find(|s| s.symbol() == symbol) {
        Some(s) => {
          held.push(s.between(start, end));
          w.push(*weight);
        }
        None => warn!(symbol = %symbol, "no price history for weighted symbol, skipping"),
      }
    }

    let data = ReturnsMatrix::from_series(&held)?;
    if data.n_periods() == 0 {
      return Err(AnalyticsError::InvalidData(format!(
        "no common returns between {start} and {end}"
      )));
    }

    let returns = data.portfolio_returns(&w);
    let periods = returns.len();
    let trading_days = self.trading_days();
    let total_return = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
    let volatility = stats::sample_std(&returns) * trading_days.sqrt();
    let months = monthly_sums(data.dates(), &returns);

    Ok(PortfolioPerformance {
      total_return,
      annualized_return: (1.0 + total_return).powf(trading_days / periods as f64) - 1.0,
      volatility,
      sharpe_ratio: safe_ratio(
        stats::mean(&returns) * trading_days - self.risk_free_rate(),
        volatility,
      ),
      max_drawdown: cumulative_drawdown(&returns),
      var_95: stats::percentile(&returns, (1.0 - self.var_confidence()) * 100.0),
      best_month: months.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
      worst_month: months.iter().cloned().fold(f64::INFINITY, f64::min),
      periods,
    })
  }
}
