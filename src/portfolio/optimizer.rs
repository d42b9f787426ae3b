//! # Portfolio Optimizer
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta_{[l,u]}}
//! \frac{252\,\mu^\top\mathbf{w}-r_f}{\sqrt{252\,\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Long-only max-Sharpe allocation over the box-constrained simplex
//! $\Delta_{[l,u]} = \{\mathbf w : \sum_i w_i = 1,\ l \le w_i \le u\}$.
//! Nelder-Mead searches an unconstrained parameter vector that is mapped onto
//! $\Delta_{[l,u]}$ by a softmax followed by a Euclidean projection.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::data::ReturnsMatrix;
use crate::config::AnalyticsConfig;
use crate::config::PortfolioConfig;
use crate::config::RiskConfig;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::series::PriceSeries;
use crate::stats;
use crate::stats::safe_ratio;

/// Volatility floor of the objective, keeping it finite at riskless points.
const MIN_VOLATILITY: f64 = 1e-12;

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

/// Euclidean projection of `w` onto `{sum = 1, lo <= w_i <= hi}`.
///
/// The projection is `clamp(w_i + tau, lo, hi)` for the shift `tau` making
/// the sum one, found by bisection. Requires `n * lo <= 1 <= n * hi`.
fn project_to_bounds(w: &[f64], lo: f64, hi: f64) -> Vec<f64> {
  let shifted_sum = |tau: f64| -> f64 { w.iter().map(|&v| (v + tau).clamp(lo, hi)).sum() };

  let max_w = w.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let min_w = w.iter().cloned().fold(f64::INFINITY, f64::min);
  let mut a = lo - max_w;
  let mut b = hi - min_w;
  for _ in 0..200 {
    let mid = 0.5 * (a + b);
    if shifted_sum(mid) < 1.0 {
      a = mid;
    } else {
      b = mid;
    }
  }

  let tau = 0.5 * (a + b);
  w.iter().map(|&v| (v + tau).clamp(lo, hi)).collect()
}

/// Simplex around `x0` along each unit direction.
fn unit_simplex(x0: &[f64]) -> Vec<Vec<f64>> {
  let mut simplex = Vec::with_capacity(x0.len() + 1);
  simplex.push(x0.to_vec());
  for i in 0..x0.len() {
    let mut point = x0.to_vec();
    point[i] += 1.0;
    simplex.push(point);
  }
  simplex
}

fn quad_form(cov: &Array2<f64>, w: &Array1<f64>) -> f64 {
  w.dot(&cov.dot(w)).max(0.0)
}

/// Annualized return, volatility and Sharpe of a weight vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
  pub expected_return: f64,
  pub volatility: f64,
  pub sharpe_ratio: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
  /// `(symbol, weight)` in input order.
  pub weights: Vec<(String, f64)>,
  pub expected_return: f64,
  pub volatility: f64,
  pub sharpe_ratio: f64,
  /// Beta of the portfolio against the benchmark asset.
  pub beta: f64,
  /// Daily 95% VaR of the weighted return series.
  pub var_95: f64,
}

impl PortfolioAllocation {
  pub fn weight(&self, symbol: &str) -> Option<f64> {
    self
      .weights
      .iter()
      .find(|(s, _)| s == symbol)
      .map(|(_, w)| *w)
  }

  pub fn weight_values(&self) -> Vec<f64> {
    self.weights.iter().map(|(_, w)| *w).collect()
  }
}

/// Negative Sharpe ratio of the projected softmax weights.
struct NegativeSharpe {
  mu: Array1<f64>,
  cov: Array2<f64>,
  risk_free: f64,
  annualization: f64,
  lo: f64,
  hi: f64,
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let w = Array1::from(project_to_bounds(&softmax(x), self.lo, self.hi));
    let ret = self.mu.dot(&w) * self.annualization;
    let vol = (quad_form(&self.cov, &w) * self.annualization).sqrt();
    Ok(-(ret - self.risk_free) / vol.max(MIN_VOLATILITY))
  }
}

#[derive(Clone, Debug, Default)]
pub struct PortfolioOptimizer {
  risk: RiskConfig,
  config: PortfolioConfig,
}

impl PortfolioOptimizer {
  pub fn new(risk: RiskConfig, config: PortfolioConfig) -> Self {
    Self { risk, config }
  }

  pub fn from_config(config: &AnalyticsConfig) -> Self {
    Self::new(config.risk.clone(), config.portfolio.clone())
  }

  pub fn config(&self) -> &PortfolioConfig {
    &self.config
  }

  pub(crate) fn trading_days(&self) -> f64 {
    self.risk.trading_days as f64
  }

  pub(crate) fn risk_free_rate(&self) -> f64 {
    self.risk.risk_free_rate
  }

  pub(crate) fn var_confidence(&self) -> f64 {
    self.risk.var_confidence
  }

  /// Annualized return, volatility and Sharpe of `weights`.
  pub fn metrics(&self, data: &ReturnsMatrix, weights: &[f64]) -> FrontierPoint {
    let w = Array1::from(weights.to_vec());
    let expected_return = data.mean_returns().dot(&w) * self.trading_days();
    let volatility = (quad_form(&data.covariance(), &w) * self.trading_days()).sqrt();
    FrontierPoint {
      expected_return,
      volatility,
      sharpe_ratio: safe_ratio(expected_return - self.risk.risk_free_rate, volatility),
    }
  }

  /// Beta of the weighted return series against the configured benchmark
  /// asset, or the first asset when none is configured.
  pub fn portfolio_beta(&self, data: &ReturnsMatrix, weights: &[f64]) -> f64 {
    let bench = self
      .config
      .benchmark
      .as_deref()
      .and_then(|s| data.position(s))
      .unwrap_or(0);
    if bench >= data.n_assets() {
      return 0.0;
    }

    let market = data.column(bench);
    let portfolio = data.portfolio_returns(weights);
    safe_ratio(
      stats::sample_covariance(&portfolio, &market),
      stats::sample_variance(&market),
    )
  }

  pub fn portfolio_var(&self, data: &ReturnsMatrix, weights: &[f64]) -> f64 {
    let confidence = self.var_confidence();
    stats::percentile(&data.portfolio_returns(weights), (1.0 - confidence) * 100.0)
  }

  /// Full allocation record of `weights`.
  pub fn evaluate(&self, data: &ReturnsMatrix, weights: &[f64]) -> PortfolioAllocation {
    let m = self.metrics(data, weights);
    PortfolioAllocation {
      weights: data
        .symbols()
        .iter()
        .cloned()
        .zip(weights.iter().copied())
        .collect(),
      expected_return: m.expected_return,
      volatility: m.volatility,
      sharpe_ratio: m.sharpe_ratio,
      beta: self.portfolio_beta(data, weights),
      var_95: self.portfolio_var(data, weights),
    }
  }

  fn check_feasible(&self, n: usize) -> Result<(f64, f64)> {
    if n < 2 {
      return Err(AnalyticsError::Optimization(format!(
        "need at least 2 assets, got {n}"
      )));
    }

    let (lo, hi) = (self.config.min_weight, self.config.max_weight);
    if lo > hi || lo * n as f64 > 1.0 + 1e-12 || hi * (n as f64) < 1.0 - 1e-12 {
      return Err(AnalyticsError::Optimization(format!(
        "weight bounds [{lo}, {hi}] are infeasible for {n} assets"
      )));
    }
    Ok((lo, hi))
  }

  /// Sharpe-maximizing weights, seeded at equal weights.
  ///
  /// Hitting the iteration cap is not an error: the best point found is
  /// returned and a warning is emitted.
  pub fn optimize(&self, data: &ReturnsMatrix) -> Result<PortfolioAllocation> {
    let n = data.n_assets();
    let (lo, hi) = self.check_feasible(n)?;
    if data.n_periods() < 2 {
      return Err(AnalyticsError::insufficient("portfolio returns", 2, data.n_periods()));
    }

    let cost = NegativeSharpe {
      mu: data.mean_returns(),
      cov: data.covariance(),
      risk_free: self.risk.risk_free_rate,
      annualization: self.trading_days(),
      lo,
      hi,
    };

    let x0 = vec![0.0; n];
    let solver = NelderMead::new(unit_simplex(&x0))
      .with_sd_tolerance(self.config.tolerance)
      .map_err(|e| AnalyticsError::Optimization(e.to_string()))?;

    let res = Executor::new(cost, solver)
      .configure(|state| state.max_iters(self.config.max_iters))
      .run()
      .map_err(|e| AnalyticsError::Optimization(e.to_string()))?;

    if let Some(TerminationReason::MaxItersReached) = res.state.get_termination_reason() {
      warn!(
        max_iters = self.config.max_iters,
        "portfolio optimization did not converge, using best point found"
      );
    }
    debug!(iters = res.state.get_iter(), "portfolio optimization finished");

    let best = res.state.best_param.unwrap_or(x0);
    let weights = project_to_bounds(&softmax(&best), lo, hi);

    Ok(self.evaluate(data, &weights))
  }

  /// Align `series` on common dates and optimize.
  pub fn optimize_series(&self, series: &[PriceSeries]) -> Result<PortfolioAllocation> {
    self.optimize(&ReturnsMatrix::from_series(series)?)
  }

  /// `frontier_samples` random long-only portfolios, unsorted.
  pub fn efficient_frontier(&self, data: &ReturnsMatrix) -> Result<Vec<FrontierPoint>> {
    self.efficient_frontier_with(data, self.config.frontier_samples)
  }

  /// `samples` random long-only portfolios, unsorted.
  ///
  /// Uses the configured seed when present so runs are reproducible.
  pub fn efficient_frontier_with(
    &self,
    data: &ReturnsMatrix,
    samples: usize,
  ) -> Result<Vec<FrontierPoint>> {
    let n = data.n_assets();
    if n == 0 {
      return Err(AnalyticsError::Optimization("no assets to sample".into()));
    }

    let mut rng = match self.config.frontier_seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };

    let points = (0..samples)
      .map(|_| {
        let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f64> = if total > 0.0 {
          raw.iter().map(|w| w / total).collect()
        } else {
          vec![1.0 / n as f64; n]
        };
        self.metrics(data, &weights)
      })
      .collect();

    Ok(points)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::series::tests::record;

  fn matrix(columns: &[Vec<f64>]) -> ReturnsMatrix {
    let symbols = (0..columns.len()).map(|i| format!("S{i}")).collect();
    ReturnsMatrix::from_returns(symbols, columns).unwrap()
  }

  fn noisy(seed: u64, mean: f64, len: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| mean + 0.02 * (rng.gen::<f64>() - 0.5)).collect()
  }

  #[test]
  fn projection_respects_bounds_and_sum() {
    let w = project_to_bounds(&[0.7, 0.2, 0.1], 0.1, 0.5);
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    assert!(w.iter().all(|&v| (0.1 - 1e-12..=0.5 + 1e-12).contains(&v)));
    assert_abs_diff_eq!(w[0], 0.5, epsilon = 1e-9);
  }

  #[test]
  fn anti_correlated_assets_split_evenly() {
    let noise: Vec<f64> = (0..250).map(|t| 0.01 * (t as f64 * 0.37).sin()).collect();
    let a: Vec<f64> = noise.iter().map(|e| 0.001 + e).collect();
    let b: Vec<f64> = noise.iter().map(|e| 0.001 - e).collect();

    let allocation = PortfolioOptimizer::default().optimize(&matrix(&[a, b])).unwrap();
    assert_abs_diff_eq!(allocation.weights[0].1, 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(allocation.weights[1].1, 0.5, epsilon = 1e-6);
    assert!(allocation.volatility < 1e-6);
  }

  #[test]
  fn weights_sum_to_one_within_bounds() {
    let optimizer = PortfolioOptimizer::new(
      RiskConfig::default(),
      PortfolioConfig {
        min_weight: 0.1,
        max_weight: 0.6,
        ..PortfolioConfig::default()
      },
    );
    let data = matrix(&[noisy(1, 0.002, 200), noisy(2, 0.0005, 200), noisy(3, -0.001, 200)]);
    let allocation = optimizer.optimize(&data).unwrap();

    let weights = allocation.weight_values();
    assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
    for w in weights {
      assert!((0.1 - 1e-9..=0.6 + 1e-9).contains(&w), "weight {w}");
    }
    assert!(allocation.weight("S0").unwrap() >= allocation.weight("S2").unwrap());
  }

  #[test]
  #[traced_test]
  fn iteration_cap_warns_and_returns_best_point() {
    let optimizer = PortfolioOptimizer::new(
      RiskConfig::default(),
      PortfolioConfig {
        max_iters: 2,
        ..PortfolioConfig::default()
      },
    );
    let data = matrix(&[noisy(1, 0.002, 200), noisy(2, 0.0005, 200), noisy(3, -0.001, 200)]);
    let allocation = optimizer.optimize(&data).unwrap();

    assert_abs_diff_eq!(allocation.weight_values().iter().sum::<f64>(), 1.0, epsilon = 1e-6);
    assert!(logs_contain("did not converge"));
  }

  #[test]
  fn single_asset_is_rejected() {
    let err = PortfolioOptimizer::default()
      .optimize(&matrix(&[noisy(1, 0.0, 10)]))
      .unwrap_err();
    assert!(matches!(err, AnalyticsError::Optimization(_)));
  }

  #[test]
  fn infeasible_bounds_are_rejected() {
    let optimizer = PortfolioOptimizer::new(
      RiskConfig::default(),
      PortfolioConfig {
        max_weight: 0.3,
        ..PortfolioConfig::default()
      },
    );
    let data = matrix(&[noisy(1, 0.0, 10), noisy(2, 0.0, 10)]);
    assert!(matches!(
      optimizer.optimize(&data),
      Err(AnalyticsError::Optimization(_))
    ));
  }

  #[test]
  fn seeded_frontier_is_reproducible() {
    let optimizer = PortfolioOptimizer::new(
      RiskConfig::default(),
      PortfolioConfig {
        frontier_seed: Some(7),
        ..PortfolioConfig::default()
      },
    );
    let data = matrix(&[noisy(1, 0.001, 100), noisy(2, 0.0, 100)]);

    let a = optimizer.efficient_frontier_with(&data, 50).unwrap();
    let b = optimizer.efficient_frontier_with(&data, 50).unwrap();
    assert_eq!(a.len(), 50);
    assert_eq!(a, b);
    assert!(a.iter().all(|p| p.volatility >= 0.0));
  }

  #[test]
  fn default_frontier_uses_configured_sample_count() {
    let data = matrix(&[noisy(1, 0.001, 60), noisy(2, 0.0, 60)]);
    let points = PortfolioOptimizer::default().efficient_frontier(&data).unwrap();
    assert_eq!(points.len(), 1000);
  }

  #[test]
  fn disjoint_histories_are_rejected() {
    let a = PriceSeries::new("A", (0..50).map(|i| record(i, 10.0 + i as f64, 100)).collect());
    let b = PriceSeries::new(
      "B",
      (100..150).map(|i| record(i, 20.0 + i as f64, 100)).collect(),
    );

    let err = PortfolioOptimizer::default().optimize_series(&[a, b]).unwrap_err();
    assert!(matches!(
      err,
      AnalyticsError::InsufficientData { required: 2, available: 0, .. }
    ));
  }

  #[test]
  fn single_period_is_rejected() {
    let err = PortfolioOptimizer::default()
      .optimize(&matrix(&[vec![0.01], vec![-0.01]]))
      .unwrap_err();
    assert!(err.is_data_error());
  }

  #[test]
  fn beta_against_first_asset_of_itself_is_one() {
    let data = matrix(&[noisy(1, 0.001, 100), noisy(2, 0.0, 100)]);
    let beta = PortfolioOptimizer::default().portfolio_beta(&data, &[1.0, 0.0]);
    assert_abs_diff_eq!(beta, 1.0, epsilon = 1e-12);
  }
}
