//! # Portfolio Data
//!
//! $$
//! \hat\Sigma = \frac{1}{T-1}(R-\bar R)^\top(R-\bar R)
//! $$
//!
//! Aligned asset returns as a `periods x assets` matrix.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::series::PriceSeries;
use crate::stats;

/// Align multiple return series to their common tail length.
pub fn align_return_series(all_returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let min_len = all_returns.iter().map(|r| r.len()).min().unwrap_or(0);
  all_returns
    .iter()
    .map(|r| r[r.len() - min_len..].to_vec())
    .collect()
}

/// Dates carried by every series, ascending.
pub fn common_dates(series: &[PriceSeries]) -> Vec<NaiveDate> {
  let Some((first, rest)) = series.split_first() else {
    return Vec::new();
  };

  let mut dates: BTreeSet<NaiveDate> = first.records().iter().map(|r| r.date).collect();
  for s in rest {
    let own: BTreeSet<NaiveDate> = s.records().iter().map(|r| r.date).collect();
    dates.retain(|d| own.contains(d));
  }
  dates.into_iter().collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnsMatrix {
  symbols: Vec<String>,
  /// Return dates; empty when built from undated series.
  dates: Vec<NaiveDate>,
  returns: Array2<f64>,
}

impl ReturnsMatrix {
  /// Simple returns of the closes on the dates every series shares.
  pub fn from_series(series: &[PriceSeries]) -> Result<Self> {
    let dates = common_dates(series);
    let columns: Vec<Vec<f64>> = series
      .iter()
      .map(|s| {
        let closes: Vec<f64> = s
          .records()
          .iter()
          .filter(|r| dates.binary_search(&r.date).is_ok())
          .map(|r| r.close)
          .collect();
        stats::pct_change(&closes)
      })
      .collect();

    let symbols = series.iter().map(|s| s.symbol().to_string()).collect();
    let mut matrix = Self::from_columns(symbols, &columns)?;
    matrix.dates = dates.into_iter().skip(1).collect();
    Ok(matrix)
  }

  /// Precomputed return series aligned on their common tail.
  pub fn from_returns(symbols: Vec<String>, returns: &[Vec<f64>]) -> Result<Self> {
    Self::from_columns(symbols, &align_return_series(returns))
  }

  fn from_columns(symbols: Vec<String>, columns: &[Vec<f64>]) -> Result<Self> {
    if symbols.len() != columns.len() {
      return Err(AnalyticsError::InvalidData(format!(
        "{} symbols for {} return series",
        symbols.len(),
        columns.len()
      )));
    }

    let periods = columns.first().map_or(0, Vec::len);
    let returns = Array2::from_shape_fn((periods, columns.len()), |(t, i)| columns[i][t]);
    Ok(Self {
      symbols,
      dates: Vec::new(),
      returns,
    })
  }

  pub fn symbols(&self) -> &[String] {
    &self.symbols
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn returns(&self) -> &Array2<f64> {
    &self.returns
  }

  pub fn n_assets(&self) -> usize {
    self.returns.ncols()
  }

  pub fn n_periods(&self) -> usize {
    self.returns.nrows()
  }

  pub fn position(&self, symbol: &str) -> Option<usize> {
    self.symbols.iter().position(|s| s == symbol)
  }

  pub fn column(&self, asset: usize) -> Vec<f64> {
    self.returns.column(asset).to_vec()
  }

  /// Mean daily return per asset.
  pub fn mean_returns(&self) -> Array1<f64> {
    self
      .returns
      .mean_axis(Axis(0))
      .unwrap_or_else(|| Array1::zeros(self.n_assets()))
  }

  /// Sample covariance of daily returns; zero with fewer than two periods.
  pub fn covariance(&self) -> Array2<f64> {
    let n = self.n_assets();
    let t = self.n_periods();
    if t < 2 {
      return Array2::zeros((n, n));
    }

    let centered = &self.returns - &self.mean_returns();
    centered.t().dot(&centered) / (t - 1) as f64
  }

  /// Daily returns of the fixed-weight portfolio.
  pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
    self.returns.dot(&Array1::from(weights.to_vec())).to_vec()
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::series::tests::day;
  use crate::series::tests::series_from_closes;

  #[test]
  fn from_series_joins_on_common_dates() {
    let a = series_from_closes("A", &[10.0, 11.0, 12.1, 13.31]);
    let b = series_from_closes("B", &[20.0, 22.0, 24.2]).between(day(1), day(2));

    let m = ReturnsMatrix::from_series(&[a, b]).unwrap();
    assert_eq!(m.n_periods(), 1);
    assert_eq!(m.dates(), &[day(2)]);
    assert_abs_diff_eq!(m.returns()[[0, 0]], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(m.returns()[[0, 1]], 0.1, epsilon = 1e-12);
  }

  #[test]
  fn from_returns_keeps_common_tail() {
    let m = ReturnsMatrix::from_returns(
      vec!["A".into(), "B".into()],
      &[vec![0.5, 0.1, 0.2, 0.3], vec![0.4, 0.6]],
    )
    .unwrap();
    assert_eq!(m.column(0), vec![0.2, 0.3]);
    assert_eq!(m.column(1), vec![0.4, 0.6]);
    assert!(m.dates().is_empty());
  }

  #[test]
  fn covariance_matches_pairwise_estimator() {
    let a = vec![0.01, -0.02, 0.03, 0.0, 0.01];
    let b = vec![0.02, 0.01, -0.01, 0.005, 0.0];
    let m = ReturnsMatrix::from_returns(vec!["A".into(), "B".into()], &[a.clone(), b.clone()]).unwrap();
    let cov = m.covariance();

    assert_abs_diff_eq!(cov[[0, 0]], stats::sample_variance(&a), epsilon = 1e-15);
    assert_abs_diff_eq!(cov[[0, 1]], stats::sample_covariance(&a, &b), epsilon = 1e-15);
    assert_abs_diff_eq!(cov[[1, 0]], cov[[0, 1]], epsilon = 1e-18);
  }

  #[test]
  fn mismatched_symbols_are_rejected() {
    let err = ReturnsMatrix::from_returns(vec!["A".into()], &[vec![0.1], vec![0.2]]).unwrap_err();
    assert!(err.is_data_error());
  }
}
