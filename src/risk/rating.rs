//! # Risk Rating
//!
//! $$
//! S = s_\sigma + (4 - s_{SR}) + s_{DD},\qquad S\in[2,12]
//! $$
//!
//! Categorical rating from annualized volatility, Sharpe ratio and maximum
//! drawdown.

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

/// Annualized volatility band edges (low, medium, high).
pub const VOLATILITY_BANDS: [f64; 3] = [0.15, 0.25, 0.35];
/// Sharpe thresholds (poor, fair, good); strictly exceeded to score.
pub const SHARPE_THRESHOLDS: [f64; 3] = [0.5, 1.0, 1.5];
/// Absolute drawdown band edges.
pub const DRAWDOWN_BANDS: [f64; 3] = [0.1, 0.2, 0.3];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskRating {
  Low,
  Medium,
  High,
  VeryHigh,
  Unknown,
}

/// 1 below the first edge, up to 4 at or above the last.
fn band_score(value: f64, edges: &[f64; 3]) -> u8 {
  1 + edges.iter().filter(|&&edge| value >= edge).count() as u8
}

impl RiskRating {
  /// Rate from annualized volatility, Sharpe ratio and (signed) max drawdown.
  pub fn rate(volatility: f64, sharpe_ratio: f64, max_drawdown: f64) -> Self {
    if !(volatility.is_finite() && sharpe_ratio.is_finite() && max_drawdown.is_finite()) {
      return RiskRating::Unknown;
    }

    let vol_score = band_score(volatility, &VOLATILITY_BANDS);
    let sharpe_score = SHARPE_THRESHOLDS
      .iter()
      .filter(|&&t| sharpe_ratio > t)
      .count() as u8;
    let dd_score = band_score(max_drawdown.abs(), &DRAWDOWN_BANDS);

    Self::from_total(vol_score + (4 - sharpe_score) + dd_score)
  }

  pub fn from_total(total: u8) -> Self {
    match total {
      0..=5 => RiskRating::Low,
      6..=8 => RiskRating::Medium,
      9..=11 => RiskRating::High,
      _ => RiskRating::VeryHigh,
    }
  }
}

impl Display for RiskRating {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let label = match self {
      RiskRating::Low => "Low Risk",
      RiskRating::Medium => "Medium Risk",
      RiskRating::High => "High Risk",
      RiskRating::VeryHigh => "Very High Risk",
      RiskRating::Unknown => "Unknown Risk",
    };
    f.write_str(label)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn calm_profitable_asset_is_low_risk() {
    let rating = RiskRating::rate(0.10, 2.0, -0.05);
    assert_eq!(rating, RiskRating::Low);
    assert_eq!(rating.to_string(), "Low Risk");
  }

  #[test]
  fn worst_case_is_very_high_risk() {
    assert_eq!(RiskRating::rate(0.6, -1.0, -0.5), RiskRating::VeryHigh);
  }

  #[test]
  fn band_edges_fall_into_the_upper_band() {
    assert_eq!(band_score(0.15, &VOLATILITY_BANDS), 2);
    assert_eq!(band_score(0.149, &VOLATILITY_BANDS), 1);
    // vol 2 + sharpe (4 - 1) + dd 2
    assert_eq!(RiskRating::rate(0.2, 0.75, -0.15), RiskRating::Medium);
  }

  #[test]
  fn nan_inputs_are_unknown() {
    assert_eq!(RiskRating::rate(f64::NAN, 1.0, -0.1), RiskRating::Unknown);
  }
}
