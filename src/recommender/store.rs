//! # Recommendation Store
//!
//! $$
//! \text{load}(\text{save}(L)) = L
//! $$
//!
//! CSV persistence of ranked lists with `symbol,score,rank,timestamp,metrics.*`
//! columns.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use super::Recommendation;
use crate::error::Result;
use crate::processor::MarketIndicatorsSnapshot;

/// Flat CSV row; nested snapshot fields use dotted column names.
#[derive(Debug, Serialize, Deserialize)]
struct RecommendationRow {
  symbol: String,
  score: f64,
  rank: usize,
  timestamp: DateTime<Utc>,
  #[serde(rename = "metrics.rsi")]
  rsi: Option<f64>,
  #[serde(rename = "metrics.macd")]
  macd: f64,
  #[serde(rename = "metrics.macd_signal")]
  macd_signal: f64,
  #[serde(rename = "metrics.volatility")]
  volatility: f64,
  #[serde(rename = "metrics.sma_signal")]
  sma_signal: f64,
  #[serde(rename = "metrics.volume_change")]
  volume_change: f64,
  #[serde(rename = "metrics.price_momentum")]
  price_momentum: f64,
}

impl From<&Recommendation> for RecommendationRow {
  fn from(r: &Recommendation) -> Self {
    let m = &r.metrics;
    Self {
      symbol: r.symbol.clone(),
      score: r.score,
      rank: r.rank,
      timestamp: r.timestamp,
      rsi: m.rsi,
      macd: m.macd,
      macd_signal: m.macd_signal,
      volatility: m.volatility,
      sma_signal: m.sma_signal,
      volume_change: m.volume_change,
      price_momentum: m.price_momentum,
    }
  }
}

impl From<RecommendationRow> for Recommendation {
  fn from(r: RecommendationRow) -> Self {
    Self {
      symbol: r.symbol,
      score: r.score,
      rank: r.rank,
      timestamp: r.timestamp,
      metrics: MarketIndicatorsSnapshot {
        rsi: r.rsi,
        macd: r.macd,
        macd_signal: r.macd_signal,
        volatility: r.volatility,
        sma_signal: r.sma_signal,
        volume_change: r.volume_change,
        price_momentum: r.price_momentum,
      },
    }
  }
}

#[derive(Clone, Debug)]
pub struct RecommendationStore {
  path: PathBuf,
}

impl RecommendationStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// `recommendations.csv` inside `dir`.
  pub fn in_dir(dir: impl AsRef<Path>) -> Self {
    Self::new(dir.as_ref().join("recommendations.csv"))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn save(&self, recommendations: &[Recommendation]) -> Result<()> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(&self.path)?;
    for rec in recommendations {
      writer.serialize(RecommendationRow::from(rec))?;
    }
    writer.flush()?;

    info!(
      path = %self.path.display(),
      count = recommendations.len(),
      "saved recommendations"
    );
    Ok(())
  }

  pub fn load(&self) -> Result<Vec<Recommendation>> {
    let mut reader = csv::Reader::from_path(&self.path)?;
    reader
      .deserialize::<RecommendationRow>()
      .map(|row| Ok(Recommendation::from(row?)))
      .collect()
  }

  /// Like [`load`](Self::load), but a missing or unreadable file yields an
  /// empty list.
  pub fn load_or_empty(&self) -> Vec<Recommendation> {
    self.load().unwrap_or_else(|e| {
      warn!(path = %self.path.display(), error = %e, "could not load recommendations");
      Vec::new()
    })
  }
}
