//! # Recommender
//!
//! $$
//! \text{rank}(s_1,\dots,s_n) = \operatorname{top}_N\,\operatorname{stable\,sort}_{\downarrow}\{(s_i, \text{score}_i) : \text{score}_i > 0\}
//! $$
//!
//! Scores a symbol universe through the [`DataProcessor`] and ranks it.

pub mod report;
pub mod store;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::indicators::IndicatorSignals;
use crate::processor::DataProcessor;
use crate::processor::MarketIndicatorsSnapshot;
use crate::processor::PriceSource;
use crate::risk::RiskAnalyzer;
use crate::stats;

pub use report::render_report;
pub use store::RecommendationStore;

/// One ranked entry of a recommendation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
  pub symbol: String,
  pub score: f64,
  pub metrics: MarketIndicatorsSnapshot,
  /// 1-based.
  pub rank: usize,
  pub timestamp: DateTime<Utc>,
}

/// Score and latest-row view of a single symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
  pub symbol: String,
  pub score: f64,
  pub composite_score: f64,
  pub metrics: MarketIndicatorsSnapshot,
  pub signals: IndicatorSignals,
}

/// Recent track record of a symbol over a calendar lookback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolPerformance {
  pub symbol: String,
  /// Sum of daily returns in the window.
  pub period_return: f64,
  /// Daily, not annualized.
  pub volatility: f64,
  /// Daily `mean / std` of returns.
  pub sharpe_ratio: f64,
  pub max_drawdown: f64,
  /// Mean daily volume change.
  pub volume_trend: f64,
}

pub struct Recommender<S> {
  source: S,
  processor: DataProcessor,
}

impl<S: PriceSource> Recommender<S> {
  pub fn new(source: S, config: AnalyticsConfig) -> Self {
    Self {
      source,
      processor: DataProcessor::new(config),
    }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  pub fn processor(&self) -> &DataProcessor {
    &self.processor
  }

  pub fn analyze(&self, symbol: &str) -> Result<StockAnalysis> {
    let series = self.source.load(symbol)?;
    let frame = self.processor.process(&series)?;
    let score = self.processor.score(&frame)?;
    debug!(symbol, score, "analyzed symbol");

    Ok(StockAnalysis {
      symbol: symbol.to_string(),
      score,
      composite_score: self.processor.composite_score(&frame)?,
      metrics: self.processor.snapshot(&frame)?,
      signals: frame.signals(),
    })
  }

  /// Rank `symbols` with a single run timestamp taken now.
  pub fn rank<T: AsRef<str> + Sync>(&self, symbols: &[T], top_n: usize) -> Vec<Recommendation> {
    self.rank_at(symbols, top_n, Utc::now())
  }

  /// Score every symbol, drop failures and non-positive scores, then keep the
  /// `top_n` best. Equal scores keep their input order.
  pub fn rank_at<T: AsRef<str> + Sync>(
    &self,
    symbols: &[T],
    top_n: usize,
    timestamp: DateTime<Utc>,
  ) -> Vec<Recommendation> {
    let analyses: Vec<Option<StockAnalysis>> = symbols
      .par_iter()
      .map(|symbol| {
        let symbol = symbol.as_ref();
        self
          .analyze(symbol)
          .map_err(|e| warn!(symbol, error = %e, "excluding symbol from ranking"))
          .ok()
      })
      .collect();

    let mut scored: Vec<StockAnalysis> = analyses
      .into_iter()
      .flatten()
      .filter(|a| a.score > 0.0)
      .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_n);

    scored
      .into_iter()
      .enumerate()
      .map(|(i, a)| Recommendation {
        symbol: a.symbol,
        score: a.score,
        metrics: a.metrics,
        rank: i + 1,
        timestamp,
      })
      .collect()
  }

  /// Performance over the last `lookback_days` calendar days of history.
  pub fn historical_performance(&self, symbol: &str, lookback_days: i64) -> Result<SymbolPerformance> {
    let series = self.source.load(symbol)?;
    let end = series
      .last_date()
      .ok_or_else(|| AnalyticsError::InvalidData(format!("no price history for {symbol}")))?;
    let start = end - Duration::days(lookback_days);

    let returns: Vec<f64> = series
      .dated_returns()
      .into_iter()
      .filter(|(d, _)| *d >= start)
      .map(|(_, r)| r)
      .collect();
    let window = series.since(start);
    let std = stats::sample_std(&returns);
    let analyzer = RiskAnalyzer::new(self.processor.config().risk.clone());

    Ok(SymbolPerformance {
      symbol: symbol.to_string(),
      period_return: returns.iter().sum(),
      volatility: std,
      sharpe_ratio: stats::safe_ratio(stats::mean(&returns), std),
      max_drawdown: analyzer.max_drawdown(&window.closes()).max_drawdown,
      volume_trend: stats::mean(&stats::pct_change(&window.volumes())),
    })
  }
}
