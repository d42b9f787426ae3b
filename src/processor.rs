//! # Data Processor
//!
//! $$
//! s = 0.3\,\mathbb 1[30\le RSI\le 70] + 0.3\,\mathbb 1[MACD>Sig] + 0.2\,\mathbb 1[SMA_s>SMA_m] + 0.2\,\mathbb 1[\Delta V>0]
//! $$
//!
//! Turns a raw [`PriceSeries`] into an [`IndicatorFrame`] and reduces the
//! frame's latest row to a recommendation score.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::indicators;
use crate::indicators::latest;
use crate::indicators::signals::RSI_LOWER;
use crate::indicators::signals::RSI_UPPER;
use crate::indicators::Column;
use crate::indicators::IndicatorSignals;
use crate::indicators::LatestIndicators;
use crate::indicators::Signal;
use crate::risk::rating::VOLATILITY_BANDS;
use crate::series::PriceSeries;
use crate::series::RawPriceRow;
use crate::stats;

pub use store::CsvPriceStore;
pub use store::InMemorySource;
pub use store::PriceSource;

/// A price series extended column-wise with every derived indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorFrame {
  series: PriceSeries,
  pub rsi: Column,
  pub macd: Column,
  pub signal_line: Column,
  pub sma_short: Column,
  pub sma_medium: Column,
  pub sma_long: Column,
  pub ema_short: Column,
  pub ema_medium: Column,
  pub bb_upper: Column,
  pub bb_middle: Column,
  pub bb_lower: Column,
  pub momentum: Column,
  pub volatility: Column,
  pub obv: Column,
  pub volume_ma: Column,
  pub pvt: Column,
  pub stoch_k: Column,
  pub stoch_d: Column,
  pub atr: Column,
  pub price_change: Column,
  pub volume_change: Column,
  pub average_price: Column,
  pub sma_signal: Column,
  pub macd_signal: Column,
}

/// Scalar view of the latest row used for scoring and reporting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketIndicatorsSnapshot {
  /// Missing when the latest RSI window had neither gains nor losses.
  pub rsi: Option<f64>,
  pub macd: f64,
  pub macd_signal: f64,
  pub volatility: f64,
  pub sma_signal: f64,
  pub volume_change: f64,
  /// Mean of the most recent short-window price changes.
  pub price_momentum: f64,
}

fn pct_change_column(values: &[f64]) -> Column {
  std::iter::once(None)
    .chain(stats::pct_change(values).into_iter().map(Some))
    .collect()
}

fn sign_column(a: &[Option<f64>], b: &[Option<f64>]) -> Column {
  a.iter()
    .zip(b.iter())
    .map(|(x, y)| Some(if (*x)? > (*y)? { 1.0 } else { -1.0 }))
    .collect()
}

fn require(column: &[Option<f64>], name: &str) -> Result<f64> {
  latest(column).ok_or_else(|| AnalyticsError::InvalidData(format!("{name} is undefined on the latest row")))
}

impl IndicatorFrame {
  pub fn series(&self) -> &PriceSeries {
    &self.series
  }

  pub fn symbol(&self) -> &str {
    self.series.symbol()
  }

  pub fn len(&self) -> usize {
    self.series.len()
  }

  pub fn is_empty(&self) -> bool {
    self.series.is_empty()
  }

  /// Derived columns in export order, keyed by their column name.
  pub fn columns(&self) -> Vec<(&'static str, &Column)> {
    vec![
      ("RSI", &self.rsi),
      ("MACD", &self.macd),
      ("Signal_Line", &self.signal_line),
      ("SMA_short", &self.sma_short),
      ("SMA_medium", &self.sma_medium),
      ("SMA_long", &self.sma_long),
      ("EMA_short", &self.ema_short),
      ("EMA_medium", &self.ema_medium),
      ("BB_Upper", &self.bb_upper),
      ("BB_Middle", &self.bb_middle),
      ("BB_Lower", &self.bb_lower),
      ("Momentum", &self.momentum),
      ("Volatility", &self.volatility),
      ("OBV", &self.obv),
      ("Volume_MA", &self.volume_ma),
      ("PVT", &self.pvt),
      ("Stoch_K", &self.stoch_k),
      ("Stoch_D", &self.stoch_d),
      ("ATR", &self.atr),
      ("Price_Change", &self.price_change),
      ("Volume_Change", &self.volume_change),
      ("Average_Price", &self.average_price),
      ("SMA_Signal", &self.sma_signal),
      ("MACD_Signal", &self.macd_signal),
    ]
  }

  pub fn latest_indicators(&self) -> LatestIndicators {
    let last = self.series.records().last();
    LatestIndicators {
      close: last.map(|r| r.close),
      volume: last.map(|r| r.volume as f64),
      rsi: latest(&self.rsi),
      macd: latest(&self.macd),
      macd_signal: latest(&self.signal_line),
      bb_upper: latest(&self.bb_upper),
      bb_lower: latest(&self.bb_lower),
      sma_short: latest(&self.sma_short),
      sma_medium: latest(&self.sma_medium),
      volume_ma: latest(&self.volume_ma),
      stoch_k: latest(&self.stoch_k),
      stoch_d: latest(&self.stoch_d),
    }
  }

  /// Discrete votes of the latest row.
  pub fn signals(&self) -> IndicatorSignals {
    IndicatorSignals::from_latest(&self.latest_indicators())
  }

  /// Latest-row snapshot; `momentum_window` is the number of trailing price
  /// changes averaged into `price_momentum`.
  pub fn snapshot(&self, momentum_window: usize) -> Result<MarketIndicatorsSnapshot> {
    let recent: Vec<f64> = self
      .price_change
      .iter()
      .rev()
      .take(momentum_window)
      .flatten()
      .copied()
      .collect();

    Ok(MarketIndicatorsSnapshot {
      rsi: latest(&self.rsi),
      macd: require(&self.macd, "MACD")?,
      macd_signal: require(&self.signal_line, "Signal_Line")?,
      volatility: require(&self.volatility, "Volatility")?,
      sma_signal: require(&self.sma_signal, "SMA_Signal")?,
      volume_change: require(&self.volume_change, "Volume_Change")?,
      price_momentum: stats::mean(&recent),
    })
  }
}

/// Per-symbol cleaning, indicator computation and scoring.
#[derive(Clone, Debug, Default)]
pub struct DataProcessor {
  config: AnalyticsConfig,
}

impl DataProcessor {
  pub fn new(config: AnalyticsConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &AnalyticsConfig {
    &self.config
  }

  /// Drop rows with non-finite prices or zero volume.
  pub fn clean(&self, series: &PriceSeries) -> PriceSeries {
    let kept: Vec<_> = series
      .records()
      .iter()
      .filter(|r| {
        r.volume > 0 && [r.open, r.high, r.low, r.close].iter().all(|v| v.is_finite())
      })
      .copied()
      .collect();
    if kept.len() < series.len() {
      warn!(
        symbol = series.symbol(),
        dropped = series.len() - kept.len(),
        "dropped rows with zero volume or invalid prices"
      );
    }
    PriceSeries::new(series.symbol(), kept)
  }

  /// Clean raw upstream rows and process them.
  pub fn process_raw(&self, symbol: &str, rows: Vec<RawPriceRow>) -> Result<IndicatorFrame> {
    self.process(&PriceSeries::from_raw(symbol, rows))
  }

  /// Clean `series` and compute every indicator column.
  pub fn process(&self, series: &PriceSeries) -> Result<IndicatorFrame> {
    let series = self.clean(series);
    let required = self.config.required_history();
    if series.len() < required {
      return Err(AnalyticsError::insufficient("price history", required, series.len()));
    }

    let w = &self.config.windows;
    let p = &self.config.indicators;
    let close = series.closes();
    let high = series.highs();
    let low = series.lows();
    let volume = series.volumes();

    let macd = indicators::macd(&close, p.macd_fast, p.macd_slow, p.macd_signal)?;
    let bb = indicators::bollinger_bands(&close, p.bollinger_period, p.bollinger_k)?;
    let stoch = indicators::stochastic(&high, &low, &close, p.stochastic_k, p.stochastic_d)?;
    let sma_short = indicators::sma(&close, w.short)?;
    let sma_medium = indicators::sma(&close, w.medium)?;
    let sma_signal = sign_column(&sma_short, &sma_medium);
    let macd_signal = sign_column(&macd.macd, &macd.signal);
    let average_price = series
      .records()
      .iter()
      .map(|r| Some(r.typical_price()))
      .collect();

    let frame = IndicatorFrame {
      rsi: indicators::rsi(&close, p.rsi_period)?,
      sma_long: indicators::sma(&close, w.long)?,
      ema_short: indicators::ema(&close, w.short)?,
      ema_medium: indicators::ema(&close, w.medium)?,
      momentum: indicators::momentum(&close, p.momentum_period)?,
      volatility: indicators::return_volatility(&close, p.volatility_period)?,
      obv: indicators::obv(&close, &volume)?,
      volume_ma: indicators::volume_ma(&volume, p.volume_ma_period)?,
      pvt: indicators::pvt(&close, &volume)?,
      atr: indicators::atr(&high, &low, &close, p.atr_period)?,
      price_change: pct_change_column(&close),
      volume_change: pct_change_column(&volume),
      macd: macd.macd,
      signal_line: macd.signal,
      bb_upper: bb.upper,
      bb_middle: bb.middle,
      bb_lower: bb.lower,
      stoch_k: stoch.k,
      stoch_d: stoch.d,
      sma_short,
      sma_medium,
      sma_signal,
      macd_signal,
      average_price,
      series,
    };

    Ok(frame)
  }

  /// Latest-row snapshot of a processed frame.
  pub fn snapshot(&self, frame: &IndicatorFrame) -> Result<MarketIndicatorsSnapshot> {
    frame.snapshot(self.config.windows.short)
  }

  /// Weighted four-component score in `[0, 1]`.
  pub fn score(&self, frame: &IndicatorFrame) -> Result<f64> {
    let snap = self.snapshot(frame)?;
    let w = &self.config.score_weights;

    let components = [
      (w.rsi, snap.rsi.is_some_and(|r| (RSI_LOWER..=RSI_UPPER).contains(&r))),
      (w.macd, snap.macd > snap.macd_signal),
      (w.trend, snap.sma_signal > 0.0),
      (w.volume, snap.volume_change > 0.0),
    ];
    let score: f64 = components
      .iter()
      .filter(|(_, hit)| *hit)
      .map(|(weight, _)| weight)
      .sum();

    debug!(symbol = frame.symbol(), score, "scored frame");
    Ok(score.clamp(0.0, 1.0))
  }

  /// [`process`](Self::process) followed by [`score`](Self::score).
  pub fn score_series(&self, series: &PriceSeries) -> Result<f64> {
    let frame = self.process(series)?;
    self.score(&frame)
  }

  /// Technical/volume/trend/volatility composite in `[0, 1]`.
  ///
  /// The technical part maps the overall vote to `{0, 0.5, 1}`; the volatility
  /// part rewards an annualized latest volatility below the medium risk band.
  pub fn composite_score(&self, frame: &IndicatorFrame) -> Result<f64> {
    let snap = self.snapshot(frame)?;
    let signals = frame.signals();
    let w = &self.config.composite_weights;

    let technical = match signals.overall {
      Signal::Buy => 1.0,
      Signal::Neutral => 0.5,
      Signal::Sell => 0.0,
    };
    let volume = if signals.volume == Signal::Buy { 1.0 } else { 0.0 };
    let trend = if snap.sma_signal > 0.0 { 1.0 } else { 0.0 };
    let annual_vol = snap.volatility * self.config.risk.annualization();
    let volatility = if annual_vol < VOLATILITY_BANDS[1] { 1.0 } else { 0.0 };

    Ok(
      (w.technical * technical + w.volume * volume + w.trend * trend + w.volatility * volatility)
        .clamp(0.0, 1.0),
    )
  }
}

/// Memoization key of a processed frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameKey {
  pub symbol: String,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub rows: usize,
}

impl FrameKey {
  /// `None` for an empty series.
  pub fn of(series: &PriceSeries) -> Option<Self> {
    Some(Self {
      symbol: series.symbol().to_string(),
      start: series.first_date()?,
      end: series.last_date()?,
      rows: series.len(),
    })
  }
}

/// Explicit cache of processed frames keyed by symbol and date range.
#[derive(Clone, Debug, Default)]
pub struct FrameCache {
  frames: HashMap<FrameKey, Arc<IndicatorFrame>>,
}

impl FrameCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &FrameKey) -> Option<Arc<IndicatorFrame>> {
    self.frames.get(key).cloned()
  }

  /// Return the cached frame of `series`, processing it on a miss.
  pub fn get_or_process(
    &mut self,
    processor: &DataProcessor,
    series: &PriceSeries,
  ) -> Result<Arc<IndicatorFrame>> {
    let Some(key) = FrameKey::of(series) else {
      return Err(AnalyticsError::insufficient(
        "price history",
        processor.config().required_history(),
        0,
      ));
    };
    if let Some(frame) = self.frames.get(&key) {
      return Ok(Arc::clone(frame));
    }

    let frame = Arc::new(processor.process(series)?);
    self.frames.insert(key, Arc::clone(&frame));
    Ok(frame)
  }

  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  pub fn clear(&mut self) {
    self.frames.clear();
  }
}
