//! # Price Series
//!
//! $$
//! S = \{(t_i, O_i, H_i, L_i, C_i, V_i)\}_{i=1}^n,\quad t_1 < t_2 < \dots < t_n
//! $$
//!
//! Daily OHLCV records and the per-symbol ordered series built from them.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

/// One trading day of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: u64,
}

impl PriceRecord {
  /// `(high + low + close) / 3`.
  pub fn typical_price(&self) -> f64 {
    (self.high + self.low + self.close) / 3.0
  }
}

/// A row as delivered by upstream storage, before cleaning.
///
/// Any field may be empty; volume may be fractional or negative in dirty feeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
  pub date: Option<NaiveDate>,
  pub open: Option<f64>,
  pub high: Option<f64>,
  pub low: Option<f64>,
  pub close: Option<f64>,
  pub volume: Option<f64>,
}

impl RawPriceRow {
  /// Validate the row into a [`PriceRecord`].
  ///
  /// Rows with a missing date, any missing or non-finite OHLC price, or a
  /// volume that is missing or not positive are rejected.
  pub fn into_record(self) -> Option<PriceRecord> {
    let date = self.date?;
    let close = self.close.filter(|c| c.is_finite())?;
    let volume = self.volume.filter(|v| v.is_finite() && *v > 0.0)?;
    let open = self.open.filter(|v| v.is_finite())?;
    let high = self.high.filter(|v| v.is_finite())?;
    let low = self.low.filter(|v| v.is_finite())?;

    Some(PriceRecord {
      date,
      open,
      high,
      low,
      close,
      volume: volume.round() as u64,
    })
  }
}

impl From<PriceRecord> for RawPriceRow {
  fn from(r: PriceRecord) -> Self {
    Self {
      date: Some(r.date),
      open: Some(r.open),
      high: Some(r.high),
      low: Some(r.low),
      close: Some(r.close),
      volume: Some(r.volume as f64),
    }
  }
}

/// Ascending, date-unique sequence of [`PriceRecord`]s of one symbol.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceSeries {
  symbol: String,
  records: Vec<PriceRecord>,
}

impl PriceSeries {
  /// Sort by date and keep the last record of any duplicated date.
  pub fn new(symbol: impl Into<String>, mut records: Vec<PriceRecord>) -> Self {
    let symbol = symbol.into();
    records.sort_by_key(|r| r.date);

    let before = records.len();
    let mut deduped: Vec<PriceRecord> = Vec::with_capacity(before);
    for r in records {
      match deduped.last_mut() {
        Some(last) if last.date == r.date => *last = r,
        _ => deduped.push(r),
      }
    }
    if deduped.len() < before {
      warn!(
        symbol = %symbol,
        dropped = before - deduped.len(),
        "duplicate dates in price series, keeping the last record per date"
      );
    }

    Self {
      symbol,
      records: deduped,
    }
  }

  /// Clean raw rows (see [`RawPriceRow::into_record`]) and build the series.
  pub fn from_raw(symbol: impl Into<String>, rows: Vec<RawPriceRow>) -> Self {
    let symbol = symbol.into();
    let total = rows.len();
    let records: Vec<PriceRecord> = rows.into_iter().filter_map(RawPriceRow::into_record).collect();
    if records.len() < total {
      warn!(
        symbol = %symbol,
        dropped = total - records.len(),
        "dropped rows with missing prices or non-positive volume"
      );
    }
    Self::new(symbol, records)
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn records(&self) -> &[PriceRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn first_date(&self) -> Option<NaiveDate> {
    self.records.first().map(|r| r.date)
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.records.last().map(|r| r.date)
  }

  pub fn dates(&self) -> Vec<NaiveDate> {
    self.records.iter().map(|r| r.date).collect()
  }

  pub fn opens(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.open).collect()
  }

  pub fn highs(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.high).collect()
  }

  pub fn lows(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.low).collect()
  }

  pub fn closes(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.close).collect()
  }

  pub fn volumes(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.volume as f64).collect()
  }

  /// Records dated on or after `start`.
  pub fn since(&self, start: NaiveDate) -> Self {
    self.between(start, NaiveDate::MAX)
  }

  /// Records dated within `[start, end]`.
  pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
    Self {
      symbol: self.symbol.clone(),
      records: self
        .records
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .copied()
        .collect(),
    }
  }

  /// `(date, simple return)` pairs; the first record has no return.
  pub fn dated_returns(&self) -> Vec<(NaiveDate, f64)> {
    self
      .records
      .windows(2)
      .map(|w| (w[1].date, crate::stats::safe_ratio(w[1].close - w[0].close, w[0].close)))
      .collect()
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use tracing_test::traced_test;

  use super::*;

  pub(crate) fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(offset)
  }

  pub(crate) fn record(offset: i64, close: f64, volume: u64) -> PriceRecord {
    PriceRecord {
      date: day(offset),
      open: close,
      high: close * 1.01,
      low: close * 0.99,
      close,
      volume,
    }
  }

  /// Series built from closes; high/low bracket the close by one percent.
  pub(crate) fn series_from_closes(symbol: &str, closes: &[f64]) -> PriceSeries {
    let records = closes
      .iter()
      .enumerate()
      .map(|(i, &c)| record(i as i64, c, 1_000 + (i as u64 % 7) * 100))
      .collect();
    PriceSeries::new(symbol, records)
  }

  #[test]
  #[traced_test]
  fn new_sorts_and_keeps_last_duplicate() {
    let records = vec![record(2, 12.0, 10), record(0, 10.0, 10), record(2, 13.0, 10)];
    let series = PriceSeries::new("AAA", records);

    assert_eq!(series.len(), 2);
    assert_eq!(series.closes(), vec![10.0, 13.0]);
    assert_eq!(series.first_date(), Some(day(0)));
    assert!(logs_contain("duplicate dates"));
  }

  #[test]
  fn from_raw_drops_missing_close_and_non_positive_volume() {
    let good = RawPriceRow::from(record(0, 10.0, 100));
    let no_close = RawPriceRow {
      close: None,
      ..RawPriceRow::from(record(1, 10.0, 100))
    };
    let zero_volume = RawPriceRow {
      volume: Some(0.0),
      ..RawPriceRow::from(record(2, 10.0, 100))
    };
    let negative_volume = RawPriceRow {
      volume: Some(-5.0),
      ..RawPriceRow::from(record(3, 10.0, 100))
    };

    let series = PriceSeries::from_raw("AAA", vec![good, no_close, zero_volume, negative_volume]);
    assert_eq!(series.len(), 1);
    assert_eq!(series.records()[0].date, day(0));
  }

  #[test]
  fn from_raw_drops_rows_without_a_full_price_bar() {
    let no_open = RawPriceRow {
      open: None,
      ..RawPriceRow::from(record(0, 10.0, 100))
    };
    let nan_high = RawPriceRow {
      high: Some(f64::NAN),
      ..RawPriceRow::from(record(1, 10.0, 100))
    };
    let no_low = RawPriceRow {
      low: None,
      ..RawPriceRow::from(record(2, 10.0, 100))
    };
    let good = RawPriceRow::from(record(3, 10.0, 100));

    let series = PriceSeries::from_raw("AAA", vec![no_open, nan_high, no_low, good]);
    assert_eq!(series.len(), 1);
    assert_eq!(series.records()[0].date, day(3));
  }

  #[test]
  fn between_is_inclusive() {
    let series = series_from_closes("AAA", &[1.0, 2.0, 3.0, 4.0]);
    let sub = series.between(day(1), day(2));
    assert_eq!(sub.closes(), vec![2.0, 3.0]);
    assert_eq!(series.since(day(3)).closes(), vec![4.0]);
  }
}
