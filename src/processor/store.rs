//! # Price Store
//!
//! $$
//! \text{symbol} \mapsto \{(t_i, O_i, H_i, L_i, C_i, V_i)\}
//! $$
//!
//! Price sources feeding the processor, plus CSV export of processed frames.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use super::IndicatorFrame;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::series::PriceSeries;
use crate::series::RawPriceRow;

/// Supplies the time-ordered OHLCV history of a symbol.
pub trait PriceSource: Send + Sync {
  fn load(&self, symbol: &str) -> Result<PriceSeries>;

  /// History dated on or after `start`, or everything when `start` is `None`.
  fn load_since(&self, symbol: &str, start: Option<NaiveDate>) -> Result<PriceSeries> {
    let series = self.load(symbol)?;
    Ok(match start {
      Some(start) => series.since(start),
      None => series,
    })
  }
}

/// Source backed by series already held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
  series: HashMap<String, PriceSeries>,
}

impl InMemorySource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, series: PriceSeries) {
    self.series.insert(series.symbol().to_string(), series);
  }

  pub fn with(mut self, series: PriceSeries) -> Self {
    self.insert(series);
    self
  }
}

impl FromIterator<PriceSeries> for InMemorySource {
  fn from_iter<I: IntoIterator<Item = PriceSeries>>(iter: I) -> Self {
    let mut source = Self::new();
    for series in iter {
      source.insert(series);
    }
    source
  }
}

impl PriceSource for InMemorySource {
  fn load(&self, symbol: &str) -> Result<PriceSeries> {
    self
      .series
      .get(symbol)
      .cloned()
      .ok_or_else(|| AnalyticsError::InvalidData(format!("no price history for {symbol}")))
  }
}

const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Parse `YYYY-MM-DD`, ignoring any trailing time component.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  let head = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_number(s: Option<&str>) -> Option<f64> {
  let s = s?.trim();
  if s.is_empty() {
    return None;
  }
  s.parse().ok()
}

fn format_cell(value: Option<f64>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

/// Read a `date,open,high,low,close,volume` file in any row order.
///
/// Header names are matched case-insensitively; unparseable cells count as
/// missing and the row is dropped by cleaning.
pub fn read_price_csv<P: AsRef<Path>>(path: P, symbol: &str) -> Result<PriceSeries> {
  let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
  let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_lowercase()).collect();

  let mut idx = [0usize; 6];
  for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
    *slot = headers
      .iter()
      .position(|h| h == name)
      .ok_or_else(|| AnalyticsError::MissingColumn(name.to_string()))?;
  }
  let [date, open, high, low, close, volume] = idx;

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    rows.push(RawPriceRow {
      date: record.get(date).and_then(parse_date),
      open: parse_number(record.get(open)),
      high: parse_number(record.get(high)),
      low: parse_number(record.get(low)),
      close: parse_number(record.get(close)),
      volume: parse_number(record.get(volume)),
    });
  }

  Ok(PriceSeries::from_raw(symbol, rows))
}

/// Write a series back to the raw input layout.
pub fn write_price_csv<P: AsRef<Path>>(path: P, series: &PriceSeries) -> Result<()> {
  let mut writer = csv::Writer::from_path(path)?;
  writer.write_record(REQUIRED_COLUMNS)?;
  for r in series.records() {
    writer.write_record([
      r.date.to_string(),
      r.open.to_string(),
      r.high.to_string(),
      r.low.to_string(),
      r.close.to_string(),
      r.volume.to_string(),
    ])?;
  }
  writer.flush()?;
  Ok(())
}

/// Write the source columns followed by every indicator column; missing
/// values are empty cells.
pub fn write_frame_csv<P: AsRef<Path>>(path: P, frame: &IndicatorFrame) -> Result<()> {
  let columns = frame.columns();
  let mut writer = csv::Writer::from_path(path)?;

  let header: Vec<&str> = REQUIRED_COLUMNS
    .iter()
    .copied()
    .chain(columns.iter().map(|(name, _)| *name))
    .collect();
  writer.write_record(&header)?;

  for (t, r) in frame.series().records().iter().enumerate() {
    let mut row = vec![
      r.date.to_string(),
      r.open.to_string(),
      r.high.to_string(),
      r.low.to_string(),
      r.close.to_string(),
      r.volume.to_string(),
    ];
    row.extend(columns.iter().map(|(_, col)| format_cell(col[t])));
    writer.write_record(&row)?;
  }
  writer.flush()?;
  Ok(())
}

/// Directory pair of `{symbol}_raw.csv` inputs and `{symbol}_processed.csv`
/// outputs.
#[derive(Clone, Debug)]
pub struct CsvPriceStore {
  raw_dir: PathBuf,
  processed_dir: PathBuf,
}

impl CsvPriceStore {
  pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
    Self {
      raw_dir: raw_dir.into(),
      processed_dir: processed_dir.into(),
    }
  }

  pub fn raw_path(&self, symbol: &str) -> PathBuf {
    self.raw_dir.join(format!("{symbol}_raw.csv"))
  }

  pub fn processed_path(&self, symbol: &str) -> PathBuf {
    self.processed_dir.join(format!("{symbol}_processed.csv"))
  }

  pub fn save_raw(&self, series: &PriceSeries) -> Result<PathBuf> {
    fs::create_dir_all(&self.raw_dir)?;
    let path = self.raw_path(series.symbol());
    write_price_csv(&path, series)?;
    Ok(path)
  }

  pub fn save_processed(&self, frame: &IndicatorFrame) -> Result<PathBuf> {
    fs::create_dir_all(&self.processed_dir)?;
    let path = self.processed_path(frame.symbol());
    write_frame_csv(&path, frame)?;
    info!(symbol = frame.symbol(), path = %path.display(), "saved processed frame");
    Ok(path)
  }
}

impl PriceSource for CsvPriceStore {
  fn load(&self, symbol: &str) -> Result<PriceSeries> {
    read_price_csv(self.raw_path(symbol), symbol)
  }
}
