//! # Recommendation Report
//!
//! $$
//! \text{report} = \text{header}(t) \,\|\, \text{table}(\text{rank}, \text{symbol}, \text{score}, \text{snapshot})
//! $$
//!
//! Deterministic text rendering of a ranked list: same input and timestamp,
//! same bytes.

use chrono::DateTime;
use chrono::Utc;
use prettytable::format;
use prettytable::row;
use prettytable::Table;

use super::Recommendation;

fn fixed(v: f64) -> String {
  format!("{v:.2}")
}

fn percent(v: f64) -> String {
  format!("{:.2}%", v * 100.0)
}

pub fn render_report(recommendations: &[Recommendation], generated_at: DateTime<Utc>) -> String {
  let mut out = String::from("Stock Recommendations Report\n");
  out.push_str(&format!(
    "Generated at: {}\n\n",
    generated_at.format("%Y-%m-%d %H:%M:%S")
  ));

  if recommendations.is_empty() {
    out.push_str("No recommendations.\n");
    return out;
  }

  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
  table.set_titles(row![
    "Rank",
    "Symbol",
    "Score",
    "RSI",
    "MACD",
    "Volatility",
    "Volume Change",
    "Price Momentum"
  ]);

  for rec in recommendations {
    let m = &rec.metrics;
    table.add_row(row![
      rec.rank,
      rec.symbol,
      fixed(rec.score),
      m.rsi.map_or_else(|| "n/a".to_string(), fixed),
      fixed(m.macd),
      fixed(m.volatility),
      percent(m.volume_change),
      percent(m.price_momentum)
    ]);
  }

  out.push_str(&table.to_string());
  out
}
