//! # Indicators
//!
//! $$
//! y_t = f(x_{t-w+1}, \dots, x_t)
//! $$
//!
//! Causal technical indicators over ordered numeric series.
//!
//! Every output has the same length as its input. Positions where the
//! trailing window is not yet populated (or the value is undefined) are
//! `None`. Asking for a window longer than the series is an
//! [`AnalyticsError::InsufficientData`](crate::AnalyticsError::InsufficientData).

pub mod moving_average;
pub mod oscillators;
pub mod signals;
pub mod trend;
pub mod volatility;
pub mod volume;
mod window;

pub use moving_average::ema;
pub use moving_average::ema_of;
pub use moving_average::rolling_std;
pub use moving_average::sma;
pub use moving_average::sma_of;
pub use oscillators::momentum;
pub use oscillators::rsi;
pub use oscillators::stochastic;
pub use oscillators::Stochastic;
pub use signals::IndicatorSignals;
pub use signals::LatestIndicators;
pub use signals::Signal;
pub use trend::bollinger_bands;
pub use trend::macd;
pub use trend::BollingerBands;
pub use trend::Macd;
pub use volatility::atr;
pub use volatility::return_volatility;
pub use volatility::true_range;
pub use volume::obv;
pub use volume::pvt;
pub use volume::volume_ma;

/// A derived series aligned with its source; `None` marks a missing value.
pub type Column = Vec<Option<f64>>;

/// Lift a fully defined series into a [`Column`].
pub fn defined(values: &[f64]) -> Column {
  values.iter().copied().map(Some).collect()
}

/// Last element of a column, if present and defined.
pub fn latest(column: &[Option<f64>]) -> Option<f64> {
  column.last().copied().flatten()
}
