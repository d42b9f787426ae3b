//! # Errors
//!
//! $$
//! \text{DataError}\ \cup\ \text{OptimizationError}\ \cup\ \text{IOError}
//! $$
//!
//! Degenerate statistics (zero variance, empty tails) never surface here; they
//! resolve to neutral values through [`crate::stats::safe_ratio`].

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors raised by the analytics pipeline.
#[derive(Debug, Error)]
pub enum AnalyticsError {
  /// A window-based computation was asked for more history than supplied.
  #[error("insufficient data for {indicator}: need {required} rows, got {available}")]
  InsufficientData {
    indicator: &'static str,
    required: usize,
    available: usize,
  },

  #[error("missing required column `{0}`")]
  MissingColumn(String),

  #[error("invalid data: {0}")]
  InvalidData(String),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("risk analysis failed: {0}")]
  Risk(String),

  #[error("portfolio optimization failed: {0}")]
  Optimization(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Csv(#[from] csv::Error),

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

impl AnalyticsError {
  pub(crate) fn insufficient(indicator: &'static str, required: usize, available: usize) -> Self {
    Self::InsufficientData {
      indicator,
      required,
      available,
    }
  }

  /// Missing columns, malformed rows or too little history.
  pub fn is_data_error(&self) -> bool {
    matches!(
      self,
      Self::InsufficientData { .. } | Self::MissingColumn(_) | Self::InvalidData(_)
    )
  }

  /// Read/write failures of the backing files.
  pub fn is_io_error(&self) -> bool {
    matches!(self, Self::Io(_) | Self::Csv(_) | Self::Json(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insufficient_data_message_names_the_window() {
    let err = AnalyticsError::insufficient("SMA_long", 200, 120);
    assert_eq!(
      err.to_string(),
      "insufficient data for SMA_long: need 200 rows, got 120"
    );
    assert!(err.is_data_error());
    assert!(!err.is_io_error());
  }

  #[test]
  fn io_errors_convert_transparently() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AnalyticsError = io.into();
    assert!(err.is_io_error());
    assert_eq!(err.to_string(), "gone");
  }
}
