use super::Column;
use crate::error::AnalyticsError;
use crate::error::Result;

pub(crate) fn ensure_len(indicator: &'static str, available: usize, required: usize) -> Result<()> {
  if required == 0 {
    return Err(AnalyticsError::InvalidData(format!(
      "{indicator}: window must be positive"
    )));
  }
  if available < required {
    return Err(AnalyticsError::insufficient(indicator, required, available));
  }
  Ok(())
}

pub(crate) fn ensure_same_len(indicator: &'static str, lens: &[usize]) -> Result<()> {
  if lens.windows(2).any(|w| w[0] != w[1]) {
    return Err(AnalyticsError::InvalidData(format!(
      "{indicator}: input series have different lengths {lens:?}"
    )));
  }
  Ok(())
}

/// Apply `f` to every fully defined trailing window of `values`.
pub(crate) fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Column
where
  F: Fn(&[f64]) -> Option<f64>,
{
  let mut out = vec![None; values.len()];
  if window == 0 || values.len() < window {
    return out;
  }

  let mut buf = Vec::with_capacity(window);
  for t in (window - 1)..values.len() {
    buf.clear();
    buf.extend(values[t + 1 - window..=t].iter().flatten());
    if buf.len() == window {
      out[t] = f(&buf);
    }
  }
  out
}
