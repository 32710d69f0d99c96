//! Risk ranges: labelled numeric intervals that classify a risk score.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One labelled interval, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRange {
  pub min:     f64,
  pub max:     f64,
  pub label:   String,
  #[serde(default = "enabled_by_default")]
  pub enabled: bool,
}

fn enabled_by_default() -> bool { true }

impl RiskRange {
  pub fn new(min: f64, max: f64, label: impl Into<String>) -> Self {
    Self { min, max, label: label.into(), enabled: true }
  }

  pub fn contains(&self, value: f64) -> bool { self.min <= value && value <= self.max }

  /// Reject bounds that can never match and blank labels.
  pub fn validate(&self) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidRiskRange {
      label:  self.label.clone(),
      reason: reason.to_owned(),
    };
    if !(self.min.is_finite() && self.max.is_finite()) {
      return Err(invalid("bounds must be finite"));
    }
    if self.min > self.max {
      return Err(invalid("min is greater than max"));
    }
    if self.label.trim().is_empty() {
      return Err(invalid("label is blank"));
    }
    Ok(())
  }
}

/// Label of the first enabled range, in declaration order, containing
/// `value`. Ranges may overlap or leave gaps.
pub fn resolve(value: f64, ranges: &[RiskRange]) -> Option<&str> {
  ranges
    .iter()
    .filter(|r| r.enabled)
    .find(|r| r.contains(value))
    .map(|r| r.label.as_str())
}

/// The risk score of a frequency/severity pair.
pub fn score(frequency: u8, severity: u8) -> u32 { u32::from(frequency) * u32::from(severity) }

/// Validate every range of a configuration.
pub fn validate_ranges(ranges: &[RiskRange]) -> Result<()> {
  ranges.iter().try_for_each(RiskRange::validate)
}

/// The stock 5×5 matrix configuration.
pub fn default_ranges() -> Vec<RiskRange> {
  vec![
    RiskRange::new(1.0, 4.0, "허용가능"),
    RiskRange::new(5.0, 8.0, "관리필요"),
    RiskRange::new(9.0, 14.0, "개선필요"),
    RiskRange::new(15.0, 25.0, "즉시개선"),
  ]
}
