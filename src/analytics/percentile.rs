use serde::{Deserialize, Serialize};

pub const WARN_QUANTILE: f64 = 0.90;
pub const CRITICAL_QUANTILE: f64 = 0.98;

/// Nearest-rank percentile: the element at rank `floor((n - 1) * p)` of the
/// ascending sort. Returns `0` for an empty series. `p` is clamped to `[0, 1]`.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    let rank = ((sorted.len() - 1) as f64 * p).floor() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Warn/critical cut-offs derived from a series' own distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    pub warn: f64,
    pub critical: f64,
}

impl Thresholds {
    pub fn new(warn: f64, critical: f64) -> Self {
        Self { warn, critical }
    }

    /// p90 / p98 of the observed values.
    pub fn from_series(values: &[f64]) -> Self {
        Self {
            warn: percentile(values, WARN_QUANTILE),
            critical: percentile(values, CRITICAL_QUANTILE),
        }
    }

    pub fn classify(&self, value: f64) -> Severity {
        classify(value, self)
    }
}

/// A zero threshold never fires, so an all-zero series stays `Normal`.
pub fn classify(value: f64, thresholds: &Thresholds) -> Severity {
    if thresholds.critical > 0.0 && value >= thresholds.critical {
        Severity::Critical
    } else if thresholds.warn > 0.0 && value >= thresholds.warn {
        Severity::Warning
    } else {
        Severity::Normal
    }
}
