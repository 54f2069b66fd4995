//! Usage classification against the three configured thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a usage sample, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Notice,
    Warning,
    Critical,
}

impl Severity {
    /// Tiers that can raise an alert, most severe first.
    pub const ALERT_TIERS: [Severity; 3] = [Severity::Critical, Severity::Warning, Severity::Notice];

    pub fn is_alert(self) -> bool {
        self != Severity::Normal
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percent-used thresholds. Callers guarantee `notice < warning < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub notice: u8,
    pub warning: u8,
    pub critical: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            notice: 60,
            warning: 75,
            critical: 90,
        }
    }
}

/// Classify a percent-used value. The highest matching tier wins and an
/// exact boundary belongs to the higher tier.
pub fn classify(percent: f64, thresholds: &Thresholds) -> Severity {
    if percent >= f64::from(thresholds.critical) {
        Severity::Critical
    } else if percent >= f64::from(thresholds.warning) {
        Severity::Warning
    } else if percent >= f64::from(thresholds.notice) {
        Severity::Notice
    } else {
        Severity::Normal
    }
}
