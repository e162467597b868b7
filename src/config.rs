//! Configuration for the LATE scheduler.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the scheduler's assignment and speculation behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Per-monitor-tick upper bound on new speculative tasks.
    pub speculative_limit: usize,

    /// Fraction of in-flight candidates eligible for speculation per tick, in `[0, 1]`.
    pub straggler_percentile: f64,

    /// How often the control loop alternates assign/monitor phases.
    #[serde(with = "duration_millis")]
    pub tick_interval: Duration,

    /// A task whose progress has reached this fraction is never a speculation candidate.
    pub speculation_progress_cutoff: f64,

    /// ETA reported for a task whose progress rate is still zero (just started).
    pub eta_unknown_sentinel: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            speculative_limit: 2,
            straggler_percentile: 0.2,
            tick_interval: Duration::from_millis(200),
            speculation_progress_cutoff: 0.9,
            eta_unknown_sentinel: 9999.0,
        }
    }
}

impl SchedulerConfig {
    /// Parse a `SchedulerConfig` from a TOML document, falling back to defaults for any
    /// field the document omits, then validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config {
            message: format!("failed to parse scheduler config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is within its documented range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.straggler_percentile) {
            return Err(Error::Config {
                message: format!(
                    "straggler_percentile {} must be within [0, 1]",
                    self.straggler_percentile
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.speculation_progress_cutoff) {
            return Err(Error::Config {
                message: format!(
                    "speculation_progress_cutoff {} must be within [0, 1]",
                    self.speculation_progress_cutoff
                ),
            });
        }
        if self.eta_unknown_sentinel <= 0.0 {
            return Err(Error::Config {
                message: format!(
                    "eta_unknown_sentinel {} must be positive",
                    self.eta_unknown_sentinel
                ),
            });
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
