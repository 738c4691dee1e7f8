//! Evaluation result.

use serde::{Deserialize, Serialize};

/// Scores of one candidate, higher is better.
///
/// A score handed to [`Sim::new`](crate::sim::Sim::new) as the default score acts as a set of scale
/// factors: performance and battery life are divided by it, idle lasting is computed as
/// `1 / (idle_power * default.idle_lasting)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Lag-free share of the active trace.
    pub performance: f64,
    /// Reference to candidate power ratio of the active trace.
    pub battery_life: f64,
    /// Inverse of the power consumed by the idle trace.
    pub idle_lasting: f64,
    /// Power totals of the baseline run per battery partition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ref_power_consumed: Vec<u64>,
}

impl Default for Score {
    fn default() -> Self {
        Self {
            performance: 1.,
            battery_life: 1.,
            idle_lasting: 1.,
            ref_power_consumed: Vec::new(),
        }
    }
}
