//! Candidate governor parameters.
//!
//! All durations are integer multiples: interactive governor delays count `timer_rate` periods, `timer_rate`
//! and input boost duration count quanta. Per operating point arrays are indexed like the cluster's
//! operating point table; entries past [`TARGET_LOAD_MAX_LEN`] / [`ABOVE_DELAY_MAX_LEN`] or past the table
//! length are ignored, a shorter array repeats its last value.

use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use govsim_model::soc::{ClusterModel, Soc};

use crate::error::ConfigError;

/// Largest number of clusters the tunables can describe.
pub const CLUSTER_MAX: usize = 2;
/// Largest number of meaningful `target_loads` entries.
pub const TARGET_LOAD_MAX_LEN: usize = 20;
/// Largest number of meaningful `above_hispeed_delay` entries.
pub const ABOVE_DELAY_MAX_LEN: usize = 20;
/// Largest ravg history kept per task.
pub const RAVG_HIST_SIZE_MAX: u32 = 5;

/// Parameters of the interactive governor of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveTunables {
    /// Frequency in MHz the governor jumps to when load reaches `go_hispeed_load`.
    pub hispeed_freq: u32,
    /// Load percentage triggering the jump to `hispeed_freq`.
    pub go_hispeed_load: u32,
    /// Minimum time a frequency is held before ramping down, in timer periods.
    pub min_sample_time: u32,
    /// Time the maximum frequency is held once selected, in timer periods.
    pub max_freq_hysteresis: u32,
    /// Time load must stay high before going above the current frequency, per operating point, in timer periods.
    pub above_hispeed_delay: Vec<u32>,
    /// Target load percentage per operating point.
    pub target_loads: Vec<u32>,
}

impl InteractiveTunables {
    /// Stock kernel defaults for a cluster.
    ///
    /// The target load equals `go_hispeed_load`, so any load below it keeps the lowest frequency.
    pub fn default_for(model: &ClusterModel) -> Self {
        let n_opp = model.n_opp();
        Self {
            hispeed_freq: model.highest_freq(),
            go_hispeed_load: 99,
            min_sample_time: 4,
            max_freq_hysteresis: 0,
            above_hispeed_delay: vec![1; n_opp.min(ABOVE_DELAY_MAX_LEN)],
            target_loads: vec![99; n_opp.min(TARGET_LOAD_MAX_LEN)],
        }
    }
}

/// Reduction applied to a task's ravg history to obtain its demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatsPolicy {
    /// Most recent window.
    Recent,
    /// Maximum over the history.
    Max,
    /// Maximum of the most recent window and the history average.
    MaxRecentAvg,
    /// Average over the history.
    Avg,
}

impl WindowStatsPolicy {
    /// Value written to `sched_window_stats_policy` in the kernel.
    pub fn code(&self) -> u32 {
        match self {
            Self::Recent => 0,
            Self::Max => 1,
            Self::MaxRecentAvg => 2,
            Self::Avg => 3,
        }
    }

    /// Reduces a history ordered from the oldest to the most recent window.
    pub fn reduce<'a, I: IntoIterator<Item = &'a u32>>(&self, history: I) -> u32 {
        let (mut recent, mut max, mut sum, mut n) = (0u32, 0u32, 0u64, 0u64);
        for &x in history {
            recent = x;
            max = max.max(x);
            sum += x as u64;
            n += 1;
        }
        let avg = if n == 0 { 0 } else { (sum / n) as u32 };
        match self {
            Self::Recent => recent,
            Self::Max => max,
            Self::MaxRecentAvg => recent.max(avg),
            Self::Avg => avg,
        }
    }
}

impl Display for WindowStatsPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Parameters of the WALT/HMP scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaltHmpTunables {
    /// Demand percentage of little's capacity below which a task returns to little.
    pub sched_downmigrate: u32,
    /// Demand percentage of little's capacity above which a task moves to big.
    pub sched_upmigrate: u32,
    /// Cluster load percentage of a core's capacity above which the governor sees aggregated demand.
    pub sched_freq_aggregate_threshold_pct: u32,
    /// Number of windows kept in each task's ravg history.
    pub sched_ravg_hist_size: u32,
    /// Reduction applied to the ravg history.
    pub sched_window_stats_policy: WindowStatsPolicy,
    /// Governor sampling period in quanta.
    pub timer_rate: u32,
}

impl Default for WaltHmpTunables {
    fn default() -> Self {
        Self {
            sched_downmigrate: 85,
            sched_upmigrate: 95,
            sched_freq_aggregate_threshold_pct: 1000,
            sched_ravg_hist_size: 5,
            sched_window_stats_policy: WindowStatsPolicy::MaxRecentAvg,
            timer_rate: 2,
        }
    }
}

/// Parameters of the touch input boost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBoostTunables {
    /// Frequency floor in MHz per cluster while boosted, 0 disables boosting of the cluster.
    pub boost_freq: Vec<u32>,
    /// Boost length in quanta.
    pub duration_quantum: u32,
}

impl Default for InputBoostTunables {
    fn default() -> Self {
        Self {
            boost_freq: vec![0; CLUSTER_MAX],
            duration_quantum: 0,
        }
    }
}

/// Complete candidate parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunables {
    /// Interactive governor parameters, one entry per cluster, little first.
    pub interactive: Vec<InteractiveTunables>,
    /// Scheduler parameters.
    pub sched: WaltHmpTunables,
    /// Input boost parameters.
    pub input: InputBoostTunables,
}

impl Tunables {
    /// Stock parameters for the given SoC.
    pub fn default_for(soc: &Soc) -> Self {
        Self {
            interactive: soc
                .clusters
                .iter()
                .map(|c| InteractiveTunables::default_for(&c.model))
                .collect(),
            sched: WaltHmpTunables::default(),
            input: InputBoostTunables::default(),
        }
    }

    /// Parses tunables from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads tunables from YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks that the tunables can drive the given SoC.
    pub fn validate(&self, soc: &Soc) -> Result<(), ConfigError> {
        let invalid = |name: String, reason: &str| ConfigError::InvalidTunable {
            name,
            reason: reason.to_string(),
        };
        if soc.clusters.len() > CLUSTER_MAX {
            return Err(invalid("interactive".to_string(), "too many clusters"));
        }
        if self.interactive.len() < soc.clusters.len() {
            return Err(invalid("interactive".to_string(), "missing cluster parameters"));
        }
        for (idx, g) in self.interactive.iter().take(soc.clusters.len()).enumerate() {
            if !(1..=100).contains(&g.go_hispeed_load) {
                return Err(invalid(format!("cluster{}.go_hispeed_load", idx), "must be in 1..=100"));
            }
            if g.target_loads.is_empty() {
                return Err(invalid(format!("cluster{}.target_loads", idx), "must not be empty"));
            }
            if g.target_loads.iter().any(|tl| !(1..=100).contains(tl)) {
                return Err(invalid(format!("cluster{}.target_loads", idx), "must be in 1..=100"));
            }
            if g.above_hispeed_delay.is_empty() {
                return Err(invalid(format!("cluster{}.above_hispeed_delay", idx), "must not be empty"));
            }
        }
        if self.sched.sched_downmigrate > self.sched.sched_upmigrate {
            return Err(invalid(
                "sched_downmigrate".to_string(),
                "must not exceed sched_upmigrate",
            ));
        }
        if !(1..=RAVG_HIST_SIZE_MAX).contains(&self.sched.sched_ravg_hist_size) {
            return Err(invalid("sched_ravg_hist_size".to_string(), "must be in 1..=5"));
        }
        if self.sched.timer_rate == 0 {
            return Err(invalid("timer_rate".to_string(), "must be positive"));
        }
        if self.input.boost_freq.len() > CLUSTER_MAX {
            return Err(invalid("boost_freq".to_string(), "too many clusters"));
        }
        Ok(())
    }
}
