//! Simulation constants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Holds raw simulation constants parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
struct RawMiscConst {
    pub render_fraction: Option<f64>,
    pub common_fraction: Option<f64>,
    pub complexity_fraction: Option<f64>,
    pub working_base_mw: Option<u32>,
    pub idle_base_mw: Option<u32>,
    pub perf_partition_len: Option<usize>,
    pub seq_lag_l1: Option<usize>,
    pub seq_lag_l2: Option<usize>,
    pub seq_lag_max: Option<usize>,
    pub batt_partition_len: Option<usize>,
}

/// Constants shared by every run of a tuning session.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct MiscConst {
    /// Share of the render thread demand in the required capacity.
    pub render_fraction: f64,
    /// Share of the overall task demand in the required capacity.
    pub common_fraction: f64,
    /// Weight of the governor posture in the workload complexity.
    pub complexity_fraction: f64,
    /// Platform power drawn while the screen is on, in mW.
    pub working_base_mw: u32,
    /// Platform power drawn while idle, in mW.
    pub idle_base_mw: u32,
    /// Length in quanta of a performance evaluation partition.
    pub perf_partition_len: usize,
    /// Longest lag run tolerated without penalty.
    pub seq_lag_l1: usize,
    /// Longest lag run considered mild.
    pub seq_lag_l2: usize,
    /// Lag run length at which a partition is considered frozen.
    pub seq_lag_max: usize,
    /// Length in quanta of a battery evaluation partition.
    pub batt_partition_len: usize,
}

impl Default for MiscConst {
    fn default() -> Self {
        Self::from_raw(RawMiscConst::default())
    }
}

impl MiscConst {
    fn from_raw(raw: RawMiscConst) -> Self {
        Self {
            render_fraction: raw.render_fraction.unwrap_or(0.6),
            common_fraction: raw.common_fraction.unwrap_or(0.4),
            complexity_fraction: raw.complexity_fraction.unwrap_or(0.2),
            working_base_mw: raw.working_base_mw.unwrap_or(150),
            idle_base_mw: raw.idle_base_mw.unwrap_or(30),
            perf_partition_len: raw.perf_partition_len.unwrap_or(64),
            seq_lag_l1: raw.seq_lag_l1.unwrap_or(2),
            seq_lag_l2: raw.seq_lag_l2.unwrap_or(5),
            seq_lag_max: raw.seq_lag_max.unwrap_or(30),
            batt_partition_len: raw.batt_partition_len.unwrap_or(256),
        }
    }

    /// Creates constants by reading values from YAML text
    /// (uses default values if some constants are absent).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawMiscConst = serde_yaml::from_str(yaml)?;
        let misc = Self::from_raw(raw);
        misc.validate()?;
        Ok(misc)
    }

    /// Creates constants by reading values from YAML file
    /// (uses default values if some constants are absent).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks the constants the evaluators divide by or compare against each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &str, reason: &str| ConfigError::InvalidConstant {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if self.perf_partition_len == 0 {
            return Err(invalid("perf_partition_len", "must be positive"));
        }
        if self.batt_partition_len == 0 {
            return Err(invalid("batt_partition_len", "must be positive"));
        }
        if !(self.seq_lag_l1 <= self.seq_lag_l2 && self.seq_lag_l2 < self.seq_lag_max) {
            return Err(invalid("seq_lag_l1", "expected seq_lag_l1 <= seq_lag_l2 < seq_lag_max"));
        }
        for (name, value) in [
            ("render_fraction", self.render_fraction),
            ("common_fraction", self.common_fraction),
            ("complexity_fraction", self.complexity_fraction),
        ] {
            if !(0. ..=1.).contains(&value) {
                return Err(invalid(name, "must be in [0, 1]"));
            }
        }
        Ok(())
    }
}
