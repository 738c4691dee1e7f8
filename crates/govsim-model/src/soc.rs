//! Hardware capability model of a heterogeneous SoC.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Operating point of a cluster.
///
/// `capacity` is the work a single core delivers per quantum at this frequency, expressed in the same
/// units as workload demand. `power` is the draw in mW of one fully busy core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opp {
    /// Frequency in MHz.
    pub freq: u32,
    /// Per-core capacity.
    pub capacity: u32,
    /// Per-core power at 100% utilization, in mW.
    pub power: u32,
}

/// Static description of a cluster of identical cores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterModel {
    /// Number of cores sharing the cluster clock.
    pub core_num: usize,
    /// Lowest frequency the governor may select, in MHz.
    pub min_freq: u32,
    /// Highest frequency the governor may select, in MHz.
    pub max_freq: u32,
    /// Operating points ordered by frequency.
    pub opp_model: Vec<Opp>,
}

impl ClusterModel {
    /// Checks the invariants the simulator relies on.
    pub fn validate(&self, idx: usize) -> Result<(), ModelError> {
        let invalid = |reason: &str| ModelError::InvalidCluster {
            cluster: idx,
            reason: reason.to_string(),
        };
        if self.core_num == 0 {
            return Err(invalid("core_num must be positive"));
        }
        if self.opp_model.is_empty() {
            return Err(invalid("empty operating point table"));
        }
        if self.opp_model.windows(2).any(|w| w[0].freq > w[1].freq) {
            return Err(invalid("operating points are not sorted by frequency"));
        }
        if self.opp_model.iter().any(|opp| opp.capacity == 0) {
            return Err(invalid("operating point with zero capacity"));
        }
        if self.min_freq > self.max_freq {
            return Err(invalid("min_freq is above max_freq"));
        }
        if !self
            .opp_model
            .iter()
            .any(|opp| opp.freq >= self.min_freq && opp.freq <= self.max_freq)
        {
            return Err(invalid("no operating point between min_freq and max_freq"));
        }
        Ok(())
    }

    /// Number of operating points.
    pub fn n_opp(&self) -> usize {
        self.opp_model.len()
    }

    /// Index of the lowest usable operating point with frequency at or above `freq`.
    pub fn opp_index_ceiling(&self, freq: u32) -> usize {
        let freq = freq.clamp(self.min_freq, self.max_freq);
        let last = self.max_opp_index();
        self.opp_model
            .iter()
            .position(|opp| opp.freq >= freq)
            .map_or(last, |idx| idx.min(last))
    }

    /// Index of the highest usable operating point with frequency at or below `freq`.
    pub fn opp_index_floor(&self, freq: u32) -> usize {
        let freq = freq.clamp(self.min_freq, self.max_freq);
        let first = self.min_opp_index();
        self.opp_model
            .iter()
            .rposition(|opp| opp.freq <= freq)
            .map_or(first, |idx| idx.max(first))
    }

    /// Rounds `freq` up to a usable operating point frequency.
    pub fn freq_ceiling_to_opp(&self, freq: u32) -> u32 {
        self.opp_model[self.opp_index_ceiling(freq)].freq
    }

    /// Rounds `freq` down to a usable operating point frequency.
    pub fn freq_floor_to_opp(&self, freq: u32) -> u32 {
        self.opp_model[self.opp_index_floor(freq)].freq
    }

    /// Operating point the cluster runs at when clocked at `freq`.
    pub fn opp_at(&self, freq: u32) -> &Opp {
        &self.opp_model[self.opp_index_floor(freq)]
    }

    /// Per-core capacity at `freq`.
    pub fn capacity_at(&self, freq: u32) -> u32 {
        self.opp_at(freq).capacity
    }

    /// Per-core capacity at the highest usable frequency.
    pub fn max_capacity(&self) -> u32 {
        self.opp_model[self.max_opp_index()].capacity
    }

    /// Lowest usable frequency.
    pub fn lowest_freq(&self) -> u32 {
        self.opp_model[self.min_opp_index()].freq
    }

    /// Highest usable frequency.
    pub fn highest_freq(&self) -> u32 {
        self.opp_model[self.max_opp_index()].freq
    }

    fn min_opp_index(&self) -> usize {
        self.opp_model
            .iter()
            .position(|opp| opp.freq >= self.min_freq)
            .unwrap_or(self.opp_model.len() - 1)
    }

    fn max_opp_index(&self) -> usize {
        self.opp_model
            .iter()
            .rposition(|opp| opp.freq <= self.max_freq)
            .unwrap_or(0)
    }
}

/// A cluster together with its current clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Static description of the cluster.
    pub model: ClusterModel,
    cur_freq: u32,
}

impl Cluster {
    /// Creates a cluster clocked at its lowest usable frequency.
    pub fn new(model: ClusterModel) -> Self {
        let cur_freq = model.lowest_freq();
        Self { model, cur_freq }
    }

    /// Current frequency in MHz.
    pub fn cur_freq(&self) -> u32 {
        self.cur_freq
    }

    /// Sets the clock, rounding up to a usable operating point.
    pub fn set_cur_freq(&mut self, freq: u32) {
        self.cur_freq = self.model.freq_ceiling_to_opp(freq);
    }

    /// Per-core capacity at the current frequency.
    pub fn capacity(&self) -> u32 {
        self.model.capacity_at(self.cur_freq)
    }

    /// Capacity of the whole cluster at the current frequency.
    pub fn total_capacity(&self) -> u32 {
        self.capacity() * self.model.core_num as u32
    }

    /// Power in mW drawn by the cluster when its cores carry `core_loads`.
    ///
    /// Each core draws the operating point power scaled by its utilization, a core cannot be busier than 100%.
    pub fn calc_power(&self, core_loads: &[u32]) -> u32 {
        let opp = self.model.opp_at(self.cur_freq);
        core_loads
            .iter()
            .take(self.model.core_num)
            .map(|&load| {
                let util = (load as u64 * 100 / opp.capacity as u64).min(100);
                (opp.power as u64 * util / 100) as u32
            })
            .sum()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct YamlSoc {
    name: String,
    clusters: Vec<ClusterModel>,
}

/// A system-on-chip: an ordered list of clusters, little first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soc {
    /// SoC name, used to name dump files.
    pub name: String,
    /// Clusters ordered from the most efficient to the most powerful.
    pub clusters: Vec<Cluster>,
}

impl Soc {
    /// Creates a SoC from validated cluster models.
    pub fn new<S: Into<String>>(name: S, models: Vec<ClusterModel>) -> Result<Self, ModelError> {
        for (idx, model) in models.iter().enumerate() {
            model.validate(idx)?;
        }
        Ok(Self {
            name: name.into(),
            clusters: models.into_iter().map(Cluster::new).collect(),
        })
    }

    /// Parses a SoC description from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ModelError> {
        let raw: YamlSoc = serde_yaml::from_str(yaml)?;
        Self::new(raw.name, raw.clusters)
    }

    /// Loads a SoC description from YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Largest per-core capacity any cluster can deliver.
    pub fn max_capacity(&self) -> u32 {
        self.clusters.iter().map(|c| c.model.max_capacity()).max().unwrap_or(0)
    }

    /// Capacity delivered with every cluster at its highest usable frequency.
    pub fn max_total_capacity(&self) -> u32 {
        self.clusters
            .iter()
            .map(|c| c.model.max_capacity().saturating_mul(c.model.core_num as u32))
            .fold(0, u32::saturating_add)
    }
}
