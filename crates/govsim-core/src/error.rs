//! Error types of the engine and its configuration layer.

use thiserror::Error;

use govsim_model::ModelError;

/// Error raised while loading or validating tunables and simulation constants.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("can't read file {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The configuration is not valid YAML.
    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Hardware model or workload could not be loaded.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A tunable value is out of its domain.
    #[error("invalid tunable {name}: {reason}")]
    InvalidTunable {
        /// Tunable name as printed in dumps.
        name: String,
        /// Why the value is rejected.
        reason: String,
    },
    /// A simulation constant is out of its domain.
    #[error("invalid constant {name}: {reason}")]
    InvalidConstant {
        /// Constant name.
        name: String,
        /// Why the value is rejected.
        reason: String,
    },
}

/// Precondition violations detected by [`Sim::run`](crate::sim::Sim::run).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A comparison run was requested before a baseline run produced the reference partition.
    #[error("reference battery partition is empty, run the baseline in init mode first")]
    MissingReference,
    /// The reference partition was produced from a trace of a different length.
    #[error("reference battery partition has {reference} windows, candidate has {candidate}")]
    ReferenceMismatch {
        /// Number of windows in the reference.
        reference: usize,
        /// Number of windows in the candidate power log.
        candidate: usize,
    },
    /// The hardware model has no cluster to simulate.
    #[error("SoC has no clusters")]
    NoClusters,
    /// The worker evaluating the candidate stopped before reporting a score.
    #[error("candidate evaluation did not complete")]
    WorkerPanicked,
}
