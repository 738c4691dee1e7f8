//! Errors raised while loading or validating simulator inputs.

use thiserror::Error;

/// Error produced by hardware model and workload loaders.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The input file could not be read.
    #[error("can't read file {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The hardware model is not valid YAML or misses required fields.
    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The workload trace is not a valid CSV table.
    #[error("can't parse CSV: {0}")]
    Csv(#[from] csv::Error),
    /// A workload row has an unexpected shape.
    #[error("bad workload row {row}: {reason}")]
    BadRow {
        /// Zero-based data row index.
        row: usize,
        /// What is wrong with the row.
        reason: String,
    },
    /// A cluster description violates an invariant of the hardware model.
    #[error("invalid cluster {cluster}: {reason}")]
    InvalidCluster {
        /// Cluster index inside the SoC.
        cluster: usize,
        /// Violated invariant.
        reason: String,
    },
}
