//! Recorded workload traces.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;

use crate::error::ModelError;

/// Demand observed during one quantum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSlice {
    /// Whether a user input event (touch, key) happened in this quantum.
    pub has_input: bool,
    /// Demand of the frame-critical render thread.
    pub render_load: u32,
    /// Demand of every tracked task, in capacity units.
    pub loads: Vec<u32>,
}

impl LoadSlice {
    /// Creates a slice without input event.
    pub fn new(render_load: u32, loads: Vec<u32>) -> Self {
        Self {
            has_input: false,
            render_load,
            loads,
        }
    }

    /// Marks the slice as carrying an input event.
    pub fn with_input(mut self) -> Self {
        self.has_input = true;
        self
    }

    /// Sum of all task demands.
    pub fn total_load(&self) -> u64 {
        self.loads.iter().map(|&x| x as u64).sum()
    }
}

/// A workload trace sampled once per quantum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workload {
    /// Trace name.
    pub name: String,
    /// Per-quantum demand.
    pub windowed_load: Vec<LoadSlice>,
}

impl Workload {
    /// Creates a workload from prepared slices.
    pub fn new<S: Into<String>>(name: S, windowed_load: Vec<LoadSlice>) -> Self {
        Self {
            name: name.into(),
            windowed_load,
        }
    }

    /// Creates a workload repeating the same slice `len` times.
    pub fn flat<S: Into<String>>(name: S, slice: LoadSlice, len: usize) -> Self {
        Self::new(name, vec![slice; len])
    }

    /// Number of quanta in the trace.
    pub fn len(&self) -> usize {
        self.windowed_load.len()
    }

    /// Returns true if the trace has no quanta.
    pub fn is_empty(&self) -> bool {
        self.windowed_load.is_empty()
    }

    /// Largest number of tasks tracked by any slice.
    pub fn n_tasks(&self) -> usize {
        self.windowed_load.iter().map(|s| s.loads.len()).max().unwrap_or(0)
    }

    /// Parses a trace from CSV with columns `has_input,render_load,load0,...`.
    pub fn from_csv_reader<S: Into<String>, R: Read>(name: S, reader: R) -> Result<Self, ModelError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut windowed_load = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() < 2 {
                return Err(ModelError::BadRow {
                    row,
                    reason: format!("expected at least 2 columns, got {}", record.len()),
                });
            }
            let parse = |idx: usize| -> Result<u32, ModelError> {
                record[idx].parse::<u32>().map_err(|e| ModelError::BadRow {
                    row,
                    reason: format!("column {}: {}", idx, e),
                })
            };
            let has_input = match parse(0)? {
                0 => false,
                1 => true,
                other => {
                    return Err(ModelError::BadRow {
                        row,
                        reason: format!("has_input must be 0 or 1, got {}", other),
                    })
                }
            };
            let render_load = parse(1)?;
            let loads = (2..record.len()).map(parse).collect::<Result<Vec<_>, _>>()?;
            windowed_load.push(LoadSlice {
                has_input,
                render_load,
                loads,
            });
        }
        let workload = Self::new(name, windowed_load);
        debug!(
            "loaded workload {}: {} quanta, {} tasks",
            workload.name,
            workload.len(),
            workload.n_tasks()
        );
        Ok(workload)
    }

    /// Loads a trace from CSV file, the file stem becomes the trace name.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_csv_reader(name, file)
    }
}
