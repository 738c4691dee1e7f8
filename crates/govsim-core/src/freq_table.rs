//! Step functions keyed by frequency.

use govsim_model::soc::ClusterModel;

/// Ordered `(frequency, value)` breakpoints.
///
/// The value at a frequency is the value of the last breakpoint at or below it, queries below the
/// first breakpoint get the first value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqTable {
    points: Vec<(u32, u32)>,
}

impl FreqTable {
    /// Creates a table from breakpoints sorted by frequency.
    pub fn new(points: Vec<(u32, u32)>) -> Self {
        assert!(!points.is_empty(), "frequency table must have at least one breakpoint");
        debug_assert!(points.windows(2).all(|w| w[0].0 <= w[1].0));
        Self { points }
    }

    /// Binds per operating point values to the frequencies of a cluster.
    ///
    /// Values past `max_len` or past the operating point count are ignored, missing values repeat the
    /// last given one. Consecutive equal values are merged.
    pub fn from_opp_values(model: &ClusterModel, values: &[u32], max_len: usize) -> Self {
        let n = model.n_opp().min(max_len);
        let values = &values[..values.len().min(n)];
        let mut points: Vec<(u32, u32)> = Vec::with_capacity(n);
        for (idx, opp) in model.opp_model.iter().take(n).enumerate() {
            let value = values.get(idx).or(values.last()).copied().unwrap_or(0);
            if points.last().map_or(true, |&(_, prev)| prev != value) {
                points.push((opp.freq, value));
            }
        }
        Self::new(points)
    }

    /// Value in effect at `freq`.
    pub fn lookup(&self, freq: u32) -> u32 {
        let idx = self.points.partition_point(|&(f, _)| f <= freq);
        self.points[idx.saturating_sub(1)].1
    }

    /// Breakpoints of the table.
    pub fn points(&self) -> &[(u32, u32)] {
        &self.points
    }
}
