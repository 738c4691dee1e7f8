//! Sample aggregation used by the partition evaluators.

use std::ops::AddAssign;

use num::{ToPrimitive, Zero};

/// Collected samples of a metric.
#[derive(Clone, Debug, Default)]
pub struct SampleMetric<T> {
    data: Vec<T>,
}

impl<T> FromIterator<T> for SampleMetric<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl<T> SampleMetric<T>
where
    T: AddAssign + Copy + Zero,
{
    /// Sum of the samples.
    pub fn sum(&self) -> T {
        let mut s = T::zero();
        for x in self.data.iter().copied() {
            s += x;
        }
        s
    }
}

impl<T> SampleMetric<T>
where
    T: AddAssign + Copy + Zero + ToPrimitive,
{
    /// Mean of the samples, 0 if there are none.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.;
        }
        self.sum().to_f64().unwrap_or(f64::NAN) / (self.data.len() as f64)
    }
}
