//! Touch input boost.

use crate::tunables::InputBoostTunables;

/// Raises cluster frequency floors for a while after each input event.
#[derive(Debug, Clone)]
pub struct InputBoost {
    boost_freq: Vec<u32>,
    duration: u64,
    boost_end: u64,
}

impl InputBoost {
    /// Creates an idle boost.
    pub fn new(tunables: &InputBoostTunables) -> Self {
        Self {
            boost_freq: tunables.boost_freq.clone(),
            duration: tunables.duration_quantum as u64,
            boost_end: 0,
        }
    }

    /// Registers the input state of quantum `now` and returns whether the boost is active in it.
    ///
    /// Every input event restarts the boost window.
    pub fn handle_input(&mut self, has_input: bool, now: u64) -> bool {
        if has_input && self.duration > 0 {
            self.boost_end = now + self.duration;
        }
        now < self.boost_end
    }

    /// Frequency floor of the cluster while boosted, 0 if the cluster is not boosted.
    pub fn boost_freq(&self, cluster: usize) -> u32 {
        self.boost_freq.get(cluster).copied().unwrap_or(0)
    }
}
