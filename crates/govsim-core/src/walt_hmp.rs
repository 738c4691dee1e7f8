//! WALT/HMP task placement between the little and the big cluster.

use std::collections::VecDeque;

use log::trace;

use govsim_model::soc::Soc;

use crate::sim::adapt_load;
use crate::tunables::WaltHmpTunables;

#[derive(Debug, Clone, Default)]
struct TaskState {
    history: VecDeque<u32>,
    cluster: usize,
}

/// Load of one cluster after placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterLoad {
    /// Load of every core of the cluster.
    pub core_loads: Vec<u32>,
    /// Demand the cluster's governor has to serve.
    pub demand: u32,
}

/// Heterogeneous multi-processing scheduler with window-assisted load tracking.
#[derive(Debug, Clone)]
pub struct WaltHmp {
    tunables: WaltHmpTunables,
    core_nums: Vec<usize>,
    max_capacities: Vec<u32>,
    tasks: Vec<TaskState>,
}

impl WaltHmp {
    /// Creates the scheduler with every task on the little cluster.
    pub fn new(tunables: &WaltHmpTunables, soc: &Soc) -> Self {
        Self {
            tunables: tunables.clone(),
            core_nums: soc.clusters.iter().map(|c| c.model.core_num).collect(),
            max_capacities: soc.clusters.iter().map(|c| c.model.max_capacity()).collect(),
            tasks: Vec::new(),
        }
    }

    /// Cluster the task currently runs on.
    pub fn task_cluster(&self, task: usize) -> usize {
        self.tasks.get(task).map_or(0, |t| t.cluster)
    }

    /// Demand of the task as seen by the migration policy.
    pub fn task_demand(&self, task: usize) -> u32 {
        self.tasks
            .get(task)
            .map_or(0, |t| self.tunables.sched_window_stats_policy.reduce(&t.history))
    }

    /// Accounts one quantum of task loads, migrates tasks and returns the resulting per-cluster load.
    pub fn schedule(&mut self, loads: &[u32]) -> Vec<ClusterLoad> {
        if self.tasks.len() < loads.len() {
            self.tasks.resize_with(loads.len(), TaskState::default);
        }
        let hist_size = self.tunables.sched_ravg_hist_size.max(1) as usize;
        for (idx, task) in self.tasks.iter_mut().enumerate() {
            task.history.push_back(loads.get(idx).copied().unwrap_or(0));
            while task.history.len() > hist_size {
                task.history.pop_front();
            }
        }
        if self.core_nums.len() > 1 {
            self.migrate();
        }
        self.place(loads)
    }

    fn migrate(&mut self) {
        let little_capacity = self.max_capacities[0].max(1) as u64;
        for idx in 0..self.tasks.len() {
            let demand_pct = self.task_demand(idx) as u64 * 100 / little_capacity;
            let task = &mut self.tasks[idx];
            if task.cluster == 0 && demand_pct > self.tunables.sched_upmigrate as u64 {
                trace!("walt: task {} up-migrates, demand {}%", idx, demand_pct);
                task.cluster = 1;
            } else if task.cluster == 1 && demand_pct < self.tunables.sched_downmigrate as u64 {
                trace!("walt: task {} down-migrates, demand {}%", idx, demand_pct);
                task.cluster = 0;
            }
        }
    }

    fn place(&self, loads: &[u32]) -> Vec<ClusterLoad> {
        let mut result = Vec::with_capacity(self.core_nums.len());
        for (cluster, (&core_num, &max_capacity)) in self.core_nums.iter().zip(&self.max_capacities).enumerate() {
            let mut task_loads: Vec<u32> = loads
                .iter()
                .enumerate()
                .filter(|(idx, _)| self.task_cluster(*idx) == cluster)
                .map(|(_, &load)| load)
                .collect();
            task_loads.sort_unstable_by(|a, b| b.cmp(a));
            let mut core_loads = vec![0u32; core_num.max(1)];
            let n_cores = core_loads.len();
            for (k, load) in task_loads.into_iter().enumerate() {
                core_loads[k % n_cores] = core_loads[k % n_cores].saturating_add(load);
            }
            adapt_load(&mut core_loads, max_capacity);

            let busiest = core_loads.iter().copied().max().unwrap_or(0);
            let aggregate: u64 = core_loads.iter().map(|&x| x as u64).sum();
            let threshold = self.tunables.sched_freq_aggregate_threshold_pct as u64 * max_capacity as u64;
            let demand = if aggregate * 100 > threshold {
                aggregate.min(max_capacity as u64) as u32
            } else {
                busiest
            };
            result.push(ClusterLoad { core_loads, demand });
        }
        result
    }
}
