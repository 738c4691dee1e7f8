//! Simulation engine and scoring functions.

use itertools::Itertools;
use log::debug;

use govsim_model::soc::{Cluster, Soc};
use govsim_model::workload::Workload;

use crate::config::MiscConst;
use crate::error::SimError;
use crate::input_boost::InputBoost;
use crate::interactive::Interactive;
use crate::score::Score;
use crate::stats::SampleMetric;
use crate::tunables::{InteractiveTunables, Tunables};
use crate::walt_hmp::WaltHmp;

/// Right shift applied to raw power values before they are logged.
pub const POWER_SHIFT: u32 = 4;

/// Scales a raw power value in mW down to power log units.
pub fn quantify_power(power: u32) -> u32 {
    power >> POWER_SHIFT
}

/// Caps every load at `capacity`.
pub fn adapt_load(loads: &mut [u32], capacity: u32) {
    for load in loads.iter_mut() {
        *load = (*load).min(capacity);
    }
}

/// Selects how the battery life of a run is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode<'a> {
    /// Baseline run: its own power partition becomes the reference returned in the score.
    Init,
    /// Comparison run against the reference partition of a baseline run.
    Compare(&'a [u64]),
}

/// Lag run lengths separating tolerated, mild, severe and frozen runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagThresholds {
    /// Longest run without penalty.
    pub l1: usize,
    /// Longest run with a linear penalty.
    pub l2: usize,
    /// Run length zeroing its window.
    pub max: usize,
}

/// Capacity and power logs of one replayed trace.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    /// Capacity delivered by all clusters per quantum.
    pub capacity_log: Vec<u32>,
    /// Quantified power consumed per quantum.
    pub power_log: Vec<u32>,
}

/// Evaluates one set of tunables.
///
/// The engine keeps no state between runs, the reference battery partition is passed explicitly with
/// [`RunMode::Compare`], so a single `Sim` (or many of them) can be shared between threads.
#[derive(Debug, Clone)]
pub struct Sim {
    tunables: Tunables,
    misc: MiscConst,
    default_score: Score,
}

impl Sim {
    /// Creates an engine for the candidate `tunables`.
    ///
    /// `default_score` holds the scale factors of the three scores.
    pub fn new(tunables: Tunables, default_score: Score, misc: MiscConst) -> Self {
        Self {
            tunables,
            misc,
            default_score,
        }
    }

    /// Candidate being evaluated.
    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Simulation constants.
    pub fn misc(&self) -> &MiscConst {
        &self.misc
    }

    /// Replays both traces and scores the candidate.
    pub fn run(
        &self,
        workload: &Workload,
        idleload: &Workload,
        soc: &Soc,
        mode: RunMode<'_>,
    ) -> Result<Score, SimError> {
        if soc.clusters.is_empty() {
            return Err(SimError::NoClusters);
        }
        let active = self.replay(workload, soc, self.misc.working_base_mw);
        let idle = self.replay(idleload, soc, self.misc.idle_base_mw);
        let idle_power_consumed: u64 = idle.power_log.iter().map(|&p| p as u64).sum();

        let (battery_life, ref_power_consumed) = match mode {
            RunMode::Init => {
                let reference = self.init_ref_batt_partition(&active.power_log);
                (self.eval_batterylife(&active.power_log, &reference)?, reference)
            }
            RunMode::Compare(reference) => (
                self.eval_batterylife(&active.power_log, reference)?,
                reference.to_vec(),
            ),
        };
        let score = Score {
            performance: self.eval_performance(workload, soc, &active.capacity_log),
            battery_life,
            idle_lasting: self.eval_idle_lasting(idle_power_consumed),
            ref_power_consumed,
        };
        debug!(
            "{} on {} ({}): performance={:.4} battery_life={:.4} idle_lasting={:.4}",
            workload.name,
            soc.name,
            if mode == RunMode::Init { "init" } else { "compare" },
            score.performance,
            score.battery_life,
            score.idle_lasting
        );
        Ok(score)
    }

    fn governors(&self, soc: &Soc) -> Vec<Interactive> {
        soc.clusters
            .iter()
            .enumerate()
            .map(|(idx, cluster)| {
                let tunables = self
                    .tunables
                    .interactive
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| InteractiveTunables::default_for(&cluster.model));
                Interactive::new(&tunables, self.tunables.sched.timer_rate, &cluster.model)
            })
            .collect()
    }

    /// Replays a trace quantum by quantum and logs the delivered capacity and the consumed power.
    ///
    /// Each quantum is executed at the frequencies selected so far (input boost applies immediately),
    /// governors sample at the end of the quantum and their choice takes effect from the next one.
    pub fn replay(&self, workload: &Workload, soc: &Soc, base_mw: u32) -> Replay {
        let mut clusters: Vec<Cluster> = soc.clusters.iter().map(|c| Cluster::new(c.model.clone())).collect();
        let mut governors = self.governors(soc);
        let mut hmp = WaltHmp::new(&self.tunables.sched, soc);
        let mut input = InputBoost::new(&self.tunables.input);
        let max_capacity = soc.max_capacity();

        let mut replay = Replay {
            capacity_log: Vec::with_capacity(workload.len()),
            power_log: Vec::with_capacity(workload.len()),
        };
        for (now, slice) in workload.windowed_load.iter().enumerate() {
            let now = now as u64;
            let mut loads = slice.loads.clone();
            adapt_load(&mut loads, max_capacity);

            let boosted = input.handle_input(slice.has_input, now);
            if boosted {
                for (idx, cluster) in clusters.iter_mut().enumerate() {
                    let freq = cluster.cur_freq().max(input.boost_freq(idx));
                    cluster.set_cur_freq(freq);
                }
            }

            let cluster_loads = hmp.schedule(&loads);
            let mut capacity = 0u32;
            let mut power = base_mw;
            for (cluster, load) in clusters.iter().zip(&cluster_loads) {
                capacity = capacity.saturating_add(cluster.total_capacity());
                power = power.saturating_add(cluster.calc_power(&load.core_loads));
            }
            replay.capacity_log.push(capacity);
            replay.power_log.push(quantify_power(power));

            for (idx, ((cluster, governor), load)) in clusters
                .iter_mut()
                .zip(governors.iter_mut())
                .zip(&cluster_loads)
                .enumerate()
            {
                if !governor.is_sample_tick(now) {
                    continue;
                }
                let busy = (load.demand as u64 * 100 / cluster.capacity().max(1) as u64).min(100) as u32;
                let mut freq = governor.timer(now, cluster.cur_freq(), busy);
                if boosted {
                    freq = freq.max(input.boost_freq(idx));
                }
                cluster.set_cur_freq(freq);
            }
        }
        replay
    }

    /// Workload complexity implied by the governors' posture, in [0, 1].
    ///
    /// A lazier posture makes lag runs count sooner, see [`Sim::lag_thresholds`].
    ///
    /// The render thread mostly lands on the big cluster and the remaining work on the little one, so
    /// the postures are weighted by the render and common fractions.
    pub fn calc_complexity(&self, little: &Interactive, big: &Interactive) -> f64 {
        let weight = self.misc.render_fraction + self.misc.common_fraction;
        if weight <= 0. {
            return 0.;
        }
        let complexity =
            (self.misc.render_fraction * big.posture() + self.misc.common_fraction * little.posture()) / weight;
        complexity.clamp(0., 1.)
    }

    /// Lag thresholds for a workload of the given complexity.
    ///
    /// Tolerated and mild runs shrink by up to `complexity_fraction` as complexity grows, the frozen run
    /// length stays fixed.
    pub fn lag_thresholds(&self, complexity: f64) -> LagThresholds {
        let tolerance = 1. - self.misc.complexity_fraction * complexity.clamp(0., 1.);
        let scale = |len: usize| (len as f64 * tolerance).round() as usize;
        let l1 = scale(self.misc.seq_lag_l1);
        LagThresholds {
            l1,
            l2: scale(self.misc.seq_lag_l2).max(l1),
            max: self.misc.seq_lag_max,
        }
    }

    /// Complexity derived from the postures of the first (little) and last (big) cluster governors.
    pub fn soc_complexity(&self, soc: &Soc) -> f64 {
        let governors = self.governors(soc);
        match (governors.first(), governors.last()) {
            (Some(little), Some(big)) => self.calc_complexity(little, big),
            _ => 0.,
        }
    }

    fn lag_penalty(run: usize, thresholds: LagThresholds) -> usize {
        let (l1, l2) = (thresholds.l1, thresholds.l2);
        if run <= l1 {
            0
        } else if run <= l2 {
            run - l1
        } else {
            (run - l1) + 2 * (run - l2)
        }
    }

    fn perf_window_eval(window: &[bool], thresholds: LagThresholds) -> f64 {
        let mut penalty = 0usize;
        for (is_lag, run) in &window.iter().group_by(|&&lag| lag) {
            if !is_lag {
                continue;
            }
            let run = run.count();
            if run >= thresholds.max {
                return 0.;
            }
            penalty += Self::lag_penalty(run, thresholds);
        }
        (1. - penalty as f64 / window.len() as f64).max(0.)
    }

    /// Mean score of the `perf_partition_len` windows of the lag sequence with the configured thresholds.
    pub fn perf_partition_eval(&self, lag_seq: &[bool]) -> f64 {
        self.perf_partition_eval_with(
            lag_seq,
            LagThresholds {
                l1: self.misc.seq_lag_l1,
                l2: self.misc.seq_lag_l2,
                max: self.misc.seq_lag_max,
            },
        )
    }

    /// Mean score of the `perf_partition_len` windows of the lag sequence.
    ///
    /// Lag runs up to `l1` are free, runs up to `l2` cost their excess length, longer runs cost twice
    /// their excess over `l2` on top, a run of `max` zeroes its window.
    pub fn perf_partition_eval_with(&self, lag_seq: &[bool], thresholds: LagThresholds) -> f64 {
        let windows: SampleMetric<f64> = lag_seq
            .chunks(self.misc.perf_partition_len.max(1))
            .map(|window| Self::perf_window_eval(window, thresholds))
            .collect();
        windows.mean()
    }

    /// Capacity each quantum of the workload requires, never more than the SoC can deliver.
    pub fn required_capacity(&self, workload: &Workload, soc: &Soc) -> Vec<f64> {
        let max_capacity = soc.max_capacity();
        let max_total = soc.max_total_capacity() as f64;
        workload
            .windowed_load
            .iter()
            .map(|slice| {
                let mut loads = slice.loads.clone();
                adapt_load(&mut loads, max_capacity);
                let common: u64 = loads.iter().map(|&x| x as u64).sum();
                let render = slice.render_load.min(max_capacity);
                (self.misc.render_fraction * render as f64 + self.misc.common_fraction * common as f64).min(max_total)
            })
            .collect()
    }

    /// Scores how well the delivered capacity kept up with the workload.
    pub fn eval_performance(&self, workload: &Workload, soc: &Soc, capacity_log: &[u32]) -> f64 {
        let lag_seq: Vec<bool> = self
            .required_capacity(workload, soc)
            .into_iter()
            .zip(capacity_log)
            .map(|(required, &capacity)| (capacity as f64) < required)
            .collect();
        let thresholds = self.lag_thresholds(self.soc_complexity(soc));
        self.perf_partition_eval_with(&lag_seq, thresholds) / self.default_score.performance
    }

    /// Sums the power sequence over `batt_partition_len` windows.
    pub fn init_ref_batt_partition(&self, power_seq: &[u32]) -> Vec<u64> {
        power_seq
            .chunks(self.misc.batt_partition_len.max(1))
            .map(|window| window.iter().map(|&p| p as u64).sum())
            .collect()
    }

    /// Mean ratio of reference to candidate power over the battery windows.
    pub fn batt_partition_eval(&self, power_seq: &[u32], reference: &[u64]) -> Result<f64, SimError> {
        if reference.is_empty() {
            return Err(SimError::MissingReference);
        }
        let candidate = self.init_ref_batt_partition(power_seq);
        if candidate.len() != reference.len() {
            return Err(SimError::ReferenceMismatch {
                reference: reference.len(),
                candidate: candidate.len(),
            });
        }
        let ratios: SampleMetric<f64> = reference
            .iter()
            .zip(&candidate)
            .map(|(&r, &c)| r as f64 / c as f64)
            .collect();
        Ok(ratios.mean())
    }

    /// Scores the power log against the reference partition.
    pub fn eval_batterylife(&self, power_log: &[u32], reference: &[u64]) -> Result<f64, SimError> {
        Ok(self.batt_partition_eval(power_log, reference)? / self.default_score.battery_life)
    }

    /// Inverse of the idle power, the caller must provide an idle trace consuming some power.
    pub fn eval_idle_lasting(&self, idle_power_consumed: u64) -> f64 {
        1.0 / (idle_power_consumed as f64 * self.default_score.idle_lasting)
    }
}
