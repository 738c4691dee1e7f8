//! Utilities for evaluating a population of candidates in parallel.

use std::sync::{mpsc::channel, Arc};

use itertools::izip;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;

use govsim_model::soc::Soc;
use govsim_model::workload::Workload;

use crate::config::MiscConst;
use crate::error::SimError;
use crate::score::Score;
use crate::sim::{RunMode, Sim};
use crate::tunables::Tunables;

/// A candidate together with its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Evaluated candidate.
    pub tunables: Tunables,
    /// Its scores.
    pub score: Score,
}

/// Inputs shared by every run of a tuning session.
#[derive(Debug, Clone)]
pub struct EvalInputs {
    /// Active workload trace.
    pub workload: Workload,
    /// Idle workload trace.
    pub idleload: Workload,
    /// Hardware model.
    pub soc: Soc,
}

/// Runs the baseline candidate in init mode.
///
/// The returned score carries the reference partition for [`evaluate_population`].
pub fn evaluate_baseline(
    tunables: Tunables,
    default_score: Score,
    misc: MiscConst,
    inputs: &EvalInputs,
) -> Result<EvalResult, SimError> {
    let sim = Sim::new(tunables, default_score, misc);
    let score = sim.run(&inputs.workload, &inputs.idleload, &inputs.soc, RunMode::Init)?;
    info!(
        "baseline: {} reference windows, idle lasting {:.6}",
        score.ref_power_consumed.len(),
        score.idle_lasting
    );
    Ok(EvalResult {
        tunables: sim.tunables().clone(),
        score,
    })
}

/// Scores candidates in a thread pool with `n_workers` worker threads.
///
/// Results are returned in candidate order, one per candidate. A candidate whose worker panicked gets
/// [`SimError::WorkerPanicked`]. The reference partition is frozen before the pool starts and shared
/// read-only between workers.
pub fn evaluate_population_n_workers(
    mut candidates: Vec<Tunables>,
    default_score: Score,
    misc: MiscConst,
    inputs: Arc<EvalInputs>,
    reference: Arc<Vec<u64>>,
    n_workers: usize,
) -> Vec<Result<EvalResult, SimError>> {
    let pool = ThreadPool::new(n_workers.max(1));
    let (tx, rx) = channel();
    let len = candidates.len();
    debug!("evaluating {} candidates on {} workers", len, n_workers.max(1));
    for (id, tunables) in izip!(0..len, candidates.drain(..)) {
        let tx = tx.clone();
        let inputs = inputs.clone();
        let reference = reference.clone();
        let sim = Sim::new(tunables, default_score.clone(), misc.clone());
        pool.execute(move || {
            let result = sim
                .run(
                    &inputs.workload,
                    &inputs.idleload,
                    &inputs.soc,
                    RunMode::Compare(reference.as_slice()),
                )
                .map(|score| EvalResult {
                    tunables: sim.tunables().clone(),
                    score,
                });
            let _ = tx.send((id, result));
        });
    }
    drop(tx);
    let mut results: Vec<Option<Result<EvalResult, SimError>>> = vec![None; len];
    for (id, result) in rx.iter().take(len) {
        results[id] = Some(result);
    }
    results
        .into_iter()
        .enumerate()
        .map(|(id, result)| {
            result.unwrap_or_else(|| {
                warn!("candidate {} produced no result", id);
                Err(SimError::WorkerPanicked)
            })
        })
        .collect()
}

/// Scores candidates in a thread pool with one worker per available core.
pub fn evaluate_population(
    candidates: Vec<Tunables>,
    default_score: Score,
    misc: MiscConst,
    inputs: Arc<EvalInputs>,
    reference: Arc<Vec<u64>>,
) -> Vec<Result<EvalResult, SimError>> {
    let n_workers = std::thread::available_parallelism().map_or(1, |n| n.get());
    evaluate_population_n_workers(candidates, default_score, misc, inputs, reference, n_workers)
}
