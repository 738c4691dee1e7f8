mod common;
use common::{assert_float_eq, flat_workload, idle_workload, single_cluster_soc};

use govsim_model::soc::Soc;

use govsim_core::config::MiscConst;
use govsim_core::error::SimError;
use govsim_core::score::Score;
use govsim_core::sim::{adapt_load, quantify_power, LagThresholds, RunMode, Sim};
use govsim_core::tunables::Tunables;

fn sim_with(misc: MiscConst) -> Sim {
    Sim::new(Tunables::default_for(&single_cluster_soc()), Score::default(), misc)
}

fn lag_seq(bits: u32, len: usize) -> Vec<bool> {
    (0..len).map(|i| bits & (1 << i) != 0).collect()
}

#[test]
fn test_power_quantification() {
    assert_eq!(quantify_power(15), 0);
    assert_eq!(quantify_power(31), 1);
    assert_eq!(quantify_power(32), 2);
    assert_eq!(quantify_power(200), 12);
}

#[test]
fn test_adapt_load() {
    let mut loads = vec![50, 150, 100, 0];
    adapt_load(&mut loads, 100);
    assert_eq!(loads, vec![50, 100, 100, 0]);
    let mut empty: Vec<u32> = Vec::new();
    adapt_load(&mut empty, 100);
    assert!(empty.is_empty());
}

#[test]
fn test_lag_penalties() {
    let sim = sim_with(MiscConst::default());
    let mut seq = vec![false; 64];
    assert_eq!(sim.perf_partition_eval(&seq), 1.);

    // short runs are free
    seq[10] = true;
    seq[11] = true;
    assert_eq!(sim.perf_partition_eval(&seq), 1.);

    seq[12] = true;
    assert_float_eq(sim.perf_partition_eval(&seq), 1. - 1. / 64., 1e-12);

    for x in seq.iter_mut().take(16).skip(13) {
        *x = true;
    }
    // run of 6: (6 - 2) + 2 * (6 - 5)
    assert_float_eq(sim.perf_partition_eval(&seq), 1. - 6. / 64., 1e-12);

    let frozen = vec![true; 30];
    assert_eq!(sim.perf_partition_eval(&frozen), 0.);
    assert_eq!(sim.perf_partition_eval(&[]), 0.);
}

#[test]
fn test_complexity_shortens_lag_thresholds() {
    let misc = MiscConst {
        complexity_fraction: 0.5,
        ..MiscConst::default()
    };
    let sim = sim_with(misc);
    assert_eq!(sim.lag_thresholds(0.), LagThresholds { l1: 2, l2: 5, max: 30 });
    // round(2 * 0.5), round(5 * 0.5)
    assert_eq!(sim.lag_thresholds(1.), LagThresholds { l1: 1, l2: 3, max: 30 });
    assert_eq!(sim.lag_thresholds(7.), sim.lag_thresholds(1.));

    // run of 2 is free for a simple workload and costs one quantum for a complex one
    let mut seq = vec![false; 64];
    seq[10] = true;
    seq[11] = true;
    assert_eq!(sim.perf_partition_eval_with(&seq, sim.lag_thresholds(0.)), 1.);
    assert_float_eq(sim.perf_partition_eval_with(&seq, sim.lag_thresholds(1.)), 1. - 1. / 64., 1e-12);
}

#[test]
fn test_partitions_are_averaged() {
    let sim = sim_with(MiscConst::default());
    let mut seq = vec![false; 128];
    for x in seq.iter_mut().skip(20).take(30) {
        *x = true;
    }
    assert_float_eq(sim.perf_partition_eval(&seq), 0.5, 1e-12);

    // trailing partial partition counts as a window of its own
    let mut seq = vec![false; 96];
    for x in seq.iter_mut().skip(64) {
        *x = true;
    }
    assert_float_eq(sim.perf_partition_eval(&seq), 0.5, 1e-12);
}

#[test]
fn test_more_lag_never_scores_better() {
    let misc = MiscConst {
        perf_partition_len: 12,
        seq_lag_l1: 1,
        seq_lag_l2: 3,
        seq_lag_max: 6,
        ..MiscConst::default()
    };
    let sim = sim_with(misc);
    let len = 12;
    for bits in 0u32..(1 << len) {
        let score = sim.perf_partition_eval(&lag_seq(bits, len));
        assert!((0. ..=1.).contains(&score));
        for i in 0..len {
            if bits & (1 << i) == 0 {
                let worse = sim.perf_partition_eval(&lag_seq(bits | (1 << i), len));
                assert!(worse <= score, "{:b} + bit {}: {} > {}", bits, i, worse, score);
            }
        }
    }
}

#[test]
fn test_battery_partitions() {
    let misc = MiscConst {
        batt_partition_len: 2,
        ..MiscConst::default()
    };
    let sim = sim_with(misc);
    assert_eq!(sim.init_ref_batt_partition(&[2, 2, 2, 2, 5]), vec![4, 4, 5]);
    let battery = sim.batt_partition_eval(&[1, 1, 1, 1], &[4, 4]).unwrap();
    assert_float_eq(battery, 2., 1e-12);
    let battery = sim.batt_partition_eval(&[1, 1, 4, 4], &[4, 4]).unwrap();
    assert_float_eq(battery, 1.25, 1e-12);

    let sim = sim_with(MiscConst::default());
    assert_eq!(sim.init_ref_batt_partition(&vec![1; 300]), vec![256, 44]);
}

#[test]
fn test_idle_lasting() {
    let sim = sim_with(MiscConst::default());
    assert_float_eq(sim.eval_idle_lasting(100), 0.01, 1e-12);
    assert_float_eq(sim.eval_idle_lasting(100) / sim.eval_idle_lasting(200), 2., 1e-12);

    let scaled = Sim::new(
        Tunables::default_for(&single_cluster_soc()),
        Score {
            idle_lasting: 0.5,
            ..Score::default()
        },
        MiscConst::default(),
    );
    assert_float_eq(scaled.eval_idle_lasting(100), 0.02, 1e-12);
}

#[test]
fn test_run_is_deterministic() {
    let soc = single_cluster_soc();
    let workload = flat_workload(vec![70, 20], 60, 300);
    let idleload = idle_workload(100);
    let sim = sim_with(MiscConst::default());
    let first = sim.run(&workload, &idleload, &soc, RunMode::Init).unwrap();
    let second = sim.run(&workload, &idleload, &soc, RunMode::Init).unwrap();
    assert_eq!(first, second);
    let compared = sim
        .run(&workload, &idleload, &soc, RunMode::Compare(&first.ref_power_consumed))
        .unwrap();
    assert_eq!(first, compared);
}

#[test]
fn test_battery_follows_reference() {
    let soc = single_cluster_soc();
    let workload = flat_workload(vec![50], 50, 256);
    let idleload = idle_workload(100);
    let sim = sim_with(MiscConst::default());
    let baseline = sim.run(&workload, &idleload, &soc, RunMode::Init).unwrap();
    let doubled: Vec<u64> = baseline.ref_power_consumed.iter().map(|x| x * 2).collect();
    let score = sim.run(&workload, &idleload, &soc, RunMode::Compare(&doubled)).unwrap();
    assert_float_eq(score.battery_life, 2., 1e-12);
    assert_eq!(score.ref_power_consumed, doubled);
    assert_eq!(score.performance, baseline.performance);
    assert_eq!(score.idle_lasting, baseline.idle_lasting);
}

#[test]
fn test_run_preconditions() {
    let soc = single_cluster_soc();
    let workload = flat_workload(vec![50], 50, 100);
    let idleload = idle_workload(100);
    let sim = sim_with(MiscConst::default());
    assert_eq!(
        sim.run(&workload, &idleload, &soc, RunMode::Compare(&[])),
        Err(SimError::MissingReference)
    );
    assert_eq!(
        sim.run(&workload, &idleload, &soc, RunMode::Compare(&[1, 2, 3])),
        Err(SimError::ReferenceMismatch {
            reference: 3,
            candidate: 1
        })
    );
    let empty = Soc::new("empty", Vec::new()).unwrap();
    assert_eq!(
        sim.run(&workload, &idleload, &empty, RunMode::Init),
        Err(SimError::NoClusters)
    );
}
