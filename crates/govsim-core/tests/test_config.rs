mod common;
use common::{big_little_soc, single_cluster_soc};

use govsim_core::config::MiscConst;
use govsim_core::error::ConfigError;
use govsim_core::tunables::{Tunables, WindowStatsPolicy};

#[test]
fn test_misc_defaults() {
    let misc = MiscConst::from_yaml_str("working_base_mw: 200\nseq_lag_max: 40\n").unwrap();
    assert_eq!(misc.working_base_mw, 200);
    assert_eq!(misc.seq_lag_max, 40);
    assert_eq!(misc.idle_base_mw, 30);
    assert_eq!(misc.perf_partition_len, 64);
    assert_eq!(misc.batt_partition_len, 256);
    assert_eq!(misc.render_fraction, 0.6);
    assert_eq!(MiscConst::from_yaml_str("{}").unwrap(), MiscConst::default());
}

#[test]
fn test_misc_validation() {
    for yaml in [
        "perf_partition_len: 0",
        "batt_partition_len: 0",
        "seq_lag_l1: 6",
        "seq_lag_max: 5",
        "render_fraction: 1.5",
    ] {
        let err = MiscConst::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstant { .. }), "{}: {}", yaml, err);
    }
    assert!(matches!(
        MiscConst::from_yaml_str("seq_lag_l1: [1]"),
        Err(ConfigError::Yaml(_))
    ));
    assert!(matches!(
        MiscConst::from_file("/nonexistent/misc.yaml"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_default_tunables() {
    let soc = big_little_soc();
    let tunables = Tunables::default_for(&soc);
    assert_eq!(tunables.interactive.len(), 2);
    assert_eq!(tunables.interactive[1].hispeed_freq, 2000);
    assert_eq!(tunables.interactive[0].target_loads, vec![99, 99]);
    assert_eq!(tunables.sched.sched_window_stats_policy, WindowStatsPolicy::MaxRecentAvg);
    assert!(tunables.validate(&soc).is_ok());
}

#[test]
fn test_tunables_from_yaml() {
    let yaml = "
interactive:
  - hispeed_freq: 1500
    go_hispeed_load: 90
    min_sample_time: 2
    max_freq_hysteresis: 1
    above_hispeed_delay: [1, 2]
    target_loads: [80, 95]
sched:
  sched_downmigrate: 60
  sched_upmigrate: 80
  sched_freq_aggregate_threshold_pct: 200
  sched_ravg_hist_size: 3
  sched_window_stats_policy: max
  timer_rate: 4
input:
  boost_freq: [2000]
  duration_quantum: 10
";
    let tunables = Tunables::from_yaml_str(yaml).unwrap();
    assert_eq!(tunables.interactive[0].target_loads, vec![80, 95]);
    assert_eq!(tunables.sched.sched_window_stats_policy, WindowStatsPolicy::Max);
    assert_eq!(tunables.sched.timer_rate, 4);
    assert_eq!(tunables.input.boost_freq, vec![2000]);
    assert!(tunables.validate(&single_cluster_soc()).is_ok());
    assert!(tunables.validate(&big_little_soc()).is_err());
}

fn check(f: impl FnOnce(&mut Tunables)) -> String {
    let soc = single_cluster_soc();
    let mut tunables = Tunables::default_for(&soc);
    f(&mut tunables);
    match tunables.validate(&soc) {
        Err(ConfigError::InvalidTunable { name, .. }) => name,
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_tunables_validation() {
    assert_eq!(check(|t| t.interactive[0].go_hispeed_load = 0), "cluster0.go_hispeed_load");
    assert_eq!(check(|t| t.interactive[0].target_loads = vec![]), "cluster0.target_loads");
    assert_eq!(check(|t| t.interactive[0].target_loads = vec![90, 101]), "cluster0.target_loads");
    assert_eq!(check(|t| t.interactive[0].above_hispeed_delay = vec![]), "cluster0.above_hispeed_delay");
    assert_eq!(check(|t| t.interactive.clear()), "interactive");
    assert_eq!(check(|t| t.sched.sched_downmigrate = 99), "sched_downmigrate");
    assert_eq!(check(|t| t.sched.sched_ravg_hist_size = 6), "sched_ravg_hist_size");
    assert_eq!(check(|t| t.sched.timer_rate = 0), "timer_rate");
    assert_eq!(check(|t| t.input.boost_freq = vec![0; 3]), "boost_freq");
}
