#![allow(dead_code)]

use govsim_model::soc::{ClusterModel, Opp, Soc};
use govsim_model::workload::{LoadSlice, Workload};

pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} != {}", x, y);
}

pub fn opp(freq: u32, capacity: u32, power: u32) -> Opp {
    Opp { freq, capacity, power }
}

/// Single core cluster with two operating points: 1000 MHz and 2000 MHz.
pub fn single_cluster_soc() -> Soc {
    Soc::new(
        "single",
        vec![ClusterModel {
            core_num: 1,
            min_freq: 1000,
            max_freq: 2000,
            opp_model: vec![opp(1000, 100, 100), opp(2000, 200, 400)],
        }],
    )
    .unwrap()
}

pub fn four_opp_model() -> ClusterModel {
    ClusterModel {
        core_num: 2,
        min_freq: 300,
        max_freq: 1500,
        opp_model: vec![opp(300, 30, 10), opp(600, 60, 30), opp(1000, 100, 80), opp(1500, 150, 160)],
    }
}

pub fn big_little_soc() -> Soc {
    Soc::new(
        "big-little",
        vec![
            ClusterModel {
                core_num: 2,
                min_freq: 300,
                max_freq: 1000,
                opp_model: vec![opp(300, 30, 10), opp(1000, 100, 60)],
            },
            ClusterModel {
                core_num: 2,
                min_freq: 500,
                max_freq: 2000,
                opp_model: vec![opp(500, 75, 50), opp(2000, 300, 500)],
            },
        ],
    )
    .unwrap()
}

pub fn flat_workload(loads: Vec<u32>, render_load: u32, len: usize) -> Workload {
    Workload::flat("flat", LoadSlice::new(render_load, loads), len)
}

pub fn idle_workload(len: usize) -> Workload {
    Workload::flat("idle", LoadSlice::new(0, vec![0]), len)
}
