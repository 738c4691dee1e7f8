use govsim_model::soc::{Cluster, ClusterModel, Opp, Soc};
use govsim_model::ModelError;

fn opp(freq: u32, capacity: u32, power: u32) -> Opp {
    Opp { freq, capacity, power }
}

fn little_model() -> ClusterModel {
    ClusterModel {
        core_num: 4,
        min_freq: 600,
        max_freq: 1500,
        opp_model: vec![
            opp(300, 30, 10),
            opp(600, 60, 25),
            opp(1000, 100, 60),
            opp(1500, 150, 120),
            opp(1800, 180, 200),
        ],
    }
}

#[test]
fn test_opp_rounding_respects_limits() {
    let model = little_model();
    assert_eq!(model.freq_ceiling_to_opp(0), 600);
    assert_eq!(model.freq_ceiling_to_opp(601), 1000);
    assert_eq!(model.freq_ceiling_to_opp(1000), 1000);
    assert_eq!(model.freq_ceiling_to_opp(5000), 1500);
    assert_eq!(model.freq_floor_to_opp(999), 600);
    assert_eq!(model.freq_floor_to_opp(1000), 1000);
    assert_eq!(model.freq_floor_to_opp(100), 600);
    assert_eq!(model.lowest_freq(), 600);
    assert_eq!(model.highest_freq(), 1500);
    assert_eq!(model.max_capacity(), 150);
    assert_eq!(model.capacity_at(1200), 100);
}

#[test]
fn test_cluster_power_and_capacity() {
    let mut cluster = Cluster::new(little_model());
    assert_eq!(cluster.cur_freq(), 600);
    cluster.set_cur_freq(1001);
    assert_eq!(cluster.cur_freq(), 1500);
    assert_eq!(cluster.capacity(), 150);
    assert_eq!(cluster.total_capacity(), 600);
    // 100% + 50% + overloaded core capped at 100% + idle core
    assert_eq!(cluster.calc_power(&[150, 75, 400, 0]), 120 + 60 + 120);
    // loads beyond core_num are ignored
    assert_eq!(cluster.calc_power(&[0, 0, 0, 0, 150]), 0);
}

#[test]
fn test_validate_rejects_unsorted_table() {
    let mut model = little_model();
    model.opp_model.swap(0, 1);
    let err = Soc::new("bad", vec![model]).unwrap_err();
    assert!(matches!(err, ModelError::InvalidCluster { cluster: 0, .. }));

    let mut model = little_model();
    model.opp_model.clear();
    assert!(model.validate(1).is_err());

    let mut model = little_model();
    model.min_freq = 1600;
    model.max_freq = 1700;
    assert!(model.validate(0).is_err());
}

#[test]
fn test_soc_from_yaml() {
    let yaml = r#"
name: test-soc
clusters:
  - core_num: 4
    min_freq: 300
    max_freq: 1000
    opp_model:
      - { freq: 300, capacity: 30, power: 10 }
      - { freq: 1000, capacity: 100, power: 60 }
  - core_num: 2
    min_freq: 800
    max_freq: 2000
    opp_model:
      - { freq: 800, capacity: 120, power: 90 }
      - { freq: 2000, capacity: 300, power: 400 }
"#;
    let soc = Soc::from_yaml_str(yaml).unwrap();
    assert_eq!(soc.name, "test-soc");
    assert_eq!(soc.clusters.len(), 2);
    assert_eq!(soc.clusters[1].cur_freq(), 800);
    assert_eq!(soc.max_capacity(), 300);
    // 4 * 100 + 2 * 300
    assert_eq!(soc.max_total_capacity(), 1000);
}

#[test]
fn test_soc_from_missing_file() {
    let err = Soc::from_file("/nonexistent/soc.yaml").unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
}
