use govsim_core::input_boost::InputBoost;
use govsim_core::tunables::InputBoostTunables;

#[test]
fn test_boost_window() {
    let mut boost = InputBoost::new(&InputBoostTunables {
        boost_freq: vec![1000, 0],
        duration_quantum: 3,
    });
    assert!(!boost.handle_input(false, 0));
    assert!(boost.handle_input(true, 1));
    assert!(boost.handle_input(false, 2));
    assert!(boost.handle_input(false, 3));
    assert!(!boost.handle_input(false, 4));
    // a new event restarts the window
    assert!(boost.handle_input(true, 5));
    assert!(boost.handle_input(true, 7));
    assert!(boost.handle_input(false, 9));
    assert!(!boost.handle_input(false, 10));
    assert_eq!(boost.boost_freq(0), 1000);
    assert_eq!(boost.boost_freq(1), 0);
    assert_eq!(boost.boost_freq(2), 0);
}

#[test]
fn test_zero_duration_never_boosts() {
    let mut boost = InputBoost::new(&InputBoostTunables::default());
    assert!(!boost.handle_input(true, 0));
    assert!(!boost.handle_input(true, 1));
}
