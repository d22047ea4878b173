use clap::ValueEnum;
use pingbench_load::scenario::LoadScenario;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;

#[test]
fn test_parses_command_line_names() {
    for (name, expected) in [
        ("light", LoadScenario::Light),
        ("peak", LoadScenario::Peak),
        ("constant", LoadScenario::Constant),
    ] {
        assert_eq!(LoadScenario::from_str(name, false), Ok(expected), "parse {name:?}");
        assert_eq!(expected.to_string(), name);
    }
    assert!(LoadScenario::from_str("burst", false).is_err());
}

#[test]
fn test_light_is_fixed_100ms() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..10 {
        assert_eq!(LoadScenario::Light.pace(&mut rng), Duration::from_millis(100));
    }
}

#[test]
fn test_constant_never_pauses() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..10 {
        assert_eq!(LoadScenario::Constant.pace(&mut rng), Duration::ZERO);
    }
}

#[test]
fn test_peak_is_whole_millis_below_ten() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..1_000 {
        let pause = LoadScenario::Peak.pace(&mut rng);
        assert!(pause < Duration::from_millis(10));
        assert_eq!(pause.subsec_nanos() % 1_000_000, 0);
        seen.insert(pause);
    }
    assert_eq!(seen.len(), 10, "every value in 0..10 ms should be drawn");
}
