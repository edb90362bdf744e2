use loadgen_common::config::LoadgenConfig;
use loadgen_common::LoadgenError;

#[test]
fn defaults_match_fixed_run() {
    let cfg = LoadgenConfig::default();
    assert_eq!(cfg.api_base, "http://localhost:8000");
    assert_eq!(cfg.workers, 3);
    assert_eq!(cfg.duration_secs, 120);
    assert_eq!((cfg.min_delay_ms, cfg.max_delay_ms), (100, 2000));
    assert!(cfg.validate().is_ok());
}

#[test]
fn yaml_fills_missing_keys_with_defaults() {
    let cfg = LoadgenConfig::from_yaml("api_base: http://eta:9000/\nworkers: 8\nseed: 7\n").unwrap();
    assert_eq!(cfg.workers, 8);
    assert_eq!(cfg.seed, Some(7));
    assert_eq!(cfg.duration_secs, 120);
    assert_eq!(cfg.base_url(), "http://eta:9000");
}

#[test]
fn rejects_zero_workers_and_inverted_delay() {
    let cfg = LoadgenConfig { workers: 0, ..Default::default() };
    assert!(matches!(cfg.validate(), Err(LoadgenError::Config(_))));

    let cfg = LoadgenConfig { min_delay_ms: 500, max_delay_ms: 10, ..Default::default() };
    assert!(matches!(cfg.validate(), Err(LoadgenError::Config(_))));
}

#[test]
fn rejects_base_without_scheme() {
    let cfg = LoadgenConfig { api_base: "localhost:8000".into(), ..Default::default() };
    assert!(cfg.validate().is_err());
}

#[test]
fn bad_yaml_is_an_error() {
    assert!(matches!(LoadgenConfig::from_yaml("workers: [1, 2"), Err(LoadgenError::Yaml(_))));
}

#[test]
fn rejects_durations_and_delays_past_their_limits() {
    use loadgen_common::config::{MAX_DELAY_MS, MAX_DURATION_SECS};

    let cfg = LoadgenConfig { duration_secs: u64::MAX, ..Default::default() };
    assert!(matches!(cfg.validate(), Err(LoadgenError::Config(_))));

    let cfg = LoadgenConfig { max_delay_ms: u64::MAX, ..Default::default() };
    assert!(matches!(cfg.validate(), Err(LoadgenError::Config(_))));

    let cfg = LoadgenConfig {
        duration_secs: MAX_DURATION_SECS,
        min_delay_ms: MAX_DELAY_MS,
        max_delay_ms: MAX_DELAY_MS,
        ..Default::default()
    };
    assert!(cfg.validate().is_ok());
}
