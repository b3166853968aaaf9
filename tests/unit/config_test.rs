//! Tests for configuration validation

use prometheus_task_scheduler::config::{SchedulerConfig, WorkerPoolConfig};

fn valid_pool() -> WorkerPoolConfig {
    WorkerPoolConfig::new()
        .with_worker_count(4)
        .with_max_queue_depth(64)
}

#[test]
fn test_pool_config_validation() {
    assert!(valid_pool().validate().is_ok());
}

#[test]
fn test_pool_config_invalid_worker_count() {
    let invalid = valid_pool().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_queue_depth() {
    let invalid = valid_pool().with_max_queue_depth(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_stack_size() {
    let invalid = valid_pool().with_thread_stack_size(4096);
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("thread_stack_size"));
}

#[test]
fn test_scheduler_config_validation() {
    let config = SchedulerConfig {
        pool: valid_pool(),
        poll_interval_ms: 250,
        max_results_per_task: Some(10),
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.poll_interval().as_millis(), 250);
}

#[test]
fn test_scheduler_config_zero_poll_interval() {
    let config = SchedulerConfig {
        poll_interval_ms: 0,
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_zero_result_cap() {
    let config = SchedulerConfig {
        max_results_per_task: Some(0),
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_nested_pool_error() {
    let config = SchedulerConfig {
        pool: valid_pool().with_worker_count(0),
        ..SchedulerConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.starts_with("pool invalid"));
}

#[test]
fn test_scheduler_config_from_json_defaults() {
    let config = SchedulerConfig::from_json_str(r#"{"poll_interval_ms": 50}"#).unwrap();
    assert_eq!(config.poll_interval_ms, 50);
    assert_eq!(config.max_results_per_task, None);
    assert_eq!(config.pool, WorkerPoolConfig::default());
}

#[test]
fn test_scheduler_config_from_json_nested() {
    let json = r#"{
        "pool": { "worker_count": 3, "max_queue_depth": 8 },
        "max_results_per_task": 5
    }"#;
    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.pool.worker_count, 3);
    assert_eq!(config.pool.max_queue_depth, 8);
    assert_eq!(config.max_results_per_task, Some(5));
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"poll_interval_ms": 0}"#).is_err());
}

#[test]
fn test_scheduler_config_from_env() {
    std::env::set_var("SCHEDULER_POLL_INTERVAL_MS", "75");
    std::env::set_var("SCHEDULER_MAX_RESULTS", "3");
    let config = SchedulerConfig::from_env();

    std::env::set_var("SCHEDULER_WORKER_COUNT", "many");
    let invalid = SchedulerConfig::from_env();

    std::env::remove_var("SCHEDULER_POLL_INTERVAL_MS");
    std::env::remove_var("SCHEDULER_MAX_RESULTS");
    std::env::remove_var("SCHEDULER_WORKER_COUNT");

    let config = config.unwrap();
    assert_eq!(config.poll_interval_ms, 75);
    assert_eq!(config.max_results_per_task, Some(3));
    assert!(invalid.unwrap_err().starts_with("SCHEDULER_WORKER_COUNT"));
}
