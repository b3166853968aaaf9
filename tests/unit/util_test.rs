//! Tests for utility modules

use chrono::TimeDelta;
use prometheus_task_scheduler::util::{duration_until, now, now_ms, TaskId};
use std::time::Duration;

#[test]
fn test_now_ms_tracks_now() {
    let before = now().timestamp_millis();
    let ms = now_ms();
    let after = now().timestamp_millis();
    assert!(before <= ms && ms <= after);
}

#[test]
fn test_duration_until_future_and_past() {
    let base = now();
    assert_eq!(
        duration_until(base, base + TimeDelta::milliseconds(1500)),
        Duration::from_millis(1500)
    );
    assert_eq!(duration_until(base, base - TimeDelta::seconds(3)), Duration::ZERO);
}

#[test]
fn test_task_id_roundtrip() {
    let id = TaskId::from("backup");
    assert_eq!(id.as_str(), "backup");
    assert_eq!(id.to_string(), "backup");
    assert_eq!(TaskId::from(String::from("backup")), id);
}
