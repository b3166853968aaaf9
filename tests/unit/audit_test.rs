//! Tests for audit sink

use prometheus_task_scheduler::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};
use prometheus_task_scheduler::TaskId;

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let id = TaskId::from("task1");

    sink.record(build_audit_event(&id, "report", AuditAction::Submitted, Some("payload".to_string())));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].task_id, id);
    assert_eq!(events[0].task_type, "report");
    assert_eq!(events[0].action, AuditAction::Submitted);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(&TaskId::from("task1"), "report", AuditAction::Submitted, None));
    sink.record(build_audit_event(&TaskId::from("task2"), "report", AuditAction::Submitted, None));
    sink.record(build_audit_event(&TaskId::from("task3"), "report", AuditAction::Submitted, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, TaskId::from("task2")); // First one popped
    assert_eq!(events[1].task_id, TaskId::from("task3"));
}

#[test]
fn test_build_audit_event() {
    let id = TaskId::from("task1");
    let event = build_audit_event(&id, "report", AuditAction::Completed, Some("result".to_string()));

    assert_eq!(event.task_id, id);
    assert_eq!(event.task_type, "report");
    assert_eq!(event.action, AuditAction::Completed);
    assert_eq!(event.detail, Some("result".to_string()));
    assert!(!event.event_id.is_empty());
    assert!(event.created_at_ms > 0);
}

#[test]
fn test_filter_by_action_and_task() {
    let sink = InMemoryAuditSink::new(16);
    let a = TaskId::from("a");
    let b = TaskId::from("b");

    sink.record(build_audit_event(&a, "sync", AuditAction::Started, None));
    sink.record(build_audit_event(&b, "sync", AuditAction::Sleeping, None));
    sink.record(build_audit_event(&a, "sync", AuditAction::Completed, None));
    sink.record(build_audit_event(&b, "sync", AuditAction::Promoted, None));

    assert_eq!(sink.tasks_with_action(AuditAction::Promoted), vec![b.clone()]);
    assert_eq!(sink.actions_for(&a), vec![AuditAction::Started, AuditAction::Completed]);
    assert_eq!(sink.actions_for(&b), vec![AuditAction::Sleeping, AuditAction::Promoted]);
}

#[test]
fn test_audit_action_serializes_snake_case() {
    let json = serde_json::to_string(&AuditAction::Cancelling).unwrap();
    assert_eq!(json, "\"cancelling\"");
    assert_eq!(AuditAction::Skipped.to_string(), "skipped");
}
