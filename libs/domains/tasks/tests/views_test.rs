//! Integration tests for the board views
//!
//! Replays event sequences through a real bus and checks each view holds
//! exactly what the last relevant event implies.

use domain_tasks::*;
use event_bus::{Event, HandlerError, handler_fn};
use serde_json::json;
use test_utils::TestDataBuilder;

fn wired() -> (TaskEventBus, BoardViews) {
    test_utils::init_test_tracing();
    let mut bus = TaskEventBus::named("views-test");
    let views = BoardViews::attach(&mut bus, &ViewsConfig::default()).unwrap();
    (bus, views)
}

fn publish(bus: &TaskEventBus, topic: &str, payload: serde_json::Value) {
    let event = TaskEvent::from_json(topic, payload).unwrap();
    let report = bus.publish(event);
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);
}

// ============================================================================
// InProgressTasks
// ============================================================================

#[test]
fn test_created_then_done_leaves_view() {
    let (bus, views) = wired();

    publish(&bus, "TASK_CREATED", json!({"id": 1, "status": "IN_PROGRESS"}));
    publish(&bus, "STATUS_CHANGED", json!({"id": 1, "status": "DONE"}));

    assert!(!views.in_progress.tasks().contains_key(&TaskId::from(1u64)));
}

#[test]
fn test_status_history_last_event_wins() {
    let (bus, views) = wired();
    let builder = TestDataBuilder::from_test_name("status_history");
    let histories = [
        ("a", vec!["TODO", "IN_PROGRESS"]),
        ("b", vec!["IN_PROGRESS", "REVIEW"]),
        ("c", vec!["IN_PROGRESS", "DONE", "IN_PROGRESS"]),
        ("d", vec!["TODO", "REVIEW", "DONE"]),
    ];

    for (suffix, statuses) in &histories {
        for status in statuses {
            publish(
                &bus,
                "STATUS_CHANGED",
                json!({"id": builder.task_id(suffix), "status": status}),
            );
        }
    }

    for (suffix, statuses) in &histories {
        let id = TaskId::from(builder.task_id(suffix));
        let expected = statuses.last() == Some(&"IN_PROGRESS");
        assert_eq!(views.in_progress.contains(&id), expected, "task {}", suffix);
    }
    assert_eq!(views.in_progress.len(), 2);
}

// ============================================================================
// CriticalBugs
// ============================================================================

#[test]
fn test_critical_bug_lifecycle() {
    let (bus, views) = wired();
    let id = TaskId::from("bug-1");

    publish(
        &bus,
        "TASK_CREATED",
        json!({"id": "bug-1", "type": "BUG", "priority": "HIGH"}),
    );
    assert!(views.critical_bugs.is_empty());

    publish(
        &bus,
        "PRIORITY_CHANGED",
        json!({"id": "bug-1", "type": "BUG", "priority": "CRITICAL"}),
    );
    assert!(views.critical_bugs.contains(&id));

    publish(
        &bus,
        "PRIORITY_CHANGED",
        json!({"id": "bug-1", "type": "FEATURE", "priority": "CRITICAL"}),
    );
    assert!(!views.critical_bugs.contains(&id));
}

#[test]
fn test_identical_priority_payload_twice() {
    let (bus, views) = wired();
    let payload = json!({"id": "bug-2", "type": "BUG", "priority": "CRITICAL", "title": "Crash"});

    publish(&bus, "PRIORITY_CHANGED", payload.clone());
    let after_first = views.critical_bugs.bugs();
    publish(&bus, "PRIORITY_CHANGED", payload);

    assert_eq!(views.critical_bugs.bugs(), after_first);
    assert_eq!(after_first.len(), 1);
}

// ============================================================================
// ActiveComments
// ============================================================================

#[test]
fn test_comment_window_holds_last_n() {
    let mut bus = TaskEventBus::new();
    let comments = ActiveComments::with_limit(&mut bus, 4).unwrap();

    for n in 0..9 {
        publish(&bus, "COMMENT_ADDED", json!({"n": n}));
    }

    let seen: Vec<_> = comments
        .comments()
        .iter()
        .filter_map(|c| c.get("n").and_then(|v| v.as_i64()))
        .collect();
    assert_eq!(seen, vec![5, 6, 7, 8]);
}

// ============================================================================
// Bus behavior seen from the views
// ============================================================================

#[test]
fn test_publish_without_subscribers_is_noop() {
    let (bus, _views) = wired();

    let report = bus.publish(TaskEvent::TaskOverdue(TaskPayload::new("t1")));

    assert_eq!(report.subscribers, 0);
    assert!(report.is_clean());
}

#[test]
fn test_failing_handler_does_not_block_views() {
    let mut bus = TaskEventBus::new();
    bus.subscribe(
        TaskTopic::TaskCreated,
        handler_fn("always_fails", |_event: &Event<TaskEvent>| {
            Err(HandlerError::failed("downstream unavailable"))
        }),
    );
    bus.subscribe(
        TaskTopic::TaskCreated,
        handler_fn("panics", |_event: &Event<TaskEvent>| -> Result<(), HandlerError> {
            panic!("view bug")
        }),
    );
    let in_progress = InProgressTasks::new(&mut bus);

    let report = bus.publish(TaskEvent::TaskCreated(
        TaskPayload::new("t1").with_status("IN_PROGRESS"),
    ));

    assert_eq!(report.subscribers, 3);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failures.len(), 2);
    assert!(in_progress.contains(&TaskId::from("t1")));
}
