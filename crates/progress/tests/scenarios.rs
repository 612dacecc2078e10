//! End-to-end progression scenarios against a file-backed store.

use std::sync::Arc;

use chrono::Duration;
use tempfile::TempDir;
use unlock_core::{
    ConfirmationTask, Gate, GateContext, GradeResult, ManualClock, MinimumDurationTask, Objective,
    ObjectiveDefinition, Task, Timestamp,
};
use unlock_progress::{ObjectiveStatus, ObjectiveTracker, ProgressError};
use unlock_storage::{JsonFileStore, KeyValueStore, MemoryStore};

const T0: Timestamp = 1_700_000_000_000;

const DEFINITIONS: &str = r#"[
    {
        "key": "intro",
        "title": "Read the introduction",
        "gate": "Unlocks suggestions",
        "tasks": [
            { "title": "Acknowledge", "kind": "confirmation", "storage_key": "ack" }
        ]
    },
    {
        "key": "exam",
        "title": "Pass the exam",
        "gate": "Unlocks automation",
        "tasks": [
            {
                "title": "Safety",
                "kind": "exam",
                "storage_key": "safety",
                "question": "Which statements are true?",
                "options": [
                    { "label": "Always verify", "correct": true },
                    { "label": "Never verify", "correct": false }
                ]
            },
            { "title": "Soak", "kind": "minimum_duration", "hours": 2 }
        ]
    }
]"#;

fn file_context(dir: &TempDir, clock: Arc<ManualClock>) -> GateContext {
    let store = JsonFileStore::open(dir.path().join("store.json")).unwrap();
    GateContext::from_shared(Arc::new(store), clock)
}

fn tracker(ctx: &GateContext) -> ObjectiveTracker {
    let definitions = ObjectiveDefinition::from_json(DEFINITIONS).unwrap();
    ObjectiveTracker::from_definitions(&definitions, ctx).unwrap()
}

#[test]
fn confirmation_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));

    {
        let ctx = file_context(&dir, clock.clone());
        let mut tracker = tracker(&ctx);
        assert!(!tracker.get(0).unwrap().is_completed());

        tracker
            .get_mut(0)
            .unwrap()
            .task_mut(0)
            .unwrap()
            .as_confirmation_mut()
            .unwrap()
            .record_answer(true)
            .unwrap();
        assert!(tracker.get(0).unwrap().is_completed());
    }

    let ctx = file_context(&dir, clock);
    let tracker = tracker(&ctx);
    assert!(tracker.get(0).unwrap().is_completed());
}

#[test]
fn full_progression() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let ctx = file_context(&dir, clock.clone());
    let mut tracker = tracker(&ctx);

    tracker.start(0).unwrap();
    tracker
        .get_mut(0)
        .unwrap()
        .task_mut(0)
        .unwrap()
        .as_confirmation_mut()
        .unwrap()
        .record_answer(true)
        .unwrap();
    tracker.accomplish(0, None).unwrap();
    assert!(tracker.is_unlocked("intro"));

    tracker.start(1).unwrap();
    let exam = tracker
        .get_mut(1)
        .unwrap()
        .task_mut(0)
        .unwrap()
        .as_exam_mut()
        .unwrap();

    let failed = exam.submit([1]).unwrap();
    let until = T0 + Duration::hours(1).num_milliseconds();
    assert_eq!(
        failed,
        GradeResult::Failed {
            incorrect: vec![0, 1],
            disabled_until: until,
        }
    );
    assert_eq!(exam.submit([0]).unwrap(), GradeResult::Locked { until });

    clock.advance(Duration::hours(1));
    assert_eq!(exam.submit([0]).unwrap(), GradeResult::Passed);

    // Exam passed but the soak period is not over yet.
    assert_eq!(tracker.status(1).unwrap(), ObjectiveStatus::InProgress);
    assert!(matches!(
        tracker.accomplish(1, None),
        Err(ProgressError::TasksIncomplete { pending: 1, .. })
    ));

    clock.advance(Duration::hours(1));
    assert_eq!(tracker.status(1).unwrap(), ObjectiveStatus::ReadyToAccomplish);
    tracker.accomplish(1, None).unwrap();
    assert!(tracker.is_unlocked("exam"));
    assert_eq!(tracker.current_index(), None);
}

#[test]
fn clock_rewind_resets_progress_on_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));

    {
        let ctx = file_context(&dir, clock.clone());
        let mut tracker = tracker(&ctx);
        tracker.start(0).unwrap();
    }

    clock.set(T0 - Duration::hours(5).num_milliseconds());
    let ctx = file_context(&dir, clock);
    let tracker = tracker(&ctx);

    assert_eq!(tracker.status(0).unwrap(), ObjectiveStatus::Available);
    assert_eq!(ctx.store.get_long("Objectives_intro_started", -1).unwrap(), 0);
}

#[test]
fn duration_scenario_projection() {
    let clock = Arc::new(ManualClock::new(T0));
    let ctx = GateContext::from_shared(Arc::new(MemoryStore::new()), clock);
    let mut objective = Objective::load("soak", "Soak", "", &ctx)
        .unwrap()
        .with_task(Task::new("Wait", MinimumDurationTask::new(Duration::hours(2), &ctx)));
    objective.set_started(T0).unwrap();

    assert!(!objective.is_completed_at(T0 + Duration::hours(1).num_milliseconds()));
    assert!(objective.is_completed_at(T0 + Duration::hours(2).num_milliseconds()));
}

#[test]
fn completion_matches_every_task() {
    let clock = Arc::new(ManualClock::new(T0));
    let ctx = GateContext::from_shared(Arc::new(MemoryStore::new()), clock);
    let mut objective = Objective::load("many", "", "", &ctx).unwrap();
    for key in ["a", "b", "c"] {
        objective.task(Task::new(key, ConfirmationTask::load(key, &ctx).unwrap()));
    }

    for index in 0..3 {
        let expected = objective.tasks().iter().all(|t| t.is_completed(objective.started_at()));
        assert_eq!(objective.is_completed(), expected);
        objective
            .task_mut(index)
            .unwrap()
            .as_confirmation_mut()
            .unwrap()
            .record_answer(true)
            .unwrap();
    }
    assert!(objective.is_completed());
}

#[test]
fn snapshot_serializes() {
    let clock = Arc::new(ManualClock::new(T0));
    let ctx = GateContext::from_shared(Arc::new(MemoryStore::new()), clock);
    let tracker = tracker(&ctx);

    let json = serde_json::to_value(tracker.snapshot()).unwrap();
    assert_eq!(json["current"], 0);
    assert_eq!(json["objectives"][0]["status"], "available");
    assert_eq!(json["objectives"][1]["status"], "locked");
    assert_eq!(json["objectives"][1]["tasks"][0]["kind"], "exam");
}
