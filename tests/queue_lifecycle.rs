use std::sync::{Arc, RwLock};
use std::time::Duration;
use waitroom::error::AppError;
use waitroom::metrics::{MetricsSink, RecordingMetricsSink};
use waitroom::notify::{Notifier, RecordingNotifier};
use waitroom::queue::{ControllerSettings, QueueController};
use waitroom::state::AppState;
use waitroom::store::memory::MemorySessionStore;
use waitroom::store::{SessionRecord, SessionStore};
use waitroom::traffic::TrafficStatus;

struct Harness {
    controller: QueueController,
    store: Arc<MemorySessionStore>,
    notifier: Arc<RecordingNotifier>,
    metrics: Arc<RecordingMetricsSink>,
}

fn harness(settings: ControllerSettings, store: MemorySessionStore) -> Harness {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::new());
    let metrics = Arc::new(RecordingMetricsSink::new());
    let controller = QueueController::new(
        Arc::new(RwLock::new(AppState::new())),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&metrics) as Arc<dyn MetricsSink>,
        settings,
    );
    Harness {
        controller,
        store,
        notifier,
        metrics,
    }
}

#[test]
fn full_wait_cycle_completes_and_notifies_once() -> Result<(), AppError> {
    let settings = ControllerSettings {
        tick_interval: Duration::from_millis(40),
        ..ControllerSettings::default()
    };
    let h = harness(settings, MemorySessionStore::new());

    let membership = h.controller.join()?;
    assert_eq!(membership.position, 1);

    // one tick completes the wait; leave a wide margin
    std::thread::sleep(Duration::from_millis(600));

    let snapshot = h.controller.snapshot()?;
    assert_eq!(snapshot.membership, None);
    assert_eq!(snapshot.wait_seconds, 0);
    assert_eq!(h.store.load().expect("load after turn"), None);
    assert_eq!(h.notifier.titles(), vec!["Joined Queue", "It's Your Turn!"]);

    h.controller.dispose()?;
    Ok(())
}

#[test]
fn resume_restarts_the_countdown_at_the_stored_position() -> Result<(), AppError> {
    let settings = ControllerSettings {
        tick_interval: Duration::from_millis(40),
        ..ControllerSettings::default()
    };
    let h = harness(
        settings,
        MemorySessionStore::with_record(SessionRecord {
            in_queue: true,
            position: 3,
            timestamp: "2026-08-07T09:00:00Z".to_string(),
        }),
    );

    let resumed = h.controller.resume()?;
    assert_eq!(resumed.map(|m| m.position), Some(3));

    // three ticks to the front
    std::thread::sleep(Duration::from_millis(800));

    let snapshot = h.controller.snapshot()?;
    assert_eq!(snapshot.membership, None);
    assert_eq!(h.notifier.titles(), vec!["It's Your Turn!"]);

    h.controller.dispose()?;
    Ok(())
}

#[test]
fn double_start_does_not_double_decrement() -> Result<(), AppError> {
    let settings = ControllerSettings {
        tick_interval: Duration::from_millis(250),
        ..ControllerSettings::default()
    };
    let h = harness(
        settings,
        MemorySessionStore::with_record(SessionRecord {
            in_queue: true,
            position: 5,
            timestamp: "2026-08-07T09:00:00Z".to_string(),
        }),
    );

    // two resumes back to back: the second must cancel the first timer
    h.controller.resume()?;
    h.controller.resume()?;

    // exactly one tick interval fits in this window
    std::thread::sleep(Duration::from_millis(400));

    let snapshot = h.controller.snapshot()?;
    assert_eq!(snapshot.membership.map(|m| m.position), Some(4));

    h.controller.dispose()?;
    Ok(())
}

#[test]
fn leave_during_a_wait_cancels_the_countdown() -> Result<(), AppError> {
    let settings = ControllerSettings {
        tick_interval: Duration::from_millis(40),
        ..ControllerSettings::default()
    };
    let h = harness(
        settings,
        MemorySessionStore::with_record(SessionRecord {
            in_queue: true,
            position: 50,
            timestamp: "2026-08-07T09:00:00Z".to_string(),
        }),
    );
    h.controller.resume()?;

    h.controller.leave()?;
    std::thread::sleep(Duration::from_millis(200));

    let snapshot = h.controller.snapshot()?;
    assert_eq!(snapshot.membership, None);
    assert_eq!(h.store.load().expect("load after leave"), None);
    // no turn notification: the wait was abandoned, not completed
    assert_eq!(h.notifier.titles(), vec!["Left Queue"]);
    Ok(())
}

#[test]
fn ramp_through_the_controller_reaches_the_target() -> Result<(), AppError> {
    let settings = ControllerSettings {
        tick_interval: Duration::from_secs(3600),
        ramp_steps: 10,
        ramp_interval: Duration::from_millis(5),
    };
    let h = harness(settings, MemorySessionStore::new());

    let plan = h.controller.ramp_to(1200)?;
    assert_eq!(plan.step, 120);

    std::thread::sleep(Duration::from_millis(800));

    let snapshot = h.controller.snapshot()?;
    assert_eq!(snapshot.user_count, 1200);
    assert_eq!(snapshot.status, TrafficStatus::High);
    assert_eq!(
        h.notifier.titles(),
        vec!["Simulation Started", "Simulation Complete"]
    );
    assert_eq!(h.metrics.events().len(), 10);

    h.controller.dispose()?;
    Ok(())
}
