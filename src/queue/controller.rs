//! The per-session queue controller.
//!
//! Owns the load counter and the membership record, and is the only starter
//! of countdown and ramp timers. Constructed explicitly and passed by
//! reference; `resume` and `dispose` bracket its lifecycle.

use crate::config::Config;
use crate::error::AppError;
use crate::metrics::{LoadEvent, LoadSnapshot, MetricsSink};
use crate::notify::Notifier;
use crate::queue::countdown;
use crate::queue::timer::TimerHandle;
use crate::simulate;
use crate::state::{AppState, QueueMembership};
use crate::store::{SessionRecord, SessionStore};
use crate::traffic::TrafficStatus;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

const JOIN_NOTIFICATION: Duration = Duration::from_millis(5000);
const LEAVE_NOTIFICATION: Duration = Duration::from_millis(5000);
const LOAD_NOTIFICATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub tick_interval: Duration,
    pub ramp_steps: u32,
    pub ramp_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            ramp_steps: 10,
            ramp_interval: Duration::from_millis(1500),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            ramp_steps: config.ramp_steps(),
            ramp_interval: config.ramp_interval(),
        }
    }
}

/// Read-only view of the simulation state at one instant.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub user_count: u32,
    pub status: TrafficStatus,
    pub membership: Option<QueueMembership>,
    pub wait_seconds: u64,
}

/// Parameters of a started ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampPlan {
    pub target: u32,
    pub step: u32,
}

pub struct QueueController {
    state: Arc<RwLock<AppState>>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<dyn MetricsSink>,
    settings: ControllerSettings,
    countdown: Mutex<Option<TimerHandle>>,
    ramp: Mutex<Option<TimerHandle>>,
}

impl QueueController {
    pub fn new(
        state: Arc<RwLock<AppState>>,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<dyn MetricsSink>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            state,
            store,
            notifier,
            metrics,
            settings,
            countdown: Mutex::new(None),
            ramp: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &Arc<RwLock<AppState>> {
        &self.state
    }

    pub fn snapshot(&self) -> Result<QueueSnapshot, AppError> {
        let guard = self.state.read().map_err(|_| AppError::StateLock)?;
        Ok(QueueSnapshot {
            user_count: guard.user_count(),
            status: guard.status(),
            membership: guard.membership().cloned(),
            wait_seconds: guard.wait_seconds(),
        })
    }

    /// Join the queue at the tail. Joining while already queued returns the
    /// held membership unchanged and re-arms the countdown.
    pub fn join(&self) -> Result<QueueMembership, AppError> {
        let mut created = false;
        let (membership, user_count, status) = {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            match guard.membership().cloned() {
                Some(existing) => (existing, guard.user_count(), guard.status()),
                None => {
                    let user_count = guard.user_count().saturating_add(1);
                    guard.set_user_count(user_count);
                    let membership = QueueMembership {
                        position: user_count,
                        joined_at: SystemTime::now(),
                    };
                    guard.set_membership(Some(membership.clone()));
                    created = true;
                    (membership, user_count, guard.status())
                }
            }
        };

        if created {
            if let Err(err) = self.store.save(&SessionRecord::from_membership(&membership)) {
                warn!(error = %err, "Failed to persist queue membership");
            }
            self.metrics
                .record(&LoadSnapshot::capture(user_count, status, LoadEvent::Join));
            self.notifier.notify(
                "Joined Queue",
                &format!(
                    "You are now in position {} in the queue.",
                    membership.position
                ),
                JOIN_NOTIFICATION,
            );
        }

        self.start_countdown()?;
        Ok(membership)
    }

    /// Leave the queue. A no-op when not queued.
    pub fn leave(&self) -> Result<(), AppError> {
        self.cancel_countdown()?;

        let removed = {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            if guard.membership().is_some() {
                guard.set_membership(None);
                let user_count = guard.user_count().saturating_sub(1);
                guard.set_user_count(user_count);
                Some((user_count, guard.status()))
            } else {
                None
            }
        };

        if let Some((user_count, status)) = removed {
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "Failed to clear session record on leave");
            }
            self.metrics
                .record(&LoadSnapshot::capture(user_count, status, LoadEvent::Leave));
            self.notifier.notify(
                "Left Queue",
                "You have left the queue successfully.",
                LEAVE_NOTIFICATION,
            );
        }
        Ok(())
    }

    /// Rebuild an in-progress wait from the persisted record, if any, and
    /// re-arm exactly one countdown timer. Anything unreadable fails open
    /// to "not queued".
    pub fn resume(&self) -> Result<Option<QueueMembership>, AppError> {
        let record = match self.store.load() {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "Unreadable session record, resuming as not queued");
                None
            }
        };

        let Some(membership) = record.as_ref().and_then(SessionRecord::membership) else {
            if record.is_some() {
                warn!("Ignoring session record without an in-progress wait");
            }
            return Ok(None);
        };

        {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            guard.set_membership(Some(membership.clone()));
        }
        self.start_countdown()?;
        info!(position = membership.position, "Resumed queue membership");
        Ok(Some(membership))
    }

    pub fn spike(&self) -> Result<u32, AppError> {
        let (user_count, status) = simulate::apply_spike(&self.state)?;
        self.metrics
            .record(&LoadSnapshot::capture(user_count, status, LoadEvent::Spike));
        self.notifier.notify(
            "Traffic Spike",
            &format!("{} new users joined the system.", simulate::SPIKE_MAGNITUDE),
            LOAD_NOTIFICATION,
        );
        Ok(user_count)
    }

    pub fn drop_load(&self) -> Result<u32, AppError> {
        let (user_count, status) = simulate::apply_drop(&self.state)?;
        self.metrics
            .record(&LoadSnapshot::capture(user_count, status, LoadEvent::Drop));
        self.notifier.notify(
            "Traffic Drop",
            &format!("{} users left the system.", simulate::DROP_MAGNITUDE),
            LOAD_NOTIFICATION,
        );
        Ok(user_count)
    }

    /// Start a gradual ramp toward `target` added users. A ramp already in
    /// flight is cancelled first.
    pub fn ramp_to(&self, target: u32) -> Result<RampPlan, AppError> {
        let step = simulate::ramp_step_size(target, self.settings.ramp_steps);
        let plan = RampPlan { target, step };

        self.notifier.notify(
            "Simulation Started",
            &format!("Gradually increasing traffic to {target} users"),
            simulate::RAMP_NOTIFICATION,
        );

        let mut slot = self.ramp.lock().map_err(|_| AppError::TimerLock)?;
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        if target == 0 {
            self.notifier.notify(
                "Simulation Complete",
                &format!("Traffic increased to {target} users"),
                simulate::RAMP_NOTIFICATION,
            );
            return Ok(plan);
        }
        *slot = Some(simulate::spawn_ramp(
            Arc::clone(&self.state),
            Arc::clone(&self.notifier),
            Arc::clone(&self.metrics),
            target,
            step,
            self.settings.ramp_interval,
        ));
        Ok(plan)
    }

    /// Cancel both timers. The controller can be reused afterwards; this is
    /// the "navigating away" hook.
    pub fn dispose(&self) -> Result<(), AppError> {
        self.cancel_countdown()?;
        let mut slot = self.ramp.lock().map_err(|_| AppError::TimerLock)?;
        if let Some(handle) = slot.take() {
            handle.cancel();
        }
        info!("Queue controller disposed");
        Ok(())
    }

    fn start_countdown(&self) -> Result<(), AppError> {
        let mut slot = self.countdown.lock().map_err(|_| AppError::TimerLock)?;
        // Cancel-before-start: a second live timer would double-decrement.
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(countdown::spawn_countdown(
            Arc::clone(&self.state),
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            Arc::clone(&self.metrics),
            self.settings.tick_interval,
        ));
        Ok(())
    }

    fn cancel_countdown(&self) -> Result<(), AppError> {
        let mut slot = self.countdown.lock().map_err(|_| AppError::TimerLock)?;
        if let Some(handle) = slot.take() {
            handle.cancel();
        }
        Ok(())
    }
}

impl std::fmt::Debug for QueueController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueController")
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RecordingMetricsSink;
    use crate::notify::RecordingNotifier;
    use crate::store::memory::MemorySessionStore;

    struct Harness {
        controller: QueueController,
        store: Arc<MemorySessionStore>,
        notifier: Arc<RecordingNotifier>,
        metrics: Arc<RecordingMetricsSink>,
    }

    fn harness_with_store(store: MemorySessionStore) -> Harness {
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::new());
        let metrics = Arc::new(RecordingMetricsSink::new());
        let settings = ControllerSettings {
            // long enough that no tick fires during a unit test
            tick_interval: Duration::from_secs(3600),
            ..ControllerSettings::default()
        };
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

    fn harness() -> Harness {
        harness_with_store(MemorySessionStore::new())
    }

    #[test]
    fn join_appends_to_the_tail_and_persists() -> Result<(), AppError> {
        let h = harness();

        let membership = h.controller.join()?;

        assert_eq!(membership.position, 1);
        let snapshot = h.controller.snapshot()?;
        assert_eq!(snapshot.user_count, 1);
        assert_eq!(snapshot.status, TrafficStatus::Low);
        assert_eq!(snapshot.wait_seconds, 5);

        let record = h.store.load().expect("load").expect("record present");
        assert_eq!(record.position, 1);
        assert_eq!(h.notifier.titles(), vec!["Joined Queue"]);
        assert_eq!(h.metrics.events(), vec![LoadEvent::Join]);

        h.controller.dispose()?;
        Ok(())
    }

    #[test]
    fn join_while_queued_returns_held_membership() -> Result<(), AppError> {
        let h = harness();

        let first = h.controller.join()?;
        let second = h.controller.join()?;

        assert_eq!(first.position, second.position);
        let snapshot = h.controller.snapshot()?;
        assert_eq!(snapshot.user_count, 1);
        // no second join notification
        assert_eq!(h.notifier.titles(), vec!["Joined Queue"]);

        h.controller.dispose()?;
        Ok(())
    }

    #[test]
    fn join_under_load_takes_the_tail_position() -> Result<(), AppError> {
        let h = harness();

        h.controller.spike()?;
        let membership = h.controller.join()?;

        assert_eq!(membership.position, 1001);
        let snapshot = h.controller.snapshot()?;
        assert_eq!(snapshot.status, TrafficStatus::High);
        assert_eq!(snapshot.wait_seconds, 1001 * 30);

        h.controller.dispose()?;
        Ok(())
    }

    #[test]
    fn leave_always_clears_membership() -> Result<(), AppError> {
        let h = harness();
        h.controller.join()?;

        h.controller.leave()?;

        let snapshot = h.controller.snapshot()?;
        assert_eq!(snapshot.membership, None);
        assert_eq!(snapshot.user_count, 0);
        assert_eq!(snapshot.wait_seconds, 0);
        assert_eq!(h.store.load().expect("load"), None);
        assert_eq!(h.notifier.titles(), vec!["Joined Queue", "Left Queue"]);
        assert_eq!(h.metrics.events(), vec![LoadEvent::Join, LoadEvent::Leave]);
        Ok(())
    }

    #[test]
    fn leave_when_not_queued_is_a_noop() -> Result<(), AppError> {
        let h = harness();

        h.controller.leave()?;

        assert!(h.notifier.titles().is_empty());
        assert!(h.metrics.events().is_empty());
        assert_eq!(h.controller.snapshot()?.user_count, 0);
        Ok(())
    }

    #[test]
    fn spike_then_drop_from_zero_lands_on_medium() -> Result<(), AppError> {
        let h = harness();

        assert_eq!(h.controller.spike()?, 1000);
        assert_eq!(h.controller.drop_load()?, 500);

        let snapshot = h.controller.snapshot()?;
        assert_eq!(snapshot.status, TrafficStatus::Medium);
        assert_eq!(h.metrics.events(), vec![LoadEvent::Spike, LoadEvent::Drop]);
        assert_eq!(h.notifier.titles(), vec!["Traffic Spike", "Traffic Drop"]);
        Ok(())
    }

    #[test]
    fn resume_restores_the_stored_position() -> Result<(), AppError> {
        let h = harness_with_store(MemorySessionStore::with_record(SessionRecord {
            in_queue: true,
            position: 5,
            timestamp: "2026-08-07T09:00:00Z".to_string(),
        }));

        let resumed = h.controller.resume()?;

        assert_eq!(resumed.map(|m| m.position), Some(5));
        let snapshot = h.controller.snapshot()?;
        assert_eq!(snapshot.membership.map(|m| m.position), Some(5));
        assert_eq!(snapshot.wait_seconds, 25);

        h.controller.dispose()?;
        Ok(())
    }

    #[test]
    fn resume_fails_open_on_store_errors() -> Result<(), AppError> {
        let h = harness_with_store(MemorySessionStore::failing());

        let resumed = h.controller.resume()?;

        assert_eq!(resumed, None);
        assert_eq!(h.controller.snapshot()?.membership, None);
        Ok(())
    }

    #[test]
    fn resume_ignores_a_stale_record() -> Result<(), AppError> {
        let h = harness_with_store(MemorySessionStore::with_record(SessionRecord {
            in_queue: false,
            position: 5,
            timestamp: "2026-08-07T09:00:00Z".to_string(),
        }));

        assert_eq!(h.controller.resume()?, None);
        Ok(())
    }

    #[test]
    fn store_failure_never_blocks_a_join() -> Result<(), AppError> {
        let h = harness_with_store(MemorySessionStore::failing());

        let membership = h.controller.join()?;

        assert_eq!(membership.position, 1);
        assert_eq!(h.controller.snapshot()?.user_count, 1);

        h.controller.dispose()?;
        Ok(())
    }

    #[test]
    fn ramp_to_zero_completes_without_a_timer() -> Result<(), AppError> {
        let h = harness();

        let plan = h.controller.ramp_to(0)?;

        assert_eq!(plan, RampPlan { target: 0, step: 0 });
        assert_eq!(
            h.notifier.titles(),
            vec!["Simulation Started", "Simulation Complete"]
        );
        assert_eq!(h.controller.snapshot()?.user_count, 0);
        Ok(())
    }

    #[test]
    fn dispose_cancels_outstanding_timers() -> Result<(), AppError> {
        let h = harness();
        h.controller.join()?;
        h.controller.ramp_to(1_000_000)?;

        h.controller.dispose()?;

        // both slots are empty; a second dispose is a no-op
        h.controller.dispose()?;
        Ok(())
    }
}
