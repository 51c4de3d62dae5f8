//! The countdown driver: one tick per interval, one position per tick.
//!
//! The state transition runs under the write lock; persistence, metrics and
//! notification follow after the lock is released and never gate it.

use crate::error::AppError;
use crate::metrics::{LoadEvent, LoadSnapshot, MetricsSink};
use crate::notify::Notifier;
use crate::queue::timer::{TimerHandle, sleep_with_stop};
use crate::state::AppState;
use crate::store::{SessionRecord, SessionStore};
use crate::traffic::TrafficStatus;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

pub const TURN_NOTIFICATION: Duration = Duration::from_millis(6000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Position moved one step toward the front.
    Decremented(u32),
    /// The wait is over; membership was cleared and the caller was notified.
    Turn,
    /// No membership was held; nothing to do.
    Idle,
}

/// Advance the countdown by one tick.
pub fn run_countdown_tick(
    state: &Arc<RwLock<AppState>>,
    store: &dyn SessionStore,
    notifier: &dyn Notifier,
    metrics: &dyn MetricsSink,
) -> Result<TickOutcome, AppError> {
    let mut record_to_save: Option<SessionRecord> = None;
    let mut turn_snapshot: Option<(u32, TrafficStatus)> = None;

    let outcome = {
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        match guard.membership().cloned() {
            None => TickOutcome::Idle,
            Some(membership) if membership.position <= 1 => {
                guard.set_membership(None);
                turn_snapshot = Some((guard.user_count(), guard.status()));
                TickOutcome::Turn
            }
            Some(mut membership) => {
                membership.position -= 1;
                let position = membership.position;
                record_to_save = Some(SessionRecord::from_membership(&membership));
                guard.set_membership(Some(membership));
                TickOutcome::Decremented(position)
            }
        }
    };

    if let Some(record) = record_to_save
        && let Err(err) = store.save(&record)
    {
        warn!(error = %err, "Failed to persist queue position after tick");
    }

    if let Some((user_count, status)) = turn_snapshot {
        if let Err(err) = store.clear() {
            warn!(error = %err, "Failed to clear session record after turn");
        }
        metrics.record(&LoadSnapshot::capture(user_count, status, LoadEvent::Turn));
        notifier.notify(
            "It's Your Turn!",
            "You can now access the system.",
            TURN_NOTIFICATION,
        );
    }

    Ok(outcome)
}

/// Spawn the countdown timer thread. The thread exits on its own once the
/// wait completes or membership disappears; cancellation goes through the
/// returned handle.
pub fn spawn_countdown(
    state: Arc<RwLock<AppState>>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<dyn MetricsSink>,
    interval: Duration,
) -> TimerHandle {
    TimerHandle::spawn(move |stop| {
        loop {
            if !sleep_with_stop(interval, &stop) {
                break;
            }
            match run_countdown_tick(&state, store.as_ref(), notifier.as_ref(), metrics.as_ref()) {
                Ok(TickOutcome::Decremented(position)) => {
                    debug!(position, "Queue position advanced");
                }
                Ok(TickOutcome::Turn) | Ok(TickOutcome::Idle) => break,
                Err(err) => {
                    warn!(error = %err, "Countdown tick failed");
                }
            }
        }
    })
}
