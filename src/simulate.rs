//! Synthetic load events: fixed spike, fixed drop, gradual ramp.
//!
//! These are demonstration inputs, not a control loop: each mutation
//! reclassifies and moves on, with no convergence or rollback semantics.

use crate::error::AppError;
use crate::metrics::{LoadEvent, LoadSnapshot, MetricsSink};
use crate::notify::Notifier;
use crate::queue::timer::{TimerHandle, sleep_with_stop};
use crate::state::AppState;
use crate::traffic::TrafficStatus;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::warn;

pub const SPIKE_MAGNITUDE: u32 = 1000;
pub const DROP_MAGNITUDE: u32 = 500;

pub const RAMP_NOTIFICATION: Duration = Duration::from_millis(3000);

/// Add a fixed spike to the user count and reclassify.
pub fn apply_spike(state: &Arc<RwLock<AppState>>) -> Result<(u32, TrafficStatus), AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let user_count = guard.user_count().saturating_add(SPIKE_MAGNITUDE);
    guard.set_user_count(user_count);
    Ok((user_count, guard.status()))
}

/// Shed a fixed drop from the user count, floored at 0, and reclassify.
pub fn apply_drop(state: &Arc<RwLock<AppState>>) -> Result<(u32, TrafficStatus), AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let user_count = guard.user_count().saturating_sub(DROP_MAGNITUDE);
    guard.set_user_count(user_count);
    Ok((user_count, guard.status()))
}

/// Users added per ramp step: the target split across the step count,
/// rounded up so the final step may overshoot.
pub fn ramp_step_size(target: u32, steps: u32) -> u32 {
    target.div_ceil(steps.max(1))
}

fn apply_ramp_step(
    state: &Arc<RwLock<AppState>>,
    step: u32,
) -> Result<(u32, TrafficStatus), AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let user_count = guard.user_count().saturating_add(step);
    guard.set_user_count(user_count);
    Ok((user_count, guard.status()))
}

/// Spawn the ramp timer thread: one step per interval until the running
/// total of added users meets or exceeds `target`.
pub fn spawn_ramp(
    state: Arc<RwLock<AppState>>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<dyn MetricsSink>,
    target: u32,
    step: u32,
    interval: Duration,
) -> TimerHandle {
    TimerHandle::spawn(move |stop| {
        let mut added: u64 = 0;
        loop {
            if !sleep_with_stop(interval, &stop) {
                break;
            }
            match apply_ramp_step(&state, step) {
                Ok((user_count, status)) => {
                    metrics.record(&LoadSnapshot::capture(
                        user_count,
                        status,
                        LoadEvent::RampStep,
                    ));
                    added += u64::from(step);
                    if added >= u64::from(target) {
                        notifier.notify(
                            "Simulation Complete",
                            &format!("Traffic increased to {target} users"),
                            RAMP_NOTIFICATION,
                        );
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Ramp step failed");
                }
            }
        }
    })
}
