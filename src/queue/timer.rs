//! Cancellable timer threads.
//!
//! Every repeating timer in the simulation (countdown, ramp) runs on a
//! dedicated thread that polls a stop flag while sleeping, so cancellation
//! is bounded by the poll step rather than the full interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

const STOP_POLL_STEP: Duration = Duration::from_millis(50);

/// Owner handle for a timer thread. Dropping the handle detaches the thread;
/// `cancel` stops it and waits for it to exit.
#[derive(Debug)]
pub struct TimerHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TimerHandle {
    pub fn spawn<F>(body: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || body(thread_stop));
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the thread to stop and join it.
    pub fn cancel(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }
}

/// Sleep for `duration` in short steps. Returns false if `stop` was set
/// before the full duration elapsed.
pub fn sleep_with_stop(duration: Duration, stop: &AtomicBool) -> bool {
    let mut slept = Duration::ZERO;
    while slept < duration {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let step = STOP_POLL_STEP.min(duration - slept);
        std::thread::sleep(step);
        slept += step;
    }
    !stop.load(Ordering::Relaxed)
}
