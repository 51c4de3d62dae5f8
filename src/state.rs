use crate::traffic::{self, TrafficStatus};
use std::time::SystemTime;
use tokio::sync::watch;

/// One participant's wait state. "Not queued" is the absence of the record,
/// so a held position is always >= 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMembership {
    pub position: u32,
    pub joined_at: SystemTime,
}

/// Shared simulation state. The cached status and wait estimate are derived
/// values: they are refreshed by the setters and never written directly.
#[derive(Debug)]
pub struct AppState {
    user_count: u32,
    user_count_tx: watch::Sender<u32>,
    status: TrafficStatus,
    status_tx: watch::Sender<TrafficStatus>,
    membership: Option<QueueMembership>,
    membership_tx: watch::Sender<Option<QueueMembership>>,
    wait_seconds: u64,
    wait_tx: watch::Sender<u64>,
}

impl AppState {
    pub fn new() -> Self {
        let (user_count_tx, _user_count_rx) = watch::channel(0);
        let (status_tx, _status_rx) = watch::channel(TrafficStatus::Low);
        let (membership_tx, _membership_rx) = watch::channel(None);
        let (wait_tx, _wait_rx) = watch::channel(0);
        Self {
            user_count: 0,
            user_count_tx,
            status: TrafficStatus::Low,
            status_tx,
            membership: None,
            membership_tx,
            wait_seconds: 0,
            wait_tx,
        }
    }

    pub fn user_count(&self) -> u32 {
        self.user_count
    }

    pub fn status(&self) -> TrafficStatus {
        self.status
    }

    pub fn membership(&self) -> Option<&QueueMembership> {
        self.membership.as_ref()
    }

    pub fn wait_seconds(&self) -> u64 {
        self.wait_seconds
    }

    pub fn subscribe_user_count(&self) -> watch::Receiver<u32> {
        self.user_count_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<TrafficStatus> {
        self.status_tx.subscribe()
    }

    pub fn subscribe_membership(&self) -> watch::Receiver<Option<QueueMembership>> {
        self.membership_tx.subscribe()
    }

    pub fn subscribe_wait(&self) -> watch::Receiver<u64> {
        self.wait_tx.subscribe()
    }

    /// Update the user count, reclassify, and refresh the wait estimate.
    pub fn set_user_count(&mut self, user_count: u32) {
        self.user_count = user_count;
        self.user_count_tx.send_replace(user_count);
        let status = traffic::classify(user_count);
        if status != self.status {
            self.status = status;
            self.status_tx.send_replace(status);
        }
        self.refresh_wait();
    }

    /// Replace the membership record and refresh the wait estimate.
    pub fn set_membership(&mut self, membership: Option<QueueMembership>) {
        self.membership = membership.clone();
        self.membership_tx.send_replace(membership);
        self.refresh_wait();
    }

    fn refresh_wait(&mut self) {
        let position = self.membership.as_ref().map(|m| m.position);
        let wait_seconds = traffic::estimate_wait_seconds(position, self.status);
        if wait_seconds != self.wait_seconds {
            self.wait_seconds = wait_seconds;
            self.wait_tx.send_replace(wait_seconds);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
